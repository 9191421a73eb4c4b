// Status bar: phase, live set, and player counters.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::ViewState;

/// Render the top status bar.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let snapshot = &state.snapshot;
    let set_label = if snapshot.category_label.is_empty() {
        "--".to_string()
    } else {
        snapshot.category_label.clone()
    };
    let text = format!(
        " Set: {} | Players: {} | Assigned: {} | Remaining: {}",
        set_label, snapshot.total_players, snapshot.assigned_count, snapshot.remaining_count
    );
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default().fg(Color::White),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}
