// Unsold queue panel: the resurfacing order, head first.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;

/// Render the unsold queue into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines: Vec<Line> = if state.snapshot.unsold.is_empty() {
        vec![Line::from("  (empty)")]
    } else {
        state
            .snapshot
            .unsold
            .iter()
            .enumerate()
            .map(|(idx, name)| Line::from(format!("{:>3}. {}", idx + 1, name)))
            .collect()
    };

    let title = format!("Unsold Queue ({})", state.snapshot.unsold.len());
    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}
