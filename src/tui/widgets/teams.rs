// Team grid: budgets, roster fill, and (while a player is on the block)
// the reason a team's button is disabled.

use ratatui::layout::Constraint;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use crate::tui::ViewState;

use super::block::format_money;

/// Render the team grid into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Team"),
        Cell::from("Budget"),
        Cell::from("Roster"),
        Cell::from("Note"),
    ])
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = if state.snapshot.teams.is_empty() {
        vec![Row::new(vec![Cell::from("  No team data available")])]
    } else {
        state
            .snapshot
            .teams
            .iter()
            .enumerate()
            .map(|(idx, team)| {
                let note = team.disabled.clone().unwrap_or_default();
                let style = if team.disabled.is_some() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(format!("{}", idx + 1)),
                    Cell::from(team.name.clone()),
                    Cell::from(format!(
                        "{} / {}",
                        format_money(team.remaining),
                        format_money(team.cap)
                    )),
                    Cell::from(format!("{}", team.roster_count)),
                    Cell::from(note),
                ])
                .style(style)
            })
            .collect()
    };

    let widths = [
        Constraint::Length(3),
        Constraint::Min(16),
        Constraint::Length(19),
        Constraint::Length(7),
        Constraint::Min(24),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Teams"));
    frame.render_widget(table, area);
}
