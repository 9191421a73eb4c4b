// On-block banner: the surfaced player and the running bid.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::protocol::StageView;
use crate::tui::ViewState;

/// Render the on-block banner for the current stage.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = match &state.snapshot.stage {
        StageView::OnBlock {
            player,
            bid,
            increment,
            proposed_team,
        } => {
            let mut lines = vec![
                Line::from(vec![
                    Span::styled(
                        player.name.clone(),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("  ({})", player.role)),
                ]),
                Line::from(format!("Set: {}", player.category)),
                Line::from(format!(
                    "Base: {}   Bid: {}   (+{} per raise)",
                    format_money(player.base_price),
                    format_money(*bid),
                    format_money(*increment)
                )),
            ];
            match proposed_team {
                Some(team) => lines.push(Line::from(Span::styled(
                    format!("Tentatively sold to {team}. Enter confirms, r reopens bidding"),
                    Style::default().fg(Color::Green),
                ))),
                None => lines.push(Line::from(
                    "Pick a team (1-9), + raises the bid, u marks unsold",
                )),
            }
            lines
        }
        StageView::AwaitingNext { exhausted } => {
            if *exhausted {
                vec![Line::from(
                    "All players have been assigned or permanently skipped. f finishes",
                )]
            } else {
                vec![Line::from("No player on the block. n selects the next")]
            }
        }
        StageView::Complete => vec![Line::from(Span::styled(
            "Auction complete. e exports the results",
            Style::default().fg(Color::Green),
        ))],
        StageView::Intro { .. } | StageView::Notice { .. } => {
            vec![Line::from("")]
        }
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("On the Block"),
    );
    frame.render_widget(paragraph, area);
}

/// Format a money amount with thousands separators.
pub fn format_money(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
