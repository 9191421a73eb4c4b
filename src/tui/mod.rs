// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors the session for rendering. The
// app orchestrator pushes `UiUpdate` messages over an mpsc channel; the
// TUI applies them to `ViewState` and re-renders at ~30 fps. Blocking
// stages (introductions, category notices, the unsold confirmation) render
// as modal overlays on top of the dashboard.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::protocol::{SessionSnapshot, StageView, UiUpdate, UserCommand};

use layout::{build_layout, centered_rect, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the session for rendering.
///
/// Updated incrementally via `UiUpdate` messages from the app orchestrator.
#[derive(Debug, Default)]
pub struct ViewState {
    /// Latest full snapshot from the orchestrator.
    pub snapshot: SessionSnapshot,
    /// Transient status-line message.
    pub status_line: String,
    /// Whether the unsold confirmation prompt is up.
    pub confirm_unsold: bool,
}

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => {
            // A stage change invalidates a pending unsold confirmation.
            if !matches!(snapshot.stage, StageView::OnBlock { .. }) {
                state.confirm_unsold = false;
            }
            state.snapshot = *snapshot;
        }
        UiUpdate::Status(message) => {
            state.status_line = message;
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::block::render(frame, layout.block_banner, state);
    widgets::teams::render(frame, layout.team_grid, state);
    widgets::unsold::render(frame, layout.unsold, state);
    render_last_sale(frame, &layout, state);
    render_message_line(frame, &layout, state);
    render_help_bar(frame, &layout);

    render_overlays(frame, state);
}

fn render_last_sale(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let content = match &state.snapshot.last_sale {
        Some(sale) => format!(
            "{} -> {}\nfor {} (z undoes)",
            sale.player_name,
            sale.team_name,
            widgets::block::format_money(sale.price)
        ),
        None => "No sales yet".to_string(),
    };
    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Last Sale"),
    );
    frame.render_widget(paragraph, layout.last_sale);
}

fn render_message_line(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!(" {}", state.status_line),
        Style::default().fg(Color::Yellow),
    )));
    frame.render_widget(paragraph, layout.message_line);
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout) {
    let text = " n:Next  1-9:Team  +:Raise  Enter:Confirm  r:Reopen  u:Unsold  z:Undo  f:Finish  e:Export  q:Quit";
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

/// Draw the blocking overlays for the current stage.
fn render_overlays(frame: &mut Frame, state: &ViewState) {
    match &state.snapshot.stage {
        StageView::Intro {
            team_name,
            role_label,
            person_name,
            index,
            total,
        } => {
            let next_hint = if index + 1 < *total {
                "Enter: next introduction"
            } else {
                "Enter: start the auction"
            };
            let lines = vec![
                Line::from(Span::styled(
                    "Team Introductions",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(format!("Team - {team_name}")),
                Line::from(Span::styled(
                    format!("{role_label}: {person_name}"),
                    Style::default().fg(Color::Yellow),
                )),
                Line::from(""),
                Line::from(format!("({} of {})   {}", index + 1, total, next_hint)),
            ];
            render_modal(frame, "Introductions", lines);
        }
        StageView::Notice { label, final_round } => {
            let warning = if *final_round {
                "This is the FINAL RESURFACING ROUND for all previously unsold \
                 players. They keep cycling to the back of the queue if marked \
                 unsold again."
            } else {
                "Any players marked UNSOLD in this set will come up for auction \
                 again after all primary categories."
            };
            let lines = vec![
                Line::from(Span::styled(
                    format!("Category Starting: {label}"),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(warning),
                Line::from(""),
                Line::from("Enter: start this set"),
            ];
            render_modal(frame, "Notice", lines);
        }
        StageView::OnBlock { player, .. } if state.confirm_unsold => {
            let lines = vec![
                Line::from(Span::styled(
                    format!("Mark {} as UNSOLD?", player.name),
                    Style::default()
                        .fg(Color::Red)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from("They will be available again in the final round."),
                Line::from(""),
                Line::from("y: confirm   n/Esc: cancel"),
            ];
            render_modal(frame, "Confirm", lines);
        }
        _ => {}
    }
}

fn render_modal(frame: &mut Frame, title: &str, lines: Vec<Line>) {
    let area = centered_rect(60, 40, frame.area());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    // Restore the terminal even if rendering panics.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => {
                        apply_ui_update(&mut view_state, ui_update);
                    }
                    None => {
                        // Channel closed: app is shutting down
                        break;
                    }
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(command) = input::handle_key(key_event, &mut view_state) {
                            let quitting = command == UserCommand::Quit;
                            let _ = cmd_tx.send(command).await;
                            if quitting {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse events, resize events, etc. -- ignore
                    }
                    Some(Err(_)) | None => {
                        // Input error or stream ended -- break out
                        break;
                    }
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{LastSaleView, PlayerView};

    #[test]
    fn view_state_default_is_sensible() {
        let state = ViewState::default();
        assert!(state.snapshot.teams.is_empty());
        assert!(state.snapshot.unsold.is_empty());
        assert!(state.status_line.is_empty());
        assert!(!state.confirm_unsold);
        assert!(matches!(
            state.snapshot.stage,
            StageView::AwaitingNext { exhausted: false }
        ));
    }

    #[test]
    fn apply_snapshot_replaces_render_state() {
        let mut state = ViewState::default();
        let mut snapshot = SessionSnapshot::default();
        snapshot.total_players = 30;
        snapshot.last_sale = Some(LastSaleView {
            player_name: "A".to_string(),
            team_name: "Kingsmen".to_string(),
            price: 5_000,
        });
        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(snapshot)));
        assert_eq!(state.snapshot.total_players, 30);
        assert!(state.snapshot.last_sale.is_some());
    }

    #[test]
    fn stage_change_clears_pending_unsold_confirmation() {
        let mut state = ViewState::default();
        state.confirm_unsold = true;

        let mut snapshot = SessionSnapshot::default();
        snapshot.stage = StageView::AwaitingNext { exhausted: false };
        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(snapshot)));
        assert!(!state.confirm_unsold);
    }

    #[test]
    fn on_block_snapshot_preserves_confirmation_prompt() {
        let mut state = ViewState::default();
        state.confirm_unsold = true;

        let mut snapshot = SessionSnapshot::default();
        snapshot.stage = StageView::OnBlock {
            player: PlayerView {
                name: "A".to_string(),
                role: "Batter".to_string(),
                category: "NEW TO GAME".to_string(),
                base_price: 200,
            },
            bid: 200,
            increment: 200,
            proposed_team: None,
        };
        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(snapshot)));
        assert!(state.confirm_unsold);
    }

    #[test]
    fn status_updates_replace_the_message_line() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::Status("insufficient budget".to_string()));
        assert_eq!(state.status_line, "insufficient budget");
        apply_ui_update(&mut state, UiUpdate::Status("SOLD".to_string()));
        assert_eq!(state.status_line, "SOLD");
    }
}
