// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (the unsold
// confirmation prompt).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::protocol::{StageView, UserCommand};

use super::ViewState;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to
/// the app orchestrator. Returns `None` when the key press was handled
/// locally (the unsold confirmation prompt) or means nothing right now.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress; ignoring
    // non-Press events prevents double-processing.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode (escape hatch)
    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    // Unsold confirmation prompt: y confirms, n/Esc cancels, everything
    // else is swallowed so a stray key cannot mark a player unsold.
    if view_state.confirm_unsold {
        return handle_confirm_unsold(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Char('q') => Some(UserCommand::Quit),

        // Enter acknowledges whatever is blocking, confirms a proposal,
        // or pulls the next player.
        KeyCode::Enter => match &view_state.snapshot.stage {
            StageView::Intro { .. } => Some(UserCommand::AcknowledgeIntro),
            StageView::Notice { .. } => Some(UserCommand::AcknowledgeNotice),
            StageView::OnBlock {
                proposed_team: Some(_),
                ..
            } => Some(UserCommand::ConfirmSale),
            StageView::AwaitingNext { .. } => Some(UserCommand::SelectNext),
            _ => None,
        },

        KeyCode::Char('n') | KeyCode::Char(' ') => match &view_state.snapshot.stage {
            StageView::AwaitingNext { .. } => Some(UserCommand::SelectNext),
            StageView::Intro { .. } => Some(UserCommand::AcknowledgeIntro),
            StageView::Notice { .. } => Some(UserCommand::AcknowledgeNotice),
            _ => None,
        },

        KeyCode::Char('+') | KeyCode::Char('=') => Some(UserCommand::RaiseBid),

        KeyCode::Char(c @ '1'..='9') => {
            let index = (c as usize) - ('1' as usize);
            match &view_state.snapshot.stage {
                StageView::OnBlock {
                    proposed_team: None,
                    ..
                } => Some(UserCommand::ProposeTeam(index)),
                _ => None,
            }
        }

        KeyCode::Char('r') => Some(UserCommand::ReopenBidding),

        KeyCode::Char('u') => match &view_state.snapshot.stage {
            StageView::OnBlock { .. } => {
                view_state.confirm_unsold = true;
                None
            }
            _ => None,
        },

        KeyCode::Char('z') => Some(UserCommand::UndoLast),
        KeyCode::Char('f') => Some(UserCommand::FinishAuction),
        KeyCode::Char('e') => Some(UserCommand::ExportResults),

        _ => None,
    }
}

fn handle_confirm_unsold(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            view_state.confirm_unsold = false;
            Some(UserCommand::MarkUnsold)
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            view_state.confirm_unsold = false;
            None
        }
        _ => None,
    }
}
