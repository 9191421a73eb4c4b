// Application state and orchestration logic.
//
// The central loop that applies operator commands to the auction session
// and pushes render snapshots to the TUI. Persistence side effects (the
// local sale log and the remote webhook) happen here so the session stays
// pure.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::auction::session::{AuctionSession, SelectOutcome, SessionState};
use crate::config::Config;
use crate::db::Database;
use crate::protocol::{
    LastSaleView, PlayerView, SessionSnapshot, StageView, TeamStatusView, UiUpdate, UserCommand,
};
use crate::sheet::{SaleSink, SheetClient};
use crate::{auction::player::display_tag, export};

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub session: AuctionSession,
    pub db: Database,
    pub sheet: Arc<SheetClient>,
    /// Identifier scoping persisted sales to this auction session.
    pub session_id: String,
}

impl AppState {
    pub fn new(config: Config, session: AuctionSession, db: Database, sheet: SheetClient) -> Self {
        AppState {
            config,
            session,
            db,
            sheet: Arc::new(sheet),
            session_id: String::new(),
        }
    }
}

/// Check the sale log for a prior session and replay it if present.
///
/// Returns `true` when a previous session was restored. Otherwise a new
/// session id is generated and stored.
pub fn recover_from_db(state: &mut AppState) -> Result<bool> {
    if let Some(value) = state.db.load_state("session_id")? {
        if let Some(id) = value.as_str() {
            let sales = state.db.load_sales(id)?;
            if !sales.is_empty() {
                let restored = state.session.replay_sales(&sales);
                state.session_id = id.to_string();
                info!("restored {restored} sales from session {id}");
                return Ok(true);
            }
        }
    }

    let id = format!("session-{}", Utc::now().format("%Y%m%d-%H%M%S"));
    state
        .db
        .save_state("session_id", &serde_json::Value::String(id.clone()))?;
    state.session_id = id;
    Ok(false)
}

/// Run the orchestrator loop: apply each command, then push a fresh
/// snapshot. Exits when the TUI sends `Quit` or closes the channel.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> Result<()> {
    push_snapshot(&ui_tx, &state).await;

    while let Some(command) = cmd_rx.recv().await {
        if command == UserCommand::Quit {
            info!("quit requested; orchestrator shutting down");
            break;
        }
        if let Some(status) = apply_command(&mut state, command) {
            let _ = ui_tx.send(UiUpdate::Status(status)).await;
        }
        push_snapshot(&ui_tx, &state).await;
    }
    Ok(())
}

async fn push_snapshot(ui_tx: &mpsc::Sender<UiUpdate>, state: &AppState) {
    let snapshot = build_snapshot(&state.session);
    let _ = ui_tx.send(UiUpdate::Snapshot(Box::new(snapshot))).await;
}

/// Apply one operator command. Returns a status-line message when there is
/// something worth telling the operator (sales, rejections, exports).
pub fn apply_command(state: &mut AppState, command: UserCommand) -> Option<String> {
    match command {
        UserCommand::AcknowledgeIntro => state.session.acknowledge_intro().err().map(status),
        UserCommand::AcknowledgeNotice => state.session.acknowledge_notice().err().map(status),
        UserCommand::SelectNext => match state.session.select_next() {
            Ok(SelectOutcome::Complete) => Some("no players remain; auction complete".to_string()),
            Ok(_) => None,
            Err(e) => Some(status(e)),
        },
        UserCommand::RaiseBid => state.session.raise_bid().err().map(status),
        UserCommand::ProposeTeam(index) => state.session.propose_team(index).err().map(status),
        UserCommand::ReopenBidding => state.session.reopen_bidding().err().map(status),
        UserCommand::ConfirmSale => match state.session.confirm_sale() {
            Ok(sale) => {
                // Local log first (same task, recoverable), then the
                // fire-and-forget webhook. Neither failure rolls back or
                // blocks the commit.
                if let Err(e) = state.db.record_sale(&sale, &state.session_id) {
                    error!("failed to persist sale locally: {e:#}");
                }
                let sink = state.sheet.clone();
                let record = sale.clone();
                tokio::spawn(async move {
                    sink.record_sale(&record).await;
                });
                Some(format!(
                    "SOLD {} to {} for {}",
                    sale.player_name, sale.team_name, sale.price
                ))
            }
            Err(e) => Some(status(e)),
        },
        UserCommand::MarkUnsold => match state.session.mark_unsold() {
            Ok(()) => Some("marked unsold".to_string()),
            Err(e) => Some(status(e)),
        },
        UserCommand::UndoLast => match state.session.undo_last() {
            Ok(undone) => {
                if let Err(e) = state.db.delete_sale(&undone.player_id, &state.session_id) {
                    error!("failed to remove sale from local log: {e:#}");
                }
                Some(if undone.requeued {
                    format!("undid sale of {}; moved to unsold queue", undone.player_name)
                } else {
                    format!("undid sale of {}", undone.player_name)
                })
            }
            Err(e) => Some(status(e)),
        },
        UserCommand::FinishAuction => {
            state.session.finish();
            Some("auction finished".to_string())
        }
        UserCommand::ExportResults => {
            if !matches!(state.session.state(), SessionState::Complete) {
                return Some("finish the auction before exporting results".to_string());
            }
            match export::write_report(
                &state.config.export_path,
                state.session.players(),
                state.session.teams(),
                state.session.ledger(),
            ) {
                Ok(()) => Some(format!("results exported to {}", state.config.export_path)),
                Err(e) => {
                    warn!("export failed: {e:#}");
                    Some(format!("export failed: {e}"))
                }
            }
        }
        UserCommand::Quit => None,
    }
}

fn status(e: impl std::fmt::Display) -> String {
    e.to_string()
}

/// Shape the session into a render snapshot.
pub fn build_snapshot(session: &AuctionSession) -> SessionSnapshot {
    let stage = match session.state() {
        SessionState::Intro { index } => {
            let card = session.intro_card();
            StageView::Intro {
                team_name: card.map(|c| c.team_name.clone()).unwrap_or_default(),
                role_label: card.map(|c| c.role_label.clone()).unwrap_or_default(),
                person_name: card.map(|c| c.person_name.clone()).unwrap_or_default(),
                index: *index,
                total: session.intro_len(),
            }
        }
        SessionState::CategoryNotice { label, final_round } => StageView::Notice {
            label: display_tag(label),
            final_round: *final_round,
        },
        SessionState::AwaitingNext => StageView::AwaitingNext {
            exhausted: session.remaining_count() == 0,
        },
        SessionState::OnBlock { bid, proposed, .. } => {
            let player = session.current_player();
            StageView::OnBlock {
                player: PlayerView {
                    name: player.map(|p| p.name.clone()).unwrap_or_default(),
                    role: player.map(|p| p.role.clone()).unwrap_or_default(),
                    category: player
                        .map(|p| display_tag(&p.category))
                        .unwrap_or_default(),
                    base_price: player.map(|p| p.base_price).unwrap_or(0),
                },
                bid: *bid,
                increment: player
                    .map(|p| session.increment_for(&p.category))
                    .unwrap_or(0),
                proposed_team: proposed
                    .as_ref()
                    .and_then(|id| session.team_by_id(id))
                    .map(|t| t.name.clone()),
            }
        }
        SessionState::Complete => StageView::Complete,
    };

    let teams = session
        .team_statuses()
        .into_iter()
        .map(|t| TeamStatusView {
            name: t.name,
            remaining: t.remaining,
            cap: t.cap,
            roster_count: t.roster_count,
            disabled: t.disabled.map(|d| d.to_string()),
        })
        .collect();

    let unsold = session
        .unsold()
        .ids()
        .map(|id| {
            session
                .player_by_id(id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| id.to_string())
        })
        .collect();

    let last_sale = session.ledger().last_sale().and_then(|player_id| {
        let player = session.player_by_id(player_id)?;
        let assignment = session.ledger().assignment(player_id)?;
        let team_name = session
            .team_by_id(&assignment.team_id)
            .map(|t| t.name.clone())
            .unwrap_or_default();
        Some(LastSaleView {
            player_name: player.name.clone(),
            team_name,
            price: assignment.price,
        })
    });

    SessionSnapshot {
        stage,
        category_label: session.category_label(),
        teams,
        unsold,
        total_players: session.total_players(),
        assigned_count: session.assigned_count(),
        remaining_count: session.remaining_count(),
        last_sale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::player::{Player, Team};
    use crate::auction::rules::RosterRules;
    use crate::auction::session::SessionSettings;
    use crate::config::parse_config;
    use std::collections::{HashMap, HashSet};
    use std::path::Path;

    fn test_config() -> Config {
        let text = r#"
[auction]
roster_size_cap = 10
default_increment = 500
default_category_cap = 2

[auction.categories]
order = ["new-to-game"]

[budget]
default_cap = 100000

[data]
players = "p.csv"
teams = "t.csv"

[database]
path = ":memory:"

[export]
results_path = "auction_results.csv"
"#;
        parse_config(text, Path::new("test/auction.toml")).unwrap()
    }

    fn player(id: usize, name: &str) -> Player {
        Player {
            id: format!("player-{id}"),
            name: name.to_string(),
            role: "Batter".to_string(),
            category: "new-to-game".to_string(),
            base_price: 200,
            photo: String::new(),
            pre_assigned_team: None,
            is_pre_sold: false,
        }
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            category_order: vec!["new-to-game".to_string()],
            increments: HashMap::new(),
            default_increment: 500,
            rules: RosterRules {
                roster_size_cap: 10,
                default_category_cap: 2,
                category_caps: HashMap::new(),
                blocked_categories: HashSet::new(),
            },
            team_caps: vec![("team-0".to_string(), 100_000)],
        }
    }

    fn test_state(players: Vec<Player>) -> AppState {
        let teams = vec![Team {
            id: "team-0".to_string(),
            name: "ThunderBolts".to_string(),
            captain: String::new(),
            vice_captain: None,
        }];
        let session = AuctionSession::with_seed(players, teams, settings(), 11);
        let mut state = AppState::new(
            test_config(),
            session,
            Database::open(":memory:").unwrap(),
            SheetClient::Disabled,
        );
        recover_from_db(&mut state).unwrap();
        state
    }

    #[tokio::test]
    async fn sale_is_persisted_and_undone_in_the_local_log() {
        let mut state = test_state(vec![player(0, "A")]);
        assert!(apply_command(&mut state, UserCommand::AcknowledgeNotice).is_none());
        assert!(apply_command(&mut state, UserCommand::SelectNext).is_none());
        apply_command(&mut state, UserCommand::RaiseBid);
        apply_command(&mut state, UserCommand::ProposeTeam(0));
        let status = apply_command(&mut state, UserCommand::ConfirmSale).unwrap();
        assert!(status.contains("SOLD A to ThunderBolts for 700"), "{status}");

        let sales = state.db.load_sales(&state.session_id).unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].price, 700);

        let status = apply_command(&mut state, UserCommand::UndoLast).unwrap();
        assert!(status.contains("undid sale of A"), "{status}");
        assert!(state.db.load_sales(&state.session_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejections_surface_as_status_messages_without_state_change() {
        let mut state = test_state(vec![player(0, "A")]);
        // Confirm before anything is on the block.
        let status = apply_command(&mut state, UserCommand::ConfirmSale).unwrap();
        assert!(!status.is_empty());
        assert_eq!(state.session.assigned_count(), 0);
    }

    #[tokio::test]
    async fn export_requires_completion() {
        let mut state = test_state(vec![player(0, "A")]);
        let status = apply_command(&mut state, UserCommand::ExportResults).unwrap();
        assert!(status.contains("finish the auction"), "{status}");
    }

    #[tokio::test]
    async fn recovery_replays_previous_session() {
        let db = Database::open(":memory:").unwrap();
        // Simulate a previous session's persisted state.
        db.save_state("session_id", &serde_json::Value::String("session-x".to_string()))
            .unwrap();
        db.record_sale(
            &crate::auction::ledger::SaleRecord {
                player_id: "player-0".to_string(),
                player_name: "A".to_string(),
                team_id: "team-0".to_string(),
                team_name: "ThunderBolts".to_string(),
                category: "new-to-game".to_string(),
                role: "Batter".to_string(),
                base_price: 200,
                price: 700,
                effective_spend: 500,
            },
            "session-x",
        )
        .unwrap();

        let teams = vec![Team {
            id: "team-0".to_string(),
            name: "ThunderBolts".to_string(),
            captain: String::new(),
            vice_captain: None,
        }];
        let session =
            AuctionSession::with_seed(vec![player(0, "A"), player(1, "B")], teams, settings(), 5);
        let mut state = AppState::new(test_config(), session, db, SheetClient::Disabled);

        assert!(recover_from_db(&mut state).unwrap());
        assert_eq!(state.session_id, "session-x");
        assert!(state.session.ledger().is_assigned("player-0"));
        assert_eq!(state.session.ledger().remaining("team-0"), Some(99_500));
    }

    #[tokio::test]
    async fn snapshot_reflects_block_state() {
        let mut state = test_state(vec![player(0, "A")]);
        apply_command(&mut state, UserCommand::AcknowledgeNotice);
        apply_command(&mut state, UserCommand::SelectNext);
        apply_command(&mut state, UserCommand::ProposeTeam(0));

        let snapshot = build_snapshot(&state.session);
        match snapshot.stage {
            StageView::OnBlock {
                player,
                bid,
                increment,
                proposed_team,
            } => {
                assert_eq!(player.name, "A");
                assert_eq!(bid, 200);
                assert_eq!(increment, 500);
                assert_eq!(proposed_team.as_deref(), Some("ThunderBolts"));
            }
            other => panic!("unexpected stage {other:?}"),
        }
        assert_eq!(snapshot.total_players, 1);
        assert_eq!(snapshot.teams.len(), 1);
    }

    #[tokio::test]
    async fn finish_then_export_writes_report() {
        let mut state = test_state(vec![player(0, "A")]);
        let dir = std::env::temp_dir().join("auction-console-app-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("results.csv");
        state.config.export_path = path.to_str().unwrap().to_string();

        apply_command(&mut state, UserCommand::FinishAuction);
        let status = apply_command(&mut state, UserCommand::ExportResults).unwrap();
        assert!(status.contains("results exported"), "{status}");
        assert!(path.exists());
        std::fs::remove_file(&path).ok();
    }
}
