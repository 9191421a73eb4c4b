// Auction session controller: the state machine that surfaces players,
// receives operator decisions, and commits them against the ledger.
//
// States: Intro -> CategoryNotice -> AwaitingNext <-> OnBlock -> Complete.
// `AwaitingNext` is the "no player on the block" state in which the
// category transition rule runs; the tentative/confirm flow is the
// `proposed` sub-state of `OnBlock`.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};

use super::ledger::{pre_assignments, LedgerError, RosterLedger, SaleRecord};
use super::player::{display_tag, normalize, Player, Team};
use super::rules::{can_assign, RosterRules, RuleViolation};
use super::sequencer::{CategorySequencer, Phase, Transition};
use super::unsold::UnsoldQueue;

/// Everything the session needs from configuration, in plain data form.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Fixed category order for the primary phase.
    pub category_order: Vec<String>,
    /// Per-category bid increments (normalized tags).
    pub increments: HashMap<String, u32>,
    /// Fallback increment for unconfigured categories.
    pub default_increment: u32,
    /// Roster-composition rules.
    pub rules: RosterRules,
    /// Team id -> budget cap.
    pub team_caps: Vec<(String, u32)>,
}

/// One captain/vice-captain introduction card.
#[derive(Debug, Clone)]
pub struct IntroCard {
    pub team_id: String,
    pub team_name: String,
    pub role_label: String,
    pub person_name: String,
}

/// The controller's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Pre-auction captain/vice-captain introductions.
    Intro { index: usize },
    /// Blocking notice shown on every category or phase change.
    CategoryNotice { label: String, final_round: bool },
    /// No player on the block; the operator picks the next one.
    AwaitingNext,
    /// A player is surfaced. `proposed` is the tentative-sale sub-state.
    OnBlock {
        player_id: String,
        bid: u32,
        proposed: Option<String>,
    },
    /// Terminal. Selection requests are no-ops from here.
    Complete,
}

/// What `select_next` surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    OnBlock(String),
    Notice { label: String, final_round: bool },
    Complete,
}

/// Why a team button is disabled for the player on the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamDisable {
    InsufficientBudget,
    Rule(RuleViolation),
}

impl std::fmt::Display for TeamDisable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamDisable::InsufficientBudget => write!(f, "insufficient budget"),
            TeamDisable::Rule(violation) => write!(f, "{violation}"),
        }
    }
}

/// Per-team view of budgets and eligibility for the current block.
#[derive(Debug, Clone)]
pub struct TeamStatus {
    pub team_id: String,
    pub name: String,
    pub remaining: u32,
    pub cap: u32,
    pub roster_count: usize,
    pub disabled: Option<TeamDisable>,
}

/// Result of undoing the most recent sale.
#[derive(Debug, Clone)]
pub struct UndoneSale {
    pub player_id: String,
    pub player_name: String,
    pub team_id: String,
    pub price: u32,
    /// Whether the player was re-enqueued to the unsold queue (category
    /// already passed, or resurfacing phase).
    pub requeued: bool,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("that action is not available right now")]
    NotNow,

    #[error("no sale to undo")]
    NothingToUndo,

    #[error("no team at that position")]
    UnknownTeam,

    #[error("{0}")]
    Ineligible(RuleViolation),

    #[error("insufficient budget for the current bid")]
    InsufficientBudget,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Label used for the terminal resurfacing round's notice.
pub const FINAL_ROUND_LABEL: &str = "unsold players";

pub struct AuctionSession {
    players: Vec<Player>,
    teams: Vec<Team>,
    ledger: RosterLedger,
    sequencer: CategorySequencer,
    unsold: UnsoldQueue,
    rules: RosterRules,
    increments: HashMap<String, u32>,
    default_increment: u32,
    intro_queue: Vec<IntroCard>,
    state: SessionState,
    rng: StdRng,
}

impl AuctionSession {
    /// Create a session: build the ledger, seed captains/vice-captains and
    /// pre-sold rows, and queue the introductions.
    pub fn new(players: Vec<Player>, teams: Vec<Team>, settings: SessionSettings) -> Self {
        Self::build(players, teams, settings, StdRng::from_entropy())
    }

    /// Deterministic variant for tests: seeds the selection RNG.
    pub fn with_seed(
        players: Vec<Player>,
        teams: Vec<Team>,
        settings: SessionSettings,
        seed: u64,
    ) -> Self {
        Self::build(players, teams, settings, StdRng::seed_from_u64(seed))
    }

    fn build(
        players: Vec<Player>,
        teams: Vec<Team>,
        settings: SessionSettings,
        rng: StdRng,
    ) -> Self {
        let mut ledger = RosterLedger::new(settings.team_caps);
        let seeds = pre_assignments(&players, &teams);
        ledger
            .seed(&seeds)
            .expect("seeding a freshly constructed ledger cannot fail");
        info!("seeded {} pre-assignments", seeds.len());

        let intro_queue = build_intro_queue(&teams);
        let sequencer = CategorySequencer::new(settings.category_order);

        let state = if intro_queue.is_empty() {
            initial_notice(&sequencer)
        } else {
            SessionState::Intro { index: 0 }
        };

        let increments: HashMap<String, u32> = settings
            .increments
            .into_iter()
            .map(|(tag, inc)| (normalize(&tag), inc))
            .collect();

        AuctionSession {
            players,
            teams,
            ledger,
            sequencer,
            unsold: UnsoldQueue::new(),
            rules: settings.rules,
            increments,
            default_increment: settings.default_increment,
            intro_queue,
            state,
            rng,
        }
    }

    // -- Operator actions ---------------------------------------------------

    /// Acknowledge the current introduction card; after the last one the
    /// first category notice comes up.
    pub fn acknowledge_intro(&mut self) -> Result<(), SessionError> {
        let SessionState::Intro { index } = self.state else {
            return Err(SessionError::NotNow);
        };
        self.state = if index + 1 < self.intro_queue.len() {
            SessionState::Intro { index: index + 1 }
        } else {
            initial_notice(&self.sequencer)
        };
        Ok(())
    }

    /// Acknowledge the blocking category notice.
    pub fn acknowledge_notice(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::CategoryNotice { .. } => {
                self.state = SessionState::AwaitingNext;
                Ok(())
            }
            _ => Err(SessionError::NotNow),
        }
    }

    /// Surface the next candidate, or run the transition rule when the
    /// current category is exhausted.
    ///
    /// Primary phase picks uniformly at random among the players due in
    /// the current category; resurfacing serves the unsold queue head.
    /// A no-op once the session is complete.
    pub fn select_next(&mut self) -> Result<SelectOutcome, SessionError> {
        match self.state {
            SessionState::Complete => return Ok(SelectOutcome::Complete),
            SessionState::AwaitingNext => {}
            _ => return Err(SessionError::NotNow),
        }

        match self.sequencer.phase() {
            Phase::Primary => {
                let picked = {
                    let due = self
                        .sequencer
                        .due_players(&self.players, &self.ledger, &self.unsold);
                    due.choose(&mut self.rng)
                        .map(|p| (p.id.clone(), p.base_price))
                };
                if let Some((player_id, base_price)) = picked {
                    self.state = SessionState::OnBlock {
                        player_id: player_id.clone(),
                        bid: base_price,
                        proposed: None,
                    };
                    return Ok(SelectOutcome::OnBlock(player_id));
                }
                match self.sequencer.advance(&self.unsold) {
                    Transition::NextCategory(category) => {
                        self.state = SessionState::CategoryNotice {
                            label: category.clone(),
                            final_round: false,
                        };
                        Ok(SelectOutcome::Notice {
                            label: category,
                            final_round: false,
                        })
                    }
                    Transition::FinalRound => {
                        self.state = SessionState::CategoryNotice {
                            label: FINAL_ROUND_LABEL.to_string(),
                            final_round: true,
                        };
                        Ok(SelectOutcome::Notice {
                            label: FINAL_ROUND_LABEL.to_string(),
                            final_round: true,
                        })
                    }
                    Transition::Exhausted => {
                        self.state = SessionState::Complete;
                        Ok(SelectOutcome::Complete)
                    }
                }
            }
            Phase::Resurfacing => match self.unsold.head() {
                Some(head) => {
                    let player_id = head.to_string();
                    let base_price = self
                        .player_by_id(&player_id)
                        .map(|p| p.base_price)
                        .unwrap_or(0);
                    self.state = SessionState::OnBlock {
                        player_id: player_id.clone(),
                        bid: base_price,
                        proposed: None,
                    };
                    Ok(SelectOutcome::OnBlock(player_id))
                }
                None => {
                    self.state = SessionState::Complete;
                    Ok(SelectOutcome::Complete)
                }
            },
        }
    }

    /// Raise the bid by the current category's configured increment.
    /// Allowed both before and after a tentative assignment; the price is
    /// only fixed at confirmation.
    pub fn raise_bid(&mut self) -> Result<u32, SessionError> {
        let SessionState::OnBlock { player_id, .. } = &self.state else {
            return Err(SessionError::NotNow);
        };
        let increment = self
            .player_by_id(player_id)
            .map(|p| self.increment_for(&p.category))
            .unwrap_or(self.default_increment);
        match &mut self.state {
            SessionState::OnBlock { bid, .. } => {
                *bid = bid.saturating_add(increment);
                Ok(*bid)
            }
            _ => unreachable!("state checked above"),
        }
    }

    /// Tentatively assign the player on the block to a team (by position
    /// in the team list). Combines the eligibility verdict with a live
    /// budget comparison before allowing the proposal.
    pub fn propose_team(&mut self, team_index: usize) -> Result<(), SessionError> {
        let SessionState::OnBlock {
            player_id,
            bid,
            proposed: None,
        } = &self.state
        else {
            return Err(SessionError::NotNow);
        };
        let bid = *bid;
        let team = self
            .teams
            .get(team_index)
            .ok_or(SessionError::UnknownTeam)?;
        let player = self
            .player_by_id(player_id)
            .ok_or(SessionError::NotNow)?;

        can_assign(team, player, &self.players, &self.ledger, &self.rules)
            .map_err(SessionError::Ineligible)?;
        let remaining = self.ledger.remaining(&team.id).unwrap_or(0);
        if remaining < bid {
            return Err(SessionError::InsufficientBudget);
        }

        let team_id = team.id.clone();
        match &mut self.state {
            SessionState::OnBlock { proposed, .. } => *proposed = Some(team_id),
            _ => unreachable!("state checked above"),
        }
        Ok(())
    }

    /// Revert a tentative assignment without losing the current bid.
    pub fn reopen_bidding(&mut self) -> Result<(), SessionError> {
        match &mut self.state {
            SessionState::OnBlock {
                proposed: proposed @ Some(_),
                ..
            } => {
                *proposed = None;
                Ok(())
            }
            _ => Err(SessionError::NotNow),
        }
    }

    /// Finalize the tentative sale: commit to the ledger, drop the player
    /// from the unsold queue if present, and return to `AwaitingNext`.
    pub fn confirm_sale(&mut self) -> Result<SaleRecord, SessionError> {
        let SessionState::OnBlock {
            player_id,
            bid,
            proposed: Some(team_id),
        } = &self.state
        else {
            return Err(SessionError::NotNow);
        };
        let (player_id, bid, team_id) = (player_id.clone(), *bid, team_id.clone());

        let player = self
            .players
            .iter()
            .find(|p| p.id == player_id)
            .ok_or(SessionError::NotNow)?;
        let assignment = self.ledger.commit(player, &team_id, bid)?;
        self.unsold.mark_sold(&player_id);

        let team_name = self
            .teams
            .iter()
            .find(|t| t.id == team_id)
            .map(|t| t.name.clone())
            .unwrap_or_default();
        let record = SaleRecord {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            team_id,
            team_name,
            category: player.category.clone(),
            role: player.role.clone(),
            base_price: player.base_price,
            price: bid,
            effective_spend: assignment.effective_spend,
        };
        info!(
            "sold {} to {} for {} (effective spend {})",
            record.player_name, record.team_name, record.price, record.effective_spend
        );

        self.state = SessionState::AwaitingNext;
        Ok(record)
    }

    /// Mark the player on the block as unsold (the operator has already
    /// confirmed). Clears the block.
    pub fn mark_unsold(&mut self) -> Result<(), SessionError> {
        let SessionState::OnBlock { player_id, .. } = &self.state else {
            return Err(SessionError::NotNow);
        };
        let player_id = player_id.clone();
        self.unsold
            .mark_unsold(&player_id, self.sequencer.phase());
        self.state = SessionState::AwaitingNext;
        Ok(())
    }

    /// Undo the most recent sale, wherever the session currently stands.
    ///
    /// If the undone player's category already lies behind the sequencer
    /// position (or the session is resurfacing), the player goes to the
    /// unsold queue tail; otherwise it reappears naturally in its
    /// still-current primary category.
    pub fn undo_last(&mut self) -> Result<UndoneSale, SessionError> {
        let player_id = self
            .ledger
            .last_sale()
            .map(str::to_string)
            .ok_or(SessionError::NothingToUndo)?;
        let assignment = self
            .ledger
            .undo(&player_id)
            .ok_or(SessionError::NothingToUndo)?;

        let (player_name, category) = self
            .player_by_id(&player_id)
            .map(|p| (p.name.clone(), p.category.clone()))
            .unwrap_or_default();

        let requeued = self.sequencer.category_passed(&category);
        if requeued {
            self.unsold.enqueue_if_absent(&player_id);
        }
        info!(
            "undid sale of {} (requeued to unsold: {})",
            player_name, requeued
        );

        Ok(UndoneSale {
            player_id,
            player_name,
            team_id: assignment.team_id,
            price: assignment.price,
            requeued,
        })
    }

    /// Force completion, available to the operator at any time.
    pub fn finish(&mut self) {
        self.state = SessionState::Complete;
    }

    // -- Recovery -----------------------------------------------------------

    /// Replay persisted sales through the ledger (crash recovery). Returns
    /// the number restored; rows that no longer resolve are skipped.
    pub fn replay_sales(&mut self, sales: &[SaleRecord]) -> usize {
        let mut restored = 0;
        for sale in sales {
            let Some(player) = self.players.iter().find(|p| p.id == sale.player_id) else {
                warn!("recovery: unknown player {}; skipping", sale.player_id);
                continue;
            };
            match self.ledger.commit(player, &sale.team_id, sale.price) {
                Ok(_) => restored += 1,
                Err(e) => warn!("recovery: could not replay {}: {e}", sale.player_name),
            }
        }
        restored
    }

    // -- Read accessors -----------------------------------------------------

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn ledger(&self) -> &RosterLedger {
        &self.ledger
    }

    pub fn unsold(&self) -> &UnsoldQueue {
        &self.unsold
    }

    pub fn phase(&self) -> Phase {
        self.sequencer.phase()
    }

    pub fn intro_card(&self) -> Option<&IntroCard> {
        match self.state {
            SessionState::Intro { index } => self.intro_queue.get(index),
            _ => None,
        }
    }

    pub fn intro_len(&self) -> usize {
        self.intro_queue.len()
    }

    pub fn player_by_id(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn team_by_id(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// The player currently on the block, if any.
    pub fn current_player(&self) -> Option<&Player> {
        match &self.state {
            SessionState::OnBlock { player_id, .. } => self.player_by_id(player_id),
            _ => None,
        }
    }

    /// Display label for the live set.
    pub fn category_label(&self) -> String {
        match self.sequencer.phase() {
            Phase::Resurfacing => "FINAL UNSOLD ROUND".to_string(),
            Phase::Primary => self
                .sequencer
                .current_category()
                .map(display_tag)
                .unwrap_or_default(),
        }
    }

    /// The bid increment for a category tag.
    pub fn increment_for(&self, category: &str) -> u32 {
        self.increments
            .get(&normalize(category))
            .copied()
            .unwrap_or(self.default_increment)
    }

    pub fn total_players(&self) -> usize {
        self.players.len()
    }

    pub fn assigned_count(&self) -> usize {
        self.ledger.assigned_count()
    }

    /// Players not yet assigned anywhere (primary queues plus unsold).
    pub fn remaining_count(&self) -> usize {
        self.players
            .iter()
            .filter(|p| !self.ledger.is_assigned(&p.id))
            .count()
    }

    /// Per-team budgets plus, when a player is on the block, the
    /// buy-eligibility verdict at the current bid.
    ///
    /// Disable priority mirrors the operator-facing board: roster-size cap
    /// first, then budget, then the remaining roster rules.
    pub fn team_statuses(&self) -> Vec<TeamStatus> {
        let on_block = match &self.state {
            SessionState::OnBlock { player_id, bid, .. } => self
                .player_by_id(player_id)
                .map(|player| (player, *bid)),
            _ => None,
        };

        self.teams
            .iter()
            .map(|team| {
                let remaining = self.ledger.remaining(&team.id).unwrap_or(0);
                let disabled = on_block.and_then(|(player, bid)| {
                    let verdict =
                        can_assign(team, player, &self.players, &self.ledger, &self.rules);
                    match verdict {
                        Err(v @ RuleViolation::RosterFull { .. }) => Some(TeamDisable::Rule(v)),
                        _ if remaining < bid => Some(TeamDisable::InsufficientBudget),
                        Err(v) => Some(TeamDisable::Rule(v)),
                        Ok(()) => None,
                    }
                });
                TeamStatus {
                    team_id: team.id.clone(),
                    name: team.name.clone(),
                    remaining,
                    cap: self.ledger.cap(&team.id).unwrap_or(0),
                    roster_count: self.ledger.roster_count(&team.id),
                    disabled,
                }
            })
            .collect()
    }
}

/// Build the introduction queue: captain then vice-captain per team, in
/// team order. People who are not in the player list still get a card.
fn build_intro_queue(teams: &[Team]) -> Vec<IntroCard> {
    let mut queue = Vec::new();
    for team in teams {
        if !team.captain.trim().is_empty() {
            queue.push(IntroCard {
                team_id: team.id.clone(),
                team_name: team.name.clone(),
                role_label: "Captain".to_string(),
                person_name: team.captain.clone(),
            });
        }
        if let Some(vc) = &team.vice_captain {
            if !vc.trim().is_empty() {
                queue.push(IntroCard {
                    team_id: team.id.clone(),
                    team_name: team.name.clone(),
                    role_label: "Vice-Captain".to_string(),
                    person_name: vc.clone(),
                });
            }
        }
    }
    queue
}

/// The notice shown when the auction proper begins.
fn initial_notice(sequencer: &CategorySequencer) -> SessionState {
    match sequencer.current_category() {
        Some(category) => SessionState::CategoryNotice {
            label: category.to_string(),
            final_round: false,
        },
        // Empty category order: nothing can ever surface.
        None => SessionState::Complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn player(id: usize, name: &str, category: &str, base_price: u32) -> Player {
        Player {
            id: format!("player-{id}"),
            name: name.to_string(),
            role: "All-rounder".to_string(),
            category: category.to_string(),
            base_price,
            photo: String::new(),
            pre_assigned_team: None,
            is_pre_sold: false,
        }
    }

    fn team(id: usize, name: &str, captain: &str) -> Team {
        Team {
            id: format!("team-{id}"),
            name: name.to_string(),
            captain: captain.to_string(),
            vice_captain: None,
        }
    }

    fn settings(order: &[&str]) -> SessionSettings {
        let mut increments = HashMap::new();
        increments.insert("allrounders".to_string(), 2_000);
        increments.insert("allrounders-1".to_string(), 1_000);
        increments.insert("new-to-game".to_string(), 200);
        SessionSettings {
            category_order: order.iter().map(|s| s.to_string()).collect(),
            increments,
            default_increment: 500,
            rules: RosterRules {
                roster_size_cap: 10,
                default_category_cap: 2,
                category_caps: HashMap::new(),
                blocked_categories: HashSet::new(),
            },
            team_caps: vec![
                ("team-0".to_string(), 100_000),
                ("team-1".to_string(), 100_000),
            ],
        }
    }

    /// Two teams with no captains in the player list (no intro cards, no
    /// seeded assignments) and the given players.
    fn bare_session(players: Vec<Player>, order: &[&str]) -> AuctionSession {
        let teams = vec![
            Team {
                id: "team-0".to_string(),
                name: "ThunderBolts".to_string(),
                captain: String::new(),
                vice_captain: None,
            },
            Team {
                id: "team-1".to_string(),
                name: "Kingsmen".to_string(),
                captain: String::new(),
                vice_captain: None,
            },
        ];
        AuctionSession::with_seed(players, teams, settings(order), 7)
    }

    /// Drive the session from a notice to a player on the block.
    fn surface(session: &mut AuctionSession) -> String {
        if matches!(session.state(), SessionState::CategoryNotice { .. }) {
            session.acknowledge_notice().unwrap();
        }
        match session.select_next().unwrap() {
            SelectOutcome::OnBlock(id) => id,
            other => panic!("expected a player on the block, got {other:?}"),
        }
    }

    #[test]
    fn intro_queue_runs_before_first_notice() {
        let players = vec![
            player(0, "Cap One", "new-to-game", 200),
            player(1, "Cap Two", "new-to-game", 200),
        ];
        let teams = vec![
            Team {
                id: "team-0".to_string(),
                name: "ThunderBolts".to_string(),
                captain: "Cap One".to_string(),
                vice_captain: Some("Cap Two".to_string()),
            },
            team(1, "Kingsmen", "Cap Two"),
        ];
        let mut session =
            AuctionSession::with_seed(players, teams, settings(&["new-to-game"]), 1);

        assert_eq!(session.intro_len(), 3);
        assert!(matches!(session.state(), SessionState::Intro { index: 0 }));
        let card = session.intro_card().unwrap();
        assert_eq!(card.role_label, "Captain");
        assert_eq!(card.person_name, "Cap One");

        session.acknowledge_intro().unwrap();
        assert_eq!(
            session.intro_card().unwrap().role_label,
            "Vice-Captain"
        );
        session.acknowledge_intro().unwrap();
        session.acknowledge_intro().unwrap();
        assert!(matches!(
            session.state(),
            SessionState::CategoryNotice { final_round: false, .. }
        ));
    }

    #[test]
    fn no_intros_starts_at_first_category_notice() {
        let session = bare_session(vec![player(0, "A", "new-to-game", 200)], &["new-to-game"]);
        match session.state() {
            SessionState::CategoryNotice { label, final_round } => {
                assert_eq!(label, "new-to-game");
                assert!(!final_round);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn select_surfaces_random_member_of_current_category() {
        let players = vec![
            player(0, "A", "new-to-game", 200),
            player(1, "B", "new-to-game", 200),
            player(2, "C", "wk-bat-bowl", 500),
        ];
        let mut session = bare_session(players, &["new-to-game", "wk-bat-bowl"]);
        let id = surface(&mut session);
        assert!(id == "player-0" || id == "player-1", "picked {id}");
        let on_block = session.current_player().unwrap();
        assert_eq!(normalize(&on_block.category), "new-to-game");
        match session.state() {
            SessionState::OnBlock { bid, proposed, .. } => {
                assert_eq!(*bid, 200);
                assert!(proposed.is_none());
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn empty_category_advances_with_blocking_notice() {
        // No players in the first category at all.
        let players = vec![player(0, "A", "wk-bat-bowl", 500)];
        let mut session = bare_session(players, &["new-to-game", "wk-bat-bowl"]);
        session.acknowledge_notice().unwrap();
        let outcome = session.select_next().unwrap();
        assert_eq!(
            outcome,
            SelectOutcome::Notice {
                label: "wk-bat-bowl".to_string(),
                final_round: false,
            }
        );
        // The notice blocks: selecting again without acknowledging is refused.
        assert!(matches!(session.select_next(), Err(SessionError::NotNow)));
        session.acknowledge_notice().unwrap();
        assert_eq!(surface(&mut session), "player-0");
    }

    #[test]
    fn tentative_then_confirm_commits_and_clears_block() {
        let players = vec![player(0, "A", "new-to-game", 5_000)];
        let mut session = bare_session(players, &["new-to-game"]);
        surface(&mut session);

        // Raise by three increments of 1,000 via a custom table: the
        // new-to-game increment here is 200, so use explicit raises.
        session.raise_bid().unwrap();
        session.raise_bid().unwrap();
        assert!(matches!(
            session.state(),
            SessionState::OnBlock { bid: 5_400, .. }
        ));

        session.propose_team(1).unwrap();
        assert!(matches!(
            session.state(),
            SessionState::OnBlock { proposed: Some(_), .. }
        ));

        let record = session.confirm_sale().unwrap();
        assert_eq!(record.team_id, "team-1");
        assert_eq!(record.price, 5_400);
        assert_eq!(record.effective_spend, 400);
        assert_eq!(session.ledger().remaining("team-1"), Some(99_600));
        assert_eq!(session.state(), &SessionState::AwaitingNext);
    }

    #[test]
    fn budget_scenario_three_increments_of_one_thousand() {
        let players = vec![player(0, "A", "allrounders-1", 5_000)];
        let mut session = bare_session(players, &["allrounders-1"]);
        surface(&mut session);
        for _ in 0..3 {
            session.raise_bid().unwrap();
        }
        session.propose_team(0).unwrap();
        let record = session.confirm_sale().unwrap();
        assert_eq!(record.price, 8_000);
        assert_eq!(session.ledger().remaining("team-0"), Some(97_000));
    }

    #[test]
    fn reopen_bidding_keeps_bid_amount() {
        let players = vec![player(0, "A", "new-to-game", 1_000)];
        let mut session = bare_session(players, &["new-to-game"]);
        surface(&mut session);
        session.raise_bid().unwrap();
        session.propose_team(0).unwrap();
        session.reopen_bidding().unwrap();
        match session.state() {
            SessionState::OnBlock { bid, proposed, .. } => {
                assert_eq!(*bid, 1_200);
                assert!(proposed.is_none());
            }
            other => panic!("unexpected state {other:?}"),
        }
        // Bid can still move and a different team can be proposed.
        session.raise_bid().unwrap();
        session.propose_team(1).unwrap();
        let record = session.confirm_sale().unwrap();
        assert_eq!(record.price, 1_400);
        assert_eq!(record.team_id, "team-1");
    }

    #[test]
    fn confirm_without_proposal_is_refused() {
        let players = vec![player(0, "A", "new-to-game", 1_000)];
        let mut session = bare_session(players, &["new-to-game"]);
        surface(&mut session);
        assert!(matches!(session.confirm_sale(), Err(SessionError::NotNow)));
    }

    #[test]
    fn increment_uses_category_table_with_default_fallback() {
        let players = vec![
            player(0, "A", "allrounders", 10_000),
            player(1, "B", "unlisted-set", 1_000),
        ];
        let mut session = bare_session(players, &["allrounders", "unlisted-set"]);
        surface(&mut session);
        assert_eq!(session.raise_bid().unwrap(), 12_000); // configured: 2,000
        session.mark_unsold().unwrap();
        session.select_next().unwrap(); // notice for unlisted-set
        session.acknowledge_notice().unwrap();
        session.select_next().unwrap();
        assert_eq!(session.raise_bid().unwrap(), 1_500); // default: 500
    }

    #[test]
    fn propose_rejects_over_budget_team() {
        let mut s = settings(&["allrounders"]);
        s.team_caps = vec![("team-0".to_string(), 4_000), ("team-1".to_string(), 100_000)];
        let players = vec![player(0, "A", "allrounders", 5_000)];
        let teams = vec![
            Team {
                id: "team-0".to_string(),
                name: "Poor".to_string(),
                captain: String::new(),
                vice_captain: None,
            },
            Team {
                id: "team-1".to_string(),
                name: "Rich".to_string(),
                captain: String::new(),
                vice_captain: None,
            },
        ];
        let mut session = AuctionSession::with_seed(players, teams, s, 3);
        surface(&mut session);
        assert!(matches!(
            session.propose_team(0),
            Err(SessionError::InsufficientBudget)
        ));
        assert!(session.propose_team(1).is_ok());
    }

    #[test]
    fn propose_rejects_rule_violation() {
        let mut s = settings(&["mystery"]);
        s.rules.category_caps.insert("mystery".to_string(), 1);
        let players = vec![
            player(0, "A", "mystery", 1_000),
            player(1, "B", "mystery", 1_000),
        ];
        let teams = vec![
            Team {
                id: "team-0".to_string(),
                name: "ThunderBolts".to_string(),
                captain: String::new(),
                vice_captain: None,
            },
            Team {
                id: "team-1".to_string(),
                name: "Kingsmen".to_string(),
                captain: String::new(),
                vice_captain: None,
            },
        ];
        let mut session = AuctionSession::with_seed(players, teams, s, 3);

        let first = surface(&mut session);
        session.propose_team(0).unwrap();
        session.confirm_sale().unwrap();
        let second = surface(&mut session);
        assert_ne!(first, second);
        assert!(matches!(
            session.propose_team(0),
            Err(SessionError::Ineligible(RuleViolation::CategoryCapReached { .. }))
        ));
        assert!(session.propose_team(1).is_ok());
    }

    #[test]
    fn unsold_players_resurface_fifo_in_final_round() {
        let players = vec![
            player(0, "A", "new-to-game", 200),
            player(1, "B", "new-to-game", 200),
        ];
        let mut session = bare_session(players, &["new-to-game"]);

        // Mark both unsold, in surface order.
        let first = surface(&mut session);
        session.mark_unsold().unwrap();
        let second = match session.select_next().unwrap() {
            SelectOutcome::OnBlock(id) => id,
            other => panic!("expected player, got {other:?}"),
        };
        session.mark_unsold().unwrap();

        // Category exhausted -> final round notice.
        let outcome = session.select_next().unwrap();
        assert_eq!(
            outcome,
            SelectOutcome::Notice {
                label: FINAL_ROUND_LABEL.to_string(),
                final_round: true,
            }
        );
        assert_eq!(session.phase(), Phase::Resurfacing);
        session.acknowledge_notice().unwrap();

        // FIFO: the first-marked player comes back first.
        let resurfaced = match session.select_next().unwrap() {
            SelectOutcome::OnBlock(id) => id,
            other => panic!("expected player, got {other:?}"),
        };
        assert_eq!(resurfaced, first);

        // Marked unsold again: cycles to the tail, not dropped.
        session.mark_unsold().unwrap();
        assert_eq!(session.unsold().len(), 2);
        let next = match session.select_next().unwrap() {
            SelectOutcome::OnBlock(id) => id,
            other => panic!("expected player, got {other:?}"),
        };
        assert_eq!(next, second);
    }

    #[test]
    fn sale_in_final_round_removes_from_queue_and_completes() {
        let players = vec![player(0, "A", "new-to-game", 200)];
        let mut session = bare_session(players, &["new-to-game"]);
        surface(&mut session);
        session.mark_unsold().unwrap();
        session.select_next().unwrap(); // final round notice
        session.acknowledge_notice().unwrap();
        session.select_next().unwrap(); // player back on the block
        session.propose_team(0).unwrap();
        session.confirm_sale().unwrap();
        assert!(session.unsold().is_empty());
        assert_eq!(session.select_next().unwrap(), SelectOutcome::Complete);
        assert_eq!(session.state(), &SessionState::Complete);
        // Re-invoking selection is a no-op.
        assert_eq!(session.select_next().unwrap(), SelectOutcome::Complete);
    }

    #[test]
    fn undo_requeues_when_category_already_passed() {
        let players = vec![
            player(0, "A", "new-to-game", 200),
            player(1, "B", "wk-bat-bowl", 500),
        ];
        let mut session = bare_session(players, &["new-to-game", "wk-bat-bowl"]);
        surface(&mut session);
        session.propose_team(0).unwrap();
        session.confirm_sale().unwrap();

        // Move into the next category before undoing.
        session.select_next().unwrap(); // notice wk-bat-bowl
        session.acknowledge_notice().unwrap();

        let undone = session.undo_last().unwrap();
        assert_eq!(undone.player_id, "player-0");
        assert!(undone.requeued);
        assert!(session.unsold().contains("player-0"));
        assert_eq!(session.ledger().remaining("team-0"), Some(100_000));
    }

    #[test]
    fn undo_in_current_category_returns_player_to_primary_queue() {
        let players = vec![
            player(0, "A", "new-to-game", 200),
            player(1, "B", "new-to-game", 200),
        ];
        let mut session = bare_session(players, &["new-to-game"]);
        let sold = surface(&mut session);
        session.propose_team(0).unwrap();
        session.confirm_sale().unwrap();

        let undone = session.undo_last().unwrap();
        assert!(!undone.requeued);
        assert!(!session.unsold().contains(&sold));
        assert_eq!(session.remaining_count(), 2);
        // Both players are back in the still-current primary category.
        let id = match session.select_next().unwrap() {
            SelectOutcome::OnBlock(id) => id,
            other => panic!("expected player, got {other:?}"),
        };
        assert!(id == "player-0" || id == "player-1");
    }

    #[test]
    fn undo_with_no_sales_is_refused() {
        let mut session = bare_session(vec![player(0, "A", "new-to-game", 200)], &["new-to-game"]);
        assert!(matches!(
            session.undo_last(),
            Err(SessionError::NothingToUndo)
        ));
    }

    #[test]
    fn undo_only_reaches_the_most_recent_sale() {
        let players = vec![
            player(0, "A", "new-to-game", 200),
            player(1, "B", "new-to-game", 200),
        ];
        let mut session = bare_session(players, &["new-to-game"]);
        surface(&mut session);
        session.propose_team(0).unwrap();
        session.confirm_sale().unwrap();
        session.select_next().unwrap();
        session.propose_team(1).unwrap();
        session.confirm_sale().unwrap();

        session.undo_last().unwrap();
        // The pointer is spent; a second undo has nothing to target.
        assert!(matches!(
            session.undo_last(),
            Err(SessionError::NothingToUndo)
        ));
        assert_eq!(session.assigned_count(), 1);
    }

    #[test]
    fn finish_forces_completion_from_any_state() {
        let players = vec![player(0, "A", "new-to-game", 200)];
        let mut session = bare_session(players, &["new-to-game"]);
        surface(&mut session);
        session.finish();
        assert_eq!(session.state(), &SessionState::Complete);
        assert_eq!(session.select_next().unwrap(), SelectOutcome::Complete);
    }

    #[test]
    fn pre_sold_players_never_surface() {
        let mut sold = player(0, "Pre Sold", "new-to-game", 0);
        sold.is_pre_sold = true;
        sold.pre_assigned_team = Some("ThunderBolts".to_string());
        let players = vec![sold, player(1, "A", "new-to-game", 200)];
        let mut session = bare_session(players, &["new-to-game"]);

        assert_eq!(session.assigned_count(), 1);
        assert_eq!(surface(&mut session), "player-1");
        session.mark_unsold().unwrap();
        // Only the live player remains anywhere.
        assert_eq!(session.remaining_count(), 1);
    }

    #[test]
    fn team_statuses_surface_disable_reasons_on_block() {
        let mut s = settings(&["allrounders"]);
        s.team_caps = vec![("team-0".to_string(), 4_000), ("team-1".to_string(), 100_000)];
        let players = vec![player(0, "A", "allrounders", 5_000)];
        let teams = vec![
            Team {
                id: "team-0".to_string(),
                name: "Poor".to_string(),
                captain: String::new(),
                vice_captain: None,
            },
            Team {
                id: "team-1".to_string(),
                name: "Rich".to_string(),
                captain: String::new(),
                vice_captain: None,
            },
        ];
        let mut session = AuctionSession::with_seed(players, teams, s, 3);
        surface(&mut session);

        let statuses = session.team_statuses();
        assert_eq!(
            statuses[0].disabled,
            Some(TeamDisable::InsufficientBudget)
        );
        assert!(statuses[1].disabled.is_none());
        assert_eq!(statuses[1].remaining, 100_000);
    }

    #[test]
    fn replay_sales_restores_budgets_and_assignments() {
        let players = vec![
            player(0, "A", "new-to-game", 200),
            player(1, "B", "new-to-game", 200),
        ];
        let mut session = bare_session(players.clone(), &["new-to-game"]);
        let sales = vec![SaleRecord {
            player_id: "player-0".to_string(),
            player_name: "A".to_string(),
            team_id: "team-0".to_string(),
            team_name: "ThunderBolts".to_string(),
            category: "new-to-game".to_string(),
            role: "All-rounder".to_string(),
            base_price: 200,
            price: 1_200,
            effective_spend: 1_000,
        }];
        assert_eq!(session.replay_sales(&sales), 1);
        assert!(session.ledger().is_assigned("player-0"));
        assert_eq!(session.ledger().remaining("team-0"), Some(99_000));
        // The replayed player no longer surfaces.
        assert_eq!(surface(&mut session), "player-1");
    }
}
