// Message types exchanged between the TUI and the app orchestrator.
//
// The TUI never mutates auction state directly: every operator action
// becomes a `UserCommand`, and the orchestrator answers with a fresh
// `SessionSnapshot` (the state is tens of players, so full snapshots are
// the simplest correct transport).

/// Operator actions sent from the TUI to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    AcknowledgeIntro,
    AcknowledgeNotice,
    SelectNext,
    RaiseBid,
    /// Tentatively assign to the team at this position in the team list.
    ProposeTeam(usize),
    ReopenBidding,
    ConfirmSale,
    /// Sent after the TUI-side confirmation prompt.
    MarkUnsold,
    UndoLast,
    FinishAuction,
    ExportResults,
    Quit,
}

/// Updates pushed from the orchestrator to the TUI.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    Snapshot(Box<SessionSnapshot>),
    /// Transient status-line message (rejections, sale confirmations).
    Status(String),
}

/// What the dashboard is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageView {
    Intro {
        team_name: String,
        role_label: String,
        person_name: String,
        index: usize,
        total: usize,
    },
    Notice {
        label: String,
        final_round: bool,
    },
    AwaitingNext {
        /// Both queues are empty: completion should be offered.
        exhausted: bool,
    },
    OnBlock {
        player: PlayerView,
        bid: u32,
        increment: u32,
        /// Display name of the tentatively assigned team, if any.
        proposed_team: Option<String>,
    },
    Complete,
}

/// The player on the block, shaped for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    pub name: String,
    pub role: String,
    pub category: String,
    pub base_price: u32,
}

/// Per-team line for the team grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamStatusView {
    pub name: String,
    pub remaining: u32,
    pub cap: u32,
    pub roster_count: usize,
    /// Why this team cannot take the current player, if it cannot.
    pub disabled: Option<String>,
}

/// The most recent sale, for the sidebar and the undo hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSaleView {
    pub player_name: String,
    pub team_name: String,
    pub price: u32,
}

/// Full render state for one frame of the dashboard.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub stage: StageView,
    /// Display label for the live set (category or final round).
    pub category_label: String,
    pub teams: Vec<TeamStatusView>,
    /// Unsold queue in FIFO order, as display names.
    pub unsold: Vec<String>,
    pub total_players: usize,
    pub assigned_count: usize,
    pub remaining_count: usize,
    pub last_sale: Option<LastSaleView>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        SessionSnapshot {
            stage: StageView::AwaitingNext { exhausted: false },
            category_label: String::new(),
            teams: Vec::new(),
            unsold: Vec::new(),
            total_players: 0,
            assigned_count: 0,
            remaining_count: 0,
            last_sale: None,
        }
    }
}
