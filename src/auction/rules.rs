// Eligibility rule engine: a pure decision over the current ledger state.
//
// Budget sufficiency is deliberately not checked here; the ledger owns that
// at commit time, and the session combines both checks for the UI-facing
// "can this team buy at the current bid" question.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::ledger::RosterLedger;
use super::player::{display_tag, normalize, Player, Team};

/// Roster-composition rules, sourced from configuration.
#[derive(Debug, Clone)]
pub struct RosterRules {
    /// Absolute roster size limit per team (captain/vice-captain included).
    pub roster_size_cap: usize,
    /// Cap applied to categories without an explicit override.
    pub default_category_cap: usize,
    /// Per-category cap overrides (normalized tags), e.g. scarce
    /// specialist categories capped at 1.
    pub category_caps: HashMap<String, usize>,
    /// Categories rejected outright (normalized tags).
    pub blocked_categories: HashSet<String>,
}

impl RosterRules {
    /// The roster cap that applies to a category tag.
    pub fn cap_for_category(&self, category: &str) -> usize {
        self.category_caps
            .get(&normalize(category))
            .copied()
            .unwrap_or(self.default_category_cap)
    }
}

/// Why a team may not take the candidate player. The first failing rule
/// wins; its reason is what the operator sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    /// Projected roster size would exceed the absolute cap.
    RosterFull { cap: usize, current: usize },
    /// The candidate's category is in the configured block list.
    CategoryBlocked { category: String },
    /// Projected per-category count would exceed the category's cap.
    CategoryCapReached { category: String, cap: usize },
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleViolation::RosterFull { cap, current } => {
                write!(f, "max roster size reached ({current} of {cap} already signed)")
            }
            RuleViolation::CategoryBlocked { category } => {
                write!(f, "{} category is removed", display_tag(category))
            }
            RuleViolation::CategoryCapReached { category, cap } => {
                write!(
                    f,
                    "limit reached for this set (max {cap} in {} for this team, incl. C/VC)",
                    display_tag(category)
                )
            }
        }
    }
}

/// Decide whether `team` can take `player` under the roster rules.
///
/// Roster and category counts are recomputed by scanning the player list
/// against the ledger on every call; session sizes are tens of players, so
/// the scan is the simplest correct implementation. A candidate already
/// counted for this team (seeded captain/vice-captain) projects no
/// increment.
pub fn can_assign(
    team: &Team,
    player: &Player,
    players: &[Player],
    ledger: &RosterLedger,
    rules: &RosterRules,
) -> Result<(), RuleViolation> {
    let mut roster_size = 0usize;
    let mut category_count = 0usize;
    let candidate_category = normalize(&player.category);

    for p in players {
        let assigned_here = ledger
            .assignment(&p.id)
            .is_some_and(|a| a.team_id == team.id);
        if !assigned_here {
            continue;
        }
        roster_size += 1;
        if normalize(&p.category) == candidate_category {
            category_count += 1;
        }
    }

    let already_counted = ledger
        .assignment(&player.id)
        .is_some_and(|a| a.team_id == team.id);
    let count_if_new = usize::from(!already_counted);

    if roster_size + count_if_new > rules.roster_size_cap {
        return Err(RuleViolation::RosterFull {
            cap: rules.roster_size_cap,
            current: roster_size,
        });
    }

    if rules.blocked_categories.contains(&candidate_category) {
        return Err(RuleViolation::CategoryBlocked {
            category: candidate_category,
        });
    }

    let cap = rules.cap_for_category(&candidate_category);
    if category_count + count_if_new > cap {
        return Err(RuleViolation::CategoryCapReached {
            category: candidate_category,
            cap,
        });
    }

    Ok(())
}
