// Roster ledger: per-team budgets and the player -> assignment map.
//
// The ledger is the only mutable shared state in the system. Every other
// component reads it through the accessors below; mutation funnels through
// `seed`, `commit`, and `undo` so the budget and single-assignment
// invariants are checked in one place.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::player::{normalize, same_name, Player, Team};

/// A player's assignment to a team.
///
/// At most one assignment exists per player at any time. `effective_spend`
/// is the portion of the sale price above the player's base price; it is
/// what was deducted from the team's purse and what `undo` restores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub team_id: String,
    pub price: u32,
    pub effective_spend: u32,
    /// Seeded before bidding (captain, vice-captain, or pre-sold row).
    pub pre_assigned: bool,
    /// Seeded specifically via the "sold" base-price token.
    pub pre_sold: bool,
}

/// A completed sale, as handed to the persistence collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub player_id: String,
    pub player_name: String,
    pub team_id: String,
    pub team_name: String,
    pub category: String,
    pub role: String,
    pub base_price: u32,
    pub price: u32,
    pub effective_spend: u32,
}

/// A seed entry installed before any bidding begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreAssignment {
    pub player_id: String,
    pub team_id: String,
    pub pre_sold: bool,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("bid of {price} is invalid (must be positive and at least the base price of {base_price})")]
    InvalidBid { price: u32, base_price: u32 },

    #[error("bid of {price} exceeds the team's remaining budget of {remaining}")]
    BudgetExceeded { price: u32, remaining: u32 },

    #[error("player {player_id} is already assigned")]
    AlreadyAssigned { player_id: String },

    #[error("unknown team {team_id}")]
    UnknownTeam { team_id: String },

    #[error("ledger has already been seeded")]
    AlreadySeeded,
}

/// Owns per-team budgets and the assignment map for one auction session.
#[derive(Debug, Clone)]
pub struct RosterLedger {
    /// Per-team budget cap (never mutated after construction).
    caps: HashMap<String, u32>,
    /// Per-team remaining purse. Invariant: 0 <= remaining <= cap.
    remaining: HashMap<String, u32>,
    /// Player id -> assignment. Invariant: at most one entry per player.
    assignments: HashMap<String, Assignment>,
    /// Player id of the most recent `commit`, for the UI's undo policy.
    /// The ledger itself can undo any assignment by id.
    last_sale: Option<String>,
    seeded: bool,
}

impl RosterLedger {
    /// Create a ledger with the given per-team budget caps.
    pub fn new(caps: Vec<(String, u32)>) -> Self {
        let caps: HashMap<String, u32> = caps.into_iter().collect();
        let remaining = caps.clone();
        RosterLedger {
            caps,
            remaining,
            assignments: HashMap::new(),
            last_sale: None,
            seeded: false,
        }
    }

    /// Install captain/vice-captain/pre-sold entries at price 0.
    ///
    /// Must run exactly once per session, before any bidding. Seed entries
    /// are not validated against roster caps; they define the caps'
    /// starting counts instead.
    pub fn seed(&mut self, entries: &[PreAssignment]) -> Result<(), LedgerError> {
        if self.seeded {
            return Err(LedgerError::AlreadySeeded);
        }
        for entry in entries {
            self.assignments.insert(
                entry.player_id.clone(),
                Assignment {
                    team_id: entry.team_id.clone(),
                    price: 0,
                    effective_spend: 0,
                    pre_assigned: true,
                    pre_sold: entry.pre_sold,
                },
            );
        }
        self.seeded = true;
        Ok(())
    }

    /// Commit a sale: validate, create the assignment, and deduct the
    /// effective spend from the team's purse.
    ///
    /// All checks run before any mutation, so a rejected commit leaves the
    /// ledger untouched. The full bid price (not the effective spend) is
    /// compared against the remaining purse.
    pub fn commit(
        &mut self,
        player: &Player,
        team_id: &str,
        price: u32,
    ) -> Result<Assignment, LedgerError> {
        if self.assignments.contains_key(&player.id) {
            return Err(LedgerError::AlreadyAssigned {
                player_id: player.id.clone(),
            });
        }
        let remaining = *self
            .remaining
            .get(team_id)
            .ok_or_else(|| LedgerError::UnknownTeam {
                team_id: team_id.to_string(),
            })?;
        if price == 0 || price < player.base_price {
            return Err(LedgerError::InvalidBid {
                price,
                base_price: player.base_price,
            });
        }
        if price > remaining {
            return Err(LedgerError::BudgetExceeded { price, remaining });
        }

        let effective_spend = price.saturating_sub(player.base_price);
        let assignment = Assignment {
            team_id: team_id.to_string(),
            price,
            effective_spend,
            pre_assigned: false,
            pre_sold: false,
        };
        self.assignments.insert(player.id.clone(), assignment.clone());
        *self.remaining.get_mut(team_id).expect("team checked above") =
            remaining - effective_spend;
        self.last_sale = Some(player.id.clone());
        Ok(assignment)
    }

    /// Undo an assignment by player id.
    ///
    /// Silent no-op (returns `None`) when the player has no assignment.
    /// Restores the exact effective spend and clears the last-sale pointer
    /// when it pointed at this player.
    pub fn undo(&mut self, player_id: &str) -> Option<Assignment> {
        let assignment = self.assignments.remove(player_id)?;
        if let Some(remaining) = self.remaining.get_mut(&assignment.team_id) {
            *remaining += assignment.effective_spend;
        }
        if self.last_sale.as_deref() == Some(player_id) {
            self.last_sale = None;
        }
        Some(assignment)
    }

    /// Remaining purse for a team.
    pub fn remaining(&self, team_id: &str) -> Option<u32> {
        self.remaining.get(team_id).copied()
    }

    /// Budget cap for a team.
    pub fn cap(&self, team_id: &str) -> Option<u32> {
        self.caps.get(team_id).copied()
    }

    /// The assignment for a player, if any.
    pub fn assignment(&self, player_id: &str) -> Option<&Assignment> {
        self.assignments.get(player_id)
    }

    /// Whether a player currently holds an assignment.
    pub fn is_assigned(&self, player_id: &str) -> bool {
        self.assignments.contains_key(player_id)
    }

    /// Player id of the most recent commit, if it has not been undone.
    pub fn last_sale(&self) -> Option<&str> {
        self.last_sale.as_deref()
    }

    /// Number of players currently attributed to a team (seeds included).
    pub fn roster_count(&self, team_id: &str) -> usize {
        self.assignments
            .values()
            .filter(|a| a.team_id == team_id)
            .count()
    }

    /// Sum of sale prices paid by a team (seeds contribute 0).
    pub fn total_price_paid(&self, team_id: &str) -> u32 {
        self.assignments
            .values()
            .filter(|a| a.team_id == team_id)
            .map(|a| a.price)
            .sum()
    }

    /// Number of assignments held (useful for progress display).
    pub fn assigned_count(&self) -> usize {
        self.assignments.len()
    }
}

/// Build the seed plan: captains, vice-captains, and pre-tagged rows.
///
/// Captain/vice-captain names resolve by normalized exact match against the
/// player list; unresolved names are skipped with a warning (the pairing is
/// simply absent). Rows pre-tagged to a team via the sheet's team column
/// never override an existing captain/vice-captain mapping.
pub fn pre_assignments(players: &[Player], teams: &[Team]) -> Vec<PreAssignment> {
    let mut seeds: Vec<PreAssignment> = Vec::new();
    let mut seeded_ids: std::collections::HashSet<String> = std::collections::HashSet::new();

    for team in teams {
        let mut seed_person = |person: &str, label: &str| {
            match Player::find_by_name(players, person) {
                Some(player) => {
                    if seeded_ids.insert(player.id.clone()) {
                        seeds.push(PreAssignment {
                            player_id: player.id.clone(),
                            team_id: team.id.clone(),
                            pre_sold: false,
                        });
                    }
                }
                None => {
                    warn!(
                        "{} '{}' of team '{}' not found in player list; skipping pairing",
                        label, person, team.name
                    );
                }
            }
        };

        seed_person(team.captain.as_str(), "captain");
        if let Some(vc) = &team.vice_captain {
            seed_person(vc.as_str(), "vice-captain");
        }
    }

    for team in teams {
        let team_name_norm = normalize(&team.name);
        for player in players {
            let Some(tagged) = &player.pre_assigned_team else {
                continue;
            };
            if seeded_ids.contains(&player.id) {
                continue;
            }
            if !normalize(tagged).is_empty() && same_name(tagged, &team_name_norm) {
                seeded_ids.insert(player.id.clone());
                seeds.push(PreAssignment {
                    player_id: player.id.clone(),
                    team_id: team.id.clone(),
                    pre_sold: player.is_pre_sold,
                });
            }
        }
    }

    seeds
}
