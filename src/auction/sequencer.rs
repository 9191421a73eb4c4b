// Category sequencer: ordered progression through the configured category
// list during the primary phase, and the transition into resurfacing.

use super::ledger::RosterLedger;
use super::player::{normalize, Player};
use super::unsold::UnsoldQueue;

/// Which pass of the auction is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The initial pass through all configured categories in order.
    Primary,
    /// The terminal FIFO pass over the unsold queue.
    Resurfacing,
}

/// The result of a transition check when the current category is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Advanced to the next primary category (index moved by exactly 1).
    NextCategory(String),
    /// Switched into the terminal resurfacing round.
    FinalRound,
    /// Nothing left to surface anywhere: the auction-complete condition.
    Exhausted,
}

/// Owns the category order, the current index, and the phase flag.
///
/// The index only moves forward, and the phase only moves from `Primary`
/// to `Resurfacing`; there is no way back short of starting a new session.
#[derive(Debug, Clone)]
pub struct CategorySequencer {
    order: Vec<String>,
    index: usize,
    phase: Phase,
}

impl CategorySequencer {
    /// Create a sequencer over the configured category order. Tags are
    /// normalized on the way in.
    pub fn new(order: Vec<String>) -> Self {
        CategorySequencer {
            order: order.iter().map(|c| normalize(c)).collect(),
            index: 0,
            phase: Phase::Primary,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The category currently live in the primary phase.
    pub fn current_category(&self) -> Option<&str> {
        match self.phase {
            Phase::Primary => self.order.get(self.index).map(String::as_str),
            Phase::Resurfacing => None,
        }
    }

    /// Position of a category tag in the configured order.
    pub fn position(&self, category: &str) -> Option<usize> {
        let tag = normalize(category);
        self.order.iter().position(|c| *c == tag)
    }

    /// Whether a category lies behind the current sequencer position.
    ///
    /// Tags not present in the configured order count as passed: they can
    /// never surface in the primary phase, so the only way back onto the
    /// block is the unsold queue.
    pub fn category_passed(&self, category: &str) -> bool {
        match self.phase {
            Phase::Resurfacing => true,
            Phase::Primary => self
                .position(category)
                .map(|pos| pos < self.index)
                .unwrap_or(true),
        }
    }

    /// Players due in the current primary category: matching tag, not
    /// assigned, not already moved to the unsold queue.
    pub fn due_players<'a>(
        &self,
        players: &'a [Player],
        ledger: &RosterLedger,
        unsold: &UnsoldQueue,
    ) -> Vec<&'a Player> {
        let Some(current) = self.current_category() else {
            return Vec::new();
        };
        players
            .iter()
            .filter(|p| normalize(&p.category) == current)
            .filter(|p| !ledger.is_assigned(&p.id))
            .filter(|p| !unsold.contains(&p.id))
            .collect()
    }

    /// Run the transition rule. Called only when no player is on the block
    /// and the current category's due-list is empty.
    ///
    /// Advances the index by exactly one per call (each transition must
    /// surface its own blocking notice), switches to resurfacing when the
    /// order is exhausted and unsold players remain, and reports
    /// `Exhausted` when there is nothing left anywhere.
    pub fn advance(&mut self, unsold: &UnsoldQueue) -> Transition {
        match self.phase {
            Phase::Primary => {
                if self.index + 1 < self.order.len() {
                    self.index += 1;
                    Transition::NextCategory(self.order[self.index].clone())
                } else if !unsold.is_empty() {
                    self.phase = Phase::Resurfacing;
                    Transition::FinalRound
                } else {
                    Transition::Exhausted
                }
            }
            Phase::Resurfacing => {
                if unsold.is_empty() {
                    Transition::Exhausted
                } else {
                    Transition::FinalRound
                }
            }
        }
    }
}
