// Unsold resurfacing queue: FIFO queue of players marked unsold during the
// primary phase, cycled through in the terminal resurfacing round.

use std::collections::VecDeque;

use super::sequencer::Phase;

/// Ordered queue of unsold player ids.
#[derive(Debug, Clone, Default)]
pub struct UnsoldQueue {
    queue: VecDeque<String>,
}

impl UnsoldQueue {
    pub fn new() -> Self {
        UnsoldQueue::default()
    }

    /// Record a player as unsold.
    ///
    /// Primary phase: append once (idempotent: repeated marks before a
    /// sale leave a single entry). Resurfacing phase: remove and append to
    /// the tail, so repeatedly-unsold players cycle to the back and are
    /// never dropped.
    pub fn mark_unsold(&mut self, player_id: &str, phase: Phase) {
        match phase {
            Phase::Primary => self.enqueue_if_absent(player_id),
            Phase::Resurfacing => {
                self.remove(player_id);
                self.queue.push_back(player_id.to_string());
            }
        }
    }

    /// Remove a player from the queue when sold (no-op if absent).
    pub fn mark_sold(&mut self, player_id: &str) {
        self.remove(player_id);
    }

    /// Append to the tail unless already queued. Used by the undo path,
    /// which re-enqueues players whose category has already passed.
    pub fn enqueue_if_absent(&mut self, player_id: &str) {
        if !self.contains(player_id) {
            self.queue.push_back(player_id.to_string());
        }
    }

    /// Head of the queue: the next player to resurface (strict FIFO).
    pub fn head(&self) -> Option<&str> {
        self.queue.front().map(String::as_str)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.queue.iter().any(|id| id == player_id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued ids in FIFO order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    fn remove(&mut self, player_id: &str) {
        self.queue.retain(|id| id != player_id);
    }
}
