// Player and team records plus the name/tag normalization helpers used
// everywhere matching happens.

use serde::{Deserialize, Serialize};

/// A player as produced by the data-loading collaborator.
///
/// Immutable once loaded. The `category` tag is already normalized
/// (trimmed, lowercased) and drives sequencing, bid increments, and
/// roster caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Stable identifier assigned by the loader (e.g. "player-7").
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text role label (e.g. "All-rounder").
    pub role: String,
    /// Normalized category tag (e.g. "best-batters-bowlers").
    pub category: String,
    /// Floor for bidding. Zero for pre-sold players.
    pub base_price: u32,
    /// Opaque photo reference; not used by the core engine.
    pub photo: String,
    /// Team name from the source sheet when the player arrives pre-tagged
    /// to a team. Resolved against team names at seed time.
    pub pre_assigned_team: Option<String>,
    /// True when the base-price cell carried the "sold" token.
    pub is_pre_sold: bool,
}

/// A team as produced by the data-loading collaborator. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Stable identifier assigned by the loader (e.g. "team-2").
    pub id: String,
    /// Display name.
    pub name: String,
    /// Captain name; resolved to a player by normalized exact match.
    pub captain: String,
    /// Optional vice-captain name, same resolution rule.
    pub vice_captain: Option<String>,
}

/// Normalize a name or category tag for matching: trim + lowercase.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Case/whitespace-insensitive exact name comparison.
pub fn same_name(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Uppercased, dash-free rendering of a category tag for display
/// (e.g. "best-batters-bowlers" -> "BEST BATTERS BOWLERS").
pub fn display_tag(tag: &str) -> String {
    tag.to_uppercase().replace('-', " ")
}

impl Player {
    /// Find a player by display name using normalized comparison.
    pub fn find_by_name<'a>(players: &'a [Player], name: &str) -> Option<&'a Player> {
        players.iter().find(|p| same_name(&p.name, name))
    }
}

impl Team {
    /// Find a team by display name using normalized comparison.
    pub fn find_by_name<'a>(teams: &'a [Team], name: &str) -> Option<&'a Team> {
        teams.iter().find(|t| same_name(&t.name, name))
    }
}
