// Configuration loading and parsing (config/auction.toml).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::auction::player::{normalize, Team};
use crate::auction::rules::RosterRules;
use crate::auction::session::SessionSettings;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub auction: AuctionConfig,
    pub budget: BudgetConfig,
    pub data: DataPaths,
    pub sheet: SheetConfig,
    pub db_path: String,
    pub export_path: String,
}

// ---------------------------------------------------------------------------
// auction.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire auction.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    auction: AuctionConfig,
    budget: BudgetConfig,
    data: DataPaths,
    #[serde(default)]
    sheet: SheetConfig,
    database: DatabaseSection,
    export: ExportSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuctionConfig {
    /// Absolute roster size limit per team, captain/vice-captain included.
    pub roster_size_cap: usize,
    /// Fallback bid increment for categories without a table entry.
    pub default_increment: u32,
    /// Roster cap for categories without an override.
    pub default_category_cap: usize,
    /// Category tags rejected outright.
    #[serde(default)]
    pub blocked_categories: Vec<String>,
    /// Fixed category order for the primary phase.
    pub categories: CategoriesSection,
    /// Per-category bid increment table.
    #[serde(default)]
    pub increments: HashMap<String, u32>,
    /// Per-category roster cap overrides (scarce categories).
    #[serde(default)]
    pub category_caps: HashMap<String, usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesSection {
    pub order: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    /// Shared per-team purse.
    pub default_cap: u32,
    /// Named overrides keyed by team name (matched normalized).
    #[serde(default)]
    pub overrides: HashMap<String, u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    /// Players source: a file path or an http(s) URL to a published CSV.
    pub players: String,
    /// Teams source, same forms.
    pub teams: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SheetConfig {
    /// Web-app endpoint receiving one POST per sale. Absent disables the
    /// remote sale log.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ExportSection {
    results_path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/auction.toml` relative to
/// the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let base_dir = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("config/auction.toml"),
    })?;
    load_config_from(&base_dir)
}

/// Load and validate configuration from `config/auction.toml` relative to
/// the given `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("auction.toml");
    let text = std::fs::read_to_string(&path)
        .map_err(|_| ConfigError::FileNotFound { path: path.clone() })?;
    parse_config(&text, &path)
}

/// Parse and validate a config document (split out for tests).
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        auction: file.auction,
        budget: file.budget,
        data: file.data,
        sheet: file.sheet,
        db_path: file.database.path,
        export_path: file.export.results_path,
    };

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let err = |field: &str, message: &str| ConfigError::ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    };

    if config.auction.categories.order.is_empty() {
        return Err(err("auction.categories.order", "must list at least one category"));
    }
    if config.auction.roster_size_cap == 0 {
        return Err(err("auction.roster_size_cap", "must be positive"));
    }
    if config.auction.default_increment == 0 {
        return Err(err("auction.default_increment", "must be positive"));
    }
    if config.auction.default_category_cap == 0 {
        return Err(err("auction.default_category_cap", "must be positive"));
    }
    for (category, increment) in &config.auction.increments {
        if *increment == 0 {
            return Err(err(
                "auction.increments",
                &format!("increment for `{category}` must be positive"),
            ));
        }
    }
    for (category, cap) in &config.auction.category_caps {
        if *cap == 0 {
            return Err(err(
                "auction.category_caps",
                &format!("cap for `{category}` must be positive"),
            ));
        }
    }
    if config.budget.default_cap == 0 {
        return Err(err("budget.default_cap", "must be positive"));
    }

    // Table keys that never match a category in the order are almost
    // certainly typos, but they are harmless: warn and continue.
    let order: HashSet<String> = config
        .auction
        .categories
        .order
        .iter()
        .map(|c| normalize(c))
        .collect();
    for key in config
        .auction
        .increments
        .keys()
        .chain(config.auction.category_caps.keys())
    {
        if !order.contains(&normalize(key)) {
            warn!("config references category `{key}` not present in the category order");
        }
    }

    Ok(())
}

impl Config {
    /// Budget cap for a team, by normalized name lookup in the overrides
    /// table, falling back to the shared default.
    pub fn cap_for_team(&self, team_name: &str) -> u32 {
        let name = normalize(team_name);
        self.budget
            .overrides
            .iter()
            .find(|(k, _)| normalize(k) == name)
            .map(|(_, cap)| *cap)
            .unwrap_or(self.budget.default_cap)
    }

    /// The roster-composition rules for the eligibility engine.
    pub fn roster_rules(&self) -> RosterRules {
        RosterRules {
            roster_size_cap: self.auction.roster_size_cap,
            default_category_cap: self.auction.default_category_cap,
            category_caps: self
                .auction
                .category_caps
                .iter()
                .map(|(k, v)| (normalize(k), *v))
                .collect(),
            blocked_categories: self
                .auction
                .blocked_categories
                .iter()
                .map(|c| normalize(c))
                .collect(),
        }
    }

    /// Assemble the session settings for the loaded teams.
    pub fn session_settings(&self, teams: &[Team]) -> SessionSettings {
        SessionSettings {
            category_order: self.auction.categories.order.clone(),
            increments: self.auction.increments.clone(),
            default_increment: self.auction.default_increment,
            rules: self.roster_rules(),
            team_caps: teams
                .iter()
                .map(|t| (t.id.clone(), self.cap_for_team(&t.name)))
                .collect(),
        }
    }
}
