// Data-loading collaborator: turns two tabular sources (players, teams)
// into the session's input lists.
//
// Sources are file paths or published-CSV URLs. Column names are matched
// after normalization (lowercased, whitespace and underscores stripped) so
// "Base Price", "base_price", and "BASEPRICE" all resolve to the same
// column.

use csv::StringRecord;
use thiserror::Error;
use tracing::info;

use crate::auction::player::{normalize, Player, Team};
use crate::config::Config;

/// The loaded input set for one auction session.
#[derive(Debug, Clone)]
pub struct AuctionData {
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("no rows found in the {label} source")]
    Empty { label: &'static str },
}

/// Base-price cell token marking a player as pre-sold.
const PRE_SOLD_TOKEN: &str = "sold";

/// Load both sources and parse them. Fails hard on fetch errors or a
/// zero-row result from either source; a session must never start on
/// partial data.
pub async fn load_auction_data(config: &Config) -> Result<AuctionData, DataError> {
    let players_text = read_source(&config.data.players).await?;
    let teams_text = read_source(&config.data.teams).await?;

    let players = parse_players(&players_text, &config.data.players)?;
    let teams = parse_teams(&teams_text, &config.data.teams)?;
    info!("loaded {} players and {} teams", players.len(), teams.len());

    Ok(AuctionData { players, teams })
}

/// Whether a source string is a URL rather than a local path.
fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn read_source(source: &str) -> Result<String, DataError> {
    if is_url(source) {
        let response = reqwest::get(source)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DataError::Http {
                url: source.to_string(),
                source: e,
            })?;
        response.text().await.map_err(|e| DataError::Http {
            url: source.to_string(),
            source: e,
        })
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| DataError::Io {
                path: source.to_string(),
                source: e,
            })
    }
}

/// Normalize a header cell for matching: lowercase, strip whitespace and
/// underscores.
fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect()
}

/// A parsed record paired with its normalized header row.
struct RowView<'a> {
    headers: &'a [String],
    record: &'a StringRecord,
}

impl RowView<'_> {
    /// First non-empty cell among the given normalized column names.
    fn get(&self, names: &[&str]) -> &str {
        for name in names {
            if let Some(idx) = self.headers.iter().position(|h| h == name) {
                if let Some(value) = self.record.get(idx) {
                    let value = value.trim();
                    if !value.is_empty() {
                        return value;
                    }
                }
            }
        }
        ""
    }
}

/// Parse a price cell: tolerate thousands separators, default to 0 on
/// anything unparseable (matching the source sheets' free-form entry).
fn parse_price(cell: &str) -> u32 {
    let cleaned: String = cell.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().map(|v| v.max(0.0) as u32).unwrap_or(0)
}

/// Parse the players source. Rows without a name are skipped; row indices
/// (including skipped rows) produce the stable `player-N` ids.
pub fn parse_players(text: &str, path: &str) -> Result<Vec<Player>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut players = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let row = RowView {
            headers: &headers,
            record: &record,
        };

        let name = row.get(&["name", "playername"]).to_string();
        if name.is_empty() {
            continue;
        }
        let role = row.get(&["role", "playerrole"]).to_string();
        let category = row.get(&["category", "playercategory", "set"]);
        // Fall back to the role label when the category cell is empty.
        let category = if category.is_empty() {
            normalize(&role)
        } else {
            normalize(category)
        };

        let raw_base_price = row.get(&["baseprice"]);
        let is_pre_sold = raw_base_price.eq_ignore_ascii_case(PRE_SOLD_TOKEN);
        let base_price = if is_pre_sold {
            0
        } else {
            parse_price(raw_base_price)
        };

        let photo = row
            .get(&["photo", "photourl", "image", "imageurl"])
            .to_string();
        let pre_assigned_team = {
            let tag = row.get(&["team", "initialteam"]);
            if tag.is_empty() {
                None
            } else {
                Some(tag.to_string())
            }
        };

        players.push(Player {
            id: format!("player-{idx}"),
            name,
            role,
            category,
            base_price,
            photo,
            pre_assigned_team,
            is_pre_sold,
        });
    }

    if players.is_empty() {
        return Err(DataError::Empty { label: "players" });
    }
    Ok(players)
}

/// Parse the teams source. Rows without a team name are skipped.
pub fn parse_teams(text: &str, path: &str) -> Result<Vec<Team>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut teams = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let row = RowView {
            headers: &headers,
            record: &record,
        };

        let name = row.get(&["teamname", "team"]).to_string();
        if name.is_empty() {
            continue;
        }
        let captain = row.get(&["captain"]).to_string();
        let vice_captain = {
            let vc = row.get(&["vicecaptain"]);
            if vc.is_empty() {
                None
            } else {
                Some(vc.to_string())
            }
        };

        teams.push(Team {
            id: format!("team-{idx}"),
            name,
            captain,
            vice_captain,
        });
    }

    if teams.is_empty() {
        return Err(DataError::Empty { label: "teams" });
    }
    Ok(teams)
}

fn csv_error(path: &str, source: csv::Error) -> DataError {
    DataError::Csv {
        path: path.to_string(),
        source,
    }
}
