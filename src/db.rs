// SQLite persistence layer: the local sale log used for crash recovery.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::auction::ledger::SaleRecord;

/// SQLite-backed sale log plus a small key-value store for session state.
///
/// Sales are scoped by session id so a restart never replays rows from a
/// different auction.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral database (useful for
    /// tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sales (
                player_id       TEXT NOT NULL,
                player_name     TEXT NOT NULL,
                team_id         TEXT NOT NULL,
                team_name       TEXT NOT NULL,
                category        TEXT NOT NULL,
                role            TEXT NOT NULL,
                base_price      INTEGER NOT NULL,
                price           INTEGER NOT NULL,
                effective_spend INTEGER NOT NULL,
                session_id      TEXT NOT NULL,
                sold_at         TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                seq             INTEGER PRIMARY KEY AUTOINCREMENT,
                UNIQUE (player_id, session_id)
            );

            CREATE INDEX IF NOT EXISTS idx_sales_session_id ON sales(session_id);

            CREATE TABLE IF NOT EXISTS session_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Record a sale. INSERT OR REPLACE: a player re-sold after an undo
    /// (where the delete raced a crash) overwrites the stale row instead
    /// of failing.
    pub fn record_sale(&self, sale: &SaleRecord, session_id: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO sales
                (player_id, player_name, team_id, team_name, category, role,
                 base_price, price, effective_spend, session_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                sale.player_id,
                sale.player_name,
                sale.team_id,
                sale.team_name,
                sale.category,
                sale.role,
                sale.base_price,
                sale.price,
                sale.effective_spend,
                session_id,
            ],
        )
        .context("failed to record sale")?;
        Ok(())
    }

    /// Delete the sale row for a player (the undo path). Absent rows are a
    /// no-op.
    pub fn delete_sale(&self, player_id: &str, session_id: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM sales WHERE player_id = ?1 AND session_id = ?2",
            params![player_id, session_id],
        )
        .context("failed to delete sale")?;
        Ok(())
    }

    /// Load the sales for a session in commit order.
    pub fn load_sales(&self, session_id: &str) -> Result<Vec<SaleRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT player_id, player_name, team_id, team_name, category, role,
                        base_price, price, effective_spend
                 FROM sales WHERE session_id = ?1 ORDER BY seq",
            )
            .context("failed to prepare load_sales query")?;

        let sales = stmt
            .query_map(params![session_id], |row| {
                Ok(SaleRecord {
                    player_id: row.get(0)?,
                    player_name: row.get(1)?,
                    team_id: row.get(2)?,
                    team_name: row.get(3)?,
                    category: row.get(4)?,
                    role: row.get(5)?,
                    base_price: row.get(6)?,
                    price: row.get(7)?,
                    effective_spend: row.get(8)?,
                })
            })
            .context("failed to query sales")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map sale rows")?;

        Ok(sales)
    }

    /// Persist an arbitrary JSON value under `key`. Uses INSERT OR REPLACE
    /// so repeated saves overwrite the previous value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO session_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`. Returns `None` if the
    /// key does not exist.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM session_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| {
                let json_str: String = row.get(0)?;
                Ok(json_str)
            })
            .context("failed to query session state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value: serde_json::Value =
                    serde_json::from_str(&json_str).context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(player: &str, team: &str, price: u32) -> SaleRecord {
        SaleRecord {
            player_id: player.to_string(),
            player_name: format!("Name {player}"),
            team_id: team.to_string(),
            team_name: format!("Team {team}"),
            category: "allrounders".to_string(),
            role: "All-rounder".to_string(),
            base_price: 1_000,
            price,
            effective_spend: price.saturating_sub(1_000),
        }
    }

    #[test]
    fn record_and_load_round_trip() {
        let db = Database::open(":memory:").unwrap();
        db.record_sale(&sale("player-0", "team-0", 5_000), "s1").unwrap();
        db.record_sale(&sale("player-1", "team-1", 3_000), "s1").unwrap();

        let sales = db.load_sales("s1").unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].player_id, "player-0");
        assert_eq!(sales[0].price, 5_000);
        assert_eq!(sales[0].effective_spend, 4_000);
        assert_eq!(sales[1].player_id, "player-1");
    }

    #[test]
    fn sales_are_scoped_by_session() {
        let db = Database::open(":memory:").unwrap();
        db.record_sale(&sale("player-0", "team-0", 5_000), "s1").unwrap();
        db.record_sale(&sale("player-1", "team-0", 2_000), "s2").unwrap();
        assert_eq!(db.load_sales("s1").unwrap().len(), 1);
        assert_eq!(db.load_sales("s2").unwrap().len(), 1);
        assert!(db.load_sales("s3").unwrap().is_empty());
    }

    #[test]
    fn re_recording_a_player_overwrites() {
        let db = Database::open(":memory:").unwrap();
        db.record_sale(&sale("player-0", "team-0", 5_000), "s1").unwrap();
        db.record_sale(&sale("player-0", "team-1", 7_000), "s1").unwrap();
        let sales = db.load_sales("s1").unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].team_id, "team-1");
        assert_eq!(sales[0].price, 7_000);
    }

    #[test]
    fn delete_sale_removes_the_row() {
        let db = Database::open(":memory:").unwrap();
        db.record_sale(&sale("player-0", "team-0", 5_000), "s1").unwrap();
        db.delete_sale("player-0", "s1").unwrap();
        assert!(db.load_sales("s1").unwrap().is_empty());
        // Deleting again is a no-op.
        db.delete_sale("player-0", "s1").unwrap();
    }

    #[test]
    fn state_round_trip_and_overwrite() {
        let db = Database::open(":memory:").unwrap();
        assert!(db.load_state("session_id").unwrap().is_none());
        db.save_state("session_id", &serde_json::json!("session-1")).unwrap();
        assert_eq!(
            db.load_state("session_id").unwrap(),
            Some(serde_json::json!("session-1"))
        );
        db.save_state("session_id", &serde_json::json!("session-2")).unwrap();
        assert_eq!(
            db.load_state("session_id").unwrap(),
            Some(serde_json::json!("session-2"))
        );
    }
}
