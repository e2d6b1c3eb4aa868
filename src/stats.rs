use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::session::SessionSummary;

/// Stored totals for one player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStats {
    pub name: String,
    pub high_score: u32,
    pub outstanding_score: u32,
    pub games_played: u32,
    pub last_played: DateTime<Local>,
}

/// One finished game
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub player: String,
    pub difficulty: String,
    pub status: String,
    pub final_score: u32,
    pub outstanding_score: u32,
    pub elapsed_secs: u64,
    pub remaining_attempts: u32,
    pub hints_used: u32,
    pub played_at: DateTime<Local>,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS player_stats (
        name TEXT PRIMARY KEY,
        high_score INTEGER NOT NULL DEFAULT 0,
        outstanding_score INTEGER NOT NULL DEFAULT 0,
        games_played INTEGER NOT NULL DEFAULT 0,
        last_played TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS game_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        player TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        status TEXT NOT NULL,
        final_score INTEGER NOT NULL,
        outstanding_score INTEGER NOT NULL,
        elapsed_secs INTEGER NOT NULL,
        remaining_attempts INTEGER NOT NULL,
        hints_used INTEGER NOT NULL,
        played_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_game_history_player ON game_history(player);
    CREATE INDEX IF NOT EXISTS idx_player_stats_high ON player_stats(high_score);
"#;

/// Leaderboard and game history backed by SQLite
#[derive(Debug)]
pub struct StatsDb {
    conn: Connection,
}

impl StatsDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {e}")),
                )
            })?;
        }

        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened stats database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(StatsDb { conn })
    }

    /// Folds a finished session into the player's totals and appends it to the history.
    pub fn record_game(&mut self, player: &str, summary: &SessionSummary) -> Result<()> {
        let now = Local::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO player_stats (name, high_score, outstanding_score, games_played, last_played)
            VALUES (?1, ?2, ?3, 1, ?4)
            ON CONFLICT(name) DO UPDATE SET
                high_score = MAX(high_score, excluded.high_score),
                outstanding_score = outstanding_score + excluded.outstanding_score,
                games_played = games_played + 1,
                last_played = excluded.last_played
            "#,
            params![player, summary.high_score, summary.outstanding_score, now],
        )?;

        tx.execute(
            r#"
            INSERT INTO game_history
            (player, difficulty, status, final_score, outstanding_score, elapsed_secs,
             remaining_attempts, hints_used, played_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                player,
                summary.difficulty.to_string(),
                summary.status.to_string(),
                summary.final_score,
                summary.outstanding_score,
                summary.elapsed.as_secs(),
                summary.remaining_attempts,
                summary.hints_used,
                now,
            ],
        )?;

        tx.commit()?;
        info!(
            player,
            status = %summary.status,
            score = summary.final_score,
            "recorded game"
        );
        Ok(())
    }

    pub fn player(&self, name: &str) -> Result<Option<PlayerStats>> {
        self.conn
            .query_row(
                r#"
                SELECT name, high_score, outstanding_score, games_played, last_played
                FROM player_stats WHERE name = ?1
                "#,
                [name],
                player_from_row,
            )
            .optional()
    }

    /// Stored high score, 0 for an unknown player
    pub fn high_score(&self, name: &str) -> Result<u32> {
        Ok(self.player(name)?.map(|p| p.high_score).unwrap_or(0))
    }

    /// Players ordered by high score, best first
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<PlayerStats>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT name, high_score, outstanding_score, games_played, last_played
            FROM player_stats
            ORDER BY high_score DESC, outstanding_score DESC, name ASC
            LIMIT ?1
            "#,
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], player_from_row)?;
        rows.collect()
    }

    /// Most recent games of one player, newest first
    pub fn recent_games(&self, player: &str, limit: usize) -> Result<Vec<GameRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT player, difficulty, status, final_score, outstanding_score, elapsed_secs,
                   remaining_attempts, hints_used, played_at
            FROM game_history
            WHERE player = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![player, limit], |row| {
            Ok(GameRecord {
                player: row.get(0)?,
                difficulty: row.get(1)?,
                status: row.get(2)?,
                final_score: row.get(3)?,
                outstanding_score: row.get(4)?,
                elapsed_secs: row.get(5)?,
                remaining_attempts: row.get(6)?,
                hints_used: row.get(7)?,
                played_at: parse_timestamp(row, 8)?,
            })
        })?;
        rows.collect()
    }

    /// Clear all stored players and history
    pub fn clear_all_stats(&self) -> Result<()> {
        self.conn
            .execute_batch("DELETE FROM game_history; DELETE FROM player_stats;")
    }

    /// Writes the full leaderboard as CSV and returns the number of players written.
    pub fn export_leaderboard_csv<W: Write>(&self, out: W) -> std::result::Result<usize, ExportError> {
        let players = self.leaderboard(usize::MAX)?;
        let mut writer = csv::Writer::from_writer(out);

        writer.write_record([
            "rank",
            "name",
            "high_score",
            "outstanding_score",
            "games_played",
            "last_played",
        ])?;
        for (rank, p) in players.iter().enumerate() {
            writer.write_record([
                (rank + 1).to_string(),
                p.name.clone(),
                p.high_score.to_string(),
                p.outstanding_score.to_string(),
                p.games_played.to_string(),
                p.last_played.to_rfc3339(),
            ])?;
        }
        writer.flush()?;

        Ok(players.len())
    }
}

fn player_from_row(row: &Row<'_>) -> Result<PlayerStats> {
    Ok(PlayerStats {
        name: row.get(0)?,
        high_score: row.get(1)?,
        outstanding_score: row.get(2)?,
        games_played: row.get(3)?,
        last_played: parse_timestamp(row, 4)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> Result<DateTime<Local>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                idx,
                "timestamp".to_string(),
                rusqlite::types::Type::Text,
            )
        })
}
