use chrono::{Local, TimeZone};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::inspection::{InspectionOutcome, PLUS_TWO_PENALTY_MS};
use crate::solve::SolveEntry;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS solves (
        id TEXT PRIMARY KEY,
        event TEXT NOT NULL,
        elapsed_ms INTEGER NOT NULL,
        outcome TEXT NOT NULL,
        scramble TEXT NOT NULL,
        created_at_ms INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_solves_event ON solves(event);
    CREATE INDEX IF NOT EXISTS idx_solves_created ON solves(created_at_ms);
"#;

const INSERT: &str = r#"
    INSERT OR IGNORE INTO solves
    (id, event, elapsed_ms, outcome, scramble, created_at_ms, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

const MAX_STORED_MS: u64 = i64::MAX as u64 - PLUS_TWO_PENALTY_MS;

const COLUMNS: &str = "id, event, elapsed_ms, outcome, scramble, created_at_ms";

/// Long-term record of every completed solve, across sessions
#[derive(Debug)]
pub struct SolveArchive {
    conn: Connection,
}

impl SolveArchive {
    /// Open the archive under the state directory, creating it if needed
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().ok_or(Error::NoStateDir)?;
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Store a solve. Recording the same id twice keeps the first copy.
    pub fn record(&self, entry: &SolveEntry) -> Result<()> {
        insert(&self.conn, entry)
    }

    /// Store many solves in one transaction
    pub fn record_batch(&mut self, entries: &[SolveEntry]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for entry in entries {
            insert(&tx, entry)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Fastest effective time for an event, ignoring DNFs
    pub fn best_for_event(&self, event_id: &str) -> Result<Option<u64>> {
        let best: Option<i64> = self.conn.query_row(
            r#"
            SELECT MIN(CASE WHEN outcome = 'plus2' THEN elapsed_ms + ?2 ELSE elapsed_ms END)
            FROM solves
            WHERE event = ?1 AND outcome != 'dnf'
            "#,
            params![event_id, PLUS_TWO_PENALTY_MS as i64],
            |row| row.get(0),
        )?;
        Ok(best.map(|ms| ms as u64))
    }

    /// The last `n` solves of an event, oldest first
    pub fn recent_for_event(&self, event_id: &str, n: usize) -> Result<Vec<SolveEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM solves WHERE event = ?1 \
             ORDER BY created_at_ms DESC, rowid DESC LIMIT ?2"
        ))?;
        let mut entries = stmt
            .query_map(params![event_id, n as i64], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        entries.reverse();
        Ok(entries)
    }

    /// Every solve, oldest first
    pub fn all(&self) -> Result<Vec<SolveEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM solves ORDER BY created_at_ms, rowid"
        ))?;
        let entries = stmt
            .query_map([], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM solves", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Write every solve as CSV; returns the number of rows written
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        write_csv(&self.all()?, writer)
    }
}

// Connection and Transaction both deref to Connection
fn insert(conn: &Connection, entry: &SolveEntry) -> Result<()> {
    conn.execute(
        INSERT,
        params![
            entry.id,
            entry.event_id,
            stored_ms(entry.elapsed_ms),
            entry.inspection_outcome.to_string(),
            entry.scramble_text,
            entry.created_at_ms,
            rfc3339(entry.created_at_ms),
        ],
    )?;
    Ok(())
}

/// SQLite integers are signed; leave room for the +2 added in queries
fn stored_ms(ms: u64) -> i64 {
    ms.min(MAX_STORED_MS) as i64
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<SolveEntry> {
    let outcome: String = row.get(3)?;
    let elapsed_ms: i64 = row.get(2)?;
    Ok(SolveEntry {
        id: row.get(0)?,
        event_id: row.get(1)?,
        elapsed_ms: elapsed_ms.max(0) as u64,
        inspection_outcome: parse_outcome(&outcome),
        scramble_text: row.get(4)?,
        created_at_ms: row.get(5)?,
    })
}

fn parse_outcome(s: &str) -> InspectionOutcome {
    match s {
        "plus2" => InspectionOutcome::Plus2,
        "dnf" => InspectionOutcome::Dnf,
        _ => InspectionOutcome::None,
    }
}

fn rfc3339(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    event: &'a str,
    time: String,
    elapsed_ms: u64,
    penalty: String,
    scramble: &'a str,
    created_at: String,
}

/// Write solves as CSV with a header row
pub fn write_csv<W: Write>(entries: &[SolveEntry], writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in entries {
        wtr.serialize(CsvRow {
            id: &entry.id,
            event: &entry.event_id,
            time: entry.display_time(),
            elapsed_ms: entry.elapsed_ms,
            penalty: entry.inspection_outcome.to_string(),
            scramble: &entry.scramble_text,
            created_at: rfc3339(entry.created_at_ms),
        })?;
    }
    wtr.flush()?;
    Ok(entries.len())
}
