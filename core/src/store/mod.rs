//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! The generator and the aggregation engine never execute SQL.

use crate::{error::GenResult, event::LabelerInput};
use rusqlite::{params, Connection, OptionalExtension};

mod report;

pub struct RunStore {
    conn: Connection,
}

/// A persisted run header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub run_id: String,
    pub kind: String,
    pub seed: Option<u64>,
    pub version: String,
    pub started_at: String,
}

impl RunStore {
    pub fn open(path: &str) -> GenResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GenResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GenResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        kind: &str,
        seed: Option<u64>,
        version: &str,
    ) -> GenResult<()> {
        // SQLite integers are signed; the seed is stored bit-for-bit.
        let seed = seed.map(|s| s as i64);
        self.conn.execute(
            "INSERT INTO run (run_id, kind, seed, version, started_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, kind, seed, version, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_run(&self, run_id: &str) -> GenResult<Option<RunRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT run_id, kind, seed, version, started_at FROM run WHERE run_id = ?1",
                params![run_id],
                |r| {
                    let seed: Option<i64> = r.get(2)?;
                    Ok(RunRecord {
                        run_id: r.get(0)?,
                        kind: r.get(1)?,
                        seed: seed.map(|s| s as u64),
                        version: r.get(3)?,
                        started_at: r.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    // ── Generated events ───────────────────────────────────────

    pub fn insert_events(&mut self, run_id: &str, events: &[LabelerInput]) -> GenResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO generated_event (run_id, seq, publisher, event_id, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (seq, event) in events.iter().enumerate() {
                stmt.execute(params![
                    run_id,
                    seq as i64,
                    event.event_id.publisher,
                    event.event_id.id,
                    serde_json::to_string(event)?,
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("stored {} events for {run_id}", events.len());
        Ok(())
    }

    /// All events of a run in generation order.
    pub fn events_for_run(&self, run_id: &str) -> GenResult<Vec<LabelerInput>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM generated_event WHERE run_id = ?1 ORDER BY seq")?;
        let payloads = stmt
            .query_map(params![run_id], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        payloads
            .iter()
            .map(|p| -> GenResult<LabelerInput> { Ok(serde_json::from_str(p)?) })
            .collect()
    }

    pub fn event_count(&self, run_id: &str) -> GenResult<i64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM generated_event WHERE run_id = ?1",
            params![run_id],
            |r| r.get(0),
        )?;
        Ok(n)
    }
}
