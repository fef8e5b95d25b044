// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction audit trail: append-only SQLite log of every redacted span.
//
// The trail is a side channel. It never travels inside the redacted PDF, and
// it never stores the redacted text itself, only its SHA-256 digest, so the
// log cannot leak what the redaction removed.
//
// Schema:
//   redaction_audit(
//     id            INTEGER PRIMARY KEY AUTOINCREMENT,
//     batch_id      TEXT    NOT NULL,   -- UUID shared by one redact call
//     timestamp     TEXT    NOT NULL,   -- RFC 3339
//     document_hash TEXT    NOT NULL,   -- SHA-256 hex of the output document
//     page          INTEGER NOT NULL,   -- 1-based
//     rule          TEXT    NOT NULL,   -- e.g. "literal", "pattern:ssn"
//     excerpt_hash  TEXT    NOT NULL,   -- SHA-256 hex of the redacted text
//     permanent     INTEGER NOT NULL,   -- 0 = cover only, 1 = content removed
//     bbox_x, bbox_y, bbox_w, bbox_h REAL -- cover box, if known
//   )

use std::path::Path;

use chrono::Utc;
use pagewerk_core::error::PagewerkError;
use pagewerk_core::types::Rect;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::integrity::hash_bytes;

/// Convert a `rusqlite::Error` into a `PagewerkError::Database`.
fn db_err(e: rusqlite::Error) -> PagewerkError {
    PagewerkError::Database(e.to_string())
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS redaction_audit (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id      TEXT    NOT NULL,
    timestamp     TEXT    NOT NULL,
    document_hash TEXT    NOT NULL,
    page          INTEGER NOT NULL,
    rule          TEXT    NOT NULL,
    excerpt_hash  TEXT    NOT NULL,
    permanent     INTEGER NOT NULL,
    bbox_x        REAL,
    bbox_y        REAL,
    bbox_w        REAL,
    bbox_h        REAL
);
CREATE INDEX IF NOT EXISTS redaction_audit_document ON redaction_audit(document_hash);";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One redacted span, as reported by the redaction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionAuditEntry {
    /// 1-based page number.
    pub page: u32,
    /// Human-readable label of the rule that matched.
    pub rule: String,
    /// The text that was redacted (empty for area redactions over graphics).
    pub excerpt: String,
    /// Whether the content was structurally removed or only covered.
    pub permanent: bool,
    /// Cover box in page coordinates.
    pub bbox: Option<Rect>,
}

/// A persisted audit row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAuditRecord {
    pub id: i64,
    pub batch_id: String,
    pub timestamp: String,
    pub document_hash: String,
    pub page: u32,
    pub rule: String,
    pub excerpt_hash: String,
    pub permanent: bool,
    pub bbox: Option<Rect>,
}

/// Append-only redaction audit log backed by SQLite.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PagewerkError> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        debug!("audit log opened");
        Ok(Self { conn })
    }

    /// Open an in-memory audit database (useful for tests).
    pub fn open_in_memory() -> Result<Self, PagewerkError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        debug!("in-memory audit log opened");
        Ok(Self { conn })
    }

    /// Persist a whole redaction trail in one transaction.
    ///
    /// `document_hash` should be the SHA-256 hex digest of the redacted
    /// output. Returns the batch id shared by the inserted rows.
    #[instrument(skip(self, entries), fields(%document_hash, entries = entries.len()))]
    pub fn record_trail(
        &self,
        document_hash: &str,
        entries: &[RedactionAuditEntry],
    ) -> Result<String, PagewerkError> {
        let batch_id = Uuid::new_v4().to_string();
        let timestamp = Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction().map_err(db_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO redaction_audit
                       (batch_id, timestamp, document_hash, page, rule, excerpt_hash,
                        permanent, bbox_x, bbox_y, bbox_w, bbox_h)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                )
                .map_err(db_err)?;

            for entry in entries {
                let bbox = entry.bbox;
                stmt.execute(params![
                    batch_id,
                    timestamp,
                    document_hash,
                    entry.page,
                    entry.rule,
                    hash_bytes(entry.excerpt.as_bytes()),
                    entry.permanent as i32,
                    bbox.map(|b| f64::from(b.x)),
                    bbox.map(|b| f64::from(b.y)),
                    bbox.map(|b| f64::from(b.width)),
                    bbox.map(|b| f64::from(b.height)),
                ])
                .map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)?;

        debug!(%batch_id, "redaction trail recorded");
        Ok(batch_id)
    }

    /// All records for a document, in insertion order.
    pub fn entries_for_hash(
        &self,
        document_hash: &str,
    ) -> Result<Vec<StoredAuditRecord>, PagewerkError> {
        self.query(
            "SELECT id, batch_id, timestamp, document_hash, page, rule, excerpt_hash,
                    permanent, bbox_x, bbox_y, bbox_w, bbox_h
             FROM redaction_audit
             WHERE document_hash = ?1
             ORDER BY id ASC",
            params![document_hash],
        )
    }

    /// The most recent `limit` records, newest first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<StoredAuditRecord>, PagewerkError> {
        self.query(
            "SELECT id, batch_id, timestamp, document_hash, page, rule, excerpt_hash,
                    permanent, bbox_x, bbox_y, bbox_w, bbox_h
             FROM redaction_audit
             ORDER BY id DESC
             LIMIT ?1",
            params![limit],
        )
    }

    /// Return the total number of records in the log.
    pub fn count(&self) -> Result<u64, PagewerkError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM redaction_audit", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn query(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<StoredAuditRecord>, PagewerkError> {
        let mut stmt = self.conn.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params, |row| {
                let bbox = match (
                    row.get::<_, Option<f64>>(8)?,
                    row.get::<_, Option<f64>>(9)?,
                    row.get::<_, Option<f64>>(10)?,
                    row.get::<_, Option<f64>>(11)?,
                ) {
                    (Some(x), Some(y), Some(w), Some(h)) => {
                        Some(Rect::new(x as f32, y as f32, w as f32, h as f32))
                    }
                    _ => None,
                };
                Ok(StoredAuditRecord {
                    id: row.get(0)?,
                    batch_id: row.get(1)?,
                    timestamp: row.get(2)?,
                    document_hash: row.get(3)?,
                    page: row.get(4)?,
                    rule: row.get(5)?,
                    excerpt_hash: row.get(6)?,
                    permanent: row.get::<_, i32>(7)? != 0,
                    bbox,
                })
            })
            .map_err(db_err)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(db_err)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_log() -> AuditLog {
        AuditLog::open_in_memory().expect("open in-memory audit log")
    }

    fn entry(page: u32, excerpt: &str) -> RedactionAuditEntry {
        RedactionAuditEntry {
            page,
            rule: "pattern:ssn".into(),
            excerpt: excerpt.into(),
            permanent: true,
            bbox: Some(Rect::new(72.0, 700.0, 66.0, 12.0)),
        }
    }

    #[test]
    fn record_and_count() {
        let log = make_log();
        assert_eq!(log.count().unwrap(), 0);

        log.record_trail("doc", &[entry(1, "123-45-6789"), entry(2, "987-65-4321")])
            .unwrap();
        assert_eq!(log.count().unwrap(), 2);
    }

    #[test]
    fn excerpts_are_stored_as_digests() {
        let log = make_log();
        log.record_trail("doc", &[entry(1, "123-45-6789")]).unwrap();

        let records = log.entries_for_hash("doc").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].excerpt_hash, hash_bytes(b"123-45-6789"));
        assert_ne!(records[0].excerpt_hash, "123-45-6789");
        assert_eq!(records[0].bbox, Some(Rect::new(72.0, 700.0, 66.0, 12.0)));
        assert!(records[0].permanent);
    }

    #[test]
    fn one_batch_per_call() {
        let log = make_log();
        let first = log.record_trail("a", &[entry(1, "x"), entry(1, "y")]).unwrap();
        let second = log.record_trail("b", &[entry(3, "z")]).unwrap();
        assert_ne!(first, second);

        let a = log.entries_for_hash("a").unwrap();
        assert!(a.iter().all(|r| r.batch_id == first));
        assert_eq!(log.entries_for_hash("b").unwrap()[0].page, 3);
    }

    #[test]
    fn recent_entries_ordering() {
        let log = make_log();
        for i in 0..5 {
            log.record_trail(&format!("hash_{i}"), &[entry(1, "x")]).unwrap();
        }

        let recent = log.recent_entries(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].id > recent[1].id);
        assert!(recent[1].id > recent[2].id);
    }

    #[test]
    fn missing_bbox_round_trips_as_none() {
        let log = make_log();
        let mut e = entry(1, "");
        e.bbox = None;
        log.record_trail("doc", &[e]).unwrap();
        assert_eq!(log.entries_for_hash("doc").unwrap()[0].bbox, None);
    }
}
