use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS lookups (
            id         INTEGER PRIMARY KEY,
            word       TEXT NOT NULL,
            model      TEXT NOT NULL,
            passage    TEXT NOT NULL,
            page_id    TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_lookups_word ON lookups(word);
        ",
    )?;
    Ok(())
}

pub struct LookupRow {
    pub id: i64,
    pub word: String,
    pub model: String,
    pub page_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Journal a passage as soon as it arrives; returns the row id.
pub fn record_lookup(conn: &Connection, word: &str, model: &str, passage: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO lookups (word, model, passage, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![word, model, passage, Utc::now().to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_page_id(conn: &Connection, id: i64, page_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE lookups SET page_id = ?1 WHERE id = ?2",
        rusqlite::params![page_id, id],
    )?;
    Ok(())
}

pub fn fetch_history(conn: &Connection, limit: usize) -> Result<Vec<LookupRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, word, model, page_id, created_at
         FROM lookups ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            let created: String = row.get(4)?;
            let created_at = DateTime::parse_from_rfc3339(&created)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
                })?;
            Ok(LookupRow {
                id: row.get(0)?,
                word: row.get(1)?,
                model: row.get(2)?,
                page_id: row.get(3)?,
                created_at,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn fetch_latest_passage(conn: &Connection, word: &str) -> Result<Option<String>> {
    let passage = conn
        .query_row(
            "SELECT passage FROM lookups WHERE word = ?1 ORDER BY id DESC LIMIT 1",
            [word],
            |row| row.get(0),
        )
        .optional()?;
    Ok(passage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn journal_roundtrip() {
        let conn = memory();
        let first = record_lookup(&conn, "apply", "gpt-4o", "頻度: よく使う").unwrap();
        let second = record_lookup(&conn, "apply", "gpt-4o", "頻度: たまに使う").unwrap();
        record_lookup(&conn, "leap", "gpt-4o", "意味: 跳ぶ").unwrap();
        set_page_id(&conn, first, "abc123").unwrap();
        assert!(second > first);

        assert_eq!(
            fetch_latest_passage(&conn, "apply").unwrap().as_deref(),
            Some("頻度: たまに使う")
        );
        assert!(fetch_latest_passage(&conn, "missing").unwrap().is_none());

        let history = fetch_history(&conn, 10).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].word, "leap");
        assert_eq!(history[2].page_id.as_deref(), Some("abc123"));
        assert!(history[1].page_id.is_none());

        assert_eq!(fetch_history(&conn, 1).unwrap().len(), 1);
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = memory();
        init_schema(&conn).unwrap();
    }
}
