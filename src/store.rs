use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::info;

use crate::record::MatchRecord;

#[derive(Debug, Clone, Default)]
pub struct StoreSummary {
    pub files: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub matches_upserted: usize,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Key columns are broken out for ordering and lookups; the full record lives
/// in `payload` as JSON.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            record_key TEXT PRIMARY KEY,
            tourney_id TEXT NULL,
            tourney_date INTEGER NULL,
            match_num INTEGER NULL,
            surface TEXT NULL,
            winner_id TEXT NOT NULL,
            loser_id TEXT NOT NULL,
            score TEXT NULL,
            payload TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(tourney_date);
        CREATE INDEX IF NOT EXISTS idx_matches_winner ON matches(winner_id);
        CREATE INDEX IF NOT EXISTS idx_matches_loser ON matches(loser_id);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            files INTEGER NOT NULL,
            rows_read INTEGER NOT NULL,
            rows_skipped INTEGER NOT NULL,
            matches_upserted INTEGER NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Identity of a match across re-ingests of the same file.
pub fn record_key(m: &MatchRecord) -> String {
    format!(
        "{}:{}:{}:{}",
        m.tourney_id.as_deref().unwrap_or("?"),
        m.match_num.map_or_else(|| "?".to_string(), |n| n.to_string()),
        m.winner.id.trim(),
        m.loser.id.trim()
    )
}

pub fn upsert_matches(conn: &mut Connection, matches: &[MatchRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin ingest transaction")?;
    let now = Utc::now().to_rfc3339();
    let mut upserted = 0usize;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO matches (
                    record_key, tourney_id, tourney_date, match_num, surface,
                    winner_id, loser_id, score, payload, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(record_key) DO UPDATE SET
                    tourney_id = excluded.tourney_id,
                    tourney_date = excluded.tourney_date,
                    match_num = excluded.match_num,
                    surface = excluded.surface,
                    winner_id = excluded.winner_id,
                    loser_id = excluded.loser_id,
                    score = excluded.score,
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
                "#,
            )
            .context("prepare upsert")?;
        for m in matches {
            let payload = serde_json::to_string(m).context("serialize match")?;
            stmt.execute(params![
                record_key(m),
                m.tourney_id,
                m.tourney_date,
                m.match_num,
                m.surface,
                m.winner.id.trim(),
                m.loser.id.trim(),
                m.score,
                payload,
                now,
            ])
            .context("upsert match")?;
            upserted += 1;
        }
    }
    tx.commit().context("commit ingest transaction")?;
    Ok(upserted)
}

/// Earliest first: tournament date, tournament id, match number. Rows without
/// a date come first, matching `sort_chronologically`.
pub fn load_matches(conn: &Connection) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT payload FROM matches
            ORDER BY tourney_date ASC, tourney_id ASC, match_num ASC, record_key ASC
            "#,
        )
        .context("prepare load matches query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        let payload = row.context("decode match row")?;
        let m: MatchRecord = serde_json::from_str(&payload).context("parse stored match")?;
        out.push(m);
    }
    Ok(out)
}

pub fn count_matches(conn: &Connection) -> Result<usize> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))
        .context("count matches")?;
    Ok(usize::try_from(n).unwrap_or(0))
}

pub fn begin_run(conn: &Connection) -> Result<i64> {
    conn.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, files, rows_read, rows_skipped, matches_upserted)
         VALUES (?1, NULL, 0, 0, 0, 0)",
        params![Utc::now().to_rfc3339()],
    )
    .context("insert ingest run")?;
    Ok(conn.last_insert_rowid())
}

pub fn finish_run(conn: &Connection, run_id: i64, summary: &StoreSummary) -> Result<()> {
    conn.execute(
        "UPDATE ingest_runs
         SET finished_at = ?1, files = ?2, rows_read = ?3, rows_skipped = ?4, matches_upserted = ?5
         WHERE run_id = ?6",
        params![
            Utc::now().to_rfc3339(),
            summary.files as i64,
            summary.rows_read as i64,
            summary.rows_skipped as i64,
            summary.matches_upserted as i64,
            run_id
        ],
    )
    .context("update ingest run")?;
    info!(
        run_id,
        upserted = summary.matches_upserted,
        skipped = summary.rows_skipped,
        "ingest run recorded"
    );
    Ok(())
}
