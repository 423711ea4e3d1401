use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::record::{MatchRecord, PlayerEntry, ServeStats};

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub matches: Vec<MatchRecord>,
    pub rows_read: usize,
    /// Rows that failed to split or lacked two distinct player ids.
    pub rows_skipped: usize,
    /// Files that were not valid UTF-8 and were decoded as ISO-8859-1.
    pub latin1_files: usize,
}

impl IngestReport {
    fn absorb(&mut self, other: IngestReport) {
        self.matches.extend(other.matches);
        self.rows_read += other.rows_read;
        self.rows_skipped += other.rows_skipped;
        self.latin1_files += other.latin1_files;
    }
}

/// Loads files in the given order. The caller decides chronology.
pub fn load_csv_files(paths: &[PathBuf]) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    for path in paths {
        report.absorb(read_csv_file(path)?);
    }
    if report.matches.is_empty() {
        return Err(PipelineError::EmptyInput)
            .with_context(|| format!("no usable match records in {} file(s)", paths.len()));
    }
    Ok(report)
}

pub fn load_csv_file(path: &Path) -> Result<IngestReport> {
    load_csv_files(&[path.to_path_buf()])
}

fn read_csv_file(path: &Path) -> Result<IngestReport> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let (text, latin1) = decode_text(&bytes);
    if latin1 {
        warn!(path = %path.display(), "not valid UTF-8, decoded as ISO-8859-1");
    }
    let mut report =
        parse_csv_str(&text).with_context(|| format!("parse csv {}", path.display()))?;
    report.latin1_files = usize::from(latin1);
    debug!(
        path = %path.display(),
        matches = report.matches.len(),
        skipped = report.rows_skipped,
        "loaded csv"
    );
    Ok(report)
}

/// UTF-8 when valid, otherwise ISO-8859-1 (every byte is a code point).
pub fn decode_text(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.trim_start_matches('\u{feff}').to_string(), false),
        Err(_) => (bytes.iter().map(|&b| char::from(b)).collect(), true),
    }
}

pub fn parse_csv_str(text: &str) -> Result<IngestReport> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr.headers().context("read csv header")?.clone();
    let columns = Columns::new(&headers);

    let mut report = IngestReport::default();
    for (idx, rec) in rdr.records().enumerate() {
        report.rows_read += 1;
        let rec = match rec {
            Ok(rec) => rec,
            Err(err) => {
                report.rows_skipped += 1;
                warn!(row = idx + 1, %err, "unreadable csv row");
                continue;
            }
        };
        let m = columns.record(&rec);
        if !m.is_usable() {
            report.rows_skipped += 1;
            continue;
        }
        report.matches.push(m);
    }
    Ok(report)
}

struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { index }
    }

    fn text(&self, rec: &StringRecord, name: &str) -> Option<String> {
        let i = *self.index.get(name)?;
        let v = rec.get(i)?.trim();
        if v.is_empty() {
            None
        } else {
            Some(v.to_string())
        }
    }

    fn int(&self, rec: &StringRecord, name: &str) -> Option<i32> {
        parse_int(&self.text(rec, name)?)
    }

    fn float(&self, rec: &StringRecord, name: &str) -> Option<f64> {
        self.text(rec, name)?
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    fn player(&self, rec: &StringRecord, prefix: &str) -> PlayerEntry {
        let col = |field: &str| format!("{prefix}_{field}");
        PlayerEntry {
            id: self.text(rec, &col("id")).unwrap_or_default(),
            seed: self.int(rec, &col("seed")),
            entry: self.text(rec, &col("entry")),
            name: self.text(rec, &col("name")),
            hand: self.text(rec, &col("hand")),
            height: self.int(rec, &col("ht")),
            country: self.text(rec, &col("ioc")),
            age: self.float(rec, &col("age")),
            rank: self.int(rec, &col("rank")),
            rank_points: self.int(rec, &col("rank_points")),
        }
    }

    fn serve(&self, rec: &StringRecord, prefix: &str) -> ServeStats {
        let col = |field: &str| format!("{prefix}_{field}");
        ServeStats {
            aces: self.int(rec, &col("ace")),
            double_faults: self.int(rec, &col("df")),
            serve_points: self.int(rec, &col("svpt")),
            first_in: self.int(rec, &col("1stIn")),
            first_won: self.int(rec, &col("1stWon")),
            second_won: self.int(rec, &col("2ndWon")),
            service_games: self.int(rec, &col("SvGms")),
            break_points_saved: self.int(rec, &col("bpSaved")),
            break_points_faced: self.int(rec, &col("bpFaced")),
        }
    }

    fn record(&self, rec: &StringRecord) -> MatchRecord {
        MatchRecord {
            tourney_id: self.text(rec, "tourney_id"),
            tourney_name: self.text(rec, "tourney_name"),
            surface: self.text(rec, "surface"),
            draw_size: self.int(rec, "draw_size"),
            tourney_level: self.text(rec, "tourney_level"),
            tourney_date: self.int(rec, "tourney_date"),
            match_num: self.int(rec, "match_num"),
            winner: self.player(rec, "winner"),
            loser: self.player(rec, "loser"),
            score: self.text(rec, "score"),
            best_of: self.int(rec, "best_of"),
            round: self.text(rec, "round"),
            minutes: self.int(rec, "minutes"),
            winner_serve: self.serve(rec, "w"),
            loser_serve: self.serve(rec, "l"),
        }
    }
}

// Some exports write integers as "185.0".
fn parse_int(raw: &str) -> Option<i32> {
    if let Ok(v) = raw.parse::<i32>() {
        return Some(v);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "tourney_id,surface,tourney_date,match_num,winner_id,winner_ht,winner_ioc,winner_age,loser_id,loser_ioc,score,w_ace,l_ace";

    #[test]
    fn parses_rows_and_marks_blank_fields_absent() {
        let text = format!(
            "{HEADER}\n2024-0339,Hard,20240101,1,104925,188,SRB,36.6,105777,,6-4 6-3,7,\n"
        );
        let report = parse_csv_str(&text).expect("parse");
        assert_eq!(report.matches.len(), 1);
        let m = &report.matches[0];
        assert_eq!(m.winner.id, "104925");
        assert_eq!(m.winner.height, Some(188));
        assert_eq!(m.winner.country.as_deref(), Some("SRB"));
        assert_eq!(m.loser.country, None);
        assert_eq!(m.winner_serve.aces, Some(7));
        assert_eq!(m.loser_serve.aces, None);
        assert_eq!(m.minutes, None);
        assert_eq!(m.score.as_deref(), Some("6-4 6-3"));
    }

    #[test]
    fn malformed_numbers_become_absent() {
        let text = format!("{HEADER}\nx,Clay,2024AB01,n/a,1,tall,ESP,old,2,FRA,,,\n");
        let report = parse_csv_str(&text).expect("parse");
        let m = &report.matches[0];
        assert_eq!(m.tourney_date, None);
        assert_eq!(m.match_num, None);
        assert_eq!(m.winner.height, None);
        assert_eq!(m.winner.age, None);
    }

    #[test]
    fn rows_without_two_ids_are_skipped() {
        let text = format!("{HEADER}\nx,Hard,20240101,1,,,,,2,,,,\nx,Hard,20240101,2,3,,,,3,,,,\n");
        let report = parse_csv_str(&text).expect("parse");
        assert!(report.matches.is_empty());
        assert_eq!(report.rows_read, 2);
        assert_eq!(report.rows_skipped, 2);
    }

    #[test]
    fn quoted_fields_with_commas_and_newlines() {
        let text = "tourney_name,winner_id,loser_id\n\"Roland Garros, Paris\",1,2\n\"Multi\nLine\",3,4\n";
        let report = parse_csv_str(text).expect("parse");
        assert_eq!(report.matches.len(), 2);
        assert_eq!(
            report.matches[0].tourney_name.as_deref(),
            Some("Roland Garros, Paris")
        );
        assert_eq!(report.matches[1].tourney_name.as_deref(), Some("Multi\nLine"));
    }

    #[test]
    fn latin1_fallback_decodes_accents() {
        let bytes = b"winner_name\nJos\xe9\n";
        let (text, latin1) = decode_text(bytes);
        assert!(latin1);
        assert!(text.contains("José"));

        let (utf8, latin1) = decode_text("José".as_bytes());
        assert!(!latin1);
        assert_eq!(utf8, "José");
    }

    #[test]
    fn float_formatted_integers_parse() {
        assert_eq!(parse_int("185.0"), Some(185));
        assert_eq!(parse_int("185.5"), None);
        assert_eq!(parse_int("abc"), None);
    }
}
