use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use tennis_predictor::cli;
use tennis_predictor::config;
use tennis_predictor::ingest;
use tennis_predictor::store::{self, StoreSummary};

fn main() -> Result<()> {
    cli::load_env();
    cli::init_tracing();
    let args = cli::args();

    let files: Vec<PathBuf> = cli::positional_args(&args, &["--db"])
        .into_iter()
        .map(PathBuf::from)
        .collect();
    if files.is_empty() {
        return Err(anyhow!("usage: hist_ingest [--db <path>] <csv files...>"));
    }

    let db_path = cli::path_arg(&args, "--db")
        .or_else(config::default_db_path)
        .context("unable to resolve sqlite path")?;

    let report = ingest::load_csv_files(&files)?;

    let mut conn = store::open_db(&db_path)?;
    let run_id = store::begin_run(&conn)?;
    let upserted = store::upsert_matches(&mut conn, &report.matches)?;
    let summary = StoreSummary {
        files: files.len(),
        rows_read: report.rows_read,
        rows_skipped: report.rows_skipped,
        matches_upserted: upserted,
    };
    store::finish_run(&conn, run_id, &summary)?;
    let total = store::count_matches(&conn)?;

    println!("Historical ingest complete");
    println!("DB: {}", db_path.display());
    println!("Files: {}", summary.files);
    println!(
        "Rows: {} read, {} skipped",
        summary.rows_read, summary.rows_skipped
    );
    if report.latin1_files > 0 {
        println!("Latin-1 decoded files: {}", report.latin1_files);
    }
    println!("Matches upserted: {}", summary.matches_upserted);
    println!("Matches stored: {total}");
    Ok(())
}
