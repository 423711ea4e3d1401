use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use tennis_predictor::cli;
use tennis_predictor::config::{self, PipelineConfig};
use tennis_predictor::dataset::{DatasetAssembler, Imputation};
use tennis_predictor::export;
use tennis_predictor::ingest;
use tennis_predictor::persist;
use tennis_predictor::processor::ChronologicalProcessor;
use tennis_predictor::record::{MatchRecord, sort_chronologically};
use tennis_predictor::schema::FeatureRow;
use tennis_predictor::store;

const VALUED_FLAGS: &[&str] = &[
    "--db",
    "--out",
    "--xlsx",
    "--encoders",
    "--vocab-from",
    "--form-window",
    "--history-cap",
    "--rating",
    "--elo-k",
    "--imputation",
];
const DEFAULT_OUT: &str = "data/features.parquet";
const DEFAULT_ELO_K: f64 = 32.0;

fn main() -> Result<()> {
    cli::load_env();
    cli::init_tracing();
    let args = cli::args();

    let cfg = parse_config(&args)?;
    let mut matches = load_matches(&args)?;
    if cli::has_flag(&args, "--sort") {
        sort_chronologically(&mut matches);
    }

    let mut processor = ChronologicalProcessor::new(cfg);
    if let Some(dir) = cli::path_arg(&args, "--vocab-from") {
        let encoder = persist::load_encoders(&dir)?;
        processor = processor.with_encoder(encoder);
    }
    let rows = processor.process(&matches)?;
    let matrix = DatasetAssembler::new(cfg.imputation).assemble(&rows)?;

    print_first_row(&rows);

    let out = cli::path_arg(&args, "--out").unwrap_or_else(|| PathBuf::from(DEFAULT_OUT));
    export::write_parquet(&out, &matrix)?;
    if let Some(xlsx) = cli::path_arg(&args, "--xlsx") {
        export::write_feature_workbook(&xlsx, &matrix, &rows)?;
        println!("Workbook: {}", xlsx.display());
    }
    if let Some(dir) = cli::path_arg(&args, "--encoders") {
        persist::save_encoders(&dir, processor.encoder())?;
        println!("Encoders: {}", dir.display());
    }

    println!("Feature build complete");
    println!("Matches: {}", matches.len());
    println!("Skipped: {}", processor.skipped());
    println!("Players: {}", processor.histories().len());
    println!(
        "Rows: {} ({} positive), columns: {}",
        matrix.n_rows,
        matrix.positive_labels(),
        matrix.n_cols
    );
    println!("Parquet: {}", out.display());
    Ok(())
}

fn parse_config(args: &[String]) -> Result<PipelineConfig> {
    let mut cfg = PipelineConfig::from_env();
    if cli::has_flag(args, "--no-augment") {
        cfg.symmetric_augmentation = false;
    }
    if cli::has_flag(args, "--extend-categories") {
        cfg.extend_seeded_categories = true;
    }
    if let Some(n) = cli::parse_arg::<usize>(args, "--form-window") {
        cfg.form_window = n.max(1);
    }
    if let Some(n) = cli::parse_arg::<usize>(args, "--history-cap") {
        cfg.history_cap = n.max(1);
    }
    if let Some(raw) = cli::arg_value(args, "--rating") {
        let k = cli::parse_arg::<f64>(args, "--elo-k").unwrap_or(DEFAULT_ELO_K);
        cfg.rating_rule = config::parse_rating_rule(&raw, k)
            .ok_or_else(|| anyhow!("unknown rating rule {raw:?} (flat|elo)"))?;
    }
    if let Some(raw) = cli::arg_value(args, "--imputation") {
        cfg.imputation = Imputation::parse(&raw)
            .ok_or_else(|| anyhow!("unknown imputation {raw:?} (global|running)"))?;
    }
    Ok(cfg)
}

/// CSV paths win over the store.
fn load_matches(args: &[String]) -> Result<Vec<MatchRecord>> {
    let files: Vec<PathBuf> = cli::positional_args(args, VALUED_FLAGS)
        .into_iter()
        .map(PathBuf::from)
        .collect();
    if !files.is_empty() {
        let report = ingest::load_csv_files(&files)?;
        println!(
            "Loaded {} matches from {} file(s), {} rows skipped",
            report.matches.len(),
            files.len(),
            report.rows_skipped
        );
        return Ok(report.matches);
    }

    let db_path = cli::path_arg(args, "--db")
        .or_else(config::default_db_path)
        .context("unable to resolve sqlite path")?;
    let conn = store::open_db(&db_path)?;
    let matches = store::load_matches(&conn)?;
    if matches.is_empty() {
        return Err(anyhow!(
            "no matches in {}; run hist_ingest first or pass csv files",
            db_path.display()
        ));
    }
    println!("Loaded {} matches from {}", matches.len(), db_path.display());
    Ok(matches)
}

fn print_first_row(rows: &[FeatureRow]) {
    let Some(first) = rows.first() else {
        return;
    };
    println!("First row (label {}):", first.label);
    for (name, value) in tennis_predictor::schema::FEATURE_NAMES
        .iter()
        .zip(&first.values)
    {
        match value {
            Some(v) => println!("  {name:<20} {v}"),
            None => println!("  {name:<20} missing"),
        }
    }
}
