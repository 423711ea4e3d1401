use anyhow::{Result, anyhow};

use tennis_predictor::cli;
use tennis_predictor::config;
use tennis_predictor::fetch::{self, FIRST_ARCHIVE_YEAR, LAST_ARCHIVE_YEAR};

fn main() -> Result<()> {
    cli::load_env();
    cli::init_tracing();
    let args = cli::args();

    let from = cli::parse_arg::<i32>(&args, "--from").unwrap_or(FIRST_ARCHIVE_YEAR);
    let to = cli::parse_arg::<i32>(&args, "--to").unwrap_or(LAST_ARCHIVE_YEAR);
    if from > to {
        return Err(anyhow!("--from {from} is after --to {to}"));
    }
    let dir = cli::path_arg(&args, "--dir").unwrap_or_else(config::default_data_dir);

    let report = fetch::download_years(&dir, from..=to)?;

    println!("Archive fetch complete");
    println!("Dir: {}", dir.display());
    println!("Years: {from}..={to}");
    println!("Downloaded: {}", report.downloaded.len());
    println!("Already present: {}", report.skipped.len());
    if !report.failed.is_empty() {
        println!("Failed: {}", report.failed.len());
        for (year, err) in report.failed.iter().take(6) {
            println!("   - {year}: {err}");
        }
    }
    Ok(())
}
