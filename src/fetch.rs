use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::http_client::http_client;

pub const ARCHIVE_BASE_URL: &str =
    "https://raw.githubusercontent.com/Tennismylife/TML-Database/master";
pub const FIRST_ARCHIVE_YEAR: i32 = 1968;
pub const LAST_ARCHIVE_YEAR: i32 = 2025;

const MAX_ATTEMPTS: u32 = 4;

#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub downloaded: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(i32, String)>,
}

impl FetchReport {
    /// Every file present on disk after the run, in year order.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut all: Vec<PathBuf> = self
            .downloaded
            .iter()
            .chain(self.skipped.iter())
            .cloned()
            .collect();
        all.sort();
        all
    }
}

pub fn year_url(year: i32) -> String {
    format!("{ARCHIVE_BASE_URL}/{year}.csv")
}

pub fn year_path(dir: &Path, year: i32) -> PathBuf {
    dir.join(format!("{year}.csv"))
}

/// Downloads one file per season. Files already on disk are left alone, and a
/// failed year is reported rather than aborting the rest.
pub fn download_years(dir: &Path, years: RangeInclusive<i32>) -> Result<FetchReport> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut report = FetchReport::default();
    for year in years {
        let path = year_path(dir, year);
        if path.exists() {
            report.skipped.push(path);
            continue;
        }
        match download_file(&year_url(year), &path) {
            Ok(path) => {
                info!(year, path = %path.display(), "downloaded");
                report.downloaded.push(path);
            }
            Err(err) => {
                warn!(year, error = %format!("{err:#}"), "download failed");
                report.failed.push((year, format!("{err:#}")));
            }
        }
    }
    Ok(report)
}

fn download_file(url: &str, path: &Path) -> Result<PathBuf> {
    let client = http_client()?;
    let mut last_err: Option<anyhow::Error> = None;
    for attempt in 1..=MAX_ATTEMPTS {
        let fetched = client
            .get(url)
            .send()
            .with_context(|| format!("request {url}"))
            .and_then(|res| {
                res.error_for_status()
                    .with_context(|| format!("status for {url}"))
            })
            .and_then(|res| res.bytes().with_context(|| format!("read body {url}")));
        match fetched {
            Ok(bytes) => {
                // Never leave a truncated csv behind for the skip-existing check.
                let tmp = path.with_extension("csv.tmp");
                fs::write(&tmp, &bytes).with_context(|| format!("write {}", tmp.display()))?;
                fs::rename(&tmp, path)
                    .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
                return Ok(path.to_path_buf());
            }
            Err(err) => {
                last_err = Some(err);
                if attempt < MAX_ATTEMPTS {
                    let sleep_ms = 500_u64.saturating_mul(u64::from(attempt));
                    std::thread::sleep(Duration::from_millis(sleep_ms));
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("download failed for {url}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_and_paths_follow_the_archive_layout() {
        assert_eq!(
            year_url(1991),
            "https://raw.githubusercontent.com/Tennismylife/TML-Database/master/1991.csv"
        );
        assert_eq!(
            year_path(Path::new("data/raw"), 2024),
            PathBuf::from("data/raw/2024.csv")
        );
    }

    #[test]
    fn existing_files_are_not_refetched() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(year_path(dir.path(), 2001), "winner_id,loser_id\n1,2\n").expect("seed");
        let report = download_years(dir.path(), 2001..=2001).expect("fetch");
        assert!(report.downloaded.is_empty());
        assert!(report.failed.is_empty());
        assert_eq!(report.files(), vec![year_path(dir.path(), 2001)]);
    }
}
