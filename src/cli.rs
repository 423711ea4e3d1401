//! Argument and process setup shared by the binaries.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "tennis_predictor=info";

/// Loads `.env.local` then `.env`; earlier files win.
pub fn load_env() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// Logs go to stderr so stdout stays clean for run summaries.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// `--name value` or `--name=value`. Blank values are ignored.
pub fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

pub fn path_arg(args: &[String], name: &str) -> Option<PathBuf> {
    arg_value(args, name).map(PathBuf::from)
}

pub fn parse_arg<T: std::str::FromStr>(args: &[String], name: &str) -> Option<T> {
    arg_value(args, name)?.parse::<T>().ok()
}

pub fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}

/// Arguments that are neither flags nor the value following one of
/// `valued` (flags that take a value).
pub fn positional_args(args: &[String], valued: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            skip_next = valued.contains(&arg.as_str());
            continue;
        }
        out.push(arg.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn values_accept_both_spellings() {
        let args = argv(&["--db", "a.sqlite", "--out=f.parquet", "--sort"]);
        assert_eq!(arg_value(&args, "--db").as_deref(), Some("a.sqlite"));
        assert_eq!(arg_value(&args, "--out").as_deref(), Some("f.parquet"));
        assert_eq!(arg_value(&args, "--sort"), None);
        assert!(has_flag(&args, "--sort"));
        assert!(!has_flag(&args, "--xlsx"));
    }

    #[test]
    fn positionals_skip_flag_values() {
        let args = argv(&["--db", "a.sqlite", "2023.csv", "--sort", "2024.csv", "--out=x"]);
        assert_eq!(
            positional_args(&args, &["--db", "--out"]),
            vec!["2023.csv".to_string(), "2024.csv".to_string()]
        );
    }

    #[test]
    fn numeric_args_parse() {
        let args = argv(&["--from", "1990", "--to", "x"]);
        assert_eq!(parse_arg::<i32>(&args, "--from"), Some(1990));
        assert_eq!(parse_arg::<i32>(&args, "--to"), None);
    }
}
