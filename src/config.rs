use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataset::Imputation;
use crate::features::DEFAULT_FORM_WINDOW;
use crate::history::{DEFAULT_HISTORY_CAP, FLAT_RATING_STEP, RatingRule};

const CACHE_DIR: &str = "tennis_predictor";
const DEFAULT_ELO_K: f64 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Emit a loser-first (label 0) row next to every winner-first row.
    pub symmetric_augmentation: bool,
    pub form_window: usize,
    pub history_cap: usize,
    pub rating_rule: RatingRule,
    pub imputation: Imputation,
    /// Let the vocabulary pass add unseen surfaces, rounds, levels, hands and
    /// entry types instead of encoding them as -1.
    pub extend_seeded_categories: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            symmetric_augmentation: true,
            form_window: DEFAULT_FORM_WINDOW,
            history_cap: DEFAULT_HISTORY_CAP,
            rating_rule: RatingRule::default(),
            imputation: Imputation::GlobalMean,
            extend_seeded_categories: false,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `TENNIS_*` environment variables. Unparsable
    /// values keep the default.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_bool("TENNIS_SYMMETRIC_AUG") {
            cfg.symmetric_augmentation = v;
        }
        if let Some(v) = env_parse::<usize>("TENNIS_FORM_WINDOW") {
            cfg.form_window = v.max(1);
        }
        if let Some(v) = env_parse::<usize>("TENNIS_HISTORY_CAP") {
            cfg.history_cap = v.max(1);
        }
        if let Some(v) = env_bool("TENNIS_EXTEND_CATEGORIES") {
            cfg.extend_seeded_categories = v;
        }
        if let Ok(raw) = std::env::var("TENNIS_IMPUTATION")
            && let Some(imp) = Imputation::parse(&raw)
        {
            cfg.imputation = imp;
        }
        if let Ok(raw) = std::env::var("TENNIS_RATING_RULE") {
            let k = env_parse::<f64>("TENNIS_ELO_K").unwrap_or(DEFAULT_ELO_K);
            if let Some(rule) = parse_rating_rule(&raw, k) {
                cfg.rating_rule = rule;
            }
        }
        cfg
    }
}

pub fn parse_rating_rule(raw: &str, elo_k: f64) -> Option<RatingRule> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "flat" => Some(RatingRule::Flat {
            step: FLAT_RATING_STEP,
        }),
        "elo" => Some(RatingRule::Elo {
            k: elo_k.clamp(1.0, 100.0),
        }),
        _ => None,
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse::<T>().ok()
}

fn env_bool(key: &str) -> Option<bool> {
    parse_bool(&std::env::var(key).ok()?)
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    // Fallback to ~/.cache on linux-like systems.
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    std::env::var("TENNIS_DB_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| app_cache_dir().map(|dir| dir.join("matches.sqlite")))
}

pub fn default_data_dir() -> PathBuf {
    std::env::var("TENNIS_DATA_DIR")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/raw"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_preserve_flat_rule_and_augmentation() {
        let cfg = PipelineConfig::default();
        assert!(cfg.symmetric_augmentation);
        assert_eq!(cfg.form_window, 10);
        assert_eq!(cfg.history_cap, 50);
        assert_eq!(cfg.rating_rule, RatingRule::Flat { step: 10.0 });
        assert_eq!(cfg.imputation, Imputation::GlobalMean);
    }

    #[test]
    fn rating_rule_names_parse() {
        assert_eq!(
            parse_rating_rule(" ELO ", 24.0),
            Some(RatingRule::Elo { k: 24.0 })
        );
        assert_eq!(
            parse_rating_rule("flat", 24.0),
            Some(RatingRule::Flat { step: 10.0 })
        );
        assert_eq!(parse_rating_rule("glicko", 24.0), None);
    }

    #[test]
    fn bools_accept_common_spellings() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
