use std::ops::Range;

use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 54;

/// Column names, in the exact order `FeatureRowBuilder` emits values.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "surface_enc",
    "draw_size",
    "tourney_level_enc",
    "tourney_date_days",
    "tourney_date_year",
    "tourney_date_month",
    "match_num",
    "best_of",
    "round_enc",
    "p1_seed",
    "p1_entry_enc",
    "p1_hand_enc",
    "p1_ht",
    "p1_ioc_enc",
    "p1_age",
    "p1_rank",
    "p1_rank_points",
    "p2_seed",
    "p2_entry_enc",
    "p2_hand_enc",
    "p2_ht",
    "p2_ioc_enc",
    "p2_age",
    "p2_rank",
    "p2_rank_points",
    "minutes",
    "p1_ace",
    "p1_df",
    "p1_svpt",
    "p1_1stIn",
    "p1_1stWon",
    "p1_2ndWon",
    "p1_SvGms",
    "p1_bpSaved",
    "p1_bpFaced",
    "p2_ace",
    "p2_df",
    "p2_svpt",
    "p2_1stIn",
    "p2_1stWon",
    "p2_2ndWon",
    "p2_SvGms",
    "p2_bpSaved",
    "p2_bpFaced",
    "h2h_p1_vs_p2",
    "p1_form",
    "p2_form",
    "setsW_pct",
    "setsL_pct",
    "gamesW_pct",
    "gamesL_pct",
    "tiebreak_ratio",
    "retired_flag",
    "p1_surface_elo",
];

pub const METADATA: Range<usize> = 0..9;
pub const P1_ATTRS: Range<usize> = 9..17;
pub const P2_ATTRS: Range<usize> = 17..25;
pub const MINUTES: usize = 25;
pub const P1_SERVE: Range<usize> = 26..35;
pub const P2_SERVE: Range<usize> = 35..44;
pub const H2H: usize = 44;
pub const P1_FORM: usize = 45;
pub const P2_FORM: usize = 46;
pub const SCORE: Range<usize> = 47..53;
pub const P1_SURFACE_RATING: usize = 53;

pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|n| (*n).to_string()).collect()
}

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

/// One featurized match perspective. `None` marks a missing value until the
/// assembler imputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub values: Vec<Option<f32>>,
    pub label: u8,
}

impl FeatureRow {
    pub fn get(&self, name: &str) -> Option<f32> {
        feature_index(name).and_then(|i| self.values.get(i).copied().flatten())
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}
