use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

pub const BASELINE_RATING: f64 = 1500.0;
pub const DEFAULT_HISTORY_CAP: usize = 50;
pub const FLAT_RATING_STEP: f64 = 10.0;
pub const KNOWN_SURFACES: [&str; 4] = ["Hard", "Clay", "Grass", "Carpet"];

/// How a finished match moves a player's ratings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RatingRule {
    /// Fixed step up for a win, down for a loss.
    Flat { step: f64 },
    /// Expectation-based update against the opponent's pre-match rating.
    Elo { k: f64 },
}

impl Default for RatingRule {
    fn default() -> Self {
        RatingRule::Flat {
            step: FLAT_RATING_STEP,
        }
    }
}

impl RatingRule {
    pub fn delta(&self, own: f64, opponent: f64, won: bool) -> f64 {
        match *self {
            RatingRule::Flat { step } => {
                if won {
                    step
                } else {
                    -step
                }
            }
            RatingRule::Elo { k } => {
                let s = if won { 1.0 } else { 0.0 };
                k * (s - expected_score(own, opponent))
            }
        }
    }
}

fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf(-(r_a - r_b) / 400.0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerHistory {
    pub rating: f64,
    pub surface_ratings: HashMap<String, f64>,
    /// Most recent first.
    recent: VecDeque<bool>,
    cap: usize,
    pub matches_total: u32,
    pub wins_total: u32,
}

impl Default for PlayerHistory {
    fn default() -> Self {
        Self::with_cap(DEFAULT_HISTORY_CAP)
    }
}

impl PlayerHistory {
    pub fn with_cap(cap: usize) -> Self {
        let surface_ratings = KNOWN_SURFACES
            .iter()
            .map(|s| ((*s).to_string(), BASELINE_RATING))
            .collect();
        Self {
            rating: BASELINE_RATING,
            surface_ratings,
            recent: VecDeque::with_capacity(cap.min(DEFAULT_HISTORY_CAP) + 1),
            cap: cap.max(1),
            matches_total: 0,
            wins_total: 0,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn recent(&self) -> impl Iterator<Item = bool> + '_ {
        self.recent.iter().copied()
    }

    pub fn window_len(&self) -> usize {
        self.recent.len()
    }

    /// Win fraction over the `last_n` most recent results, 0.5 without any.
    pub fn recent_form_rate(&self, last_n: usize) -> f64 {
        let taken = self.recent.iter().take(last_n);
        let (wins, total) = taken.fold((0usize, 0usize), |(w, t), won| {
            (w + usize::from(*won), t + 1)
        });
        if total == 0 {
            0.5
        } else {
            wins as f64 / total as f64
        }
    }

    pub fn surface_rating(&self, surface: Option<&str>) -> f64 {
        surface
            .and_then(|s| self.surface_ratings.get(s))
            .copied()
            .unwrap_or(BASELINE_RATING)
    }

    /// Flat ±10 update.
    pub fn record_outcome(&mut self, surface: Option<&str>, won: bool) {
        let delta = RatingRule::default().delta(0.0, 0.0, won);
        self.record_rated_outcome(surface, won, delta, delta);
    }

    pub fn record_rated_outcome(
        &mut self,
        surface: Option<&str>,
        won: bool,
        overall_delta: f64,
        surface_delta: f64,
    ) {
        self.matches_total += 1;
        if won {
            self.wins_total += 1;
        }
        self.recent.push_front(won);
        while self.recent.len() > self.cap {
            self.recent.pop_back();
        }

        if overall_delta.is_finite() {
            self.rating += overall_delta;
        }
        if let Some(surface) = surface
            && surface_delta.is_finite()
        {
            *self
                .surface_ratings
                .entry(surface.to_string())
                .or_insert(BASELINE_RATING) += surface_delta;
        }
    }
}

/// All player histories, created lazily on first encounter.
#[derive(Debug, Clone)]
pub struct PlayerHistories {
    players: HashMap<String, PlayerHistory>,
    cap: usize,
    rule: RatingRule,
}

impl Default for PlayerHistories {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP, RatingRule::default())
    }
}

impl PlayerHistories {
    pub fn new(cap: usize, rule: RatingRule) -> Self {
        Self {
            players: HashMap::new(),
            cap,
            rule,
        }
    }

    pub fn with_players(
        players: HashMap<String, PlayerHistory>,
        cap: usize,
        rule: RatingRule,
    ) -> Self {
        Self {
            players,
            cap,
            rule,
        }
    }

    pub fn get(&self, player: &str) -> Option<&PlayerHistory> {
        self.players.get(player)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn form_rate(&self, player: &str, last_n: usize) -> f64 {
        self.players
            .get(player)
            .map_or(0.5, |h| h.recent_form_rate(last_n))
    }

    pub fn surface_rating(&self, player: &str, surface: Option<&str>) -> f64 {
        self.players
            .get(player)
            .map_or(BASELINE_RATING, |h| h.surface_rating(surface))
    }

    pub fn rating(&self, player: &str) -> f64 {
        self.players.get(player).map_or(BASELINE_RATING, |h| h.rating)
    }

    /// Advances both participants. Deltas are computed from pre-match ratings.
    pub fn record_match(&mut self, winner: &str, loser: &str, surface: Option<&str>) {
        let (w_overall, l_overall) = (self.rating(winner), self.rating(loser));
        let (w_surface, l_surface) = (
            self.surface_rating(winner, surface),
            self.surface_rating(loser, surface),
        );

        let rule = self.rule;
        let cap = self.cap;
        self.players
            .entry(winner.to_string())
            .or_insert_with(|| PlayerHistory::with_cap(cap))
            .record_rated_outcome(
                surface,
                true,
                rule.delta(w_overall, l_overall, true),
                rule.delta(w_surface, l_surface, true),
            );
        self.players
            .entry(loser.to_string())
            .or_insert_with(|| PlayerHistory::with_cap(cap))
            .record_rated_outcome(
                surface,
                false,
                rule.delta(l_overall, w_overall, false),
                rule.delta(l_surface, w_surface, false),
            );
    }

    pub fn into_players(self) -> HashMap<String, PlayerHistory> {
        self.players
    }
}

/// Directed win counts: winner → opponent → wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadTable {
    wins: HashMap<String, HashMap<String, u32>>,
}

impl HeadToHeadTable {
    pub fn wins(&self, winner: &str, loser: &str) -> u32 {
        self.wins
            .get(winner)
            .and_then(|m| m.get(loser))
            .copied()
            .unwrap_or(0)
    }

    pub fn win_rate(&self, p1: Option<&str>, p2: Option<&str>) -> f64 {
        let (Some(p1), Some(p2)) = (p1, p2) else {
            return 0.5;
        };
        let p1_wins = self.wins(p1, p2);
        let p2_wins = self.wins(p2, p1);
        let total = p1_wins + p2_wins;
        if total == 0 {
            0.5
        } else {
            p1_wins as f64 / total as f64
        }
    }

    pub fn record_win(&mut self, winner: &str, loser: &str) {
        *self
            .wins
            .entry(winner.to_string())
            .or_default()
            .entry(loser.to_string())
            .or_insert(0) += 1;
    }
}
