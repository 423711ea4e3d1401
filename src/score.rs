//! Match score strings (`"6-4 3-6 7-6(5)"`, `"6-2 3-1 RET"`, `"W/O"`) reduced
//! to winner-perspective ratios.

const MARKERS: &[&str] = &["RET", "W/O", "WO", "DEF", "ABD"];

/// Games per side of one set; larger values mark a corrupt token.
const MAX_SET_GAMES: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreSummary {
    pub sets_won_ratio: Option<f32>,
    pub sets_lost_ratio: Option<f32>,
    pub games_won_ratio: Option<f32>,
    pub games_lost_ratio: Option<f32>,
    pub tiebreak_ratio: Option<f32>,
    pub retired: bool,
}

impl ScoreSummary {
    /// Feature-schema order.
    pub fn values(&self) -> [Option<f32>; 6] {
        [
            self.sets_won_ratio,
            self.sets_lost_ratio,
            self.games_won_ratio,
            self.games_lost_ratio,
            self.tiebreak_ratio,
            Some(if self.retired { 1.0 } else { 0.0 }),
        ]
    }
}

pub fn parse_score(score: Option<&str>) -> ScoreSummary {
    let Some(raw) = score.map(str::trim).filter(|s| !s.is_empty()) else {
        return ScoreSummary::default();
    };

    let mut sets_won = 0u32;
    let mut sets_lost = 0u32;
    let mut games_won = 0u32;
    let mut games_lost = 0u32;
    let mut tiebreaks = 0u32;
    let mut retired = false;

    for token in raw.split_whitespace() {
        if is_marker(token) {
            retired = true;
            continue;
        }
        let Some((left, right)) = parse_set(token) else {
            continue;
        };
        games_won = games_won.saturating_add(left);
        games_lost = games_lost.saturating_add(right);
        if left > right {
            sets_won += 1;
        } else {
            sets_lost += 1;
        }
        if token.contains('(') {
            tiebreaks += 1;
        }
    }

    let sets = sets_won.saturating_add(sets_lost);
    let games = games_won.saturating_add(games_lost);
    ScoreSummary {
        sets_won_ratio: ratio(sets_won, sets),
        sets_lost_ratio: ratio(sets_lost, sets),
        games_won_ratio: ratio(games_won, games),
        games_lost_ratio: ratio(games_lost, games),
        tiebreak_ratio: Some(ratio(tiebreaks, sets).unwrap_or(0.0)),
        retired,
    }
}

fn is_marker(token: &str) -> bool {
    let t = token.trim_end_matches('.');
    MARKERS.iter().any(|m| t.eq_ignore_ascii_case(m))
}

fn parse_set(token: &str) -> Option<(u32, u32)> {
    let mut parts = token.split('-');
    let left = games_in(parts.next()?)?;
    let right = games_in(parts.next()?)?;
    Some((left, right))
}

// Tiebreak points in parentheses are not games.
fn games_in(side: &str) -> Option<u32> {
    let head = side.split('(').next().unwrap_or(side);
    let digits: String = head.chars().filter(|c| c.is_ascii_digit()).collect();
    digits
        .parse::<u32>()
        .ok()
        .filter(|games| *games <= MAX_SET_GAMES)
}

fn ratio(count: u32, total: u32) -> Option<f32> {
    if total == 0 {
        None
    } else {
        Some(count as f32 / total as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f32>, b: f32) -> bool {
        a.is_some_and(|v| (v - b).abs() < 1e-6)
    }

    #[test]
    fn three_sets_with_tiebreak() {
        let s = parse_score(Some("6-4 3-6 7-6(5)"));
        assert!(close(s.sets_won_ratio, 2.0 / 3.0));
        assert!(close(s.sets_lost_ratio, 1.0 / 3.0));
        assert!(close(s.games_won_ratio, 0.5));
        assert!(close(s.games_lost_ratio, 0.5));
        assert!(close(s.tiebreak_ratio, 1.0 / 3.0));
        assert!(!s.retired);
    }

    #[test]
    fn walkover_has_no_ratios() {
        let s = parse_score(Some("W/O"));
        assert!(s.retired);
        assert_eq!(s.sets_won_ratio, None);
        assert_eq!(s.sets_lost_ratio, None);
        assert_eq!(s.games_won_ratio, None);
        assert_eq!(s.games_lost_ratio, None);
        assert_eq!(s.values()[5], Some(1.0));
    }

    #[test]
    fn retirement_keeps_completed_sets() {
        let s = parse_score(Some("6-2 3-1 ret."));
        assert!(s.retired);
        assert!(close(s.sets_won_ratio, 1.0));
        assert!(close(s.games_won_ratio, 9.0 / 12.0));
        assert!(close(s.tiebreak_ratio, 0.0));
    }

    #[test]
    fn missing_score_is_fully_missing() {
        for input in [None, Some(""), Some("   ")] {
            let s = parse_score(input);
            assert_eq!(s.values(), [None, None, None, None, None, Some(0.0)]);
        }
    }

    #[test]
    fn equal_games_count_as_lost_set() {
        let s = parse_score(Some("6-6"));
        assert!(close(s.sets_won_ratio, 0.0));
        assert!(close(s.sets_lost_ratio, 1.0));
    }

    #[test]
    fn malformed_tokens_are_skipped() {
        let s = parse_score(Some("6-4 x-y 6-"));
        assert!(close(s.sets_won_ratio, 1.0));
        assert!(close(s.games_won_ratio, 0.6));
    }

    #[test]
    fn match_tiebreak_brackets_parse_as_set() {
        let s = parse_score(Some("6-4 4-6 [10-8]"));
        assert!(close(s.sets_won_ratio, 2.0 / 3.0));
    }

    #[test]
    fn oversized_game_counts_are_skipped() {
        let s = parse_score(Some("4000000000-1 4000000000-1"));
        assert_eq!(s.sets_won_ratio, None);
        assert_eq!(s.games_won_ratio, None);
        assert!(close(s.tiebreak_ratio, 0.0));

        let s = parse_score(Some("6-4 99999999999999999999-0 70-68"));
        assert!(close(s.sets_won_ratio, 1.0));
        assert!(close(s.games_won_ratio, 76.0 / 148.0));
    }
}
