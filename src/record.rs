use serde::{Deserialize, Serialize};

/// One side of a match as reported by the source table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: String,
    pub seed: Option<i32>,
    pub entry: Option<String>,
    pub name: Option<String>,
    pub hand: Option<String>,
    pub height: Option<i32>,
    pub country: Option<String>,
    pub age: Option<f64>,
    pub rank: Option<i32>,
    pub rank_points: Option<i32>,
}

impl PlayerEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServeStats {
    pub aces: Option<i32>,
    pub double_faults: Option<i32>,
    pub serve_points: Option<i32>,
    pub first_in: Option<i32>,
    pub first_won: Option<i32>,
    pub second_won: Option<i32>,
    pub service_games: Option<i32>,
    pub break_points_saved: Option<i32>,
    pub break_points_faced: Option<i32>,
}

impl ServeStats {
    /// Values in feature-schema order.
    pub fn values(&self) -> [Option<i32>; 9] {
        [
            self.aces,
            self.double_faults,
            self.serve_points,
            self.first_in,
            self.first_won,
            self.second_won,
            self.service_games,
            self.break_points_saved,
            self.break_points_faced,
        ]
    }
}

/// A completed historical match. Read-only once ingested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub tourney_id: Option<String>,
    pub tourney_name: Option<String>,
    pub surface: Option<String>,
    pub draw_size: Option<i32>,
    pub tourney_level: Option<String>,
    /// `YYYYMMDD`.
    pub tourney_date: Option<i32>,
    pub match_num: Option<i32>,
    pub winner: PlayerEntry,
    pub loser: PlayerEntry,
    pub score: Option<String>,
    pub best_of: Option<i32>,
    pub round: Option<String>,
    pub minutes: Option<i32>,
    pub winner_serve: ServeStats,
    pub loser_serve: ServeStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Winner,
    Loser,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Winner => Side::Loser,
            Side::Loser => Side::Winner,
        }
    }
}

/// Which actual side plays the "player 1" role in a feature row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    WinnerFirst,
    LoserFirst,
}

impl Perspective {
    pub fn player1(self) -> Side {
        match self {
            Perspective::WinnerFirst => Side::Winner,
            Perspective::LoserFirst => Side::Loser,
        }
    }

    pub fn player2(self) -> Side {
        self.player1().other()
    }

    pub fn label(self) -> u8 {
        match self {
            Perspective::WinnerFirst => 1,
            Perspective::LoserFirst => 0,
        }
    }
}

impl MatchRecord {
    pub fn new(winner: PlayerEntry, loser: PlayerEntry) -> Self {
        Self {
            winner,
            loser,
            ..Self::default()
        }
    }

    pub fn player(&self, side: Side) -> &PlayerEntry {
        match side {
            Side::Winner => &self.winner,
            Side::Loser => &self.loser,
        }
    }

    pub fn serve(&self, side: Side) -> &ServeStats {
        match side {
            Side::Winner => &self.winner_serve,
            Side::Loser => &self.loser_serve,
        }
    }

    /// Both identifiers present and distinct.
    pub fn is_usable(&self) -> bool {
        let w = self.winner.id.trim();
        let l = self.loser.id.trim();
        !w.is_empty() && !l.is_empty() && w != l
    }
}

/// Stable earliest-first ordering by tournament date, then tournament id, then
/// match number. Records without a date sort first.
pub fn sort_chronologically(matches: &mut [MatchRecord]) {
    matches.sort_by(|a, b| {
        a.tourney_date
            .cmp(&b.tourney_date)
            .then_with(|| a.tourney_id.cmp(&b.tourney_id))
            .then_with(|| a.match_num.cmp(&b.match_num))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perspective_maps_roles_and_labels() {
        assert_eq!(Perspective::WinnerFirst.player1(), Side::Winner);
        assert_eq!(Perspective::WinnerFirst.player2(), Side::Loser);
        assert_eq!(Perspective::LoserFirst.player1(), Side::Loser);
        assert_eq!(Perspective::WinnerFirst.label(), 1);
        assert_eq!(Perspective::LoserFirst.label(), 0);
    }

    #[test]
    fn usable_requires_distinct_ids() {
        assert!(MatchRecord::new(PlayerEntry::new("1"), PlayerEntry::new("2")).is_usable());
        assert!(!MatchRecord::new(PlayerEntry::new("1"), PlayerEntry::new("1")).is_usable());
        assert!(!MatchRecord::new(PlayerEntry::new(" "), PlayerEntry::new("2")).is_usable());
    }

    #[test]
    fn chronological_sort_is_stable_within_keys() {
        let mut a = MatchRecord::new(PlayerEntry::new("a"), PlayerEntry::new("b"));
        a.tourney_date = Some(20240201);
        let mut b = MatchRecord::new(PlayerEntry::new("c"), PlayerEntry::new("d"));
        b.tourney_date = Some(20240101);
        b.match_num = Some(2);
        let mut c = MatchRecord::new(PlayerEntry::new("e"), PlayerEntry::new("f"));
        c.tourney_date = Some(20240101);
        c.match_num = Some(1);

        let mut rows = vec![a, b, c];
        sort_chronologically(&mut rows);
        let order: Vec<&str> = rows.iter().map(|m| m.winner.id.as_str()).collect();
        assert_eq!(order, vec!["e", "c", "a"]);
    }
}
