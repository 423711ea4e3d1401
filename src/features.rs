use chrono::NaiveDate;

use crate::encoder::{CategoricalEncoder, Category};
use crate::history::{HeadToHeadTable, PlayerHistories};
use crate::record::{MatchRecord, Perspective, Side};
use crate::schema::{FEATURE_COUNT, FeatureRow};
use crate::score::parse_score;

pub const DEFAULT_FORM_WINDOW: usize = 10;

/// `YYYYMMDD` split into calendar parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub epoch_days: i64,
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

/// Non-positive input decomposes to all zeros; an impossible calendar date
/// keeps its year/month but has epoch day 0.
pub fn decompose_date(yyyymmdd: i32) -> DateParts {
    if yyyymmdd <= 0 {
        return DateParts {
            epoch_days: 0,
            year: 0,
            month: 0,
            day: 0,
        };
    }
    let year = yyyymmdd / 10000;
    let month = (yyyymmdd / 100) % 100;
    let day = yyyymmdd % 100;
    DateParts {
        epoch_days: epoch_days(year, month, day).unwrap_or(0),
        year,
        month,
        day,
    }
}

fn epoch_days(year: i32, month: i32, day: i32) -> Option<i64> {
    let date = NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)?;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    Some(date.signed_duration_since(epoch).num_days())
}

/// Reads the current pipeline state for one match. Never mutates anything, so a
/// row built here only reflects matches recorded before it.
pub struct FeatureRowBuilder<'a> {
    encoder: &'a CategoricalEncoder,
    histories: &'a PlayerHistories,
    h2h: &'a HeadToHeadTable,
    form_window: usize,
}

impl<'a> FeatureRowBuilder<'a> {
    pub fn new(
        encoder: &'a CategoricalEncoder,
        histories: &'a PlayerHistories,
        h2h: &'a HeadToHeadTable,
        form_window: usize,
    ) -> Self {
        Self {
            encoder,
            histories,
            h2h,
            form_window,
        }
    }

    pub fn build(&self, m: &MatchRecord, perspective: Perspective) -> FeatureRow {
        let p1 = perspective.player1();
        let p2 = perspective.player2();
        let mut f: Vec<Option<f32>> = Vec::with_capacity(FEATURE_COUNT);

        f.push(self.code(Category::Surface, m.surface.as_deref()));
        f.push(num(m.draw_size));
        f.push(self.code(Category::Level, m.tourney_level.as_deref()));
        let date = decompose_date(m.tourney_date.unwrap_or(-1));
        f.push(Some(date.epoch_days as f32));
        f.push(Some(date.year as f32));
        f.push(Some(date.month as f32));
        f.push(num(m.match_num));
        f.push(num(m.best_of));
        f.push(self.code(Category::Round, m.round.as_deref()));

        self.push_player(&mut f, m, p1);
        self.push_player(&mut f, m, p2);

        f.push(num(m.minutes));

        f.extend(m.serve(p1).values().into_iter().map(num));
        f.extend(m.serve(p2).values().into_iter().map(num));

        let p1_id = id_of(m, p1);
        let p2_id = id_of(m, p2);
        f.push(Some(self.h2h.win_rate(p1_id, p2_id) as f32));
        f.push(Some(self.form(p1_id) as f32));
        f.push(Some(self.form(p2_id) as f32));

        f.extend(parse_score(m.score.as_deref()).values());

        let surface_rating = p1_id.map_or(crate::history::BASELINE_RATING, |id| {
            self.histories.surface_rating(id, m.surface.as_deref())
        });
        f.push(Some(surface_rating as f32));

        debug_assert_eq!(f.len(), FEATURE_COUNT);
        FeatureRow {
            values: f,
            label: perspective.label(),
        }
    }

    fn push_player(&self, f: &mut Vec<Option<f32>>, m: &MatchRecord, side: Side) {
        let p = m.player(side);
        f.push(num(p.seed));
        f.push(self.code(Category::Entry, p.entry.as_deref()));
        f.push(self.code(Category::Hand, p.hand.as_deref()));
        f.push(num(p.height));
        f.push(self.code(Category::Country, p.country.as_deref()));
        f.push(p.age.map(|a| a as f32));
        f.push(num(p.rank));
        f.push(num(p.rank_points));
    }

    fn code(&self, category: Category, value: Option<&str>) -> Option<f32> {
        Some(self.encoder.code(category, value) as f32)
    }

    fn form(&self, player: Option<&str>) -> f64 {
        player.map_or(0.5, |id| self.histories.form_rate(id, self.form_window))
    }
}

fn num(v: Option<i32>) -> Option<f32> {
    v.map(|x| x as f32)
}

fn id_of(m: &MatchRecord, side: Side) -> Option<&str> {
    let id = m.player(side).id.trim();
    if id.is_empty() { None } else { Some(id) }
}
