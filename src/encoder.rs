use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::MatchRecord;

/// Code for absent or never-seen values.
pub const UNSEEN: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Surface,
    Hand,
    Round,
    Level,
    Entry,
    Country,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Surface,
        Category::Hand,
        Category::Round,
        Category::Level,
        Category::Entry,
        Category::Country,
    ];

    /// Well-known values with fixed codes. Entry code 4 belonged to the blank
    /// entry type and stays unused.
    pub fn seed(self) -> &'static [(&'static str, i32)] {
        match self {
            Category::Surface => &[("Hard", 0), ("Clay", 1), ("Grass", 2), ("Carpet", 3)],
            Category::Hand => &[("R", 0), ("L", 1), ("U", 2)],
            Category::Round => &[
                ("R128", 0),
                ("R64", 1),
                ("R32", 2),
                ("R16", 3),
                ("QF", 4),
                ("SF", 5),
                ("F", 6),
            ],
            Category::Level => &[("G", 0), ("M", 1), ("A", 2), ("B", 3), ("F", 4), ("D", 5)],
            Category::Entry => &[("Q", 0), ("WC", 1), ("LL", 2), ("SE", 3), ("D", 5)],
            Category::Country => &[],
        }
    }

    pub fn is_seeded(self) -> bool {
        !self.seed().is_empty()
    }
}

/// Per-category value → code tables. Codes are assigned in first-seen order and
/// never change once assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    tables: BTreeMap<Category, BTreeMap<String, i32>>,
}

impl Default for CategoricalEncoder {
    fn default() -> Self {
        Self::seeded()
    }
}

impl CategoricalEncoder {
    pub fn seeded() -> Self {
        let tables = Category::ALL
            .iter()
            .map(|c| {
                let table = c
                    .seed()
                    .iter()
                    .map(|(value, code)| ((*value).to_string(), *code))
                    .collect();
                (*c, table)
            })
            .collect();
        Self { tables }
    }

    /// Get-or-insert. Blank and absent values are not recorded.
    pub fn encode(&mut self, category: Category, value: Option<&str>) -> i32 {
        let Some(value) = normalize(value) else {
            return UNSEEN;
        };
        let table = self.tables.entry(category).or_default();
        if let Some(code) = table.get(value) {
            return *code;
        }
        let next = table.values().copied().max().map_or(0, |m| m + 1);
        table.insert(value.to_string(), next);
        next
    }

    /// Read-only lookup used while building rows.
    pub fn code(&self, category: Category, value: Option<&str>) -> i32 {
        let Some(value) = normalize(value) else {
            return UNSEEN;
        };
        self.tables
            .get(&category)
            .and_then(|t| t.get(value))
            .copied()
            .unwrap_or(UNSEEN)
    }

    pub fn len(&self, category: Category) -> usize {
        self.tables.get(&category).map_or(0, BTreeMap::len)
    }

    pub fn table(&self, category: Category) -> BTreeMap<String, i32> {
        self.tables.get(&category).cloned().unwrap_or_default()
    }

    /// Registers every categorical value of one record. Seeded categories are
    /// only extended when `extend_seeded` is set.
    pub fn observe(&mut self, m: &MatchRecord, extend_seeded: bool) {
        for side in [&m.winner, &m.loser] {
            self.encode(Category::Country, side.country.as_deref());
        }
        if !extend_seeded {
            return;
        }
        self.encode(Category::Surface, m.surface.as_deref());
        self.encode(Category::Level, m.tourney_level.as_deref());
        self.encode(Category::Round, m.round.as_deref());
        for side in [&m.winner, &m.loser] {
            self.encode(Category::Hand, side.hand.as_deref());
            self.encode(Category::Entry, side.entry.as_deref());
        }
    }
}

fn normalize(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Read-only vocabulary pass over the full match sequence.
pub fn build_vocabulary(
    base: CategoricalEncoder,
    matches: &[MatchRecord],
    extend_seeded: bool,
) -> CategoricalEncoder {
    let mut encoder = base;
    for m in matches {
        encoder.observe(m, extend_seeded);
    }
    encoder
}
