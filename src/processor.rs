use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::encoder::{CategoricalEncoder, build_vocabulary};
use crate::error::{PipelineError, Result};
use crate::features::FeatureRowBuilder;
use crate::history::{HeadToHeadTable, PlayerHistories, PlayerHistory};
use crate::record::{MatchRecord, Perspective};
use crate::schema::FeatureRow;

/// Owns all rolling state and drives the two passes over a match log.
///
/// Input must already be ordered earliest-first; nothing here sorts or checks
/// ordering, and an unordered log silently leaks future results into earlier
/// rows.
#[derive(Debug, Clone)]
pub struct ChronologicalProcessor {
    config: PipelineConfig,
    encoder: CategoricalEncoder,
    histories: PlayerHistories,
    h2h: HeadToHeadTable,
    skipped: usize,
}

impl ChronologicalProcessor {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_histories(config, HashMap::new())
    }

    /// Starts from previously accumulated player histories.
    pub fn with_histories(config: PipelineConfig, players: HashMap<String, PlayerHistory>) -> Self {
        Self {
            config,
            encoder: CategoricalEncoder::seeded(),
            histories: PlayerHistories::with_players(
                players,
                config.history_cap,
                config.rating_rule,
            ),
            h2h: HeadToHeadTable::default(),
            skipped: 0,
        }
    }

    /// Starts the vocabulary from an existing encoder (e.g. one restored for
    /// inference) so previously assigned codes are kept.
    pub fn with_encoder(mut self, encoder: CategoricalEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn encoder(&self) -> &CategoricalEncoder {
        &self.encoder
    }

    pub fn histories(&self) -> &PlayerHistories {
        &self.histories
    }

    pub fn head_to_head(&self) -> &HeadToHeadTable {
        &self.h2h
    }

    /// Records skipped for lacking two distinct player ids.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn process(&mut self, matches: &[MatchRecord]) -> Result<Vec<FeatureRow>> {
        if matches.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let base = std::mem::take(&mut self.encoder);
        self.encoder = build_vocabulary(base, matches, self.config.extend_seeded_categories);
        debug!(
            countries = self.encoder.len(crate::encoder::Category::Country),
            "vocabulary pass complete"
        );

        let per_match = if self.config.symmetric_augmentation { 2 } else { 1 };
        let mut rows = Vec::with_capacity(matches.len() * per_match);

        for m in matches {
            if !m.is_usable() {
                self.skipped += 1;
                warn!(
                    tourney = m.tourney_id.as_deref().unwrap_or("?"),
                    match_num = m.match_num.unwrap_or(-1),
                    "skipping match without two distinct player ids"
                );
                continue;
            }

            rows.push(self.featurize(m, Perspective::WinnerFirst));
            if self.config.symmetric_augmentation {
                rows.push(self.featurize(m, Perspective::LoserFirst));
            }

            self.record(m);
        }

        if rows.is_empty() {
            warn!(skipped = self.skipped, "no usable matches in input");
            return Err(PipelineError::EmptyInput);
        }

        info!(
            matches = matches.len(),
            rows = rows.len(),
            players = self.histories.len(),
            skipped = self.skipped,
            symmetric = self.config.symmetric_augmentation,
            "causal pass complete"
        );
        Ok(rows)
    }

    /// Builds a row from the current state without advancing it.
    pub fn featurize(&self, m: &MatchRecord, perspective: Perspective) -> FeatureRow {
        FeatureRowBuilder::new(
            &self.encoder,
            &self.histories,
            &self.h2h,
            self.config.form_window,
        )
        .build(m, perspective)
    }

    fn record(&mut self, m: &MatchRecord) {
        let winner = m.winner.id.trim();
        let loser = m.loser.id.trim();
        self.histories
            .record_match(winner, loser, m.surface.as_deref());
        self.h2h.record_win(winner, loser);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PlayerEntry;

    #[test]
    fn empty_input_is_an_error() {
        let mut p = ChronologicalProcessor::new(PipelineConfig::default());
        assert!(matches!(p.process(&[]), Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn unusable_records_are_skipped_not_fatal() {
        let mut p = ChronologicalProcessor::new(PipelineConfig::default());
        let good = MatchRecord::new(PlayerEntry::new("1"), PlayerEntry::new("2"));
        let bad = MatchRecord::new(PlayerEntry::new("3"), PlayerEntry::new("3"));
        let rows = p.process(&[good, bad]).expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(p.skipped(), 1);
        assert!(p.histories().get("3").is_none());
    }

    #[test]
    fn all_unusable_records_is_an_input_error() {
        let mut p = ChronologicalProcessor::new(PipelineConfig::default());
        let same = MatchRecord::new(PlayerEntry::new("3"), PlayerEntry::new("3"));
        let blank = MatchRecord::new(PlayerEntry::new(""), PlayerEntry::new("4"));
        assert!(matches!(
            p.process(&[same, blank]),
            Err(PipelineError::EmptyInput)
        ));
        assert_eq!(p.skipped(), 2);
        assert!(p.histories().is_empty());
    }

    #[test]
    fn augmentation_can_be_disabled() {
        let cfg = PipelineConfig {
            symmetric_augmentation: false,
            ..PipelineConfig::default()
        };
        let mut p = ChronologicalProcessor::new(cfg);
        let m = MatchRecord::new(PlayerEntry::new("1"), PlayerEntry::new("2"));
        let rows = p.process(&[m.clone(), m]).expect("rows");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.label == 1));
    }
}
