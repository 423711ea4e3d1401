pub mod cli;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod export;
pub mod features;
pub mod fetch;
pub mod history;
pub mod http_client;
pub mod ingest;
pub mod persist;
pub mod processor;
pub mod record;
pub mod schema;
pub mod score;
pub mod store;

pub use config::PipelineConfig;
pub use dataset::{DatasetAssembler, Imputation, TrainingMatrix};
pub use encoder::{CategoricalEncoder, Category};
pub use error::PipelineError;
pub use history::{HeadToHeadTable, PlayerHistories, PlayerHistory, RatingRule};
pub use processor::ChronologicalProcessor;
pub use record::{MatchRecord, Perspective, PlayerEntry, ServeStats, sort_chronologically};
pub use schema::{FEATURE_COUNT, FEATURE_NAMES, FeatureRow};
pub use score::{ScoreSummary, parse_score};
