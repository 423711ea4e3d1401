use thiserror::Error;

/// Fatal conditions of the feature pipeline. Everything recoverable degrades to
/// a missing value instead of surfacing here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no usable matches provided")]
    EmptyInput,

    #[error("no feature rows produced")]
    NoRows,

    #[error("feature row has {found} columns, schema expects {expected}")]
    RowWidth { expected: usize, found: usize },

    #[error("encoder snapshot schema mismatch: snapshot {snapshot}, build {current}")]
    SchemaMismatch { snapshot: String, current: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
