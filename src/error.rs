//! Ошибки конвейера и моделей

use thiserror::Error;

use crate::types::Partition;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Duplicate passenger id: {0}")]
    DuplicateId(String),

    #[error("Labeled record {id} has no label")]
    MissingLabel { id: String },

    #[error("Malformed cabin '{cabin}' on record {id}: expected deck/num/side")]
    MalformedCabin { id: String, cabin: String },

    #[error("Field '{field}' unresolved on {count} record(s), filled with {fallback}")]
    UnresolvedCategory {
        field: &'static str,
        count: usize,
        fallback: String,
    },

    #[error("Record {id} is still missing '{field}' after imputation")]
    IncompleteRecord { id: String, field: &'static str },

    #[error("Split mismatch for {partition} partition: expected {expected} rows, got {actual}")]
    SplitMismatch {
        partition: Partition,
        expected: usize,
        actual: usize,
    },

    #[error("Offset {offset} of {partition} partition is out of range or repeated ({rows} rows)")]
    OffsetConflict {
        partition: Partition,
        offset: usize,
        rows: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Empty training set")]
    EmptyTrainingSet,

    #[error("Shape mismatch: {rows} feature rows but {labels} labels")]
    ShapeMismatch { rows: usize, labels: usize },

    #[error("Expected {expected} feature columns, got {actual}")]
    ColumnMismatch { expected: usize, actual: usize },

    #[error("Model not trained")]
    NotTrained,

    #[error("Fit failed: {0}")]
    Fit(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
