use thiserror::Error;

/// Structural problems with an input dataset. Per-record anomalies never end up here.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing column: {name}")]
    MissingColumn { name: String },
    #[error("row {row}: missing column: {name}")]
    MissingField { row: usize, name: String },
    #[error("unknown input format: {0}")]
    UnknownFormat(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: expected a JSON object")]
    NotAnObject { line: usize },
}
