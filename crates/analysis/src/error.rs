use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (thresholds out of order, bad fraction, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Caller-supplied parameter the engine refuses to run with.
    #[error("invalid parameter: {0}")]
    Parameter(String),
    /// Missing required column in a CSV snapshot.
    #[error("{table}: missing column '{column}'")]
    MissingColumn { table: String, column: String },
    /// CSV reader error (bad quoting, ragged header, etc.).
    #[error("CSV error: {0}")]
    Csv(String),
    /// The record source could not produce a snapshot.
    #[error("record source error: {0}")]
    Source(String),
}

impl From<csv::Error> for AnalysisError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}
