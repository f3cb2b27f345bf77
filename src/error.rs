use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GaslensError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed export {path:?}: {detail}")]
    MalformedExport { path: PathBuf, detail: String },
    #[error("no DATAH header line in {0:?}")]
    MissingHeader(PathBuf),
    #[error("column not found: {0}")]
    MissingColumn(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid band for {channel}: [{low}, {high}]")]
    InvalidBand { channel: String, low: f64, high: f64 },
}

pub type Result<T> = std::result::Result<T, GaslensError>;
