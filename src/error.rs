use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BiomasseError {
    #[error("Raw DMP data not available at {path}, run `download_dmp` first")]
    RawDmpMissing { path: PathBuf },

    #[error("Raw reanalysis data not available at {path}")]
    RawReanalysisMissing { path: PathBuf },

    #[error("Start dekad must be between 1 and 36, got {0}")]
    InvalidStartDekad(u8),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("GRIB error: {0}")]
    Grib(#[from] eccodes::errors::CodesError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, BiomasseError>;
