use h2latam::error::H2Error;
use polars::error::PolarsError;

#[derive(thiserror::Error, Debug)]
pub enum H2CliError {
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("serde JSON error: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("Invalid TOML in config file: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("{0}")]
    H2Error(#[from] H2Error),
    #[error("std IO error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type H2CliResult<T> = Result<T, H2CliError>;
