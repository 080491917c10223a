use thiserror::Error;

use crate::config::ConfigError;
use crate::fetcher::{FetchError, TransportError};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Transport setup error: {0}")]
    Transport(#[from] TransportError),

    #[error("Manifest parsing error: {0}")]
    ManifestParse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
