pub mod downloader;
pub mod http_transport;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

pub use downloader::{Downloader, DEFAULT_MAX_REDIRECTS};
pub use http_transport::HttpTransport;

/// What a single round-trip produced, before any validation.
#[derive(Debug)]
pub enum TransportReply {
    /// A response carrying HTTP status metadata
    Http {
        url: Url,
        status: StatusCode,
        headers: HeaderMap,
        body: Vec<u8>,
    },
    /// A response with no HTTP status (e.g. a `file:` URL)
    Other { url: Url, body: Vec<u8> },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// For [`Transport`] implementations that are not built on reqwest
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Performs exactly one request for `url` and never follows redirects.
#[async_trait]
pub trait Transport {
    async fn send(&self, url: &Url) -> std::result::Result<TransportReply, TransportError>;
}

/// Metadata of the terminal, non-redirect response.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

#[derive(Debug)]
pub struct Download {
    pub body: Vec<u8>,
    pub response: ResponseMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    InvalidUrl,
    UnexpectedResponseType,
    RedirectWithoutLocation,
    TooManyRedirects,
    BadStatus,
    Transport,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unexpected non-HTTP response from {url}")]
    UnexpectedResponseType { url: Url },

    #[error("Redirect ({status}) from {url} without a Location header")]
    RedirectWithoutLocation { url: Url, status: StatusCode },

    #[error("Too many redirects (limit {limit})")]
    TooManyRedirects { limit: usize },

    #[error("Bad status {status} from {url}")]
    BadStatus {
        url: Url,
        status: StatusCode,
        body: Vec<u8>,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidUrl { .. } => FetchErrorKind::InvalidUrl,
            FetchError::UnexpectedResponseType { .. } => FetchErrorKind::UnexpectedResponseType,
            FetchError::RedirectWithoutLocation { .. } => FetchErrorKind::RedirectWithoutLocation,
            FetchError::TooManyRedirects { .. } => FetchErrorKind::TooManyRedirects,
            FetchError::BadStatus { .. } => FetchErrorKind::BadStatus,
            FetchError::Transport(_) => FetchErrorKind::Transport,
        }
    }
}

pub type FetchResult = std::result::Result<Download, FetchError>;
