//! # gameshelf
//!
//! Keeps a locally cached, observable copy of a remote game catalog.
//!
//! ## Architecture
//!
//! ```text
//! Transport → Downloader → CatalogRepository → observers
//! ```
//!
//! - [`fetcher`]: single-request transport plus a redirect-following,
//!   status-validating downloader
//! - [`repository`]: single-flight, notifying in-memory catalog cache
//! - [`refresher`]: periodic refresh loop
//!
//! ## Quick Start
//!
//! ```bash
//! # Download any URL and report the outcome
//! gameshelf fetch https://example.com/gameshelf/manifest.json
//!
//! # Refresh once and list the catalog
//! gameshelf list
//!
//! # Keep the catalog fresh in the foreground
//! gameshelf watch --interval 30m
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the transport,
/// downloader and the one catalog repository.
pub mod app;

/// Command-line interface using clap.
///
/// - `fetch <url>` - Download a URL and report the outcome
/// - `list [--json]` - Refresh once and list entries
/// - `watch [--interval]` - Refresh periodically until Ctrl-C
pub mod cli;

/// Configuration loaded from `~/.config/gameshelf/config.toml`.
pub mod config;

/// Catalog entry model and manifest parsing.
pub mod domain;

/// HTTP retrieval with manual, bounded redirect handling.
///
/// - [`Transport`](fetcher::Transport): one request, no redirects
/// - [`HttpTransport`](fetcher::HttpTransport): reqwest-based implementation
/// - [`Downloader`](fetcher::Downloader): redirect loop and response validation
pub mod fetcher;

/// Background refreshes on a fixed interval.
pub mod refresher;

/// The in-memory catalog cache.
pub mod repository;
