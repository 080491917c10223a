use std::sync::Arc;

use url::Url;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::{Downloader, HttpTransport, Transport};
use crate::repository::CatalogRepository;

/// Composition root.
///
/// Build exactly one `AppContext` per process; its [`CatalogRepository`] is
/// the process-wide catalog cache and is shared by cloning.
pub struct AppContext {
    pub config: Config,
    pub downloader: Downloader,
    pub repository: CatalogRepository,
    pub icon_base_url: Url,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::with_options(
            config.downloader.timeout(),
            &config.downloader.user_agent,
        )?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: Config,
        transport: Arc<dyn Transport + Send + Sync>,
    ) -> Result<Self> {
        let icon_base_url = Url::parse(&config.catalog.icon_base_url)?;
        let downloader =
            Downloader::with_max_redirects(transport, config.downloader.max_redirects);
        let repository =
            CatalogRepository::new(downloader.clone(), config.catalog.manifest_url.clone());

        Ok(Self {
            config,
            downloader,
            repository,
            icon_base_url,
        })
    }
}
