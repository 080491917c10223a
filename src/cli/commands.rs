use tokio::sync::broadcast::error::RecvError;

use crate::app::{AppContext, CatalogError, Result};
use crate::domain::to_manifest;
use crate::refresher::{PeriodicRefresher, RefreshSchedule};

pub async fn fetch_url(ctx: &AppContext, url: &str) -> Result<()> {
    let download = ctx.downloader.fetch(url).await?;

    println!("Status: {}", download.response.status);
    println!("Final URL: {}", download.response.url);
    if let Some(content_type) = download
        .response
        .headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        println!("Content-Type: {}", content_type);
    }
    println!("Received {} bytes", download.body.len());

    Ok(())
}

/// Refresh once and wait for the repository to report back.
pub async fn refresh_once(ctx: &AppContext) -> Result<()> {
    let mut updates = ctx.repository.subscribe();

    if !ctx.repository.refresh() {
        tracing::debug!("Joining refresh already in flight");
    }

    match updates.recv().await {
        Ok(_) | Err(RecvError::Lagged(_)) => {}
        Err(RecvError::Closed) => {
            return Err(CatalogError::Other("Catalog repository closed".into()));
        }
    }

    match ctx.repository.last_error() {
        Some(e) => Err(CatalogError::Other(e)),
        None => Ok(()),
    }
}

pub async fn list_entries(ctx: &AppContext, json: bool) -> Result<()> {
    refresh_once(ctx).await?;
    let entries = ctx.repository.entries();

    if json {
        println!("{}", to_manifest(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Catalog is empty");
        return Ok(());
    }

    for entry in entries.iter() {
        let icon = entry
            .icon_url(&ctx.icon_base_url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| "-".to_string());
        println!("{:<24} {}  [{}]", entry.identifier, entry.full_title(), icon);
    }
    println!("{} entries", entries.len());

    Ok(())
}

pub async fn watch(ctx: &AppContext, interval: Option<&str>, no_initial_refresh: bool) -> Result<()> {
    let interval = interval.unwrap_or(ctx.config.catalog.refresh_interval.as_str());
    let interval_secs = RefreshSchedule::parse_interval(interval).map_err(CatalogError::Other)?;

    let mut updates = ctx.repository.subscribe();
    let refresher = PeriodicRefresher::spawn(
        ctx.repository.clone(),
        RefreshSchedule {
            interval_secs,
            refresh_on_start: !no_initial_refresh,
        },
    );

    println!(
        "Watching {} every {} (Ctrl-C to stop)",
        ctx.repository.manifest_url(),
        RefreshSchedule::format_interval(interval_secs)
    );

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(_) | Err(RecvError::Lagged(_)) => {
                        let snapshot = ctx.repository.snapshot();
                        match snapshot.last_error {
                            Some(e) => eprintln!("Refresh failed: {}", e),
                            None => println!("Catalog now has {} entries", snapshot.entries.len()),
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    refresher.stop().await;
    Ok(())
}
