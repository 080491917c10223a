//! Periodic catalog refreshes.
//!
//! Re-triggers [`CatalogRepository::refresh`] on a fixed interval. Ticks that
//! land while a refresh is still running are dropped by the repository.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::repository::CatalogRepository;

/// Refresher configuration
#[derive(Debug, Clone)]
pub struct RefreshSchedule {
    /// Seconds between refreshes (default: 3600 = 1 hour)
    pub interval_secs: u64,
    /// Whether to refresh immediately on start
    pub refresh_on_start: bool,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            refresh_on_start: true,
        }
    }
}

/// Longest accepted interval, one leap year.
pub const MAX_INTERVAL_SECS: u64 = 366 * 86400;

/// Suffixes understood by [`RefreshSchedule::parse_interval`], largest first.
const UNITS: [(char, u64); 4] = [('d', 86400), ('h', 3600), ('m', 60), ('s', 1)];

impl RefreshSchedule {
    /// Parse an interval such as "30s", "15m", "1h", "1d" or plain seconds.
    pub fn parse_interval(s: &str) -> Result<u64, String> {
        let s = s.trim().to_lowercase();

        let (count, unit_secs) = UNITS
            .iter()
            .find_map(|&(suffix, secs)| s.strip_suffix(suffix).map(|count| (count, secs)))
            .unwrap_or((s.as_str(), 1));

        let count: u64 = count
            .parse()
            .map_err(|_| format!("Invalid interval: {}. Use format like '1h', '30m', '1d'", s))?;

        let secs = count
            .checked_mul(unit_secs)
            .filter(|secs| *secs <= MAX_INTERVAL_SECS)
            .ok_or_else(|| "Interval too large".to_string())?;

        if secs == 0 {
            return Err("Interval must be greater than zero".to_string());
        }
        Ok(secs)
    }

    /// Render seconds with the largest unit that divides them evenly.
    pub fn format_interval(secs: u64) -> String {
        UNITS
            .iter()
            .find(|&&(_, unit)| secs >= unit && secs % unit == 0)
            .map(|&(suffix, unit)| format!("{}{}", secs / unit, suffix))
            .unwrap_or_else(|| format!("{}s", secs))
    }
}

/// Handle to a running periodic refresher. Dropping it stops the loop.
pub struct PeriodicRefresher {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PeriodicRefresher {
    pub fn spawn(repository: CatalogRepository, schedule: RefreshSchedule) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(
                "Periodic refresh started (interval: {})",
                RefreshSchedule::format_interval(schedule.interval_secs)
            );

            // tokio rejects a zero period
            let mut timer = interval(Duration::from_secs(schedule.interval_secs.max(1)));
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            if !schedule.refresh_on_start {
                // The first tick completes immediately
                timer.tick().await;
            }

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        if !repository.refresh() {
                            debug!("Scheduled refresh skipped, previous one still running");
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Periodic refresh stopped");
        });

        Self { stop_tx, task }
    }

    /// Stop the loop and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}
