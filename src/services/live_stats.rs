// Live Stats Service
// Periodically polls Icecast and resolves the configured mount

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::models::{ResolvedStreamStatus, Settings};
use super::icecast_client::{IcecastClient, ServerEndpoint, StatusError};
use super::mount_resolver::resolve;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// What the poller should look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTarget {
    pub endpoint: ServerEndpoint,
    pub mount: String,
}

impl PollTarget {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint: ServerEndpoint::from_settings(settings),
            mount: settings.mount(),
        }
    }
}

/// One poll result, tagged with the target it was resolved for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStats {
    pub target: PollTarget,
    pub status: ResolvedStreamStatus,
}

/// Fetch the JSON status once and resolve it for the target mount
pub async fn poll_once(client: &IcecastClient, target: &PollTarget) -> Result<ResolvedStreamStatus, StatusError> {
    let payload = client.fetch_json_status(&target.endpoint).await?;
    Ok(resolve(
        &payload,
        &target.mount,
        &target.endpoint.host,
        target.endpoint.port,
    ))
}

/// Start the background poller
///
/// The target is read from `target_rx` on every tick. Each successful poll is
/// published on the returned channel; failed polls publish nothing, so the
/// last good value stays visible. A poll runs to completion before the next
/// tick is taken and late ticks are skipped, so polls never overlap.
pub fn spawn_stats_poller(
    client: IcecastClient,
    interval: Duration,
    mut target_rx: watch::Receiver<PollTarget>,
) -> (JoinHandle<()>, watch::Receiver<Option<LiveStats>>) {
    let (stats_tx, stats_rx) = watch::channel(None);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if stats_tx.is_closed() || target_rx.has_changed().is_err() {
                break;
            }
            let target = target_rx.borrow_and_update().clone();

            match poll_once(&client, &target).await {
                Ok(status) => {
                    // Settings changed mid-flight; this result belongs to the old mount
                    if *target_rx.borrow() != target {
                        continue;
                    }
                    stats_tx.send_replace(Some(LiveStats { target, status }));
                }
                Err(e) => {
                    log::debug!(
                        "Live stats poll of {}:{} failed: {e}",
                        target.endpoint.host,
                        target.endpoint.port
                    );
                }
            }
        }
        log::debug!("Live stats poller stopped");
    });

    (handle, stats_rx)
}
