// Application State
// Everything the console loop owns and hands to command handlers

use tokio::sync::watch;

use crate::models::{ResolvedStreamStatus, Settings};
use crate::services::{
    fallback_url, IcecastClient, LiveStats, PollTarget, SettingsManager, StreamSupervisor,
};

pub struct AppState {
    /// Record being edited; only written to disk on save
    pub settings: Settings,
    /// Live statistics as last shown
    pub display: ResolvedStreamStatus,
    pub supervisor: StreamSupervisor,
    pub client: IcecastClient,
    pub manager: SettingsManager,
    /// URL of the local settings endpoint, empty until it is bound
    pub settings_api_url: String,
    target_tx: watch::Sender<PollTarget>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        supervisor: StreamSupervisor,
        client: IcecastClient,
        manager: SettingsManager,
    ) -> Self {
        let (target_tx, _) = watch::channel(PollTarget::from_settings(&settings));
        let display = idle_display(&settings);

        Self {
            settings,
            display,
            supervisor,
            client,
            manager,
            settings_api_url: String::new(),
            target_tx,
        }
    }

    pub fn poll_target(&self) -> PollTarget {
        PollTarget::from_settings(&self.settings)
    }

    /// Receiver the stats poller reads its target from
    pub fn subscribe_poll_target(&self) -> watch::Receiver<PollTarget> {
        self.target_tx.subscribe()
    }

    /// Point the poller at the current host/port/mount, if they changed
    pub fn publish_poll_target(&self) {
        let target = self.poll_target();
        self.target_tx.send_if_modified(|current| {
            if *current == target {
                false
            } else {
                log::debug!(
                    "Live stats target is now {}:{}{}",
                    target.endpoint.host,
                    target.endpoint.port,
                    target.mount
                );
                *current = target;
                true
            }
        });
    }

    /// Show a poll result, unless it was resolved for another server or mount
    pub fn apply_stats(&mut self, stats: LiveStats) -> bool {
        if stats.target != self.poll_target() {
            return false;
        }
        self.display = stats.status;
        true
    }

    /// Only the URL follows the settings; the counters keep their last values
    pub fn reset_display_url(&mut self) {
        self.display.url = idle_display(&self.settings).url;
    }
}

fn idle_display(settings: &Settings) -> ResolvedStreamStatus {
    ResolvedStreamStatus {
        listeners: 0,
        peak: 0,
        bytes: 0,
        url: fallback_url(&settings.host(), settings.port_number(), &settings.mount()),
    }
}
