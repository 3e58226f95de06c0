// Server Commands
// Manual actions against the Icecast server

use crate::commands::Notice;
use crate::services::{poll_once, MetadataUpdate, ServerEndpoint, StatusError};
use crate::state::AppState;

fn endpoint(state: &AppState) -> ServerEndpoint {
    ServerEndpoint::from_settings(&state.settings)
}

pub async fn test_connection(state: &AppState) -> Notice {
    const TITLE: &str = "Test Connection";

    match state.client.test_connection(&endpoint(state)).await {
        Ok(probe) => {
            log::info!("Icecast reachable ({probe:?})");
            Notice::info(TITLE, "Successfully connected to Icecast server!")
        }
        Err(StatusError::Http { status }) => Notice::warning(
            TITLE,
            format!("Could not connect to Icecast server. Status code: {}", status.as_u16()),
        ),
        Err(e) if e.is_transport() => {
            Notice::critical(TITLE, "Failed to connect to Icecast server. Is it running?")
        }
        Err(e) => Notice::critical(TITLE, format!("An error occurred: {e}")),
    }
}

pub async fn check_mount(state: &AppState) -> Notice {
    const TITLE: &str = "Check Mount";
    let mount = state.settings.mount();

    match state.client.check_mount_active(&endpoint(state), &mount).await {
        Ok(true) => Notice::info(TITLE, format!("Mount {mount} is active.")),
        Ok(false) => Notice::warning(TITLE, format!("Mount {mount} not found or inactive.")),
        Err(StatusError::Http { status }) => Notice::warning(
            TITLE,
            format!("Failed to fetch status. Code: {}", status.as_u16()),
        ),
        Err(e) => Notice::critical("Check Mount Error", format!("Error checking mount: {e}")),
    }
}

pub async fn update_metadata(state: &AppState) -> Notice {
    const TITLE: &str = "Update Metadata";
    let update = MetadataUpdate::from_settings(&state.settings);

    match state.client.update_metadata(&endpoint(state), &update).await {
        Ok(outcome) if outcome.succeeded() => Notice::info(TITLE, "Metadata updated."),
        Ok(outcome) => Notice::warning(
            TITLE,
            format!(
                "Failed. Codes: {}, {}",
                outcome.song.status.as_u16(),
                outcome.info.status.as_u16()
            ),
        ),
        Err(e) => Notice::critical("Update Metadata Error", format!("Error updating metadata: {e}")),
    }
}

pub async fn test_admin(state: &AppState) -> Notice {
    const TITLE: &str = "Test Admin";

    match state.client.probe_admin(&endpoint(state)).await {
        Ok(status) if status.is_success() => Notice::info(TITLE, "Admin is reachable."),
        Ok(status) => Notice::warning(
            TITLE,
            format!("Admin responded with status {}.", status.as_u16()),
        ),
        Err(e) if e.is_transport() => {
            Notice::critical(TITLE, "Failed to connect to Admin. Is Icecast running?")
        }
        Err(e) => Notice::critical(TITLE, format!("Error testing Admin: {e}")),
    }
}

/// Probe the admin page, then open it in the browser whatever the probe said
pub async fn open_admin(state: &AppState) -> Vec<Notice> {
    const TITLE: &str = "Open Admin";
    let endpoint = endpoint(state);
    let url = endpoint.url("/admin");
    let mut notices = Vec::new();

    match state.client.probe_admin(&endpoint).await {
        Ok(status) if !status.is_success() => notices.push(Notice::warning(
            TITLE,
            format!(
                "Admin unreachable (code {}). Opening browser anyway.",
                status.as_u16()
            ),
        )),
        Ok(_) => {}
        Err(e) => log::debug!("Admin probe before opening browser failed: {e}"),
    }

    if let Some(notice) = open_in_browser(TITLE, &url) {
        notices.push(notice);
    }
    notices
}

/// Fetch and show live statistics now
///
/// Failures leave the displayed values as they were.
pub async fn refresh_live_stats(state: &mut AppState) -> bool {
    let target = state.poll_target();
    match poll_once(&state.client, &target).await {
        Ok(status) => {
            state.display = status;
            true
        }
        Err(e) => {
            log::debug!("On-demand live stats refresh failed: {e}");
            false
        }
    }
}

pub fn describe_live_stats(state: &AppState) -> String {
    format!(
        "Current: {}\nPeak: {}\nTotal Bytes Sent: {}\nStream URL: {}",
        state.display.listeners, state.display.peak, state.display.bytes, state.display.url
    )
}

/// Open `url` in the default browser; reports the URL when that fails
pub fn open_in_browser(title: &str, url: &str) -> Option<Notice> {
    match opener::open_browser(url) {
        Ok(()) => {
            log::info!("Opened {url} in browser");
            None
        }
        Err(e) => {
            log::warn!("Failed to open browser for {url}: {e}");
            Some(Notice::info(title, format!("Failed to open browser. Open {url} manually.")))
        }
    }
}
