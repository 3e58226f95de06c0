// Settings Commands
// Edit, persist and publish the settings record

use crate::commands::server::open_in_browser;
use crate::commands::Notice;
use crate::models::{Bitrate, Channels, SampleRate, Settings, DEFAULT_HOST, DEFAULT_MOUNT, DEFAULT_PORT};
use crate::services::{check_settings_api, SettingsError};
use crate::state::AppState;

/// Keys accepted by `set`, matching the settings file
pub const FIELD_NAMES: &[&str] = &[
    "admin_user",
    "admin_password",
    "source_password",
    "relay_password",
    "host",
    "port",
    "stream_title",
    "stream_description",
    "stream_genre",
    "bitrate",
    "channels",
    "samplerate",
    "mountpoint",
];

pub fn save_settings(state: &AppState) -> Notice {
    match state.manager.save(&state.settings) {
        Ok(()) => Notice::info("Save Settings", "Settings saved successfully!"),
        Err(e) => Notice::critical("Save Settings Error", format!("Failed to save settings: {e}")),
    }
}

/// Replace the record with the file contents
///
/// A missing file keeps the current record.
pub fn load_settings(state: &mut AppState) -> Notice {
    match state.manager.load() {
        Ok(settings) => {
            state.settings = settings;
            state.reset_display_url();
            state.publish_poll_target();
            log::info!("Settings loaded from {}", state.manager.path().display());
            Notice::info("Load Settings", "Settings loaded successfully!")
        }
        Err(SettingsError::NotFound(path)) => {
            log::warn!("No settings file at {}", path.display());
            Notice::warning("Load Settings", "No config file found. Using default settings.")
        }
        Err(e) => Notice::critical("Load Settings Error", format!("Failed to load settings: {e}")),
    }
}

/// Change one field in memory
pub fn set_field(state: &mut AppState, key: &str, value: &str) -> Notice {
    const TITLE: &str = "Settings";

    if let Err(message) = apply_field(&mut state.settings, key, value) {
        return Notice::warning(TITLE, message);
    }
    if matches!(key, "host" | "port" | "mountpoint") {
        state.publish_poll_target();
    }
    Notice::info(TITLE, format!("{key} updated."))
}

fn apply_field(settings: &mut Settings, key: &str, value: &str) -> Result<(), String> {
    match key {
        "admin_user" => settings.admin_user = value.to_string(),
        "admin_password" => settings.admin_password = value.to_string(),
        "source_password" => settings.source_password = value.to_string(),
        "relay_password" => settings.relay_password = value.to_string(),
        "host" => settings.host = trimmed_or(value, DEFAULT_HOST),
        "port" => settings.port = trimmed_or(value, &DEFAULT_PORT.to_string()),
        "stream_title" => settings.stream_title = value.to_string(),
        "stream_description" => settings.stream_description = value.to_string(),
        "stream_genre" => settings.stream_genre = value.to_string(),
        "bitrate" => settings.bitrate = value.parse::<Bitrate>().map_err(|e| e.to_string())?,
        "channels" => settings.channels = value.parse::<Channels>().map_err(|e| e.to_string())?,
        "samplerate" => {
            settings.samplerate = value.parse::<SampleRate>().map_err(|e| e.to_string())?
        }
        "mountpoint" => settings.mountpoint = trimmed_or(value, DEFAULT_MOUNT),
        other => {
            return Err(format!(
                "Unknown setting '{other}' (known: {})",
                FIELD_NAMES.join(", ")
            ))
        }
    }
    Ok(())
}

/// Connection fields are never left blank
fn trimmed_or(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Current record, one field per line, passwords masked
pub fn describe(settings: &Settings) -> String {
    let mask = |secret: &str| {
        if secret.is_empty() {
            String::new()
        } else {
            "********".to_string()
        }
    };

    [
        ("admin_user", settings.admin_user.clone()),
        ("admin_password", mask(&settings.admin_password)),
        ("source_password", mask(&settings.source_password)),
        ("relay_password", mask(&settings.relay_password)),
        ("host", settings.host.clone()),
        ("port", settings.port.clone()),
        ("stream_title", settings.stream_title.clone()),
        ("stream_description", settings.stream_description.clone()),
        ("stream_genre", settings.stream_genre.clone()),
        ("bitrate", settings.bitrate.as_str().to_string()),
        ("channels", settings.channels.as_str().to_string()),
        ("samplerate", settings.samplerate.as_str().to_string()),
        ("mountpoint", settings.mountpoint.clone()),
    ]
    .iter()
    .map(|(key, value)| format!("{key:<20}{value}"))
    .collect::<Vec<_>>()
    .join("\n")
}

pub async fn test_settings_api(state: &AppState) -> Notice {
    const TITLE: &str = "Settings API";
    let url = state.settings_api_url.trim();

    if !url.is_empty() && check_settings_api(url).await {
        Notice::info(TITLE, "Status: Online. Settings API is reachable.")
    } else {
        Notice::warning(TITLE, "Status: Offline. Settings API is not reachable.")
    }
}

pub fn open_stream_url(state: &AppState) -> Option<Notice> {
    let url = state.display.url.trim();
    if url.is_empty() {
        return None;
    }
    open_in_browser("Open URL", url)
}

pub fn open_settings_url(state: &AppState) -> Option<Notice> {
    let url = state.settings_api_url.trim();
    if url.is_empty() {
        return None;
    }
    open_in_browser("Open Settings URL", url)
}
