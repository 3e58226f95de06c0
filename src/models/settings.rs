// Settings Model
// Controller configuration persisted to config.json

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MOUNT: &str = "/live";

fn default_admin_user() -> String {
    "admin".to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

fn default_stream_title() -> String {
    "My Awesome Stream".to_string()
}

fn default_stream_description() -> String {
    "A fantastic audio experience".to_string()
}

fn default_stream_genre() -> String {
    "Various".to_string()
}

fn default_mountpoint() -> String {
    DEFAULT_MOUNT.to_string()
}

/// Returned when a value is outside an enumerated field's allowed set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChoice {
    pub field: &'static str,
    pub value: String,
    pub allowed: &'static [&'static str],
}

impl fmt::Display for InvalidChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a valid {} (allowed: {})",
            self.value,
            self.field,
            self.allowed.join(", ")
        )
    }
}

impl std::error::Error for InvalidChoice {}

/// Encoder bitrate in kbps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Bitrate {
    #[serde(rename = "64")]
    Kbps64,
    #[serde(rename = "96")]
    Kbps96,
    #[default]
    #[serde(rename = "128")]
    Kbps128,
    #[serde(rename = "192")]
    Kbps192,
    #[serde(rename = "256")]
    Kbps256,
    #[serde(rename = "320")]
    Kbps320,
}

impl Bitrate {
    pub const ALLOWED: &'static [&'static str] = &["64", "96", "128", "192", "256", "320"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bitrate::Kbps64 => "64",
            Bitrate::Kbps96 => "96",
            Bitrate::Kbps128 => "128",
            Bitrate::Kbps192 => "192",
            Bitrate::Kbps256 => "256",
            Bitrate::Kbps320 => "320",
        }
    }
}

impl FromStr for Bitrate {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "64" => Ok(Bitrate::Kbps64),
            "96" => Ok(Bitrate::Kbps96),
            "128" => Ok(Bitrate::Kbps128),
            "192" => Ok(Bitrate::Kbps192),
            "256" => Ok(Bitrate::Kbps256),
            "320" => Ok(Bitrate::Kbps320),
            other => Err(InvalidChoice {
                field: "bitrate",
                value: other.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// Channel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Channels {
    #[serde(rename = "1")]
    Mono,
    #[default]
    #[serde(rename = "2")]
    Stereo,
}

impl Channels {
    pub const ALLOWED: &'static [&'static str] = &["1", "2"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channels::Mono => "1",
            Channels::Stereo => "2",
        }
    }
}

impl FromStr for Channels {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Channels::Mono),
            "2" => Ok(Channels::Stereo),
            other => Err(InvalidChoice {
                field: "channels",
                value: other.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// Sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SampleRate {
    #[serde(rename = "22050")]
    Hz22050,
    #[default]
    #[serde(rename = "44100")]
    Hz44100,
    #[serde(rename = "48000")]
    Hz48000,
}

impl SampleRate {
    pub const ALLOWED: &'static [&'static str] = &["22050", "44100", "48000"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleRate::Hz22050 => "22050",
            SampleRate::Hz44100 => "44100",
            SampleRate::Hz48000 => "48000",
        }
    }
}

impl FromStr for SampleRate {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "22050" => Ok(SampleRate::Hz22050),
            "44100" => Ok(SampleRate::Hz44100),
            "48000" => Ok(SampleRate::Hz48000),
            other => Err(InvalidChoice {
                field: "samplerate",
                value: other.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// Controller settings
///
/// Field names match the keys of the on-disk JSON file, which is meant to stay
/// editable by hand. `port` is kept as text the way it was entered; use
/// [`Settings::port_number`] to get the effective value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    // Connection & authentication
    pub admin_user: String,
    pub admin_password: String,
    pub source_password: String,
    pub relay_password: String,
    pub host: String,
    pub port: String,

    // Stream information
    pub stream_title: String,
    pub stream_description: String,
    pub stream_genre: String,
    pub bitrate: Bitrate,
    pub channels: Channels,
    pub samplerate: SampleRate,
    pub mountpoint: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            admin_user: default_admin_user(),
            admin_password: String::new(),
            source_password: String::new(),
            relay_password: String::new(),
            host: default_host(),
            port: default_port(),
            stream_title: default_stream_title(),
            stream_description: default_stream_description(),
            stream_genre: default_stream_genre(),
            bitrate: Bitrate::default(),
            channels: Channels::default(),
            samplerate: SampleRate::default(),
            mountpoint: default_mountpoint(),
        }
    }
}

impl Settings {
    /// Build settings from a parsed JSON object, defaulting each field on its own.
    ///
    /// A missing key, a value of the wrong type, or an enum value outside its
    /// allowed set only affects that one field.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let defaults = Settings::default();

        Self {
            admin_user: string_field(map, "admin_user").unwrap_or(defaults.admin_user),
            admin_password: string_field(map, "admin_password").unwrap_or(defaults.admin_password),
            source_password: string_field(map, "source_password").unwrap_or(defaults.source_password),
            relay_password: string_field(map, "relay_password").unwrap_or(defaults.relay_password),
            host: string_field(map, "host").unwrap_or(defaults.host),
            port: string_field(map, "port").unwrap_or(defaults.port),
            stream_title: string_field(map, "stream_title").unwrap_or(defaults.stream_title),
            stream_description: string_field(map, "stream_description")
                .unwrap_or(defaults.stream_description),
            stream_genre: string_field(map, "stream_genre").unwrap_or(defaults.stream_genre),
            bitrate: choice_field(map, "bitrate").unwrap_or(defaults.bitrate),
            channels: choice_field(map, "channels").unwrap_or(defaults.channels),
            samplerate: choice_field(map, "samplerate").unwrap_or(defaults.samplerate),
            mountpoint: string_field(map, "mountpoint").unwrap_or(defaults.mountpoint),
        }
    }

    /// Server host, trimmed; empty falls back to `localhost`
    pub fn host(&self) -> String {
        let host = self.host.trim();
        if host.is_empty() {
            DEFAULT_HOST.to_string()
        } else {
            host.to_string()
        }
    }

    /// Server port parsed from its text form; falls back to 8000
    pub fn port_number(&self) -> u16 {
        self.port.trim().parse::<u16>().unwrap_or(DEFAULT_PORT)
    }

    /// Mountpoint normalized to start with `/`; empty falls back to `/live`
    pub fn mount(&self) -> String {
        normalize_mount(&self.mountpoint)
    }
}

/// Trim a mountpoint and make sure it starts with `/`
pub fn normalize_mount(raw: &str) -> String {
    let mount = raw.trim();
    if mount.is_empty() {
        return DEFAULT_MOUNT.to_string();
    }
    if mount.starts_with('/') {
        mount.to_string()
    } else {
        format!("/{mount}")
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn choice_field<T: FromStr>(map: &Map<String, Value>, key: &str) -> Option<T> {
    match map.get(key)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}
