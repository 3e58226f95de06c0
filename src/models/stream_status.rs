// StreamStatus Model
// Icecast status-json.xsl payload and the resolved per-mount statistics

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Top-level body of `GET /status-json.xsl`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub icestats: Option<IceStats>,
}

impl StatusPayload {
    /// The `source` field, or `Empty` when `icestats` is missing
    pub fn sources(&self) -> &SourceField {
        static EMPTY: SourceField = SourceField::Empty;
        self.icestats
            .as_ref()
            .map(|stats| &stats.source)
            .unwrap_or(&EMPTY)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IceStats {
    #[serde(default)]
    pub source: SourceField,
}

/// Icecast reports a bare object instead of a one-element list when exactly one
/// source is connected, and omits the field when none are.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SourceField {
    #[default]
    Empty,
    Single(SourceEntry),
    Many(Vec<SourceEntry>),
}

impl SourceField {
    /// All entries in the order the server reported them
    pub fn entries(&self) -> &[SourceEntry] {
        match self {
            SourceField::Empty => &[],
            SourceField::Single(entry) => std::slice::from_ref(entry),
            SourceField::Many(entries) => entries,
        }
    }
}

impl<'de> Deserialize<'de> for SourceField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Object(map) => SourceField::Single(SourceEntry::from_map(&map)),
            Value::Array(items) => SourceField::Many(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(map) => SourceEntry::from_map(map),
                        _ => SourceEntry::default(),
                    })
                    .collect(),
            ),
            _ => SourceField::Empty,
        })
    }
}

/// One mount as reported by the server
///
/// Numeric fields are read leniently: Icecast builds emit both numbers and
/// numeric strings, and anything else counts as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceEntry {
    pub listenurl: Option<String>,
    pub listeners: u64,
    pub listener_peak: u64,
    /// `Some` whenever the key is present, even if its value is unusable
    pub total_bytes: Option<u64>,
    pub total_kbytes: Option<f64>,
}

impl SourceEntry {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            listenurl: map
                .get("listenurl")
                .and_then(Value::as_str)
                .map(str::to_string),
            listeners: map.get("listeners").map(lenient_u64).unwrap_or(0),
            listener_peak: map.get("listener_peak").map(lenient_u64).unwrap_or(0),
            total_bytes: map.get("total_bytes").map(lenient_u64),
            total_kbytes: map.get("total_kbytes").map(lenient_f64),
        }
    }

    /// Whether this entry is served under `mount`
    pub fn serves_mount(&self, mount: &str) -> bool {
        !mount.is_empty()
            && self
                .listenurl
                .as_deref()
                .map(|url| url.ends_with(mount))
                .unwrap_or(false)
    }
}

fn lenient_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn lenient_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Statistics for the configured mount, ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStreamStatus {
    /// Current listeners
    pub listeners: u64,
    /// Listener peak since the mount was last reset
    pub peak: u64,
    /// Total bytes sent
    pub bytes: u64,
    /// Public playback URL
    pub url: String,
}
