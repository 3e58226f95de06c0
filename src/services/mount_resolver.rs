// Mount Resolver
// Picks the configured mount out of an Icecast status payload

use crate::models::{ResolvedStreamStatus, SourceEntry, SourceField, StatusPayload};

/// URL shown when the server does not report the mount
pub fn fallback_url(host: &str, port: u16, mount: &str) -> String {
    format!("http://{host}:{port}{mount}")
}

/// Byte count of a source entry
///
/// `total_bytes` wins whenever it is present. Otherwise `total_kbytes` is
/// scaled by 1024 and truncated.
pub fn extract_bytes(entry: &SourceEntry) -> u64 {
    if let Some(bytes) = entry.total_bytes {
        return bytes;
    }
    match entry.total_kbytes {
        Some(kbytes) if kbytes.is_finite() && kbytes > 0.0 => (kbytes * 1024.0) as u64,
        _ => 0,
    }
}

/// The entry whose statistics should be displayed for `mount`
///
/// A single reported source is used as-is. In a list, the first entry whose
/// `listenurl` ends with `mount` wins.
pub fn select_source<'a>(sources: &'a SourceField, mount: &str) -> Option<&'a SourceEntry> {
    match sources {
        SourceField::Empty => None,
        SourceField::Single(entry) => Some(entry),
        SourceField::Many(entries) => entries.iter().find(|entry| entry.serves_mount(mount)),
    }
}

/// Resolve the displayed statistics for `mount`
///
/// Never fails: every missing or malformed field degrades to zero, and an
/// unmatched mount yields zeros with the locally built URL.
pub fn resolve(payload: &StatusPayload, mount: &str, host: &str, port: u16) -> ResolvedStreamStatus {
    let fallback = fallback_url(host, port, mount);

    match select_source(payload.sources(), mount) {
        Some(entry) => ResolvedStreamStatus {
            listeners: entry.listeners,
            peak: entry.listener_peak,
            bytes: extract_bytes(entry),
            url: entry
                .listenurl
                .as_deref()
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .unwrap_or(fallback),
        },
        None => ResolvedStreamStatus {
            listeners: 0,
            peak: 0,
            bytes: 0,
            url: fallback,
        },
    }
}

/// Whether any reported source serves `mount`
///
/// Unlike [`select_source`], a single reported source must match too.
pub fn is_mount_active(payload: &StatusPayload, mount: &str) -> bool {
    payload
        .sources()
        .entries()
        .iter()
        .any(|entry| entry.serves_mount(mount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn payload(source: Value) -> StatusPayload {
        serde_json::from_value(json!({ "icestats": { "source": source } })).unwrap()
    }

    fn entry(value: Value) -> SourceEntry {
        SourceEntry::from_map(value.as_object().unwrap())
    }

    #[test]
    fn test_matching_entry_in_list_any_order() {
        let live = json!({
            "listenurl": "http://radio:8000/live",
            "listeners": 7,
            "listener_peak": 12,
            "total_bytes": 5000
        });
        let other = json!({
            "listenurl": "http://radio:8000/other",
            "listeners": 99,
            "listener_peak": 100,
            "total_bytes": 1
        });

        for sources in [json!([live, other]), json!([other, live])] {
            let status = resolve(&payload(sources), "/live", "localhost", 8000);
            assert_eq!(
                status,
                ResolvedStreamStatus {
                    listeners: 7,
                    peak: 12,
                    bytes: 5000,
                    url: "http://radio:8000/live".to_string(),
                }
            );
        }
    }

    #[test]
    fn test_no_match_in_list_yields_defaults() {
        let sources = json!([
            { "listenurl": "http://radio:8000/a", "listeners": 4 },
            { "listenurl": "http://radio:8000/b", "listeners": 5 }
        ]);
        let status = resolve(&payload(sources), "/live", "example.org", 8100);
        assert_eq!(
            status,
            ResolvedStreamStatus {
                listeners: 0,
                peak: 0,
                bytes: 0,
                url: "http://example.org:8100/live".to_string(),
            }
        );
    }

    #[test]
    fn test_single_source_selected_without_mount_check() {
        let source = json!({
            "listenurl": "http://radio:8000/somewhere-else",
            "listeners": 2,
            "listener_peak": 3,
            "total_kbytes": 1
        });
        let status = resolve(&payload(source), "/live", "localhost", 8000);
        assert_eq!(status.listeners, 2);
        assert_eq!(status.peak, 3);
        assert_eq!(status.bytes, 1024);
        assert_eq!(status.url, "http://radio:8000/somewhere-else");
    }

    #[test]
    fn test_first_match_wins() {
        let sources = json!([
            { "listenurl": "http://a:8000/live", "listeners": 1 },
            { "listenurl": "http://b:8000/live", "listeners": 2 }
        ]);
        let status = resolve(&payload(sources), "/live", "localhost", 8000);
        assert_eq!(status.listeners, 1);
        assert_eq!(status.url, "http://a:8000/live");
    }

    #[test]
    fn test_missing_source_yields_defaults() {
        let empty: StatusPayload = serde_json::from_value(json!({ "icestats": {} })).unwrap();
        let status = resolve(&empty, "/live", "localhost", 8000);
        assert_eq!(status.listeners, 0);
        assert_eq!(status.url, "http://localhost:8000/live");
    }

    #[test]
    fn test_single_source_without_url_uses_fallback() {
        let status = resolve(&payload(json!({ "listeners": 9, "listenurl": "" })), "/live", "h", 1);
        assert_eq!(status.listeners, 9);
        assert_eq!(status.url, "http://h:1/live");
    }

    #[test]
    fn test_extract_bytes() {
        assert_eq!(extract_bytes(&entry(json!({ "total_kbytes": 10 }))), 10240);
        assert_eq!(extract_bytes(&entry(json!({ "total_bytes": 5000 }))), 5000);
        assert_eq!(extract_bytes(&entry(json!({}))), 0);
        assert_eq!(
            extract_bytes(&entry(json!({ "total_bytes": 5000, "total_kbytes": 10 }))),
            5000
        );
        assert_eq!(extract_bytes(&entry(json!({ "total_kbytes": 1.5 }))), 1536);
        assert_eq!(extract_bytes(&entry(json!({ "total_kbytes": 0.0009 }))), 0);
    }

    #[test]
    fn test_mount_active_checks_single_source_too() {
        let single = payload(json!({ "listenurl": "http://radio:8000/other" }));
        assert!(!is_mount_active(&single, "/live"));

        let many = payload(json!([
            { "listenurl": "http://radio:8000/other" },
            { "listenurl": "http://radio:8000/live" }
        ]));
        assert!(is_mount_active(&many, "/live"));
        assert!(!is_mount_active(&StatusPayload::default(), "/live"));
    }
}
