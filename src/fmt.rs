//! Pure formatting helpers shared by the HTTP layer.
//!
//! Nothing here touches the filesystem or the network: byte-size
//! rendering, `${slot}$` template substitution, URL segment handling and
//! timestamp formatting for the directory index.

use std::time::SystemTime;

use chrono::{DateTime, Local};

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Renders a byte count in the largest unit (B/KB/MB/GB) the value
/// reaches, truncated to the integer quotient.
///
/// `1023` renders as `"1023 B"`; `1024` and `1536` both as `"1 KB"`.
pub fn human_size(bytes: u64) -> String {
    if bytes >= GB {
        format!("{} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Replaces every `${key}$` slot in `template` with its value.
///
/// Slots not named in `slots` are left in place; the template decides
/// which slots it carries.
pub fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = template.to_owned();
    for (key, value) in slots {
        out = out.replace(&format!("${{{key}}}$"), value);
    }
    out
}

/// Splits a request path into its non-empty segments.
///
/// `"/a//b/"` yields `["a", "b"]`.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Formats a filesystem timestamp as `yyyy-MM-dd hh:mm:ss` in local time.
pub fn format_mtime(mtime: SystemTime) -> String {
    DateTime::<Local>::from(mtime)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_size_uses_largest_unit_reached() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1024), "1 KB");
        assert_eq!(human_size(1024 * 1024), "1 MB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    /// The quotient is truncated, never rounded: 1536 bytes is still 1 KB.
    #[test]
    fn human_size_truncates() {
        assert_eq!(human_size(1536), "1 KB");
        assert_eq!(human_size(2047), "1 KB");
        assert_eq!(human_size(2048), "2 KB");
    }

    #[test]
    fn fill_replaces_all_named_slots() {
        let html = fill(
            "<a href=\"${href}$\">${name}$ ${name}$</a>",
            &[("href", "/docs/"), ("name", "docs")],
        );
        assert_eq!(html, "<a href=\"/docs/\">docs docs</a>");
    }

    #[test]
    fn fill_leaves_unknown_slots_in_place() {
        assert_eq!(fill("${other}$", &[("name", "x")]), "${other}$");
    }

    #[test]
    fn segments_drops_empty_parts() {
        assert_eq!(segments("/a//b/"), vec!["a", "b"]);
        assert!(segments("/").is_empty());
        assert!(segments("").is_empty());
    }

    #[test]
    fn format_mtime_is_parseable_back() {
        let rendered = format_mtime(SystemTime::now());
        assert!(
            chrono::NaiveDateTime::parse_from_str(&rendered, "%Y-%m-%d %H:%M:%S").is_ok(),
            "unexpected timestamp shape: {rendered}"
        );
    }
}
