//! Embedded static assets: the directory-index templates plus the
//! stylesheet and icons they reference.
//!
//! Everything is compiled into the binary and addressed by a virtual path
//! relative to the bundle root (e.g. `static/icon-file.svg`).

use tracing::warn;

static ASSETS: &[(&str, &[u8])] = &[
    (
        "index-template.html",
        include_bytes!("../assets/index-template.html"),
    ),
    (
        "file-list-item-template.html",
        include_bytes!("../assets/file-list-item-template.html"),
    ),
    ("static/style.css", include_bytes!("../assets/static/style.css")),
    (
        "static/icon-file.svg",
        include_bytes!("../assets/static/icon-file.svg"),
    ),
    (
        "static/icon-folder-close.svg",
        include_bytes!("../assets/static/icon-folder-close.svg"),
    ),
    (
        "static/icon-arrow-up.svg",
        include_bytes!("../assets/static/icon-arrow-up.svg"),
    ),
];

/// Returns the asset's bytes, or `None` when the virtual path is not part
/// of the bundle.
pub fn open(path: &str) -> Option<&'static [u8]> {
    ASSETS
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(_, bytes)| *bytes)
}

pub fn exists(path: &str) -> bool {
    open(path).is_some()
}

/// Loads an HTML template from the bundle.
///
/// A missing or non-UTF-8 template is logged and substitutes as empty so
/// that a response is still produced.
pub fn template(path: &str) -> &'static str {
    match open(path).map(std::str::from_utf8) {
        Some(Ok(html)) => html,
        Some(Err(_)) | None => {
            warn!("template {path} missing from asset bundle");
            ""
        }
    }
}
