//! Presentation shell capability.
//!
//! The platform front end (tray icon, directory picker, browser launcher)
//! lives behind this trait. The server core never links against GUI code;
//! it only drives an attached shell through notifications.

use std::path::PathBuf;

use tracing::info;

pub trait Shell: Send + Sync {
    /// Called whenever the server starts or stops listening.
    fn notify(&self, listening: bool);

    /// Asks the user for a new root directory. `None` means cancelled.
    fn pick_directory(&self) -> Option<PathBuf>;

    /// Opens `url` in whatever the platform considers a browser.
    fn open_url(&self, url: &str);
}

/// Headless shell used when no GUI front end is attached: every
/// capability degrades to a log line.
pub struct LogShell;

impl Shell for LogShell {
    fn notify(&self, listening: bool) {
        if listening {
            info!("file server is running");
        } else {
            info!("file server stopped");
        }
    }

    fn pick_directory(&self) -> Option<PathBuf> {
        None
    }

    fn open_url(&self, url: &str) {
        info!("browse: {url}");
    }
}
