//! Mutable settings shared across requests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

/// The single directory currently exposed for browsing.
///
/// Cloning the handle shares the underlying cell: every request reads the
/// same value and a reconfiguration from the shell is visible to all
/// subsequent reads. Readers never block each other; a writer briefly
/// excludes readers.
#[derive(Debug, Clone)]
pub struct RootDir {
    inner: Arc<RwLock<PathBuf>>,
}

impl RootDir {
    pub fn new(path: PathBuf) -> Self {
        Self {
            inner: Arc::new(RwLock::new(path)),
        }
    }

    /// The current root. The returned clone is a request's atomic read
    /// point: a concurrent `set` affects later reads only.
    pub async fn get(&self) -> PathBuf {
        self.inner.read().await.clone()
    }

    /// Replaces the root directory.
    ///
    /// Returns `false` without writing when `path` equals the current
    /// value. The path is not validated here; a directory that does not
    /// exist surfaces as not-found on the next request.
    pub async fn set(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let mut current = self.inner.write().await;
        if *current == path {
            return false;
        }
        *current = path.to_path_buf();
        true
    }
}
