//! The catch-all route: everything under `/` resolves against the root
//! directory, with the embedded asset bundle as a secondary namespace.

use async_trait::async_trait;
use axum::response::Response;
use tracing::debug;

use crate::assets;
use crate::fmt;
use crate::web::route::Route;
use crate::web::serve_file::{self, Resolved};
use crate::web::state::RootDir;

pub struct FileRouter {
    root: RootDir,
}

impl FileRouter {
    pub fn new(root: RootDir) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Route for FileRouter {
    fn path_pattern(&self) -> &'static str {
        "/"
    }

    /// Resolution order: file under the root, directory under the root
    /// (direct children only), then the embedded `static/` namespace,
    /// then the 404 body. An existing but unlistable directory
    /// short-circuits to 403.
    async fn handle(&self, rel_path: &str) -> Response {
        let root = self.root.get().await;
        match serve_file::resolve(&root, rel_path).await {
            Resolved::File { path } => {
                debug!("file: {}", path.display());
                serve_file::respond_file(&path).await
            }
            Resolved::Directory { path, entries } => {
                debug!("directory index: {}", path.display());
                serve_file::respond_dir(rel_path, &entries)
            }
            Resolved::Forbidden => serve_file::forbidden(),
            Resolved::NotFound => {
                let fallback = format!("static/{}", fmt::segments(rel_path).join("/"));
                match assets::open(&fallback) {
                    Some(bytes) => {
                        debug!("asset fallback: {fallback}");
                        serve_file::respond_asset(&fallback, bytes)
                    }
                    None => serve_file::not_found(),
                }
            }
        }
    }
}
