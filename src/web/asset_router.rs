//! Serves the embedded asset bundle under `/static/`.

use async_trait::async_trait;
use axum::response::Response;

use crate::assets;
use crate::web::route::Route;
use crate::web::serve_file;

pub struct StaticAssetRouter;

#[async_trait]
impl Route for StaticAssetRouter {
    fn path_pattern(&self) -> &'static str {
        "/static/"
    }

    async fn handle(&self, rel_path: &str) -> Response {
        let virtual_path = format!("static/{rel_path}");
        match assets::open(&virtual_path) {
            Some(bytes) => serve_file::respond_asset(&virtual_path, bytes),
            None => serve_file::not_found(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn serves_bundle_entries_and_404s_the_rest() {
        let router = StaticAssetRouter;
        assert_eq!(router.path_pattern(), "/static/");

        let response = router.handle("icon-folder-close.svg").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = router.handle("missing.svg").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
