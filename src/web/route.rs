//! Route registration and dispatch.
//!
//! Handlers are registered against path patterns and looked up per
//! request; the registry is shared between the server and the live
//! dispatch, so a route added while listening is active immediately.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::Uri;
use axum::response::Response;
use percent_encoding::percent_decode_str;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::web::serve_file;

/// A handler bound to a path pattern.
///
/// Patterns ending in `/` are prefix patterns and receive the request
/// path with the matched prefix stripped; any other pattern matches
/// exactly. Handlers carry no per-request state and are invoked
/// concurrently for independent connections.
#[async_trait]
pub trait Route: Send + Sync {
    fn path_pattern(&self) -> &'static str;

    /// Produces the response for `rel_path`, the percent-decoded request
    /// path relative to this route's pattern.
    async fn handle(&self, rel_path: &str) -> Response;
}

/// The dispatch table: path pattern to route, unique keys,
/// re-registering a pattern overwrites the previous route.
#[derive(Default)]
pub struct RouterRegistry {
    routes: BTreeMap<&'static str, Arc<dyn Route>>,
}

impl RouterRegistry {
    /// Inserts `route`, replacing any route already bound to the same
    /// pattern.
    pub fn insert(&mut self, route: Arc<dyn Route>) {
        self.routes.insert(route.path_pattern(), route);
    }

    /// Selects the route for `path`: the longest pattern that matches.
    /// Returns the route together with the path relative to the matched
    /// pattern.
    pub fn find<'p>(&self, path: &'p str) -> Option<(Arc<dyn Route>, &'p str)> {
        self.routes
            .iter()
            .filter(|(pattern, _)| pattern_matches(pattern, path))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(pattern, route)| (Arc::clone(route), &path[pattern.len()..]))
    }

    /// Patterns registered so far. Registration survives `close()`; the
    /// next `listen()` re-registers over the same keys.
    pub fn patterns(&self) -> Vec<&'static str> {
        self.routes.keys().copied().collect()
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern.ends_with('/') {
        path.starts_with(pattern)
    } else {
        path == pattern
    }
}

/// The registry as both the server's bookkeeping and the transport's
/// dispatch table reference it.
pub type SharedRegistry = Arc<RwLock<RouterRegistry>>;

/// Builds the axum app that funnels every request through `registry`.
pub fn dispatch_app(registry: SharedRegistry) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(CorsLayer::permissive())
        .with_state(registry)
}

async fn dispatch(State(registry): State<SharedRegistry>, uri: Uri) -> Response {
    let Ok(path) = percent_decode_str(uri.path()).decode_utf8() else {
        return serve_file::not_found();
    };
    debug!("request path: {path}");

    let matched = registry.read().await.find(&path);
    match matched {
        Some((route, rel_path)) => route.handle(rel_path).await,
        None => serve_file::not_found(),
    }
}
