//! Server lifecycle: bind, register routes, dispatch, shut down.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::shell::Shell;
use crate::web::asset_router::StaticAssetRouter;
use crate::web::file_router::FileRouter;
use crate::web::route::{Route, RouterRegistry, SharedRegistry, dispatch_app};
use crate::web::state::RootDir;

type RootDirObserver = Box<dyn Fn(&Path) + Send + Sync>;

struct Bound {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

/// Owns the listener lifecycle and the route registry.
///
/// States are `Idle -> Listening -> Idle`; `close` is idempotent from
/// either one.
pub struct FileServer {
    root: RootDir,
    registry: SharedRegistry,
    shell: Option<Arc<dyn Shell>>,
    root_changed: Option<RootDirObserver>,
    bound: Option<Bound>,
}

impl FileServer {
    pub fn new(root: RootDir) -> Self {
        Self {
            root,
            registry: Arc::new(RwLock::new(RouterRegistry::default())),
            shell: None,
            root_changed: None,
            bound: None,
        }
    }

    /// Attaches the presentation shell driven on listen/close
    /// transitions.
    pub fn with_shell(mut self, shell: Arc<dyn Shell>) -> Self {
        self.shell = Some(shell);
        self
    }

    /// Registers the callback fired when the root directory actually
    /// changes.
    pub fn on_root_dir_changed(&mut self, observer: impl Fn(&Path) + Send + Sync + 'static) {
        self.root_changed = Some(Box::new(observer));
    }

    pub fn root_dir(&self) -> RootDir {
        self.root.clone()
    }

    /// Replaces the exposed directory, reporting whether anything
    /// changed. In-flight requests keep resolving against the value they
    /// already read.
    pub async fn set_root_dir(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let changed = self.root.set(path).await;
        if changed {
            info!("root directory changed: {}", path.display());
            if let Some(observer) = &self.root_changed {
                observer(path);
            }
        }
        changed
    }

    /// Asks the shell for a new root directory and applies it.
    pub async fn change_root_dir(&self) -> bool {
        let Some(picked) = self.shell.as_ref().and_then(|shell| shell.pick_directory()) else {
            return false;
        };
        self.set_root_dir(picked).await
    }

    /// Binds `addr:port` and starts serving.
    ///
    /// Already listening is a warning no-op returning the current bound
    /// address. A bind failure leaves the server idle with no routes
    /// registered. On success the static-asset router and the file
    /// router are (re-)registered and the real bound address is recorded,
    /// so a `port` of 0 picks an ephemeral one.
    pub async fn listen(&mut self, addr: IpAddr, port: u16) -> Result<SocketAddr> {
        if let Some(bound) = &self.bound {
            warn!("already listening on {}", bound.addr);
            return Ok(bound.addr);
        }

        let listener = TcpListener::bind(SocketAddr::new(addr, port))
            .await
            .with_context(|| format!("failed to bind {addr}:{port}"))?;
        let local_addr = listener
            .local_addr()
            .context("no local address after bind")?;

        {
            let mut registry = self.registry.write().await;
            registry.insert(Arc::new(StaticAssetRouter));
            registry.insert(Arc::new(FileRouter::new(self.root.clone())));
            info!("registered routes: {:?}", registry.patterns());
        }

        let app = dispatch_app(Arc::clone(&self.registry));
        let task = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                error!("server crashed: {err:?}");
            }
        });

        self.bound = Some(Bound {
            addr: local_addr,
            task,
        });
        info!(
            "serving {} at http://{local_addr}/",
            self.root.get().await.display()
        );
        if let Some(shell) = &self.shell {
            shell.notify(true);
        }
        Ok(local_addr)
    }

    pub fn is_listening(&self) -> bool {
        self.bound.is_some()
    }

    /// Inserts `route` into the live dispatch table. Binding needs an
    /// active transport; when idle this is a warning no-op returning
    /// `false`.
    pub async fn add_router(&self, route: Arc<dyn Route>) -> bool {
        if self.bound.is_none() {
            warn!("cannot add route {}: not listening", route.path_pattern());
            return false;
        }
        self.registry.write().await.insert(route);
        true
    }

    /// Stops listening and drops the listener socket. In-flight response
    /// bodies are not drained. Idempotent; the registry keeps its
    /// bookkeeping until the server itself is dropped.
    pub async fn close(&mut self) {
        let Some(bound) = self.bound.take() else {
            return;
        };
        bound.task.abort();
        info!("closed listener on {}", bound.addr);
        if let Some(shell) = &self.shell {
            shell.notify(false);
        }
    }

    pub fn bound_addr(&self) -> Option<SocketAddr> {
        self.bound.as_ref().map(|bound| bound.addr)
    }

    /// The canonical URL of the root index, with localhost substituted
    /// for a wildcard bind address. `None` while idle.
    pub fn root_index_url(&self) -> Option<String> {
        let bound = self.bound.as_ref()?;
        let host = if bound.addr.ip().is_unspecified() {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            bound.addr.ip()
        };
        Some(format!("http://{host}:{}/", bound.addr.port()))
    }

    /// Drives the shell's browser with the root index URL when
    /// listening.
    pub fn open_root_index_in_browser(&self) {
        if let (Some(shell), Some(url)) = (&self.shell, self.root_index_url()) {
            shell.open_url(&url);
        }
    }
}

impl Drop for FileServer {
    fn drop(&mut self) {
        if let Some(bound) = self.bound.take() {
            bound.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::route::Route;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn localhost() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    #[tokio::test]
    async fn listen_close_listen_cycle() {
        let root = tempfile::tempdir().unwrap();
        let mut server = FileServer::new(RootDir::new(root.path().to_path_buf()));
        assert!(!server.is_listening());

        let addr = server.listen(localhost(), 0).await.unwrap();
        assert!(server.is_listening());
        assert_ne!(addr.port(), 0);
        assert_eq!(server.bound_addr(), Some(addr));

        // Listening again is a no-op reporting the current address.
        let again = server.listen(localhost(), 0).await.unwrap();
        assert_eq!(again, addr);

        server.close().await;
        assert!(!server.is_listening());
        server.close().await; // idempotent

        // Routes registered before the close are remembered.
        assert_eq!(
            server.registry.read().await.patterns(),
            vec!["/", "/static/"]
        );

        // A fresh listen re-registers and serves again.
        let addr = server.listen(localhost(), 0).await.unwrap();
        let response = raw_get(addr, "/").await;
        assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
        server.close().await;
    }

    #[tokio::test]
    async fn serves_real_sockets_end_to_end() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("hello.txt"), b"hello over tcp").unwrap();
        let mut server = FileServer::new(RootDir::new(root.path().to_path_buf()));

        let addr = server.listen(localhost(), 0).await.unwrap();
        let response = raw_get(addr, "/hello.txt").await;
        assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
        assert!(response.ends_with("hello over tcp"));

        let response = raw_get(addr, "/missing").await;
        assert!(response.starts_with("HTTP/1.1 404"), "got: {response}");
        server.close().await;
    }

    struct PingRoute;

    #[async_trait]
    impl Route for PingRoute {
        fn path_pattern(&self) -> &'static str {
            "/ping"
        }

        async fn handle(&self, _rel_path: &str) -> Response {
            (StatusCode::OK, "pong").into_response()
        }
    }

    #[tokio::test]
    async fn add_router_needs_an_active_transport() {
        let root = tempfile::tempdir().unwrap();
        let mut server = FileServer::new(RootDir::new(root.path().to_path_buf()));

        assert!(!server.add_router(Arc::new(PingRoute)).await);

        let addr = server.listen(localhost(), 0).await.unwrap();
        assert!(server.add_router(Arc::new(PingRoute)).await);

        // The route is live without rebinding.
        let response = raw_get(addr, "/ping").await;
        assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
        assert!(response.ends_with("pong"));
        server.close().await;
    }

    #[tokio::test]
    async fn root_index_url_substitutes_localhost_for_wildcard_binds() {
        let root = tempfile::tempdir().unwrap();
        let mut server = FileServer::new(RootDir::new(root.path().to_path_buf()));
        assert_eq!(server.root_index_url(), None);

        let addr = server
            .listen(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
            .await
            .unwrap();
        assert_eq!(
            server.root_index_url(),
            Some(format!("http://127.0.0.1:{}/", addr.port()))
        );
        server.close().await;
    }

    struct PickingShell {
        pick: PathBuf,
        notifications: Mutex<Vec<bool>>,
    }

    impl Shell for PickingShell {
        fn notify(&self, listening: bool) {
            self.notifications.lock().unwrap().push(listening);
        }

        fn pick_directory(&self) -> Option<PathBuf> {
            Some(self.pick.clone())
        }

        fn open_url(&self, _url: &str) {}
    }

    #[tokio::test]
    async fn shell_is_notified_and_can_repick_the_root() {
        let root = tempfile::tempdir().unwrap();
        let picked = tempfile::tempdir().unwrap();
        let shell = Arc::new(PickingShell {
            pick: picked.path().to_path_buf(),
            notifications: Mutex::new(Vec::new()),
        });

        let mut server =
            FileServer::new(RootDir::new(root.path().to_path_buf())).with_shell(shell.clone());
        server.listen(localhost(), 0).await.unwrap();
        server.close().await;
        assert_eq!(*shell.notifications.lock().unwrap(), vec![true, false]);

        assert!(server.change_root_dir().await);
        assert_eq!(server.root_dir().get().await, picked.path());
        // Picking the same directory again changes nothing.
        assert!(!server.change_root_dir().await);
    }
}
