mod assets;
mod config;
mod fmt;
mod shell;
mod web;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::shell::LogShell;
use crate::web::server::FileServer;
use crate::web::state::RootDir;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    info!("FileLink v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::load();
    let root = RootDir::new(config.root_dir.clone().unwrap_or_else(default_root));
    info!("root directory: {}", root.get().await.display());

    let mut server = FileServer::new(root).with_shell(Arc::new(LogShell));
    server.on_root_dir_changed(|path| info!("now serving {}", path.display()));

    server.listen(config.bind_addr, config.port).await?;
    server.open_root_index_in_browser();

    wait_for_shutdown(&server).await?;
    server.close().await;
    Ok(())
}

/// The application's own directory, exposed when nothing is configured.
fn default_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(unix)]
async fn wait_for_shutdown(server: &FileServer) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    // SIGHUP re-picks the root directory through the shell.
    let mut hangup = signal(SignalKind::hangup())?;
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => return Ok(result?),
            _ = hangup.recv() => {
                server.change_root_dir().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_server: &FileServer) -> anyhow::Result<()> {
    Ok(tokio::signal::ctrl_c().await?)
}
