// ============================================================
// Layer 7 - Grid Editor
// ============================================================
// A local web page for editing one CSV in the browser.
//
// The listener is bound on the caller's thread so a bad address
// fails immediately; serving happens on a background thread that
// runs a single-threaded tokio runtime. The server stops when the
// page posts /api/shutdown or on Ctrl-C.

pub mod server;

use std::{
    net::{SocketAddr, TcpListener},
    path::PathBuf,
    thread::JoinHandle,
};

use anyhow::{Context, Result};
use tokio::sync::oneshot;

use crate::data::table::Table;
use server::{router, AppState};

/// A running editor server.
pub struct EditorServer {
    pub url:  String,
    pub addr: SocketAddr,
    handle:   JoinHandle<Result<()>>,
}

impl EditorServer {
    /// Serve `table` at `host:port`; edits are saved to `path`.
    /// Port 0 picks a free port.
    pub fn launch(table: Table, path: PathBuf, host: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .with_context(|| format!("Cannot bind editor to {host}:{port}"))?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let (tx, rx) = oneshot::channel();
        let app = router(AppState::new(table, path, tx));

        let handle = std::thread::Builder::new()
            .name("editor-server".to_string())
            .spawn(move || -> Result<()> {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .context("Failed to start editor runtime")?;
                runtime.block_on(async move {
                    let listener = tokio::net::TcpListener::from_std(listener)?;
                    axum::serve(listener, app)
                        .with_graceful_shutdown(shutdown_signal(rx))
                        .await
                        .context("Editor server failed")
                })
            })
            .context("Failed to spawn editor thread")?;

        tracing::debug!("Editor listening on {}", addr);
        Ok(Self { url: format!("http://{addr}/"), addr, handle })
    }

    /// Block until the server has shut down.
    pub fn wait(self) -> Result<()> {
        self.handle
            .join()
            .map_err(|_| anyhow::anyhow!("Editor server thread panicked"))??;
        tracing::info!("Editor session closed");
        Ok(())
    }
}

async fn shutdown_signal(rx: oneshot::Receiver<()>) {
    tokio::select! {
        _ = rx => tracing::debug!("Shutdown requested from the page"),
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => tracing::info!("Ctrl-C received, stopping editor"),
            Err(e) => tracing::warn!("Cannot listen for Ctrl-C: {}", e),
        },
    }
}
