//! Application context and ordered teardown.
//!
//! Long-lived resources register a named closer when they are acquired.
//! `AppContext::shutdown` runs the closers in reverse registration order;
//! a failing closer is logged and the rest still run.

use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use tracing::{error, info};

use crate::error::GatewayError;

/// Process exit codes, one per fatal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    PropertyError = 2,
    ServerError = 3,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Configuration problems are property errors, everything else a server error.
    pub fn for_error(error: &GatewayError) -> Self {
        match error {
            GatewayError::Config(_) => ExitCode::PropertyError,
            _ => ExitCode::ServerError,
        }
    }
}

/// What ended the wait in `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    /// The HTTP server task finished without being asked to.
    ServerStopped,
}

/// `None` for a clean exit. A server that stopped on its own, or any closer
/// that failed during teardown, is a server error.
pub fn exit_code_for(reason: StopReason, failed_closers: usize) -> Option<ExitCode> {
    if reason == StopReason::ServerStopped || failed_closers > 0 {
        Some(ExitCode::ServerError)
    } else {
        None
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}

type Closer = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), GatewayError>> + Send>;

#[derive(Default)]
pub struct AppContext {
    closers: Mutex<Vec<(String, Closer)>>,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closer; the last registered runs first.
    pub fn on_shutdown<F, Fut>(&self, name: impl Into<String>, close: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), GatewayError>> + Send + 'static,
    {
        let closer: Closer = Box::new(move || close().boxed());
        self.closers.lock().push((name.into(), closer));
    }

    pub fn pending(&self) -> usize {
        self.closers.lock().len()
    }

    /// Runs every closer, newest first. Returns how many failed.
    pub async fn shutdown(&self) -> usize {
        let mut failures = 0;
        loop {
            // Pop under the lock, run outside it
            let Some((name, close)) = self.closers.lock().pop() else {
                break;
            };
            info!("Close {}", name);
            if let Err(e) = close().await {
                failures += 1;
                error!(error = %e, "Failed to close {}", name);
            }
        }
        info!("Shutdown finished");
        failures
    }

    /// Tears everything down after a run and picks the process exit code.
    pub async fn finish(&self, reason: StopReason) -> std::process::ExitCode {
        let failures = self.shutdown().await;
        match exit_code_for(reason, failures) {
            Some(code) => {
                error!("Shutdown with error code {} ({:?})", code.code(), code);
                code.into()
            }
            None => std::process::ExitCode::SUCCESS,
        }
    }

    /// Logs the fatal category, tears everything down and hands back the exit code.
    pub async fn fail(&self, code: ExitCode) -> std::process::ExitCode {
        error!("Shutdown with error code {} ({:?})", code.code(), code);
        self.shutdown().await;
        code.into()
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received"),
        _ = terminate => info!("SIGTERM received"),
    }
}
