//! Channel runtime used by `chat`, `http`, `serve` and `console`.
//!
//! The selected channels are collected into a [`Runtime`] and run together
//! under one [`CancellationToken`]. Ctrl-C, SIGTERM or the first channel
//! error cancels the token; every channel then winds down and
//! [`Runtime::run`] returns the first error, if any.

use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::AppError;

/// Boxed run loop returned by [`Component::run`].
pub type ComponentFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

/// A channel the runtime can start.
pub trait Component: Send + 'static {
    /// Name used in log messages.
    fn id(&self) -> &str;

    /// Consume the channel and return its run loop, which must return once
    /// `shutdown` is cancelled.
    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture;
}

#[derive(Default)]
pub struct Runtime {
    components: Vec<Box<dyn Component>>,
    shutdown: CancellationToken,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, component: impl Component) {
        self.components.push(Box::new(component));
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Token cancelled when the runtime shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run every channel until all have exited. Ctrl-C and SIGTERM cancel
    /// the shared token.
    pub async fn run(self) -> Result<(), AppError> {
        let shutdown = self.shutdown.clone();
        let signals = tokio::spawn({
            let shutdown = shutdown.clone();
            async move {
                tokio::select! {
                    _ = wait_for_signal() => {
                        info!("shutdown signal received");
                        shutdown.cancel();
                    }
                    _ = shutdown.cancelled() => {}
                }
            }
        });

        let result = run_all(self.components, shutdown.clone()).await;
        shutdown.cancel();
        signals.abort();
        info!(ok = result.is_ok(), "all channels stopped");
        result
    }
}

async fn run_all(components: Vec<Box<dyn Component>>, shutdown: CancellationToken) -> Result<(), AppError> {
    let mut set: JoinSet<Result<(), AppError>> = JoinSet::new();

    for component in components {
        let id = component.id().to_string();
        let shutdown = shutdown.clone();
        debug!(channel = %id, "starting channel");
        set.spawn(async move {
            let result = component.run(shutdown).await;
            info!(channel = %id, ok = result.is_ok(), "channel exited");
            result
        });
    }

    let mut first_err: Option<AppError> = None;
    while let Some(joined) = set.join_next().await {
        let err = match joined {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(e) => AppError::Server(format!("channel task panicked: {e}")),
        };
        error!("channel failed: {err}");
        shutdown.cancel();
        first_err.get_or_insert(err);
    }

    first_err.map_or(Ok(()), Err)
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            error!("cannot install SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
