//! Process supervision: run listeners together, stop them together.
//!
//! A [`Group`] runs named actors concurrently. The first actor to return
//! (error, clean exit, panic or a termination signal) fires the shared
//! [`Shutdown`]; every other actor is expected to watch its `Shutdown` handle
//! and stop gracefully. [`Group::run`] resolves once all actors are done and
//! reports the first outcome.
//!
//! ## Example
//!
//! ```ignore
//! let mut group = Group::new();
//! let shutdown = group.shutdown();
//! group.add("public", dapr::server::http::serve(listener, app, shutdown.clone()));
//! group.add_signal_handler();
//! match group.run().await {
//!     Ok(()) | Err(RunError::Signal(_)) => ExitCode::SUCCESS,
//!     Err(_) => ExitCode::FAILURE,
//! }
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::error::BoxError;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("received {0}")]
    Signal(&'static str),
    #[error("{name} failed: {source}")]
    Actor {
        name: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("{name} panicked")]
    Panicked { name: &'static str },
}

/// Fires the shutdown signal.
#[derive(Debug)]
pub struct Trigger(watch::Sender<bool>);

impl Trigger {
    pub fn fire(&self) {
        self.0.send_replace(true);
    }

    pub fn subscribe(&self) -> Shutdown {
        Shutdown(self.0.subscribe())
    }
}

/// A handle an actor watches to learn it should stop.
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once shutdown fires (or its trigger is gone).
    pub async fn wait(mut self) {
        let _ = self.0.wait_for(|stop| *stop).await;
    }
}

/// A linked trigger and handle.
pub fn shutdown_channel() -> (Trigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (Trigger(tx), Shutdown(rx))
}

type Actor = BoxFuture<'static, Result<(), RunError>>;

/// A set of actors that live and die together.
pub struct Group {
    actors: Vec<(&'static str, Actor)>,
    trigger: Trigger,
    shutdown: Shutdown,
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

impl Group {
    pub fn new() -> Self {
        let (trigger, shutdown) = shutdown_channel();
        Self {
            actors: Vec::new(),
            trigger,
            shutdown,
        }
    }

    /// Handle to give to actors so they stop when the group does.
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn add<F, E>(&mut self, name: &'static str, actor: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let actor = async move {
            actor.await.map_err(|err| RunError::Actor {
                name,
                source: err.into(),
            })
        };
        self.actors.push((name, actor.boxed()));
    }

    /// Add an actor that ends the group on Ctrl-C (and SIGTERM on unix).
    pub fn add_signal_handler(&mut self) {
        let shutdown = self.shutdown();
        let actor = async move {
            tokio::select! {
                signal = wait_for_signal() => Err(RunError::Signal(signal)),
                _ = shutdown.wait() => Ok(()),
            }
        };
        self.actors.push(("signal", actor.boxed()));
    }

    /// Run every actor until all have stopped; return the first outcome.
    pub async fn run(self) -> Result<(), RunError> {
        let Group {
            actors,
            trigger,
            shutdown: _,
        } = self;

        let mut set = JoinSet::new();
        for (name, actor) in actors {
            tracing::debug!(actor = name, "starting");
            set.spawn(async move {
                let outcome = AssertUnwindSafe(actor)
                    .catch_unwind()
                    .await
                    .unwrap_or(Err(RunError::Panicked { name }));
                (name, outcome)
            });
        }

        let mut first: Option<Result<(), RunError>> = None;
        while let Some(joined) = set.join_next().await {
            let (name, outcome) = match joined {
                Ok(done) => done,
                Err(err) => {
                    tracing::error!(error = %err, "actor task failed");
                    continue;
                }
            };
            match &outcome {
                Ok(()) => tracing::info!(actor = name, "stopped"),
                Err(RunError::Signal(signal)) => tracing::info!(actor = name, signal, "shutting down"),
                Err(err) => tracing::error!(actor = name, error = %err, "stopped with error"),
            }
            if first.is_none() {
                trigger.fire();
                first = Some(outcome);
            }
        }

        first.unwrap_or(Ok(()))
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        },
        Err(err) => {
            tracing::warn!(error = %err, "could not install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}
