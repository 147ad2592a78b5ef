//! Setup-failure errors for the gateway.
//!
//! Everything here aborts the process before it enters steady state.
//! Steady-state failures (a malformed frame, a failed insert) are handled
//! and logged where they occur and never surface as `GatewayError`.

use crate::roommap::MapError;
use std::io;
use thiserror::Error;

/// Fatal setup failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Could not bind the TCP listening socket.
    #[error("failed to bind listener: {0}")]
    Bind(#[source] io::Error),

    /// The room map file could not be loaded.
    #[error("failed to load room map: {0}")]
    Map(#[from] MapError),

    /// The database could not be opened or bootstrapped.
    #[error("database setup failed: {0}")]
    Db(#[from] rusqlite::Error),

    /// A worker thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    /// An OS signal handler could not be registered.
    #[error("failed to register signal handler: {0}")]
    Signal(#[source] io::Error),
}
