//! Supervisor: owns the pipeline lifecycle.
//!
//! Setup happens strictly before steady state - room map, database,
//! worker threads - so every fatal error surfaces before the first
//! connection is accepted. Shutdown is the mirror image: ingress ends,
//! the buffer drains, `close` broadcasts end of stream, workers are
//! joined and their counters folded into the run report.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::ingress;
use crate::processor::{Processor, ProcessorStats};
use crate::reclaimer::Reclaimer;
use crate::roommap::RoomMap;
use crate::shutdown::ShutdownFlag;
use crate::storer::{Storer, StorerStats};
use fanbuf::PipelineBuffer;
use log::info;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Cadence of the post-ingress empty poll.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Final counters from one gateway run, aggregated at join time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Process-lane counters.
    pub processor: ProcessorStats,
    /// Store-lane counters.
    pub storer: StorerStats,
    /// Records freed by the reclaimer.
    pub reclaimed: u64,
}

/// Owns the listener, the shutdown flag and the run sequence.
pub struct Supervisor {
    config: GatewayConfig,
    listener: TcpListener,
    shutdown: ShutdownFlag,
}

impl Supervisor {
    /// Binds the listening socket. Port 0 asks the OS for an ephemeral
    /// port; see [`local_addr`](Self::local_addr).
    pub fn bind(config: GatewayConfig, port: u16) -> Result<Self, GatewayError> {
        let listener = TcpListener::bind(("0.0.0.0", port)).map_err(GatewayError::Bind)?;
        // The accept loop polls the shutdown flag between accepts, so the
        // listener must not block indefinitely.
        listener.set_nonblocking(true).map_err(GatewayError::Bind)?;
        Ok(Self {
            config,
            listener,
            shutdown: ShutdownFlag::new(),
        })
    }

    /// The bound address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// A clone of the flag that ends ingress: hand it to a signal handler
    /// or trigger it from a test.
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// Runs the gateway to completion: setup, ingress, drain, shutdown.
    ///
    /// Returns after all workers have exited. A worker panic propagates -
    /// a consumer failure mid-record is fatal to the process, by contract.
    pub fn run(self) -> Result<RunReport, GatewayError> {
        // --- Setup (fatal-error zone) ---
        let map = Arc::new(RoomMap::load(&self.config.map_path)?);
        info!(
            "room map {} loaded ({} sensors)",
            self.config.map_path.display(),
            map.len()
        );

        let buffer = Arc::new(PipelineBuffer::new(self.config.buffer_config()));
        let storer = Storer::open(Arc::clone(&buffer), &self.config.db_uri)?;
        info!("database ready at {}", self.config.db_uri);

        let processor = Processor::new(Arc::clone(&buffer), map);
        let reclaimer = Reclaimer::new(Arc::clone(&buffer));

        let processor_handle = spawn_worker("processor", move || processor.run())?;
        let storer_handle = spawn_worker("storer", move || storer.run())?;
        let reclaimer_handle = spawn_worker("reclaimer", move || reclaimer.run())?;

        // --- Steady state ---
        if let Ok(addr) = self.listener.local_addr() {
            info!("listening on {addr}");
        }
        ingress::serve(&self.listener, &buffer, &self.shutdown);

        // --- Drain and shutdown ---
        while !buffer.is_empty() {
            thread::sleep(DRAIN_POLL_INTERVAL);
        }
        buffer.close();
        info!("buffer closed, joining workers");

        let report = RunReport {
            processor: join_worker("processor", processor_handle),
            storer: join_worker("storer", storer_handle),
            reclaimed: join_worker("reclaimer", reclaimer_handle),
        };

        debug_assert!(buffer.is_empty(), "records survived the drain");
        debug_assert!(buffer.is_closed());

        info!(
            "shutdown complete: {} processed, {} stored ({} failed), {} reclaimed",
            report.processor.readings, report.storer.stored, report.storer.failed, report.reclaimed
        );
        Ok(report)
    }
}

fn spawn_worker<T, F>(name: &'static str, work: F) -> Result<JoinHandle<T>, GatewayError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(work)
        .map_err(|source| GatewayError::Spawn { name, source })
}

fn join_worker<T>(name: &'static str, handle: JoinHandle<T>) -> T {
    // A worker panic poisons the pipeline; propagate it.
    handle
        .join()
        .unwrap_or_else(|_| panic!("{name} thread panicked"))
}
