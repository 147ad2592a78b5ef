//! Sensor gateway daemon
//!
//! Accepts TCP connections from sensor nodes, decodes their readings and
//! fans each one out to two independent consumers: a *processor* that
//! validates readings against a static room map, and a *storer* that
//! records every reading in SQLite. A terminal *reclaimer* frees records
//! once both consumers have observed them.
//!
//! The coordination core - exactly-once dual delivery, FIFO per lane,
//! tail-first reclamation, clean drain - lives in the [`fanbuf`] crate.
//! This crate wires the buffer to the outside world:
//!
//! - [`ingress`] - accept loop + per-connection producer adapters,
//! - [`processor`] / [`storer`] / [`reclaimer`] - the worker loops,
//! - [`supervisor`] - lifecycle: setup, drain, close, join,
//! - [`wire`] - the little-endian reading codec,
//! - [`roommap`] - the static sensor-to-room table.

pub mod config;
pub mod error;
pub mod ingress;
pub mod processor;
pub mod reclaimer;
pub mod roommap;
pub mod shutdown;
pub mod storer;
pub mod supervisor;
pub mod wire;

// Re-export main types
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use processor::{Processor, ProcessorStats};
pub use reclaimer::Reclaimer;
pub use roommap::{MapError, RoomMap};
pub use shutdown::ShutdownFlag;
pub use storer::{Storer, StorerStats};
pub use supervisor::{RunReport, Supervisor};
