//! TCP ingress: the accept loop and the per-connection handlers.
//!
//! The accept loop runs on the supervisor thread until the shutdown flag
//! is raised. Each accepted connection gets a short-lived handler thread
//! that decodes readings and feeds them to the buffer. Handlers are
//! detached: they terminate on peer EOF, on a protocol violation, or when
//! the buffer tells them it is closed - never by being joined.

use crate::shutdown::ShutdownFlag;
use crate::wire;
use fanbuf::{BufferError, PipelineBuffer};
use log::{debug, info, warn};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Cadence of shutdown-flag checks while no connection is pending.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accepts connections until shutdown is requested.
///
/// The listener must already be in non-blocking mode (the supervisor puts
/// it there at bind time). Transient accept failures are logged and do not
/// end ingress.
pub fn serve(listener: &TcpListener, buffer: &Arc<PipelineBuffer>, shutdown: &ShutdownFlag) {
    while !shutdown.is_triggered() {
        match listener.accept() {
            Ok((stream, peer)) => {
                // The accepted socket must block: handlers park in read().
                if let Err(e) = stream.set_nonblocking(false) {
                    warn!("{peer}: cannot configure socket: {e}");
                    continue;
                }

                let buffer = Arc::clone(buffer);
                let spawned = thread::Builder::new()
                    .name(format!("conn-{peer}"))
                    .spawn(move || handle_connection(&stream, &buffer));
                if let Err(e) = spawned {
                    warn!("{peer}: cannot spawn handler: {e}");
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                warn!("accept failed: {e}");
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }
    info!("ingress finished");
}

/// Decode-and-insert loop for one connection (the producer adapter).
///
/// Holds no state of its own: every decoded reading goes straight into
/// the buffer. The socket closes when the stream handle drops.
fn handle_connection(mut stream: &TcpStream, buffer: &PipelineBuffer) {
    let peer = stream
        .peer_addr()
        .map_or_else(|_| "unknown peer".to_owned(), |addr| addr.to_string());
    debug!("{peer}: connected");

    let mut accepted = 0u64;
    loop {
        match wire::read_reading(&mut stream) {
            Ok(Some(reading)) => match buffer.insert(reading) {
                Ok(seq) => {
                    accepted += 1;
                    debug!(
                        "{peer}: accepted sensor {} value {} as seq {seq}",
                        reading.sensor_id, reading.value
                    );
                }
                Err(BufferError::Closed) => {
                    info!("{peer}: buffer closed, dropping connection");
                    break;
                }
            },
            Ok(None) => {
                debug!("{peer}: end of stream after {accepted} readings");
                break;
            }
            Err(e) => {
                warn!("{peer}: {e}; dropping connection");
                break;
            }
        }
    }
}
