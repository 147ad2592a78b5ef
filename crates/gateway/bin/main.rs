//! `sensor-gateway` - the daemon entry point.
//!
//! Takes exactly one argument, the TCP listen port. Map path, database
//! location and the condvar watchdog come from the environment
//! (`SENSOR_GATEWAY_MAP`, `SENSOR_GATEWAY_DB`,
//! `SENSOR_GATEWAY_CV_TIMEOUT_MS`); `RUST_LOG` controls verbosity.
//! SIGINT or SIGTERM ends ingress and starts the drain.

use log::{error, warn};
use sensor_gateway::{GatewayConfig, GatewayError, RunReport, Supervisor};
use std::env;
use std::process::ExitCode;

const USAGE: &str = "Usage: sensor-gateway <port>";

/// Exit code for command-line misuse.
const EXIT_USAGE: u8 = 255;

fn main() -> ExitCode {
    env_logger::init();

    let Some(port) = parse_args(env::args().skip(1)) else {
        eprintln!("{USAGE}");
        return ExitCode::from(EXIT_USAGE);
    };

    match serve(config_from_env(), port) {
        Ok(_report) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Exactly one argument, a decimal port, with no parse residue.
fn parse_args(mut args: impl Iterator<Item = String>) -> Option<u16> {
    let port = args.next()?;
    if args.next().is_some() {
        return None;
    }
    port.parse().ok()
}

fn config_from_env() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    if let Ok(path) = env::var("SENSOR_GATEWAY_MAP") {
        config = config.with_map_path(path);
    }
    if let Ok(uri) = env::var("SENSOR_GATEWAY_DB") {
        config = config.with_db_uri(uri);
    }
    if let Ok(raw) = env::var("SENSOR_GATEWAY_CV_TIMEOUT_MS") {
        match raw.parse() {
            Ok(millis) => config = config.with_cv_timeout_ms(millis),
            Err(_) => warn!("ignoring non-numeric SENSOR_GATEWAY_CV_TIMEOUT_MS={raw:?}"),
        }
    }
    config
}

fn serve(config: GatewayConfig, port: u16) -> Result<RunReport, GatewayError> {
    let supervisor = Supervisor::bind(config, port)?;

    let shutdown = supervisor.shutdown_flag();
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, shutdown.handle()).map_err(GatewayError::Signal)?;
    }

    supervisor.run()
}
