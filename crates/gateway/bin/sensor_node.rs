//! `sensor-node` - a synthetic sensor for smoke-testing a running
//! gateway.
//!
//! Connects to `127.0.0.1:<port>` and streams `<count>` readings for one
//! sensor: a random walk around 18 °C, one reading every 20 ms, wall-clock
//! timestamps. Closes the socket cleanly when done.

use fanbuf::Reading;
use rand::Rng;
use sensor_gateway::wire;
use std::env;
use std::net::TcpStream;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const USAGE: &str = "Usage: sensor-node <port> <sensor-id> <count>";
const SEND_INTERVAL: Duration = Duration::from_millis(20);
const START_TEMPERATURE: f64 = 18.0;

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let parsed = (
        args.next().and_then(|a| a.parse::<u16>().ok()),
        args.next().and_then(|a| a.parse::<u16>().ok()),
        args.next().and_then(|a| a.parse::<u64>().ok()),
    );
    let ((Some(port), Some(sensor_id), Some(count)), None) = (parsed, args.next()) else {
        eprintln!("{USAGE}");
        return ExitCode::from(255);
    };

    let mut stream = match TcpStream::connect(("127.0.0.1", port)) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("sensor-node: cannot connect to port {port}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut rng = rand::thread_rng();
    let mut value = START_TEMPERATURE;

    for sent in 0..count {
        value += rng.gen_range(-0.25..0.25);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as i64);

        let reading = Reading::new(sensor_id, value, timestamp);
        if let Err(e) = wire::write_reading(&mut stream, &reading) {
            eprintln!("sensor-node: send failed after {sent} readings: {e}");
            return ExitCode::FAILURE;
        }
        thread::sleep(SEND_INTERVAL);
    }

    println!("sensor-node: sent {count} readings for sensor {sensor_id}");
    ExitCode::SUCCESS
}
