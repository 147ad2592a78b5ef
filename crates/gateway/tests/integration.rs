//! End-to-end tests: a real gateway on an ephemeral port, real sockets,
//! a temp-file database the tests can inspect from the outside.

use fanbuf::Reading;
use rusqlite::Connection;
use sensor_gateway::{wire, GatewayConfig, GatewayError, RunReport, ShutdownFlag, Supervisor};
use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct RunningGateway {
    addr: SocketAddr,
    shutdown: ShutdownFlag,
    handle: JoinHandle<Result<RunReport, GatewayError>>,
}

impl RunningGateway {
    fn stop(self) -> RunReport {
        self.shutdown.trigger();
        self.handle.join().unwrap().unwrap()
    }
}

/// Map with sensors 15 (room 1) and 21 (room 2); everything else unknown.
fn write_map(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("room_sensor.map");
    std::fs::write(&path, "# room sensor\n1 15\n2 21\n").unwrap();
    path
}

fn start_gateway(dir: &TempDir) -> (RunningGateway, PathBuf) {
    let db_path = dir.path().join("readings.db");
    let config = GatewayConfig::default()
        .with_map_path(write_map(dir))
        .with_db_uri(db_path.to_str().unwrap())
        .with_cv_timeout_ms(200);

    let supervisor = Supervisor::bind(config, 0).unwrap();
    let addr = supervisor.local_addr().unwrap();
    let shutdown = supervisor.shutdown_flag();
    let handle = thread::spawn(move || supervisor.run());

    (
        RunningGateway {
            addr,
            shutdown,
            handle,
        },
        db_path,
    )
}

fn send_readings(addr: SocketAddr, readings: &[Reading]) -> TcpStream {
    let mut stream = TcpStream::connect(("127.0.0.1", addr.port())).unwrap();
    for reading in readings {
        wire::write_reading(&mut stream, reading).unwrap();
    }
    stream.flush().unwrap();
    stream
}

fn count_rows(db_path: &Path) -> i64 {
    let conn = Connection::open(db_path).unwrap();
    conn.query_row("SELECT COUNT(*) FROM sensor_readings", [], |row| row.get(0))
        .unwrap_or(0)
}

/// The storer's rows are the only externally visible drain signal; wait
/// for them before triggering shutdown so the test is race-free.
fn wait_for_rows(db_path: &Path, want: i64) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let have = count_rows(db_path);
        if have >= want {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {want} rows, have {have}"
        );
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn round_trip_through_tcp_and_sqlite() {
    let dir = TempDir::new().unwrap();
    let (gateway, db_path) = start_gateway(&dir);

    let readings: Vec<Reading> = (0..10)
        .map(|i| {
            let sensor_id = if i % 2 == 0 { 15 } else { 21 };
            Reading::new(sensor_id, 18.0 + f64::from(i), 1_000 + i64::from(i))
        })
        .collect();
    let stream = send_readings(gateway.addr, &readings);
    drop(stream); // clean EOF ends the connection

    wait_for_rows(&db_path, 10);
    let report = gateway.stop();

    assert_eq!(report.processor.readings, 10);
    assert_eq!(report.processor.unknown_sensor, 0);
    assert_eq!(report.storer.stored, 10);
    assert_eq!(report.storer.failed, 0);
    assert_eq!(report.reclaimed, 10);

    // Rows arrive in store-lane order, which is insertion order.
    let conn = Connection::open(&db_path).unwrap();
    let rows: Vec<(u16, f64, i64)> = conn
        .prepare("SELECT sensor_id, value, timestamp FROM sensor_readings ORDER BY id")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let sent: Vec<(u16, f64, i64)> = readings
        .iter()
        .map(|r| (r.sensor_id, r.value, r.timestamp))
        .collect();
    assert_eq!(rows, sent);
}

#[test]
fn malformed_frame_kills_only_its_connection() {
    let dir = TempDir::new().unwrap();
    let (gateway, db_path) = start_gateway(&dir);

    // Three good readings, then a torn frame.
    let mut bad = send_readings(
        gateway.addr,
        &[
            Reading::new(15, 20.0, 1),
            Reading::new(15, 20.1, 2),
            Reading::new(15, 20.2, 3),
        ],
    );
    bad.write_all(&[0xDE, 0xAD, 0xBE]).unwrap();
    drop(bad);

    // A second connection keeps working.
    let good = send_readings(
        gateway.addr,
        &[Reading::new(21, 19.0, 4), Reading::new(21, 19.5, 5)],
    );
    drop(good);

    wait_for_rows(&db_path, 5);
    let report = gateway.stop();

    assert_eq!(report.processor.readings, 5);
    assert_eq!(report.storer.stored, 5);
    assert_eq!(report.reclaimed, 5);
}

#[test]
fn unknown_sensors_are_counted_but_still_stored() {
    let dir = TempDir::new().unwrap();
    let (gateway, db_path) = start_gateway(&dir);

    let stream = send_readings(
        gateway.addr,
        &[
            Reading::new(99, 21.0, 1), // not in the map
            Reading::new(15, 21.0, 2),
        ],
    );
    drop(stream);

    wait_for_rows(&db_path, 2);
    let report = gateway.stop();

    assert_eq!(report.processor.readings, 2);
    assert_eq!(report.processor.unknown_sensor, 1);
    // Validation is the processor's concern only; the storer keeps every
    // reading.
    assert_eq!(report.storer.stored, 2);
}

#[test]
fn idle_gateway_shuts_down_clean() {
    let dir = TempDir::new().unwrap();
    let (gateway, db_path) = start_gateway(&dir);

    let report = gateway.stop();

    assert_eq!(report.processor.readings, 0);
    assert_eq!(report.storer.stored, 0);
    assert_eq!(report.reclaimed, 0);
    assert_eq!(count_rows(&db_path), 0);
}

#[test]
fn bind_failure_is_a_setup_error() {
    let dir = TempDir::new().unwrap();
    let (gateway, _db_path) = start_gateway(&dir);
    let taken = gateway.addr.port();

    let config = GatewayConfig::default().with_map_path(write_map(&dir));
    match Supervisor::bind(config, taken) {
        Err(GatewayError::Bind(_)) => {}
        Err(other) => panic!("expected bind error, got {other:?}"),
        Ok(_) => panic!("bind to an occupied port succeeded"),
    }

    gateway.stop();
}

#[test]
fn missing_map_is_a_setup_error() {
    let dir = TempDir::new().unwrap();
    let config = GatewayConfig::default()
        .with_map_path(dir.path().join("nonexistent.map"))
        .with_db_uri(":memory:");

    let supervisor = Supervisor::bind(config, 0).unwrap();
    match supervisor.run() {
        Err(GatewayError::Map(_)) => {}
        other => panic!("expected map error, got {other:?}"),
    }
}
