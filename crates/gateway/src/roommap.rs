//! Static sensor-to-room mapping.
//!
//! Loaded once at startup and shared read-only with the processor; the map
//! file is never re-read while the gateway runs.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Room map load failures. Fatal at setup.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{path}:{line}: expected `<room_id> <sensor_id>`, got {text:?}")]
    Parse {
        path: String,
        line: usize,
        text: String,
    },
}

/// Immutable `sensor_id -> room_id` table.
///
/// File format: one mapping per line, `<room_id> <sensor_id>` whitespace
/// separated. Blank lines and `#` comments are skipped. A sensor listed
/// twice keeps its last room.
#[derive(Debug, Default)]
pub struct RoomMap {
    by_sensor: HashMap<u16, u16>,
}

impl RoomMap {
    /// Loads the map from `path`.
    pub fn load(path: &Path) -> Result<Self, MapError> {
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| MapError::Io {
            path: display.clone(),
            source,
        })?;
        Self::parse(&display, &text)
    }

    pub(crate) fn parse(path: &str, text: &str) -> Result<Self, MapError> {
        let mut by_sensor = HashMap::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let entry = match (fields.next(), fields.next(), fields.next()) {
                (Some(room), Some(sensor), None) => {
                    room.parse::<u16>().ok().zip(sensor.parse::<u16>().ok())
                }
                _ => None,
            };

            match entry {
                Some((room_id, sensor_id)) => {
                    by_sensor.insert(sensor_id, room_id);
                }
                None => {
                    return Err(MapError::Parse {
                        path: path.to_owned(),
                        line: index + 1,
                        text: raw.to_owned(),
                    });
                }
            }
        }

        Ok(Self { by_sensor })
    }

    /// Room for a sensor, or `None` for sensors not in the map.
    pub fn room_for(&self, sensor_id: u16) -> Option<u16> {
        self.by_sensor.get(&sensor_id).copied()
    }

    /// Number of mapped sensors.
    pub fn len(&self) -> usize {
        self.by_sensor.len()
    }

    /// Returns `true` when no sensors are mapped.
    pub fn is_empty(&self) -> bool {
        self.by_sensor.is_empty()
    }
}
