//! Process consumer: validates and aggregates readings against the room
//! map.
//!
//! For every reading the processor resolves the reporting sensor to its
//! room and folds the value into a per-sensor running average; once the
//! window is warm, averages outside the configured band are reported.
//! Validation failures are logged and counted but never stall the lane:
//! the observation cursor has already advanced by the time the reading
//! reaches domain logic.

use crate::roommap::RoomMap;
use fanbuf::{PipelineBuffer, RecordSnapshot};
use log::{debug, error, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Readings per sensor contributing to the running average.
const RUN_AVG_LEN: usize = 5;
/// A warm running average below this is reported as too cold (°C).
const MIN_AVG_TEMPERATURE: f64 = 10.0;
/// A warm running average above this is reported as too hot (°C).
const MAX_AVG_TEMPERATURE: f64 = 26.5;

/// Counters reported by the processor when its lane drains.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Readings observed on the process lane.
    pub readings: u64,
    /// Readings from sensors absent from the room map.
    pub unknown_sensor: u64,
    /// Warm-window averages below the minimum.
    pub too_cold: u64,
    /// Warm-window averages above the maximum.
    pub too_hot: u64,
}

/// Fixed-window running average over the last [`RUN_AVG_LEN`] values.
#[derive(Debug, Default)]
struct RunningAverage {
    window: [f64; RUN_AVG_LEN],
    filled: usize,
    next: usize,
}

impl RunningAverage {
    fn push(&mut self, value: f64) {
        self.window[self.next] = value;
        self.next = (self.next + 1) % RUN_AVG_LEN;
        if self.filled < RUN_AVG_LEN {
            self.filled += 1;
        }
    }

    /// The average, once the window is full.
    fn value(&self) -> Option<f64> {
        (self.filled == RUN_AVG_LEN)
            .then(|| self.window.iter().sum::<f64>() / RUN_AVG_LEN as f64)
    }
}

/// Long-running worker owning the process lane.
pub struct Processor {
    buffer: Arc<PipelineBuffer>,
    map: Arc<RoomMap>,
    averages: HashMap<u16, RunningAverage>,
    stats: ProcessorStats,
}

impl Processor {
    /// Creates the worker. The room map must be fully loaded by now; it is
    /// never re-read.
    pub fn new(buffer: Arc<PipelineBuffer>, map: Arc<RoomMap>) -> Self {
        Self {
            buffer,
            map,
            averages: HashMap::new(),
            stats: ProcessorStats::default(),
        }
    }

    /// Consumes the process lane until end of stream, returning the final
    /// counters.
    pub fn run(mut self) -> ProcessorStats {
        while let Some(snapshot) = self.buffer.take_next_to_process() {
            self.handle(&snapshot);
        }
        debug!("process lane drained after {} readings", self.stats.readings);
        self.stats
    }

    fn handle(&mut self, snapshot: &RecordSnapshot) {
        self.stats.readings += 1;

        let Some(room_id) = self.map.room_for(snapshot.sensor_id) else {
            self.stats.unknown_sensor += 1;
            error!(
                "reading from unknown sensor {} (seq {})",
                snapshot.sensor_id, snapshot.seq
            );
            return;
        };

        let average = self.averages.entry(snapshot.sensor_id).or_default();
        average.push(snapshot.value);
        if let Some(mean) = average.value() {
            if mean < MIN_AVG_TEMPERATURE {
                self.stats.too_cold += 1;
                warn!(
                    "sensor {} in room {room_id} runs too cold (avg {mean:.2}, seq {})",
                    snapshot.sensor_id, snapshot.seq
                );
            } else if mean > MAX_AVG_TEMPERATURE {
                self.stats.too_hot += 1;
                warn!(
                    "sensor {} in room {room_id} runs too hot (avg {mean:.2}, seq {})",
                    snapshot.sensor_id, snapshot.seq
                );
            }
        }

        debug!(
            "processed sensor {} room {room_id} value {} (seq {})",
            snapshot.sensor_id, snapshot.value, snapshot.seq
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanbuf::BufferConfig;

    fn processor_with(map_text: &str) -> Processor {
        let buffer = Arc::new(PipelineBuffer::new(BufferConfig::default()));
        let map = Arc::new(RoomMap::parse("test.map", map_text).unwrap());
        Processor::new(buffer, map)
    }

    fn snapshot(sensor_id: u16, value: f64, seq: u64) -> RecordSnapshot {
        RecordSnapshot {
            sensor_id,
            value,
            timestamp: 0,
            seq,
        }
    }

    #[test]
    fn unknown_sensor_is_counted_not_fatal() {
        let mut processor = processor_with("1 15\n");
        processor.handle(&snapshot(99, 20.0, 1));

        assert_eq!(processor.stats.readings, 1);
        assert_eq!(processor.stats.unknown_sensor, 1);
    }

    #[test]
    fn warm_window_flags_out_of_band_averages() {
        let mut processor = processor_with("1 15\n");

        // Four readings: window not warm yet, no flags even at 40 °C.
        for seq in 1..=4 {
            processor.handle(&snapshot(15, 40.0, seq));
        }
        assert_eq!(processor.stats.too_hot, 0);

        // Fifth reading warms the window; the average is now checked.
        processor.handle(&snapshot(15, 40.0, 5));
        assert_eq!(processor.stats.too_hot, 1);

        assert_eq!(processor.stats.readings, 5);
        assert_eq!(processor.stats.unknown_sensor, 0);
    }

    #[test]
    fn running_average_is_per_sensor() {
        let mut processor = processor_with("1 15\n1 16\n");

        for seq in 1..=5 {
            processor.handle(&snapshot(15, 5.0, seq)); // cold
            processor.handle(&snapshot(16, 20.0, seq)); // fine
        }

        assert_eq!(processor.stats.too_cold, 1);
        assert_eq!(processor.stats.too_hot, 0);
    }
}
