//! Wire codec for the sensor protocol.
//!
//! A connection carries a stream of fixed-size little-endian records:
//! `u16 sensor_id`, `f64 value`, `i64 timestamp` - 18 bytes each. EOF at a
//! record boundary ends the stream cleanly; EOF inside a record is a
//! protocol violation charged to the sender.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use fanbuf::Reading;
use std::io::{self, Cursor, Read, Write};
use thiserror::Error;

/// Encoded size of one reading on the wire.
pub const READING_WIRE_LEN: usize = 2 + 8 + 8;

/// Decoding failures. Either way the connection is finished; the process
/// is not.
#[derive(Debug, Error)]
pub enum WireError {
    /// The peer hung up inside a record.
    #[error("truncated record: got {got} of {READING_WIRE_LEN} bytes")]
    Truncated { got: usize },

    /// Transport-level failure.
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

/// Reads the next reading from the stream.
///
/// Returns `Ok(None)` on clean EOF (zero bytes at a record boundary).
pub fn read_reading<R: Read>(reader: &mut R) -> Result<Option<Reading>, WireError> {
    let mut frame = [0u8; READING_WIRE_LEN];
    let mut filled = 0;

    while filled < READING_WIRE_LEN {
        match reader.read(&mut frame[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(WireError::Truncated { got: filled }),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    let mut cursor = Cursor::new(&frame[..]);
    let sensor_id = cursor.read_u16::<LittleEndian>()?;
    let value = cursor.read_f64::<LittleEndian>()?;
    let timestamp = cursor.read_i64::<LittleEndian>()?;
    Ok(Some(Reading::new(sensor_id, value, timestamp)))
}

/// Writes one reading in wire format. Used by the `sensor-node` client
/// and the tests.
pub fn write_reading<W: Write>(writer: &mut W, reading: &Reading) -> io::Result<()> {
    writer.write_u16::<LittleEndian>(reading.sensor_id)?;
    writer.write_f64::<LittleEndian>(reading.value)?;
    writer.write_i64::<LittleEndian>(reading.timestamp)?;
    Ok(())
}
