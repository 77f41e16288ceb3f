//! Time-related constituent elements.
use std::io::Write;
use std::time::Duration;

use byteorder::{BigEndian, WriteBytesExt};

use crate::bits::BitReader;
use crate::{Error, ErrorKind, Result};

/// Timestamp type for PTS/DTS.
///
/// A 33-bit count of ticks of the 90 kHz system clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(u64);
impl Timestamp {
    /// 90 kHz.
    pub const RESOLUTION: u64 = 90_000;

    /// Maximum timestamp value.
    pub const MAX: u64 = (1 << 33) - 1;

    /// Makes a new `Timestamp` instance.
    ///
    /// # Errors
    ///
    /// If `n` exceeds `Timestamp::MAX`, it will return an `ErrorKind::Malformed` error.
    pub fn new(n: u64) -> Result<Self> {
        track_assert!(n <= Self::MAX, ErrorKind::Malformed, "Too large value: {}", n);
        Ok(Timestamp(n))
    }

    /// Returns the value of the timestamp.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Converts the timestamp to the elapsed time since clock zero.
    pub fn to_duration(&self) -> Duration {
        let secs = self.0 / Self::RESOLUTION;
        let nanos = (self.0 % Self::RESOLUTION) * 1_000_000_000 / Self::RESOLUTION;
        Duration::new(secs, nanos as u32)
    }

    /// Reads a timestamp field.
    ///
    /// The field starts with the 4-bit `prefix` followed by the `[32..30]`,
    /// `[29..15]` and `[14..0]` bit groups, each terminated by a marker bit.
    pub(crate) fn read_from(reader: &mut BitReader, prefix: u8) -> Result<Self> {
        let actual_prefix = track!(reader.read_bits::<u8>(4))?;
        track_assert_eq!(actual_prefix, prefix, ErrorKind::Malformed);

        let mut n = track!(reader.read_bits::<u64>(3))? << 30;
        track!(read_marker_bit(reader))?;
        n |= track!(reader.read_bits::<u64>(15))? << 15;
        track!(read_marker_bit(reader))?;
        n |= track!(reader.read_bits::<u64>(15))?;
        track!(read_marker_bit(reader))?;
        Ok(Timestamp(n))
    }

    /// Writes the 5-byte timestamp field with the 4-bit `prefix`.
    pub(crate) fn write_to<W: Write>(&self, mut writer: W, prefix: u8) -> Result<()> {
        let n = self.0;
        let head = (prefix << 4) | ((n >> 29) as u8 & 0b1110) | 1;
        let middle = (((n >> 14) as u16) & 0xFFFE) | 1;
        let tail = ((n << 1) as u16) | 1;
        track!(writer.write_u8(head).map_err(Error::from))?;
        track!(writer.write_u16::<BigEndian>(middle).map_err(Error::from))?;
        track!(writer.write_u16::<BigEndian>(tail).map_err(Error::from))?;
        Ok(())
    }
}
impl From<Timestamp> for u64 {
    fn from(f: Timestamp) -> Self {
        f.0
    }
}

fn read_marker_bit(reader: &mut BitReader) -> Result<()> {
    let marker = track!(reader.read_bit())?;
    track_assert!(marker, ErrorKind::Malformed, "Marker bit must be 1");
    Ok(())
}
