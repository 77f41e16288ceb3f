//! Forward-only bit reader.
use crate::{ErrorKind, Result};

/// Unsigned integer types that [`BitReader::read_bits`] can produce.
///
/// [`BitReader::read_bits`]: ./struct.BitReader.html#method.read_bits
pub trait BitField: Copy {
    /// Width of the type in bits.
    const BITS: usize;

    /// Converts the accumulated bits into `Self`.
    ///
    /// `value` never has bits set above `Self::BITS`.
    fn from_bits(value: u64) -> Self;
}
macro_rules! impl_bit_field {
    ($($ty:ty),*) => {
        $(
            impl BitField for $ty {
                const BITS: usize = std::mem::size_of::<$ty>() * 8;

                fn from_bits(value: u64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}
impl_bit_field!(u8, u16, u32, u64);

/// Sequential reader over a byte slice.
///
/// Bits are consumed most-significant-bit first within each byte.
/// The read position only moves forward.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    bit_offset: usize,
}
impl<'a> BitReader<'a> {
    /// Makes a new `BitReader` instance positioned at the first bit of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        BitReader {
            bytes,
            bit_offset: 0,
        }
    }

    /// Reads a single bit.
    ///
    /// # Errors
    ///
    /// If no bits are left, it will return an `ErrorKind::Truncated` error.
    pub fn read_bit(&mut self) -> Result<bool> {
        track_assert!(
            self.bits_left() >= 1,
            ErrorKind::Truncated,
            "No bits left: offset={}",
            self.bit_offset
        );
        let byte = self.bytes[self.bit_offset / 8];
        let bit = (byte >> (7 - self.bit_offset % 8)) & 1 == 1;
        self.bit_offset += 1;
        Ok(bit)
    }

    /// Reads `n` bits as an unsigned integer of type `T`.
    ///
    /// Nothing is consumed when this returns an error.
    ///
    /// # Errors
    ///
    /// If `n` is zero or wider than `T`, it will return an `ErrorKind::Other` error.
    ///
    /// If fewer than `n` bits are left, it will return an `ErrorKind::Truncated` error.
    pub fn read_bits<T: BitField>(&mut self, n: usize) -> Result<T> {
        track_assert!(
            n >= 1 && n <= T::BITS,
            ErrorKind::Other,
            "Bit width out of range: n={}, max={}",
            n,
            T::BITS
        );
        track_assert!(
            self.bits_left() >= n,
            ErrorKind::Truncated,
            "Not enough bits: requested={}, left={}",
            n,
            self.bits_left()
        );

        let mut value = 0u64;
        let mut remaining = n;
        while remaining > 0 {
            let byte = self.bytes[self.bit_offset / 8];
            let available = 8 - self.bit_offset % 8;
            let take = remaining.min(available);
            let shift = available - take;
            let mask = (1u16 << take) - 1;
            let bits = (u16::from(byte) >> shift) & mask;
            value = (value << take) | u64::from(bits);
            self.bit_offset += take;
            remaining -= take;
        }
        Ok(T::from_bits(value))
    }

    /// Skips `n` whole bytes.
    ///
    /// # Errors
    ///
    /// If the reader is not at a byte boundary, it will return an `ErrorKind::Other` error.
    ///
    /// If fewer than `n` bytes are left, it will return an `ErrorKind::Truncated` error.
    pub fn skip_bytes(&mut self, n: usize) -> Result<()> {
        track_assert!(self.is_byte_aligned(), ErrorKind::Other);
        track_assert!(
            self.bytes_left() >= n,
            ErrorKind::Truncated,
            "Not enough bytes: requested={}, left={}",
            n,
            self.bytes_left()
        );
        self.bit_offset += n * 8;
        Ok(())
    }

    /// Returns the number of unread bits.
    pub fn bits_left(&self) -> usize {
        self.bytes.len() * 8 - self.bit_offset
    }

    /// Returns the number of bytes that have not been (even partially) read.
    pub fn bytes_left(&self) -> usize {
        self.bits_left() / 8
    }

    /// Returns the number of whole bytes consumed so far.
    pub fn bytes_consumed(&self) -> usize {
        self.bit_offset / 8
    }

    /// Returns `true` if the next unread bit is the first bit of a byte.
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_offset % 8 == 0
    }

    /// Returns the unread bytes.
    ///
    /// # Errors
    ///
    /// If the reader is not at a byte boundary, it will return an `ErrorKind::Other` error.
    pub fn current(&self) -> Result<&'a [u8]> {
        track_assert!(
            self.is_byte_aligned(),
            ErrorKind::Other,
            "Not at a byte boundary: offset={}",
            self.bit_offset
        );
        Ok(&self.bytes[self.bit_offset / 8..])
    }
}
