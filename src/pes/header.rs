use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use crate::bits::BitReader;
use crate::es::StreamId;
use crate::time::Timestamp;
use crate::{Error, ErrorKind, Result};

const START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];
const MARKER_BITS: u8 = 0b10;
const PTS_PREFIX: u8 = 0b0010;
const PTS_WITH_DTS_PREFIX: u8 = 0b0011;
const DTS_PREFIX: u8 = 0b0001;
const TIMESTAMP_LEN: usize = 5;
const STUFFING_BYTE: u8 = 0xFF;

/// PES packet header.
///
/// Covers the fixed part (start code, stream identifier and packet length) and,
/// for streams that carry it, the optional header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PesHeader {
    /// Stream identifier.
    pub stream_id: StreamId,

    /// Number of bytes following the `PES_packet_length` field.
    ///
    /// `0` means that the length is neither specified nor bounded
    /// (only allowed for video streams carried in transport streams).
    pub packet_len: u16,

    /// Optional header.
    ///
    /// This is `None` if and only if the stream identifier has no optional header
    /// (see [`StreamId::has_optional_header`]).
    ///
    /// [`StreamId::has_optional_header`]: ../es/struct.StreamId.html#method.has_optional_header
    pub optional_header: Option<OptionalHeader>,
}
impl PesHeader {
    /// Size of the fixed part of the header in bytes.
    pub const FIXED_LEN: usize = 6;

    /// Returns the number of bytes of the header that are counted by `packet_len`.
    pub fn optional_header_len(&self) -> usize {
        self.optional_header
            .as_ref()
            .map_or(0, |h| OptionalHeader::FIXED_LEN + usize::from(h.header_data_len))
    }

    /// Returns the declared size of the header, i.e., including the bytes counted by
    /// `header_data_len`.
    pub fn header_len(&self) -> usize {
        Self::FIXED_LEN + self.optional_header_len()
    }

    /// Returns the declared number of payload bytes, or `None` if the packet is unbounded.
    pub fn payload_len(&self) -> Option<usize> {
        if self.packet_len == 0 {
            None
        } else {
            Some(usize::from(self.packet_len).saturating_sub(self.optional_header_len()))
        }
    }

    /// Presentation time stamp.
    pub fn pts(&self) -> Option<Timestamp> {
        self.optional_header.as_ref().and_then(|h| h.pts)
    }

    /// Decoding time stamp.
    pub fn dts(&self) -> Option<Timestamp> {
        self.optional_header.as_ref().and_then(|h| h.dts)
    }

    /// Reads a PES header from `reader`.
    ///
    /// On success the reader is positioned right after the last decoded field
    /// (the time stamps, if any). Stuffing bytes are left unread.
    ///
    /// # Errors
    ///
    /// - `ErrorKind::Malformed`: a start code, fixed bit pattern or marker bit is wrong,
    ///   or the PTS/DTS flags have the forbidden value.
    /// - `ErrorKind::Unsupported`: one of the PES extension flags (ESCR, ES rate,
    ///   DSM trick mode, additional copy info, CRC, extension) is set.
    /// - `ErrorKind::Truncated`: the input ends inside the header.
    pub fn read_from(reader: &mut BitReader) -> Result<Self> {
        track!(read_start_code(reader))?;
        let stream_id = StreamId::new(track!(reader.read_bits::<u8>(8))?);
        let packet_len = track!(reader.read_bits::<u16>(16))?;

        let optional_header = if stream_id.has_optional_header() {
            Some(track!(OptionalHeader::read_from(reader))?)
        } else {
            None
        };

        let header = PesHeader {
            stream_id,
            packet_len,
            optional_header,
        };
        log::trace!("Read PES header: {:?}", header);
        Ok(header)
    }

    /// Writes the header (including stuffing bytes) to `writer`.
    ///
    /// # Errors
    ///
    /// - `ErrorKind::Malformed`: the presence of the optional header does not match the
    ///   stream identifier, a DTS is given without a PTS, or `header_data_len` is too short
    ///   for the time stamps.
    /// - `ErrorKind::Unsupported`: an extension flag is set.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        track_assert_eq!(
            self.optional_header.is_some(),
            self.stream_id.has_optional_header(),
            ErrorKind::Malformed
        );
        track!(writer.write_all(&START_CODE_PREFIX).map_err(Error::from))?;
        track!(writer.write_u8(self.stream_id.as_u8()).map_err(Error::from))?;
        track!(writer.write_u16::<BigEndian>(self.packet_len).map_err(Error::from))?;
        if let Some(ref h) = self.optional_header {
            track!(h.write_to(writer))?;
        }
        Ok(())
    }
}

/// Optional PES header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalHeader {
    /// Scrambling mode of the payload.
    pub scrambling_control: ScramblingControl,

    /// `PES_priority`.
    pub priority: bool,

    /// `data_alignment_indicator`.
    pub data_alignment_indicator: bool,

    /// `copyright`.
    pub copyright: bool,

    /// `original_or_copy`.
    pub original_or_copy: bool,

    /// Optional fields that follow the time stamps.
    ///
    /// None of them can be decoded; a header with any of them set is rejected.
    pub extension_flags: ExtensionFlags,

    /// Number of bytes of optional fields and stuffing bytes following this field.
    pub header_data_len: u8,

    /// Presentation time stamp.
    pub pts: Option<Timestamp>,

    /// Decoding time stamp (only present together with `pts`).
    pub dts: Option<Timestamp>,
}
impl OptionalHeader {
    /// Size of the flags and `PES_header_data_length` fields in bytes.
    pub const FIXED_LEN: usize = 3;

    /// Makes a new `OptionalHeader` carrying the given time stamps and no stuffing bytes.
    ///
    /// All flags are cleared.
    pub fn with_timestamps(pts: Option<Timestamp>, dts: Option<Timestamp>) -> Self {
        let flags = PtsDtsFlags::from_timestamps(pts.is_some(), dts.is_some());
        OptionalHeader {
            scrambling_control: ScramblingControl::NotScrambled,
            priority: false,
            data_alignment_indicator: false,
            copyright: false,
            original_or_copy: false,
            extension_flags: ExtensionFlags::default(),
            header_data_len: flags.timestamps_len() as u8,
            pts,
            dts,
        }
    }

    /// Returns the `PTS_DTS_flags` value describing the time stamps of this header.
    pub fn pts_dts_flags(&self) -> PtsDtsFlags {
        PtsDtsFlags::from_timestamps(self.pts.is_some(), self.dts.is_some())
    }

    fn read_from(reader: &mut BitReader) -> Result<Self> {
        let flags = track!(FlagCluster::read_from(reader))?;
        let (pts, dts) = track!(read_timestamps(reader, flags.pts_dts_flags))?;
        track!(flags.extension_flags.check_supported())?;
        track_assert!(
            flags.pts_dts_flags != PtsDtsFlags::Forbidden,
            ErrorKind::Malformed,
            "Forbidden PTS_DTS_flags value"
        );
        Ok(OptionalHeader {
            scrambling_control: flags.scrambling_control,
            priority: flags.priority,
            data_alignment_indicator: flags.data_alignment_indicator,
            copyright: flags.copyright,
            original_or_copy: flags.original_or_copy,
            extension_flags: flags.extension_flags,
            header_data_len: flags.header_data_len,
            pts,
            dts,
        })
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        track_assert!(
            self.dts.is_none() || self.pts.is_some(),
            ErrorKind::Malformed,
            "DTS without PTS"
        );
        track!(self.extension_flags.check_supported())?;
        let pts_dts_flags = self.pts_dts_flags();
        let timestamps_len = pts_dts_flags.timestamps_len();
        track_assert!(
            usize::from(self.header_data_len) >= timestamps_len,
            ErrorKind::Malformed,
            "header_data_len={}, timestamps_len={}",
            self.header_data_len,
            timestamps_len
        );

        let mut n = u16::from(MARKER_BITS) << 14;
        n |= u16::from(self.scrambling_control as u8) << 12;
        n |= (self.priority as u16) << 11;
        n |= (self.data_alignment_indicator as u16) << 10;
        n |= (self.copyright as u16) << 9;
        n |= (self.original_or_copy as u16) << 8;
        n |= u16::from(pts_dts_flags as u8) << 6;
        track!(writer.write_u16::<BigEndian>(n).map_err(Error::from))?;
        track!(writer.write_u8(self.header_data_len).map_err(Error::from))?;

        match (self.pts, self.dts) {
            (Some(pts), None) => track!(pts.write_to(&mut writer, PTS_PREFIX))?,
            (Some(pts), Some(dts)) => {
                track!(pts.write_to(&mut writer, PTS_WITH_DTS_PREFIX))?;
                track!(dts.write_to(&mut writer, DTS_PREFIX))?;
            }
            _ => {}
        }
        for _ in timestamps_len..usize::from(self.header_data_len) {
            track!(writer.write_u8(STUFFING_BYTE).map_err(Error::from))?;
        }
        Ok(())
    }
}

/// `PES_scrambling_control`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScramblingControl {
    NotScrambled = 0b00,
    UserDefined1 = 0b01,
    UserDefined2 = 0b10,
    UserDefined3 = 0b11,
}
impl ScramblingControl {
    fn from_u8(n: u8) -> Self {
        match n & 0b11 {
            0b00 => ScramblingControl::NotScrambled,
            0b01 => ScramblingControl::UserDefined1,
            0b10 => ScramblingControl::UserDefined2,
            _ => ScramblingControl::UserDefined3,
        }
    }
}

/// `PTS_DTS_flags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PtsDtsFlags {
    /// No time stamps.
    None = 0b00,

    /// Reserved value; never valid.
    Forbidden = 0b01,

    /// PTS only.
    PtsOnly = 0b10,

    /// PTS and DTS.
    PtsAndDts = 0b11,
}
impl PtsDtsFlags {
    fn from_u8(n: u8) -> Self {
        match n & 0b11 {
            0b00 => PtsDtsFlags::None,
            0b01 => PtsDtsFlags::Forbidden,
            0b10 => PtsDtsFlags::PtsOnly,
            _ => PtsDtsFlags::PtsAndDts,
        }
    }

    fn from_timestamps(has_pts: bool, has_dts: bool) -> Self {
        match (has_pts, has_dts) {
            (true, true) => PtsDtsFlags::PtsAndDts,
            (true, false) => PtsDtsFlags::PtsOnly,
            _ => PtsDtsFlags::None,
        }
    }

    /// Returns the number of bytes the time stamp fields occupy.
    pub fn timestamps_len(self) -> usize {
        match self {
            PtsDtsFlags::PtsOnly => TIMESTAMP_LEN,
            PtsDtsFlags::PtsAndDts => TIMESTAMP_LEN * 2,
            _ => 0,
        }
    }
}

/// Flags of the optional fields following the time stamps.
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionFlags {
    pub escr: bool,
    pub es_rate: bool,
    pub dsm_trick_mode: bool,
    pub additional_copy_info: bool,
    pub crc: bool,
    pub extension: bool,
}
impl ExtensionFlags {
    fn read_from(reader: &mut BitReader) -> Result<Self> {
        Ok(ExtensionFlags {
            escr: track!(reader.read_bit())?,
            es_rate: track!(reader.read_bit())?,
            dsm_trick_mode: track!(reader.read_bit())?,
            additional_copy_info: track!(reader.read_bit())?,
            crc: track!(reader.read_bit())?,
            extension: track!(reader.read_bit())?,
        })
    }

    /// Returns `true` if any of the flags is set.
    pub fn any(&self) -> bool {
        self.first_set().is_some()
    }

    fn first_set(&self) -> Option<&'static str> {
        let flags = [
            (self.escr, "ESCR"),
            (self.es_rate, "ES_rate"),
            (self.dsm_trick_mode, "DSM_trick_mode"),
            (self.additional_copy_info, "additional_copy_info"),
            (self.crc, "PES_CRC"),
            (self.extension, "PES_extension"),
        ];
        flags.iter().find(|f| f.0).map(|f| f.1)
    }

    fn check_supported(&self) -> Result<()> {
        if let Some(name) = self.first_set() {
            track_panic!(ErrorKind::Unsupported, "{} field is not supported", name);
        }
        Ok(())
    }
}

/// Fields of the optional header preceding the time stamps, as they appear on the wire.
#[derive(Debug)]
struct FlagCluster {
    scrambling_control: ScramblingControl,
    priority: bool,
    data_alignment_indicator: bool,
    copyright: bool,
    original_or_copy: bool,
    pts_dts_flags: PtsDtsFlags,
    extension_flags: ExtensionFlags,
    header_data_len: u8,
}
impl FlagCluster {
    fn read_from(reader: &mut BitReader) -> Result<Self> {
        let marker_bits = track!(reader.read_bits::<u8>(2))?;
        track_assert_eq!(marker_bits, MARKER_BITS, ErrorKind::Malformed);
        Ok(FlagCluster {
            scrambling_control: ScramblingControl::from_u8(track!(reader.read_bits::<u8>(2))?),
            priority: track!(reader.read_bit())?,
            data_alignment_indicator: track!(reader.read_bit())?,
            copyright: track!(reader.read_bit())?,
            original_or_copy: track!(reader.read_bit())?,
            pts_dts_flags: PtsDtsFlags::from_u8(track!(reader.read_bits::<u8>(2))?),
            extension_flags: track!(ExtensionFlags::read_from(reader))?,
            header_data_len: track!(reader.read_bits::<u8>(8))?,
        })
    }
}

fn read_start_code(reader: &mut BitReader) -> Result<()> {
    for &expected in &START_CODE_PREFIX {
        let byte = track!(reader.read_bits::<u8>(8))?;
        track_assert_eq!(byte, expected, ErrorKind::Malformed);
    }
    Ok(())
}

fn read_timestamps(
    reader: &mut BitReader,
    flags: PtsDtsFlags,
) -> Result<(Option<Timestamp>, Option<Timestamp>)> {
    match flags {
        PtsDtsFlags::PtsOnly => {
            let pts = track!(Timestamp::read_from(reader, PTS_PREFIX))?;
            Ok((Some(pts), None))
        }
        PtsDtsFlags::PtsAndDts => {
            let pts = track!(Timestamp::read_from(reader, PTS_WITH_DTS_PREFIX))?;
            let dts = track!(Timestamp::read_from(reader, DTS_PREFIX))?;
            Ok((Some(pts), Some(dts)))
        }
        PtsDtsFlags::None | PtsDtsFlags::Forbidden => Ok((None, None)),
    }
}
