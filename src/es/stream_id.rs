use std::fmt;

use crate::{ErrorKind, Result};

/// Stream identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u8);
impl StreamId {
    /// Minimum value of the identifiers for audio streams.
    pub const AUDIO_MIN: u8 = 0xC0;

    /// Maximum value of the identifiers for audio streams.
    pub const AUDIO_MAX: u8 = 0xDF;

    /// Minimum value of the identifiers for video streams.
    pub const VIDEO_MIN: u8 = 0xE0;

    /// Maximum value of the identifiers for video streams.
    pub const VIDEO_MAX: u8 = 0xEF;

    /// `program_stream_map`.
    pub const PROGRAM_STREAM_MAP: u8 = 0xBC;

    /// `private_stream_1`.
    pub const PRIVATE_STREAM_1: u8 = 0xBD;

    /// `padding_stream`.
    pub const PADDING_STREAM: u8 = 0xBE;

    /// `private_stream_2`.
    pub const PRIVATE_STREAM_2: u8 = 0xBF;

    /// `ECM_stream`.
    pub const ECM_STREAM: u8 = 0xF0;

    /// `EMM_stream`.
    pub const EMM_STREAM: u8 = 0xF1;

    /// `DSMCC_stream`.
    pub const DSMCC_STREAM: u8 = 0xF2;

    /// ITU-T Rec. H.222.1 type E stream.
    pub const H222_1_TYPE_E_STREAM: u8 = 0xF8;

    /// `program_stream_directory`.
    pub const PROGRAM_STREAM_DIRECTORY: u8 = 0xFF;

    const AUDIO_MASK: u8 = 0xE0;
    const VIDEO_MASK: u8 = 0xF0;

    /// Makes a new `StreamId` instance.
    pub fn new(id: u8) -> Self {
        StreamId(id)
    }

    /// Makes a new `StreamId` instance for audio stream.
    ///
    /// # Errors
    ///
    /// If `id` is not between `AUDIO_MIN` and `AUDIO_MAX`, it will return an `ErrorKind::Other` error.
    pub fn new_audio(id: u8) -> Result<Self> {
        track_assert!(
            Self::AUDIO_MIN <= id && id <= Self::AUDIO_MAX,
            ErrorKind::Other,
            "Not an audio ID: {}",
            id
        );
        Ok(StreamId(id))
    }

    /// Makes a new `StreamId` instance for video stream.
    ///
    /// # Errors
    ///
    /// If `id` is not between `VIDEO_MIN` and `VIDEO_MAX`, it will return an `ErrorKind::Other` error.
    pub fn new_video(id: u8) -> Result<Self> {
        track_assert!(
            Self::VIDEO_MIN <= id && id <= Self::VIDEO_MAX,
            ErrorKind::Other,
            "Not a video ID: {}",
            id
        );
        Ok(StreamId(id))
    }

    /// Returns the value of the identifier.
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Returns `true` if it is an audio identifier, otherwise `false`.
    pub fn is_audio(&self) -> bool {
        self.0 & Self::AUDIO_MASK == Self::AUDIO_MIN
    }

    /// Returns `true` if it is a video identifier, otherwise `false`.
    pub fn is_video(&self) -> bool {
        self.0 & Self::VIDEO_MASK == Self::VIDEO_MIN
    }

    /// Returns `true` if it is the padding stream identifier, otherwise `false`.
    pub fn is_padding(&self) -> bool {
        self.0 == Self::PADDING_STREAM
    }

    /// Returns `true` if packets of this stream carry the optional PES header
    /// (flags, PTS/DTS and so on), otherwise `false`.
    pub fn has_optional_header(&self) -> bool {
        match self.0 {
            Self::PROGRAM_STREAM_MAP
            | Self::PADDING_STREAM
            | Self::PRIVATE_STREAM_2
            | Self::ECM_STREAM
            | Self::EMM_STREAM
            | Self::PROGRAM_STREAM_DIRECTORY
            | Self::DSMCC_STREAM
            | Self::H222_1_TYPE_E_STREAM => false,
            _ => true,
        }
    }

    /// Returns the category of the stream.
    pub fn kind(&self) -> StreamKind {
        if self.is_audio() {
            StreamKind::Audio
        } else if self.is_video() {
            StreamKind::Video
        } else if self.is_padding() {
            StreamKind::Padding
        } else if !self.has_optional_header() {
            StreamKind::System
        } else {
            StreamKind::Other
        }
    }
}
impl From<u8> for StreamId {
    fn from(f: u8) -> Self {
        StreamId(f)
    }
}
impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Category of an elementary stream, derived from its stream identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// MPEG audio stream (`0xC0..=0xDF`).
    Audio,

    /// MPEG video stream (`0xE0..=0xEF`).
    Video,

    /// Padding stream.
    Padding,

    /// System stream whose packets have no optional PES header
    /// (program stream map, private stream 2, ECM, EMM, DSMCC, etc).
    System,

    /// Any other stream (e.g., private stream 1, ancillary, reserved).
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_and_video_are_mutually_exclusive() {
        for id in 0..=255u8 {
            let id = StreamId::new(id);
            assert!(!(id.is_audio() && id.is_video()), "{}", id);
        }
        for id in 0xC0..=0xDF {
            let id = StreamId::new(id);
            assert!(id.is_audio() && !id.is_video(), "{}", id);
        }
        for id in 0xE0..=0xEF {
            let id = StreamId::new(id);
            assert!(id.is_video() && !id.is_audio(), "{}", id);
        }
        assert!(!StreamId::new(0xF0).is_video());
        assert!(!StreamId::new(0xBF).is_audio());
    }

    #[test]
    fn streams_without_optional_header() {
        let without = [0xBC, 0xBE, 0xBF, 0xF0, 0xF1, 0xF2, 0xF8, 0xFF];
        for id in 0..=255u8 {
            assert_eq!(
                StreamId::new(id).has_optional_header(),
                !without.contains(&id),
                "{:02X}",
                id
            );
        }
    }

    #[test]
    fn kinds() {
        assert_eq!(StreamId::new(0xC3).kind(), StreamKind::Audio);
        assert_eq!(StreamId::new(0xE0).kind(), StreamKind::Video);
        assert_eq!(StreamId::new(0xBE).kind(), StreamKind::Padding);
        assert_eq!(StreamId::new(0xBC).kind(), StreamKind::System);
        assert_eq!(StreamId::new(0xBD).kind(), StreamKind::Other);
    }

    #[test]
    fn checked_constructors() {
        assert!(StreamId::new_audio(0xC0).is_ok());
        assert!(StreamId::new_audio(0xE0).is_err());
        assert!(StreamId::new_video(0xEF).is_ok());
        assert!(StreamId::new_video(0xDF).is_err());
    }
}
