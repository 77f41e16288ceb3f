use crate::bits::BitReader;
use crate::Result;

use super::PesHeader;

/// The `PayloadSink` trait allows for receiving raw elementary stream bytes.
///
/// The bytes passed to a sink may be a fragment of an access unit;
/// reassembling them is up to the implementation.
pub trait PayloadSink {
    /// Feeds elementary stream bytes.
    fn feed_data(&mut self, data: &[u8]);
}
impl PayloadSink for () {
    fn feed_data(&mut self, _data: &[u8]) {}
}
impl PayloadSink for Vec<u8> {
    fn feed_data(&mut self, data: &[u8]) {
        self.extend_from_slice(data);
    }
}
impl<'a, S: PayloadSink + ?Sized> PayloadSink for &'a mut S {
    fn feed_data(&mut self, data: &[u8]) {
        (**self).feed_data(data)
    }
}

/// Body of a decoded PES fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PesBody<'a> {
    /// Elementary stream bytes to be handed to a sink.
    Payload(&'a [u8]),

    /// Number of padding bytes that were consumed and discarded.
    Padding(usize),
}

/// A byte range of a PES packet, decoded but not yet delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PesFragment<'a> {
    /// Header of the packet, present only if the range starts a packet.
    pub header: Option<PesHeader>,

    /// Number of bytes read to decode `header`.
    pub header_len: usize,

    /// The bytes following the header.
    pub body: PesBody<'a>,
}
impl<'a> PesFragment<'a> {
    /// Decodes `bytes`.
    ///
    /// If `has_start_indicator` is `false`, `bytes` is the continuation of a packet
    /// and is returned as payload without being inspected.
    ///
    /// The body of a padding packet is exactly `packet_len` bytes; anything after it is
    /// ignored. For any other packet every byte after the last decoded header field is
    /// payload, including stuffing bytes.
    ///
    /// # Errors
    ///
    /// See [`PesHeader::read_from`]. In addition, a padding packet shorter than its
    /// declared length results in an `ErrorKind::Truncated` error.
    ///
    /// [`PesHeader::read_from`]: ./struct.PesHeader.html#method.read_from
    pub fn decode(bytes: &'a [u8], has_start_indicator: bool) -> Result<Self> {
        if !has_start_indicator {
            return Ok(PesFragment {
                header: None,
                header_len: 0,
                body: PesBody::Payload(bytes),
            });
        }

        let mut reader = BitReader::new(bytes);
        let header = track!(PesHeader::read_from(&mut reader))?;
        let header_len = reader.bytes_consumed();
        let body = if header.stream_id.is_padding() {
            let len = usize::from(header.packet_len);
            track!(reader.skip_bytes(len))?;
            PesBody::Padding(len)
        } else {
            PesBody::Payload(track!(reader.current())?)
        };
        Ok(PesFragment {
            header: Some(header),
            header_len,
            body,
        })
    }
}

/// Result of [`PesPacketParser::parse`].
///
/// [`PesPacketParser::parse`]: ./struct.PesPacketParser.html#method.parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPes {
    /// Header of the packet, present only if the range starts a packet.
    pub header: Option<PesHeader>,

    /// Number of bytes read to decode `header`.
    pub header_len: usize,

    /// Number of bytes handed to the sink.
    pub forwarded: usize,

    /// Number of padding bytes discarded.
    pub discarded: usize,
}

/// Stateless PES packet parser.
///
/// Each call to [`parse`](#method.parse) handles one byte range independently;
/// the only thing kept between calls is the payload sink.
#[derive(Debug)]
pub struct PesPacketParser<S> {
    sink: S,
}
impl<S: PayloadSink> PesPacketParser<S> {
    /// Makes a new `PesPacketParser` instance.
    pub fn new(sink: S) -> Self {
        PesPacketParser { sink }
    }

    /// Returns a reference to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns a mutable reference to the sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Converts `PesPacketParser` into the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Parses `bytes` and forwards its payload to the sink.
    ///
    /// The sink is invoked exactly once unless the packet is a padding packet
    /// or parsing fails, in which case it is not invoked at all.
    pub fn parse(&mut self, bytes: &[u8], has_start_indicator: bool) -> Result<ParsedPes> {
        let fragment = track!(PesFragment::decode(bytes, has_start_indicator))?;
        let (forwarded, discarded) = match fragment.body {
            PesBody::Payload(data) => {
                self.sink.feed_data(data);
                (data.len(), 0)
            }
            PesBody::Padding(len) => (0, len),
        };
        Ok(ParsedPes {
            header: fragment.header,
            header_len: fragment.header_len,
            forwarded,
            discarded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::es::StreamId;
    use crate::ErrorKind;

    #[derive(Default)]
    struct CountingSink {
        calls: usize,
        data: Vec<u8>,
    }
    impl PayloadSink for CountingSink {
        fn feed_data(&mut self, data: &[u8]) {
            self.calls += 1;
            self.data.extend_from_slice(data);
        }
    }

    #[test]
    fn continuation_is_forwarded_as_is() {
        let mut parser = PesPacketParser::new(CountingSink::default());
        let parsed = parser.parse(&[0, 0, 1, 0xE0], false).unwrap();
        assert_eq!(parsed.header, None);
        assert_eq!(parsed.forwarded, 4);
        assert_eq!(parser.sink().calls, 1);
        assert_eq!(parser.sink().data, [0, 0, 1, 0xE0]);
    }

    #[test]
    fn padding_packet_is_discarded() {
        let bytes = [0, 0, 1, 0xBE, 0, 3, 0xFF, 0xFF, 0xFF, 0x47];
        let mut parser = PesPacketParser::new(CountingSink::default());
        let parsed = parser.parse(&bytes, true).unwrap();
        assert_eq!(parsed.discarded, 3);
        assert_eq!(parsed.forwarded, 0);
        assert_eq!(parser.sink().calls, 0);

        let e = parser.parse(&bytes[..8], true).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::Truncated);
        assert_eq!(parser.sink().calls, 0);
    }

    #[test]
    fn zero_length_padding_packet() {
        let bytes = [0, 0, 1, 0xBE, 0, 0, 0xFF];
        let fragment = PesFragment::decode(&bytes, true).unwrap();
        assert_eq!(fragment.body, PesBody::Padding(0));
        assert_eq!(fragment.header_len, PesHeader::FIXED_LEN);
    }

    #[test]
    fn system_stream_skips_flag_cluster() {
        let bytes = [0, 0, 1, 0xBC, 0, 4, 0x12, 0x34, 0x56, 0x78];
        let mut parser = PesPacketParser::new(Vec::new());
        let parsed = parser.parse(&bytes, true).unwrap();
        let header = parsed.header.unwrap();
        assert_eq!(header.stream_id, StreamId::new(StreamId::PROGRAM_STREAM_MAP));
        assert_eq!(header.optional_header, None);
        assert_eq!(parsed.header_len, 6);
        assert_eq!(parser.into_sink(), [0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn failed_parse_does_not_feed_sink() {
        let bytes = [0, 0, 1, 0xE0, 0, 0, 0x40, 0x00, 0x00, 0xAA];
        let mut parser = PesPacketParser::new(CountingSink::default());
        let e = parser.parse(&bytes, true).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::Malformed);
        assert_eq!(parser.sink().calls, 0);
    }
}
