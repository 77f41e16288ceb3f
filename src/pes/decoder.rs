use std::collections::HashSet;
use std::env;

use crate::es::{StreamCallback, StreamId, StreamInfo};
use crate::{ErrorKind, Result};

use super::{PartialPesPacket, PayloadSink, PesBody, PesFragment, PesHeader};

const PES_IGNORE_PACKET_LENGTH: &str = "PES_IGNORE_PACKET_LENGTH";

/// Per elementary stream PES decoder.
///
/// Unlike [`PesPacketParser`], this keeps the header of the packet in progress
/// so that continuation fragments are handled according to it.
/// One instance is meant to be owned by whoever demultiplexes a single elementary stream.
///
/// If the `PES_IGNORE_PACKET_LENGTH` environment variable is `true`,
/// declared packet lengths are ignored and every packet is treated as unbounded.
///
/// [`PesPacketParser`]: ./struct.PesPacketParser.html
#[derive(Debug)]
pub struct PesStreamDecoder<S, C = ()> {
    sink: S,
    callback: C,
    partial: Option<PartialPesPacket>,
    known_streams: HashSet<StreamId>,
    ignore_packet_length: bool,
}
impl<S: PayloadSink> PesStreamDecoder<S> {
    /// Makes a new `PesStreamDecoder` instance.
    pub fn new(sink: S) -> Self {
        Self::with_callback(sink, ())
    }
}
impl<S: PayloadSink, C: StreamCallback> PesStreamDecoder<S, C> {
    /// Makes a new `PesStreamDecoder` instance that notifies `callback` of new streams.
    pub fn with_callback(sink: S, callback: C) -> Self {
        let ignore_packet_length = env::var(PES_IGNORE_PACKET_LENGTH)
            .unwrap_or_else(|_| "false".into())
            .to_lowercase()
            == "true";
        PesStreamDecoder {
            sink,
            callback,
            partial: None,
            known_streams: HashSet::new(),
            ignore_packet_length,
        }
    }

    /// Sets whether declared packet lengths are ignored.
    pub fn ignore_packet_length(mut self, ignore: bool) -> Self {
        self.ignore_packet_length = ignore;
        self
    }

    /// Returns a reference to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns a reference to the stream callback.
    pub fn callback(&self) -> &C {
        &self.callback
    }

    /// Converts `PesStreamDecoder` into the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Returns the header of the packet in progress.
    pub fn current_header(&self) -> Option<&PesHeader> {
        self.partial.as_ref().map(|p| &p.header)
    }

    /// Returns `true` if the packet in progress has a declared length and
    /// all of its bytes have been received.
    pub fn is_complete(&self) -> bool {
        self.partial.as_ref().map_or(false, |p| p.is_complete())
    }

    /// Processes a byte range of the stream.
    ///
    /// Returns the number of bytes forwarded to the sink.
    ///
    /// Continuation ranges that arrive while no packet is in progress are dropped,
    /// as are ranges that would overflow the declared length of the packet in progress.
    /// In the latter case the packet is abandoned.
    pub fn push(&mut self, bytes: &[u8], has_start_indicator: bool) -> Result<usize> {
        if has_start_indicator {
            track!(self.handle_packet_start(bytes))
        } else {
            Ok(self.handle_continuation(bytes))
        }
    }

    fn handle_packet_start(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut fragment = track!(PesFragment::decode(bytes, true))?;
        let header = track_assert_some!(fragment.header.take(), ErrorKind::Other);
        if !self.ignore_packet_length && header.packet_len != 0 {
            track_assert!(
                usize::from(header.packet_len) >= header.optional_header_len(),
                ErrorKind::Malformed,
                "packet_len={}, optional_header_len={}",
                header.packet_len,
                header.optional_header_len()
            );
        }

        if let Some(pred) = self.partial.take() {
            if pred.data_len.is_some() && !pred.is_complete() {
                log::debug!(
                    "Unexpected PES packet start: stream_id={}, received={}, expected={:?}",
                    pred.header.stream_id,
                    pred.received,
                    pred.data_len
                );
            }
        }
        if self.known_streams.insert(header.stream_id) {
            let info = StreamInfo {
                stream_id: header.stream_id,
                first_packet_len: header.packet_len,
            };
            log::debug!("Found new stream: {:?}", info);
            self.callback.on_stream_found(header.stream_id.kind(), &info);
        }

        let (data_len, data) = match fragment.body {
            PesBody::Padding(len) => (Some(len), None),
            PesBody::Payload(data) if self.ignore_packet_length => (None, Some(data)),
            PesBody::Payload(data) => (header.payload_len(), Some(data)),
        };
        self.partial = Some(PartialPesPacket {
            header,
            data_len,
            received: if data.is_none() { data_len.unwrap_or(0) } else { 0 },
        });
        Ok(data.map_or(0, |data| self.forward(data)))
    }

    fn handle_continuation(&mut self, bytes: &[u8]) -> usize {
        let is_padding = match self.partial {
            None => {
                log::trace!("Dropped PES continuation without header: {} bytes", bytes.len());
                return 0;
            }
            Some(ref partial) => partial.header.stream_id.is_padding(),
        };
        if is_padding {
            log::trace!("Discarded {} padding bytes", bytes.len());
            0
        } else {
            self.forward(bytes)
        }
    }

    fn forward(&mut self, data: &[u8]) -> usize {
        let overflow = match self.partial {
            Some(ref mut partial) => {
                let received = partial.received + data.len();
                match partial.data_len {
                    Some(expected) if received > expected => Some((received, expected)),
                    _ => {
                        partial.received = received;
                        None
                    }
                }
            }
            None => return 0,
        };
        if let Some((actual, expected)) = overflow {
            log::trace!(
                "Too large PES packet data: actual={}, expected={}",
                actual,
                expected
            );
            self.partial = None;
            return 0;
        }
        self.sink.feed_data(data);
        data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::es::StreamKind;
    use crate::pes::OptionalHeader;
    use crate::time::Timestamp;

    impl StreamCallback for Vec<(StreamKind, StreamInfo)> {
        fn on_stream_found(&mut self, kind: StreamKind, info: &StreamInfo) {
            self.push((kind, info.clone()));
        }
    }

    fn packet_start(stream_id: u8, packet_len: u16, payload: &[u8]) -> Vec<u8> {
        let stream_id = StreamId::new(stream_id);
        let optional_header = if stream_id.has_optional_header() {
            let pts = Timestamp::new(3600).unwrap();
            Some(OptionalHeader::with_timestamps(Some(pts), None))
        } else {
            None
        };
        let header = PesHeader {
            stream_id,
            packet_len,
            optional_header,
        };
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn reassembles_bounded_packet() {
        let mut decoder = PesStreamDecoder::new(Vec::new()).ignore_packet_length(false);
        let start = packet_start(0xE0, 8 + 6, &[1, 2, 3]);
        assert_eq!(decoder.push(&start, true).unwrap(), 3);
        assert!(!decoder.is_complete());
        assert_eq!(decoder.push(&[4, 5, 6], false).unwrap(), 3);
        assert!(decoder.is_complete());
        assert_eq!(decoder.current_header().unwrap().pts().unwrap().as_u64(), 3600);
        assert_eq!(decoder.into_sink(), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn overflowing_continuation_is_dropped() {
        let mut decoder = PesStreamDecoder::new(Vec::new()).ignore_packet_length(false);
        let start = packet_start(0xC0, 8 + 2, &[1]);
        assert_eq!(decoder.push(&start, true).unwrap(), 1);
        assert_eq!(decoder.push(&[2, 3], false).unwrap(), 0);
        assert!(decoder.current_header().is_none());
        assert_eq!(decoder.push(&[4], false).unwrap(), 0);
        assert_eq!(decoder.into_sink(), [1]);
    }

    #[test]
    fn ignoring_packet_length() {
        let mut decoder = PesStreamDecoder::new(Vec::new()).ignore_packet_length(true);
        let start = packet_start(0xC0, 8 + 1, &[1]);
        decoder.push(&start, true).unwrap();
        assert_eq!(decoder.push(&[2, 3], false).unwrap(), 2);
        assert!(!decoder.is_complete());
    }

    #[test]
    fn unbounded_packet() {
        let mut decoder = PesStreamDecoder::new(Vec::new()).ignore_packet_length(false);
        let start = packet_start(0xE0, 0, &[1, 2]);
        decoder.push(&start, true).unwrap();
        assert_eq!(decoder.push(&[0; 100], false).unwrap(), 100);
        assert!(!decoder.is_complete());
        assert_eq!(decoder.sink().len(), 102);
    }

    #[test]
    fn continuation_without_start_is_dropped() {
        let mut decoder = PesStreamDecoder::new(Vec::new());
        assert_eq!(decoder.push(&[1, 2, 3], false).unwrap(), 0);
        assert!(decoder.sink().is_empty());
    }

    #[test]
    fn padding_continuation_is_discarded() {
        let mut decoder = PesStreamDecoder::new(Vec::new());
        let start = packet_start(StreamId::PADDING_STREAM, 2, &[0xFF, 0xFF]);
        assert_eq!(decoder.push(&start, true).unwrap(), 0);
        assert!(decoder.is_complete());
        assert_eq!(decoder.push(&[0xFF; 4], false).unwrap(), 0);
        assert!(decoder.sink().is_empty());
    }

    #[test]
    fn notifies_new_streams_once() {
        let mut found = Vec::new();
        {
            let mut decoder = PesStreamDecoder::with_callback((), &mut found);
            decoder.push(&packet_start(0xE0, 0, &[]), true).unwrap();
            decoder.push(&packet_start(0xE0, 0, &[]), true).unwrap();
            decoder.push(&packet_start(StreamId::PROGRAM_STREAM_MAP, 1, &[0]), true).unwrap();
        }
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, StreamKind::Video);
        assert_eq!(found[0].1.stream_id, StreamId::new(0xE0));
        assert_eq!(found[1].0, StreamKind::System);
        assert_eq!(found[1].1.first_packet_len, 1);
    }

    #[test]
    fn packet_len_must_cover_optional_header() {
        let mut decoder = PesStreamDecoder::new(Vec::new()).ignore_packet_length(false);
        let e = decoder
            .push(&[0, 0, 1, 0xE0, 0, 2, 0x80, 0x00, 0x00, 0xAA], true)
            .err()
            .unwrap();
        assert_eq!(*e.kind(), ErrorKind::Malformed);
        assert!(decoder.current_header().is_none());
        assert!(decoder.sink().is_empty());

        assert_eq!(decoder.push(&[0, 0, 1, 0xE0, 0, 3, 0x80, 0x00, 0x00], true).unwrap(), 0);
        assert!(decoder.is_complete());
        assert!(decoder.push(&[0, 0, 1, 0xE0, 0, 1, 0x80, 0x00, 0x00], true).is_err());
        assert_eq!(decoder.current_header().unwrap().packet_len, 3);

        let mut decoder = PesStreamDecoder::new(Vec::new()).ignore_packet_length(true);
        let start = [0, 0, 1, 0xE0, 0, 2, 0x80, 0x00, 0x00, 0xAA];
        assert_eq!(decoder.push(&start, true).unwrap(), 1);
    }

    #[test]
    fn failed_start_keeps_previous_state() {
        let mut decoder = PesStreamDecoder::new(Vec::new()).ignore_packet_length(false);
        decoder.push(&packet_start(0xE0, 0, &[]), true).unwrap();
        assert!(decoder.push(&[0, 0, 2, 0xE0], true).is_err());
        assert!(decoder.current_header().is_some());
    }
}
