use super::{StreamId, StreamKind};

/// Information about a newly found elementary stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Identifier carried in the PES header.
    pub stream_id: StreamId,

    /// Declared packet length of the first packet seen (`0` means unbounded).
    pub first_packet_len: u16,
}

/// The `StreamCallback` trait allows for being notified of newly found elementary streams.
pub trait StreamCallback {
    /// Called once for each stream identifier the first time it is seen.
    fn on_stream_found(&mut self, kind: StreamKind, info: &StreamInfo);
}
impl StreamCallback for () {
    fn on_stream_found(&mut self, _kind: StreamKind, _info: &StreamInfo) {}
}
impl<'a, C: StreamCallback + ?Sized> StreamCallback for &'a mut C {
    fn on_stream_found(&mut self, kind: StreamKind, info: &StreamInfo) {
        (**self).on_stream_found(kind, info)
    }
}
