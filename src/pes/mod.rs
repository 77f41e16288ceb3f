//! Packetized elementary stream.
//!
//! # References
//!
//! - [Packetized elementary stream](https://en.wikipedia.org/wiki/Packetized_elementary_stream)
pub use self::decoder::PesStreamDecoder;
pub use self::header::{ExtensionFlags, OptionalHeader, PesHeader, PtsDtsFlags, ScramblingControl};
pub use self::parser::{ParsedPes, PayloadSink, PesBody, PesFragment, PesPacketParser};

mod decoder;
mod header;
mod parser;

#[derive(Debug)]
struct PartialPesPacket {
    header: PesHeader,
    data_len: Option<usize>,
    received: usize,
}
impl PartialPesPacket {
    fn is_complete(&self) -> bool {
        self.data_len == Some(self.received)
    }
}
