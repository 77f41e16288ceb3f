//! Elementary stream identification.
pub use self::callback::{StreamCallback, StreamInfo};
pub use self::stream_id::{StreamId, StreamKind};

mod callback;
mod stream_id;
