//! MPEG-2 Packetized Elementary Stream (PES) header decoding library.
//!
//! # References
//!
//! - [ISO/IEC 13818-1](https://www.iso.org/standard/75928.html) (2.4.3.6 PES packet)
//! - [Packetized elementary stream](https://en.wikipedia.org/wiki/Packetized_elementary_stream)
#![warn(missing_docs)]
extern crate byteorder;
extern crate log;
#[macro_use]
extern crate trackable;

pub use crate::error::{Error, ErrorKind};

pub mod bits;
pub mod es;
pub mod pes;
pub mod time;

mod error;

/// This crate specific `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
