//! Decoding of measurement record streams.
//!
//! A measurement record is a fixed-length sequence of result bits produced by
//! sampling a circuit. This crate reads such records back from any of the
//! record-by-record sample formats (01, B8, R8, HITS and DETS) through one
//! reader contract. The caller owns the input stream and the output storage;
//! readers only borrow the stream and hold the decode state of one record.

/// Reader construction parameters and their validation.
///
/// Rejects format/record-size combinations that no reader can honor before
/// any input is consumed.
pub mod config;

/// Error type shared by every reader.
pub mod error;

/// Dense ASCII `'0'`/`'1'` records, newline delimited.
pub mod format_01;

/// Packed LSB-first binary records with a byte-aligned bulk path.
pub mod format_b8;

/// `shot` lines of `M`/`D`/`L` tagged indices.
pub mod format_dets;

/// Comma-separated lists of set-bit indices, newline delimited.
pub mod format_hits;

/// Run-length encoded gaps between set bits, with a zero-byte fast path.
pub mod format_r8;

/// Geometric-gap sampler for sparse error locations.
///
/// Produces the same kind of ascending hit lists the sparse formats encode,
/// without drawing one random number per trial.
pub mod rare_error;

/// The reader contract and runtime format dispatch.
///
/// Defines the operations every format implements (bit reads, byte reads,
/// record advancing and end checks) and the factory that maps a
/// `ReaderConfig` onto a concrete format reader.
pub mod reader;

/// Borrowed byte source the readers decode from.
pub mod stream;

mod text;

pub use config::ReaderConfig;
pub use error::{RecordError, Result};
pub use mrec_common::{ResultType, SampleFormat};
pub use reader::{MeasureRecordReader, RecordCursor, RecordReader, read_bytes_bitwise};
pub use stream::ByteStream;
