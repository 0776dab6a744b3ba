//! Caller-side helpers for measurement record streams.
//!
//! Builds on the public `mrec_core` reader API to turn a whole stream into
//! owned bit vectors, which is what most consumers of sampled data want when
//! the stream fits in memory.

/// Whole-stream decoding into per-record bit vectors.
///
/// Drives a `MeasureRecordReader` through every record of a stream and
/// collects the bits with `bitvec`, attaching the record index to any
/// decoding error.
pub mod records;

pub use records::{read_records, slice_shots};
