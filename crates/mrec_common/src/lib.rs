//! Common definitions shared across the measurement record decoding system.
//!
//! This crate provides the sample format vocabulary, the result type tags used
//! by the tagged DETS format, and the wire-level constants that every format
//! variant and caller-side helper agree on.

#![no_std]

use core::fmt;
use core::str::FromStr;

// Wire-level constants for the supported record encodings.
//
// These values are fixed by the producers of measurement data (samplers and
// detector simulators) and must not change independently of them.
pub mod wire {
    /// Terminates a record in the line-oriented formats (01, HITS, DETS).
    pub const RECORD_SEPARATOR: u8 = b'\n';

    /// Separates consecutive hit indices within a HITS record.
    pub const HITS_SEPARATOR: u8 = b',';

    /// Separates consecutive tagged indices within a DETS record.
    pub const DETS_SEPARATOR: u8 = b' ';

    /// Keyword opening every DETS record.
    ///
    /// A DETS stream is a sequence of lines, each beginning with this keyword
    /// followed by zero or more space-prefixed `<type><index>` tokens.
    pub const DETS_SHOT_KEYWORD: &[u8] = b"shot";

    /// R8 descriptor byte meaning "255 more zeros, run continues".
    ///
    /// Any other byte value `r` adds `r` zeros and closes the run with a
    /// single implicit one-bit.
    pub const R8_CONTINUATION: u8 = 0xFF;
}

/// Encoding used by a stream of measurement records.
///
/// Mirrors the sample formats emitted by the simulator front end. Every
/// variant except `Ptb64` can be decoded record by record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// ASCII `'0'`/`'1'` characters, one record per line.
    Format01,

    /// Packed bits, eight per byte, least significant bit first.
    ///
    /// The whole stream is a single record.
    B8,

    /// Bit-transposed 64-shot blocks.
    ///
    /// Only meaningful for bulk table transfers; it has no record-by-record
    /// reading order and is rejected by the reader factory.
    Ptb64,

    /// Comma-separated ascending indices of set bits, one record per line.
    Hits,

    /// Run-length encoded gaps between set bits.
    ///
    /// The whole stream is a single record.
    R8,

    /// `shot` lines holding space-separated `M`/`D`/`L` tagged indices.
    Dets,
}

impl SampleFormat {
    /// All formats in their canonical order.
    pub const ALL: [SampleFormat; 6] = [
        SampleFormat::Format01,
        SampleFormat::B8,
        SampleFormat::Ptb64,
        SampleFormat::Hits,
        SampleFormat::R8,
        SampleFormat::Dets,
    ];

    /// Returns the canonical lowercase name (`"01"`, `"b8"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            SampleFormat::Format01 => "01",
            SampleFormat::B8 => "b8",
            SampleFormat::Ptb64 => "ptb64",
            SampleFormat::Hits => "hits",
            SampleFormat::R8 => "r8",
            SampleFormat::Dets => "dets",
        }
    }

    /// Returns true when a stream in this format holds exactly one record.
    pub fn is_single_record(self) -> bool {
        matches!(self, SampleFormat::B8 | SampleFormat::R8)
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a format name does not match any known sample format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownSampleFormat;

impl fmt::Display for UnknownSampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown sample format, expected one of 01, b8, ptb64, hits, r8, dets")
    }
}

impl FromStr for SampleFormat {
    type Err = UnknownSampleFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleFormat::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or(UnknownSampleFormat)
    }
}

/// Kind of result a DETS index refers to.
///
/// Readers of untagged formats always report `Measurement`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultType {
    /// A raw measurement result, tagged `M`.
    #[default]
    Measurement = b'M',

    /// A detection event, tagged `D`.
    Detector = b'D',

    /// A logical observable flip, tagged `L`.
    Observable = b'L',
}

impl ResultType {
    /// Maps a DETS tag byte to its result type.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'M' => Some(ResultType::Measurement),
            b'D' => Some(ResultType::Detector),
            b'L' => Some(ResultType::Observable),
            _ => None,
        }
    }

    /// The single-character tag written before each DETS index.
    pub fn tag(self) -> char {
        self as u8 as char
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
