//! The record reader contract and its format dispatch.
//!
//! Every input format decodes into the same shape: a sequence of records, each
//! holding up to `bits_per_record` bits. `RecordReader` is the contract the
//! caller drives (`read_bit`/`read_bytes` until end-of-record, then
//! `next_record`), and `MeasureRecordReader` is the closed set of formats a
//! caller can pick at runtime.

use crate::config::ReaderConfig;
use crate::error::{RecordError, Result};
use crate::format_01::Format01Reader;
use crate::format_b8::FormatB8Reader;
use crate::format_dets::FormatDetsReader;
use crate::format_hits::FormatHitsReader;
use crate::format_r8::FormatR8Reader;
use mrec_common::{ResultType, SampleFormat};
use std::io::BufRead;
use tracing::debug;

/// Position of a reader within its current record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordCursor {
    position: usize,
    bits_per_record: usize,
}

impl RecordCursor {
    /// Creates a cursor at the start of a record of the given length.
    ///
    /// Fails when the length does not fit in `isize`.
    pub fn new(bits_per_record: usize) -> Result<Self> {
        if bits_per_record > isize::MAX as usize {
            return Err(RecordError::Configuration(format!(
                "Record size {} bits is too big",
                bits_per_record
            )));
        }
        Ok(Self {
            position: 0,
            bits_per_record,
        })
    }

    /// Bits already produced for the current record.
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Declared record length.
    #[inline(always)]
    pub fn bits_per_record(&self) -> usize {
        self.bits_per_record
    }

    /// Bits left before the declared record length is reached.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.bits_per_record - self.position
    }

    /// True once the declared length has been produced.
    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.position >= self.bits_per_record
    }

    #[inline(always)]
    pub(crate) fn advance(&mut self, bits: usize) {
        self.position += bits;
    }

    #[inline(always)]
    pub(crate) fn rewind(&mut self) {
        self.position = 0;
    }

    /// Fails with `EndOfRecord` once the declared length has been produced.
    #[inline(always)]
    pub(crate) fn ensure_not_full(&self) -> Result<()> {
        if self.is_full() {
            Err(RecordError::EndOfRecord)
        } else {
            Ok(())
        }
    }
}

/// Reads measurement records one bit or one byte at a time.
///
/// Implementations keep their own decode state and borrow the input stream
/// for their whole lifetime. Errors are terminal: after any `Err` the reader
/// must not be used again.
pub trait RecordReader {
    /// The cursor tracking progress through the current record.
    fn cursor(&self) -> &RecordCursor;

    /// Reads the next bit of the current record.
    ///
    /// Fails with `EndOfRecord` when the record has ended, or `EndOfStream`
    /// when the stream runs dry before the record is complete.
    fn read_bit(&mut self) -> Result<bool>;

    /// Skips the rest of the current record and any record terminator.
    ///
    /// # Returns
    ///
    /// `true` if another record follows, `false` at end of stream.
    fn next_record(&mut self) -> Result<bool>;

    /// Returns true when the stream holds nothing past the current record.
    fn is_end_of_file(&mut self) -> Result<bool>;

    /// Fills `buf` with up to `buf.len() * 8` bits, least significant bit
    /// first, stopping at end-of-record.
    ///
    /// # Returns
    ///
    /// The number of bits written. Bits of the final byte past that count are
    /// unspecified.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        read_bytes_bitwise(self, buf)
    }

    /// Returns true when no further bit can be read from the current record.
    fn is_end_of_record(&mut self) -> Result<bool> {
        Ok(self.cursor().is_full())
    }

    /// The DETS tag of the segment being read. Untagged formats report `M`.
    fn current_result_type(&self) -> ResultType {
        ResultType::Measurement
    }

    /// Declared record length.
    fn bits_per_record(&self) -> usize {
        self.cursor().bits_per_record()
    }

    /// Bits produced so far in the current record.
    fn position(&self) -> usize {
        self.cursor().position()
    }
}

/// Byte filling built from single-bit reads.
///
/// Each touched byte is zeroed before its bits are OR-ed in. Formats with a
/// faster native path fall back to this once their state is no longer byte
/// aligned.
pub fn read_bytes_bitwise<T: RecordReader + ?Sized>(reader: &mut T, buf: &mut [u8]) -> Result<usize> {
    if reader.is_end_of_record()? {
        return Ok(0);
    }
    let mut n = 0;
    for byte in buf.iter_mut() {
        *byte = 0;
        for k in 0..8 {
            *byte |= (reader.read_bit()? as u8) << k;
            n += 1;
            if reader.is_end_of_record()? {
                return Ok(n);
            }
        }
    }
    Ok(n)
}

/// A reader for any record-by-record format, chosen at runtime.
///
/// Built by `MeasureRecordReader::new` from a `ReaderConfig`. Every
/// `RecordReader` method is forwarded to the wrapped format reader.
pub enum MeasureRecordReader<'a, R: BufRead + ?Sized> {
    /// ASCII `'0'`/`'1'` lines.
    Format01(Format01Reader<'a, R>),
    /// Packed LSB-first bytes.
    B8(FormatB8Reader<'a, R>),
    /// Run-length encoded gaps.
    R8(FormatR8Reader<'a, R>),
    /// Comma-separated hit indices.
    Hits(FormatHitsReader<'a, R>),
    /// Tagged `shot` lines.
    Dets(FormatDetsReader<'a, R>),
}

macro_rules! dispatch {
    ($self:expr, $reader:ident => $body:expr) => {
        match $self {
            MeasureRecordReader::Format01($reader) => $body,
            MeasureRecordReader::B8($reader) => $body,
            MeasureRecordReader::R8($reader) => $body,
            MeasureRecordReader::Hits($reader) => $body,
            MeasureRecordReader::Dets($reader) => $body,
        }
    };
}

impl<'a, R: BufRead + ?Sized> MeasureRecordReader<'a, R> {
    /// Builds the reader matching `config.format` over a borrowed stream.
    ///
    /// # Arguments
    ///
    /// * `input` - Stream positioned at the first record
    /// * `config` - Format and record length; validated before any byte is read
    ///
    /// # Returns
    ///
    /// The reader, or `Configuration` for invalid parameters (including a
    /// DETS stream that does not start a record).
    pub fn new(input: &'a mut R, config: &ReaderConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            format = %config.format,
            bits_per_record = config.bits_per_record,
            n_detection_events = config.n_detection_events,
            n_logical_observables = config.n_logical_observables,
            "Creating measurement record reader"
        );

        let bits = config.bits_per_record;
        let reader = match config.format {
            SampleFormat::Format01 => Self::Format01(Format01Reader::new(input, bits)?),
            SampleFormat::B8 => Self::B8(FormatB8Reader::new(input, bits)?),
            SampleFormat::R8 => Self::R8(FormatR8Reader::new(input, bits)?),
            SampleFormat::Hits => Self::Hits(FormatHitsReader::new(input, bits)?),
            SampleFormat::Dets => Self::Dets(FormatDetsReader::new(
                input,
                bits,
                config.n_detection_events,
                config.n_logical_observables,
            )?),
            SampleFormat::Ptb64 => {
                return Err(RecordError::Configuration(
                    "Format ptb64 is incompatible with single-record reading".to_string(),
                ));
            }
        };
        Ok(reader)
    }

    /// The format this reader decodes.
    pub fn format(&self) -> SampleFormat {
        match self {
            Self::Format01(_) => SampleFormat::Format01,
            Self::B8(_) => SampleFormat::B8,
            Self::R8(_) => SampleFormat::R8,
            Self::Hits(_) => SampleFormat::Hits,
            Self::Dets(_) => SampleFormat::Dets,
        }
    }
}

impl<R: BufRead + ?Sized> RecordReader for MeasureRecordReader<'_, R> {
    fn cursor(&self) -> &RecordCursor {
        dispatch!(self, r => r.cursor())
    }

    fn read_bit(&mut self) -> Result<bool> {
        dispatch!(self, r => r.read_bit())
    }

    fn next_record(&mut self) -> Result<bool> {
        dispatch!(self, r => r.next_record())
    }

    fn is_end_of_file(&mut self) -> Result<bool> {
        dispatch!(self, r => r.is_end_of_file())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        dispatch!(self, r => r.read_bytes(buf))
    }

    fn is_end_of_record(&mut self) -> Result<bool> {
        dispatch!(self, r => r.is_end_of_record())
    }

    fn current_result_type(&self) -> ResultType {
        dispatch!(self, r => r.current_result_type())
    }
}
