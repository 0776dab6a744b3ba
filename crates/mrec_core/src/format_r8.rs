//! Run-length encoded records.
//!
//! Each descriptor byte `r < 0xFF` stands for `r` zeros followed by a single
//! one; `0xFF` adds 255 zeros and continues the run. The one closing a run is
//! emitted lazily, at the start of the next descriptor, so the final one of a
//! stream (which sits just past the end of the record) is never produced.
//! The whole stream is one record.

use crate::error::{RecordError, Result};
use crate::reader::{RecordCursor, RecordReader};
use crate::stream::ByteStream;
use mrec_common::wire::R8_CONTINUATION;
use std::io::BufRead;
use tracing::trace;

/// Reader for the run-length `r8` format.
///
/// Tracks the current run as a count of zeros plus an optional leading one,
/// together with how much of each has been emitted. `read_bytes` writes
/// whole zero bytes without going through `read_bit` while the run has at
/// least eight zeros left and no one is pending.
pub struct FormatR8Reader<'a, R: BufRead + ?Sized> {
    stream: ByteStream<'a, R>,
    cursor: RecordCursor,
    run_length_0s: usize,
    run_length_1s: usize,
    generated_0s: usize,
    generated_1s: usize,
}

impl<'a, R: BufRead + ?Sized> FormatR8Reader<'a, R> {
    /// Opens a reader and loads the first run descriptor.
    ///
    /// An empty stream is accepted and decodes as an empty record.
    pub fn new(input: &'a mut R, bits_per_record: usize) -> Result<Self> {
        let mut reader = Self {
            stream: ByteStream::new(input),
            cursor: RecordCursor::new(bits_per_record)?,
            run_length_0s: 0,
            run_length_1s: 0,
            generated_0s: 0,
            generated_1s: 0,
        };
        // The first run has no preceding descriptor, so no leading one.
        reader.update_run_length()?;
        reader.run_length_1s = 0;
        Ok(reader)
    }

    /// Loads the next run descriptor. Returns false at end of stream.
    fn update_run_length(&mut self) -> Result<bool> {
        let Some(mut r) = self.stream.read_byte()? else {
            return Ok(false);
        };
        self.run_length_0s = 0;
        loop {
            if r != R8_CONTINUATION {
                self.run_length_0s += r as usize;
                break;
            }
            self.run_length_0s += R8_CONTINUATION as usize;
            match self.stream.read_byte()? {
                Some(next) => r = next,
                None => break,
            }
        }
        self.run_length_1s = 1;
        self.generated_0s = 0;
        self.generated_1s = 0;
        trace!(run_length_0s = self.run_length_0s, "R8 run descriptor");
        Ok(true)
    }

    #[inline(always)]
    fn one_pending(&self) -> bool {
        self.generated_1s < self.run_length_1s
    }
}

impl<R: BufRead + ?Sized> RecordReader for FormatR8Reader<'_, R> {
    fn cursor(&self) -> &RecordCursor {
        &self.cursor
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.cursor.is_full() {
            return Ok(0);
        }
        let mut n = 0;
        for byte in buf.iter_mut() {
            if !self.one_pending()
                && self.run_length_0s >= self.generated_0s + 8
                && self.cursor.remaining() >= 8
            {
                *byte = 0;
                self.cursor.advance(8);
                self.generated_0s += 8;
                n += 8;
                continue;
            }
            *byte = 0;
            for k in 0..8 {
                if self.is_end_of_record()? {
                    return Ok(n);
                }
                *byte |= (self.read_bit()? as u8) << k;
                n += 1;
            }
        }
        Ok(n)
    }

    fn read_bit(&mut self) -> Result<bool> {
        self.cursor.ensure_not_full()?;
        if self.one_pending() {
            self.generated_1s += 1;
            self.cursor.advance(1);
            return Ok(true);
        }
        if self.generated_0s < self.run_length_0s {
            self.generated_0s += 1;
            self.cursor.advance(1);
            return Ok(false);
        }
        if !self.update_run_length()? {
            return Err(RecordError::EndOfStream);
        }
        self.generated_1s += 1;
        self.cursor.advance(1);
        Ok(true)
    }

    fn next_record(&mut self) -> Result<bool> {
        self.cursor.rewind();
        Ok(false)
    }

    fn is_end_of_record(&mut self) -> Result<bool> {
        if self.cursor.is_full() {
            return Ok(true);
        }
        if self.generated_0s < self.run_length_0s || self.one_pending() {
            return Ok(false);
        }
        Ok(!self.update_run_length()?)
    }

    fn is_end_of_file(&mut self) -> Result<bool> {
        Ok(!self.one_pending()
            && self.generated_0s >= self.run_length_0s
            && self.stream.at_end()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_runs() {
        // |-0xF8-|0|-0xF8-|1|
        let mut input: &[u8] = &[3, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0];
        let mut reader = FormatR8Reader::new(&mut input, 18).unwrap();
        assert!(!reader.is_end_of_record().unwrap());

        let mut bytes = [0u8];
        assert_eq!(reader.read_bytes(&mut bytes).unwrap(), 8);
        assert_eq!(bytes[0], 0xF8);
        assert!(!reader.read_bit().unwrap());
        assert_eq!(reader.read_bytes(&mut bytes).unwrap(), 8);
        assert_eq!(bytes[0], 0xF8);
        assert!(reader.read_bit().unwrap());
        assert!(reader.is_end_of_record().unwrap());
    }

    #[test]
    fn long_gap_uses_zero_byte_fast_path() {
        let mut input: &[u8] = b"\xFF\xFF\x02\x20";
        let mut reader = FormatR8Reader::new(&mut input, 545).unwrap();
        let mut bytes = [1, 2, 3, 4, 5, 6, 7, 8];
        for _ in 0..8 {
            assert_eq!(reader.read_bytes(&mut bytes).unwrap(), 64);
            assert_eq!(bytes, [0; 8]);
            bytes = [123; 8];
        }
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bytes(&mut bytes[..4]).unwrap(), 32);
        assert_eq!(&bytes[..4], &[0; 4]);
        assert!(reader.is_end_of_record().unwrap());
        assert!(reader.is_end_of_file().unwrap());
    }

    #[test]
    fn limit_stops_read_bytes() {
        let mut input: &[u8] = &[1, 0, 0, 0, 0, 0, 0, 0];
        let mut reader = FormatR8Reader::new(&mut input, 5).unwrap();
        let mut bytes = [0u8];
        assert_eq!(reader.read_bytes(&mut bytes).unwrap(), 5);
        assert_eq!(bytes[0], 0x1E);
        assert!(reader.is_end_of_record().unwrap());
    }

    #[test]
    fn stream_exhaustion_ends_record_early() {
        let mut input: &[u8] = &[2];
        let mut reader = FormatR8Reader::new(&mut input, 10).unwrap();
        assert!(!reader.read_bit().unwrap());
        assert!(!reader.read_bit().unwrap());
        assert!(reader.is_end_of_record().unwrap());
        assert!(matches!(reader.read_bit(), Err(RecordError::EndOfStream)));
    }

    #[test]
    fn prefetched_one_is_not_skipped_by_fast_path() {
        let mut input: &[u8] = &[0, 20, 0];
        let mut reader = FormatR8Reader::new(&mut input, 21).unwrap();
        // Pulls the second descriptor, leaving its leading one pending.
        assert!(!reader.is_end_of_record().unwrap());
        let mut bytes = [0u8; 3];
        assert_eq!(reader.read_bytes(&mut bytes).unwrap(), 21);
        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes[1], 0x00);
        assert_eq!(bytes[2] & 0x1F, 0x00);
    }

    #[test]
    fn empty_stream_is_empty_record() {
        let mut input: &[u8] = &[];
        let mut reader = FormatR8Reader::new(&mut input, 8).unwrap();
        assert!(reader.is_end_of_record().unwrap());
        assert!(reader.is_end_of_file().unwrap());
        assert!(matches!(reader.read_bit(), Err(RecordError::EndOfStream)));
    }
}
