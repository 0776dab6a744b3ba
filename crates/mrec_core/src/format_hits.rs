//! Sparse records listing the indices of set bits.
//!
//! A record is a comma-separated, strictly ascending list of indices below
//! the record length, terminated by a newline or end of stream. An empty line
//! is a record with no set bits.

use crate::error::{RecordError, Result};
use crate::reader::{RecordCursor, RecordReader};
use crate::stream::ByteStream;
use crate::text::read_unsigned_int;
use mrec_common::wire::{HITS_SEPARATOR, RECORD_SEPARATOR};
use std::io::BufRead;
use tracing::{debug, trace};

/// Reader for the sparse `hits` format.
///
/// Parses one index ahead of the cursor. Each `read_bit` compares the
/// current position with the pending hit, and only parses the next index
/// once the cursor has moved past it.
pub struct FormatHitsReader<'a, R: BufRead + ?Sized> {
    stream: ByteStream<'a, R>,
    cursor: RecordCursor,
    /// Byte that ended the last token; `None` at end of stream.
    separator: Option<u8>,
    /// Next pending set bit of the current record.
    next_hit: Option<usize>,
}

impl<'a, R: BufRead + ?Sized> FormatHitsReader<'a, R> {
    /// Opens a reader and parses the first hit of the first record.
    ///
    /// # Arguments
    ///
    /// * `input` - Stream positioned at the first record
    /// * `bits_per_record` - Exclusive upper bound for every index
    pub fn new(input: &'a mut R, bits_per_record: usize) -> Result<Self> {
        let mut reader = Self {
            stream: ByteStream::new(input),
            cursor: RecordCursor::new(bits_per_record)?,
            separator: None,
            next_hit: None,
        };
        reader.update_next_hit()?;
        Ok(reader)
    }

    /// Parses the next hit of the current record.
    ///
    /// Returns true if an index was read, false if the record terminator was
    /// found instead.
    fn update_next_hit(&mut self) -> Result<bool> {
        let (value, separator) = read_unsigned_int(&mut self.stream)?;
        self.separator = separator;

        let Some(hit) = value else {
            return match separator {
                None | Some(RECORD_SEPARATOR) => Ok(false),
                Some(c) => Err(self.reject(format!("Unexpected character {:?}", c as char))),
            };
        };

        if let Some(c) = separator
            && c != HITS_SEPARATOR
            && c != RECORD_SEPARATOR
        {
            return Err(self.reject(format!("Invalid separator character {:?}", c as char)));
        }
        if hit < self.cursor.position() {
            return Err(self.reject(format!(
                "New hit {} is in the past of {}",
                hit,
                self.cursor.position()
            )));
        }
        if let Some(previous) = self.next_hit
            && hit <= previous
        {
            return Err(self.reject(format!(
                "New hit {} does not come after previous hit {}",
                hit, previous
            )));
        }
        if hit >= self.cursor.bits_per_record() {
            return Err(self.reject(format!(
                "New hit {} is outside record size {}",
                hit,
                self.cursor.bits_per_record()
            )));
        }
        self.next_hit = Some(hit);
        Ok(true)
    }

    fn reject(&self, message: String) -> RecordError {
        debug!(offset = self.stream.offset(), %message, "Rejecting hits token");
        RecordError::malformed(self.stream.offset(), message)
    }
}

impl<R: BufRead + ?Sized> RecordReader for FormatHitsReader<'_, R> {
    fn cursor(&self) -> &RecordCursor {
        &self.cursor
    }

    fn read_bit(&mut self) -> Result<bool> {
        self.cursor.ensure_not_full()?;
        let position = self.cursor.position();
        let passed = self.next_hit.is_none_or(|hit| position > hit);
        if passed && self.separator == Some(HITS_SEPARATOR) {
            self.update_next_hit()?;
        }
        self.cursor.advance(1);
        Ok(self.next_hit == Some(position))
    }

    fn next_record(&mut self) -> Result<bool> {
        while self.separator == Some(HITS_SEPARATOR) {
            self.update_next_hit()?;
        }
        self.next_hit = None;
        self.cursor.rewind();
        if self.separator.is_none() {
            trace!("Hits stream exhausted");
            return Ok(false);
        }
        let found_hit = self.update_next_hit()?;
        let found = found_hit || self.separator.is_some();
        trace!(found, offset = self.stream.offset(), "Hits next record");
        Ok(found)
    }

    fn is_end_of_file(&mut self) -> Result<bool> {
        match self.separator {
            None => Ok(true),
            Some(RECORD_SEPARATOR) => Ok(self.stream.at_end()?),
            Some(_) => Ok(false),
        }
    }
}
