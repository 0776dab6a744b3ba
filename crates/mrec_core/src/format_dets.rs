//! Tagged sparse records, one `shot` line per record.
//!
//! A record looks like `shot M0 M2 D5 L1`: the keyword, then space-separated
//! tokens made of a result type tag (`M`, `D` or `L`) and an index. Indices
//! ascend within a run of equal tags. When the tag changes, the new index is
//! counted from the current position instead of from zero, so the segments
//! for each result type are laid end to end in a single record.

use crate::error::{RecordError, Result};
use crate::reader::{RecordCursor, RecordReader};
use crate::stream::ByteStream;
use crate::text::{maybe_consume_keyword, read_unsigned_int};
use mrec_common::ResultType;
use mrec_common::wire::{DETS_SEPARATOR, DETS_SHOT_KEYWORD, RECORD_SEPARATOR};
use std::io::BufRead;
use tracing::{debug, trace};

/// Reader for the tagged `dets` format.
///
/// Works like the HITS reader, with two additions: each index carries a
/// result type tag, and a tag change shifts the indices that follow by the
/// current position.
pub struct FormatDetsReader<'a, R: BufRead + ?Sized> {
    stream: ByteStream<'a, R>,
    cursor: RecordCursor,
    n_detection_events: usize,
    n_logical_observables: usize,
    result_type: ResultType,
    /// Byte that ended the last token; `None` at end of stream.
    separator: Option<u8>,
    /// Next pending set bit, already shifted into record coordinates.
    next_shot: Option<usize>,
}

impl<'a, R: BufRead + ?Sized> FormatDetsReader<'a, R> {
    /// Opens a DETS stream, which must begin with a `shot` keyword.
    ///
    /// # Arguments
    ///
    /// * `input` - Stream positioned at the first record
    /// * `n_measurements` - Declared record length in bits
    /// * `n_detection_events` - Detection events the producer declared
    /// * `n_logical_observables` - Logical observables the producer declared
    pub fn new(
        input: &'a mut R,
        n_measurements: usize,
        n_detection_events: usize,
        n_logical_observables: usize,
    ) -> Result<Self> {
        let mut reader = Self {
            stream: ByteStream::new(input),
            cursor: RecordCursor::new(n_measurements)?,
            n_detection_events,
            n_logical_observables,
            result_type: ResultType::Measurement,
            separator: Some(RECORD_SEPARATOR),
            next_shot: None,
        };
        if !reader.begin_record()? {
            return Err(RecordError::Configuration(
                "Need a \"shot\" to begin record".to_string(),
            ));
        }
        Ok(reader)
    }

    /// Detection events declared at construction.
    pub fn n_detection_events(&self) -> usize {
        self.n_detection_events
    }

    /// Logical observables declared at construction.
    pub fn n_logical_observables(&self) -> usize {
        self.n_logical_observables
    }

    /// Consumes the `shot` keyword and the first token of a record.
    ///
    /// Returns false if the stream ended where a record was expected.
    fn begin_record(&mut self) -> Result<bool> {
        let Some(separator) = maybe_consume_keyword(&mut self.stream, DETS_SHOT_KEYWORD)? else {
            self.separator = None;
            return Ok(false);
        };
        self.separator = separator;
        match separator {
            Some(DETS_SEPARATOR) => self.update_next_shot()?,
            None | Some(RECORD_SEPARATOR) => {}
            Some(c) => {
                return Err(self.reject(format!(
                    "Unexpected character {:?} after \"shot\"",
                    c as char
                )));
            }
        }
        Ok(true)
    }

    fn update_next_shot(&mut self) -> Result<()> {
        let Some(tag) = self.stream.read_byte()? else {
            self.separator = None;
            return Ok(());
        };
        let Some(next_result_type) = ResultType::from_tag(tag) else {
            return Err(self.reject(format!(
                "Unknown result type {:?}, expected M, D or L",
                tag as char
            )));
        };

        let (value, separator) = read_unsigned_int(&mut self.stream)?;
        self.separator = separator;
        let Some(index) = value else {
            return Err(self.reject(format!(
                "Expected an index after result type {}",
                next_result_type
            )));
        };
        if let Some(c) = separator
            && c != DETS_SEPARATOR
            && c != RECORD_SEPARATOR
        {
            return Err(self.reject(format!("Unexpected separator {:?}", c as char)));
        }

        let position = self.cursor.position();
        let mut shot = index;
        if next_result_type != self.result_type {
            shot = index.checked_add(position).ok_or_else(|| {
                self.reject(format!(
                    "New shot {}{} overflows the record",
                    next_result_type, index
                ))
            })?;
            self.result_type = next_result_type;
        } else if let Some(previous) = self.next_shot
            && shot <= previous
        {
            return Err(self.reject(format!(
                "New shot {}{} does not come after the previous one",
                next_result_type, index
            )));
        }
        if shot < position {
            return Err(self.reject(format!(
                "New shot {}{} is in the past of its position",
                next_result_type, index
            )));
        }
        if shot >= self.cursor.bits_per_record() {
            return Err(self.reject(format!(
                "New shot {} is outside record size {}",
                shot,
                self.cursor.bits_per_record()
            )));
        }
        self.next_shot = Some(shot);
        Ok(())
    }

    fn reject(&self, message: String) -> RecordError {
        debug!(offset = self.stream.offset(), %message, "Rejecting dets token");
        RecordError::malformed(self.stream.offset(), message)
    }
}

impl<R: BufRead + ?Sized> RecordReader for FormatDetsReader<'_, R> {
    fn cursor(&self) -> &RecordCursor {
        &self.cursor
    }

    fn read_bit(&mut self) -> Result<bool> {
        self.cursor.ensure_not_full()?;
        let position = self.cursor.position();
        let passed = self.next_shot.is_none_or(|shot| position > shot);
        if passed && self.separator == Some(DETS_SEPARATOR) {
            self.update_next_shot()?;
        }
        self.cursor.advance(1);
        Ok(self.next_shot == Some(position))
    }

    fn next_record(&mut self) -> Result<bool> {
        while self.separator == Some(DETS_SEPARATOR) {
            self.update_next_shot()?;
        }
        self.next_shot = None;
        self.cursor.rewind();
        let found = self.separator.is_some() && self.begin_record()?;
        trace!(found, offset = self.stream.offset(), "Dets next record");
        Ok(found)
    }

    fn is_end_of_file(&mut self) -> Result<bool> {
        match self.separator {
            None => Ok(true),
            Some(RECORD_SEPARATOR) => Ok(self.stream.at_end()?),
            Some(_) => Ok(false),
        }
    }

    fn current_result_type(&self) -> ResultType {
        self.result_type
    }
}
