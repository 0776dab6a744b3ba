//! Packed binary records: eight bits per byte, least significant bit first.
//!
//! The whole stream is one record. Byte-aligned reads bypass bit unpacking and
//! copy straight from the stream into the caller's buffer.

use crate::error::{RecordError, Result};
use crate::reader::{RecordCursor, RecordReader, read_bytes_bitwise};
use crate::stream::ByteStream;
use std::io::BufRead;

/// Reader for the packed `b8` format.
///
/// Bits come out of one buffered byte at a time. While no partial byte is
/// pending, `read_bytes` copies whole bytes from the stream in one block.
/// The record ends at `bits_per_record` or when the stream runs out.
pub struct FormatB8Reader<'a, R: BufRead + ?Sized> {
    stream: ByteStream<'a, R>,
    cursor: RecordCursor,
    /// Unread bits of the current byte, shifted down; `None` after EOF.
    payload: Option<u8>,
    bits_available: u8,
}

impl<'a, R: BufRead + ?Sized> FormatB8Reader<'a, R> {
    /// Opens a reader. Nothing is read until the first bit is requested.
    pub fn new(input: &'a mut R, bits_per_record: usize) -> Result<Self> {
        Ok(Self {
            stream: ByteStream::new(input),
            cursor: RecordCursor::new(bits_per_record)?,
            payload: Some(0),
            bits_available: 0,
        })
    }

    fn maybe_update_payload(&mut self) -> Result<()> {
        if self.bits_available > 0 {
            return Ok(());
        }
        self.payload = self.stream.read_byte()?;
        if self.payload.is_some() {
            self.bits_available = 8;
        }
        Ok(())
    }
}

impl<R: BufRead + ?Sized> RecordReader for FormatB8Reader<'_, R> {
    fn cursor(&self) -> &RecordCursor {
        &self.cursor
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.cursor.is_full() {
            return Ok(0);
        }
        if self.bits_available > 0 {
            return read_bytes_bitwise(self, buf);
        }

        let n_bits = (8 * buf.len()).min(self.cursor.remaining());
        let n_bytes = n_bits.div_ceil(8);
        let read = self.stream.read_block(&mut buf[..n_bytes])?;
        let n_bits = n_bits.min(8 * read);
        self.cursor.advance(n_bits);
        Ok(n_bits)
    }

    fn read_bit(&mut self) -> Result<bool> {
        self.cursor.ensure_not_full()?;
        self.maybe_update_payload()?;
        let Some(payload) = self.payload else {
            return Err(RecordError::EndOfStream);
        };

        self.payload = Some(payload >> 1);
        self.bits_available -= 1;
        self.cursor.advance(1);
        Ok(payload & 1 == 1)
    }

    fn next_record(&mut self) -> Result<bool> {
        self.cursor.rewind();
        Ok(false)
    }

    fn is_end_of_record(&mut self) -> Result<bool> {
        if self.cursor.is_full() {
            return Ok(true);
        }
        self.maybe_update_payload()?;
        Ok(self.bits_available == 0 && self.payload.is_none())
    }

    fn is_end_of_file(&mut self) -> Result<bool> {
        Ok(self.bits_available == 0 && self.stream.at_end()?)
    }
}
