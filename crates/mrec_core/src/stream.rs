//! Borrowed byte source shared by all format readers.
//!
//! Readers never own their input. A `ByteStream` wraps a mutable borrow of any
//! buffered reader and exposes the three primitives the decoders need: single
//! byte reads with an EOF sentinel, block reads, and a non-consuming end check.
//! It also counts consumed bytes so malformed tokens can be located.

use std::io::{self, BufRead, ErrorKind};

/// Byte-level view over a borrowed buffered reader.
///
/// Holds `&'a mut R` for as long as the owning format reader lives, so the
/// caller gets the stream back, positioned just past the consumed bytes,
/// once the reader is dropped. Reads go through `fill_buf`/`consume`, which
/// means `at_end` can peek without consuming anything.
///
/// The running `offset` counts every consumed byte and is what
/// `RecordError::MalformedInput` reports.
pub struct ByteStream<'a, R: BufRead + ?Sized> {
    inner: &'a mut R,
    offset: u64,
}

impl<'a, R: BufRead + ?Sized> ByteStream<'a, R> {
    /// Wraps `inner` with the offset counter at zero.
    pub fn new(inner: &'a mut R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Number of bytes consumed from the underlying reader so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads one byte, returning `None` at end of stream.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = match self.fill()?.first() {
            Some(&b) => b,
            None => return Ok(None),
        };
        self.inner.consume(1);
        self.offset += 1;
        Ok(Some(byte))
    }

    /// Reads as many bytes as fit into `out`.
    ///
    /// # Returns
    ///
    /// The number of bytes written. Smaller than `out.len()` only when the
    /// stream ended.
    pub fn read_block(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < out.len() {
            let available = self.fill()?;
            if available.is_empty() {
                break;
            }
            let n = available.len().min(out.len() - filled);
            out[filled..filled + n].copy_from_slice(&available[..n]);
            self.inner.consume(n);
            filled += n;
        }
        self.offset += filled as u64;
        Ok(filled)
    }

    /// Returns true when no more bytes can be read. Consumes nothing.
    pub fn at_end(&mut self) -> io::Result<bool> {
        Ok(self.fill()?.is_empty())
    }

    fn fill(&mut self) -> io::Result<&[u8]> {
        loop {
            match self.inner.fill_buf() {
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.inner.fill_buf()
    }
}
