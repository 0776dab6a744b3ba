//! Dense ASCII records: one `'0'`/`'1'` character per bit, one record per line.

use crate::error::{RecordError, Result};
use crate::reader::{RecordCursor, RecordReader};
use crate::stream::ByteStream;
use mrec_common::wire::RECORD_SEPARATOR;
use std::io::BufRead;
use tracing::{debug, trace};

/// Reader for the `01` text format.
///
/// Keeps one character of lookahead in `payload`. End-of-record is reached
/// at a newline, at end of stream, or once `bits_per_record` characters have
/// been read, whichever comes first, so lines shorter than the declared
/// length are legal.
pub struct Format01Reader<'a, R: BufRead + ?Sized> {
    stream: ByteStream<'a, R>,
    cursor: RecordCursor,
    /// Next unconsumed character, `None` once the stream is exhausted.
    payload: Option<u8>,
}

impl<'a, R: BufRead + ?Sized> Format01Reader<'a, R> {
    /// Opens a reader and loads the first character.
    ///
    /// # Arguments
    ///
    /// * `input` - Stream positioned at the first record
    /// * `bits_per_record` - Maximum characters per line
    pub fn new(input: &'a mut R, bits_per_record: usize) -> Result<Self> {
        let cursor = RecordCursor::new(bits_per_record)?;
        let mut stream = ByteStream::new(input);
        let payload = stream.read_byte()?;
        Ok(Self {
            stream,
            cursor,
            payload,
        })
    }
}

impl<R: BufRead + ?Sized> RecordReader for Format01Reader<'_, R> {
    fn cursor(&self) -> &RecordCursor {
        &self.cursor
    }

    fn read_bit(&mut self) -> Result<bool> {
        self.cursor.ensure_not_full()?;
        let bit = match self.payload {
            None => return Err(RecordError::EndOfStream),
            Some(RECORD_SEPARATOR) => return Err(RecordError::EndOfRecord),
            Some(b'0') => false,
            Some(b'1') => true,
            Some(c) => {
                return Err(RecordError::malformed(
                    self.stream.offset(),
                    format!(
                        "Expected '0' or '1' because input format was specified as '01', got {:?}",
                        c as char
                    ),
                ));
            }
        };
        self.payload = self.stream.read_byte()?;
        self.cursor.advance(1);
        Ok(bit)
    }

    fn next_record(&mut self) -> Result<bool> {
        let mut skipped = self.cursor.position();
        while let Some(c) = self.payload {
            if c == RECORD_SEPARATOR {
                break;
            }
            skipped += 1;
            if skipped > self.cursor.bits_per_record() {
                debug!(
                    bits_per_record = self.cursor.bits_per_record(),
                    offset = self.stream.offset(),
                    "Rejecting overlong 01 record"
                );
                return Err(RecordError::malformed(
                    self.stream.offset(),
                    format!(
                        "Record too long, expected at most {} bits",
                        self.cursor.bits_per_record()
                    ),
                ));
            }
            self.payload = self.stream.read_byte()?;
        }

        self.cursor.rewind();
        if self.payload.is_some() {
            self.payload = self.stream.read_byte()?;
        }
        let found = self.payload.is_some();
        trace!(found, offset = self.stream.offset(), "01 next record");
        Ok(found)
    }

    fn is_end_of_record(&mut self) -> Result<bool> {
        Ok(matches!(self.payload, None | Some(RECORD_SEPARATOR)) || self.cursor.is_full())
    }

    fn is_end_of_file(&mut self) -> Result<bool> {
        match self.payload {
            None => Ok(true),
            Some(RECORD_SEPARATOR) => Ok(self.stream.at_end()?),
            Some(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_single_record() {
        let mut input: &[u8] = b"000111110000111111\n";
        let mut reader = Format01Reader::new(&mut input, 18).unwrap();
        assert!(!reader.is_end_of_record().unwrap());

        let mut bytes = [0u8];
        assert_eq!(reader.read_bytes(&mut bytes).unwrap(), 8);
        assert_eq!(bytes[0], 0xF8);
        assert!(!reader.read_bit().unwrap());
        assert_eq!(reader.read_bytes(&mut bytes).unwrap(), 8);
        assert_eq!(bytes[0], 0xF8);
        assert!(reader.read_bit().unwrap());

        assert!(reader.is_end_of_record().unwrap());
        assert!(reader.is_end_of_file().unwrap());
        assert!(matches!(reader.read_bit(), Err(RecordError::EndOfRecord)));
        assert!(!reader.next_record().unwrap());
    }

    #[test]
    fn reads_multiple_short_records() {
        let mut input: &[u8] = b"1\n01\n1";
        let mut reader = Format01Reader::new(&mut input, 4).unwrap();

        let mut bytes = [0u8];
        assert_eq!(reader.read_bytes(&mut bytes).unwrap(), 1);
        assert_eq!(bytes[0], 1);
        assert!(reader.is_end_of_record().unwrap());
        assert!(!reader.is_end_of_file().unwrap());

        assert!(reader.next_record().unwrap());
        assert!(!reader.read_bit().unwrap());
        assert!(reader.read_bit().unwrap());
        assert!(reader.is_end_of_record().unwrap());
        assert!(matches!(reader.read_bit(), Err(RecordError::EndOfRecord)));

        assert!(reader.next_record().unwrap());
        assert_eq!(reader.read_bytes(&mut bytes).unwrap(), 1);
        assert_eq!(bytes[0], 1);
        assert!(reader.is_end_of_file().unwrap());
        assert!(!reader.next_record().unwrap());
    }

    #[test]
    fn limit_stops_read_bytes() {
        let mut input: &[u8] = b"01111\n";
        let mut reader = Format01Reader::new(&mut input, 5).unwrap();
        let mut bytes = [0u8];
        assert_eq!(reader.read_bytes(&mut bytes).unwrap(), 5);
        assert_eq!(bytes[0], 0x1E);
        assert!(reader.is_end_of_record().unwrap());
        assert!(reader.is_end_of_file().unwrap());
    }

    #[test]
    fn next_record_skips_unread_bits() {
        let mut input: &[u8] = b"0110\n1000\n";
        let mut reader = Format01Reader::new(&mut input, 4).unwrap();
        assert!(!reader.read_bit().unwrap());
        assert!(reader.next_record().unwrap());
        assert_eq!(reader.position(), 0);
        assert!(reader.read_bit().unwrap());
        assert!(!reader.next_record().unwrap());
    }

    #[test]
    fn overlong_record_rejected() {
        let mut input: &[u8] = b"0110110\n1\n";
        let mut reader = Format01Reader::new(&mut input, 4).unwrap();
        assert!(matches!(
            reader.next_record(),
            Err(RecordError::MalformedInput { .. })
        ));
    }

    #[test]
    fn invalid_character_rejected() {
        let mut input: &[u8] = b"01x1\n";
        let mut reader = Format01Reader::new(&mut input, 4).unwrap();
        reader.read_bit().unwrap();
        reader.read_bit().unwrap();
        let err = reader.read_bit().unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn malformed_offset_points_past_token() {
        let mut input: &[u8] = b"01x1\n";
        let mut reader = Format01Reader::new(&mut input, 4).unwrap();
        reader.read_bit().unwrap();
        reader.read_bit().unwrap();
        match reader.read_bit().unwrap_err() {
            RecordError::MalformedInput { offset, .. } => assert_eq!(offset, 3),
            other => panic!("unexpected error {:?}", other),
        }

        let mut input: &[u8] = b"0110110\n1\n";
        let mut reader = Format01Reader::new(&mut input, 4).unwrap();
        match reader.next_record().unwrap_err() {
            RecordError::MalformedInput { offset, .. } => assert_eq!(offset, 5),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn truncated_record_reports_end_of_stream_only_at_eof() {
        let mut input: &[u8] = b"01";
        let mut reader = Format01Reader::new(&mut input, 4).unwrap();
        reader.read_bit().unwrap();
        reader.read_bit().unwrap();
        assert!(reader.is_end_of_record().unwrap());
        assert!(matches!(reader.read_bit(), Err(RecordError::EndOfStream)));
    }
}
