//! Token helpers shared by the line-oriented sparse formats.

use crate::error::{RecordError, Result};
use crate::stream::ByteStream;
use std::io::BufRead;

/// Reads a decimal integer starting at the next byte.
///
/// # Returns
///
/// `(Some(value), terminator)` when at least one digit was read, otherwise
/// `(None, first_byte)`. The terminating byte is consumed either way; `None`
/// stands for end of stream.
pub(crate) fn read_unsigned_int<R: BufRead + ?Sized>(
    stream: &mut ByteStream<'_, R>,
) -> Result<(Option<usize>, Option<u8>)> {
    let mut next = stream.read_byte()?;
    let mut value: Option<usize> = None;
    while let Some(c) = next.filter(u8::is_ascii_digit) {
        let digit = (c - b'0') as usize;
        let acc = value.unwrap_or(0);
        value = Some(
            acc.checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| RecordError::malformed(stream.offset(), "Integer value overflows"))?,
        );
        next = stream.read_byte()?;
    }
    Ok((value, next))
}

/// Consumes `keyword` at the current position.
///
/// # Returns
///
/// `Some(next)` with the byte following the keyword when it is present,
/// `None` when the stream is already exhausted. Any other content is a
/// malformed-input error.
pub(crate) fn maybe_consume_keyword<R: BufRead + ?Sized>(
    stream: &mut ByteStream<'_, R>,
    keyword: &[u8],
) -> Result<Option<Option<u8>>> {
    let Some(first) = stream.read_byte()? else {
        return Ok(None);
    };
    let mut next = Some(first);
    for &expected in keyword {
        if next != Some(expected) {
            return Err(RecordError::malformed(
                stream.offset(),
                format!(
                    "Failed to find expected string \"{}\"",
                    String::from_utf8_lossy(keyword)
                ),
            ));
        }
        next = stream.read_byte()?;
    }
    Ok(Some(next))
}
