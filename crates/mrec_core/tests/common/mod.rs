//! Reference encoders and helpers shared by the integration tests.
//!
//! The encoders follow the sample writers that produce these formats, so
//! decoding their output must reproduce the original bits exactly.

#![allow(dead_code)] // Not every test file uses every encoder

use mrec_core::{MeasureRecordReader, ReaderConfig, RecordReader, SampleFormat};

/// Encodes records as lines of `'0'`/`'1'` characters.
pub fn encode_01(records: &[Vec<bool>]) -> Vec<u8> {
    let mut out = Vec::new();
    for record in records {
        out.extend(record.iter().map(|&b| if b { b'1' } else { b'0' }));
        out.push(b'\n');
    }
    out
}

/// Packs bits eight per byte, least significant bit first.
pub fn encode_b8(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (k, &b)| byte | ((b as u8) << k))
        })
        .collect()
}

/// Run-length encodes bits, closing the final run with a one past the end.
pub fn encode_r8(bits: &[bool]) -> Vec<u8> {
    fn push_run(out: &mut Vec<u8>, mut run: usize) {
        while run >= 0xFF {
            out.push(0xFF);
            run -= 0xFF;
        }
        out.push(run as u8);
    }

    let mut out = Vec::new();
    let mut run = 0;
    for &b in bits {
        if b {
            push_run(&mut out, run);
            run = 0;
        } else {
            run += 1;
        }
    }
    push_run(&mut out, run);
    out
}

/// Encodes records as comma-separated lists of set-bit indices.
pub fn encode_hits(records: &[Vec<bool>]) -> Vec<u8> {
    let mut out = String::new();
    for record in records {
        let hits: Vec<String> = set_bits(record).map(|i| i.to_string()).collect();
        out.push_str(&hits.join(","));
        out.push('\n');
    }
    out.into_bytes()
}

/// Encodes records as `shot` lines with every index tagged `tag`.
pub fn encode_dets(records: &[Vec<bool>], tag: char) -> Vec<u8> {
    let mut out = String::new();
    for record in records {
        out.push_str("shot");
        for i in set_bits(record) {
            out.push_str(&format!(" {}{}", tag, i));
        }
        out.push('\n');
    }
    out.into_bytes()
}

fn set_bits(record: &[bool]) -> impl Iterator<Item = usize> + '_ {
    record.iter().enumerate().filter(|(_, b)| **b).map(|(i, _)| i)
}

/// Opens a reader over `data`, panicking on configuration errors.
pub fn open<'a, 'b>(
    data: &'a mut &'b [u8],
    format: SampleFormat,
    bits_per_record: usize,
) -> MeasureRecordReader<'a, &'b [u8]> {
    MeasureRecordReader::new(data, &ReaderConfig::new(format, bits_per_record))
        .unwrap_or_else(|e| panic!("failed to open {} reader: {}", format, e))
}

/// Reads the current record with `read_bit` until end-of-record.
pub fn read_record_bits(reader: &mut impl RecordReader) -> Vec<bool> {
    let mut bits = Vec::new();
    while !reader.is_end_of_record().unwrap() {
        bits.push(reader.read_bit().unwrap());
    }
    bits
}

/// Unpacks the first `n` bits of an LSB-first byte buffer.
pub fn unpack(bytes: &[u8], n: usize) -> Vec<bool> {
    (0..n).map(|i| (bytes[i / 8] >> (i % 8)) & 1 == 1).collect()
}

/// Deterministic pseudo-random bits for table-style tests.
pub fn pattern(n: usize, seed: u64) -> Vec<bool> {
    let mut state = seed | 1;
    (0..n)
        .map(|_| {
            state ^= state >> 12;
            state ^= state << 25;
            state ^= state >> 27;
            state.wrapping_mul(0x2545F4914F6CDD1D) >> 61 == 0
        })
        .collect()
}
