use anyhow::{Context, Result};
use bitvec::prelude::*;
use mrec_core::{MeasureRecordReader, ReaderConfig, RecordReader};
use std::io::BufRead;
use tracing::debug;

const CHUNK_BYTES: usize = 4096;

/// Decodes every record of `input` into its own bit vector.
///
/// Each record holds exactly the bits the reader produced before reaching
/// end-of-record, so short text records come back shorter than
/// `bits_per_record`. The first record always exists, even for an empty
/// stream; single-record formats yield exactly one.
///
/// # Arguments
///
/// * `input` - Buffered stream positioned at the first record
/// * `config` - Format and record size to decode with
///
/// # Returns
///
/// The records in stream order, or the first construction or decoding error
/// with the failing record index attached.
pub fn read_records<R: BufRead + ?Sized>(
    input: &mut R,
    config: &ReaderConfig,
) -> Result<Vec<BitVec<u8, Lsb0>>> {
    let mut reader = MeasureRecordReader::new(input, config)
        .with_context(|| format!("Failed to open {} reader", config.format))?;

    let mut buf = vec![0u8; CHUNK_BYTES.min(config.bits_per_record.div_ceil(8)).max(1)];
    let mut records = Vec::new();
    loop {
        let record = read_one(&mut reader, &mut buf)
            .with_context(|| format!("Failed to decode record {}", records.len()))?;
        records.push(record);

        let more = reader
            .next_record()
            .with_context(|| format!("Failed to advance past record {}", records.len() - 1))?;
        if !more {
            break;
        }
    }

    debug!(
        format = %config.format,
        single_record = config.format.is_single_record(),
        records = records.len(),
        "Decoded record stream"
    );
    Ok(records)
}

fn read_one<R: BufRead + ?Sized>(
    reader: &mut MeasureRecordReader<'_, R>,
    buf: &mut [u8],
) -> mrec_core::Result<BitVec<u8, Lsb0>> {
    let mut record = BitVec::with_capacity(reader.bits_per_record().min(8 * CHUNK_BYTES));
    loop {
        let n = reader.read_bytes(buf)?;
        if n == 0 {
            return Ok(record);
        }
        record.extend_from_bitslice(&buf.view_bits::<Lsb0>()[..n]);
    }
}

/// Splits a B8 table whose shots are each padded to a whole byte.
///
/// A trailing partial shot is dropped.
///
/// # Arguments
///
/// * `raw_bits` - Concatenated shots, least significant bit first
/// * `bits_per_shot` - Meaningful bits at the start of each shot
pub fn slice_shots(raw_bits: &BitSlice<u8, Lsb0>, bits_per_shot: usize) -> Vec<Vec<bool>> {
    let stride_bits = bits_per_shot.div_ceil(8) * 8;
    if stride_bits == 0 {
        return Vec::new();
    }
    raw_bits
        .chunks_exact(stride_bits)
        .map(|shot| shot[..bits_per_shot].iter().by_vals().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrec_common::SampleFormat;

    fn bools(record: &BitVec<u8, Lsb0>) -> Vec<bool> {
        record.iter().by_vals().collect()
    }

    #[test]
    fn slices_padded_shots() {
        let raw = BitVec::<u8, Lsb0>::from_vec(vec![0b0000_0101, 0b0000_0010, 0xFF]);
        let shots = slice_shots(&raw, 3);
        assert_eq!(
            shots,
            vec![
                vec![true, false, true],
                vec![false, true, false],
                vec![true, true, true],
            ]
        );
    }

    #[test]
    fn zero_width_shots_slice_to_nothing() {
        let raw = BitVec::<u8, Lsb0>::from_vec(vec![0xFF]);
        assert!(slice_shots(&raw, 0).is_empty());
    }

    #[test]
    fn reads_each_01_line() {
        let mut input: &[u8] = b"101\n\n11\n";
        let records = read_records(&mut input, &ReaderConfig::new(SampleFormat::Format01, 3)).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(bools(&records[0]), [true, false, true]);
        assert!(records[1].is_empty());
        assert_eq!(bools(&records[2]), [true, true]);
    }

    #[test]
    fn error_names_failing_record() {
        let mut input: &[u8] = b"0,1\n5,2\n";
        let err = read_records(&mut input, &ReaderConfig::new(SampleFormat::Hits, 8)).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("record 1"), "{}", message);
    }
}
