//! Construction parameters for record readers.

use crate::error::{RecordError, Result};
use mrec_common::SampleFormat;

/// Parameters a record reader is built from.
///
/// `bits_per_record` is the declared record length. The detection event and
/// logical observable counts are only meaningful for the DETS format, and
/// must stay zero for every other format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Encoding of the input stream.
    pub format: SampleFormat,
    /// Declared record length; every record yields at most this many bits.
    pub bits_per_record: usize,
    /// Detection events the DETS producer declared.
    pub n_detection_events: usize,
    /// Logical observables the DETS producer declared.
    pub n_logical_observables: usize,
}

impl ReaderConfig {
    /// Creates a configuration with no detection events or observables.
    pub fn new(format: SampleFormat, bits_per_record: usize) -> Self {
        Self {
            format,
            bits_per_record,
            n_detection_events: 0,
            n_logical_observables: 0,
        }
    }

    /// Declares the number of detection events in each DETS record.
    ///
    /// Any non-zero value makes `validate()` reject formats other than DETS.
    /// The count is carried to the reader as metadata and does not change
    /// the record length.
    ///
    /// # Arguments
    ///
    /// * `n` - Detection events per record
    pub fn with_detection_events(mut self, n: usize) -> Self {
        self.n_detection_events = n;
        self
    }

    /// Declares the number of logical observables in each DETS record.
    ///
    /// Same rules as `with_detection_events`: only DETS accepts a non-zero
    /// count, and the record length is left as configured.
    ///
    /// # Arguments
    ///
    /// * `n` - Logical observables per record
    pub fn with_logical_observables(mut self, n: usize) -> Self {
        self.n_logical_observables = n;
        self
    }

    /// Checks the format/record-size combination.
    ///
    /// # Returns
    ///
    /// `RecordError::Configuration` when a non-DETS format carries detection
    /// events or observables, when the record length exceeds `isize::MAX`, or
    /// when the format cannot be read record by record.
    pub fn validate(&self) -> Result<()> {
        if self.format != SampleFormat::Dets && self.n_detection_events != 0 {
            return Err(RecordError::Configuration(
                "Only DETS format supports detection event records".to_string(),
            ));
        }
        if self.format != SampleFormat::Dets && self.n_logical_observables != 0 {
            return Err(RecordError::Configuration(
                "Only DETS format supports logical observable records".to_string(),
            ));
        }
        if self.bits_per_record > isize::MAX as usize {
            return Err(RecordError::Configuration(format!(
                "Record size {} bits is too big",
                self.bits_per_record
            )));
        }
        if self.format == SampleFormat::Ptb64 {
            return Err(RecordError::Configuration(
                "Format ptb64 is incompatible with single-record reading".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dets_accepts_extra_counts() {
        let config = ReaderConfig::new(SampleFormat::Dets, 10)
            .with_detection_events(4)
            .with_logical_observables(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn other_formats_reject_extra_counts() {
        for format in [
            SampleFormat::Format01,
            SampleFormat::B8,
            SampleFormat::Hits,
            SampleFormat::R8,
        ] {
            let err = ReaderConfig::new(format, 10)
                .with_detection_events(1)
                .validate()
                .unwrap_err();
            assert!(err.is_configuration());

            let err = ReaderConfig::new(format, 10)
                .with_logical_observables(2)
                .validate()
                .unwrap_err();
            assert!(err.is_configuration());
        }
    }

    #[test]
    fn oversized_record_rejected() {
        let err = ReaderConfig::new(SampleFormat::B8, usize::MAX)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("too big"));
        assert!(
            ReaderConfig::new(SampleFormat::B8, isize::MAX as usize)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn ptb64_rejected() {
        let err = ReaderConfig::new(SampleFormat::Ptb64, 64)
            .validate()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn zero_length_records_allowed() {
        assert!(ReaderConfig::new(SampleFormat::Hits, 0).validate().is_ok());
    }
}
