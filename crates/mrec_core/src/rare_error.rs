//! Sampling of rare events at geometrically distributed gaps.
//!
//! Instead of drawing one Bernoulli trial per location, the sampler jumps
//! straight from one hit to the next. With hit probability `p` the number of
//! misses before the next hit follows a geometric distribution, so the cost
//! is proportional to the number of hits rather than the number of trials.

use crate::error::{RecordError, Result};
use rand::Rng;

/// Yields ascending positions of hits among independent trials.
#[derive(Debug, Clone)]
pub struct RareErrorIterator {
    next_candidate: usize,
    probability: f64,
    /// `ln(1 - p)`, the scale of the inverse geometric CDF.
    log_miss: f64,
}

impl RareErrorIterator {
    /// Creates a sampler starting at position zero.
    ///
    /// Fails with `Configuration` unless `0 <= probability <= 1`.
    pub fn new(probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(RecordError::Configuration(format!(
                "Invalid probability {}",
                probability
            )));
        }
        Ok(Self {
            next_candidate: 0,
            probability,
            log_miss: (-probability).ln_1p(),
        })
    }

    /// Returns the position of the next hit and moves past it.
    ///
    /// With probability zero there is never a hit and `usize::MAX` is
    /// returned.
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let result = self.next_candidate.saturating_add(self.sample_gap(rng));
        self.next_candidate = result.saturating_add(1);
        result
    }

    fn sample_gap<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.probability >= 1.0 {
            return 0;
        }
        if self.probability <= 0.0 {
            return usize::MAX;
        }
        // Inverse CDF of the geometric distribution (misses before the first
        // hit). 1 - [0, 1) keeps the logarithm finite.
        let u = 1.0 - rng.random::<f64>();
        (u.ln() / self.log_miss).floor() as usize
    }

    /// Calls `body` with each hit position below `attempts`, in order.
    pub fn for_samples<R, F>(probability: f64, attempts: usize, rng: &mut R, mut body: F) -> Result<()>
    where
        R: Rng + ?Sized,
        F: FnMut(usize),
    {
        if probability == 0.0 {
            return Ok(());
        }
        let mut iter = Self::new(probability)?;
        loop {
            let position = iter.next(rng);
            if position >= attempts {
                return Ok(());
            }
            body(position);
        }
    }
}

/// Collects the ascending hit positions among `attempts` trials.
pub fn sample_hit_indices<R: Rng + ?Sized>(probability: f64, attempts: usize, rng: &mut R) -> Result<Vec<usize>> {
    let mut result = Vec::new();
    RareErrorIterator::for_samples(probability, attempts, rng, |s| result.push(s))?;
    Ok(result)
}
