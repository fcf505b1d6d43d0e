//! Time-normalized index mapping shared by the camera and frame resamplers.
//!
//! Output index `j` of `m` maps to source position `f(j) = j * (n - 1) / (m - 1)`,
//! so output 0 lands on source 0 and output `m - 1` lands on source `n - 1`.
//! The mapping is evaluated in integer arithmetic, which keeps the selected
//! indices identical for every caller that builds a plan from the same `n` and `m`.

use crate::error::ResampleError;
use std::num::NonZeroUsize;

/// A validated target frame count (`m >= 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetCount(NonZeroUsize);

impl TargetCount {
    /// Validate a requested count. Accepts signed input so that negative
    /// command line values surface as a value error rather than a parse error.
    pub fn new(count: i64) -> Result<Self, ResampleError> {
        usize::try_from(count)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self)
            .ok_or(ResampleError::InvalidTarget(count))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl From<NonZeroUsize> for TargetCount {
    fn from(count: NonZeroUsize) -> Self {
        Self(count)
    }
}

/// Whether a resample changes the sequence length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleMode {
    /// Source and target lengths match; the input is forwarded untouched.
    Passthrough,
    /// Source is stretched or squeezed to the target length.
    Stretch,
}

/// Where one output element comes from in the source sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceSample {
    /// `floor(f(j))`.
    pub lower: usize,
    /// `lower + 1`, clamped to the last source index.
    pub upper: usize,
    /// Fractional part of `f(j)`, in `[0, 1)`.
    pub weight: f64,
    /// `round(f(j))`, ties rounding up.
    pub nearest: usize,
}

impl SourceSample {
    /// True when the sample sits exactly on a source element.
    pub fn is_exact(&self) -> bool {
        self.lower == self.upper || self.weight == 0.0
    }
}

/// A resampling request for one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleSpec {
    source_len: usize,
    target: TargetCount,
}

impl ResampleSpec {
    /// Returns `None` for an empty source; callers report that in their own
    /// error category (malformed camera input, undecodable video).
    pub fn new(source_len: usize, target: TargetCount) -> Option<Self> {
        (source_len > 0).then_some(Self { source_len, target })
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn target_len(&self) -> usize {
        self.target.get()
    }

    pub fn mode(&self) -> ResampleMode {
        if self.source_len == self.target.get() {
            ResampleMode::Passthrough
        } else {
            ResampleMode::Stretch
        }
    }

    /// Continuous source position of output index `j`.
    pub fn source_position(&self, j: usize) -> f64 {
        let sample = self.sample(j);
        sample.lower as f64 + sample.weight
    }

    /// Source sample for output index `j` (`j < target_len`).
    pub fn sample(&self, j: usize) -> SourceSample {
        let m = self.target.get();
        let n = self.source_len;
        debug_assert!(j < m, "output index {j} out of range for {m} targets");

        if m == 1 || n == 1 {
            return SourceSample {
                lower: 0,
                upper: 0,
                weight: 0.0,
                nearest: 0,
            };
        }

        let span = (m - 1) as u128;
        let numerator = j as u128 * (n - 1) as u128;
        let lower = (numerator / span) as usize;
        let rem = numerator % span;
        let upper = (lower + 1).min(n - 1);
        let nearest = if 2 * rem >= span { upper } else { lower };

        SourceSample {
            lower,
            upper: if rem == 0 { lower } else { upper },
            weight: rem as f64 / span as f64,
            nearest,
        }
    }

    /// Samples for every output index, in output order.
    pub fn plan(&self) -> Vec<SourceSample> {
        (0..self.target.get()).map(|j| self.sample(j)).collect()
    }

    /// Nearest source index for every output index.
    pub fn nearest_indices(&self) -> Vec<usize> {
        (0..self.target.get()).map(|j| self.sample(j).nearest).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(n: usize, m: i64) -> ResampleSpec {
        ResampleSpec::new(n, TargetCount::new(m).unwrap()).unwrap()
    }

    #[test]
    fn test_target_count_rejects_non_positive() {
        assert!(matches!(
            TargetCount::new(0),
            Err(ResampleError::InvalidTarget(0))
        ));
        assert!(matches!(
            TargetCount::new(-3),
            Err(ResampleError::InvalidTarget(-3))
        ));
        assert_eq!(TargetCount::new(81).unwrap().get(), 81);
    }

    #[test]
    fn test_empty_source_has_no_spec() {
        assert!(ResampleSpec::new(0, TargetCount::new(5).unwrap()).is_none());
    }

    #[test]
    fn test_plan_length_and_endpoints() {
        for (n, m) in [(40, 81), (81, 81), (200, 81), (1, 81), (7, 1), (2, 3)] {
            let spec = spec(n, m as i64);
            let plan = spec.plan();
            assert_eq!(plan.len(), m);
            assert_eq!(plan[0].nearest, 0);
            assert_eq!(plan[0].lower, 0);
            if m > 1 {
                let last = plan[m - 1];
                assert_eq!(last.nearest, n - 1);
                assert_eq!(last.lower, n - 1);
                assert_eq!(last.weight, 0.0);
            }
        }
    }

    #[test]
    fn test_single_target_selects_first() {
        let plan = spec(12, 1).plan();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].nearest, 0);
        assert!(plan[0].is_exact());
    }

    #[test]
    fn test_passthrough_is_identity() {
        let spec = spec(81, 81);
        assert_eq!(spec.mode(), ResampleMode::Passthrough);
        for (j, sample) in spec.plan().iter().enumerate() {
            assert_eq!(sample.nearest, j);
            assert!(sample.is_exact());
        }
        assert_eq!(self::spec(80, 81).mode(), ResampleMode::Stretch);
    }

    #[test]
    fn test_nearest_is_monotonic() {
        for (n, m) in [(40, 81), (200, 81), (3, 10), (10, 3), (81, 80)] {
            let indices = spec(n, m).nearest_indices();
            assert!(indices.windows(2).all(|w| w[0] <= w[1]), "n={n} m={m}");
            assert!(indices.iter().all(|&i| i < n));
        }
    }

    #[test]
    fn test_matches_float_formula() {
        let (n, m) = (40usize, 81usize);
        let spec = spec(n, m as i64);
        for j in 0..m {
            let f = j as f64 * (n - 1) as f64 / (m - 1) as f64;
            let sample = spec.sample(j);
            assert_eq!(sample.lower, f.floor() as usize);
            assert!((spec.source_position(j) - f).abs() < 1e-9);
            assert!((sample.weight - (f - f.floor())).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ties_round_up() {
        // n = 2, m = 3: f(1) = 0.5
        let sample = spec(2, 3).sample(1);
        assert_eq!(sample.lower, 0);
        assert_eq!(sample.upper, 1);
        assert_eq!(sample.weight, 0.5);
        assert_eq!(sample.nearest, 1);
    }

    #[test]
    fn test_downsample_covers_full_span() {
        let indices = spec(200, 81).nearest_indices();
        assert_eq!(indices.first(), Some(&0));
        assert_eq!(indices.last(), Some(&199));
        // Downsampling never selects the same source twice.
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }
}
