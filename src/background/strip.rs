use log::{debug, trace};
use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{check_not_empty, BackgroundError};

/// Iterative strip background estimation.
///
/// At every pass each sample that is not an anchor and has both neighbors `width` samples
/// away is compared with their mean. If it exceeds `factor` times the mean it is replaced by
/// the mean. Every comparison within a pass reads the values produced by the previous pass.
///
/// ```rust
/// use specsignal::background::Strip;
///
/// let data = [1.0, 1.0, 9.0, 1.0, 1.0];
/// let baseline = Strip::default().iterations(10).anchors([2]).apply(&data).unwrap();
/// assert_eq!(baseline[2], 9.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Strip {
    pub width: usize,
    pub iterations: usize,
    pub factor: f64,
    pub anchors: Vec<usize>,
}

impl Default for Strip {
    fn default() -> Self {
        Self {
            width: 1,
            iterations: 1000,
            factor: 1.0,
            anchors: Vec::new(),
        }
    }
}

impl Strip {
    pub fn new(width: usize, iterations: usize, factor: f64) -> Self {
        Self {
            width,
            iterations,
            factor,
            anchors: Vec::new(),
        }
    }

    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Set the sample indices which are never modified
    pub fn anchors<I: IntoIterator<Item = usize>>(mut self, anchors: I) -> Self {
        self.anchors = anchors.into_iter().collect();
        self
    }

    fn anchor_mask(&self, n: usize) -> Result<Vec<bool>, BackgroundError> {
        let mut mask = vec![false; n];
        for &anchor in self.anchors.iter() {
            match mask.get_mut(anchor) {
                Some(slot) => *slot = true,
                None => {
                    return Err(BackgroundError::InvalidArgument(format!(
                        "anchor {anchor} is outside of data with {n} samples"
                    )))
                }
            }
        }
        Ok(mask)
    }

    pub fn apply<F: Float>(&self, data: &[F]) -> Result<Vec<F>, BackgroundError> {
        check_not_empty(data)?;
        if self.width == 0 {
            return Err(BackgroundError::InvalidArgument(
                "strip width must be at least 1".to_string(),
            ));
        }
        if self.iterations == 0 {
            return Err(BackgroundError::InvalidArgument(
                "strip requires at least one iteration".to_string(),
            ));
        }
        let factor = F::from(self.factor)
            .filter(|f| f.is_finite())
            .ok_or_else(|| {
                BackgroundError::InvalidArgument(format!(
                    "strip factor must be finite, received {}",
                    self.factor
                ))
            })?;
        let is_anchor = self.anchor_mask(data.len())?;

        let n = data.len();
        let width = self.width;
        let mut current = data.to_vec();
        if width > (n - 1) / 2 {
            debug!("No sample of {n} has neighbors {width} samples away, nothing to strip");
            return Ok(current);
        }
        debug!(
            "Stripping {n} samples with width {width}, factor {} and {} anchors for up to {} iterations",
            self.factor,
            self.anchors.len(),
            self.iterations
        );

        let half = F::from(0.5).unwrap();
        let mut previous = current.clone();
        for iteration in 0..self.iterations {
            previous.copy_from_slice(&current);
            let mut changed = 0usize;
            for i in width..(n - width) {
                if is_anchor[i] {
                    continue;
                }
                let mean = (previous[i - width] + previous[i + width]) * half;
                if previous[i] > mean * factor {
                    current[i] = mean;
                    changed += 1;
                }
            }
            if changed == 0 {
                trace!("Strip converged after {iteration} iterations");
                break;
            }
        }
        Ok(current)
    }
}

/// Estimate a background with [`Strip`]
pub fn strip<F: Float>(
    data: &[F],
    width: usize,
    iterations: usize,
    factor: f64,
    anchors: &[usize],
) -> Result<Vec<F>, BackgroundError> {
    Strip::new(width, iterations, factor)
        .anchors(anchors.iter().copied())
        .apply(data)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::peak_shapes::sum_gauss;
    use crate::test_data::noisy_spectrum;
    use rstest::rstest;

    fn peak_on_flat() -> Vec<f64> {
        let x: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        sum_gauss(&x, &[100.0, 50.0, 5.0])
            .unwrap()
            .into_iter()
            .map(|v| v + 10.0)
            .collect()
    }

    #[rstest]
    #[case(1, 10)]
    #[case(3, 1000)]
    #[case(20, 50)]
    fn test_constant_unchanged(#[case] width: usize, #[case] iterations: usize) {
        let data = vec![7.5; 64];
        let baseline = strip(&data, width, iterations, 1.0, &[]).unwrap();
        assert_eq!(baseline, data);
    }

    #[test_log::test]
    fn test_removes_peak() {
        let data = peak_on_flat();
        let baseline = strip(&data, 3, 1000, 1.0, &[]).unwrap();
        assert_eq!(baseline.len(), data.len());
        assert!(baseline[50] < 15.0, "{}", baseline[50]);
        for (b, y) in baseline.iter().zip(data.iter()) {
            assert!(b <= y);
        }
    }

    #[test]
    fn test_anchors_untouched() {
        let x: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let data: Vec<f64> = sum_gauss(&x, &[100.0, 50.0, 5.0, 100.0, 20.0, 5.0])
            .unwrap()
            .into_iter()
            .map(|v| v + 10.0)
            .collect();
        let anchors = [50, 49, 50];
        let baseline = strip(&data, 2, 500, 1.0, &anchors).unwrap();
        assert_eq!(baseline[50], data[50]);
        assert_eq!(baseline[49], data[49]);
        assert!(baseline[20] < 15.0, "{}", baseline[20]);
    }

    #[test]
    fn test_never_exceeds_noisy_input() {
        let (_, _, noisy) = noisy_spectrum();
        let baseline = Strip::default().width(4).apply(&noisy).unwrap();
        for (b, y) in baseline.iter().zip(noisy.iter()) {
            assert!(b <= y);
        }
    }

    #[test]
    fn test_edges_untouched() {
        let data = [50.0, 1.0, 1.0, 1.0, 50.0];
        let baseline = strip(&data, 1, 10, 1.0, &[]).unwrap();
        assert_eq!(baseline[0], 50.0);
        assert_eq!(baseline[4], 50.0);
        let short = [3.0, 9.0];
        assert_eq!(strip(&short, 1, 10, 1.0, &[]).unwrap(), short);
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(usize::MAX / 4)]
    #[case(usize::MAX / 2 + 1)]
    #[case(usize::MAX)]
    fn test_width_beyond_data(#[case] width: usize) {
        let data = [1.0, 5.0, 1.0];
        assert_eq!(strip(&data, width, 1, 1.0, &[]).unwrap(), data);
    }

    #[test]
    fn test_single_pass_reads_previous_values() {
        let data = [0.0, 4.0, 4.0, 0.0];
        let baseline = strip(&data, 1, 1, 1.0, &[]).unwrap();
        assert_eq!(baseline, vec![0.0, 2.0, 2.0, 0.0]);
    }

    #[test]
    fn test_factor() {
        let data = [0.0, 4.0, 8.0];
        // 4 is not above 1.5 times the mean of its neighbors
        assert_eq!(strip(&data, 1, 5, 1.5, &[]).unwrap(), data);
        assert_eq!(strip(&data, 1, 5, 0.5, &[]).unwrap(), data);
        let peaked = [0.0, 8.0, 4.0];
        assert_eq!(strip(&peaked, 1, 5, 1.5, &[]).unwrap(), vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_f32() {
        let data: Vec<f32> = vec![1.0, 1.0, 9.0, 1.0, 1.0];
        let baseline = strip(&data, 1, 10, 1.0, &[]).unwrap();
        assert_eq!(baseline, vec![1.0f32; 5]);
    }

    #[test]
    fn test_errors() {
        let empty: [f64; 0] = [];
        assert_eq!(
            strip(&empty, 1, 1, 1.0, &[]),
            Err(BackgroundError::InvalidShape)
        );
        let data = [1.0, 2.0, 3.0];
        assert!(matches!(
            strip(&data, 0, 1, 1.0, &[]),
            Err(BackgroundError::InvalidArgument(_))
        ));
        assert!(matches!(
            strip(&data, 1, 0, 1.0, &[]),
            Err(BackgroundError::InvalidArgument(_))
        ));
        assert!(matches!(
            strip(&data, 1, 1, f64::NAN, &[]),
            Err(BackgroundError::InvalidArgument(_))
        ));
        assert!(matches!(
            strip(&data, 1, 1, 1.0, &[3]),
            Err(BackgroundError::InvalidArgument(_))
        ));
    }
}
