#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{PeakShape, FOUR_LN2};

/// `2 √(ln 2 / π)`, the height of a unit-area gaussian with unit FWHM
pub(crate) const AREA_TO_HEIGHT: f64 = 0.9394372786996513;

#[inline]
pub(crate) fn gaussian_exponent(x: f64, centroid: f64, fwhm: f64) -> f64 {
    let d = (x - centroid) / fwhm;
    FOUR_LN2 * d * d
}

/// A gaussian parameterized by its height
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaussianPeak {
    pub height: f64,
    pub centroid: f64,
    pub fwhm: f64,
}

impl GaussianPeak {
    pub fn new(height: f64, centroid: f64, fwhm: f64) -> Self {
        Self {
            height,
            centroid,
            fwhm,
        }
    }
}

impl PeakShape for GaussianPeak {
    const RECORD_SIZE: usize = 3;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![self.height, self.centroid, self.fwhm]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        self.height * (-gaussian_exponent(x, self.centroid, self.fwhm)).exp()
    }
}

/// A gaussian parameterized by its integrated area
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AreaGaussianPeak {
    pub area: f64,
    pub centroid: f64,
    pub fwhm: f64,
}

impl AreaGaussianPeak {
    pub fn new(area: f64, centroid: f64, fwhm: f64) -> Self {
        Self {
            area,
            centroid,
            fwhm,
        }
    }

    /// The apex height of this peak
    pub fn height(&self) -> f64 {
        self.area * AREA_TO_HEIGHT / self.fwhm
    }
}

impl PeakShape for AreaGaussianPeak {
    const RECORD_SIZE: usize = 3;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![self.area, self.centroid, self.fwhm]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        self.height() * (-gaussian_exponent(x, self.centroid, self.fwhm)).exp()
    }
}

/// A gaussian with a different width on either side of its centroid
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitGaussianPeak {
    pub height: f64,
    pub centroid: f64,
    pub fwhm_left: f64,
    pub fwhm_right: f64,
}

impl SplitGaussianPeak {
    pub fn new(height: f64, centroid: f64, fwhm_left: f64, fwhm_right: f64) -> Self {
        Self {
            height,
            centroid,
            fwhm_left,
            fwhm_right,
        }
    }

    #[inline]
    pub(crate) fn side_fwhm(&self, x: f64) -> f64 {
        if x < self.centroid {
            self.fwhm_left
        } else {
            self.fwhm_right
        }
    }
}

impl PeakShape for SplitGaussianPeak {
    const RECORD_SIZE: usize = 4;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2], record[3])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![self.height, self.centroid, self.fwhm_left, self.fwhm_right]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        self.height * (-gaussian_exponent(x, self.centroid, self.side_fwhm(x))).exp()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_split_gauss_sides() {
        let peak = SplitGaussianPeak::new(10.0, 0.0, 2.0, 8.0);
        assert!((peak.density(-1.0) - 5.0).abs() < 1e-9);
        assert!((peak.density(4.0) - 5.0).abs() < 1e-9);
        assert_eq!(peak.density(0.0), 10.0);

        let symmetric = SplitGaussianPeak::new(10.0, 3.0, 5.0, 5.0);
        let gauss = GaussianPeak::new(10.0, 3.0, 5.0);
        for x in [-4.0, 0.0, 2.9, 3.0, 7.5] {
            assert_eq!(symmetric.density(x), gauss.density(x));
        }
    }

    #[test]
    fn test_area_gauss_height() {
        let peak = AreaGaussianPeak::new(100.0, 5.0, 2.0);
        let sigma = 2.0 * super::super::SIGMA_PER_FWHM;
        let expected = 100.0 / (sigma * super::super::SQRT_2PI);
        assert!((peak.height() - expected).abs() < 1e-9);
        assert!((peak.density(5.0) - expected).abs() < 1e-9);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde() {
        let peak = GaussianPeak::new(2.0, 1.0, 0.5);
        let text = serde_json::to_string(&peak).unwrap();
        let dup: GaussianPeak = serde_json::from_str(&text).unwrap();
        assert_eq!(peak, dup);
    }
}
