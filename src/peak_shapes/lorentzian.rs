use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::PeakShape;

#[inline]
pub(crate) fn lorentzian_profile(x: f64, centroid: f64, fwhm: f64) -> f64 {
    let d = (x - centroid) / (0.5 * fwhm);
    1.0 / (1.0 + d * d)
}

/// The apex height of a Lorentzian of unit area with the given width
#[inline]
pub(crate) fn lorentzian_height(area: f64, fwhm: f64) -> f64 {
    area / (0.5 * PI * fwhm)
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LorentzianPeak {
    pub height: f64,
    pub centroid: f64,
    pub fwhm: f64,
}

impl LorentzianPeak {
    pub fn new(height: f64, centroid: f64, fwhm: f64) -> Self {
        Self {
            height,
            centroid,
            fwhm,
        }
    }
}

impl PeakShape for LorentzianPeak {
    const RECORD_SIZE: usize = 3;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![self.height, self.centroid, self.fwhm]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        self.height * lorentzian_profile(x, self.centroid, self.fwhm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AreaLorentzianPeak {
    pub area: f64,
    pub centroid: f64,
    pub fwhm: f64,
}

impl AreaLorentzianPeak {
    pub fn new(area: f64, centroid: f64, fwhm: f64) -> Self {
        Self {
            area,
            centroid,
            fwhm,
        }
    }

    pub fn height(&self) -> f64 {
        lorentzian_height(self.area, self.fwhm)
    }
}

impl PeakShape for AreaLorentzianPeak {
    const RECORD_SIZE: usize = 3;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![self.area, self.centroid, self.fwhm]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        self.height() * lorentzian_profile(x, self.centroid, self.fwhm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitLorentzianPeak {
    pub height: f64,
    pub centroid: f64,
    pub fwhm_left: f64,
    pub fwhm_right: f64,
}

impl SplitLorentzianPeak {
    pub fn new(height: f64, centroid: f64, fwhm_left: f64, fwhm_right: f64) -> Self {
        Self {
            height,
            centroid,
            fwhm_left,
            fwhm_right,
        }
    }
}

impl PeakShape for SplitLorentzianPeak {
    const RECORD_SIZE: usize = 4;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2], record[3])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![self.height, self.centroid, self.fwhm_left, self.fwhm_right]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        let fwhm = if x < self.centroid {
            self.fwhm_left
        } else {
            self.fwhm_right
        };
        self.height * lorentzian_profile(x, self.centroid, fwhm)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arrayops::{gridspace, trapz};

    #[test]
    fn test_lorentz_half_width() {
        let peak = LorentzianPeak::new(8.0, 10.0, 3.0);
        assert_eq!(peak.density(10.0), 8.0);
        assert!((peak.density(11.5) - 4.0).abs() < 1e-12);
        assert!((peak.density(8.5) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_alorentz_area() {
        // Lorentzian tails are heavy, integrate far out
        let x = gridspace(-2000.0, 2000.0, 0.05);
        let peak = AreaLorentzianPeak::new(50.0, 0.0, 2.0);
        let area = trapz(&x, &peak.predict(&x));
        assert!((area - 50.0).abs() < 0.1, "{area}");
    }

    #[test]
    fn test_split_lorentz() {
        let peak = SplitLorentzianPeak::new(1.0, 0.0, 1.0, 4.0);
        assert!((peak.density(-0.5) - 0.5).abs() < 1e-12);
        assert!((peak.density(2.0) - 0.5).abs() < 1e-12);
    }
}
