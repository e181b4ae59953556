//! Pseudo-Voigt profiles, a linear mixture of a Lorentzian and a gaussian sharing a
//! centroid and width. `eta` is the Lorentzian fraction.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::gaussian::{gaussian_exponent, AREA_TO_HEIGHT};
use super::lorentzian::{lorentzian_height, lorentzian_profile};
use super::PeakShape;

#[inline]
fn mixture(
    x: f64,
    centroid: f64,
    fwhm: f64,
    eta: f64,
    lorentz_height: f64,
    gauss_height: f64,
) -> f64 {
    eta * lorentz_height * lorentzian_profile(x, centroid, fwhm)
        + (1.0 - eta) * gauss_height * (-gaussian_exponent(x, centroid, fwhm)).exp()
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PseudoVoigtPeak {
    pub height: f64,
    pub centroid: f64,
    pub fwhm: f64,
    pub eta: f64,
}

impl PseudoVoigtPeak {
    pub fn new(height: f64, centroid: f64, fwhm: f64, eta: f64) -> Self {
        Self {
            height,
            centroid,
            fwhm,
            eta,
        }
    }
}

impl PeakShape for PseudoVoigtPeak {
    const RECORD_SIZE: usize = 4;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2], record[3])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![self.height, self.centroid, self.fwhm, self.eta]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        mixture(
            x,
            self.centroid,
            self.fwhm,
            self.eta,
            self.height,
            self.height,
        )
    }
}

/// A pseudo-Voigt whose components each integrate to `area`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AreaPseudoVoigtPeak {
    pub area: f64,
    pub centroid: f64,
    pub fwhm: f64,
    pub eta: f64,
}

impl AreaPseudoVoigtPeak {
    pub fn new(area: f64, centroid: f64, fwhm: f64, eta: f64) -> Self {
        Self {
            area,
            centroid,
            fwhm,
            eta,
        }
    }
}

impl PeakShape for AreaPseudoVoigtPeak {
    const RECORD_SIZE: usize = 4;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2], record[3])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![self.area, self.centroid, self.fwhm, self.eta]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        mixture(
            x,
            self.centroid,
            self.fwhm,
            self.eta,
            lorentzian_height(self.area, self.fwhm),
            self.area * AREA_TO_HEIGHT / self.fwhm,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitPseudoVoigtPeak {
    pub height: f64,
    pub centroid: f64,
    pub fwhm_left: f64,
    pub fwhm_right: f64,
    pub eta: f64,
}

impl SplitPseudoVoigtPeak {
    pub fn new(height: f64, centroid: f64, fwhm_left: f64, fwhm_right: f64, eta: f64) -> Self {
        Self {
            height,
            centroid,
            fwhm_left,
            fwhm_right,
            eta,
        }
    }
}

impl PeakShape for SplitPseudoVoigtPeak {
    const RECORD_SIZE: usize = 5;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2], record[3], record[4])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![
            self.height,
            self.centroid,
            self.fwhm_left,
            self.fwhm_right,
            self.eta,
        ]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        let fwhm = if x < self.centroid {
            self.fwhm_left
        } else {
            self.fwhm_right
        };
        mixture(x, self.centroid, fwhm, self.eta, self.height, self.height)
    }
}
