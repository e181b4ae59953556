//! Edges and plateaus built from the complementary error function.
use std::f64::consts::SQRT_2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{PeakShape, SIGMA_PER_FWHM};
use crate::special::erfc_scalar;

/// The argument scale turning a distance into an `erfc` argument for an edge of width `fwhm`
#[inline]
fn edge_argument(distance: f64, fwhm: f64) -> f64 {
    distance / (fwhm * SIGMA_PER_FWHM * SQRT_2)
}

/// A falling edge, `height` well below the centroid and zero well above it
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DownStep {
    pub height: f64,
    pub centroid: f64,
    pub fwhm: f64,
}

impl DownStep {
    pub fn new(height: f64, centroid: f64, fwhm: f64) -> Self {
        Self {
            height,
            centroid,
            fwhm,
        }
    }
}

impl PeakShape for DownStep {
    const RECORD_SIZE: usize = 3;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![self.height, self.centroid, self.fwhm]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        self.height * 0.5 * erfc_scalar(edge_argument(x - self.centroid, self.fwhm))
    }
}

/// A rising edge, zero well below the centroid and `height` well above it
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UpStep {
    pub height: f64,
    pub centroid: f64,
    pub fwhm: f64,
}

impl UpStep {
    pub fn new(height: f64, centroid: f64, fwhm: f64) -> Self {
        Self {
            height,
            centroid,
            fwhm,
        }
    }
}

impl PeakShape for UpStep {
    const RECORD_SIZE: usize = 3;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![self.height, self.centroid, self.fwhm]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        // 1 + erf(u) == erfc(-u)
        self.height * 0.5 * erfc_scalar(-edge_argument(x - self.centroid, self.fwhm))
    }
}

/// A plateau of width `fwhm` whose edges are blurred by a gaussian beam of width `beam_fwhm`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Slit {
    pub height: f64,
    pub centroid: f64,
    pub fwhm: f64,
    pub beam_fwhm: f64,
}

impl Slit {
    pub fn new(height: f64, centroid: f64, fwhm: f64, beam_fwhm: f64) -> Self {
        Self {
            height,
            centroid,
            fwhm,
            beam_fwhm,
        }
    }
}

impl PeakShape for Slit {
    const RECORD_SIZE: usize = 4;

    fn from_record(record: &[f64]) -> Self {
        Self::new(record[0], record[1], record[2], record[3])
    }

    fn to_record(&self) -> Vec<f64> {
        vec![self.height, self.centroid, self.fwhm, self.beam_fwhm]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        let half = 0.5 * self.fwhm;
        let d = x - self.centroid;
        let rising = erfc_scalar(edge_argument(d - half, self.beam_fwhm));
        let falling = erfc_scalar(edge_argument(d + half, self.beam_fwhm));
        self.height * 0.5 * (rising - falling)
    }
}
