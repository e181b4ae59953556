//! The hypermet line shape used for X-ray fluorescence lines: a gaussian with optional
//! short and long exponential tails and a flat step on its low side.
use std::f64::consts::SQRT_2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{PeakShape, SIGMA_PER_FWHM, SQRT_2PI};
use crate::special::{erfc_scalar, erfcx_scalar};

/// Selects which additive terms of a [`HypermetPeak`] are evaluated.
///
/// The bit encoding is `1` for the gaussian, `2` for the short tail, `4` for the long
/// tail and `8` for the step, so `15` enables everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HypermetTerms {
    pub gaussian: bool,
    pub short_tail: bool,
    pub long_tail: bool,
    pub step: bool,
}

impl Default for HypermetTerms {
    fn default() -> Self {
        Self::ALL
    }
}

impl HypermetTerms {
    pub const ALL: Self = Self::new(true, true, true, true);
    pub const GAUSSIAN_ONLY: Self = Self::new(true, false, false, false);

    pub const fn new(gaussian: bool, short_tail: bool, long_tail: bool, step: bool) -> Self {
        Self {
            gaussian,
            short_tail,
            long_tail,
            step,
        }
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self::new(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0)
    }

    pub const fn bits(&self) -> u8 {
        (self.gaussian as u8)
            | (self.short_tail as u8) << 1
            | (self.long_tail as u8) << 2
            | (self.step as u8) << 3
    }
}

impl From<u8> for HypermetTerms {
    fn from(value: u8) -> Self {
        Self::from_bits(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HypermetPeak {
    pub area: f64,
    pub position: f64,
    pub fwhm: f64,
    pub st_area_r: f64,
    pub st_slope_r: f64,
    pub lt_area_r: f64,
    pub lt_slope_r: f64,
    pub step_height_r: f64,
    pub terms: HypermetTerms,
}

impl HypermetPeak {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        area: f64,
        position: f64,
        fwhm: f64,
        st_area_r: f64,
        st_slope_r: f64,
        lt_area_r: f64,
        lt_slope_r: f64,
        step_height_r: f64,
    ) -> Self {
        Self {
            area,
            position,
            fwhm,
            st_area_r,
            st_slope_r,
            lt_area_r,
            lt_slope_r,
            step_height_r,
            terms: HypermetTerms::default(),
        }
    }

    pub fn with_terms(mut self, terms: HypermetTerms) -> Self {
        self.terms = terms;
        self
    }

    #[inline]
    pub fn sigma(&self) -> f64 {
        self.fwhm * SIGMA_PER_FWHM
    }

    /// The apex height of the gaussian term
    #[inline]
    pub fn height(&self) -> f64 {
        self.area / (self.sigma() * SQRT_2PI)
    }

    /// An exponentially modified gaussian tail holding `area_r` of the peak area.
    ///
    /// With `z = d/(σ√2) + σ/(√2·slope)` the tail is
    /// `area·area_r/slope · ½erfc(z) · exp(z² - d²/(2σ²))`. For `z ≥ 0` the `erfc(z)·exp(z²)`
    /// factor is taken as `erfcx(z)` so steep tails converge on `area_r` times the
    /// normalized gaussian instead of overflowing.
    fn tail<G, E>(&self, d: f64, area_r: f64, slope: f64, exp_neg: &G, exp: &E) -> f64
    where
        G: Fn(f64) -> f64,
        E: Fn(f64) -> f64,
    {
        if slope.abs() <= f64::MIN_POSITIVE {
            return 0.0;
        }
        let sigma = self.sigma();
        let z = d / (sigma * SQRT_2) + sigma / (SQRT_2 * slope);
        let c = if z >= 0.0 {
            let u = d / sigma;
            0.5 * erfcx_scalar(z) * exp_neg(0.5 * u * u)
        } else {
            let exponent = 0.5 * (sigma / slope).powi(2) + d / slope;
            0.5 * erfc_scalar(z) * exp(exponent)
        };
        self.area * area_r / slope * c
    }

    /// Evaluate the enabled terms, computing `exp(-v)` with `exp_neg` and `exp(v)` with `exp`
    #[inline]
    pub(crate) fn density_with<G, E>(&self, x: f64, exp_neg: &G, exp: &E) -> f64
    where
        G: Fn(f64) -> f64,
        E: Fn(f64) -> f64,
    {
        let sigma = self.sigma();
        let d = x - self.position;
        let height = self.height();
        let mut acc = 0.0;
        if self.terms.gaussian {
            let z = d / sigma;
            acc += height * exp_neg(0.5 * z * z);
        }
        if self.terms.short_tail {
            acc += self.tail(d, self.st_area_r, self.st_slope_r, exp_neg, exp);
        }
        if self.terms.long_tail {
            acc += self.tail(d, self.lt_area_r, self.lt_slope_r, exp_neg, exp);
        }
        if self.terms.step {
            acc += self.step_height_r * height * 0.5 * erfc_scalar(d / (sigma * SQRT_2));
        }
        acc
    }
}

impl PeakShape for HypermetPeak {
    const RECORD_SIZE: usize = 8;

    fn from_record(record: &[f64]) -> Self {
        Self::new(
            record[0], record[1], record[2], record[3], record[4], record[5], record[6], record[7],
        )
    }

    fn to_record(&self) -> Vec<f64> {
        vec![
            self.area,
            self.position,
            self.fwhm,
            self.st_area_r,
            self.st_slope_r,
            self.lt_area_r,
            self.lt_slope_r,
            self.step_height_r,
        ]
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        self.density_with(x, &|v: f64| (-v).exp(), &f64::exp)
    }
}
