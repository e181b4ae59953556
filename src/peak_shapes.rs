//! Closed-form peak shape models evaluated as sums over flat parameter sequences.
//!
//! Every family describes one peak with a fixed-size record of `f64` parameters. A
//! parameter sequence is a concatenation of such records, and evaluating it produces
//! `y[i] = Σ shape(x[i]; record)`:
//!
//! ```rust
//! use specsignal::peak_shapes::sum_gauss;
//!
//! let x: Vec<f64> = (0..100).map(|i| i as f64).collect();
//! // two gaussians: (height, centroid, fwhm) each
//! let y = sum_gauss(&x, &[10.0, 30.0, 4.0, 5.0, 70.0, 8.0]).unwrap();
//! assert!((y[30] - 10.0).abs() < 1e-9);
//! ```
//!
//! The supported families are enumerated by [`ShapeFamily`], which can also dispatch an
//! evaluation by name. Each family has a typed record implementing [`PeakShape`]:
//! - [`GaussianPeak`], [`AreaGaussianPeak`], [`SplitGaussianPeak`]
//! - [`LorentzianPeak`], [`AreaLorentzianPeak`], [`SplitLorentzianPeak`]
//! - [`PseudoVoigtPeak`], [`AreaPseudoVoigtPeak`], [`SplitPseudoVoigtPeak`]
//! - [`DownStep`], [`UpStep`], [`Slit`]
//! - [`HypermetPeak`], whose additive terms are selected with [`HypermetTerms`]
//!
//! The `fast*` families trade a small, bounded error for speed by looking exponentials
//! up in a [`FastExp`] table.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

mod fastexp;
mod gaussian;
mod hypermet;
mod lorentzian;
mod step;
mod voigt;

pub use fastexp::{evaluate_fast_agauss, FastExp};
pub use gaussian::{AreaGaussianPeak, GaussianPeak, SplitGaussianPeak};
pub use hypermet::{HypermetPeak, HypermetTerms};
pub use lorentzian::{AreaLorentzianPeak, LorentzianPeak, SplitLorentzianPeak};
pub use step::{DownStep, Slit, UpStep};
pub use voigt::{AreaPseudoVoigtPeak, PseudoVoigtPeak, SplitPseudoVoigtPeak};

/// `4 ln 2`, the gaussian exponent scale when written in terms of the FWHM
pub(crate) const FOUR_LN2: f64 = 2.772588722239781;
/// `1 / (2 √(2 ln 2))`, converting a FWHM into a gaussian standard deviation
pub(crate) const SIGMA_PER_FWHM: f64 = 0.42466090014400953;
/// `√(2π)`
pub(crate) const SQRT_2PI: f64 = 2.5066282746310002;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeakShapeError {
    #[error(
        "{family} parameters come in records of {record_size} values, received {received} values"
    )]
    InvalidParameterCount {
        family: ShapeFamily,
        record_size: usize,
        received: usize,
    },
    #[error("Unknown peak shape family {0:?}")]
    UnknownFamily(String),
}

/// A peak shape described by a fixed-size parameter record
pub trait PeakShape: Sized + Send + Sync {
    /// The number of parameters describing one peak
    const RECORD_SIZE: usize;

    /// Build a peak from exactly [`PeakShape::RECORD_SIZE`] parameters
    fn from_record(record: &[f64]) -> Self;

    /// The flat parameter record describing this peak
    fn to_record(&self) -> Vec<f64>;

    /// Compute the theoretical signal of this peak at a specified coordinate
    fn density(&self, x: f64) -> f64;

    /// Given a coordinate sequence, produce the complementary sequence of theoretical signal
    fn predict(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|x| self.density(*x)).collect()
    }
}

/// Split `params` into typed records, rejecting sequences that are not a whole number of records
pub fn parse_records<S: PeakShape>(
    params: &[f64],
    family: ShapeFamily,
) -> Result<Vec<S>, PeakShapeError> {
    debug_assert_eq!(family.record_size(), S::RECORD_SIZE);
    if params.len() % S::RECORD_SIZE != 0 {
        return Err(PeakShapeError::InvalidParameterCount {
            family,
            record_size: S::RECORD_SIZE,
            received: params.len(),
        });
    }
    Ok(params
        .chunks_exact(S::RECORD_SIZE)
        .map(S::from_record)
        .collect())
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallelism")] {
        fn map_points<G: Fn(f64) -> f64 + Sync>(x: &[f64], point: G) -> Vec<f64> {
            x.par_iter().with_min_len(1024).map(|x| point(*x)).collect()
        }
    } else {
        fn map_points<G: Fn(f64) -> f64 + Sync>(x: &[f64], point: G) -> Vec<f64> {
            x.iter().map(|x| point(*x)).collect()
        }
    }
}

/// Sum `density` over every peak at every coordinate in `x`
pub fn evaluate_with<S, G>(x: &[f64], peaks: &[S], density: G) -> Vec<f64>
where
    S: Sync,
    G: Fn(&S, f64) -> f64 + Sync,
{
    map_points(x, |xi| peaks.iter().map(|p| density(p, xi)).sum())
}

/// Sum the signal of every peak in `peaks` at every coordinate in `x`
pub fn evaluate_peaks<S: PeakShape>(x: &[f64], peaks: &[S]) -> Vec<f64> {
    evaluate_with(x, peaks, S::density)
}

fn sum_shape<S: PeakShape>(
    x: &[f64],
    params: &[f64],
    family: ShapeFamily,
) -> Result<Vec<f64>, PeakShapeError> {
    let peaks: Vec<S> = parse_records(params, family)?;
    Ok(evaluate_peaks(x, &peaks))
}

/// The peak shape families this library can evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeFamily {
    Gauss,
    AGauss,
    FastAGauss,
    SplitGauss,
    PVoigt,
    APVoigt,
    SplitPVoigt,
    Lorentz,
    ALorentz,
    SplitLorentz,
    DownStep,
    UpStep,
    Slit,
    AHypermet,
    FastAHypermet,
}

impl ShapeFamily {
    pub const ALL: [ShapeFamily; 15] = [
        Self::Gauss,
        Self::AGauss,
        Self::FastAGauss,
        Self::SplitGauss,
        Self::PVoigt,
        Self::APVoigt,
        Self::SplitPVoigt,
        Self::Lorentz,
        Self::ALorentz,
        Self::SplitLorentz,
        Self::DownStep,
        Self::UpStep,
        Self::Slit,
        Self::AHypermet,
        Self::FastAHypermet,
    ];

    /// The number of parameters describing one peak of this family
    pub const fn record_size(&self) -> usize {
        match self {
            Self::Gauss | Self::AGauss | Self::FastAGauss => 3,
            Self::Lorentz | Self::ALorentz => 3,
            Self::DownStep | Self::UpStep => 3,
            Self::SplitGauss | Self::PVoigt | Self::APVoigt => 4,
            Self::SplitLorentz | Self::Slit => 4,
            Self::SplitPVoigt => 5,
            Self::AHypermet | Self::FastAHypermet => 8,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Gauss => "gauss",
            Self::AGauss => "agauss",
            Self::FastAGauss => "fastagauss",
            Self::SplitGauss => "splitgauss",
            Self::PVoigt => "pvoigt",
            Self::APVoigt => "apvoigt",
            Self::SplitPVoigt => "splitpvoigt",
            Self::Lorentz => "lorentz",
            Self::ALorentz => "alorentz",
            Self::SplitLorentz => "splitlorentz",
            Self::DownStep => "downstep",
            Self::UpStep => "upstep",
            Self::Slit => "slit",
            Self::AHypermet => "ahypermet",
            Self::FastAHypermet => "fastahypermet",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, PeakShapeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == name)
            .ok_or_else(|| PeakShapeError::UnknownFamily(name.to_string()))
    }

    /// Evaluate a parameter sequence of this family over `x`.
    ///
    /// Hypermet families use every term, see [`ShapeFamily::evaluate_hypermet`] to
    /// select them.
    pub fn evaluate(&self, x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
        self.evaluate_hypermet(x, params, HypermetTerms::default())
    }

    /// Evaluate a parameter sequence of this family over `x`, using `terms` when this is a
    /// hypermet family
    pub fn evaluate_hypermet(
        &self,
        x: &[f64],
        params: &[f64],
        terms: HypermetTerms,
    ) -> Result<Vec<f64>, PeakShapeError> {
        match self {
            Self::Gauss => sum_gauss(x, params),
            Self::AGauss => sum_agauss(x, params),
            Self::FastAGauss => sum_fastagauss(x, params),
            Self::SplitGauss => sum_splitgauss(x, params),
            Self::PVoigt => sum_pvoigt(x, params),
            Self::APVoigt => sum_apvoigt(x, params),
            Self::SplitPVoigt => sum_splitpvoigt(x, params),
            Self::Lorentz => sum_lorentz(x, params),
            Self::ALorentz => sum_alorentz(x, params),
            Self::SplitLorentz => sum_splitlorentz(x, params),
            Self::DownStep => sum_downstep(x, params),
            Self::UpStep => sum_upstep(x, params),
            Self::Slit => sum_slit(x, params),
            Self::AHypermet => sum_ahypermet(x, params, terms),
            Self::FastAHypermet => sum_fastahypermet(x, params, terms),
        }
    }
}

impl fmt::Display for ShapeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeFamily {
    type Err = PeakShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Sum of gaussians, records of `(height, centroid, fwhm)`
pub fn sum_gauss(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<GaussianPeak>(x, params, ShapeFamily::Gauss)
}

/// Sum of area-normalized gaussians, records of `(area, centroid, fwhm)`
pub fn sum_agauss(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<AreaGaussianPeak>(x, params, ShapeFamily::AGauss)
}

/// [`sum_agauss`] using a freshly built [`FastExp`] table
pub fn sum_fastagauss(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    FastExp::new().sum_agauss(x, params)
}

/// Sum of gaussians with different widths on each side, records of
/// `(height, centroid, fwhm_left, fwhm_right)`
pub fn sum_splitgauss(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<SplitGaussianPeak>(x, params, ShapeFamily::SplitGauss)
}

/// Sum of pseudo-Voigt peaks, records of `(height, centroid, fwhm, eta)`
pub fn sum_pvoigt(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<PseudoVoigtPeak>(x, params, ShapeFamily::PVoigt)
}

/// Sum of area-normalized pseudo-Voigt peaks, records of `(area, centroid, fwhm, eta)`
pub fn sum_apvoigt(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<AreaPseudoVoigtPeak>(x, params, ShapeFamily::APVoigt)
}

/// Sum of split pseudo-Voigt peaks, records of
/// `(height, centroid, fwhm_left, fwhm_right, eta)`
pub fn sum_splitpvoigt(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<SplitPseudoVoigtPeak>(x, params, ShapeFamily::SplitPVoigt)
}

/// Sum of Lorentzians, records of `(height, centroid, fwhm)`
pub fn sum_lorentz(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<LorentzianPeak>(x, params, ShapeFamily::Lorentz)
}

/// Sum of area-normalized Lorentzians, records of `(area, centroid, fwhm)`
pub fn sum_alorentz(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<AreaLorentzianPeak>(x, params, ShapeFamily::ALorentz)
}

/// Sum of split Lorentzians, records of `(height, centroid, fwhm_left, fwhm_right)`
pub fn sum_splitlorentz(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<SplitLorentzianPeak>(x, params, ShapeFamily::SplitLorentz)
}

/// Sum of falling error function edges, records of `(height, centroid, fwhm)`
pub fn sum_downstep(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<DownStep>(x, params, ShapeFamily::DownStep)
}

/// Sum of rising error function edges, records of `(height, centroid, fwhm)`
pub fn sum_upstep(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<UpStep>(x, params, ShapeFamily::UpStep)
}

/// Sum of smoothed plateaus, records of `(height, centroid, fwhm, beamfwhm)`
pub fn sum_slit(x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
    sum_shape::<Slit>(x, params, ShapeFamily::Slit)
}

/// Sum of hypermet peaks, records of
/// `(area, position, fwhm, st_area_r, st_slope_r, lt_area_r, lt_slope_r, step_height_r)`,
/// including only the terms enabled in `terms`
pub fn sum_ahypermet(
    x: &[f64],
    params: &[f64],
    terms: HypermetTerms,
) -> Result<Vec<f64>, PeakShapeError> {
    let peaks: Vec<HypermetPeak> = parse_records::<HypermetPeak>(params, ShapeFamily::AHypermet)?
        .into_iter()
        .map(|p| p.with_terms(terms))
        .collect();
    Ok(evaluate_peaks(x, &peaks))
}

/// [`sum_ahypermet`] using a freshly built [`FastExp`] table
pub fn sum_fastahypermet(
    x: &[f64],
    params: &[f64],
    terms: HypermetTerms,
) -> Result<Vec<f64>, PeakShapeError> {
    FastExp::new().sum_ahypermet(x, params, terms)
}
