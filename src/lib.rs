//! `specsignal` is a library of numerical building blocks for spectral analysis: estimating
//! the continuum underneath peaked signals, locating candidate peaks in noisy data and
//! evaluating the closed-form multi-peak models used by curve fitters.
//!
//! The background estimators live in [`background`], with iterative [`strip`] clipping and
//! multiscale SNIP clipping in one ([`snip1d`]), two ([`snip2d`]) and three ([`snip3d`])
//! dimensions. Peaks are located by [`PeakSearcher`], which scores each sample against
//! its Poisson noise estimate. Peak models are evaluated by the `sum_*` functions of
//! [`peak_shapes`], and [`smooth`] provides Savitsky-Golay and simple kernel smoothing.
//!
//! # Usage
//! ```
//! use specsignal::prelude::*;
//! use specsignal::peak_shapes::sum_agauss;
//!
//! let x: Vec<f64> = (0..=100).map(|i| i as f64).collect();
//! let mut y = sum_agauss(&x, &[1000.0, 30.0, 4.0, 800.0, 70.0, 6.0]).unwrap();
//! y.iter_mut().zip(x.iter()).for_each(|(y, x)| *y += 20.0 + 0.1 * x);
//!
//! let baseline = snip1d(&y, 12).unwrap();
//! let corrected: Vec<f64> = y.iter().zip(baseline.iter()).map(|(y, b)| y - b).collect();
//!
//! let peaks = PeakSearcherBuilder::new()
//!     .fwhm(5.0)
//!     .build()
//!     .search(&corrected)
//!     .unwrap();
//! assert!(peaks.iter().any(|p| p.index.abs_diff(30) <= 1));
//! assert!(peaks.iter().any(|p| p.index.abs_diff(70) <= 1));
//! ```
//!
//! # Features
//! - `parallelism` (default) evaluates peak models, peak search responses and batches of
//!   spectra with [`rayon`](https://docs.rs/rayon). Results are identical without it.
//! - `serde` derives `Serialize` and `Deserialize` for configuration and result types.
pub mod arrayops;
pub mod background;
pub mod peak_search;
pub mod peak_shapes;
pub mod peak_statistics;
pub mod prelude;
pub mod smooth;
pub mod special;

#[cfg(test)]
mod test_data;

pub use crate::background::{
    snip1d, snip1d_multiple, snip2d, snip3d, strip, BackgroundError, Snip, Strip,
};
pub use crate::peak_search::{
    peak_search, PeakCandidate, PeakSearchError, PeakSearcher, PeakSearcherBuilder,
};
pub use crate::peak_shapes::{HypermetTerms, PeakShape, PeakShapeError, ShapeFamily};
pub use crate::smooth::{savitsky_golay, SavitskyGolay, SmoothingError};
pub use crate::special::{erf, erfc, erfcx};
