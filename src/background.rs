//! Estimate the slowly varying continuum underneath peaked signals.
//!
//! Two families of estimators are provided:
//! - [`strip`] iteratively replaces every sample with the mean of its two neighbors at a fixed
//!   distance whenever the sample sits above that mean, optionally leaving anchor samples
//!   fixed.
//! - [`snip1d`], [`snip2d`] and [`snip3d`] implement multiscale SNIP clipping on a
//!   variance-stabilized copy of the data, shrinking the clipping radius from the requested
//!   width down to one sample.
//!
//! Both return a new buffer of the same length as their input, and both are generic over
//! [`num_traits::Float`].
//!
//! ```rust
//! use specsignal::background::{snip1d, strip};
//!
//! let mut data = vec![10.0; 64];
//! data[32] = 100.0;
//! let baseline = strip(&data, 1, 100, 1.0, &[]).unwrap();
//! assert!(baseline[32] < 11.0);
//! let baseline = snip1d(&data, 4).unwrap();
//! assert!(baseline[32] < 11.0);
//! ```
use thiserror::Error;

mod snip;
mod strip;
mod transform;

pub use snip::{
    snip1d, snip1d_array, snip1d_multiple, snip2d, snip2d_array, snip3d, snip3d_array, Snip,
};
pub use strip::{strip, Strip};
pub use transform::{lls, lls_inverse};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackgroundError {
    #[error("Cannot estimate a background from empty data")]
    InvalidShape,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Declared dimensions span {expected} samples but the data holds {actual}")]
    InvalidDimensions { expected: usize, actual: usize },
}

pub(crate) fn check_not_empty<F>(data: &[F]) -> Result<(), BackgroundError> {
    if data.is_empty() {
        Err(BackgroundError::InvalidShape)
    } else {
        Ok(())
    }
}

/// Verify the product of `dims` is exactly the number of samples available
pub(crate) fn check_dimensions(dims: &[usize], actual: usize) -> Result<(), BackgroundError> {
    let expected = dims
        .iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))
        .unwrap_or(usize::MAX);
    if expected != actual {
        Err(BackgroundError::InvalidDimensions { expected, actual })
    } else {
        Ok(())
    }
}
