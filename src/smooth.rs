//! Smoothing filters for uniformly sampled signals.
//!
//! [`savitsky_golay`] fits a local polynomial in a sliding window, while [`smooth1d`],
//! [`smooth2d`] and [`smooth3d`] apply a light `[¼, ½, ¼]` kernel in place along every axis.

use log::{debug, trace};
use nalgebra::{DMatrix, DVector};
use ndarray::{ArrayViewMut, Axis, Dimension, Ix2, Ix3};
use num_traits::Float;
use thiserror::Error;

/// The narrowest window [`SavitskyGolay`] accepts
pub const MIN_WINDOW_SIZE: usize = 3;
/// The widest window [`SavitskyGolay`] accepts
pub const MAX_WINDOW_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmoothingError {
    #[error("The window size must be between 3 and 100, received {0}")]
    InvalidWindowSize(usize),
    #[error(
        "The window length must be shorter than the data, received {0} window with {1} data points"
    )]
    WindowLengthTooLong(usize, usize),
    #[error("The polynomial order term {0} must be less than the window size {1}")]
    PolynomialOrderTooLarge(usize, usize),
    #[error("Failed to solve for coefficients: {0}")]
    FailedToSolveCoefficients(&'static str),
    #[error("Declared dimensions span {expected} samples but the data holds {actual}")]
    InvalidDimensions { expected: usize, actual: usize },
}

/// Smooth `data` in place with a `[¼, ½, ¼]` kernel.
///
/// The first sample treats itself as its left neighbor and the last sample is
/// replaced by `¼·previous + ¾·last`, so flat signals are left untouched. Sequences
/// shorter than three samples are not modified.
pub fn smooth1d<F: Float>(data: &mut [F]) {
    let n = data.len();
    if n < 3 {
        return;
    }
    let quarter = F::from(0.25).unwrap();
    let two = F::from(2.0).unwrap();
    let mut prev_sample = data[0];
    for i in 0..(n - 1) {
        let next_sample = quarter * (prev_sample + two * data[i] + data[i + 1]);
        prev_sample = data[i];
        data[i] = next_sample;
    }
    data[n - 1] = quarter * prev_sample + F::from(0.75).unwrap() * data[n - 1];
}

fn smooth_lanes<F: Float, D: Dimension>(view: &mut ArrayViewMut<'_, F, D>, axis: Axis) {
    let mut buffer: Vec<F> = Vec::new();
    for mut lane in view.lanes_mut(axis) {
        match lane.as_slice_mut() {
            Some(contiguous) => smooth1d(contiguous),
            None => {
                buffer.clear();
                buffer.extend(lane.iter().copied());
                smooth1d(&mut buffer);
                lane.iter_mut()
                    .zip(buffer.iter())
                    .for_each(|(dest, src)| *dest = *src);
            }
        }
    }
}

/// Verify the product of `dims` is exactly `actual`, returning that product
fn check_dimensions(dims: &[usize], actual: usize) -> Result<usize, SmoothingError> {
    let expected = dims
        .iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))
        .unwrap_or(usize::MAX);
    if expected != actual {
        Err(SmoothingError::InvalidDimensions { expected, actual })
    } else {
        Ok(expected)
    }
}

/// Smooth a row-major `nrows × ncolumns` image in place, first along every row and then
/// along every column.
pub fn smooth2d<F: Float>(
    data: &mut [F],
    nrows: usize,
    ncolumns: usize,
) -> Result<(), SmoothingError> {
    let actual = data.len();
    let expected = check_dimensions(&[nrows, ncolumns], actual)?;
    let mut view = ArrayViewMut::<F, Ix2>::from_shape((nrows, ncolumns), data)
        .map_err(|_| SmoothingError::InvalidDimensions { expected, actual })?;
    smooth_lanes(&mut view, Axis(1));
    smooth_lanes(&mut view, Axis(0));
    Ok(())
}

/// Smooth a row-major `nx × ny × nz` volume in place along each axis in turn.
pub fn smooth3d<F: Float>(
    data: &mut [F],
    nx: usize,
    ny: usize,
    nz: usize,
) -> Result<(), SmoothingError> {
    let actual = data.len();
    let expected = check_dimensions(&[nx, ny, nz], actual)?;
    let mut view = ArrayViewMut::<F, Ix3>::from_shape((nx, ny, nz), data)
        .map_err(|_| SmoothingError::InvalidDimensions { expected, actual })?;
    smooth_lanes(&mut view, Axis(2));
    smooth_lanes(&mut view, Axis(1));
    smooth_lanes(&mut view, Axis(0));
    Ok(())
}

fn factorial(n: usize) -> usize {
    match n {
        0 => 1,
        1 => 1,
        _ => factorial(n - 1) * n,
    }
}

#[derive(Debug, Clone)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    pub fn order(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn derivative(&self) -> Polynomial {
        if self.coefficients.len() <= 1 {
            return Polynomial::new(vec![0.0]);
        }
        Polynomial::new(
            self.coefficients[1..]
                .iter()
                .enumerate()
                .map(|(i, c)| *c * (i + 1) as f64)
                .collect(),
        )
    }

    pub fn derivative_to(&self, derivative: usize) -> Polynomial {
        (0..derivative).fold(self.clone(), |state, _| state.derivative())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.coefficients.iter()
    }

    /// Evaluate the polynomial at `value` using Horner's scheme
    pub fn eval(&self, value: f64) -> f64 {
        self.iter().rev().fold(0.0, |acc, c| acc * value + *c)
    }
}

impl AsRef<[f64]> for Polynomial {
    fn as_ref(&self) -> &[f64] {
        &self.coefficients
    }
}

/// A Savitsky-Golay smoothing and differentiation filter.
///
/// The convolution weights are the least squares solution of the window's Vandermonde
/// system. Samples within half a window of either edge are filled by fitting a single
/// polynomial of the same order to the first (or last) full window.
///
/// Derivatives are expressed per sample, assuming unit spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavitskyGolay {
    /// The number of points in the smoothing window. Even values are widened by one.
    pub window_length: usize,
    /// The order of the local polynomial
    pub poly_order: usize,
    /// Which derivative to compute, `0` for plain smoothing
    pub derivative: usize,
}

impl Default for SavitskyGolay {
    fn default() -> Self {
        Self {
            window_length: 5,
            poly_order: 2,
            derivative: 0,
        }
    }
}

impl SavitskyGolay {
    pub fn new(window_length: usize) -> Self {
        Self {
            window_length,
            ..Self::default()
        }
    }

    pub fn window_length(mut self, window_length: usize) -> Self {
        self.window_length = window_length;
        self
    }

    pub fn poly_order(mut self, poly_order: usize) -> Self {
        self.poly_order = poly_order;
        self
    }

    pub fn derivative(mut self, derivative: usize) -> Self {
        self.derivative = derivative;
        self
    }

    /// Check the configuration against a signal of `n` points, returning the effective
    /// (odd) window length.
    fn validate(&self, n: usize) -> Result<usize, SmoothingError> {
        if !(MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE).contains(&self.window_length) {
            return Err(SmoothingError::InvalidWindowSize(self.window_length));
        }
        let window = if self.window_length % 2 == 0 {
            self.window_length + 1
        } else {
            self.window_length
        };
        if window > n {
            Err(SmoothingError::WindowLengthTooLong(window, n))
        } else if self.poly_order >= window {
            Err(SmoothingError::PolynomialOrderTooLarge(self.poly_order, window))
        } else {
            Ok(window)
        }
    }

    /// Solve for the correlation weights of the central point of a `window` wide window
    fn estimate_coefficients(&self, window: usize) -> Result<DVector<f64>, SmoothingError> {
        if self.derivative > self.poly_order {
            return Ok(DVector::from_element(window, 0.0));
        }
        let half_length = (window / 2) as f64;
        let vandermonde = DMatrix::from_fn(self.poly_order + 1, window, |i, j| {
            (j as f64 - half_length).powi(i as i32)
        });

        let mut y = DVector::from_element(self.poly_order + 1, 0.0);
        y[self.derivative] = factorial(self.derivative) as f64;

        let svd = nalgebra::linalg::SVD::new(vandermonde, true, true);
        svd.solve(&y, 1e-12)
            .map_err(SmoothingError::FailedToSolveCoefficients)
    }

    fn polyfit(&self, y: &[f64]) -> Result<Polynomial, SmoothingError> {
        let nc = self.poly_order + 1;
        let system = DMatrix::from_fn(y.len(), nc, |row_i, col_j| {
            (row_i as f64).powi(col_j as i32)
        });
        let beta = DVector::from_column_slice(y);
        let decomp = nalgebra::linalg::SVD::new(system, true, true);
        let poly_coefs = decomp
            .solve(&beta, 1e-18)
            .map_err(SmoothingError::FailedToSolveCoefficients)?;
        Ok(Polynomial::new(poly_coefs.iter().copied().collect()))
    }

    /// Fit the window `data[window_start..window_start + window]` and write the fitted
    /// values for `interp_start..interp_stop` into `out`
    fn fit_edge(
        &self,
        data: &[f64],
        window: usize,
        window_start: usize,
        interp_start: usize,
        interp_stop: usize,
        out: &mut [f64],
    ) -> Result<(), SmoothingError> {
        let poly = self
            .polyfit(&data[window_start..window_start + window])?
            .derivative_to(self.derivative);
        trace!(
            "Edge polynomial of order {} over {window_start}..{}",
            poly.order(),
            window_start + window
        );
        for i in interp_start..interp_stop {
            out[i] = poly.eval((i - window_start) as f64);
        }
        Ok(())
    }

    /// Apply the filter to `data`, returning a new sequence of the same length
    pub fn smooth(&self, data: &[f64]) -> Result<Vec<f64>, SmoothingError> {
        let n = data.len();
        let window = self.validate(n)?;
        let half = window / 2;
        let coefs = self.estimate_coefficients(window)?;
        debug!(
            "Savitsky-Golay window {window}, order {}, derivative {}",
            self.poly_order, self.derivative
        );

        let mut out = vec![0.0; n];
        for (i, dest) in out.iter_mut().enumerate().take(n - half).skip(half) {
            *dest = data[i - half..=i + half]
                .iter()
                .zip(coefs.iter())
                .map(|(y, c)| y * c)
                .sum();
        }
        self.fit_edge(data, window, 0, 0, half, &mut out)?;
        self.fit_edge(data, window, n - window, n - half, n, &mut out)?;
        Ok(out)
    }
}

/// Smooth `data` with a quadratic Savitsky-Golay filter over `npoints`.
///
/// `npoints` must lie in `[3, 100]`; anything else is an error rather than a silently
/// unsmoothed result.
pub fn savitsky_golay(data: &[f64], npoints: usize) -> Result<Vec<f64>, SmoothingError> {
    SavitskyGolay::new(npoints).smooth(data)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_data::noisy_spectrum;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(101)]
    #[case(200)]
    fn test_invalid_window(#[case] npoints: usize) {
        let data = vec![1.0; 300];
        assert_eq!(
            savitsky_golay(&data, npoints),
            Err(SmoothingError::InvalidWindowSize(npoints))
        );
    }

    #[test]
    fn test_window_longer_than_data() {
        let err = savitsky_golay(&[1.0, 2.0, 3.0], 5).unwrap_err();
        assert_eq!(err, SmoothingError::WindowLengthTooLong(5, 3));
    }

    #[test]
    fn test_classic_coefficients() {
        let sg = SavitskyGolay::default();
        let coefs = sg.estimate_coefficients(5).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0];
        for (c, e) in coefs.iter().zip(expected.iter()) {
            assert!((c - e / 35.0).abs() < 1e-12, "{c} {e}");
        }
    }

    #[rstest]
    #[case(3)]
    #[case(5)]
    #[case(8)]
    #[case(21)]
    fn test_preserves_quadratic(#[case] npoints: usize) {
        let data: Vec<f64> = (0..60)
            .map(|i| {
                let x = i as f64;
                0.5 * x * x - 3.0 * x + 7.0
            })
            .collect();
        let smoothed = savitsky_golay(&data, npoints).unwrap();
        assert_eq!(smoothed.len(), data.len());
        for (a, b) in data.iter().zip(smoothed.iter()) {
            assert!((a - b).abs() < 1e-6 * a.abs().max(1.0), "{a} {b}");
        }
    }

    #[test]
    fn test_first_derivative() {
        let data: Vec<f64> = (0..40).map(|i| 2.0 * i as f64 + 1.0).collect();
        let d = SavitskyGolay::new(7)
            .poly_order(2)
            .derivative(1)
            .smooth(&data)
            .unwrap();
        for v in d {
            assert!((v - 2.0).abs() < 1e-8, "{v}");
        }
    }

    #[test]
    fn test_reduces_noise() {
        let (_, clean, noisy) = noisy_spectrum();
        let smoothed = savitsky_golay(&noisy, 9).unwrap();
        let err = |a: &[f64]| -> f64 {
            a.iter()
                .zip(clean.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
        };
        assert!(err(&smoothed) < err(&noisy));
    }

    #[test]
    fn test_polynomial() {
        let p = Polynomial::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(p.eval(2.0), 17.0);
        assert_eq!(p.derivative().as_ref(), &[2.0, 6.0]);
        assert_eq!(p.derivative_to(3).as_ref(), &[0.0]);
        assert_eq!(p.order(), 2);
    }

    #[test]
    fn test_smooth1d_constant_and_impulse() {
        let mut flat = vec![3.0f32; 10];
        smooth1d(&mut flat);
        assert!(flat.iter().all(|v| *v == 3.0));

        let mut impulse = vec![0.0, 0.0, 4.0, 0.0, 0.0];
        smooth1d(&mut impulse);
        assert_eq!(impulse, vec![0.0, 1.0, 2.0, 1.0, 0.0]);

        let mut short = vec![1.0, 5.0];
        smooth1d(&mut short);
        assert_eq!(short, vec![1.0, 5.0]);
    }

    #[test]
    fn test_smooth2d() {
        let mut image = vec![0.0; 25];
        image[12] = 16.0;
        smooth2d(&mut image, 5, 5).unwrap();
        assert_eq!(image[12], 4.0);
        assert_eq!(image[7], 2.0);
        assert_eq!(image[6], 1.0);
        assert!((image.iter().sum::<f64>() - 16.0).abs() < 1e-12);

        let err = smooth2d(&mut image, 4, 5).unwrap_err();
        assert_eq!(
            err,
            SmoothingError::InvalidDimensions {
                expected: 20,
                actual: 25
            }
        );
    }

    #[test]
    fn test_smooth3d() {
        let mut volume = vec![2.5; 4 * 5 * 6];
        smooth3d(&mut volume, 4, 5, 6).unwrap();
        assert!(volume.iter().all(|v| (*v - 2.5).abs() < 1e-12));

        let mut volume = vec![0.0; 27];
        volume[13] = 64.0;
        smooth3d(&mut volume, 3, 3, 3).unwrap();
        assert_eq!(volume[13], 8.0);
        assert!(smooth3d(&mut volume, 3, 3, 2).is_err());
    }

    #[rstest]
    #[case(usize::MAX, 2, 1)]
    #[case(usize::MAX / 2 + 1, 2, 1)]
    #[case(usize::MAX / 3, 4, 1)]
    #[case(usize::MAX, usize::MAX, usize::MAX)]
    fn test_overflowing_dimensions(#[case] nx: usize, #[case] ny: usize, #[case] nz: usize) {
        let mut data = vec![1.0; 8];
        assert_eq!(
            smooth2d(&mut data, nx, ny),
            Err(SmoothingError::InvalidDimensions {
                expected: usize::MAX,
                actual: 8
            })
        );
        assert_eq!(
            smooth3d(&mut data, nx, ny, nz),
            Err(SmoothingError::InvalidDimensions {
                expected: usize::MAX,
                actual: 8
            })
        );
        assert_eq!(data, vec![1.0; 8]);
    }
}
