//! Sensitive Nonlinear Iterative Peak clipping.
//!
//! Data are mapped into the LLS domain (see [`lls`](super::lls)) so the clipping
//! operates on a roughly variance stabilized signal, then every interior sample is
//! repeatedly replaced by the smaller of itself and an estimate built from neighbors at
//! radius `p`, for `p = width, width - 1, …, 1`. Within one radius every estimate reads the
//! values present at the start of that radius.
use log::{debug, trace};
use ndarray::{Array, ArrayView, ArrayViewMut, Ix1, Ix2, Ix3};
use num_traits::Float;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::transform::ClippingDomain;
use super::{check_dimensions, check_not_empty, BackgroundError};

/// Configure a SNIP background estimate.
///
/// `width` is the largest clipping radius in samples, which should be on the order of the
/// width of the broadest peak to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snip {
    pub width: usize,
    /// Clip in the LLS domain rather than on the raw values
    pub variance_stabilize: bool,
}

impl Snip {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            variance_stabilize: true,
        }
    }

    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn variance_stabilize(mut self, variance_stabilize: bool) -> Self {
        self.variance_stabilize = variance_stabilize;
        self
    }

    fn validate<F>(&self, data: &[F], dims: &[usize]) -> Result<(), BackgroundError> {
        check_not_empty(data)?;
        if self.width == 0 {
            return Err(BackgroundError::InvalidArgument(
                "SNIP width must be at least 1".to_string(),
            ));
        }
        check_dimensions(dims, data.len())
    }

    fn clip_with<F, C>(&self, data: &[F], clip: C) -> Result<Vec<F>, BackgroundError>
    where
        F: Float,
        C: FnOnce(&mut [F]) -> Result<(), BackgroundError>,
    {
        let mut domain = ClippingDomain::forward(data, self.variance_stabilize);
        clip(domain.values.as_mut_slice())?;
        Ok(domain.inverse())
    }

    pub fn apply_1d<F: Float>(&self, data: &[F]) -> Result<Vec<F>, BackgroundError> {
        self.validate(data, &[data.len()])?;
        debug!("SNIP over {} samples with width {}", data.len(), self.width);
        let width = self.width;
        self.clip_with(data, |values| {
            clip_1d(values, width);
            Ok(())
        })
    }

    /// Clip `data` as `n_spectra` consecutive spectra of equal length, each independently
    pub fn apply_1d_multiple<F: Float + Send + Sync>(
        &self,
        data: &[F],
        n_spectra: usize,
    ) -> Result<Vec<F>, BackgroundError> {
        check_not_empty(data)?;
        if n_spectra == 0 {
            return Err(BackgroundError::InvalidArgument(
                "the number of spectra must be at least 1".to_string(),
            ));
        }
        let spectrum_size = data.len() / n_spectra;
        self.validate(data, &[n_spectra, spectrum_size])?;
        debug!(
            "SNIP over {n_spectra} spectra of {spectrum_size} samples with width {}",
            self.width
        );
        let mut baseline = Vec::with_capacity(data.len());
        for spectrum in clip_spectra(data, spectrum_size, *self)? {
            baseline.extend(spectrum);
        }
        Ok(baseline)
    }

    /// Clip a row-major `nrows × ncolumns` image
    pub fn apply_2d<F: Float>(
        &self,
        data: &[F],
        nrows: usize,
        ncolumns: usize,
    ) -> Result<Vec<F>, BackgroundError> {
        self.validate(data, &[nrows, ncolumns])?;
        debug!("SNIP over a {nrows}x{ncolumns} image with width {}", self.width);
        let width = self.width;
        self.clip_with(data, |values| {
            let actual = values.len();
            let mut view = ArrayViewMut::<F, Ix2>::from_shape((nrows, ncolumns), values)
                .map_err(|_| BackgroundError::InvalidDimensions {
                    expected: nrows.saturating_mul(ncolumns),
                    actual,
                })?;
            clip_2d(&mut view, width);
            Ok(())
        })
    }

    /// Clip a row-major `nx × ny × nz` volume
    pub fn apply_3d<F: Float>(
        &self,
        data: &[F],
        nx: usize,
        ny: usize,
        nz: usize,
    ) -> Result<Vec<F>, BackgroundError> {
        self.validate(data, &[nx, ny, nz])?;
        debug!("SNIP over a {nx}x{ny}x{nz} volume with width {}", self.width);
        let width = self.width;
        self.clip_with(data, |values| {
            let actual = values.len();
            let mut view = ArrayViewMut::<F, Ix3>::from_shape((nx, ny, nz), values)
                .map_err(|_| BackgroundError::InvalidDimensions {
                    expected: nx.saturating_mul(ny).saturating_mul(nz),
                    actual,
                })?;
            clip_3d(&mut view, width);
            Ok(())
        })
    }
}

type Spectra<F> = Result<Vec<Vec<F>>, BackgroundError>;

cfg_if::cfg_if! {
    if #[cfg(feature = "parallelism")] {
        fn clip_spectra<F: Float + Send + Sync>(data: &[F], spectrum_size: usize, snip: Snip) -> Spectra<F> {
            data.par_chunks(spectrum_size)
                .map(|spectrum| {
                    snip.clip_with(spectrum, |values| {
                        clip_1d(values, snip.width);
                        Ok(())
                    })
                })
                .collect()
        }
    } else {
        fn clip_spectra<F: Float + Send + Sync>(data: &[F], spectrum_size: usize, snip: Snip) -> Spectra<F> {
            data.chunks(spectrum_size)
                .map(|spectrum| {
                    snip.clip_with(spectrum, |values| {
                        clip_1d(values, snip.width);
                        Ok(())
                    })
                })
                .collect()
        }
    }
}

/// The largest radius that leaves at least one interior sample along an axis of `shortest`
/// samples, capped at `width`
fn largest_radius(width: usize, shortest: usize) -> usize {
    let radius = width.min(shortest.saturating_sub(1) / 2);
    if radius < width {
        trace!("Clipping radius {width} reduced to {radius} for an axis of {shortest} samples");
    }
    radius
}

fn clip_1d<F: Float>(values: &mut [F], width: usize) {
    let n = values.len();
    let half = F::from(0.5).unwrap();
    let mut start = values.to_vec();
    for p in (1..=largest_radius(width, n)).rev() {
        trace!("Clipping at radius {p}");
        start.copy_from_slice(values);
        for i in p..(n - p) {
            let estimate = (start[i - p] + start[i + p]) * half;
            if estimate < start[i] {
                values[i] = estimate;
            }
        }
    }
}

#[inline]
fn excess<F: Float>(value: F, reference: F) -> F {
    value.max(reference) - reference
}

fn clip_2d<F: Float>(values: &mut ArrayViewMut<'_, F, Ix2>, width: usize) {
    let (nrows, ncolumns) = values.dim();
    let half = F::from(0.5).unwrap();
    let quarter = F::from(0.25).unwrap();
    for p in (1..=largest_radius(width, nrows.min(ncolumns))).rev() {
        trace!("Clipping at radius {p}");
        let start = values.to_owned();
        for i in p..(nrows - p) {
            for j in p..(ncolumns - p) {
                let upper_left = start[[i - p, j - p]];
                let upper_right = start[[i - p, j + p]];
                let lower_left = start[[i + p, j - p]];
                let lower_right = start[[i + p, j + p]];

                let top = excess(start[[i - p, j]], (upper_left + upper_right) * half);
                let left = excess(start[[i, j - p]], (upper_left + lower_left) * half);
                let right = excess(start[[i, j + p]], (upper_right + lower_right) * half);
                let bottom = excess(start[[i + p, j]], (lower_left + lower_right) * half);

                let estimate = (top + left + right + bottom) * half
                    + (upper_left + upper_right + lower_left + lower_right) * quarter;
                if estimate < start[[i, j]] {
                    values[[i, j]] = estimate;
                }
            }
        }
    }
}

fn clip_3d<F: Float>(values: &mut ArrayViewMut<'_, F, Ix3>, width: usize) {
    let (nx, ny, nz) = values.dim();
    let half = F::from(0.5).unwrap();
    for p in (1..=largest_radius(width, nx.min(ny).min(nz))).rev() {
        trace!("Clipping at radius {p}");
        for axis in 0..3 {
            let start = values.to_owned();
            for i in p..(nx - p) {
                for j in p..(ny - p) {
                    for k in p..(nz - p) {
                        let (lo, hi) = match axis {
                            0 => (start[[i - p, j, k]], start[[i + p, j, k]]),
                            1 => (start[[i, j - p, k]], start[[i, j + p, k]]),
                            _ => (start[[i, j, k - p]], start[[i, j, k + p]]),
                        };
                        let estimate = (lo + hi) * half;
                        if estimate < start[[i, j, k]] {
                            values[[i, j, k]] = estimate;
                        }
                    }
                }
            }
        }
    }
}

/// Estimate the background of a spectrum with SNIP clipping up to radius `width`
pub fn snip1d<F: Float>(data: &[F], width: usize) -> Result<Vec<F>, BackgroundError> {
    Snip::new(width).apply_1d(data)
}

/// Estimate the background of each of `n_spectra` equal-length spectra stored back to back
pub fn snip1d_multiple<F: Float + Send + Sync>(
    data: &[F],
    width: usize,
    n_spectra: usize,
) -> Result<Vec<F>, BackgroundError> {
    Snip::new(width).apply_1d_multiple(data, n_spectra)
}

/// Estimate the background of a row-major `nrows × ncolumns` image
pub fn snip2d<F: Float>(
    data: &[F],
    width: usize,
    nrows: usize,
    ncolumns: usize,
) -> Result<Vec<F>, BackgroundError> {
    Snip::new(width).apply_2d(data, nrows, ncolumns)
}

/// Estimate the background of a row-major `nx × ny × nz` volume
pub fn snip3d<F: Float>(
    data: &[F],
    width: usize,
    nx: usize,
    ny: usize,
    nz: usize,
) -> Result<Vec<F>, BackgroundError> {
    Snip::new(width).apply_3d(data, nx, ny, nz)
}

fn into_array<F, D: ndarray::Dimension>(
    values: Vec<F>,
    shape: D,
) -> Result<Array<F, D>, BackgroundError> {
    let expected = shape.size();
    let actual = values.len();
    Array::from_shape_vec(shape, values)
        .map_err(|_| BackgroundError::InvalidDimensions { expected, actual })
}

/// [`snip2d`] taking its dimensions from `data`
pub fn snip2d_array<F: Float>(
    data: ArrayView<'_, F, Ix2>,
    width: usize,
) -> Result<Array<F, Ix2>, BackgroundError> {
    let (nrows, ncolumns) = data.dim();
    let flat: Vec<F> = data.iter().copied().collect();
    let baseline = snip2d(&flat, width, nrows, ncolumns)?;
    into_array(baseline, Ix2(nrows, ncolumns))
}

/// [`snip3d`] taking its dimensions from `data`
pub fn snip3d_array<F: Float>(
    data: ArrayView<'_, F, Ix3>,
    width: usize,
) -> Result<Array<F, Ix3>, BackgroundError> {
    let (nx, ny, nz) = data.dim();
    let flat: Vec<F> = data.iter().copied().collect();
    let baseline = snip3d(&flat, width, nx, ny, nz)?;
    into_array(baseline, Ix3(nx, ny, nz))
}

/// [`snip1d`] over an `ndarray` vector
pub fn snip1d_array<F: Float>(
    data: ArrayView<'_, F, Ix1>,
    width: usize,
) -> Result<Array<F, Ix1>, BackgroundError> {
    let flat: Vec<F> = data.iter().copied().collect();
    Ok(Array::from_vec(snip1d(&flat, width)?))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::peak_shapes::sum_gauss;
    use crate::test_data::noisy_spectrum;
    use ndarray::{Array2, Array3};
    use rstest::rstest;

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (i, (a, b)) in a.iter().zip(b.iter()).enumerate() {
            assert!((a - b).abs() <= tol * b.abs().max(1.0), "{i}: {a} != {b}");
        }
    }

    fn blob_2d(nrows: usize, ncolumns: usize) -> Vec<f64> {
        let mut data = Vec::with_capacity(nrows * ncolumns);
        for i in 0..nrows {
            for j in 0..ncolumns {
                let di = i as f64 - nrows as f64 / 2.0;
                let dj = j as f64 - ncolumns as f64 / 2.0;
                let peak = 200.0 * (-(di * di + dj * dj) / 8.0).exp();
                data.push(5.0 + 0.2 * i as f64 + 0.1 * j as f64 + peak);
            }
        }
        data
    }

    #[rstest]
    #[case(7.5)]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(12000.0)]
    fn test_constant_unchanged(#[case] value: f64) {
        let data = vec![value; 50];
        assert_close(&snip1d(&data, 10).unwrap(), &data, 1e-9);
        let image = vec![value; 12 * 9];
        assert_close(&snip2d(&image, 3, 12, 9).unwrap(), &image, 1e-9);
        let volume = vec![value; 6 * 7 * 8];
        assert_close(&snip3d(&volume, 2, 6, 7, 8).unwrap(), &volume, 1e-9);
    }

    #[test_log::test]
    fn test_snip1d_removes_peak() {
        let x: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let data: Vec<f64> = sum_gauss(&x, &[100.0, 50.0, 5.0])
            .unwrap()
            .into_iter()
            .map(|v| v + 10.0)
            .collect();
        let baseline = snip1d(&data, 10).unwrap();
        assert!(baseline[50] < 12.0, "{}", baseline[50]);
        for (b, y) in baseline.iter().zip(data.iter()) {
            assert!(*b <= y + 1e-9 * y.abs().max(1.0));
        }
    }

    #[test]
    fn test_snip1d_noisy_below_input() {
        let (_, clean, noisy) = noisy_spectrum();
        let baseline = snip1d(&noisy, 30).unwrap();
        for (b, y) in baseline.iter().zip(noisy.iter()) {
            assert!(*b <= y + 1e-9 * y.abs().max(1.0));
        }
        // the strongest apex is mostly removed
        let apex = 30 * 4;
        assert!(baseline[apex] < clean[apex] / 4.0);
    }

    #[test]
    fn test_without_stabilization() {
        let data = [1.0, 1.0, 1.0, 9.0, 1.0, 1.0, 1.0];
        let baseline = Snip::new(1)
            .variance_stabilize(false)
            .apply_1d(&data)
            .unwrap();
        assert_eq!(baseline, vec![1.0; 7]);
    }

    #[test]
    fn test_radius_larger_than_data() {
        let data = [3.0, 9.0, 3.0];
        assert_close(&snip1d(&data, 1).unwrap(), &[3.0, 3.0, 3.0], 1e-9);
        // radius 5 has no interior samples and is skipped, radius 1 still clips
        assert_close(&snip1d(&data, 5).unwrap(), &[3.0, 3.0, 3.0], 1e-9);
    }

    #[rstest]
    #[case(1 << 30)]
    #[case(usize::MAX / 2 + 1)]
    #[case(usize::MAX)]
    fn test_width_beyond_data(#[case] width: usize) {
        let data = [3.0, 9.0, 3.0];
        assert_close(&snip1d(&data, width).unwrap(), &[3.0, 3.0, 3.0], 1e-9);
        assert_close(
            &snip1d_multiple(&[3.0, 9.0, 3.0, 3.0, 9.0, 3.0], width, 2).unwrap(),
            &[3.0; 6],
            1e-9,
        );

        let mut image = vec![1.0; 9];
        image[4] = 9.0;
        let baseline = snip2d(&image, width, 3, 3).unwrap();
        assert!((baseline[4] - 1.0).abs() < 1e-9, "{}", baseline[4]);

        let mut volume = vec![1.0; 27];
        volume[13] = 9.0;
        let baseline = snip3d(&volume, width, 3, 3, 3).unwrap();
        assert!((baseline[13] - 1.0).abs() < 1e-9, "{}", baseline[13]);
    }

    #[test]
    fn test_largest_radius() {
        assert_eq!(largest_radius(10, 101), 10);
        assert_eq!(largest_radius(usize::MAX, 101), 50);
        assert_eq!(largest_radius(usize::MAX, 2), 0);
        assert_eq!(largest_radius(3, 1), 0);
    }

    #[test]
    fn test_failed_clip_is_an_error() {
        let err = Snip::new(1)
            .clip_with(&[1.0, 2.0, 3.0], |values| {
                Err(BackgroundError::InvalidDimensions {
                    expected: 4,
                    actual: values.len(),
                })
            })
            .unwrap_err();
        assert_eq!(
            err,
            BackgroundError::InvalidDimensions {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_snip2d_blob() {
        let (nrows, ncolumns) = (24, 20);
        let data = blob_2d(nrows, ncolumns);
        let baseline = snip2d(&data, 6, nrows, ncolumns).unwrap();
        for (b, y) in baseline.iter().zip(data.iter()) {
            assert!(*b <= y + 1e-9 * y.abs().max(1.0));
        }
        let center = (nrows / 2) * ncolumns + ncolumns / 2;
        assert!(baseline[center] < 30.0, "{}", baseline[center]);
        // the border is never clipped
        assert!((baseline[0] - data[0]).abs() < 1e-9 * data[0]);
    }

    #[test]
    fn test_snip3d_blob() {
        let (nx, ny, nz) = (12, 12, 12);
        let mut data = vec![10.0; nx * ny * nz];
        let center = (6 * ny + 6) * nz + 6;
        data[center] = 500.0;
        let baseline = snip3d(&data, 3, nx, ny, nz).unwrap();
        assert!(baseline[center] < 11.0, "{}", baseline[center]);
        for (b, y) in baseline.iter().zip(data.iter()) {
            assert!(*b <= y + 1e-9 * y.abs().max(1.0));
        }
    }

    #[test]
    fn test_multiple_matches_single() {
        let (_, _, noisy) = noisy_spectrum();
        let a = &noisy[..300];
        let b = &noisy[300..600];
        let joined: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
        let baseline = snip1d_multiple(&joined, 12, 2).unwrap();
        let mut expected = snip1d(a, 12).unwrap();
        expected.extend(snip1d(b, 12).unwrap());
        assert_eq!(baseline, expected);

        assert!(matches!(
            snip1d_multiple(&joined[..599], 12, 2),
            Err(BackgroundError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            snip1d_multiple(&joined, 12, 0),
            Err(BackgroundError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_array_wrappers() {
        let (nrows, ncolumns) = (16, 10);
        let data = blob_2d(nrows, ncolumns);
        let image = Array2::from_shape_vec((nrows, ncolumns), data.clone()).unwrap();
        let baseline = snip2d_array(image.view(), 4).unwrap();
        assert_eq!(baseline.shape(), &[nrows, ncolumns]);
        assert_eq!(
            baseline.iter().copied().collect::<Vec<_>>(),
            snip2d(&data, 4, nrows, ncolumns).unwrap()
        );

        let volume = Array3::from_elem((4, 5, 6), 2.0f64);
        let baseline = snip3d_array(volume.view(), 1).unwrap();
        assert_eq!(baseline.shape(), &[4, 5, 6]);

        let line = ndarray::Array1::from_vec(vec![1.0, 8.0, 1.0]);
        let baseline = snip1d_array(line.view(), 1).unwrap();
        assert!((baseline[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_f32() {
        let data: Vec<f32> = vec![2.0, 2.0, 40.0, 2.0, 2.0];
        let baseline = snip1d(&data, 2).unwrap();
        assert!((baseline[2] - 2.0).abs() < 1e-3, "{}", baseline[2]);
    }

    #[test]
    fn test_errors() {
        let empty: [f64; 0] = [];
        assert_eq!(snip1d(&empty, 3), Err(BackgroundError::InvalidShape));
        assert_eq!(snip2d(&empty, 3, 0, 0), Err(BackgroundError::InvalidShape));
        let data = vec![1.0; 12];
        assert!(matches!(
            snip1d(&data, 0),
            Err(BackgroundError::InvalidArgument(_))
        ));
        assert_eq!(
            snip2d(&data, 1, 3, 5),
            Err(BackgroundError::InvalidDimensions {
                expected: 15,
                actual: 12
            })
        );
        assert_eq!(
            snip2d(&data, 1, 2, 5),
            Err(BackgroundError::InvalidDimensions {
                expected: 10,
                actual: 12
            })
        );
        assert_eq!(
            snip3d(&data, 1, 2, 2, 2),
            Err(BackgroundError::InvalidDimensions {
                expected: 8,
                actual: 12
            })
        );
        assert!(snip3d(&data, 1, 2, 2, 3).is_ok());
    }
}
