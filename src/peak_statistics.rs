use num_traits::{Float, FromPrimitive};

use crate::arrayops::minmax;
use crate::smooth::smooth1d;

pub fn _isclose<T>(x: T, y: T, rtol: T, atol: T) -> bool
where
    T: Float,
{
    (x - y).abs() <= (atol + rtol * y.abs())
}

pub fn isclose<T>(x: T, y: T) -> bool
where
    T: Float + FromPrimitive,
{
    _isclose(x, y, T::from_f64(1e-5).unwrap(), T::from_f64(1e-8).unwrap())
}

pub fn aboutzero<T>(x: T) -> bool
where
    T: Float + FromPrimitive,
{
    isclose(x, T::zero())
}

/// The smallest width, in samples, [`estimate_fwhm`] will report
pub const MINIMUM_FWHM: f64 = 4.0;

/// The half-maximum crossings around a peak apex, measured in samples
#[derive(Default, Debug, Clone)]
pub struct WidthFit {
    pub right_width: f64,
    pub left_width: f64,
    pub full_width_at_half_max: f64,
}

/// Walk left from `data_index` until the signal drops below half of the apex, returning the
/// interpolated fractional index of the crossing.
pub fn fit_rising_side_width(intensity_array: &[f64], data_index: usize) -> f64 {
    let peak_half = intensity_array[data_index] / 2.0;
    for index in (0..data_index).rev() {
        let y1 = intensity_array[index];
        if y1 < peak_half {
            let y2 = intensity_array[index + 1];
            if aboutzero(y2 - y1) {
                return index as f64;
            }
            return index as f64 + (peak_half - y1) / (y2 - y1);
        }
    }
    0.0
}

/// Walk right from `data_index` until the signal drops below half of the apex, returning the
/// interpolated fractional index of the crossing.
pub fn fit_falling_side_width(intensity_array: &[f64], data_index: usize) -> f64 {
    let peak_half = intensity_array[data_index] / 2.0;
    let n = intensity_array.len() - 1;
    for index in (data_index + 1)..=n {
        let y1 = intensity_array[index];
        if y1 < peak_half {
            let y2 = intensity_array[index - 1];
            if aboutzero(y2 - y1) {
                return index as f64;
            }
            return index as f64 - (peak_half - y1) / (y2 - y1);
        }
    }
    n as f64
}

pub fn full_width_at_half_max(intensity_array: &[f64], data_index: usize) -> WidthFit {
    let mut fit = WidthFit::default();
    if intensity_array.is_empty() || data_index >= intensity_array.len() {
        return fit;
    }
    if intensity_array[data_index] <= 0.0 || aboutzero(intensity_array[data_index]) {
        return fit;
    }
    let rising = fit_rising_side_width(intensity_array, data_index);
    let falling = fit_falling_side_width(intensity_array, data_index);
    fit.left_width = data_index as f64 - rising;
    fit.right_width = falling - data_index as f64;
    fit.full_width_at_half_max = falling - rising;
    fit
}

/// Estimate the full width at half maximum, in samples, of the most intense peak in `y`.
///
/// The signal is lightly smoothed and its minimum is taken as a flat background before the
/// half-maximum crossings are located. The estimate never falls below [`MINIMUM_FWHM`].
pub fn estimate_fwhm(y: &[f64]) -> f64 {
    if y.len() < 3 {
        return MINIMUM_FWHM;
    }
    let mut smoothed = y.to_vec();
    smooth1d(&mut smoothed);
    let (min, _max) = minmax(&smoothed);
    smoothed.iter_mut().for_each(|v| *v -= min);

    let apex = smoothed
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or_default();
    let fit = full_width_at_half_max(&smoothed, apex);
    log::debug!(
        "Estimated width {:0.3} around apex {apex}",
        fit.full_width_at_half_max
    );
    fit.full_width_at_half_max.max(MINIMUM_FWHM)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::peak_shapes::sum_gauss;

    #[test]
    fn test_isclose() {
        assert!(isclose(1.0, 1.0 + 1e-7));
        assert!(!isclose(1.0, 1.1));
        assert!(aboutzero(1e-9f32));
    }

    #[test]
    fn test_width_of_gaussian() {
        let x: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let y = sum_gauss(&x, &[50.0, 100.0, 12.0]).unwrap();
        let fit = full_width_at_half_max(&y, 100);
        assert!((fit.full_width_at_half_max - 12.0).abs() < 0.2, "{fit:?}");
        assert!((fit.left_width - fit.right_width).abs() < 1e-6);
    }

    #[test]
    fn test_estimate_fwhm() {
        let x: Vec<f64> = (0..300).map(|i| i as f64).collect();
        let mut y = sum_gauss(&x, &[80.0, 150.0, 20.0, 20.0, 60.0, 8.0]).unwrap();
        y.iter_mut().for_each(|v| *v += 5.0);
        let fwhm = estimate_fwhm(&y);
        assert!((fwhm - 20.0).abs() < 1.0, "{fwhm}");
    }

    #[test]
    fn test_estimate_fwhm_floor() {
        assert_eq!(estimate_fwhm(&[0.0, 1.0]), MINIMUM_FWHM);
        assert_eq!(estimate_fwhm(&[0.0; 20]), MINIMUM_FWHM);
    }
}
