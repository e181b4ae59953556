use super::{
    evaluate_with, parse_records, AreaGaussianPeak, HypermetPeak, HypermetTerms, PeakShapeError,
    ShapeFamily,
};
use crate::peak_shapes::gaussian::gaussian_exponent;

const TABLE_STEP: f64 = 0.01;
const TABLE_SIZE: usize = 5000;

/// A linearly interpolated table of `exp(-x)` over `[0, 50)`.
///
/// Arguments beyond the table are treated as zero, their true value being below `2e-22`.
/// The relative interpolation error is bounded by roughly `TABLE_STEP² / 8`.
#[derive(Debug, Clone)]
pub struct FastExp {
    table: Vec<f64>,
}

impl Default for FastExp {
    fn default() -> Self {
        Self::new()
    }
}

impl FastExp {
    pub fn new() -> Self {
        let table = (0..=TABLE_SIZE)
            .map(|k| (-(k as f64) * TABLE_STEP).exp())
            .collect();
        Self { table }
    }

    /// Approximate `exp(-x)`. Negative and non-finite arguments are computed exactly.
    #[inline]
    pub fn exp_neg(&self, x: f64) -> f64 {
        if !(x >= 0.0) || x.is_infinite() {
            return (-x).exp();
        }
        let scaled = x / TABLE_STEP;
        if scaled >= TABLE_SIZE as f64 {
            return 0.0;
        }
        let i = scaled as usize;
        let frac = scaled - i as f64;
        let lo = self.table[i];
        let hi = self.table[i + 1];
        lo + (hi - lo) * frac
    }

    /// Approximate `exp(x)`, using the table for non-positive arguments
    #[inline]
    pub fn exp(&self, x: f64) -> f64 {
        if x <= 0.0 {
            self.exp_neg(-x)
        } else {
            x.exp()
        }
    }

    /// [`sum_agauss`](super::sum_agauss) with tabulated exponentials
    pub fn sum_agauss(&self, x: &[f64], params: &[f64]) -> Result<Vec<f64>, PeakShapeError> {
        let peaks: Vec<AreaGaussianPeak> = parse_records(params, ShapeFamily::FastAGauss)?;
        Ok(evaluate_with(x, &peaks, |p, xi| {
            p.height() * self.exp_neg(gaussian_exponent(xi, p.centroid, p.fwhm))
        }))
    }

    /// [`sum_ahypermet`](super::sum_ahypermet) with tabulated exponentials
    pub fn sum_ahypermet(
        &self,
        x: &[f64],
        params: &[f64],
        terms: HypermetTerms,
    ) -> Result<Vec<f64>, PeakShapeError> {
        let peaks: Vec<HypermetPeak> =
            parse_records::<HypermetPeak>(params, ShapeFamily::FastAHypermet)?
                .into_iter()
                .map(|p| p.with_terms(terms))
                .collect();
        let exp_neg = |v: f64| self.exp_neg(v);
        let exp = |v: f64| self.exp(v);
        Ok(evaluate_with(x, &peaks, |p, xi| {
            p.density_with(xi, &exp_neg, &exp)
        }))
    }
}

/// Evaluate `peaks` with a shared table, for callers that already hold typed records
pub fn evaluate_fast_agauss(table: &FastExp, x: &[f64], peaks: &[AreaGaussianPeak]) -> Vec<f64> {
    evaluate_with(x, peaks, |p, xi| {
        p.height() * table.exp_neg(gaussian_exponent(xi, p.centroid, p.fwhm))
    })
}
