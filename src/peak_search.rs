//! Statistical peak search over uniformly sampled signals.
//!
//! Each sample is scored by convolving the signal with a zero-sum second derivative of
//! gaussian kernel, which cancels any locally linear background. The response is compared
//! against its Poisson noise estimate and samples exceeding `sensitivity` standard
//! deviations are grouped into peaks.
//!
//! ```rust
//! use specsignal::peak_search::{peak_search, PeakSearcherBuilder};
//! use specsignal::peak_shapes::sum_gauss;
//!
//! let x: Vec<f64> = (0..=100).map(|i| i as f64).collect();
//! let y = sum_gauss(&x, &[100.0, 50.0, 5.0]).unwrap();
//! assert_eq!(peak_search(&y, 5.0, 3.5).unwrap(), vec![50]);
//!
//! let searcher = PeakSearcherBuilder::new().fwhm(5.0).max_peaks(10).build();
//! let candidates = searcher.search(&y).unwrap();
//! assert!(candidates[0].relevance > 3.5);
//! ```
use log::{debug, warn};
use thiserror::Error;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::peak_statistics::{estimate_fwhm, MINIMUM_FWHM};

pub const DEFAULT_SENSITIVITY: f64 = 3.5;
pub const DEFAULT_MAX_PEAKS: usize = 500;
/// The largest half width, in samples, of the detection kernel
pub const MAX_KERNEL_HALF_WIDTH: usize = 100;

const FWHM_PER_SIGMA: f64 = 2.35482;

/// All the ways a peak search can fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeakSearchError {
    #[error("Cannot search for peaks in empty data")]
    InvalidShape,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Found more than the {0} peaks the output was sized for")]
    OutputOverflow(usize),
}

/// A detected peak, the sample index of its strongest response and the significance of
/// that response in noise standard deviations
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakCandidate {
    pub index: usize,
    pub relevance: f64,
}

impl PeakCandidate {
    pub fn new(index: usize, relevance: f64) -> Self {
        Self { index, relevance }
    }
}

/// The symmetric `(1 - j²/σ²)·exp(-j²/2σ²)` kernel with its mean removed
#[derive(Debug, Clone)]
struct DetectionKernel {
    weights: Vec<f64>,
    half_width: usize,
}

impl DetectionKernel {
    fn new(fwhm: f64) -> Self {
        let sigma = fwhm / FWHM_PER_SIGMA;
        let half_width = ((3.0 * sigma).ceil() as usize).clamp(1, MAX_KERNEL_HALF_WIDTH);
        let h = half_width as isize;
        let mut weights: Vec<f64> = (-h..=h)
            .map(|j| {
                let t = (j * j) as f64 / (sigma * sigma);
                (1.0 - t) * (-0.5 * t).exp()
            })
            .collect();
        let mean = weights.iter().sum::<f64>() / weights.len() as f64;
        weights.iter_mut().for_each(|w| *w -= mean);
        Self {
            weights,
            half_width,
        }
    }

    /// The kernel response and its variance over a window centered on a sample
    #[inline]
    fn response(&self, window: &[f64]) -> (f64, f64) {
        self.weights
            .iter()
            .zip(window.iter())
            .fold((0.0, 0.0), |(yy, nyy), (k, y)| {
                (yy + k * y, nyy + k * k * y.abs())
            })
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallelism")] {
        fn kernel_responses(kernel: &DetectionKernel, y: &[f64], start: usize, stop: usize) -> Vec<(f64, f64)> {
            let m = kernel.half_width;
            (start..stop + 1)
                .into_par_iter()
                .with_min_len(256)
                .map(|i| kernel.response(&y[i - m..=i + m]))
                .collect()
        }
    } else {
        fn kernel_responses(kernel: &DetectionKernel, y: &[f64], start: usize, stop: usize) -> Vec<(f64, f64)> {
            let m = kernel.half_width;
            (start..=stop)
                .map(|i| kernel.response(&y[i - m..=i + m]))
                .collect()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CandidateGroup {
    last_index: usize,
    best_index: usize,
    best_response: f64,
    best_relevance: f64,
}

impl CandidateGroup {
    fn new(index: usize, response: f64, relevance: f64) -> Self {
        Self {
            last_index: index,
            best_index: index,
            best_response: response,
            best_relevance: relevance,
        }
    }

    fn add(&mut self, index: usize, response: f64, relevance: f64) {
        self.last_index = index;
        if response > self.best_response {
            self.best_index = index;
            self.best_response = response;
            self.best_relevance = relevance;
        }
    }

    fn candidate(&self) -> PeakCandidate {
        PeakCandidate::new(self.best_index, self.best_relevance)
    }
}

/// Search a signal for peaks
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakSearcher {
    /// The expected full width at half maximum of peaks, in samples
    pub fwhm: f64,
    /// The number of noise standard deviations a response must exceed
    pub sensitivity: f64,
    /// The most peaks a single search may report
    pub max_peaks: usize,
    /// The first sample index to test
    pub begin_index: Option<usize>,
    /// The last sample index to test, inclusive
    pub end_index: Option<usize>,
}

impl Default for PeakSearcher {
    fn default() -> Self {
        Self::new(MINIMUM_FWHM, DEFAULT_SENSITIVITY, DEFAULT_MAX_PEAKS)
    }
}

/// A builder for configuring [`PeakSearcher`]
#[derive(Debug, Clone, Default)]
pub struct PeakSearcherBuilder {
    searcher: PeakSearcher,
}

impl PeakSearcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fwhm(&mut self, fwhm: f64) -> &mut Self {
        self.searcher.fwhm = fwhm;
        self
    }

    pub fn sensitivity(&mut self, sensitivity: f64) -> &mut Self {
        self.searcher.sensitivity = sensitivity;
        self
    }

    pub fn max_peaks(&mut self, max_peaks: usize) -> &mut Self {
        self.searcher.max_peaks = max_peaks;
        self
    }

    /// Restrict the search to sample indices in `begin_index..=end_index`
    pub fn region(&mut self, begin_index: usize, end_index: usize) -> &mut Self {
        self.searcher.begin_index = Some(begin_index);
        self.searcher.end_index = Some(end_index);
        self
    }

    pub fn build(&self) -> PeakSearcher {
        self.searcher.clone()
    }
}

impl From<PeakSearcherBuilder> for PeakSearcher {
    fn from(value: PeakSearcherBuilder) -> Self {
        value.searcher
    }
}

impl PeakSearcher {
    pub fn new(fwhm: f64, sensitivity: f64, max_peaks: usize) -> Self {
        Self {
            fwhm,
            sensitivity,
            max_peaks,
            begin_index: None,
            end_index: None,
        }
    }

    /// Create a searcher whose `fwhm` is estimated from the most intense peak of `y`
    pub fn from_data(y: &[f64]) -> Self {
        Self {
            fwhm: estimate_fwhm(y),
            ..Self::default()
        }
    }

    /// The number of samples on either side of a tested sample the kernel spans
    pub fn kernel_half_width(&self) -> usize {
        DetectionKernel::new(self.fwhm).half_width
    }

    fn validate(&self, n: usize) -> Result<(usize, usize), PeakSearchError> {
        if n == 0 {
            return Err(PeakSearchError::InvalidShape);
        }
        if !(self.fwhm.is_finite() && self.fwhm > 0.0) {
            return Err(PeakSearchError::InvalidArgument(format!(
                "fwhm must be a positive finite number, received {}",
                self.fwhm
            )));
        }
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(PeakSearchError::InvalidArgument(format!(
                "sensitivity must be a positive finite number, received {}",
                self.sensitivity
            )));
        }
        let begin = self.begin_index.unwrap_or(0);
        let end = self.end_index.unwrap_or(n - 1);
        if end >= n {
            return Err(PeakSearchError::InvalidArgument(format!(
                "end index {end} is beyond the last sample {}",
                n - 1
            )));
        }
        if begin > end {
            return Err(PeakSearchError::InvalidArgument(format!(
                "begin index {begin} is after end index {end}"
            )));
        }
        Ok((begin, end))
    }

    fn push_candidate(
        &self,
        group: &CandidateGroup,
        candidates: &mut Vec<PeakCandidate>,
    ) -> Result<(), PeakSearchError> {
        if candidates.len() >= self.max_peaks {
            warn!(
                "Peak search found more than {} peaks, next at index {}",
                self.max_peaks, group.best_index
            );
            return Err(PeakSearchError::OutputOverflow(self.max_peaks));
        }
        candidates.push(group.candidate());
        Ok(())
    }

    /// Find peaks in `y`, reporting each peak's index and relevance in ascending index order
    pub fn search(&self, y: &[f64]) -> Result<Vec<PeakCandidate>, PeakSearchError> {
        let (begin, end) = self.validate(y.len())?;
        let n = y.len();
        let kernel = DetectionKernel::new(self.fwhm);
        let m = kernel.half_width;
        let mut candidates = Vec::with_capacity(self.max_peaks.min(n));
        if n < 2 * m + 1 {
            debug!("A kernel spanning {} samples does not fit in {n} samples", 2 * m + 1);
            return Ok(candidates);
        }
        let start = begin.max(m);
        let stop = end.min(n - 1 - m);
        if start > stop {
            return Ok(candidates);
        }
        debug!(
            "Searching samples {start}..={stop} with fwhm {:.3}, kernel half width {m} and sensitivity {}",
            self.fwhm, self.sensitivity
        );

        let mut group: Option<CandidateGroup> = None;
        for (offset, (response, variance)) in kernel_responses(&kernel, y, start, stop)
            .into_iter()
            .enumerate()
        {
            if !(variance > 0.0) {
                continue;
            }
            let noise = variance.sqrt();
            if response <= self.sensitivity * noise {
                continue;
            }
            let index = start + offset;
            let relevance = response / noise;
            match group.as_mut() {
                Some(current) if (index - current.last_index) as f64 <= self.fwhm => {
                    current.add(index, response, relevance);
                }
                _ => {
                    if let Some(done) = group.take() {
                        self.push_candidate(&done, &mut candidates)?;
                    }
                    group = Some(CandidateGroup::new(index, response, relevance));
                }
            }
        }
        if let Some(done) = group {
            self.push_candidate(&done, &mut candidates)?;
        }
        debug!("Found {} peaks", candidates.len());
        Ok(candidates)
    }

    /// Find peaks in `y`, reporting only their indices in ascending order
    pub fn search_indices(&self, y: &[f64]) -> Result<Vec<usize>, PeakSearchError> {
        Ok(self.search(y)?.into_iter().map(|c| c.index).collect())
    }
}

/// Find the indices of peaks of width `fwhm` in `y` with the default capacity and the whole
/// signal as the region of interest
pub fn peak_search(y: &[f64], fwhm: f64, sensitivity: f64) -> Result<Vec<usize>, PeakSearchError> {
    PeakSearcher::new(fwhm, sensitivity, DEFAULT_MAX_PEAKS).search_indices(y)
}
