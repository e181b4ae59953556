//! Synthetic spectra shared by unit tests. Noise comes from a seeded xorshift stream so
//! every run sees the same samples.
use crate::arrayops::gridspace;
use crate::peak_shapes::sum_agauss;

/// `(area, centroid, fwhm)` records of the peaks in [`noisy_spectrum`]
pub const PEAKS: [f64; 9] = [1000.0, 30.0, 4.0, 800.0, 70.0, 6.0, 300.0, 120.0, 3.0];

pub const NOISE_AMPLITUDE: f64 = 20.0;

/// A xorshift64* stream of uniform values in `[-0.5, 0.5)`
#[derive(Debug, Clone)]
pub struct NoiseSource {
    state: u64,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        let v = self.state.wrapping_mul(0x2545F4914F6CDD1D);
        (v >> 11) as f64 / (1u64 << 53) as f64 - 0.5
    }
}

impl Iterator for NoiseSource {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_f64())
    }
}

/// A linear background under the peaks in [`PEAKS`]
pub fn background(x: &[f64]) -> Vec<f64> {
    x.iter().map(|x| 20.0 + 0.1 * x).collect()
}

/// Returns `(x, clean, noisy)` for a three peak spectrum over a sloped background
pub fn noisy_spectrum() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let x = gridspace(0.0, 150.0, 0.25);
    let peaks = sum_agauss(&x, &PEAKS).unwrap();
    let clean: Vec<f64> = peaks
        .iter()
        .zip(background(&x))
        .map(|(p, b)| p + b)
        .collect();
    let noisy = clean
        .iter()
        .zip(NoiseSource::new(0x5eed))
        .map(|(c, n)| c + NOISE_AMPLITUDE * n)
        .collect();
    (x, clean, noisy)
}
