use std::error::Error;
use std::time::Instant;

use specsignal::background::{snip1d, strip};
use specsignal::peak_search::PeakSearcher;
use specsignal::peak_shapes::{sum_agauss, sum_fastagauss};
use specsignal::peak_statistics::full_width_at_half_max;
use specsignal::smooth::savitsky_golay;

const PEAKS: [f64; 12] = [
    1500.0, 120.0, 6.0, 900.0, 260.0, 8.0, 400.0, 300.0, 5.0, 2500.0, 610.0, 10.0,
];

/// A small deterministic jitter so the demo output is reproducible
fn jitter(i: usize) -> f64 {
    let v = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    ((v >> 33) as f64 / (1u64 << 31) as f64 - 0.5) * 6.0
}

fn main() -> Result<(), Box<dyn Error>> {
    let x: Vec<f64> = (0..800).map(|i| i as f64).collect();
    let signal = sum_agauss(&x, &PEAKS)?;
    let y: Vec<f64> = signal
        .iter()
        .zip(x.iter())
        .enumerate()
        .map(|(i, (s, x))| s + 40.0 + 30.0 * (-x / 300.0).exp() + jitter(i))
        .collect();

    let start = Instant::now();
    let smoothed = savitsky_golay(&y, 5)?;
    let stripped = strip(&smoothed, 4, 2000, 1.0, &[])?;
    println!(
        "Strip background took {} microseconds",
        (Instant::now() - start).as_micros()
    );

    let start = Instant::now();
    let baseline = snip1d(&smoothed, 30)?;
    println!(
        "SNIP background took {} microseconds",
        (Instant::now() - start).as_micros()
    );
    let disagreement = stripped
        .iter()
        .zip(baseline.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    println!("Largest strip/SNIP disagreement {disagreement:.3}");

    let corrected: Vec<f64> = y
        .iter()
        .zip(baseline.iter())
        .map(|(y, b)| y - b)
        .collect();
    let searcher = PeakSearcher::from_data(&corrected);
    println!("Estimated peak width {:.3} samples", searcher.fwhm);
    let candidates = searcher.search(&corrected)?;
    println!("Found {} peaks", candidates.len());

    let mut model_params = Vec::with_capacity(candidates.len() * 3);
    for candidate in candidates.iter() {
        let width = full_width_at_half_max(&corrected, candidate.index).full_width_at_half_max;
        let height = corrected[candidate.index];
        let area = height * width / 0.9394372786996513;
        println!(
            "\tindex {} relevance {:.2} height {:.1} fwhm {:.2}",
            candidate.index, candidate.relevance, height, width
        );
        model_params.extend([area, x[candidate.index], width]);
    }

    let start = Instant::now();
    let model = sum_agauss(&x, &model_params)?;
    let exact_elapsed = Instant::now() - start;
    let start = Instant::now();
    let fast_model = sum_fastagauss(&x, &model_params)?;
    let fast_elapsed = Instant::now() - start;
    println!(
        "Model evaluation took {} microseconds, {} with the lookup table",
        exact_elapsed.as_micros(),
        fast_elapsed.as_micros()
    );

    let residual = corrected
        .iter()
        .zip(model.iter())
        .map(|(y, m)| (y - m).powi(2))
        .sum::<f64>()
        .sqrt();
    let table_error = model
        .iter()
        .zip(fast_model.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    println!("Model residual norm {residual:.3}, lookup table error {table_error:.2e}");
    Ok(())
}
