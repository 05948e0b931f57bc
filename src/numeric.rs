//! Numeric kernels shared by the four scoring layers: basic statistics,
//! histograms, percentiles, a Hann window, a centered 2-D FFT magnitude
//! spectrum, and Pearson correlation. Kept as plain `Vec<f64>` helpers in
//! the teacher's hand-rolled style rather than behind a dense-array crate —
//! the one delegated primitive is the FFT itself (`rustfft`).

use num_complex::Complex64;
use rustfft::FftPlanner;

/// Replace any non-finite value with 0.0. Every numeric `Detail` passes
/// through this before it is reported.
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Round `value` to `decimals` fractional digits (half-away-from-zero),
/// the precision the external JSON contract requires for scores,
/// confidence, and elapsed time.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

pub fn variance(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
}

pub fn std_dev(xs: &[f64]) -> f64 {
    variance(xs).sqrt()
}

/// Skewness (third standardized moment) of `xs`. Returns 0.0 when the
/// population standard deviation is below 1.0 (spec §4.4).
pub fn skewness(xs: &[f64]) -> f64 {
    let sd = std_dev(xs);
    if sd < 1.0 || xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    let n = xs.len() as f64;
    let third_moment = xs.iter().map(|x| (x - m).powi(3)).sum::<f64>() / n;
    third_moment / sd.powi(3)
}

/// Linear-interpolated percentile, `p` in `[0, 100]`, over a copy of `xs`.
pub fn percentile(xs: &[f64], p: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

/// 256-bin histogram of 8-bit samples.
pub fn histogram256(samples: &[u8]) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for &s in samples {
        hist[s as usize] += 1;
    }
    hist
}

/// Shannon entropy (base 2) of a histogram, zero bins dropped.
pub fn shannon_entropy(hist: &[u64]) -> f64 {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let mut entropy = 0.0;
    for &count in hist {
        if count > 0 {
            let p = count as f64 / total;
            entropy -= p * p.log2();
        }
    }
    entropy
}

/// A single-dimensional Hann window of length `n`.
pub fn hann_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| {
            let x = std::f64::consts::PI * i as f64 / (n - 1) as f64;
            x.sin().powi(2)
        })
        .collect()
}

/// Compute `log(|FFT2D(windowed)| + 1)` over an `side x side` real patch,
/// row-major, with the DC component shifted to the center (fftshift).
/// Returns a row-major `side x side` buffer of magnitudes.
pub fn fft2d_log_magnitude(patch: &[f64], side: usize) -> Vec<f64> {
    assert_eq!(patch.len(), side * side);

    let mut buf: Vec<Complex64> = patch.iter().map(|&v| Complex64::new(v, 0.0)).collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(side);

    // Row-wise FFT.
    for row in buf.chunks_mut(side) {
        fft.process(row);
    }

    // Column-wise FFT (transpose, FFT, transpose back).
    let mut columns = vec![Complex64::new(0.0, 0.0); side * side];
    for y in 0..side {
        for x in 0..side {
            columns[x * side + y] = buf[y * side + x];
        }
    }
    for col in columns.chunks_mut(side) {
        fft.process(col);
    }
    for x in 0..side {
        for y in 0..side {
            buf[y * side + x] = columns[x * side + y];
        }
    }

    // fftshift: swap quadrants so DC sits at the center.
    let half = side / 2;
    let mut shifted = vec![Complex64::new(0.0, 0.0); side * side];
    for y in 0..side {
        let sy = (y + half) % side;
        for x in 0..side {
            let sx = (x + half) % side;
            shifted[sy * side + sx] = buf[y * side + x];
        }
    }

    shifted.iter().map(|c| (c.norm() + 1.0).ln()).collect()
}

/// Pearson correlation coefficient between two equal-length series.
/// Non-finite results collapse to 0.0, per the caller's robustness rule.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.is_empty() {
        return 0.0;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    let denom = (vx * vy).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    let r = cov / denom;
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_or_zero_replaces_nan_and_inf() {
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(finite_or_zero(-f64::INFINITY), 0.0);
        assert_eq!(finite_or_zero(3.5), 3.5);
    }

    #[test]
    fn round_to_matches_the_json_contract_precisions() {
        assert_eq!(round_to(11.0, 1), 11.0);
        assert_eq!(round_to(0.82499999, 2), 0.82);
        assert_eq!(round_to(0.825, 2), 0.83);
        assert_eq!(round_to(1.23456, 3), 1.235);
    }

    #[test]
    fn percentile_matches_known_points() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&xs, 0.0), 1.0);
        assert_eq!(percentile(&xs, 100.0), 5.0);
        assert_eq!(percentile(&xs, 50.0), 3.0);
    }

    #[test]
    fn shannon_entropy_uniform_distribution() {
        // 256 equally likely symbols -> entropy of exactly 8 bits.
        let hist = [1u64; 256];
        let e = shannon_entropy(&hist);
        assert!((e - 8.0).abs() < 1e-9);
    }

    #[test]
    fn shannon_entropy_single_value_is_zero() {
        let mut hist = [0u64; 256];
        hist[42] = 1000;
        assert_eq!(shannon_entropy(&hist), 0.0);
    }

    #[test]
    fn skewness_low_std_is_zero() {
        let xs = vec![5.0; 100];
        assert_eq!(skewness(&xs), 0.0);
    }

    #[test]
    fn pearson_perfect_correlation() {
        let xs = vec![1.0, 2.0, 3.0, 4.0];
        let ys = vec![2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pearson_constant_series_is_zero() {
        let xs = vec![1.0, 1.0, 1.0];
        let ys = vec![2.0, 3.0, 4.0];
        assert_eq!(pearson(&xs, &ys), 0.0);
    }

    #[test]
    fn fft2d_uniform_patch_concentrates_at_dc() {
        let side = 8;
        let patch = vec![100.0; side * side];
        let mag = fft2d_log_magnitude(&patch, side);
        let center = mag[(side / 2) * side + side / 2];
        let corner = mag[0];
        assert!(center > corner);
    }
}
