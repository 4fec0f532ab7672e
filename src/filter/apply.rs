//! Savitzky-Golay smoothing via overlap-add FFT correlation.
//!
//! Interior samples all share one weight vector, so they are computed as a
//! single "valid" correlation of the signal with the centre weights.  The
//! first and last `window / 2` samples take the value of the polynomial
//! fitted to the first / last full window, evaluated at their own position
//! (scipy's `mode='interp'`).
//!
//! A non-finite sample only affects the outputs whose window contains it;
//! those are summed directly, everything else goes through the FFT.
use anyhow::{bail, Result};
use rustfft::{num_complex::Complex, FftPlanner};

use super::design::{center, lead, savgol_coeffs, validate};

/// Smooth `x` with a Savitzky-Golay filter.
///
/// Returns a vector of the same length as `x`.  Fails if `x` is shorter
/// than `window` or the parameters are inconsistent.
pub fn savgol_filter(x: &[f64], window: usize, polyorder: usize) -> Result<Vec<f64>> {
    validate(window, polyorder)?;
    let n = x.len();
    if n < window {
        bail!("signal of {n} samples is shorter than the smoothing window ({window})");
    }

    let h = savgol_coeffs(window, polyorder, center(window))?;
    let valid = correlate_valid(x, &h)?;

    let mut y = vec![0.0_f64; n];
    // valid[s] is the fit of window [s, s + window) read at its centre.
    let lead = lead(window);
    y[lead..lead + valid.len()].copy_from_slice(&valid);

    let edge = window / 2;
    let tail_start = n - window;
    for pos in 0..edge {
        let w = savgol_coeffs(window, polyorder, pos as f64)?;
        y[pos] = dot(&w, &x[..window]);
    }
    for pos in window - edge..window {
        let w = savgol_coeffs(window, polyorder, pos as f64)?;
        y[tail_start + pos] = dot(&w, &x[tail_start..]);
    }
    Ok(y)
}

/// `out[s] = Σ_i h[i] · x[s + i]` for every `s` with a full window:
/// `x.len() − h.len() + 1` outputs.
pub fn correlate_valid(x: &[f64], h: &[f64]) -> Result<Vec<f64>> {
    let n_x = x.len();
    let n_h = h.len();
    if n_h == 0 || n_x < n_h {
        bail!("correlation kernel of {n_h} taps does not fit {n_x} samples");
    }
    let h_rev: Vec<f64> = h.iter().rev().copied().collect();

    let bad: Vec<usize> = (0..n_x).filter(|&i| !x[i].is_finite()).collect();
    if bad.is_empty() {
        let full = convolve_full(x, &h_rev);
        return Ok(full[n_h - 1..n_x].to_vec());
    }

    let clean: Vec<f64> = x.iter().map(|&v| if v.is_finite() { v } else { 0.0 }).collect();
    let full = convolve_full(&clean, &h_rev);
    let mut out = full[n_h - 1..n_x].to_vec();

    let n_out = out.len();
    let mut redo = vec![false; n_out];
    for &b in &bad {
        let lo = b.saturating_sub(n_h - 1);
        let hi = b.min(n_out - 1);
        for flag in &mut redo[lo..=hi] {
            *flag = true;
        }
    }
    for (s, o) in out.iter_mut().enumerate().filter(|(s, _)| redo[*s]) {
        *o = dot(h, &x[s..s + n_h]);
    }
    Ok(out)
}

/// Full linear convolution (`x.len() + h.len() − 1` samples) by overlap-add.
pub fn convolve_full(x: &[f64], h: &[f64]) -> Vec<f64> {
    let n_x = x.len();
    let n_h = h.len();
    if n_x == 0 || n_h == 0 {
        return vec![];
    }
    let n_out = n_x + n_h - 1;

    let n_fft = choose_fft_len(n_h, n_x);
    let h_fft = fft_of_h(h, n_fft);

    let n_seg = n_fft - n_h + 1;
    let n_segments = n_x.div_ceil(n_seg);
    let mut out = vec![0.0_f64; n_out];

    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let fft_fwd = planner.plan_fft_forward(n_fft);
    let fft_inv = planner.plan_fft_inverse(n_fft);
    let inv_scale = 1.0 / n_fft as f64;

    for seg_idx in 0..n_segments {
        let start = seg_idx * n_seg;
        let stop = (start + n_seg).min(n_x);

        let mut buf: Vec<Complex<f64>> = x[start..stop]
            .iter()
            .map(|&v| Complex { re: v, im: 0.0 })
            .chain(std::iter::repeat(Complex::default()))
            .take(n_fft)
            .collect();

        fft_fwd.process(&mut buf);
        for (b, &hf) in buf.iter_mut().zip(h_fft.iter()) {
            *b *= hf;
        }
        fft_inv.process(&mut buf);

        let seg_out = (stop - start + n_h - 1).min(n_out - start);
        for (o, b) in out[start..start + seg_out].iter_mut().zip(&buf) {
            *o += b.re * inv_scale;
        }
    }
    out
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(p, q)| p * q).sum()
}

/// Choose the FFT block size (power of 2 minimising operation count):
///   `cost = ceil(n_x / (N − n_h + 1)) · N · (log2(N) + 1) + 4e-5 · N · n_x`
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_fft = 2 * n_h - 1;
    let min_pow = (min_fft as f64).log2().ceil() as u32;
    let max_pow = ((n_x as f64).log2().ceil() as u32 + 1).max(min_pow);

    let mut best_n = 1_usize << max_pow;
    let mut best_cost = f64::INFINITY;

    for pow in min_pow..=max_pow {
        let n = 1_usize << pow;
        if n < min_fft {
            continue;
        }
        let n_seg = (n - n_h + 1) as f64;
        let cost = (n_x as f64 / n_seg).ceil() * n as f64 * (pow as f64 + 1.0)
            + 4e-5 * n as f64 * n_x as f64;
        if cost < best_cost {
            best_cost = cost;
            best_n = n;
        }
    }
    best_n
}

/// FFT of `h` zero-padded to `n_fft`.
fn fft_of_h(h: &[f64], n_fft: usize) -> Vec<Complex<f64>> {
    let mut buf: Vec<Complex<f64>> = h
        .iter()
        .map(|&v| Complex { re: v, im: 0.0 })
        .chain(std::iter::repeat(Complex::default()))
        .take(n_fft)
        .collect();
    let mut planner: FftPlanner<f64> = FftPlanner::new();
    planner.plan_fft_forward(n_fft).process(&mut buf);
    buf
}
