//! Area under the curve over a selected index range.
//!
//! `simpson`: composite Simpson's rule on an irregular grid, matching
//! `scipy.integrate.simpson`:
//!   each pair of intervals (h0, h1) contributes
//!   (h0+h1)/6 · [(2 − h1/h0)·y0 + (h0+h1)²/(h0·h1)·y1 + (2 − h0/h1)·y2];
//!   an odd trailing interval is integrated with the quadratic through the
//!   last three points.
use anyhow::{bail, Result};
use ndarray::{s, ArrayView1};

/// AUC over `[start_index, end_index]` and the matching time bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AucResult {
    pub start_index: usize,
    pub end_index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub area: f64,
}

/// Composite Simpson integral of `y` over strictly increasing `x`.
///
/// Two points fall back to the trapezoid.
pub fn simpson(y: ArrayView1<'_, f64>, x: ArrayView1<'_, f64>) -> Result<f64> {
    check_grid(y, x)?;
    let n = y.len();
    if n == 2 {
        return trapezoid(y, x);
    }

    let even_end = if n % 2 == 1 { n } else { n - 1 };
    let mut total = 0.0;
    for i in (0..even_end - 2).step_by(2) {
        let h0 = x[i + 1] - x[i];
        let h1 = x[i + 2] - x[i + 1];
        let hs = h0 + h1;
        total += hs / 6.0
            * ((2.0 - h1 / h0) * y[i] + hs * hs / (h0 * h1) * y[i + 1] + (2.0 - h0 / h1) * y[i + 2]);
    }

    if n % 2 == 0 {
        let h0 = x[n - 2] - x[n - 3];
        let h1 = x[n - 1] - x[n - 2];
        let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
        let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
        let eta = h1 * h1 * h1 / (6.0 * h0 * (h0 + h1));
        total += alpha * y[n - 1] + beta * y[n - 2] - eta * y[n - 3];
    }
    Ok(total)
}

/// Trapezoidal integral of `y` over strictly increasing `x`.
pub fn trapezoid(y: ArrayView1<'_, f64>, x: ArrayView1<'_, f64>) -> Result<f64> {
    check_grid(y, x)?;
    Ok((1..y.len())
        .map(|i| 0.5 * (x[i] - x[i - 1]) * (y[i] + y[i - 1]))
        .sum())
}

/// Simpson AUC of `signal` over the closed index range `[start, end]`.
///
/// Requires `start < end`; the range is not reordered.
pub fn auc_between(
    time: ArrayView1<'_, f64>,
    signal: ArrayView1<'_, f64>,
    start: usize,
    end: usize,
) -> Result<AucResult> {
    if time.len() != signal.len() {
        bail!("time has {} samples but signal has {}", time.len(), signal.len());
    }
    if start >= end {
        bail!("start index {start} must precede end index {end}");
    }
    if end >= time.len() {
        bail!("end index {end} out of range for {} samples", time.len());
    }
    let area = simpson(signal.slice(s![start..=end]), time.slice(s![start..=end]))?;
    Ok(AucResult {
        start_index: start,
        end_index: end,
        start_time: time[start],
        end_time: time[end],
        area,
    })
}

/// Index of the grid point closest to `x` (first one on ties).
pub fn nearest_index(grid: ArrayView1<'_, f64>, x: f64) -> Option<usize> {
    grid.iter()
        .enumerate()
        .filter(|(_, t)| !t.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &t)| {
            let d = (t - x).abs();
            match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((i, d)),
            }
        })
        .map(|(i, _)| i)
}

fn check_grid(y: ArrayView1<'_, f64>, x: ArrayView1<'_, f64>) -> Result<()> {
    if y.len() != x.len() {
        bail!("y has {} samples but x has {}", y.len(), x.len());
    }
    if y.len() < 2 {
        bail!("need at least 2 samples to integrate, got {}", y.len());
    }
    if let Some(i) = (1..x.len()).find(|&i| !(x[i] > x[i - 1])) {
        bail!("integration grid not strictly increasing at index {i}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn constant_integrates_to_width() {
        for n in [2usize, 3, 4, 7, 10] {
            let x = Array1::linspace(1.0, 4.0, n);
            let y = Array1::from_elem(n, 2.5);
            approx::assert_abs_diff_eq!(simpson(y.view(), x.view()).unwrap(), 7.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn quadratic_exact_on_irregular_grid() {
        let x = array![0.0, 0.3, 1.0, 1.2, 2.0];
        let y = x.mapv(|t| t * t);
        approx::assert_abs_diff_eq!(simpson(y.view(), x.view()).unwrap(), 8.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn quadratic_exact_with_odd_interval_count() {
        let x = array![0.0, 0.5, 1.1, 2.0];
        let y = x.mapv(|t| 3.0 * t * t - t);
        // ∫0^2 3t² − t = 8 − 2 = 6
        approx::assert_abs_diff_eq!(simpson(y.view(), x.view()).unwrap(), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn trapezoid_linear() {
        let x = array![0.0, 1.0, 3.0];
        let y = array![0.0, 1.0, 3.0];
        approx::assert_abs_diff_eq!(trapezoid(y.view(), x.view()).unwrap(), 4.5, epsilon = 1e-12);
    }

    #[test]
    fn rejects_bad_grids() {
        let y = array![1.0, 1.0, 1.0];
        assert!(simpson(y.view(), array![0.0, 1.0, 1.0].view()).is_err());
        assert!(simpson(y.view(), array![0.0, 1.0].view()).is_err());
        assert!(simpson(array![1.0].view(), array![0.0].view()).is_err());
    }

    #[test]
    fn nearest_prefers_first_on_tie() {
        let g = array![0.0, 1.0, 2.0];
        assert_eq!(nearest_index(g.view(), 0.5), Some(0));
        assert_eq!(nearest_index(g.view(), 1.6), Some(2));
        assert_eq!(nearest_index(g.view(), -10.0), Some(0));
        assert_eq!(nearest_index(Array1::<f64>::zeros(0).view(), 1.0), None);
    }

    #[test]
    fn auc_between_reports_bounds() {
        let t = Array1::linspace(0.0, 10.0, 11);
        let sig = Array1::from_elem(11, 2.0);
        let r = auc_between(t.view(), sig.view(), 2, 6).unwrap();
        approx::assert_abs_diff_eq!(r.area, 8.0, epsilon = 1e-12);
        assert_eq!((r.start_time, r.end_time), (2.0, 6.0));
        assert!(auc_between(t.view(), sig.view(), 6, 2).is_err());
        assert!(auc_between(t.view(), sig.view(), 3, 3).is_err());
    }
}
