//! Savitzky-Golay coefficient design.
//!
//! A Savitzky-Golay filter replaces each sample by the value, at that sample,
//! of the least-squares polynomial of order `polyorder` fitted to a window of
//! `window` neighbours.  Because the fit is linear in the data, the smoothed
//! value is a fixed weighted sum of the window:
//!
//! ```text
//!   A[i, j] = ((i − pos) / s)^j          i ∈ [0, window),  j ∈ [0, polyorder]
//!   (AᵀA) z = e₀
//!   w[i]    = Σ_j z[j] · A[i, j]         smoothed = Σ_i w[i] · x[start + i]
//! ```
//!
//! `pos` is the position inside the window where the fit is evaluated and
//! `s` rescales the abscissa to `[-1, 1]` so the normal equations stay well
//! conditioned for long windows.
use anyhow::{bail, Result};

/// Evaluation position for interior points: the geometric centre of the
/// window, `(window − 1) / 2`.
///
/// For even windows this falls between two samples.  The output sample `i`
/// then sits at the left of the two, so its window is
/// `[i − (window/2 − 1), i + window/2]` and the fit is read at `i + 0.5`.
pub fn center(window: usize) -> f64 {
    (window as f64 - 1.0) / 2.0
}

/// Samples of the interior window that precede the output sample.
pub fn lead(window: usize) -> usize {
    (window - 1) / 2
}

/// Check filter parameters against each other.
pub fn validate(window: usize, polyorder: usize) -> Result<()> {
    if window == 0 {
        bail!("Savitzky-Golay window must be at least 1");
    }
    if polyorder >= window {
        bail!("polyorder ({polyorder}) must be less than window ({window})");
    }
    Ok(())
}

/// Weights `w[window]` giving the fitted polynomial's value at `pos`.
///
/// `pos` need not lie at the centre or on a sample; edge samples use `pos`
/// near either end.
pub fn savgol_coeffs(window: usize, polyorder: usize, pos: f64) -> Result<Vec<f64>> {
    validate(window, polyorder)?;
    let last = (window - 1) as f64;
    if !(0.0..=last).contains(&pos) {
        bail!("evaluation position {pos} outside window of {window}");
    }
    let n_p = polyorder + 1;
    let s = pos.max(last - pos).max(1.0);

    // Vandermonde rows.
    let a: Vec<Vec<f64>> = (0..window)
        .map(|i| {
            let x = (i as f64 - pos) / s;
            let mut row = Vec::with_capacity(n_p);
            let mut v = 1.0;
            for _ in 0..n_p {
                row.push(v);
                v *= x;
            }
            row
        })
        .collect();

    // Normal matrix AᵀA.
    let mut ata = vec![vec![0.0_f64; n_p]; n_p];
    for row in &a {
        for j in 0..n_p {
            for k in 0..n_p {
                ata[j][k] += row[j] * row[k];
            }
        }
    }

    let mut e0 = vec![0.0_f64; n_p];
    e0[0] = 1.0;
    let z = solve(ata, e0)?;

    Ok(a.iter()
        .map(|row| row.iter().zip(&z).map(|(r, zj)| r * zj).sum())
        .collect())
}

/// Solve `m · x = b` by Gaussian elimination with partial pivoting.
fn solve(mut m: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() < 1e-300 {
            bail!("singular Savitzky-Golay normal matrix");
        }
        m.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let f = m[row][col] / m[col][col];
            for k in col..n {
                m[row][k] -= f * m[col][k];
            }
            b[row] -= f * b[col];
        }
    }
    let mut x = vec![0.0_f64; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| m[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / m[row][row];
    }
    Ok(x)
}
