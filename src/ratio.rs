//! Ratiometric normalisation.
//!
//! `delta_f_over_f`: single pair: `(interest − reference) / reference`.
//!
//! `deinterleave_sites`: dual-indicator layout where every anatomical site
//! has a green-detector region and a red-detector region:
//!   violet = LedState 1 on the green region (isosbestic reference)
//!   green  = LedState 2 on the green region
//!   red    = LedState 4 on the red region
//!   gcamp  = (green − violet) / violet
//!   rgeco  = (red   − violet) / violet
//!
//! Division is not guarded: a zero reference sample produces ±inf or NaN in
//! that position.  The count of such samples is returned so callers can
//! decide what to do with them.
use anyhow::{bail, Context, Result};
use ndarray::{Array1, ArrayView1, Zip};
use std::collections::BTreeMap;

use crate::demux::channel_trace;
use crate::io::Recording;

/// A normalised signal and the number of non-finite samples in it.
#[derive(Debug, Clone)]
pub struct RatioTrace {
    pub values: Array1<f64>,
    pub non_finite: usize,
}

/// `(interest − reference) / reference`, element-wise.
///
/// Fails only when the lengths differ; non-finite results are kept and
/// counted.
pub fn delta_f_over_f(
    interest: ArrayView1<'_, f64>,
    reference: ArrayView1<'_, f64>,
) -> Result<RatioTrace> {
    if interest.len() != reference.len() {
        bail!(
            "interest has {} samples but reference has {}",
            interest.len(),
            reference.len()
        );
    }
    let values = Zip::from(&interest)
        .and(&reference)
        .map_collect(|&s, &r| (s - r) / r);
    let non_finite = values.iter().filter(|v| !v.is_finite()).count();
    if non_finite > 0 {
        log::warn!("{non_finite} of {} ratio samples are not finite", values.len());
    }
    Ok(RatioTrace { values, non_finite })
}

// ── Multi-site layout ────────────────────────────────────────────────────────

/// One recording site: its green- and red-detector region columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub name: String,
    pub green_region: String,
    pub red_region: String,
}

impl Site {
    pub fn new(name: &str, green_region: &str, red_region: &str) -> Self {
        Self {
            name: name.to_string(),
            green_region: green_region.to_string(),
            red_region: red_region.to_string(),
        }
    }
}

/// LedState code of each excitation role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRoles {
    pub reference: i64,
    pub green: i64,
    pub red: i64,
}

impl Default for ChannelRoles {
    fn default() -> Self {
        Self { reference: 1, green: 2, red: 4 }
    }
}

/// The three-site `lar` / `acc` / `lal` layout: site `k` uses
/// `Region{2k}G` and `Region{2k+1}R`.
pub fn default_sites() -> Vec<Site> {
    vec![
        Site::new("lar", "Region0G", "Region1R"),
        Site::new("acc", "Region2G", "Region3R"),
        Site::new("lal", "Region4G", "Region5R"),
    ]
}

/// Interpolated raw channels and both ratios of one site.
#[derive(Debug, Clone)]
pub struct SiteTraces {
    pub violet: Array1<f64>,
    pub green: Array1<f64>,
    pub red: Array1<f64>,
    pub gcamp: RatioTrace,
    pub rgeco: RatioTrace,
}

/// Build [`SiteTraces`] for every site on the grid `grid`.
///
/// Unlike [`crate::demux::deinterleave`], a role with fewer than two samples
/// is an error here: the ratios would be meaningless.
pub fn deinterleave_sites(
    rec: &Recording,
    grid: &Array1<f64>,
    sites: &[Site],
    roles: ChannelRoles,
) -> Result<BTreeMap<String, SiteTraces>> {
    let role_trace = |region: &str, chan: i64| -> Result<Array1<f64>> {
        let values = rec.require_region(region)?;
        channel_trace(&rec.timestamps, &rec.led_state, values, chan, grid)
            .with_context(|| format!("fewer than 2 samples of LedState {chan} in {region}"))
    };

    let mut out = BTreeMap::new();
    for site in sites {
        let violet = role_trace(&site.green_region, roles.reference)?;
        let green = role_trace(&site.green_region, roles.green)?;
        let red = role_trace(&site.red_region, roles.red)?;
        let gcamp = delta_f_over_f(green.view(), violet.view())?;
        let rgeco = delta_f_over_f(red.view(), violet.view())?;
        out.insert(site.name.clone(), SiteTraces { violet, green, red, gcamp, rgeco });
    }
    Ok(out)
}

/// Z-score a trace with the population standard deviation.  A constant
/// trace is returned unchanged.
pub fn scale(trace: ArrayView1<'_, f64>) -> Array1<f64> {
    let n = trace.len() as f64;
    if n == 0.0 {
        return trace.to_owned();
    }
    let mean = trace.sum() / n;
    let std = (trace.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    if std > 0.0 {
        trace.mapv(|v| (v - mean) / std)
    } else {
        trace.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn dff_basic() {
        let s = array![2.0, 3.0, 1.0];
        let r = array![1.0, 2.0, 2.0];
        let out = delta_f_over_f(s.view(), r.view()).unwrap();
        assert_eq!(out.values.to_vec(), vec![1.0, 0.5, -0.5]);
        assert_eq!(out.non_finite, 0);
    }

    #[test]
    fn zero_reference_propagates() {
        let s = array![1.0, 0.0, 2.0];
        let r = array![0.0, 0.0, 1.0];
        let out = delta_f_over_f(s.view(), r.view()).unwrap();
        assert!(out.values[0].is_infinite());
        assert!(out.values[1].is_nan());
        approx::assert_abs_diff_eq!(out.values[2], 1.0);
        assert_eq!(out.non_finite, 2);
    }

    #[test]
    fn length_mismatch_fails() {
        let s = array![1.0, 2.0];
        let r = array![1.0];
        assert!(delta_f_over_f(s.view(), r.view()).is_err());
    }

    #[test]
    fn scale_mean_zero_std_one() {
        let z = scale(array![1.0, 2.0, 3.0, 4.0].view());
        approx::assert_abs_diff_eq!(z.sum(), 0.0, epsilon = 1e-12);
        let var = z.iter().map(|v| v * v).sum::<f64>() / 4.0;
        approx::assert_abs_diff_eq!(var, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn scale_constant_unchanged() {
        let z = scale(array![7.0, 7.0].view());
        assert_eq!(z.to_vec(), vec![7.0, 7.0]);
    }
}
