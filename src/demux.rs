//! Channel de-interleaving.
//!
//! The acquisition system cycles LED excitation states, so every row of a
//! recording belongs to exactly one channel (its `LedState`).  For each
//! (region, channel) pair the rows of that channel are linearly
//! interpolated onto the full timestamp column, giving one trace per pair
//! that lines up index-for-index with the master grid.
//!
//! ```text
//! Timestamp  LedState  Region0G            state1            state2
//! 0.00       1         a0          →       a0                lerp/extrap
//! 0.02       2         b0          →       lerp(a0,a1)       b0
//! 0.04       1         a1          →       a1                lerp(b0,b1)
//! 0.06       2         b1          →       extrap            b1
//! ```
use anyhow::{bail, Result};
use ndarray::{Array1, ArrayView1};
use std::collections::{BTreeMap, BTreeSet};

use crate::io::Recording;

/// Per-region, per-channel traces sharing one timestamp grid.
#[derive(Debug, Clone)]
pub struct Traces {
    /// Master grid, one entry per recording row.
    pub ts: Array1<f64>,
    /// region → channel label (`state<N>`) → trace.
    pub regions: BTreeMap<String, BTreeMap<String, Array1<f64>>>,
}

impl Traces {
    pub fn get(&self, region: &str, state: i64) -> Option<&Array1<f64>> {
        self.regions.get(region)?.get(&channel_label(state))
    }
}

/// Label of a channel in [`Traces::regions`].
pub fn channel_label(state: i64) -> String {
    format!("state{state}")
}

/// Distinct LedState codes in ascending order, restricted to
/// `0 <= code < max_led_state`.
pub fn valid_channels(led_state: &Array1<i64>, max_led_state: i64) -> Vec<i64> {
    led_state
        .iter()
        .copied()
        .filter(|&s| (0..max_led_state).contains(&s))
        .collect::<BTreeSet<i64>>()
        .into_iter()
        .collect()
}

/// De-interleave every region of `rec` onto `grid`.
///
/// `grid` is normally the recording's own (zeroed) timestamp column; the row
/// timestamps used as interpolation knots come from `rec.timestamps`, so both
/// must be on the same clock.
///
/// A channel with fewer than two samples in a region cannot be interpolated;
/// it yields an all-NaN trace and a warning instead of an error.
pub fn deinterleave(rec: &Recording, grid: &Array1<f64>, max_led_state: i64) -> Result<Traces> {
    let channels = valid_channels(&rec.led_state, max_led_state);
    if channels.is_empty() {
        bail!("no LedState codes below {max_led_state} in recording");
    }

    let mut regions = BTreeMap::new();
    for (r, name) in rec.regions.iter().enumerate() {
        let values = rec.values.row(r);
        let mut by_chan = BTreeMap::new();
        for &chan in &channels {
            let trace = channel_trace(&rec.timestamps, &rec.led_state, values, chan, grid)
                .unwrap_or_else(|| {
                    log::warn!(
                        "not enough samples for LedState {chan} in {name}; trace left as NaN"
                    );
                    Array1::from_elem(grid.len(), f64::NAN)
                });
            by_chan.insert(channel_label(chan), trace);
        }
        regions.insert(name.clone(), by_chan);
    }

    Ok(Traces { ts: grid.clone(), regions })
}

/// Interpolate the rows of one channel onto `grid`.
///
/// Returns `None` when the channel has fewer than two samples.
pub fn channel_trace(
    ts: &Array1<f64>,
    led_state: &Array1<i64>,
    values: ArrayView1<'_, f64>,
    chan: i64,
    grid: &Array1<f64>,
) -> Option<Array1<f64>> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = ts
        .iter()
        .zip(led_state.iter())
        .zip(values.iter())
        .filter(|((_, s), _)| **s == chan)
        .map(|((&t, _), &v)| (t, v))
        .unzip();

    log::debug!("LedState {chan}: {} samples", xs.len());
    if xs.len() < 2 {
        return None;
    }
    let interp = Linear::new(xs, ys)?;
    Some(grid.mapv(|t| interp.eval(t)))
}

// ── Piecewise-linear interpolant ─────────────────────────────────────────────

/// Piecewise-linear interpolant over strictly increasing knots, extrapolating
/// with the first/last segment outside the knot range.
#[derive(Debug, Clone)]
pub struct Linear {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Linear {
    /// Build from knots in any order.  Knots are stable-sorted by x; a
    /// repeated x keeps its last value.  Returns `None` with fewer than two
    /// distinct knots.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Option<Self> {
        let mut pairs: Vec<(f64, f64)> = xs.into_iter().zip(ys).collect();
        if !pairs.windows(2).all(|w| w[0].0 < w[1].0) {
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            pairs.dedup_by(|later, earlier| {
                if later.0 == earlier.0 {
                    earlier.1 = later.1;
                    true
                } else {
                    false
                }
            });
        }
        if pairs.len() < 2 {
            return None;
        }
        let (xs, ys) = pairs.into_iter().unzip();
        Some(Self { xs, ys })
    }

    pub fn eval(&self, t: f64) -> f64 {
        let n = self.xs.len();
        // Segment whose right knot is the first xs > t, clamped to [1, n-1].
        let k = self.xs.partition_point(|&x| x <= t).clamp(1, n - 1);
        let (x0, x1) = (self.xs[k - 1], self.xs[k]);
        let (y0, y1) = (self.ys[k - 1], self.ys[k]);
        y0 + (y1 - y0) * (t - x0) / (x1 - x0)
    }
}
