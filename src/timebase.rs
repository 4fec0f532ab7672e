//! Timebase normalisation: shift a timestamp column so the recording starts
//! at zero.
//!
//! `ts[i] -= t0`, where `t0` is the first timestamp of the *main recording*.
//! TTL event times are shifted by the same `t0` so both streams share the
//! recording's clock.
use anyhow::{bail, Result};
use ndarray::Array1;

/// Return `ts - t0` element-wise.
pub fn zero_timebase(ts: &Array1<f64>, t0: f64) -> Array1<f64> {
    ts.mapv(|t| t - t0)
}

/// Return `ts - ts[0]`.  Fails on an empty column.
pub fn zero_at_first(ts: &Array1<f64>) -> Result<Array1<f64>> {
    match ts.first() {
        Some(&t0) => Ok(zero_timebase(ts, t0)),
        None => bail!("cannot zero an empty timestamp column"),
    }
}

/// In-place variant used for event-time lists.
pub fn zero_timebase_inplace(ts: &mut [f64], t0: f64) {
    for t in ts.iter_mut() {
        *t -= t0;
    }
}
