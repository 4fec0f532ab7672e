//! TTL burst decoding.
//!
//! External equipment signals an event by emitting a short burst of TTL
//! pulses; the number of pulses in the burst identifies the event.
//!
//! ```text
//! pulses:   |  |  |            |     |
//!           0 .1 .2           5.0   5.5
//!           └─ burst of 3 ─┘   └ 2 ┘
//! ```
//!
//! A pulse at `ts` leads a burst when no pulse lies in `(ts − window, ts)`.
//! The burst size is the number of pulses in `[ts, ts + window)`, and the
//! leader's timestamp is recorded under every event name whose code equals
//! that size.
use anyhow::{bail, Result};
use std::collections::BTreeMap;

use crate::config::TtlConfig;
use crate::timebase::zero_timebase_inplace;

/// Event name → leader timestamps, chronological.
pub type EventTimes = BTreeMap<String, Vec<f64>>;

/// A burst found in a pulse train.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub leader: f64,
    pub size: usize,
}

/// Split a sorted pulse train into bursts.
///
/// Fails when a timestamp is not finite or is smaller than its predecessor;
/// the grouping is only meaningful on chronological input.
pub fn find_bursts(pulses: &[f64], window: f64) -> Result<Vec<Burst>> {
    if !(window > 0.0) {
        bail!("TTL window must be positive, got {window}");
    }
    check_sorted(pulses)?;

    let mut bursts = Vec::new();
    for (i, &ts) in pulses.iter().enumerate() {
        // Pulses strictly before ts; equal timestamps do not disqualify.
        let before = pulses[..i].partition_point(|&p| p < ts);
        if before > 0 && pulses[before - 1] > ts - window {
            continue;
        }
        let end = pulses.partition_point(|&p| p < ts + window);
        bursts.push(Burst { leader: ts, size: end - before });
    }
    Ok(bursts)
}

/// Decode a pulse train into named events.
///
/// Every configured name is present in the output, possibly with no
/// timestamps.
pub fn decode_events(pulses: &[f64], cfg: TtlConfig<'_>) -> Result<EventTimes> {
    let mut events: EventTimes = cfg
        .codes
        .iter()
        .map(|c| (c.name.clone(), Vec::new()))
        .collect();

    for burst in find_bursts(pulses, cfg.window)? {
        let mut matched = false;
        for code in cfg.codes.iter().filter(|c| c.pulses == burst.size) {
            if let Some(ts) = events.get_mut(&code.name) {
                ts.push(burst.leader);
                matched = true;
            }
        }
        if !matched {
            log::debug!("burst at {:.3}s has {} pulses; no event code", burst.leader, burst.size);
        }
    }
    Ok(events)
}

/// Shift every event list onto the recording clock (`t − t0`).
pub fn align_events(events: &mut EventTimes, t0: f64) {
    for ts in events.values_mut() {
        zero_timebase_inplace(ts, t0);
    }
}

fn check_sorted(pulses: &[f64]) -> Result<()> {
    if let Some(i) = pulses.iter().position(|p| !p.is_finite()) {
        bail!("TTL pulse {i} has non-finite timestamp {}", pulses[i]);
    }
    if let Some(i) = pulses.windows(2).position(|w| w[1] < w[0]) {
        bail!(
            "TTL pulses are not chronological: pulse {} ({}) precedes pulse {} ({})",
            i + 1,
            pulses[i + 1],
            i,
            pulses[i]
        );
    }
    Ok(())
}
