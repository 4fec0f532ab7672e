//! # fiberphot: fiber-photometry de-interleaving and event decoding
//!
//! `fiberphot` turns a multiplexed fiber-photometry acquisition (several LED
//! excitation states interleaved in one CSV stream) into continuous
//! per-channel traces on a common timebase, decodes TTL pulse bursts into
//! named events on the same clock, and computes ΔF/F and AUC over selected
//! windows.
//!
//! ## Pipeline overview
//!
//! ```text
//! recording.csv                         ttl.csv (optional)
//!   │                                     │
//!   ├─ io::Recording::load()              ├─ io::load_ttl_pulses()   rising edges
//!   ├─ timebase::zero_at_first()          ├─ events::decode_events() bursts → names
//!   ├─ demux::deinterleave()              └─ events::align_events()  − recording T0
//!   │     LedState < 5, one trace per
//!   │     (region, channel), lerp onto
//!   │     the full timestamp column
//!   ├─ ratio::delta_f_over_f()            (interest − ref) / ref
//!   ├─ filter::savgol_filter()            250-sample cubic smoothing
//!   └─ selector::Selector                 two clicks → auc::simpson()
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use fiberphot::{load_traces, PipelineConfig};
//! use std::collections::BTreeMap;
//! use std::path::Path;
//!
//! let cfg = PipelineConfig::default();
//! let out = load_traces(Path::new("recording.csv"), Some(Path::new("ttl.csv")), &cfg).unwrap();
//!
//! let green = out.traces.get("Region0G", 2).unwrap();
//! assert_eq!(green.len(), out.traces.ts.len());
//! if let Some(events) = &out.events {
//!     println!("tones at {:?}", events["tone"]);
//! }
//! ```
//!
//! ## Selecting an AUC window
//!
//! ```no_run
//! use fiberphot::{normalized_signal, PipelineConfig, Recording};
//! use fiberphot::selector::{Selector, SelectorEvent, SelectorOutcome};
//! use std::path::Path;
//!
//! let cfg = PipelineConfig::default();
//! let rec = Recording::load(Path::new("recording.csv"), &cfg.regions).unwrap();
//! let sig = normalized_signal(&rec, &cfg).unwrap();
//!
//! let mut sel = Selector::new(sig.time.view(), sig.signal.view()).unwrap();
//! sel.handle(SelectorEvent::Click(Some(12.0)));
//! if let SelectorOutcome::Computed(auc) = sel.handle(SelectorEvent::Click(Some(30.0))) {
//!     println!("AUC {:.4} over {:.2}–{:.2} s", auc.area, auc.start_time, auc.end_time);
//! }
//! ```

pub mod auc;
pub mod config;
pub mod demux;
pub mod events;
pub mod filter;
pub mod io;
pub mod ratio;
pub mod selector;
pub mod timebase;

use anyhow::Result;
use ndarray::Array1;
use std::collections::BTreeMap;
use std::path::Path;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::{PipelineConfig, TtlCode, TtlConfig};

// io
pub use io::{is_region_column, load_ttl_pulses, Recording};

// timebase
pub use timebase::{zero_at_first, zero_timebase};

// demux
pub use demux::{channel_label, deinterleave, Linear, Traces};

// ratio
pub use ratio::{
    deinterleave_sites, default_sites, delta_f_over_f, scale, ChannelRoles, RatioTrace, Site,
    SiteTraces,
};

// events
pub use events::{align_events, decode_events, find_bursts, Burst, EventTimes};

// filter
pub use filter::savgol_filter;

// auc
pub use auc::{auc_between, nearest_index, simpson, trapezoid, AucResult};

/// De-interleaved traces plus, when TTL data was supplied, decoded events on
/// the recording's clock.
#[derive(Debug, Clone)]
pub struct Processed {
    pub traces: Traces,
    pub events: Option<EventTimes>,
}

/// Run the de-interleaving and event-decoding pipeline on in-memory data.
///
/// # Pipeline steps
///
/// 1. Take `t0` = first recording timestamp.
/// 2. If `ttl_pulses` is given, decode bursts with [`PipelineConfig::ttl_window`]
///    and [`PipelineConfig::ttl_codes`], then subtract `t0` from every event.
/// 3. Zero the recording's timestamps.
/// 4. De-interleave every region onto the zeroed timestamp column, keeping
///    LedState codes below [`PipelineConfig::max_led_state`].
///
/// # Errors
///
/// * empty recording;
/// * TTL pulses not in chronological order or not finite;
/// * no valid LedState code in the recording.
pub fn process(
    mut rec: Recording,
    ttl_pulses: Option<&[f64]>,
    cfg: &PipelineConfig,
) -> Result<Processed> {
    let ts = zero_at_first(&rec.timestamps)?;
    let t0 = rec.timestamps[0];

    let events = match ttl_pulses {
        Some(pulses) => {
            let mut ev = decode_events(pulses, cfg.ttl())?;
            align_events(&mut ev, t0);
            Some(ev)
        }
        None => None,
    };

    rec.timestamps = ts;
    let traces = deinterleave(&rec, &rec.timestamps, cfg.max_led_state)?;
    Ok(Processed { traces, events })
}

/// Read a recording (and optional TTL log) from disk and run [`process`].
pub fn load_traces(data: &Path, ttl: Option<&Path>, cfg: &PipelineConfig) -> Result<Processed> {
    let rec = Recording::load(data, &cfg.regions)?;
    let pulses = ttl.map(load_ttl_pulses).transpose()?;
    process(rec, pulses.as_deref(), cfg)
}

/// Dual-indicator site traces of an already loaded recording, sampled on its
/// own timestamp column with the default [`ChannelRoles`].
///
/// Only the regions `rec` was loaded with are visible, so a site whose
/// regions were left out of [`PipelineConfig::regions`] is an error.
pub fn site_traces(rec: &Recording, sites: &[Site]) -> Result<BTreeMap<String, SiteTraces>> {
    deinterleave_sites(rec, &rec.timestamps, sites, ChannelRoles::default())
}

/// The smoothed ΔF/F signal fed to the AUC selector.
#[derive(Debug, Clone)]
pub struct SelectionSignal {
    /// Zeroed time grid of the (optionally LedState-filtered) rows.
    pub time: Array1<f64>,
    /// Smoothed `(interest − reference) / reference`.
    pub signal: Array1<f64>,
    /// Non-finite ΔF/F samples before smoothing.  Each one turns the
    /// smoothed outputs whose window contains it non-finite, and no others.
    pub non_finite: usize,
}

/// Build the selector input from a raw recording.
///
/// Rows are restricted to [`PipelineConfig::selection_led_state`] (when set),
/// the time column is zeroed at the first kept row, ΔF/F is computed from
/// [`PipelineConfig::interest_region`] over
/// [`PipelineConfig::reference_region`], and the result is smoothed with
/// [`PipelineConfig::smooth_window`] / [`PipelineConfig::smooth_polyorder`].
pub fn normalized_signal(rec: &Recording, cfg: &PipelineConfig) -> Result<SelectionSignal> {
    let filtered;
    let rec = match cfg.selection_led_state {
        Some(state) => {
            filtered = rec.filter_led_state(state)?;
            &filtered
        }
        None => rec,
    };

    let time = zero_at_first(&rec.timestamps)?;
    let interest = rec.require_region(&cfg.interest_region)?;
    let reference = rec.require_region(&cfg.reference_region)?;
    let dff = delta_f_over_f(interest, reference)?;

    let raw = dff.values.to_vec();
    let smoothed = savgol_filter(&raw, cfg.smooth_window, cfg.smooth_polyorder)?;
    Ok(SelectionSignal {
        time,
        signal: Array1::from(smoothed),
        non_finite: dff.non_finite,
    })
}
