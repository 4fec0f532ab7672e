//! Two-click AUC selection as a display-independent state machine.
//!
//! ```text
//!            Click(x)                Click(x), start < end → AUC
//!  AwaitingStart ──────► AwaitingEnd ─────────────────────────┐
//!        ▲                    │ Click(x), start >= end → reject│
//!        └────────────────────┴────────────────────────────────┘
//!  Key('q') from any state → Closed (absorbing)
//! ```
//!
//! Clicks carry the x data coordinate of the pointer; `None` means the click
//! landed outside the plot axes and is ignored.
use anyhow::{bail, Result};
use ndarray::ArrayView1;

use crate::auc::{auc_between, nearest_index, AucResult};

/// Key that ends the session.
pub const CLOSE_KEY: char = 'q';

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectorEvent {
    Click(Option<f64>),
    Key(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    AwaitingStart,
    AwaitingEnd { start: usize },
    Closed,
}

/// What a single event did.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorOutcome {
    /// Event had no effect.
    Ignored,
    StartSelected { index: usize, time: f64 },
    /// Second click accepted and the AUC computed; selection reset.
    Computed(AucResult),
    /// Second click did not come after the first; selection reset.
    Rejected { start: usize, end: usize },
    Closed,
}

/// Selector over one time grid and one (normalised, smoothed) signal.
pub struct Selector<'a> {
    time: ArrayView1<'a, f64>,
    signal: ArrayView1<'a, f64>,
    state: SelectorState,
}

impl<'a> Selector<'a> {
    /// `time` and `signal` must have the same length.
    pub fn new(time: ArrayView1<'a, f64>, signal: ArrayView1<'a, f64>) -> Result<Self> {
        if time.len() != signal.len() {
            bail!("time has {} samples but signal has {}", time.len(), signal.len());
        }
        Ok(Self { time, signal, state: SelectorState::AwaitingStart })
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn handle(&mut self, event: SelectorEvent) -> SelectorOutcome {
        match (self.state, event) {
            (SelectorState::Closed, _) => SelectorOutcome::Ignored,
            (_, SelectorEvent::Key(CLOSE_KEY)) => {
                self.state = SelectorState::Closed;
                SelectorOutcome::Closed
            }
            (_, SelectorEvent::Key(_)) | (_, SelectorEvent::Click(None)) => {
                SelectorOutcome::Ignored
            }
            (SelectorState::AwaitingStart, SelectorEvent::Click(Some(x))) => {
                match nearest_index(self.time, x) {
                    Some(index) => {
                        self.state = SelectorState::AwaitingEnd { start: index };
                        SelectorOutcome::StartSelected { index, time: self.time[index] }
                    }
                    None => SelectorOutcome::Ignored,
                }
            }
            (SelectorState::AwaitingEnd { start }, SelectorEvent::Click(Some(x))) => {
                let Some(end) = nearest_index(self.time, x) else {
                    return SelectorOutcome::Ignored;
                };
                self.state = SelectorState::AwaitingStart;
                if start >= end {
                    return SelectorOutcome::Rejected { start, end };
                }
                match auc_between(self.time, self.signal, start, end) {
                    Ok(result) => SelectorOutcome::Computed(result),
                    Err(e) => {
                        log::warn!("AUC over [{start}, {end}] failed: {e:#}");
                        SelectorOutcome::Rejected { start, end }
                    }
                }
            }
        }
    }
}
