//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable parameter for demultiplexing,
//! TTL decoding, smoothing and the interactive AUC selector.  All fields have
//! defaults matching the acquisition setup the pipeline was written for.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One entry of the TTL code table: an event name and the number of pulses
/// in a burst that identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlCode {
    pub name: String,
    pub pulses: usize,
}

impl TtlCode {
    pub fn new(name: &str, pulses: usize) -> Self {
        Self { name: name.to_string(), pulses }
    }
}

/// Parameters of the TTL event decoder, borrowed from [`PipelineConfig`].
#[derive(Debug, Clone, Copy)]
pub struct TtlConfig<'a> {
    /// Maximum distance (s) from a burst's leading pulse for a later pulse
    /// to count towards the same burst.
    pub window: f64,
    /// Event name → pulse count table, in output order.
    pub codes: &'a [TtlCode],
}

/// Configuration for the full fiber-photometry pipeline.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use fiberphot::PipelineConfig;
///
/// let cfg = PipelineConfig {
///     ttl_window: 0.8,      // tighter bursts
///     smooth_window: 101,
///     ..PipelineConfig::default()
/// };
/// ```
///
/// It can also be read from a JSON file; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Burst window of the TTL decoder in seconds.
    ///
    /// A pulse leads a burst when no other pulse precedes it by less than
    /// this amount; the burst contains every pulse in
    /// `[leader, leader + ttl_window)`.
    ///
    /// Default: `1.2` s.
    pub ttl_window: f64,

    /// Event name → pulse count table.
    ///
    /// Two names may share a count; a matching burst is then recorded under
    /// both.
    ///
    /// Default: `start = 10`, `shock = 1`, `tone = 2`, `pips = 3`.
    pub ttl_codes: Vec<TtlCode>,

    /// Exclusive ceiling on valid `LedState` codes.  Larger codes are
    /// sentinel rows and never become channels.
    ///
    /// Default: `5`.
    pub max_led_state: i64,

    /// Region columns to read from the recording.
    ///
    /// Every listed name must be present in the CSV header.  When empty, all
    /// headers of the form `Region<N><Color>` are used.
    ///
    /// Default: `[]` (auto-detect).
    pub regions: Vec<String>,

    /// Region holding the signal of interest for ΔF/F.
    ///
    /// Default: `"Region0G"`.
    pub interest_region: String,

    /// Region used as the ΔF/F reference.
    ///
    /// Default: `"Region1R"`.
    pub reference_region: String,

    /// Keep only rows with this `LedState` before building the ΔF/F signal
    /// for AUC selection.  `None` keeps every row.
    ///
    /// Default: `Some(1)`.
    pub selection_led_state: Option<i64>,

    /// Savitzky-Golay window length in samples.
    ///
    /// Default: `250`.
    pub smooth_window: usize,

    /// Savitzky-Golay polynomial order.  Must be below `smooth_window`.
    ///
    /// Default: `3`.
    pub smooth_polyorder: usize,
}

impl Default for PipelineConfig {
    /// 1.2 s TTL window · {start:10, shock:1, tone:2, pips:3} · LedState < 5 ·
    /// Region0G / Region1R · 250-sample cubic smoothing.
    fn default() -> Self {
        Self {
            ttl_window: 1.2,
            ttl_codes: vec![
                TtlCode::new("start", 10),
                TtlCode::new("shock", 1),
                TtlCode::new("tone", 2),
                TtlCode::new("pips", 3),
            ],
            max_led_state: 5,
            regions: vec![],
            interest_region: "Region0G".into(),
            reference_region: "Region1R".into(),
            selection_led_state: Some(1),
            smooth_window: 250,
            smooth_polyorder: 3,
        }
    }
}

impl PipelineConfig {
    /// Read a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))
    }

    /// Decoder parameters as a borrowed view.
    ///
    /// ```
    /// use fiberphot::PipelineConfig;
    /// let cfg = PipelineConfig::default();
    /// assert_eq!(cfg.ttl().codes.len(), 4);
    /// ```
    pub fn ttl(&self) -> TtlConfig<'_> {
        TtlConfig { window: self.ttl_window, codes: &self.ttl_codes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{ "ttl_window": 0.5, "regions": ["Region0G"] }"#).unwrap();
        assert_eq!(cfg.ttl_window, 0.5);
        assert_eq!(cfg.regions, vec!["Region0G".to_string()]);
        assert_eq!(cfg.smooth_window, 250);
        assert_eq!(cfg.ttl_codes, PipelineConfig::default().ttl_codes);
    }

    #[test]
    fn ttl_codes_from_json() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{ "ttl_codes": [{ "name": "reward", "pulses": 4 }] }"#,
        )
        .unwrap();
        assert_eq!(cfg.ttl().codes, &[TtlCode::new("reward", 4)]);
    }
}
