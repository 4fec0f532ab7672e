//! CSV readers for photometry recordings and TTL pulse logs.
//!
//! Recording layout (header row required):
//!
//! ```text
//! Timestamp,LedState,Region0G,Region1R,...
//! 1021.334,1,0.0213,0.0187
//! 1021.351,2,0.0342,0.0190
//! ```
//!
//! TTL layout (no header): `Timestamp,Value`, where `Value` marks a rising
//! edge with `True`/`true`/`1`.
use anyhow::{bail, Context, Result};
use ndarray::{Array1, Array2, ArrayView1};
use std::io::Read;
use std::path::Path;

pub const TIMESTAMP_COLUMN: &str = "Timestamp";
pub const LED_STATE_COLUMN: &str = "LedState";

// ── Recording ────────────────────────────────────────────────────────────────

/// A complete interleaved acquisition, one row per sample.
#[derive(Debug, Clone)]
pub struct Recording {
    /// [T] acquisition timestamps in seconds, in file order.
    pub timestamps: Array1<f64>,
    /// [T] LedState code of every row.
    pub led_state: Array1<i64>,
    /// Region column names, row order of `values`.
    pub regions: Vec<String>,
    /// [R, T] fluorescence per region.
    pub values: Array2<f64>,
}

impl Recording {
    /// Build a recording from already-parsed columns.
    pub fn from_parts(
        timestamps: Array1<f64>,
        led_state: Array1<i64>,
        regions: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self> {
        let n = timestamps.len();
        if led_state.len() != n {
            bail!("LedState has {} rows but Timestamp has {n}", led_state.len());
        }
        if values.nrows() != regions.len() {
            bail!("{} region names for {} region rows", regions.len(), values.nrows());
        }
        if values.ncols() != n {
            bail!("region data has {} samples but Timestamp has {n}", values.ncols());
        }
        Ok(Self { timestamps, led_state, regions, values })
    }

    /// Read a recording CSV.  `regions` lists the region columns to keep;
    /// pass an empty slice to take every `Region<N><Color>` column.
    pub fn load(path: &Path, regions: &[String]) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening recording {}", path.display()))?;
        let rec = Self::from_reader(file, regions)
            .with_context(|| format!("reading recording {}", path.display()))?;
        log::info!(
            "loaded {}: {} samples, regions {:?}",
            path.display(),
            rec.n_samples(),
            rec.regions
        );
        Ok(rec)
    }

    pub fn from_reader<R: Read>(reader: R, regions: &[String]) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .context("reading CSV headers")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("CSV missing '{name}' column"))
        };
        let ts_idx = column(TIMESTAMP_COLUMN)?;
        let led_idx = column(LED_STATE_COLUMN)?;

        let region_names: Vec<String> = if regions.is_empty() {
            headers.iter().filter(|h| is_region_column(h)).cloned().collect()
        } else {
            regions.to_vec()
        };
        let region_idx = region_names
            .iter()
            .map(|r| column(r.as_str()))
            .collect::<Result<Vec<usize>>>()?;

        let mut ts = Vec::new();
        let mut led = Vec::new();
        let mut cols: Vec<Vec<f64>> = vec![Vec::new(); region_names.len()];

        for (row_no, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("CSV row {row_no}"))?;
            let field = |idx: usize| record.get(idx).unwrap_or("").trim();

            ts.push(parse_f64(field(ts_idx), row_no, TIMESTAMP_COLUMN)?);
            led.push(parse_led_state(field(led_idx), row_no)?);
            for (col, (&idx, name)) in cols.iter_mut().zip(region_idx.iter().zip(&region_names)) {
                col.push(parse_f64(field(idx), row_no, name)?);
            }
        }

        if ts.is_empty() {
            bail!("recording has no samples");
        }

        let n = ts.len();
        let flat: Vec<f64> = cols.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((region_names.len(), n), flat)?;
        Self::from_parts(Array1::from(ts), Array1::from(led), region_names, values)
    }

    pub fn n_samples(&self) -> usize {
        self.timestamps.len()
    }

    /// Values of one region column.
    pub fn region(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.regions
            .iter()
            .position(|r| r == name)
            .map(|i| self.values.row(i))
    }

    /// Like [`Recording::region`] but fails with the available names.
    pub fn require_region(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        self.region(name)
            .with_context(|| format!("region '{name}' not in recording (have {:?})", self.regions))
    }

    /// Keep only rows whose LedState equals `state`.
    pub fn filter_led_state(&self, state: i64) -> Result<Self> {
        let keep: Vec<usize> = self
            .led_state
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == state)
            .map(|(i, _)| i)
            .collect();
        if keep.is_empty() {
            bail!("no rows with LedState == {state}");
        }
        let values = self.values.select(ndarray::Axis(1), &keep);
        Ok(Self {
            timestamps: keep.iter().map(|&i| self.timestamps[i]).collect(),
            led_state: keep.iter().map(|&i| self.led_state[i]).collect(),
            regions: self.regions.clone(),
            values,
        })
    }
}

/// `Region<N><Color>`: the literal `Region`, one or more digits, then one or
/// more ASCII letters.
pub fn is_region_column(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("Region") else {
        return false;
    };
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    let color = &rest[digits..];
    digits > 0 && !color.is_empty() && color.chars().all(|c| c.is_ascii_alphabetic())
}

fn parse_f64(s: &str, row: usize, col: &str) -> Result<f64> {
    s.parse::<f64>()
        .with_context(|| format!("row {row}, {col}: '{s}' is not a number"))
}

/// LedState is an integer, but tools that round-trip through floats write
/// `1.0`; accept those when they are integral.
fn parse_led_state(s: &str, row: usize) -> Result<i64> {
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    let f = parse_f64(s, row, LED_STATE_COLUMN)?;
    if f.fract() != 0.0 || !f.is_finite() {
        bail!("row {row}, {LED_STATE_COLUMN}: '{s}' is not an integer code");
    }
    Ok(f as i64)
}

// ── TTL ──────────────────────────────────────────────────────────────────────

/// Read a headerless TTL log and return the timestamps of rising edges
/// (rows whose value is true), in file order.
pub fn load_ttl_pulses(path: &Path) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening TTL file {}", path.display()))?;
    let pulses = ttl_pulses_from_reader(file)
        .with_context(|| format!("reading TTL file {}", path.display()))?;
    log::info!("loaded {}: {} rising edges", path.display(), pulses.len());
    Ok(pulses)
}

pub fn ttl_pulses_from_reader<R: Read>(reader: R) -> Result<Vec<f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(reader);

    let mut pulses = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("TTL row {row_no}"))?;
        if record.len() < 2 {
            bail!("TTL row {row_no}: expected 2 columns, got {}", record.len());
        }
        let ts = parse_f64(record[0].trim(), row_no, TIMESTAMP_COLUMN)?;
        if parse_bool(record[1].trim(), row_no)? {
            pulses.push(ts);
        }
    }
    Ok(pulses)
}

fn parse_bool(s: &str, row: usize) -> Result<bool> {
    match s {
        "True" | "true" | "TRUE" | "1" => Ok(true),
        "False" | "false" | "FALSE" | "0" => Ok(false),
        other => bail!("TTL row {row}, Value: '{other}' is not a boolean"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Timestamp,LedState,Region0G,Region1R,Flags
10.0,1,1.0,2.0,0
10.1,2,3.0,4.0,0
10.2,1.0,5.0,6.0,1
";

    #[test]
    fn region_names() {
        assert!(is_region_column("Region0G"));
        assert!(is_region_column("Region12R"));
        assert!(!is_region_column("Region"));
        assert!(!is_region_column("RegionG"));
        assert!(!is_region_column("Region0"));
        assert!(!is_region_column("SubRegion0G"));
        assert!(!is_region_column("Region0G_raw"));
    }

    #[test]
    fn reads_auto_detected_regions() {
        let rec = Recording::from_reader(CSV.as_bytes(), &[]).unwrap();
        assert_eq!(rec.regions, vec!["Region0G", "Region1R"]);
        assert_eq!(rec.n_samples(), 3);
        assert_eq!(rec.led_state.to_vec(), vec![1, 2, 1]);
        assert_eq!(rec.region("Region1R").unwrap().to_vec(), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn explicit_schema_must_match_header() {
        let err = Recording::from_reader(CSV.as_bytes(), &["Region2G".to_string()]).unwrap_err();
        assert!(format!("{err:#}").contains("Region2G"));
    }

    #[test]
    fn filter_keeps_matching_rows() {
        let rec = Recording::from_reader(CSV.as_bytes(), &[]).unwrap();
        let f = rec.filter_led_state(1).unwrap();
        assert_eq!(f.timestamps.to_vec(), vec![10.0, 10.2]);
        assert_eq!(f.region("Region0G").unwrap().to_vec(), vec![1.0, 5.0]);
        assert!(rec.filter_led_state(3).is_err());
    }

    #[test]
    fn ttl_keeps_true_rows() {
        let ttl = "1.0,False\n1.5,True\n2.0,False\n2.1,true\n3.0,1\n";
        let p = ttl_pulses_from_reader(ttl.as_bytes()).unwrap();
        assert_eq!(p, vec![1.5, 2.1, 3.0]);
    }

    #[test]
    fn ttl_rejects_garbage_value() {
        assert!(ttl_pulses_from_reader("1.0,maybe\n".as_bytes()).is_err());
    }
}
