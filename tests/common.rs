/// Shared helpers: synthetic interleaved recordings and CSV fixtures.
use fiberphot::Recording;
use ndarray::{Array1, Array2};
use std::io::Write;
use std::path::{Path, PathBuf};

#[allow(unused)]
/// Offset of every synthetic clock, so zeroing is actually exercised.
pub const T0: f64 = 1000.0;

/// Region value of channel `state` at absolute time `t`: a distinct line
/// per (region, state) so interpolation is exact everywhere.
#[allow(unused)]
pub fn line(region: usize, state: i64, t: f64) -> f64 {
    (region as f64 + 1.0) * 10.0 + state as f64 + 0.5 * (state as f64 + 1.0) * (t - T0)
}

/// `n` rows cycling through `cycle` LedStates, `dt` seconds apart, with
/// region values from [`line`].
#[allow(unused)]
pub fn interleaved(n: usize, dt: f64, cycle: &[i64], regions: &[&str]) -> Recording {
    let ts: Array1<f64> = (0..n).map(|i| T0 + i as f64 * dt).collect();
    let led: Array1<i64> = (0..n).map(|i| cycle[i % cycle.len()]).collect();
    let values = Array2::from_shape_fn((regions.len(), n), |(r, i)| line(r, led[i], ts[i]));
    Recording::from_parts(
        ts,
        led,
        regions.iter().map(|r| r.to_string()).collect(),
        values,
    )
    .unwrap()
}

#[allow(unused)]
/// Write `rec` as a recording CSV with an extra non-region column.
pub fn write_recording(dir: &Path, rec: &Recording) -> PathBuf {
    let path = dir.join("recording.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, "Timestamp,LedState").unwrap();
    for r in &rec.regions {
        write!(f, ",{r}").unwrap();
    }
    writeln!(f, ",Flags").unwrap();
    for i in 0..rec.n_samples() {
        write!(f, "{},{}", rec.timestamps[i], rec.led_state[i]).unwrap();
        for r in 0..rec.regions.len() {
            write!(f, ",{}", rec.values[[r, i]]).unwrap();
        }
        writeln!(f, ",0").unwrap();
    }
    path
}

#[allow(unused)]
/// Write a headerless TTL log marking `pulses` as rising edges, each
/// followed by a falling edge 10 ms later.
pub fn write_ttl(dir: &Path, pulses: &[f64]) -> PathBuf {
    let path = dir.join("ttl.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    for &p in pulses {
        writeln!(f, "{p},True").unwrap();
        writeln!(f, "{},False", p + 0.01).unwrap();
    }
    path
}
