/// fp_summary: de-interleave a recording, decode its TTL log and print a
/// per-channel / per-event summary.
///
/// Output (stdout):
///   one line per (region, channel): samples, NaN count, mean, min, max
///   one line per event name: count and zeroed timestamps
///   with --sites: one line per site and ratio (dual-indicator layout)
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use fiberphot::{default_sites, load_ttl_pulses, process, site_traces, PipelineConfig, Recording};

#[derive(Parser, Debug)]
#[command(name = "fp_summary", about = "Fiber-photometry de-interleaving summary")]
struct Args {
    /// Recording CSV (Timestamp, LedState, Region<N><Color>...).
    #[arg(long)]
    data: PathBuf,

    /// Headerless TTL CSV (Timestamp, Value).
    #[arg(long)]
    ttl: Option<PathBuf>,

    /// JSON pipeline configuration; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Region columns to read (comma-separated); default: auto-detect.
    #[arg(long, value_delimiter = ',')]
    regions: Vec<String>,

    /// TTL burst window (s).
    #[arg(long)]
    ttl_window: Option<f64>,

    /// Also print the three-site dual-indicator ratios.
    #[arg(long)]
    sites: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if !args.regions.is_empty() {
        cfg.regions = args.regions.clone();
    }
    if let Some(w) = args.ttl_window {
        cfg.ttl_window = w;
    }

    let rec = Recording::load(&args.data, &cfg.regions)?;
    let pulses = args.ttl.as_deref().map(load_ttl_pulses).transpose()?;
    let sites = if args.sites {
        Some(site_traces(&rec, &default_sites())?)
    } else {
        None
    };
    let out = process(rec, pulses.as_deref(), &cfg)?;
    let n = out.traces.ts.len();
    println!(
        "{n} samples, {:.3} s",
        out.traces.ts.iter().next_back().copied().unwrap_or(0.0)
    );

    for (region, channels) in &out.traces.regions {
        for (label, trace) in channels {
            let finite: Vec<f64> = trace.iter().copied().filter(|v| v.is_finite()).collect();
            let nan = n - finite.len();
            if finite.is_empty() {
                println!("  {region:<10} {label:<7} all NaN");
                continue;
            }
            let mean = finite.iter().sum::<f64>() / finite.len() as f64;
            let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
            let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            println!(
                "  {region:<10} {label:<7} nan={nan:<6} mean={mean:.6} min={min:.6} max={max:.6}"
            );
        }
    }

    if let Some(events) = &out.events {
        for (name, ts) in events {
            let list: Vec<String> = ts.iter().map(|t| format!("{t:.3}")).collect();
            println!("  event {name:<8} n={:<4} [{}]", ts.len(), list.join(", "));
        }
    }

    if let Some(sites) = &sites {
        for (name, site) in sites {
            for (ratio, trace) in [("gcamp", &site.gcamp), ("rgeco", &site.rgeco)] {
                let mean = trace.values.iter().filter(|v| v.is_finite()).sum::<f64>()
                    / (n - trace.non_finite).max(1) as f64;
                println!(
                    "  site {name:<5} {ratio} mean={mean:.6} non_finite={}",
                    trace.non_finite
                );
            }
        }
    }

    Ok(())
}
