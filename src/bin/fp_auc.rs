use anyhow::Result;
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;

use fiberphot::selector::{Selector, SelectorEvent, SelectorOutcome};
use fiberphot::{normalized_signal, PipelineConfig, Recording};

#[derive(Parser)]
#[command(
    name = "fp_auc",
    about = "Select AUC windows on the smoothed ΔF/F signal",
    long_about = "Reads one event per stdin line: a time in seconds is a click at that \
                  x position, '-' is a click outside the axes, any other single \
                  character is a key press ('q' quits)."
)]
struct Args {
    /// Recording CSV.
    #[arg(long)]
    data: PathBuf,

    /// JSON pipeline configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Smoothing window in samples (default: 250)
    #[arg(long)]
    smooth_window: Option<usize>,

    /// Keep every LedState instead of filtering to the configured one.
    #[arg(long)]
    all_rows: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(w) = args.smooth_window {
        cfg.smooth_window = w;
    }
    if args.all_rows {
        cfg.selection_led_state = None;
    }

    let rec = Recording::load(&args.data, &cfg.regions)?;
    let sig = normalized_signal(&rec, &cfg)?;
    println!(
        "{} samples, {:.2} s; enter click times (s), 'q' to quit",
        sig.time.len(),
        sig.time.iter().next_back().copied().unwrap_or(0.0)
    );

    let mut sel = Selector::new(sig.time.view(), sig.signal.view())?;
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let Some(event) = parse_event(line.trim()) else {
            continue;
        };
        match sel.handle(event) {
            SelectorOutcome::Ignored => {}
            SelectorOutcome::StartSelected { time, .. } => {
                println!("Start point selected at {time:.2} s");
            }
            SelectorOutcome::Computed(auc) => {
                println!("End point selected at {:.2} s", auc.end_time);
                println!(
                    "AUC between {:.2}s and {:.2}s: {:.4}",
                    auc.start_time, auc.end_time, auc.area
                );
            }
            SelectorOutcome::Rejected { end, .. } => {
                println!("End point selected at {:.2} s", sig.time[end]);
                println!("Please select points in correct order (start before end).");
            }
            SelectorOutcome::Closed => break,
        }
    }
    Ok(())
}

fn parse_event(s: &str) -> Option<SelectorEvent> {
    if s.is_empty() {
        return None;
    }
    if s == "-" {
        return Some(SelectorEvent::Click(None));
    }
    if let Ok(x) = s.parse::<f64>() {
        return Some(SelectorEvent::Click(Some(x)));
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(SelectorEvent::Key(c)),
        _ => {
            eprintln!("unrecognised input '{s}'");
            None
        }
    }
}
