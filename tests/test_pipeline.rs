mod common;
use common::{interleaved, line, write_recording, write_ttl, T0};
use fiberphot::{
    default_sites, load_traces, normalized_signal, process, site_traces, PipelineConfig, Recording,
};

const REGIONS: [&str; 2] = ["Region0G", "Region1R"];

#[test]
fn load_traces_zeroes_both_clocks() {
    let dir = tempfile::tempdir().unwrap();
    let rec = interleaved(200, 0.05, &[1, 2, 4], &REGIONS);
    let data = write_recording(dir.path(), &rec);
    // TTL clock shares the recording's absolute origin.
    let ttl = write_ttl(dir.path(), &[T0 + 2.0, T0 + 2.1, T0 + 6.0]);

    let cfg = PipelineConfig::default();
    let out = load_traces(&data, Some(&ttl), &cfg).unwrap();

    assert_eq!(out.traces.ts.len(), 200);
    assert_eq!(out.traces.ts[0], 0.0);
    let ev = out.events.unwrap();
    assert_eq!(ev["tone"].len(), 1);
    approx::assert_abs_diff_eq!(ev["tone"][0], 2.0, epsilon = 1e-9);
    assert_eq!(ev["shock"].len(), 1);
    approx::assert_abs_diff_eq!(ev["shock"][0], 6.0, epsilon = 1e-9);
}

#[test]
fn events_use_recording_origin_not_ttl_origin() {
    let rec = interleaved(50, 0.1, &[1, 2], &REGIONS);
    let cfg = PipelineConfig::default();
    // First TTL pulse is 3 s after the recording starts.
    let out = process(rec, Some(&[T0 + 3.0][..]), &cfg).unwrap();
    let ev = out.events.unwrap();
    approx::assert_abs_diff_eq!(ev["shock"][0], 3.0, epsilon = 1e-9);
}

#[test]
fn no_ttl_no_events() {
    let rec = interleaved(50, 0.1, &[1, 2], &REGIONS);
    let out = process(rec, None, &PipelineConfig::default()).unwrap();
    assert!(out.events.is_none());
    assert_eq!(out.traces.regions.len(), 2);
}

#[test]
fn explicit_region_schema_restricts_columns() {
    let dir = tempfile::tempdir().unwrap();
    let rec = interleaved(40, 0.05, &[1, 2], &REGIONS);
    let data = write_recording(dir.path(), &rec);

    let cfg = PipelineConfig { regions: vec!["Region1R".into()], ..PipelineConfig::default() };
    let out = load_traces(&data, None, &cfg).unwrap();
    assert_eq!(out.traces.regions.keys().collect::<Vec<_>>(), vec!["Region1R"]);

    let cfg = PipelineConfig { regions: vec!["Region7G".into()], ..PipelineConfig::default() };
    let err = load_traces(&data, None, &cfg).unwrap_err();
    assert!(format!("{err:#}").contains("Region7G"));
}

#[test]
fn csv_round_trip_preserves_values() {
    let dir = tempfile::tempdir().unwrap();
    let rec = interleaved(30, 0.05, &[1, 2, 9], &REGIONS);
    let path = write_recording(dir.path(), &rec);
    let back = Recording::load(&path, &[]).unwrap();
    assert_eq!(back.regions, vec!["Region0G", "Region1R"]);
    assert_eq!(back.led_state, rec.led_state);
    for (a, b) in back.values.iter().zip(rec.values.iter()) {
        approx::assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn missing_file_reports_path() {
    let err = load_traces(
        std::path::Path::new("/nonexistent/rec.csv"),
        None,
        &PipelineConfig::default(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/rec.csv"));
}

#[test]
fn unsorted_ttl_fails_the_pipeline() {
    let rec = interleaved(20, 0.1, &[1, 2], &REGIONS);
    assert!(process(rec, Some(&[T0 + 5.0, T0 + 1.0][..]), &PipelineConfig::default()).is_err());
}

#[test]
fn normalized_signal_filters_and_smooths() {
    let rec = interleaved(900, 0.01, &[1, 2, 4], &REGIONS);
    let cfg = PipelineConfig { smooth_window: 51, ..PipelineConfig::default() };
    let sig = normalized_signal(&rec, &cfg).unwrap();

    // Only LedState 1 rows survive.
    assert_eq!(sig.time.len(), 300);
    assert_eq!(sig.signal.len(), 300);
    assert_eq!(sig.time[0], 0.0);
    approx::assert_abs_diff_eq!(sig.time[1], 0.03, epsilon = 1e-9);
    assert_eq!(sig.non_finite, 0);

    // With state-1 rows only, ΔF/F is a smooth rational function of time;
    // the cubic smoother should stay close to it.
    for (i, &t) in sig.time.iter().enumerate() {
        let abs_t = T0 + t;
        let s = line(0, 1, abs_t);
        let r = line(1, 1, abs_t);
        approx::assert_abs_diff_eq!(sig.signal[i], (s - r) / r, epsilon = 1e-4);
    }
}

#[test]
fn normalized_signal_shorter_than_window_fails() {
    let rec = interleaved(90, 0.01, &[1, 2, 4], &REGIONS);
    // 30 state-1 rows < default 250-sample window.
    assert!(normalized_signal(&rec, &PipelineConfig::default()).is_err());
}

#[test]
fn site_traces_see_only_loaded_regions() {
    let dir = tempfile::tempdir().unwrap();
    let six = ["Region0G", "Region1R", "Region2G", "Region3R", "Region4G", "Region5R"];
    let rec = interleaved(120, 0.01, &[1, 2, 4], &six);
    let data = write_recording(dir.path(), &rec);

    let cfg = PipelineConfig {
        regions: vec!["Region0G".into(), "Region1R".into()],
        ..PipelineConfig::default()
    };
    let rec = Recording::load(&data, &cfg.regions).unwrap();

    let lar = site_traces(&rec, &default_sites()[..1]).unwrap();
    assert_eq!(lar["lar"].gcamp.values.len(), 120);
    for (i, &t) in rec.timestamps.iter().enumerate() {
        let violet = line(0, 1, t);
        approx::assert_abs_diff_eq!(
            lar["lar"].gcamp.values[i],
            (line(0, 2, t) - violet) / violet,
            epsilon = 1e-9
        );
    }

    // acc lives in Region2G/Region3R, which the schema left out.
    let err = site_traces(&rec, &default_sites()).unwrap_err();
    assert!(format!("{err:#}").contains("Region2G"));

    // The same recording then feeds the de-interleaving pipeline.
    let out = process(rec, None, &cfg).unwrap();
    assert_eq!(out.traces.regions.len(), 2);
}
