//! Two probes with offset, drifting clocks and imperfect event detection:
//! one probe missed a pulse, the behavioral log carries a spurious anchor.
//! Shows per-context isolation, warnings, and the run summary.

use align_engine::Aligner;
use anyhow::Result;
use config_loader::{ConfigFormat, ConfigLoader};
use contracts::EventRecord;
use observability::{init_with_config, AlignmentMetricsAggregator, LogFormat, ObservabilityConfig};

const CONFIG: &str = r#"
[dtw]
max_mean_cost = 2.0
ephys_window_slack = 8
"#;

fn main() -> Result<()> {
    init_with_config(ObservabilityConfig {
        log_format: LogFormat::Compact,
        ..Default::default()
    })?;

    let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml)?;
    let mut aligner = Aligner::new(config);

    // Ten trials, one start pulse plus two behavioral events each
    let mut records = Vec::new();
    for trial in 0..10i64 {
        let start = 12.0 + trial as f64 * 8.0;
        records.push(EventRecord::coded(start, 9).in_trial(trial));
        records.push(EventRecord::coded(start + 1.4, 30).in_trial(trial));
        records.push(EventRecord::coded(start + 3.9, 31).in_trial(trial));
    }
    // A spurious pulse logged shortly after trial 4's real one
    records.push(EventRecord::coded(44.6, 9).in_trial(4));

    aligner
        .add_segment("task", records)?
        .with_anchors(|e| e.code == Some(9));
    aligner.build()?;

    // probe0: clock offset +3 s, 0.1% drift, 30 kHz
    let probe0_times: Vec<f64> = (0..10)
        .map(|i| 3.0 + (12.0 + i as f64 * 8.0) * 1.001)
        .collect();
    let probe0_indices: Vec<i64> = probe0_times.iter().map(|t| (t * 30_000.0) as i64).collect();
    aligner.add_sync_context("probe0", probe0_times, probe0_indices, 30_000.0)?;

    // probe1: 20 kHz, missed the pulse of trial 6
    let probe1_times: Vec<f64> = (0..10)
        .filter(|&i| i != 6)
        .map(|i| 1.5 + (12.0 + i as f64 * 8.0) * 0.999)
        .collect();
    let probe1_indices: Vec<i64> = probe1_times.iter().map(|t| (t * 20_000.0) as i64).collect();
    aligner.add_sync_context("probe1", probe1_times, probe1_indices, 20_000.0)?;

    let table = aligner.get_final_dataframe()?;

    let mut aggregator = AlignmentMetricsAggregator::new();
    for report in aligner.context_reports() {
        observability::record_context_report(report);
        aggregator.update(report);
    }
    observability::record_table_assembled(table.len(), table.contexts().len());

    for warning in table.warnings() {
        tracing::warn!(%warning, "pair failed");
    }
    println!("{}", aggregator.summary());

    // A few rows around the spurious pulse
    let probe0 = table.context("probe0").unwrap();
    let probe1 = table.context("probe1").unwrap();
    println!("row  t(behav)  idx(probe0)     idx(probe1)");
    for row in 12..18 {
        println!(
            "{:>3}  {:>8.2}  {:>12}  {:>12}",
            row,
            table.event_times()[row],
            probe0.ephys_index()[row].map_or("null".into(), |i| i.to_string()),
            probe1.ephys_index()[row].map_or("null".into(), |i| i.to_string()),
        );
    }

    Ok(())
}
