//! Minimal end-to-end run: the two-trial session from the README of every
//! alignment walkthrough, one 30 kHz probe, JSON export of the final table.

use align_engine::Aligner;
use anyhow::Result;
use chrono::{TimeZone, Utc};
use contracts::{EventRecord, WallClockAnchor};
use observability::{init_with_config, LogFormat, ObservabilityConfig};

fn main() -> Result<()> {
    init_with_config(ObservabilityConfig {
        log_format: LogFormat::Pretty,
        ..Default::default()
    })?;

    let mut aligner = Aligner::default();

    // Two trials, three behavioral events each; code 19 marks trial start
    aligner
        .add_segment(
            "task",
            vec![
                EventRecord::coded(10.1, 19).in_trial(1),
                EventRecord::coded(15.2, 23).in_trial(1),
                EventRecord::coded(19.8, 25).in_trial(1),
                EventRecord::coded(30.5, 19).in_trial(2),
                EventRecord::coded(35.8, 23).in_trial(2),
                EventRecord::coded(39.9, 25).in_trial(2),
            ],
        )?
        .with_anchors(|e| e.code == Some(19));

    aligner.build()?;

    aligner.add_sync_context(
        "probe0",
        vec![10.0, 20.0, 30.0, 40.0],
        vec![300_000, 600_000, 900_000, 1_200_000],
        30_000.0,
    )?;

    aligner.set_wallclock_anchor(WallClockAnchor {
        context: "probe0".into(),
        wall_time: Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap(),
        ephys_time: 10.0,
    });

    let table = aligner.get_final_dataframe()?;

    for report in aligner.context_reports() {
        tracing::info!(
            context = %report.context,
            matched = report.matched_anchors,
            unmatched = report.unmatched_anchors,
            "context aligned"
        );
        observability::record_context_report(report);
    }
    observability::record_table_assembled(table.len(), table.contexts().len());

    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}
