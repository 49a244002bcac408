//! Final merge of timeline columns, per-context columns, and the advisory
//! wall-clock estimate into one immutable table.

use chrono::{DateTime, Duration, Utc};
use contracts::{AlignedTable, AlignmentWarning, Label, WallClockAnchor};
use timeline::Timeline;
use tracing::instrument;

use crate::registry::RegisteredContext;

/// Assemble the output table.
///
/// Always succeeds once the timeline is frozen: pairs that failed alignment
/// already carry nulls in their context columns, and their warnings ride
/// along on the table.
#[instrument(level = "info", skip_all, fields(events = timeline.len(), contexts = entries.len()))]
pub(crate) fn assemble(
    timeline: &Timeline,
    entries: &[RegisteredContext],
    wallclock: Option<&WallClockAnchor>,
) -> AlignedTable {
    let rows = timeline.len();
    let mut segment_name: Vec<Label> = Vec::with_capacity(rows);
    let mut event_time = Vec::with_capacity(rows);
    let mut behavioral_code = Vec::with_capacity(rows);
    let mut trial_id = Vec::with_capacity(rows);
    let mut is_anchor = Vec::with_capacity(rows);
    let mut global_index = Vec::with_capacity(rows);

    for event in timeline.events() {
        segment_name.push(event.segment.clone());
        event_time.push(event.time);
        behavioral_code.push(event.code);
        trial_id.push(event.trial_id);
        is_anchor.push(event.is_anchor);
        global_index.push(event.global_index);
    }

    let contexts: Vec<_> = entries.iter().map(|e| e.columns.clone()).collect();
    let warnings: Vec<AlignmentWarning> = entries
        .iter()
        .flat_map(|e| e.warnings.iter().cloned())
        .collect();

    let absolute_datetime = estimate_wallclock(rows, entries, wallclock);

    metrics::counter!("aligner_tables_assembled_total").increment(1);
    metrics::gauge!("aligner_table_rows").set(rows as f64);

    AlignedTable::new(
        segment_name,
        event_time,
        behavioral_code,
        trial_id,
        is_anchor,
        global_index,
        contexts,
        absolute_datetime,
        warnings,
    )
}

/// Advisory wall-clock estimate per row.
///
/// Heuristic only: mapped ephys seconds shifted by one caller-supplied
/// reference instant. Not suitable for scientific timing comparisons.
fn estimate_wallclock(
    rows: usize,
    entries: &[RegisteredContext],
    wallclock: Option<&WallClockAnchor>,
) -> Vec<Option<DateTime<Utc>>> {
    let Some(anchor) = wallclock else {
        return vec![None; rows];
    };
    let Some(entry) = entries
        .iter()
        .find(|e| e.context.name() == &anchor.context)
    else {
        tracing::warn!(
            context = %anchor.context,
            "wall-clock anchor references an unregistered context; AbsoluteDateTime left null"
        );
        return vec![None; rows];
    };

    entry
        .columns
        .ephys_time()
        .iter()
        .map(|mapped| {
            mapped.map(|t| {
                let delta = t - anchor.ephys_time;
                anchor.wall_time + Duration::nanoseconds((delta * 1e9).round() as i64)
            })
        })
        .collect()
}
