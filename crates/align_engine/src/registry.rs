//! Per-context alignment runs over the frozen timeline.
//!
//! Contexts are independent: each one recomputes extraction, warping, and
//! mapping for every segment against its own ephys data, and a failed
//! (segment, context) pair null-fills its rows without touching siblings.

use std::collections::HashMap;

use contracts::{
    AlignmentWarning, AnchorSide, ContextColumns, ContextReport, CoreError, DtwConfig,
    WarningKind,
};
use timeline::{Segment, Timeline};
use tracing::instrument;

use crate::chunk::chunk_anchors;
use crate::context::SyncContext;
use crate::dtw::{align_sequences, LocalCost};
use crate::mapper::{map_segment, ControlPoint, ControlTable, SegmentMapping};

/// Seconds the predicted window start backs off from the offset estimate, to
/// absorb drift accumulated since the last matched block.
const PREDICTION_MARGIN_S: f64 = 1.0;

/// One registered context with its computed columns.
pub(crate) struct RegisteredContext {
    pub context: SyncContext,
    pub columns: ContextColumns,
    pub warnings: Vec<AlignmentWarning>,
    pub report: ContextReport,
}

/// Registration-ordered store of computed contexts.
#[derive(Default)]
pub(crate) struct ContextRegistry {
    entries: Vec<RegisteredContext>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the full alignment of one context and store the result.
    ///
    /// Fails only on a duplicate name; alignment problems end up as warnings
    /// on the stored entry.
    pub fn register(
        &mut self,
        context: SyncContext,
        timeline: &Timeline,
        config: &DtwConfig,
        cost_fn: &dyn LocalCost,
    ) -> Result<(), CoreError> {
        if self
            .entries
            .iter()
            .any(|e| e.context.name() == context.name())
        {
            return Err(CoreError::DuplicateContext {
                name: context.name().to_string(),
            });
        }

        let entry = compute_context(context, timeline, config, cost_fn);
        metrics::counter!("aligner_contexts_registered_total").increment(1);
        metrics::counter!("aligner_pair_warnings_total")
            .increment(entry.warnings.len() as u64);
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[RegisteredContext] {
        &self.entries
    }
}

#[instrument(level = "info", skip_all, fields(context = %context.name(), segments = timeline.segments().len()))]
fn compute_context(
    context: SyncContext,
    timeline: &Timeline,
    config: &DtwConfig,
    cost_fn: &dyn LocalCost,
) -> RegisteredContext {
    let mut ephys_time = Vec::with_capacity(timeline.len());
    let mut ephys_index = Vec::with_capacity(timeline.len());
    let mut warnings = Vec::new();

    let mut segments_mapped = 0;
    let mut matched_anchors = 0;
    let mut unmatched_anchors = 0;
    let mut chunk_costs = Vec::new();

    for segment in timeline.segments() {
        let outcome = align_segment(segment, &context, config, cost_fn);
        ephys_time.extend(outcome.mapping.ephys_time);
        ephys_index.extend(outcome.mapping.ephys_index);

        if outcome.mapped {
            segments_mapped += 1;
        }
        matched_anchors += outcome.matched;
        unmatched_anchors += outcome.unmatched;
        chunk_costs.extend(outcome.chunk_costs);
        warnings.extend(outcome.warnings);
    }

    for warning in &warnings {
        tracing::warn!(context = %context.name(), %warning, "alignment pair failed");
    }
    metrics::counter!(
        "aligner_anchors_matched_total",
        "context" => context.name().to_string()
    )
    .increment(matched_anchors as u64);
    metrics::counter!(
        "aligner_anchors_unmatched_total",
        "context" => context.name().to_string()
    )
    .increment(unmatched_anchors as u64);
    for cost in &chunk_costs {
        metrics::histogram!("aligner_chunk_mean_cost").record(*cost);
    }

    let mean_path_cost = if chunk_costs.is_empty() {
        None
    } else {
        Some(chunk_costs.iter().sum::<f64>() / chunk_costs.len() as f64)
    };

    let report = ContextReport {
        context: context.name().clone(),
        segments_total: timeline.segments().len(),
        segments_mapped,
        matched_anchors,
        unmatched_anchors,
        mean_path_cost,
        warnings: warnings.len(),
    };

    let columns = ContextColumns::new(context.name().clone(), ephys_time, ephys_index);

    RegisteredContext {
        context,
        columns,
        warnings,
        report,
    }
}

/// Everything one (segment, context) pair produced.
struct SegmentOutcome {
    mapping: SegmentMapping,
    warnings: Vec<AlignmentWarning>,
    mapped: bool,
    matched: usize,
    unmatched: usize,
    chunk_costs: Vec<f64>,
}

impl SegmentOutcome {
    fn failed(segment: &Segment, warning: AlignmentWarning, unmatched: usize) -> Self {
        Self {
            mapping: SegmentMapping::unmapped(segment.len()),
            warnings: vec![warning],
            mapped: false,
            matched: 0,
            unmatched,
            chunk_costs: Vec::new(),
        }
    }
}

#[instrument(level = "debug", skip_all, fields(segment = %segment.name(), anchors = segment.anchor_count()))]
fn align_segment(
    segment: &Segment,
    context: &SyncContext,
    config: &DtwConfig,
    cost_fn: &dyn LocalCost,
) -> SegmentOutcome {
    let pair_warning = |trials, kind| AlignmentWarning {
        segment: segment.name().clone(),
        context: context.name().clone(),
        trials,
        kind,
    };

    let anchors = segment.anchor_refs();
    if anchors.len() < 2 {
        return SegmentOutcome::failed(
            segment,
            pair_warning(
                None,
                WarningKind::InsufficientAnchors {
                    side: AnchorSide::Behavioral,
                    count: anchors.len(),
                },
            ),
            anchors.len(),
        );
    }
    if context.len() < 2 {
        return SegmentOutcome::failed(
            segment,
            pair_warning(
                None,
                WarningKind::InsufficientAnchors {
                    side: AnchorSide::Ephys,
                    count: context.len(),
                },
            ),
            anchors.len(),
        );
    }

    let mut warnings = Vec::new();
    let mut chunk_costs = Vec::new();
    let mut matched: HashMap<usize, ControlPoint> = HashMap::new();
    let mut points: Vec<ControlPoint> = Vec::new();

    // Blocks walk the ephys sequence left to right. The first block removes
    // each side's own start offset; once matches exist, the running offset
    // estimate predicts where the next block's pulses sit, so one failed
    // block cannot drag every later block off its pulses.
    let mut cursor = 0usize;
    let mut offset_est: Option<f64> = None;
    for chunk in chunk_anchors(&anchors, config) {
        if chunk.anchors.len() > config.max_chunk_anchors {
            warnings.push(pair_warning(
                chunk.trials,
                WarningKind::CostMatrixGuard {
                    anchors: chunk.anchors.len(),
                    limit: config.max_chunk_anchors,
                },
            ));
            continue;
        }

        let start = match offset_est {
            None => cursor,
            Some(offset) => {
                let predicted = chunk.anchors[0].time + offset - PREDICTION_MARGIN_S;
                context
                    .ephys_times()
                    .partition_point(|&e| e < predicted)
                    .max(cursor)
            }
        };
        let window_end = (start + chunk.anchors.len() + config.ephys_window_slack)
            .min(context.len());
        let window = &context.ephys_times()[start..window_end];
        if window.len() < 2 {
            warnings.push(pair_warning(
                chunk.trials,
                WarningKind::InsufficientAnchors {
                    side: AnchorSide::Ephys,
                    count: window.len(),
                },
            ));
            continue;
        }

        // Normalize both sides into one frame: by start offsets for the
        // first block, by the running offset estimate afterwards
        let behavioral: Vec<f64> = match offset_est {
            None => {
                let b0 = chunk.anchors[0].time;
                let e0 = window[0];
                chunk.anchors.iter().map(|a| a.time - b0 + e0).collect()
            }
            Some(offset) => chunk.anchors.iter().map(|a| a.time + offset).collect(),
        };
        let outcome = align_sequences(&behavioral, window, cost_fn);
        chunk_costs.push(outcome.mean_cost);

        if let Some(limit) = config.max_mean_cost {
            if outcome.mean_cost > limit {
                warnings.push(pair_warning(
                    chunk.trials,
                    WarningKind::MeanCostExceeded {
                        mean_cost: outcome.mean_cost,
                        limit,
                    },
                ));
                continue;
            }
        }

        let mut offset_sum = 0.0;
        for pair in &outcome.pairs {
            let anchor = chunk.anchors[pair.behavioral];
            let ephys_pos = start + pair.ephys;
            let point = ControlPoint {
                behavioral: anchor.time,
                ephys_time: context.ephys_times()[ephys_pos],
                ephys_index: context.ephys_indices()[ephys_pos],
            };
            offset_sum += point.ephys_time - point.behavioral;
            matched.insert(anchor.local_index, point);
            points.push(point);
        }
        offset_est = Some(offset_sum / outcome.pairs.len() as f64);
        if let Some(last) = outcome.pairs.last() {
            cursor = start + last.ephys + 1;
        }
    }

    let table = ControlTable::new(points, context.sampling_rate());
    if table.len() < 2 {
        let mut outcome = SegmentOutcome::failed(
            segment,
            pair_warning(
                None,
                WarningKind::InsufficientMatches { matched: table.len() },
            ),
            anchors.len(),
        );
        outcome.warnings.splice(0..0, warnings);
        return outcome;
    }

    let mapping = map_segment(segment, &matched, &table);
    SegmentOutcome {
        mapping,
        warnings,
        mapped: true,
        matched: matched.len(),
        unmatched: anchors.len() - matched.len(),
        chunk_costs,
    }
}
