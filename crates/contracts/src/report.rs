//! Per-context alignment summary, for logging and metrics aggregation.

use serde::Serialize;

use crate::Label;

/// What one sync context's alignment run produced.
///
/// Computed once at registration; useful for run summaries and for feeding
/// the observability aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextReport {
    /// Context name
    pub context: Label,

    /// Segments on the timeline
    pub segments_total: usize,

    /// Segments that ended up with mapped columns
    pub segments_mapped: usize,

    /// Behavioral anchors with a matched ephys anchor
    pub matched_anchors: usize,

    /// Behavioral anchors left unmatched
    pub unmatched_anchors: usize,

    /// Average of the per-block mean path costs, when any block ran
    pub mean_path_cost: Option<f64>,

    /// Warnings attached to this context
    pub warnings: usize,
}

impl ContextReport {
    /// Fraction of behavioral anchors that found a partner.
    pub fn match_ratio(&self) -> f64 {
        let total = self.matched_anchors + self.unmatched_anchors;
        if total == 0 {
            0.0
        } else {
            self.matched_anchors as f64 / total as f64
        }
    }
}
