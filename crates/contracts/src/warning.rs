//! Per-(segment, context) alignment warnings.
//!
//! A failed pair null-fills its mapped columns and is reported through one of
//! these values; sibling pairs and the overall run continue.

use std::fmt;

use serde::Serialize;

use crate::Label;

/// Which anchor sequence was too short for DTW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorSide {
    /// Behavioral side (segment anchors)
    Behavioral,
    /// Electrophysiology side (context anchors)
    Ephys,
}

impl fmt::Display for AnchorSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorSide::Behavioral => write!(f, "behavioral"),
            AnchorSide::Ephys => write!(f, "ephys"),
        }
    }
}

/// Reason a (segment, context) pair could not be aligned or mapped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// DTW needs at least two anchors on each side
    InsufficientAnchors { side: AnchorSide, count: usize },

    /// Mean optimal-path cost above the configured tolerance
    MeanCostExceeded { mean_cost: f64, limit: f64 },

    /// A single DTW block would exceed the cost-matrix size guard
    CostMatrixGuard { anchors: usize, limit: usize },

    /// Fewer than two matched anchors survived; interpolation impossible
    InsufficientMatches { matched: usize },
}

/// A recoverable alignment failure, attached to the final table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentWarning {
    /// Segment side of the failed pair
    pub segment: Label,

    /// Sync context side of the failed pair
    pub context: Label,

    /// Trial-id span of the failed DTW block, when the segment was chunked
    pub trials: Option<(i64, i64)>,

    /// What went wrong
    pub kind: WarningKind,
}

impl fmt::Display for AlignmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} x {}] ", self.segment, self.context)?;
        if let Some((first, last)) = self.trials {
            write!(f, "(trials {first}..={last}) ")?;
        }
        match &self.kind {
            WarningKind::InsufficientAnchors { side, count } => {
                write!(f, "{side} side has {count} anchors, need at least 2")
            }
            WarningKind::MeanCostExceeded { mean_cost, limit } => {
                write!(f, "mean warping cost {mean_cost:.4} exceeds tolerance {limit:.4}")
            }
            WarningKind::CostMatrixGuard { anchors, limit } => {
                write!(f, "{anchors} anchors in one block exceed the size guard of {limit}")
            }
            WarningKind::InsufficientMatches { matched } => {
                write!(f, "only {matched} matched anchors, interpolation impossible")
            }
        }
    }
}
