//! Anchor extraction from a frozen segment.

use crate::segment::Segment;

/// One anchor event, as seen by the aligner.
///
/// Carries just enough to run DTW and to join the match back onto the
/// segment's events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRef {
    /// Position of the anchor within its segment
    pub local_index: usize,

    /// Event time in source-clock seconds
    pub time: f64,

    /// Trial identifier, used for chunking
    pub trial_id: Option<i64>,
}

impl Segment {
    /// The ordered subsequence of anchor events.
    ///
    /// Ordering follows the segment's (time-sorted) event order. Whether the
    /// extracted sequence is long enough for DTW is judged per sync context
    /// by the aligner, since that failure is recoverable.
    pub fn anchor_refs(&self) -> Vec<AnchorRef> {
        self.events()
            .iter()
            .filter(|e| e.is_anchor)
            .map(|e| AnchorRef {
                local_index: e.local_index,
                time: e.time,
                trial_id: e.trial_id,
            })
            .collect()
    }
}
