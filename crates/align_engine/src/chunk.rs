//! Trial-based chunking of a segment's anchor sequence.
//!
//! Each chunk becomes one DTW run, which keeps the cost matrix bounded by the
//! anchors of a few trials and stops drift accumulated in one trial from
//! contaminating the match of a distant one. Segments without trial ids form
//! a single block and rely on the size guard instead.

use contracts::DtwConfig;
use timeline::AnchorRef;

/// One DTW block: a contiguous slice of the segment's anchor sequence.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AnchorChunk<'a> {
    /// Anchors of this block, in segment order
    pub anchors: &'a [AnchorRef],

    /// First and last trial id covered, when the segment carries trial ids
    pub trials: Option<(i64, i64)>,
}

/// Split a segment's anchors into DTW blocks.
///
/// Consecutive trials are coalesced until a block holds at least
/// `min_chunk_anchors`; a trailing undersized block merges into its
/// predecessor. If any anchor lacks a trial id the whole segment is one
/// block.
pub(crate) fn chunk_anchors<'a>(
    anchors: &'a [AnchorRef],
    config: &DtwConfig,
) -> Vec<AnchorChunk<'a>> {
    if anchors.is_empty() {
        return Vec::new();
    }

    if anchors.iter().any(|a| a.trial_id.is_none()) {
        return vec![AnchorChunk {
            anchors,
            trials: None,
        }];
    }

    // Boundaries where the trial id changes
    let mut groups: Vec<(usize, usize)> = Vec::new(); // (start, end) exclusive
    let mut start = 0;
    for i in 1..anchors.len() {
        if anchors[i].trial_id != anchors[i - 1].trial_id {
            groups.push((start, i));
            start = i;
        }
    }
    groups.push((start, anchors.len()));

    // Coalesce small trials forward
    let mut chunks: Vec<(usize, usize)> = Vec::new();
    let mut open: Option<(usize, usize)> = None;
    for (g_start, g_end) in groups {
        let merged = match open.take() {
            Some((c_start, _)) => (c_start, g_end),
            None => (g_start, g_end),
        };
        if merged.1 - merged.0 >= config.min_chunk_anchors {
            chunks.push(merged);
        } else {
            open = Some(merged);
        }
    }
    // Trailing undersized block merges backward
    if let Some((_, end)) = open {
        match chunks.last_mut() {
            Some(last) => last.1 = end,
            None => chunks.push((0, end)),
        }
    }

    chunks
        .into_iter()
        .map(|(start, end)| {
            let slice = &anchors[start..end];
            let first = slice.first().and_then(|a| a.trial_id);
            let last = slice.last().and_then(|a| a.trial_id);
            AnchorChunk {
                anchors: slice,
                trials: first.zip(last),
            }
        })
        .collect()
}
