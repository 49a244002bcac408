//! Propagation of the matched correspondence onto every event of a segment.
//!
//! The matched ephys anchors form a control table of (behavioral time, ephys
//! time, ephys sample index) triples. Mapped times follow the behavioral to
//! ephys warp through the control points; mapped indices locate the event's
//! own time in the ephys (time, index) columns, piecewise linearly between
//! control points and at the sampling rate beyond them. Both are monotone in
//! event time, so order is preserved.

use std::collections::HashMap;

use timeline::Segment;

/// One matched anchor, as a control point for interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ControlPoint {
    /// Behavioral time of the matched anchor
    pub behavioral: f64,
    /// Time of its matched ephys anchor
    pub ephys_time: f64,
    /// Sample index of its matched ephys anchor
    pub ephys_index: i64,
}

/// Strictly ascending control table plus the extrapolation rate.
#[derive(Debug, Clone)]
pub(crate) struct ControlTable {
    points: Vec<ControlPoint>,
    sampling_rate: f64,
}

impl ControlTable {
    /// Build a table from matched anchors, dropping any point that does not
    /// strictly increase in all three coordinates (duplicate behavioral
    /// times can appear when tied events are both matched).
    pub fn new(points: Vec<ControlPoint>, sampling_rate: f64) -> Self {
        let mut kept: Vec<ControlPoint> = Vec::with_capacity(points.len());
        for point in points {
            match kept.last() {
                Some(last)
                    if point.behavioral <= last.behavioral
                        || point.ephys_time <= last.ephys_time
                        || point.ephys_index <= last.ephys_index => {}
                _ => kept.push(point),
            }
        }
        Self {
            points: kept,
            sampling_rate,
        }
    }

    /// Number of usable control points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Carry a behavioral time onto the ephys clock.
    ///
    /// Linear between control points; unit-slope extension beyond them (the
    /// two clocks tick in seconds, only offset and drift differ).
    pub fn warp_time(&self, t: f64) -> f64 {
        let points = &self.points;
        let first = points[0];
        let last = points[points.len() - 1];

        if t <= first.behavioral {
            return first.ephys_time + (t - first.behavioral);
        }
        if t >= last.behavioral {
            return last.ephys_time + (t - last.behavioral);
        }
        let k = self.bracket(t);
        let (a, b) = (points[k], points[k + 1]);
        let fraction = (t - a.behavioral) / (b.behavioral - a.behavioral);
        a.ephys_time + fraction * (b.ephys_time - a.ephys_time)
    }

    /// Locate a time in the ephys (time, index) control columns.
    ///
    /// Piecewise linear between control points; beyond the matched range the
    /// sampling rate extends the nearest control point.
    pub fn locate_index(&self, t: f64) -> i64 {
        let points = &self.points;
        let first = points[0];
        let last = points[points.len() - 1];

        if t <= first.ephys_time {
            return first.ephys_index + ((t - first.ephys_time) * self.sampling_rate).round() as i64;
        }
        if t >= last.ephys_time {
            return last.ephys_index + ((t - last.ephys_time) * self.sampling_rate).round() as i64;
        }
        let k = self.bracket_ephys(t);
        let (a, b) = (points[k], points[k + 1]);
        let slope = (b.ephys_index - a.ephys_index) as f64 / (b.ephys_time - a.ephys_time);
        a.ephys_index + ((t - a.ephys_time) * slope).round() as i64
    }

    fn bracket(&self, t: f64) -> usize {
        // partition_point: first k with behavioral > t, minus one
        let upper = self.points.partition_point(|p| p.behavioral <= t);
        upper.saturating_sub(1).min(self.points.len() - 2)
    }

    fn bracket_ephys(&self, t: f64) -> usize {
        let upper = self.points.partition_point(|p| p.ephys_time <= t);
        upper.saturating_sub(1).min(self.points.len() - 2)
    }
}

/// Mapped columns for one segment, in local event order.
#[derive(Debug, Clone, Default)]
pub(crate) struct SegmentMapping {
    pub ephys_time: Vec<Option<f64>>,
    pub ephys_index: Vec<Option<i64>>,
}

impl SegmentMapping {
    /// All-null mapping for a segment that could not be aligned.
    pub fn unmapped(len: usize) -> Self {
        Self {
            ephys_time: vec![None; len],
            ephys_index: vec![None; len],
        }
    }
}

/// Map every event of a segment through the control table.
///
/// `matched` keys anchor local indices to their exact matched ephys anchor;
/// those rows take the ephys anchor's own time so a known correspondence is
/// never replaced by an estimate.
pub(crate) fn map_segment(
    segment: &Segment,
    matched: &HashMap<usize, ControlPoint>,
    table: &ControlTable,
) -> SegmentMapping {
    debug_assert!(table.len() >= 2);

    let mut mapping = SegmentMapping {
        ephys_time: Vec::with_capacity(segment.len()),
        ephys_index: Vec::with_capacity(segment.len()),
    };

    for event in segment.events() {
        let ephys_time = match matched.get(&event.local_index) {
            Some(point) => point.ephys_time,
            None => table.warp_time(event.time),
        };
        mapping.ephys_time.push(Some(ephys_time));
        mapping.ephys_index.push(Some(table.locate_index(event.time)));
    }

    mapping
}
