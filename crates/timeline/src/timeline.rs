//! Timeline accumulation and the frozen concatenation of all segments.

use contracts::{CoreError, Event, EventRecord, Label};
use tracing::instrument;

use crate::segment::{Segment, SegmentBuilder};

/// Accumulates segments during the Building phase.
#[derive(Default)]
pub struct TimelineBuilder {
    segments: Vec<SegmentBuilder>,
}

impl TimelineBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new segment and return its mutable handle.
    ///
    /// Fails on a duplicate name or on records with non-finite times; the
    /// duplicate check keys on the exact name string.
    #[instrument(level = "debug", skip_all, fields(segment = %name.as_ref(), records = records.len()))]
    pub fn add_segment(
        &mut self,
        name: impl AsRef<str>,
        records: Vec<EventRecord>,
    ) -> Result<&mut SegmentBuilder, CoreError> {
        let name: Label = name.as_ref().into();

        if self.segments.iter().any(|s| s.name() == &name) {
            return Err(CoreError::DuplicateSegment {
                name: name.to_string(),
            });
        }
        if let Some(index) = records.iter().position(|r| !r.time.is_finite()) {
            return Err(CoreError::NonFiniteEventTime {
                segment: name.to_string(),
                index,
            });
        }

        self.segments.push(SegmentBuilder::new(name, records));
        Ok(self.segments.last_mut().expect("just pushed"))
    }

    /// Number of registered segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether no segments are registered
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sort, flag anchors, concatenate, and freeze.
    #[instrument(level = "info", skip(self), fields(segments = self.segments.len()))]
    pub fn build(self) -> Result<Timeline, CoreError> {
        if self.segments.is_empty() {
            return Err(CoreError::NoSegments);
        }

        let mut frozen = Vec::with_capacity(self.segments.len());
        let mut next_global = 0u64;
        for builder in self.segments {
            let segment = builder.freeze(next_global);
            next_global += segment.len() as u64;
            frozen.push(segment);
        }

        let total = next_global as usize;
        tracing::info!(segments = frozen.len(), events = total, "timeline frozen");

        Ok(Timeline {
            segments: frozen,
            total,
        })
    }
}

/// The frozen, ordered union of all segments.
///
/// Global indices are unique, dense, and increase within each segment's
/// contiguous block; segment registration order is preserved.
#[derive(Debug)]
pub struct Timeline {
    segments: Vec<Segment>,
    total: usize,
}

impl Timeline {
    /// Segments in registration order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Look up one segment by name
    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name() == name)
    }

    /// Total number of events
    pub fn len(&self) -> usize {
        self.total
    }

    /// Whether the timeline holds no events
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// All events in global order
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.segments.iter().flat_map(|s| s.events().iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_segment_name_rejected() {
        let mut builder = TimelineBuilder::new();
        builder.add_segment("task", vec![EventRecord::at(1.0)]).unwrap();
        let result = builder.add_segment("task", vec![EventRecord::at(2.0)]);
        assert!(matches!(result, Err(CoreError::DuplicateSegment { .. })));
    }

    #[test]
    fn test_non_finite_time_rejected_at_registration() {
        let mut builder = TimelineBuilder::new();
        let result = builder.add_segment("task", vec![EventRecord::at(f64::INFINITY)]);
        assert!(matches!(
            result,
            Err(CoreError::NonFiniteEventTime { index: 0, .. })
        ));
    }

    #[test]
    fn test_build_empty_fails() {
        let result = TimelineBuilder::new().build();
        assert!(matches!(result, Err(CoreError::NoSegments)));
    }

    #[test]
    fn test_global_indices_dense_across_segments() {
        let mut builder = TimelineBuilder::new();
        builder
            .add_segment("task", vec![EventRecord::at(2.0), EventRecord::at(1.0)])
            .unwrap();
        builder
            .add_segment("mocap", vec![EventRecord::at(0.5)])
            .unwrap();
        let timeline = builder.build().unwrap();

        let globals: Vec<u64> = timeline.events().map(|e| e.global_index).collect();
        assert_eq!(globals, vec![0, 1, 2]);

        // Registration order preserved even though mocap starts earlier
        let segments: Vec<&str> = timeline
            .events()
            .map(|e| e.segment.as_str())
            .collect();
        assert_eq!(segments, vec!["task", "task", "mocap"]);
    }

    #[test]
    fn test_segment_lookup() {
        let mut builder = TimelineBuilder::new();
        builder.add_segment("task", vec![EventRecord::at(1.0)]).unwrap();
        let timeline = builder.build().unwrap();
        assert!(timeline.segment("task").is_some());
        assert!(timeline.segment("nope").is_none());
    }
}
