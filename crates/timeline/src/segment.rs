//! One behavioral/motion data source: mutable while building, frozen after.

use contracts::{CoreError, Event, EventRecord, Label};

/// Anchor selection predicate, evaluated once per event at build time.
pub type AnchorPredicate = Box<dyn Fn(&Event) -> bool + Send + Sync>;

/// Mutable segment state, returned as a handle by `add_segment`.
///
/// Supports the fluent registration style:
/// `aligner.add_segment("task", records)?.with_anchors(|e| e.code == Some(19))`.
pub struct SegmentBuilder {
    name: Label,
    records: Vec<EventRecord>,
    predicate: Option<AnchorPredicate>,
}

impl SegmentBuilder {
    pub(crate) fn new(name: Label, records: Vec<EventRecord>) -> Self {
        Self {
            name,
            records,
            predicate: None,
        }
    }

    /// Segment name
    pub fn name(&self) -> &Label {
        &self.name
    }

    /// Number of records registered so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are registered
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Set the anchor predicate for this segment.
    ///
    /// Without a predicate every event is an anchor.
    pub fn with_anchors<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Append one more record.
    ///
    /// Rejects non-finite times immediately, so `build()` never has to back
    /// out of a partially consumed registration.
    pub fn push(&mut self, record: EventRecord) -> Result<&mut Self, CoreError> {
        if !record.time.is_finite() {
            return Err(CoreError::NonFiniteEventTime {
                segment: self.name.to_string(),
                index: self.records.len(),
            });
        }
        self.records.push(record);
        Ok(self)
    }

    /// Sort, number, and flag anchors; called once per segment by
    /// `TimelineBuilder::build`.
    pub(crate) fn freeze(self, first_global: u64) -> Segment {
        let SegmentBuilder {
            name,
            mut records,
            predicate,
        } = self;

        // Stable sort: records with equal times keep insertion order.
        // Times were checked finite at registration, so Equal never masks NaN
        records.sort_by(|a, b| {
            a.time
                .partial_cmp(&b.time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut events = Vec::with_capacity(records.len());
        let mut anchor_count = 0;
        for (local_index, record) in records.into_iter().enumerate() {
            let mut event = Event {
                segment: name.clone(),
                local_index,
                global_index: first_global + local_index as u64,
                time: record.time,
                code: record.code,
                trial_id: record.trial_id,
                is_anchor: false,
            };
            event.is_anchor = match &predicate {
                Some(pred) => pred(&event),
                None => true,
            };
            if event.is_anchor {
                anchor_count += 1;
            }
            events.push(event);
        }

        Segment {
            name,
            events,
            anchor_count,
        }
    }
}

/// A frozen segment of the timeline.
#[derive(Debug)]
pub struct Segment {
    name: Label,
    events: Vec<Event>,
    anchor_count: usize,
}

impl Segment {
    /// Segment name
    pub fn name(&self) -> &Label {
        &self.name
    }

    /// Events in time order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the segment holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events flagged as anchors
    pub fn anchor_count(&self) -> usize {
        self.anchor_count
    }
}
