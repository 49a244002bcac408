//! AlignedTable - final assembled output
//!
//! One row per timeline event, one pair of mapped columns per registered sync
//! context. Persistence is delegated to the caller: the table serializes as an
//! array of records so any serde-based tabular writer can consume it.

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

use crate::{AlignmentWarning, Label};

/// Mapped columns computed for one sync context.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextColumns {
    name: Label,
    ephys_time: Vec<Option<f64>>,
    ephys_index: Vec<Option<i64>>,
}

impl ContextColumns {
    /// Bundle the two mapped columns of a context.
    ///
    /// Both vectors must have one entry per timeline event.
    pub fn new(name: Label, ephys_time: Vec<Option<f64>>, ephys_index: Vec<Option<i64>>) -> Self {
        debug_assert_eq!(ephys_time.len(), ephys_index.len());
        Self {
            name,
            ephys_time,
            ephys_index,
        }
    }

    /// Context name
    pub fn name(&self) -> &Label {
        &self.name
    }

    /// Mapped ephys-clock time per event, `None` when unmapped
    pub fn ephys_time(&self) -> &[Option<f64>] {
        &self.ephys_time
    }

    /// Mapped raw sample index per event, `None` when unmapped
    pub fn ephys_index(&self) -> &[Option<i64>] {
        &self.ephys_index
    }

    /// Column header for the mapped time, e.g. `EphysTime_probe0`
    pub fn time_header(&self) -> String {
        format!("EphysTime_{}", self.name)
    }

    /// Column header for the mapped index, e.g. `EphysIndice_probe0`
    pub fn index_header(&self) -> String {
        format!("EphysIndice_{}", self.name)
    }
}

/// Caller-supplied wall-clock reference for the advisory datetime column.
///
/// Declares that `ephys_time` seconds on `context`'s clock correspond to
/// `wall_time`. The derived column is heuristic only and carries no precision
/// guarantee; it must not be used for scientific timing comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallClockAnchor {
    /// Context whose mapped time drives the estimate
    pub context: Label,

    /// Real-world timestamp of the reference instant
    pub wall_time: DateTime<Utc>,

    /// Ephys-clock seconds of the reference instant
    pub ephys_time: f64,
}

/// The immutable output table.
///
/// Column-major storage; every column has exactly one entry per timeline
/// event, in global-index order. Context column pairs appear in context
/// registration order.
#[derive(Debug, Clone)]
pub struct AlignedTable {
    segment_name: Vec<Label>,
    event_time: Vec<f64>,
    behavioral_code: Vec<Option<i64>>,
    trial_id: Vec<Option<i64>>,
    is_anchor: Vec<bool>,
    global_index: Vec<u64>,
    contexts: Vec<ContextColumns>,
    absolute_datetime: Vec<Option<DateTime<Utc>>>,
    warnings: Vec<AlignmentWarning>,
}

impl AlignedTable {
    /// Assemble a table from its columns.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        segment_name: Vec<Label>,
        event_time: Vec<f64>,
        behavioral_code: Vec<Option<i64>>,
        trial_id: Vec<Option<i64>>,
        is_anchor: Vec<bool>,
        global_index: Vec<u64>,
        contexts: Vec<ContextColumns>,
        absolute_datetime: Vec<Option<DateTime<Utc>>>,
        warnings: Vec<AlignmentWarning>,
    ) -> Self {
        let rows = segment_name.len();
        debug_assert_eq!(event_time.len(), rows);
        debug_assert_eq!(behavioral_code.len(), rows);
        debug_assert_eq!(trial_id.len(), rows);
        debug_assert_eq!(is_anchor.len(), rows);
        debug_assert_eq!(global_index.len(), rows);
        debug_assert_eq!(absolute_datetime.len(), rows);
        debug_assert!(contexts.iter().all(|c| c.ephys_time().len() == rows));

        Self {
            segment_name,
            event_time,
            behavioral_code,
            trial_id,
            is_anchor,
            global_index,
            contexts,
            absolute_datetime,
            warnings,
        }
    }

    /// Number of rows (timeline events)
    pub fn len(&self) -> usize {
        self.segment_name.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.segment_name.is_empty()
    }

    /// Owning segment per row
    pub fn segment_names(&self) -> &[Label] {
        &self.segment_name
    }

    /// Source-clock event time per row
    pub fn event_times(&self) -> &[f64] {
        &self.event_time
    }

    /// Behavioral code per row
    pub fn behavioral_codes(&self) -> &[Option<i64>] {
        &self.behavioral_code
    }

    /// Trial id per row
    pub fn trial_ids(&self) -> &[Option<i64>] {
        &self.trial_id
    }

    /// Anchor flag per row
    pub fn anchor_flags(&self) -> &[bool] {
        &self.is_anchor
    }

    /// Global timeline position per row
    pub fn global_indices(&self) -> &[u64] {
        &self.global_index
    }

    /// Context column pairs in registration order
    pub fn contexts(&self) -> &[ContextColumns] {
        &self.contexts
    }

    /// Columns of one context, by name
    pub fn context(&self, name: &str) -> Option<&ContextColumns> {
        self.contexts.iter().find(|c| c.name() == name)
    }

    /// Advisory real-world timestamp per row (heuristic, no precision
    /// guarantee)
    pub fn absolute_datetimes(&self) -> &[Option<DateTime<Utc>>] {
        &self.absolute_datetime
    }

    /// Warnings collected from failed (segment, context) pairs
    pub fn warnings(&self) -> &[AlignmentWarning] {
        &self.warnings
    }

    /// Column headers, in serialization order.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![
            "segment_name".to_string(),
            "EventTime".to_string(),
            "BehavioralCode".to_string(),
            "TrialID".to_string(),
            "is_anchor".to_string(),
            "global_index".to_string(),
        ];
        for ctx in &self.contexts {
            headers.push(ctx.time_header());
            headers.push(ctx.index_header());
        }
        headers.push("AbsoluteDateTime".to_string());
        headers
    }
}

// Serializes as an array of records so callers can hand the table to any
// serde-based tabular writer.
impl Serialize for AlignedTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct Row<'a> {
            table: &'a AlignedTable,
            index: usize,
        }

        impl Serialize for Row<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let t = self.table;
                let i = self.index;
                let fields = 7 + 2 * t.contexts.len();
                let mut map = serializer.serialize_map(Some(fields))?;
                map.serialize_entry("segment_name", &t.segment_name[i])?;
                map.serialize_entry("EventTime", &t.event_time[i])?;
                map.serialize_entry("BehavioralCode", &t.behavioral_code[i])?;
                map.serialize_entry("TrialID", &t.trial_id[i])?;
                map.serialize_entry("is_anchor", &t.is_anchor[i])?;
                map.serialize_entry("global_index", &t.global_index[i])?;
                for ctx in &t.contexts {
                    map.serialize_entry(&ctx.time_header(), &ctx.ephys_time()[i])?;
                    map.serialize_entry(&ctx.index_header(), &ctx.ephys_index()[i])?;
                }
                map.serialize_entry("AbsoluteDateTime", &t.absolute_datetime[i])?;
                map.end()
            }
        }

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for index in 0..self.len() {
            seq.serialize_element(&Row { table: self, index })?;
        }
        seq.end()
    }
}
