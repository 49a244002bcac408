//! Event model shared between the timeline and the alignment engine.

use serde::{Deserialize, Serialize};

use crate::Label;

/// One input row from an external loader.
///
/// Loaders are outside the core; whatever parses the vendor format must
/// produce rows of this shape. `time` is in source-clock seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event time in source-clock seconds
    pub time: f64,

    /// Behavioral code (e.g. MonkeyLogic code number)
    #[serde(default)]
    pub code: Option<i64>,

    /// Trial identifier, used to bound each DTW run
    #[serde(default)]
    pub trial_id: Option<i64>,
}

impl EventRecord {
    /// Row with a time only.
    pub fn at(time: f64) -> Self {
        Self {
            time,
            code: None,
            trial_id: None,
        }
    }

    /// Row with a time and behavioral code.
    pub fn coded(time: f64, code: i64) -> Self {
        Self {
            time,
            code: Some(code),
            trial_id: None,
        }
    }

    /// Attach a trial identifier.
    pub fn in_trial(mut self, trial_id: i64) -> Self {
        self.trial_id = Some(trial_id);
        self
    }
}

/// One event of a frozen timeline.
///
/// Created by `Timeline::build` from an [`EventRecord`]; immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Owning segment name
    pub segment: Label,

    /// Position within the segment, after sorting by time
    pub local_index: usize,

    /// Position within the whole timeline (unique, dense)
    pub global_index: u64,

    /// Event time in source-clock seconds
    pub time: f64,

    /// Behavioral code
    pub code: Option<i64>,

    /// Trial identifier
    pub trial_id: Option<i64>,

    /// Whether the segment's anchor predicate selected this event
    pub is_anchor: bool,
}
