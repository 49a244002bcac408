//! Aligner facade: the two-phase state machine over the whole pipeline.

use contracts::{
    AlignedTable, AlignmentWarning, ContextReport, CoreError, EngineConfig, EventRecord, Phase,
    WallClockAnchor,
};
use timeline::{SegmentBuilder, Timeline, TimelineBuilder};
use tracing::instrument;

use crate::assembler;
use crate::context::SyncContext;
use crate::dtw::{AbsoluteDiff, LocalCost};
use crate::registry::ContextRegistry;

/// Lifecycle state: building accumulates segments, frozen accepts contexts
/// and queries. Every operation checks the phase and rejects out-of-order
/// calls deterministically.
enum State {
    Building(TimelineBuilder),
    Frozen(FrozenState),
}

struct FrozenState {
    timeline: Timeline,
    registry: ContextRegistry,
}

/// The alignment engine.
///
/// Offline and batch: accumulate segments, `build()` once, register sync
/// contexts, then pull the final table. Contexts are independent of one
/// another; a failed (segment, context) pair null-fills its columns and
/// surfaces a warning instead of aborting the run.
pub struct Aligner {
    config: EngineConfig,
    cost_fn: Box<dyn LocalCost>,
    wallclock: Option<WallClockAnchor>,
    state: State,
}

impl Default for Aligner {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Aligner {
    /// Create an engine in the Building phase.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cost_fn: Box::new(AbsoluteDiff),
            wallclock: None,
            state: State::Building(TimelineBuilder::new()),
        }
    }

    /// Swap the DTW local-cost strategy.
    ///
    /// Only affects contexts registered afterwards; the default is the
    /// absolute time difference.
    pub fn with_local_cost(mut self, cost_fn: impl LocalCost + 'static) -> Self {
        self.cost_fn = Box::new(cost_fn);
        self
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        match self.state {
            State::Building(_) => Phase::Building,
            State::Frozen(_) => Phase::Frozen,
        }
    }

    /// Register a segment and get its fluent handle back.
    ///
    /// Fails on a duplicate name, a non-finite event time, or after
    /// `build()`.
    pub fn add_segment(
        &mut self,
        name: impl AsRef<str>,
        records: Vec<EventRecord>,
    ) -> Result<&mut SegmentBuilder, CoreError> {
        match &mut self.state {
            State::Building(builder) => builder.add_segment(name, records),
            State::Frozen(_) => Err(CoreError::phase(
                "add_segment",
                Phase::Building,
                Phase::Frozen,
            )),
        }
    }

    /// Freeze the timeline.
    ///
    /// Fails when called twice or with no segments registered.
    #[instrument(level = "info", skip(self))]
    pub fn build(&mut self) -> Result<(), CoreError> {
        match &mut self.state {
            State::Frozen(_) => Err(CoreError::phase("build", Phase::Building, Phase::Frozen)),
            State::Building(builder) => {
                if builder.is_empty() {
                    return Err(CoreError::NoSegments);
                }
                let timeline = std::mem::take(builder).build()?;
                self.state = State::Frozen(FrozenState {
                    timeline,
                    registry: ContextRegistry::new(),
                });
                Ok(())
            }
        }
    }

    /// Register a sync context and run its alignment against every segment.
    ///
    /// Hard failures: duplicate name, malformed ephys arrays, pre-freeze
    /// call. Alignment problems per (segment, context) pair become warnings.
    #[instrument(level = "info", skip_all, fields(context = %name.as_ref(), anchors = ephys_times.len()))]
    pub fn add_sync_context(
        &mut self,
        name: impl AsRef<str>,
        ephys_times: Vec<f64>,
        ephys_indices: Vec<i64>,
        sampling_rate: f64,
    ) -> Result<(), CoreError> {
        match &mut self.state {
            State::Building(_) => Err(CoreError::phase(
                "add_sync_context",
                Phase::Frozen,
                Phase::Building,
            )),
            State::Frozen(frozen) => {
                let context = SyncContext::new(name, ephys_times, ephys_indices, sampling_rate)?;
                frozen.registry.register(
                    context,
                    &frozen.timeline,
                    &self.config.dtw,
                    self.cost_fn.as_ref(),
                )
            }
        }
    }

    /// Supply the reference instant for the advisory AbsoluteDateTime
    /// column. May be set in either phase; only the last anchor is kept.
    pub fn set_wallclock_anchor(&mut self, anchor: WallClockAnchor) {
        self.wallclock = Some(anchor);
    }

    /// The frozen timeline; fails before `build()`.
    pub fn timeline(&self) -> Result<&Timeline, CoreError> {
        match &self.state {
            State::Building(_) => Err(CoreError::phase(
                "timeline",
                Phase::Frozen,
                Phase::Building,
            )),
            State::Frozen(frozen) => Ok(&frozen.timeline),
        }
    }

    /// Warnings collected so far, across all registered contexts.
    pub fn warnings(&self) -> Vec<&AlignmentWarning> {
        match &self.state {
            State::Building(_) => Vec::new(),
            State::Frozen(frozen) => frozen
                .registry
                .entries()
                .iter()
                .flat_map(|e| e.warnings.iter())
                .collect(),
        }
    }

    /// Per-context run summaries, in registration order.
    pub fn context_reports(&self) -> Vec<&ContextReport> {
        match &self.state {
            State::Building(_) => Vec::new(),
            State::Frozen(frozen) => frozen
                .registry
                .entries()
                .iter()
                .map(|e| &e.report)
                .collect(),
        }
    }

    /// Assemble the final table; fails before `build()`.
    pub fn get_final_dataframe(&self) -> Result<AlignedTable, CoreError> {
        match &self.state {
            State::Building(_) => Err(CoreError::phase(
                "get_final_dataframe",
                Phase::Frozen,
                Phase::Building,
            )),
            State::Frozen(frozen) => Ok(assembler::assemble(
                &frozen.timeline,
                frozen.registry.entries(),
                self.wallclock.as_ref(),
            )),
        }
    }
}
