//! # Align Engine
//!
//! Offline alignment of behavioral event streams onto electrophysiology
//! sample streams.
//!
//! Responsibilities:
//! - Per-trial dynamic time warping between anchor sequences
//! - Deterministic resolution of degenerate (many-to-one) warp steps
//! - Interpolation/extrapolation of the matched correspondence onto every
//!   event
//! - Independent sync contexts over one frozen timeline
//! - Assembly of the final output table
//!
//! ## Usage example
//!
//! ```ignore
//! use align_engine::Aligner;
//! use contracts::EventRecord;
//!
//! let mut aligner = Aligner::default();
//! aligner
//!     .add_segment("task", records)?
//!     .with_anchors(|e| e.code == Some(19));
//! aligner.build()?;
//! aligner.add_sync_context("probe0", ephys_times, ephys_indices, 30_000.0)?;
//! let table = aligner.get_final_dataframe()?;
//! ```

mod assembler;
mod chunk;
mod context;
mod dtw;
mod engine;
mod mapper;
mod registry;

pub use context::SyncContext;
pub use dtw::{AbsoluteDiff, LocalCost};
pub use engine::Aligner;
pub use timeline::{SegmentBuilder, Timeline};

// Re-export contracts types used at the API surface
pub use contracts::{
    AlignedTable, AlignmentWarning, ContextColumns, ContextReport, CoreError, EngineConfig, Event,
    EventRecord, Label, Phase, WallClockAnchor, WarningKind,
};
