//! Time-driven progress runs over an ordered list of named stages.
//!
//! The engine itself is clock-free: it advances only when handed a tick for its live
//! [`RunHandle`]. Wall-clock cadence comes from a [`Ticker`], which owners schedule when a
//! run starts and cancel when it completes or its screen is left.

pub mod clock;
mod engine;
mod plan;
mod run;

pub use clock::{ManualTicker, TickGuard, Ticker, TokioTicker};
pub use engine::{DuplicateRunPolicy, ProgressError, RunStart, StageProgressEngine};
pub use plan::{ProgressBlueprint, ProgressProfile, Stage, StagePlan, StagePlanError, COMPLETE};
pub use run::{ProgressRun, ProgressSnapshot, RunHandle, TickOutcome};
