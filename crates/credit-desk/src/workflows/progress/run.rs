use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::plan::{ProgressBlueprint, ProgressProfile, COMPLETE};

/// Identity of one progress run. Ticks carry it so stale deliveries can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RunHandle(u64);

impl RunHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{:06}", self.0)
    }
}

static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_run_handle() -> RunHandle {
    RunHandle(RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Point-in-time view of a run, emitted on every advancing tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub run: RunHandle,
    pub stage_index: usize,
    pub stage_name: String,
    pub stage_count: usize,
    pub value: f64,
    pub active: bool,
}

impl ProgressSnapshot {
    /// Rounded percentage for display.
    pub fn percent(&self) -> u8 {
        self.value.round().clamp(0.0, COMPLETE) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.value >= COMPLETE
    }
}

/// What a single tick did to a run.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The tick did not belong to the live run and was ignored.
    Stale,
    /// The run is pausing at a stage boundary; nothing to emit.
    Held,
    Advanced(ProgressSnapshot),
    /// Terminal tick. The snapshot carries exactly 100.
    Completed(ProgressSnapshot),
}

#[derive(Debug, Clone)]
pub struct ProgressRun {
    handle: RunHandle,
    blueprint: ProgressBlueprint,
    value: f64,
    stage_index: usize,
    hold_ticks: u32,
    active: bool,
}

impl ProgressRun {
    pub(crate) fn new(handle: RunHandle, blueprint: ProgressBlueprint) -> Self {
        Self {
            handle,
            blueprint,
            value: 0.0,
            stage_index: 0,
            hold_ticks: 0,
            active: true,
        }
    }

    pub fn handle(&self) -> RunHandle {
        self.handle
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn stage_index(&self) -> usize {
        self.stage_index
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn blueprint(&self) -> &ProgressBlueprint {
        &self.blueprint
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let plan = self.blueprint.plan();
        ProgressSnapshot {
            run: self.handle,
            stage_index: self.stage_index,
            stage_name: plan.stage(self.stage_index).name.clone(),
            stage_count: plan.len(),
            value: self.value,
            active: self.active,
        }
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    pub(crate) fn advance(&mut self) -> TickOutcome {
        if !self.active {
            return TickOutcome::Stale;
        }
        if self.hold_ticks > 0 {
            self.hold_ticks -= 1;
            return TickOutcome::Held;
        }

        let plan = self.blueprint.plan();
        let next = match self.blueprint.profile() {
            ProgressProfile::Staged {
                increments,
                pause_ticks,
            } => {
                // The stage currently being filled is the first one not yet reached.
                let running = plan
                    .stages()
                    .iter()
                    .position(|stage| f64::from(stage.end_threshold) > self.value)
                    .unwrap_or(plan.len() - 1);
                let end = plan.end_of(running);
                let next = (self.value + increments[running]).min(end);
                if next >= end && running + 1 < plan.len() {
                    self.hold_ticks = *pause_ticks;
                }
                next
            }
            ProgressProfile::Uniform { step } => {
                // One tick may cross into the next stage but never past its end.
                let cap = plan.end_of((self.stage_index + 1).min(plan.len() - 1));
                (self.value + step).min(cap)
            }
        };

        let next = if COMPLETE - next < 1e-9 {
            COMPLETE
        } else {
            next
        };
        self.value = self.value.max(next);
        self.stage_index = self.stage_index.max(plan.stage_index_for(self.value));

        if self.value >= COMPLETE {
            self.active = false;
            TickOutcome::Completed(self.snapshot())
        } else {
            TickOutcome::Advanced(self.snapshot())
        }
    }
}
