use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::plan::ProgressBlueprint;
use super::run::{next_run_handle, ProgressRun, ProgressSnapshot, RunHandle, TickOutcome};

/// What `start` does when the engine already drives a live run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateRunPolicy {
    /// Refuse the new run with [`ProgressError::DuplicateRun`].
    #[default]
    Reject,
    /// Cancel the live run, then start the new one.
    Supersede,
}

impl DuplicateRunPolicy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Supersede => "supersede",
        }
    }
}

/// Result of a successful `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStart {
    pub handle: RunHandle,
    pub initial: ProgressSnapshot,
    /// Final snapshot of the run this start replaced, under [`DuplicateRunPolicy::Supersede`].
    pub superseded: Option<ProgressSnapshot>,
}

/// Drives at most one [`ProgressRun`] at a time.
#[derive(Debug)]
pub struct StageProgressEngine {
    name: &'static str,
    policy: DuplicateRunPolicy,
    run: Option<ProgressRun>,
}

impl StageProgressEngine {
    pub fn new(name: &'static str, policy: DuplicateRunPolicy) -> Self {
        Self {
            name,
            policy,
            run: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> DuplicateRunPolicy {
        self.policy
    }

    pub fn start(&mut self, blueprint: &ProgressBlueprint) -> Result<RunStart, ProgressError> {
        let superseded = match self.active_handle() {
            Some(active) if self.policy == DuplicateRunPolicy::Reject => {
                debug!(engine = self.name, %active, "rejecting duplicate run");
                return Err(ProgressError::DuplicateRun { active });
            }
            Some(active) => self.cancel(active),
            None => None,
        };

        let run = ProgressRun::new(next_run_handle(), blueprint.clone());
        let handle = run.handle();
        let initial = run.snapshot();
        info!(
            engine = self.name,
            %handle,
            profile = blueprint.profile().label(),
            stages = blueprint.plan().len(),
            tick_ms = blueprint.tick_interval().as_millis() as u64,
            "progress run started"
        );
        self.run = Some(run);

        Ok(RunStart {
            handle,
            initial,
            superseded,
        })
    }

    /// Apply one tick. Ticks for anything but the live run are reported as stale.
    pub fn tick(&mut self, handle: RunHandle) -> TickOutcome {
        let Some(run) = self.run.as_mut().filter(|run| run.handle() == handle) else {
            debug!(engine = self.name, %handle, "ignoring stale tick");
            return TickOutcome::Stale;
        };

        let outcome = run.advance();
        if let TickOutcome::Completed(_) = &outcome {
            info!(engine = self.name, %handle, "progress run complete");
            self.run = None;
        }
        outcome
    }

    /// Discard the live run if `handle` names it, returning its last snapshot.
    pub fn cancel(&mut self, handle: RunHandle) -> Option<ProgressSnapshot> {
        if self.active_handle() != Some(handle) {
            return None;
        }
        let mut run = self.run.take()?;
        run.deactivate();
        info!(engine = self.name, %handle, value = run.value(), "progress run cancelled");
        Some(run.snapshot())
    }

    pub fn cancel_active(&mut self) -> Option<ProgressSnapshot> {
        let handle = self.active_handle()?;
        self.cancel(handle)
    }

    pub fn active_handle(&self) -> Option<RunHandle> {
        self.run
            .as_ref()
            .filter(|run| run.is_active())
            .map(ProgressRun::handle)
    }

    pub fn is_active(&self) -> bool {
        self.active_handle().is_some()
    }

    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.run.as_ref().map(ProgressRun::snapshot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    #[error("{active} is still running")]
    DuplicateRun { active: RunHandle },
}
