use std::time::Duration;

use crate::config::{EngineConfig, MemoProfile};
use crate::workflows::progress::{
    DuplicateRunPolicy, ProgressBlueprint, Stage, StagePlan, StagePlanError,
};

/// CAM generation phases: `(name, end threshold, duration in ms)`.
pub const CAM_STAGES: [(&str, u8, u64); 4] = [
    ("Reading Documents", 44, 2000),
    ("Building Basic CAM", 58, 1500),
    ("Financial Plotting", 87, 2500),
    ("Generating CAM Report", 100, 1000),
];

pub const UPLOAD_STAGES: [(&str, u8, u64); 3] = [
    ("Uploading Files", 40, 1200),
    ("Checking File Integrity", 75, 900),
    ("Indexing Documents", 100, 600),
];

/// Run blueprints and duplicate-run policy for one desk.
#[derive(Debug, Clone, PartialEq)]
pub struct DeskSettings {
    pub upload: ProgressBlueprint,
    pub memo: ProgressBlueprint,
    pub duplicate_runs: DuplicateRunPolicy,
}

impl DeskSettings {
    pub fn from_config(config: &EngineConfig) -> Result<Self, StagePlanError> {
        let pause = Duration::from_millis(config.stage_pause_ms);
        let upload = staged_blueprint(
            &UPLOAD_STAGES,
            Duration::from_millis(config.upload_tick_ms),
            pause,
        )?;
        let memo_tick = Duration::from_millis(config.memo_tick_ms);
        let memo = match config.memo_profile {
            MemoProfile::Staged => staged_blueprint(&CAM_STAGES, memo_tick, pause)?,
            MemoProfile::Uniform => uniform_blueprint(&CAM_STAGES, memo_tick, config.memo_step)?,
        };

        Ok(Self {
            upload,
            memo,
            duplicate_runs: config.duplicate_runs,
        })
    }

    pub fn with_duplicate_runs(mut self, policy: DuplicateRunPolicy) -> Self {
        self.duplicate_runs = policy;
        self
    }
}

pub fn staged_blueprint(
    stages: &[(&str, u8, u64)],
    tick_interval: Duration,
    pause: Duration,
) -> Result<ProgressBlueprint, StagePlanError> {
    ProgressBlueprint::staged(
        stages
            .iter()
            .map(|(name, end, millis)| (*name, *end, Duration::from_millis(*millis)))
            .collect(),
        tick_interval,
        pause,
    )
}

pub fn uniform_blueprint(
    stages: &[(&str, u8, u64)],
    tick_interval: Duration,
    step: f64,
) -> Result<ProgressBlueprint, StagePlanError> {
    let plan = StagePlan::new(
        stages
            .iter()
            .map(|(name, end, _)| Stage::new(*name, *end))
            .collect(),
    )?;
    ProgressBlueprint::uniform(plan, tick_interval, step)
}
