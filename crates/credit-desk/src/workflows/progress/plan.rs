use serde::Serialize;
use std::time::Duration;

/// Terminal progress value for every run.
pub const COMPLETE: f64 = 100.0;

/// A named phase of a long-running task, ending at `end_threshold` percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub name: String,
    pub end_threshold: u8,
}

impl Stage {
    pub fn new(name: impl Into<String>, end_threshold: u8) -> Self {
        Self {
            name: name.into(),
            end_threshold,
        }
    }
}

/// Validated, immutable stage sequence: non-empty, strictly increasing, ending at 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePlan {
    stages: Vec<Stage>,
}

impl StagePlan {
    pub fn new(stages: Vec<Stage>) -> Result<Self, StagePlanError> {
        let Some(last) = stages.last() else {
            return Err(StagePlanError::Empty);
        };
        if last.end_threshold != 100 {
            return Err(StagePlanError::FinalThreshold(last.end_threshold));
        }

        let mut previous = 0u8;
        for (index, stage) in stages.iter().enumerate() {
            if stage.name.trim().is_empty() {
                return Err(StagePlanError::UnnamedStage { index });
            }
            if stage.end_threshold > 100 {
                return Err(StagePlanError::ThresholdOutOfRange {
                    index,
                    threshold: stage.end_threshold,
                });
            }
            if stage.end_threshold <= previous {
                return Err(StagePlanError::NotIncreasing {
                    index,
                    threshold: stage.end_threshold,
                    previous,
                });
            }
            previous = stage.end_threshold;
        }

        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage(&self, index: usize) -> &Stage {
        &self.stages[index.min(self.stages.len() - 1)]
    }

    /// Index of the first stage whose end threshold is at or above `value`.
    pub fn stage_index_for(&self, value: f64) -> usize {
        self.stages
            .iter()
            .position(|stage| f64::from(stage.end_threshold) >= value)
            .unwrap_or(self.stages.len() - 1)
    }

    /// Progress value at which stage `index` begins.
    pub fn start_of(&self, index: usize) -> f64 {
        match index {
            0 => 0.0,
            _ => self.end_of(index - 1),
        }
    }

    pub fn end_of(&self, index: usize) -> f64 {
        f64::from(self.stage(index).end_threshold)
    }
}

/// How a run spends its ticks between 0 and 100.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressProfile {
    /// Each stage has its own wall-clock duration; the per-tick increment is computed per
    /// stage and the value holds at each boundary for `pause_ticks` silent ticks.
    Staged {
        increments: Vec<f64>,
        pause_ticks: u32,
    },
    /// A fixed step per tick across the whole range; stages only relabel.
    Uniform { step: f64 },
}

impl ProgressProfile {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Staged { .. } => "staged",
            Self::Uniform { .. } => "uniform",
        }
    }
}

/// Everything an engine needs to start a run: stages, timing profile and tick cadence.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBlueprint {
    plan: StagePlan,
    profile: ProgressProfile,
    tick_interval: Duration,
}

impl ProgressBlueprint {
    /// Non-uniform profile. `stages` carries `(name, end_threshold, duration)`.
    pub fn staged<N>(
        stages: Vec<(N, u8, Duration)>,
        tick_interval: Duration,
        pause: Duration,
    ) -> Result<Self, StagePlanError>
    where
        N: Into<String>,
    {
        let tick_ms = positive_millis(tick_interval)?;
        let durations: Vec<Duration> = stages.iter().map(|(_, _, duration)| *duration).collect();
        let plan = StagePlan::new(
            stages
                .into_iter()
                .map(|(name, end, _)| Stage::new(name, end))
                .collect(),
        )?;

        let increments = durations
            .iter()
            .enumerate()
            .map(|(index, duration)| {
                let width = plan.end_of(index) - plan.start_of(index);
                let ticks = (duration.as_millis() as f64 / tick_ms).max(1.0);
                width / ticks
            })
            .collect();
        let pause_ticks = (pause.as_millis() as f64 / tick_ms).ceil() as u32;

        Ok(Self {
            plan,
            profile: ProgressProfile::Staged {
                increments,
                pause_ticks,
            },
            tick_interval,
        })
    }

    /// Uniform profile: `step` units every `tick_interval`.
    pub fn uniform(
        plan: StagePlan,
        tick_interval: Duration,
        step: f64,
    ) -> Result<Self, StagePlanError> {
        positive_millis(tick_interval)?;
        if !step.is_finite() || step <= 0.0 {
            return Err(StagePlanError::InvalidStep(step));
        }

        Ok(Self {
            plan,
            profile: ProgressProfile::Uniform { step },
            tick_interval,
        })
    }

    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    pub fn profile(&self) -> &ProgressProfile {
        &self.profile
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

fn positive_millis(tick_interval: Duration) -> Result<f64, StagePlanError> {
    let millis = tick_interval.as_millis();
    if millis == 0 {
        return Err(StagePlanError::ZeroTickInterval);
    }
    Ok(millis as f64)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StagePlanError {
    #[error("a run needs at least one stage")]
    Empty,
    #[error("stage {index} has no name")]
    UnnamedStage { index: usize },
    #[error("stage {index} threshold {threshold} is outside 0..=100")]
    ThresholdOutOfRange { index: usize, threshold: u8 },
    #[error("stage {index} threshold {threshold} does not exceed the previous threshold {previous}")]
    NotIncreasing {
        index: usize,
        threshold: u8,
        previous: u8,
    },
    #[error("the final stage must end at 100, found {0}")]
    FinalThreshold(u8),
    #[error("tick interval must be at least one millisecond")]
    ZeroTickInterval,
    #[error("uniform step must be a positive number, found {0}")]
    InvalidStep(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam_plan() -> StagePlan {
        StagePlan::new(vec![
            Stage::new("Reading Documents", 44),
            Stage::new("Building Basic CAM", 58),
            Stage::new("Financial Plotting", 87),
            Stage::new("Generating CAM Report", 100),
        ])
        .expect("valid plan")
    }

    #[test]
    fn rejects_malformed_stage_lists() {
        assert_eq!(StagePlan::new(vec![]), Err(StagePlanError::Empty));
        assert_eq!(
            StagePlan::new(vec![Stage::new("Only", 90)]),
            Err(StagePlanError::FinalThreshold(90))
        );
        assert!(matches!(
            StagePlan::new(vec![Stage::new("A", 50), Stage::new("B", 50), Stage::new("C", 100)]),
            Err(StagePlanError::NotIncreasing { index: 1, .. })
        ));
        assert!(matches!(
            StagePlan::new(vec![Stage::new("A", 0), Stage::new("B", 100)]),
            Err(StagePlanError::NotIncreasing { index: 0, .. })
        ));
        assert!(matches!(
            StagePlan::new(vec![Stage::new("  ", 100)]),
            Err(StagePlanError::UnnamedStage { index: 0 })
        ));
    }

    #[test]
    fn stage_index_uses_first_threshold_at_or_above_value() {
        let plan = cam_plan();
        assert_eq!(plan.stage_index_for(0.0), 0);
        assert_eq!(plan.stage_index_for(44.0), 0);
        assert_eq!(plan.stage_index_for(44.1), 1);
        assert_eq!(plan.stage_index_for(87.0), 2);
        assert_eq!(plan.stage_index_for(100.0), 3);
        assert_eq!(plan.start_of(2), 58.0);
        assert_eq!(plan.end_of(2), 87.0);
    }

    #[test]
    fn staged_increments_follow_stage_width_over_duration() {
        let blueprint = ProgressBlueprint::staged(
            vec![
                ("Reading Documents", 44, Duration::from_millis(2000)),
                ("Building Basic CAM", 58, Duration::from_millis(1500)),
                ("Financial Plotting", 87, Duration::from_millis(2500)),
                ("Generating CAM Report", 100, Duration::from_millis(1000)),
            ],
            Duration::from_millis(50),
            Duration::from_millis(200),
        )
        .expect("valid blueprint");

        match blueprint.profile() {
            ProgressProfile::Staged {
                increments,
                pause_ticks,
            } => {
                assert!((increments[0] - 1.1).abs() < 1e-9);
                assert!((increments[1] - 14.0 / 30.0).abs() < 1e-9);
                assert!((increments[2] - 29.0 / 50.0).abs() < 1e-9);
                assert!((increments[3] - 13.0 / 20.0).abs() < 1e-9);
                assert_eq!(*pause_ticks, 4);
            }
            other => panic!("expected staged profile, got {other:?}"),
        }
    }

    #[test]
    fn uniform_requires_positive_step_and_tick() {
        assert_eq!(
            ProgressBlueprint::uniform(cam_plan(), Duration::from_millis(100), 0.0),
            Err(StagePlanError::InvalidStep(0.0))
        );
        assert_eq!(
            ProgressBlueprint::uniform(cam_plan(), Duration::ZERO, 1.0),
            Err(StagePlanError::ZeroTickInterval)
        );
    }
}
