use std::time::Duration;

use credit_desk::workflows::desk::{staged_blueprint, uniform_blueprint, CAM_STAGES};
use credit_desk::workflows::progress::{
    DuplicateRunPolicy, ProgressBlueprint, ProgressSnapshot, Stage, StagePlan, StagePlanError,
    StageProgressEngine, TickOutcome,
};

fn run_to_end(engine: &mut StageProgressEngine, blueprint: &ProgressBlueprint) -> Vec<ProgressSnapshot> {
    let start = engine.start(blueprint).expect("run starts");
    let mut snapshots = vec![start.initial];
    for _ in 0..1_000 {
        match engine.tick(start.handle) {
            TickOutcome::Advanced(snapshot) => snapshots.push(snapshot),
            TickOutcome::Completed(snapshot) => {
                snapshots.push(snapshot);
                return snapshots;
            }
            TickOutcome::Held => {}
            TickOutcome::Stale => panic!("live run reported stale"),
        }
    }
    panic!("run never completed");
}

#[test]
fn cam_generation_reports_each_stage_in_order() {
    let blueprint = staged_blueprint(&CAM_STAGES, Duration::from_millis(50), Duration::from_millis(200))
        .expect("valid CAM blueprint");
    let mut engine = StageProgressEngine::new("memo", DuplicateRunPolicy::Reject);

    let snapshots = run_to_end(&mut engine, &blueprint);

    let mut names: Vec<&str> = snapshots.iter().map(|s| s.stage_name.as_str()).collect();
    names.dedup();
    assert_eq!(
        names,
        vec![
            "Reading Documents",
            "Building Basic CAM",
            "Financial Plotting",
            "Generating CAM Report",
        ]
    );
    assert!(snapshots.windows(2).all(|pair| pair[0].value <= pair[1].value));

    let last = snapshots.last().expect("final snapshot");
    assert_eq!(last.value, 100.0);
    assert_eq!(last.stage_index, 3);
    assert!(last.is_complete());
    assert!(!last.active);
    assert!(!engine.is_active());
}

#[test]
fn uniform_profile_treats_thresholds_as_inclusive() {
    let blueprint = uniform_blueprint(&CAM_STAGES, Duration::from_millis(100), 1.0)
        .expect("valid uniform blueprint");
    let mut engine = StageProgressEngine::new("memo", DuplicateRunPolicy::Reject);

    let snapshots = run_to_end(&mut engine, &blueprint);
    assert_eq!(snapshots.len(), 101);

    let at = |value: f64| {
        snapshots
            .iter()
            .find(|snapshot| snapshot.value == value)
            .map(|snapshot| snapshot.stage_index)
    };
    assert_eq!(at(44.0), Some(0));
    assert_eq!(at(45.0), Some(1));
    assert_eq!(at(58.0), Some(1));
    assert_eq!(at(87.0), Some(2));
    assert_eq!(at(88.0), Some(3));
}

#[test]
fn cancelled_runs_ignore_later_ticks() {
    let blueprint = staged_blueprint(&CAM_STAGES, Duration::from_millis(50), Duration::ZERO)
        .expect("valid CAM blueprint");
    let mut engine = StageProgressEngine::new("memo", DuplicateRunPolicy::Reject);
    let start = engine.start(&blueprint).expect("run starts");
    for _ in 0..10 {
        engine.tick(start.handle);
    }

    let last = engine.cancel(start.handle).expect("live run cancelled");
    assert!(last.value > 0.0 && last.value < 100.0);
    assert!(!last.active);
    assert_eq!(engine.tick(start.handle), TickOutcome::Stale);
    assert!(engine.snapshot().is_none());
}

#[test]
fn malformed_stage_plans_are_rejected() {
    assert_eq!(StagePlan::new(Vec::new()), Err(StagePlanError::Empty));
    assert!(matches!(
        StagePlan::new(vec![Stage::new("Reading", 50), Stage::new("Scoring", 90)]),
        Err(StagePlanError::FinalThreshold(90))
    ));
    assert!(matches!(
        StagePlan::new(vec![
            Stage::new("Reading", 60),
            Stage::new("Scoring", 60),
            Stage::new("Writing", 100),
        ]),
        Err(StagePlanError::NotIncreasing { .. })
    ));
    assert_eq!(
        staged_blueprint(&CAM_STAGES, Duration::ZERO, Duration::ZERO),
        Err(StagePlanError::ZeroTickInterval)
    );
}
