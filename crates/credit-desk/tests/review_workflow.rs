use credit_desk::workflows::desk::{
    Action, ApplicationCatalog, DecisionAction, DeskSettings, Outcome, Screen, TaskKind,
    WorkflowController,
};
use credit_desk::config::EngineConfig;
use credit_desk::workflows::progress::ManualTicker;
use serde_json::Value;

fn controller() -> WorkflowController<ManualTicker> {
    let settings = DeskSettings::from_config(&EngineConfig::default()).expect("valid settings");
    WorkflowController::new(ApplicationCatalog::standard(), settings, ManualTicker::new())
}

#[test]
fn verified_application_reaches_an_approval() {
    let mut desk = controller();

    desk.open_application("APP003").expect("application opens");
    desk.send_to_credit_manager().expect("queued for credit manager");
    desk.start_memo_generation().expect("memo run starts");
    while let Some(run) = desk.active_run(TaskKind::MemoGeneration) {
        desk.on_tick(run);
    }
    assert_eq!(desk.state().screen, Screen::MemoDecision);

    desk.acknowledge_security().expect("acknowledged");
    let view = desk.decide(DecisionAction::Approve).expect("approved");

    assert_eq!(view.state.screen, Screen::DecisionSummary);
    assert_eq!(
        view.outcome.as_ref().map(|record| &record.outcome),
        Some(&Outcome::Decision(DecisionAction::Approve))
    );
    assert_eq!(
        view.actions.enabled(),
        vec![Action::GoBack, Action::ReturnToDashboard]
    );

    let json: Value = serde_json::to_value(&view).expect("view serializes");
    assert_eq!(json["state"]["screen"], "decision_summary");
    assert_eq!(json["outcome"]["outcome"]["kind"], "decision");
    assert_eq!(json["outcome"]["outcome"]["value"], "approve");
    assert_eq!(json["memo"]["value"], 100.0);
}

#[test]
fn dashboard_catalog_supports_search_and_bands() {
    let catalog = ApplicationCatalog::standard();

    let matches: Vec<&str> = catalog
        .search("industries")
        .into_iter()
        .map(|application| application.id)
        .collect();
    assert_eq!(matches, vec!["APP001"]);

    let bands: Vec<&str> = catalog
        .applications()
        .iter()
        .map(|application| application.band().label())
        .collect();
    assert_eq!(bands, vec!["High", "Medium", "Low", "Medium", "Low"]);
}
