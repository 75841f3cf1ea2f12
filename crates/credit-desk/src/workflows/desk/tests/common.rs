use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::workflows::desk::{
    staged_blueprint, ApplicationCatalog, DeskEvent, DeskSettings, FileDescriptor, TaskKind,
    WorkflowController, CAM_STAGES, UPLOAD_STAGES,
};
use crate::workflows::progress::{DuplicateRunPolicy, ManualTicker};

pub(super) type Desk = WorkflowController<ManualTicker>;

pub(super) fn settings() -> DeskSettings {
    DeskSettings {
        upload: staged_blueprint(&UPLOAD_STAGES, Duration::from_millis(100), Duration::ZERO)
            .expect("valid upload blueprint"),
        memo: staged_blueprint(&CAM_STAGES, Duration::from_millis(100), Duration::from_millis(200))
            .expect("valid memo blueprint"),
        duplicate_runs: DuplicateRunPolicy::Reject,
    }
}

pub(super) fn desk() -> (Desk, ManualTicker) {
    desk_with(settings())
}

pub(super) fn desk_with(settings: DeskSettings) -> (Desk, ManualTicker) {
    let ticker = ManualTicker::new();
    let controller = WorkflowController::new(ApplicationCatalog::standard(), settings, ticker.clone());
    (controller, ticker)
}

pub(super) fn record_events(desk: &mut Desk) -> Arc<Mutex<Vec<DeskEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    desk.subscribe(move |event: &DeskEvent| {
        sink.lock().expect("event log poisoned").push(event.clone());
    });
    events
}

pub(super) fn drain(events: &Arc<Mutex<Vec<DeskEvent>>>) -> Vec<DeskEvent> {
    std::mem::take(&mut *events.lock().expect("event log poisoned"))
}

pub(super) fn statement_files() -> Vec<FileDescriptor> {
    vec![
        FileDescriptor::new("bank-statement-apr.pdf", 48_213),
        FileDescriptor::new("gst-returns.xlsx", 12_904),
    ]
}

/// Tick the live run of `task` until it finishes, returning how many ticks it took.
pub(super) fn run_to_completion(desk: &mut Desk, task: TaskKind) -> usize {
    let mut ticks = 0;
    while let Some(run) = desk.active_run(task) {
        assert!(desk.on_tick(run), "live tick must be applied");
        ticks += 1;
        assert!(ticks < 1_000, "{task} never completed");
    }
    ticks
}

/// Open an unverified application, verify its documents and land on the approval screen.
pub(super) fn at_document_approval(desk: &mut Desk) {
    desk.open_application("APP001").expect("application opens");
    for name in ["Aadhar", "PAN", "Application Form", "Bank Statements"] {
        desk.check_document(name, true).expect("document checks");
    }
    desk.continue_to_approval().expect("all documents verified");
}

pub(super) fn at_memo_decision(desk: &mut Desk) {
    at_document_approval(desk);
    desk.send_to_credit_manager().expect("queued for credit manager");
    desk.start_memo_generation().expect("memo run starts");
    run_to_completion(desk, TaskKind::MemoGeneration);
}
