use super::common::*;

use crate::workflows::desk::{
    Action, Blocker, DeskEvent, FileDescriptor, InputError, Screen, TaskKind, WorkflowError,
};

#[test]
fn approval_stays_blocked_until_every_document_is_checked() {
    let (mut desk, _ticker) = desk();
    desk.open_application("APP001").expect("application opens");

    for name in ["Aadhar", "PAN", "Application Form"] {
        let view = desk.check_document(name, true).expect("document checks");
        assert!(!view.actions.is_enabled(Action::ContinueToApproval));
    }
    assert_eq!(
        desk.continue_to_approval().expect_err("one document left"),
        WorkflowError::PreconditionNotMet {
            action: Action::ContinueToApproval,
            blocker: Blocker::DocumentsUnverified { remaining: 1 },
        }
    );

    let view = desk.check_document("Bank Statements", true).expect("document checks");
    assert!(view.documents.all_checked);
    assert!(view.actions.is_enabled(Action::ContinueToApproval));

    let view = desk.check_document("PAN", false).expect("document unchecks");
    assert_eq!(view.documents.remaining(), 1);
    assert!(!view.actions.is_enabled(Action::ContinueToApproval));
}

#[test]
fn unknown_document_is_invalid_input() {
    let (mut desk, _ticker) = desk();
    desk.open_application("APP002").expect("application opens");

    assert_eq!(
        desk.check_document("Passport", true).expect_err("not on the checklist"),
        WorkflowError::InvalidInput(InputError::UnknownItem("Passport".into()))
    );
}

#[test]
fn upload_rejects_unusable_file_sets_before_starting() {
    let (mut desk, ticker) = desk();
    desk.open_application("APP001").expect("application opens");

    assert_eq!(
        desk.start_upload(Vec::new()).expect_err("empty set"),
        WorkflowError::InvalidInput(InputError::EmptyFileSet)
    );
    assert_eq!(
        desk.start_upload(vec![FileDescriptor::new("photo.png", 10)])
            .expect_err("unsupported type"),
        WorkflowError::InvalidInput(InputError::UnsupportedFile("photo.png".into()))
    );
    assert_eq!(desk.state().screen, Screen::DocumentVerification);
    assert!(ticker.scheduled().is_empty());
}

#[test]
fn upload_run_reports_progress_then_returns_to_verification() {
    let (mut desk, ticker) = desk();
    desk.open_application("APP001").expect("application opens");
    let events = record_events(&mut desk);

    let view = desk.start_upload(statement_files()).expect("upload starts");
    assert_eq!(view.state.screen, Screen::Upload);
    let run = desk.active_run(TaskKind::DocumentUpload).expect("live upload run");
    assert!(ticker.is_live(run));

    let ticks = run_to_completion(&mut desk, TaskKind::DocumentUpload);
    assert!(ticks >= 27, "upload finished after only {ticks} ticks");
    assert!(!ticker.is_live(run));

    let events = drain(&events);
    let values: Vec<f64> = events
        .iter()
        .filter_map(|event| match event {
            DeskEvent::Progress { snapshot, .. } => Some(snapshot.value),
            _ => None,
        })
        .collect();
    assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(values.last().copied(), Some(100.0));

    let completed = events
        .iter()
        .position(|event| matches!(event, DeskEvent::RunCompleted { run: done, .. } if *done == run))
        .expect("completion published");
    let last_progress = events
        .iter()
        .rposition(|event| matches!(event, DeskEvent::Progress { .. }))
        .expect("progress published");
    assert!(last_progress < completed);
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, DeskEvent::RunCompleted { .. }))
            .count(),
        1
    );

    let view = desk.view();
    assert_eq!(view.state.screen, Screen::DocumentVerification);
    assert_eq!(view.uploaded_files, 2);
    assert_eq!(view.upload.map(|snapshot| snapshot.percent()), Some(100));
}

#[test]
fn leaving_the_upload_screen_silences_its_run() {
    let (mut desk, ticker) = desk();
    desk.open_application("APP001").expect("application opens");
    desk.start_upload(statement_files()).expect("upload starts");
    let run = desk.active_run(TaskKind::DocumentUpload).expect("live upload run");
    for _ in 0..5 {
        assert!(desk.on_tick(run));
    }
    let events = record_events(&mut desk);

    desk.go_back().expect("back to verification");
    assert!(!ticker.is_live(run));
    assert!(desk.active_run(TaskKind::DocumentUpload).is_none());
    assert!(matches!(
        drain(&events).first(),
        Some(DeskEvent::RunCancelled {
            task: TaskKind::DocumentUpload,
            ..
        })
    ));

    // Ticks already queued for the cancelled run change nothing.
    assert!(!desk.on_tick(run));
    assert!(drain(&events).is_empty());
    assert_eq!(desk.view().uploaded_files, 0);
}
