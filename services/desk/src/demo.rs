use crate::infra::{
    demo_files, parse_decision, parse_duplicate_runs, parse_memo_profile, parse_route,
    ReviewRoute,
};
use chrono::Local;
use clap::Args;
use credit_desk::config::{AppConfig, MemoProfile};
use credit_desk::error::AppError;
use credit_desk::telemetry;
use credit_desk::workflows::desk::{
    ApplicationCatalog, DecisionAction, DeskEvent, DeskHandle, DeskSession, DeskSettings,
    DeskView, Intent, Screen, SessionError, TaskKind,
};
use credit_desk::workflows::progress::DuplicateRunPolicy;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Application to review (defaults to APP001)
    #[arg(long)]
    pub(crate) application: Option<String>,
    /// Who reviews after document approval: credit-manager or cpa
    #[arg(long, value_parser = parse_route)]
    pub(crate) route: Option<ReviewRoute>,
    /// Credit manager decision: approve, send-back or reject
    #[arg(long, value_parser = parse_decision)]
    pub(crate) decision: Option<DecisionAction>,
    /// Override DESK_MEMO_PROFILE (staged or uniform)
    #[arg(long, value_parser = parse_memo_profile)]
    pub(crate) memo_profile: Option<MemoProfile>,
    /// Override DESK_DUPLICATE_RUNS (reject or supersede)
    #[arg(long, value_parser = parse_duplicate_runs)]
    pub(crate) duplicate_runs: Option<DuplicateRunPolicy>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        application,
        route,
        decision,
        memo_profile,
        duplicate_runs,
    } = args;

    let mut config = AppConfig::load()?;
    if let Some(profile) = memo_profile {
        config.engine.memo_profile = profile;
        config.engine.memo_tick_ms = profile.default_tick_ms();
    }
    if let Some(policy) = duplicate_runs {
        config.engine.duplicate_runs = policy;
    }
    telemetry::init(&config.telemetry, config.environment)?;

    let settings = DeskSettings::from_config(&config.engine)?;
    info!(
        environment = ?config.environment,
        memo_profile = settings.memo.profile().label(),
        duplicate_runs = settings.duplicate_runs.label(),
        "credit desk ready"
    );

    let (desk, session) = DeskSession::spawn(ApplicationCatalog::standard(), settings);
    let (_subscription, mut events) = desk.events().await?;

    println!("Credit review desk demo");
    let application = application.unwrap_or_else(|| "APP001".to_string());
    let view = desk.open_application(&application).await?;
    print_opened(&view);

    if view.state.screen == Screen::DocumentVerification {
        verify_documents(&desk, &mut events).await?;
    } else {
        println!("- Documents already verified; skipping upload");
    }

    let view = match route.unwrap_or_default() {
        ReviewRoute::CreditManager => {
            credit_manager_review(&desk, &mut events, decision.unwrap_or(DecisionAction::Approve))
                .await?
        }
        ReviewRoute::Checklist => checklist_review(&desk).await?,
    };
    print_summary(&view);

    drop(desk);
    session.await.map_err(|_| SessionError::Closed)?;
    Ok(())
}

async fn verify_documents(
    desk: &DeskHandle,
    events: &mut UnboundedReceiver<DeskEvent>,
) -> Result<(), AppError> {
    let files = demo_files();
    println!("- Uploading {} document(s)", files.len());
    desk.start_upload(files).await?;
    follow_run(events, TaskKind::DocumentUpload).await?;

    let view = desk.view().await?;
    println!("  {} file(s) uploaded", view.uploaded_files);
    for item in &view.documents.items {
        desk.check_document(&item.id, true).await?;
        println!("  [x] {}", item.id);
    }
    desk.submit(Intent::ContinueToApproval).await?;
    println!("- Documents marked as verified");
    Ok(())
}

async fn credit_manager_review(
    desk: &DeskHandle,
    events: &mut UnboundedReceiver<DeskEvent>,
    decision: DecisionAction,
) -> Result<DeskView, AppError> {
    desk.submit(Intent::SendToCreditManager).await?;
    println!("- Sent to the credit manager queue");

    desk.start_memo_generation().await?;
    println!("- Generating credit assessment memo");
    follow_run(events, TaskKind::MemoGeneration).await?;

    let view = desk.view().await?;
    for document in &view.memo_documents {
        println!("  {:<26} {}", document.name, document.status_label);
    }

    desk.submit(Intent::AcknowledgeSecurity).await?;
    println!("- Security verification complete");
    Ok(desk.decide(decision).await?)
}

async fn checklist_review(desk: &DeskHandle) -> Result<DeskView, AppError> {
    let view = desk.submit(Intent::SendToChecklistReview).await?;
    println!("- Sent to CPA checklist review");

    for item in &view.review.items {
        desk.submit(Intent::CheckReviewItem {
            id: item.id.clone(),
            checked: true,
        })
        .await?;
    }
    let view = desk.view().await?;
    for category in &view.review.categories {
        println!(
            "  {:<26} {}/{} checked",
            category.category, category.checked, category.total
        );
    }
    Ok(desk.submit(Intent::CompleteReview).await?)
}

/// Print stage changes for the live run of `task` until it completes.
async fn follow_run(
    events: &mut UnboundedReceiver<DeskEvent>,
    task: TaskKind,
) -> Result<(), AppError> {
    let mut last_stage = None;
    while let Some(event) = events.recv().await {
        match event {
            DeskEvent::Progress {
                task: running,
                snapshot,
            } if running == task => {
                if last_stage != Some(snapshot.stage_index) {
                    last_stage = Some(snapshot.stage_index);
                    println!(
                        "    [{:>3}%] {} ({}/{})",
                        snapshot.percent(),
                        snapshot.stage_name,
                        snapshot.stage_index + 1,
                        snapshot.stage_count
                    );
                }
            }
            DeskEvent::RunCompleted { task: done, .. } if done == task => {
                println!("    [100%] {} complete", task);
                return Ok(());
            }
            DeskEvent::RunCancelled { task: cancelled, value, .. } if cancelled == task => {
                println!("    {} cancelled at {:.0}%", task, value);
                return Ok(());
            }
            _ => {}
        }
    }
    Err(SessionError::Closed.into())
}

fn print_opened(view: &DeskView) {
    if let Some(application) = &view.application {
        println!(
            "- Opened {} {} ({}, {}) -> {}",
            application.id,
            application.applicant,
            application.program,
            application.amount,
            view.screen_label
        );
    }
}

fn print_summary(view: &DeskView) {
    println!("\n{}", view.screen_label);
    match &view.outcome {
        Some(record) => println!(
            "- {}: {} at {}",
            record.application_id,
            record.outcome.label(),
            record
                .recorded_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
        ),
        None => println!("- No outcome recorded"),
    }
}
