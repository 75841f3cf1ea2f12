use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog::{ApplicationCatalog, DocumentRequirement};
use super::domain::{
    validate_files, Action, ApplicationStatus, Blocker, DecisionAction, FileDescriptor,
    InputError, Outcome, OutcomeRecord, Screen, TaskKind, WorkflowError,
};
use super::settings::DeskSettings;
use super::view::{
    processing_status, ActionState, AvailableActions, DeskEvent, DeskView, WorkflowState,
};
use crate::workflows::gates::{GateSnapshot, SecurityGate, VerificationGate};
use crate::workflows::progress::{
    DuplicateRunPolicy, ProgressBlueprint, ProgressError, ProgressSnapshot, RunHandle,
    StageProgressEngine, TickGuard, TickOutcome, Ticker,
};

pub type Listener = Box<dyn Fn(&DeskEvent) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SubscriptionId(u64);

/// A named user action submitted to the desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    OpenApplication(String),
    StartUpload(Vec<FileDescriptor>),
    CheckDocument { id: String, checked: bool },
    ContinueToApproval,
    SendToCreditManager,
    SendToChecklistReview,
    StartMemoGeneration,
    AcknowledgeSecurity,
    Decide(DecisionAction),
    CheckReviewItem { id: String, checked: bool },
    CompleteReview,
    GoBack,
    ReturnToDashboard,
}

impl Intent {
    pub fn action(&self) -> Action {
        match self {
            Intent::OpenApplication(_) => Action::OpenApplication,
            Intent::StartUpload(_) => Action::StartUpload,
            Intent::CheckDocument { .. } => Action::CheckDocument,
            Intent::ContinueToApproval => Action::ContinueToApproval,
            Intent::SendToCreditManager => Action::SendToCreditManager,
            Intent::SendToChecklistReview => Action::SendToChecklistReview,
            Intent::StartMemoGeneration => Action::StartMemoGeneration,
            Intent::AcknowledgeSecurity => Action::AcknowledgeSecurity,
            Intent::Decide(decision) => decision.action(),
            Intent::CheckReviewItem { .. } => Action::CheckReviewItem,
            Intent::CompleteReview => Action::CompleteReview,
            Intent::GoBack => Action::GoBack,
            Intent::ReturnToDashboard => Action::ReturnToDashboard,
        }
    }
}

/// Per-task run bookkeeping owned by the controller.
struct TaskSlot {
    engine: StageProgressEngine,
    guard: Option<TickGuard>,
    progress: Option<ProgressSnapshot>,
}

impl TaskSlot {
    fn new(task: TaskKind, settings: &DeskSettings) -> Self {
        let name = match task {
            TaskKind::DocumentUpload => "upload",
            TaskKind::MemoGeneration => "memo",
        };
        Self {
            engine: StageProgressEngine::new(name, settings.duplicate_runs),
            guard: None,
            progress: None,
        }
    }
}

/// Screen state machine for one desk session.
///
/// Every mutation goes through an intent method or [`WorkflowController::on_tick`]; both
/// return only after the resulting events have been delivered to subscribers.
pub struct WorkflowController<T> {
    catalog: ApplicationCatalog,
    settings: DeskSettings,
    ticker: T,
    state: WorkflowState,
    upload: TaskSlot,
    memo: TaskSlot,
    pending_files: Vec<FileDescriptor>,
    uploaded_files: Vec<FileDescriptor>,
    documents: VerificationGate,
    review: VerificationGate,
    security: SecurityGate,
    outcome: Option<OutcomeRecord>,
    listeners: BTreeMap<SubscriptionId, Listener>,
    next_subscription: u64,
}

impl<T: Ticker> WorkflowController<T> {
    pub fn new(catalog: ApplicationCatalog, settings: DeskSettings, ticker: T) -> Self {
        let upload = TaskSlot::new(TaskKind::DocumentUpload, &settings);
        let memo = TaskSlot::new(TaskKind::MemoGeneration, &settings);
        Self {
            catalog,
            settings,
            ticker,
            state: WorkflowState::default(),
            upload,
            memo,
            pending_files: Vec::new(),
            uploaded_files: Vec::new(),
            documents: VerificationGate::default(),
            review: VerificationGate::default(),
            security: SecurityGate::default(),
            outcome: None,
            listeners: BTreeMap::new(),
            next_subscription: 1,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn catalog(&self) -> &ApplicationCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &DeskSettings {
        &self.settings
    }

    pub fn documents(&self) -> GateSnapshot {
        self.documents.snapshot()
    }

    pub fn review(&self) -> GateSnapshot {
        self.review.snapshot()
    }

    pub fn is_security_acknowledged(&self) -> bool {
        self.security.is_acknowledged()
    }

    pub fn active_run(&self, task: TaskKind) -> Option<RunHandle> {
        self.slot(task).engine.active_handle()
    }

    pub fn progress(&self, task: TaskKind) -> Option<&ProgressSnapshot> {
        self.slot(task).progress.as_ref()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&DeskEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn dispatch(&mut self, intent: Intent) -> Result<DeskView, WorkflowError> {
        match intent {
            Intent::OpenApplication(id) => self.open_application(&id),
            Intent::StartUpload(files) => self.start_upload(files),
            Intent::CheckDocument { id, checked } => self.check_document(&id, checked),
            Intent::ContinueToApproval => self.continue_to_approval(),
            Intent::SendToCreditManager => self.send_to_credit_manager(),
            Intent::SendToChecklistReview => self.send_to_checklist_review(),
            Intent::StartMemoGeneration => self.start_memo_generation(),
            Intent::AcknowledgeSecurity => self.acknowledge_security(),
            Intent::Decide(decision) => self.decide(decision),
            Intent::CheckReviewItem { id, checked } => self.check_review_item(&id, checked),
            Intent::CompleteReview => self.complete_review(),
            Intent::GoBack => self.go_back(),
            Intent::ReturnToDashboard => self.return_to_dashboard(),
        }
    }

    pub fn open_application(&mut self, id: &str) -> Result<DeskView, WorkflowError> {
        self.guard(Action::OpenApplication)?;
        let application = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| InputError::UnknownApplication(id.to_owned()))?;

        self.documents = gate_for(self.catalog.kyc_documents());
        self.review = gate_for(self.catalog.cpa_checklist());
        self.pending_files.clear();
        self.uploaded_files.clear();
        self.upload.progress = None;
        self.memo.progress = None;
        self.outcome = None;
        self.state.selected_application_id = Some(application.id.to_string());

        // Already-verified applications skip straight to approval with a satisfied gate.
        let target = if application.status == ApplicationStatus::Verified {
            self.documents.check_all();
            Screen::DocumentApproval
        } else {
            Screen::DocumentVerification
        };
        info!(application = application.id, status = application.status.label(), "application opened");
        self.transition(target);
        self.publish(DeskEvent::DocumentsUpdated {
            snapshot: self.documents.snapshot(),
        });

        Ok(self.view())
    }

    pub fn start_upload(&mut self, files: Vec<FileDescriptor>) -> Result<DeskView, WorkflowError> {
        self.guard(Action::StartUpload)?;
        validate_files(&files)?;

        let blueprint = self.settings.upload.clone();
        self.start_run(TaskKind::DocumentUpload, &blueprint)?;
        info!(files = files.len(), "document upload started");
        self.pending_files = files;
        self.transition(Screen::Upload);

        Ok(self.view())
    }

    pub fn check_document(&mut self, id: &str, checked: bool) -> Result<DeskView, WorkflowError> {
        self.guard(Action::CheckDocument)?;
        let snapshot = self.documents.set_checked(id, checked)?;
        debug!(document = id, checked, all_checked = snapshot.all_checked, "document checklist updated");
        self.publish(DeskEvent::DocumentsUpdated { snapshot });

        Ok(self.view())
    }

    pub fn continue_to_approval(&mut self) -> Result<DeskView, WorkflowError> {
        self.guard(Action::ContinueToApproval)?;
        self.transition(Screen::DocumentApproval);
        Ok(self.view())
    }

    pub fn send_to_credit_manager(&mut self) -> Result<DeskView, WorkflowError> {
        self.guard(Action::SendToCreditManager)?;
        self.transition(Screen::MemoQueue);
        Ok(self.view())
    }

    pub fn send_to_checklist_review(&mut self) -> Result<DeskView, WorkflowError> {
        self.guard(Action::SendToChecklistReview)?;
        self.transition(Screen::ChecklistReview);
        self.publish(DeskEvent::ReviewUpdated {
            snapshot: self.review.snapshot(),
        });
        Ok(self.view())
    }

    /// Starts a fresh memo run. Security acknowledgement from any earlier run is cleared.
    pub fn start_memo_generation(&mut self) -> Result<DeskView, WorkflowError> {
        self.guard(Action::StartMemoGeneration)?;

        let blueprint = self.settings.memo.clone();
        self.start_run(TaskKind::MemoGeneration, &blueprint)?;
        self.security.reset();
        self.outcome = None;
        self.transition(Screen::MemoGeneration);

        Ok(self.view())
    }

    pub fn acknowledge_security(&mut self) -> Result<DeskView, WorkflowError> {
        self.guard(Action::AcknowledgeSecurity)?;
        if !self.security.is_acknowledged() {
            self.security.acknowledge();
            info!(application = ?self.state.selected_application_id, "security verification acknowledged");
            self.publish(DeskEvent::SecurityAcknowledged);
        }
        Ok(self.view())
    }

    pub fn decide(&mut self, decision: DecisionAction) -> Result<DeskView, WorkflowError> {
        let action = decision.action();
        self.guard(action)?;
        let application_id = self.require_application(action)?;

        info!(application = %application_id, decision = decision.label(), "credit decision recorded");
        self.record(application_id, Outcome::Decision(decision));
        self.transition(Screen::DecisionSummary);
        Ok(self.view())
    }

    pub fn check_review_item(&mut self, id: &str, checked: bool) -> Result<DeskView, WorkflowError> {
        self.guard(Action::CheckReviewItem)?;
        let snapshot = self.review.set_checked(id, checked)?;
        self.publish(DeskEvent::ReviewUpdated { snapshot });
        Ok(self.view())
    }

    pub fn complete_review(&mut self) -> Result<DeskView, WorkflowError> {
        self.guard(Action::CompleteReview)?;
        let application_id = self.require_application(Action::CompleteReview)?;

        info!(application = %application_id, "checklist review cleared");
        self.record(application_id, Outcome::ChecklistCleared);
        self.transition(Screen::DecisionSummary);
        Ok(self.view())
    }

    pub fn go_back(&mut self) -> Result<DeskView, WorkflowError> {
        self.guard(Action::GoBack)?;
        if let Some(target) = self.state.screen.back_target() {
            self.transition(target);
        }
        Ok(self.view())
    }

    pub fn return_to_dashboard(&mut self) -> Result<DeskView, WorkflowError> {
        self.guard(Action::ReturnToDashboard)?;
        self.transition(Screen::Dashboard);
        Ok(self.view())
    }

    /// Deliver one tick. Returns `false` when the tick was stale and changed nothing.
    pub fn on_tick(&mut self, run: RunHandle) -> bool {
        let task = if self.upload.engine.active_handle() == Some(run) {
            TaskKind::DocumentUpload
        } else if self.memo.engine.active_handle() == Some(run) {
            TaskKind::MemoGeneration
        } else {
            debug!(%run, "dropping stale tick");
            return false;
        };

        let slot = self.slot_mut(task);
        match slot.engine.tick(run) {
            TickOutcome::Stale => false,
            TickOutcome::Held => true,
            TickOutcome::Advanced(snapshot) => {
                slot.progress = Some(snapshot.clone());
                self.publish(DeskEvent::Progress { task, snapshot });
                true
            }
            TickOutcome::Completed(snapshot) => {
                slot.progress = Some(snapshot.clone());
                if let Some(guard) = slot.guard.take() {
                    guard.cancel();
                }
                self.publish(DeskEvent::Progress { task, snapshot });
                self.publish(DeskEvent::RunCompleted { task, run });
                self.finish(task);
                true
            }
        }
    }

    pub fn available_actions(&self) -> AvailableActions {
        AvailableActions {
            actions: Action::ordered()
                .into_iter()
                .map(|action| ActionState {
                    action,
                    label: action.label(),
                    blocked_by: self.blocker(action),
                })
                .collect(),
        }
    }

    pub fn view(&self) -> DeskView {
        let application = self
            .state
            .selected_application_id
            .as_deref()
            .and_then(|id| self.catalog.get(id))
            .cloned();
        let memo_value = self.memo.progress.as_ref().map_or(0.0, |snapshot| snapshot.value);

        DeskView {
            state: self.state.clone(),
            screen_label: self.state.screen.label(),
            application,
            upload: self.upload.progress.clone(),
            memo: self.memo.progress.clone(),
            memo_documents: processing_status(self.catalog.memo_sources(), memo_value),
            documents: self.documents.snapshot(),
            review: self.review.snapshot(),
            uploaded_files: self.uploaded_files.len(),
            security_acknowledged: self.security.is_acknowledged(),
            outcome: self.outcome.clone(),
            actions: self.available_actions(),
        }
    }

    /// Why `action` is unavailable right now, if it is.
    pub fn blocker(&self, action: Action) -> Option<Blocker> {
        let screen = self.state.screen;
        let offered_on = |screens: &[Screen]| {
            (!screens.contains(&screen)).then_some(Blocker::WrongScreen { current: screen })
        };

        match action {
            Action::OpenApplication => offered_on(&[Screen::Dashboard]),
            Action::StartUpload => offered_on(&[Screen::DocumentVerification, Screen::Upload])
                .or_else(|| self.run_blocker(TaskKind::DocumentUpload)),
            Action::CheckDocument => offered_on(&[Screen::DocumentVerification]),
            Action::ContinueToApproval => {
                offered_on(&[Screen::DocumentVerification]).or_else(|| {
                    let remaining = self.documents.remaining();
                    (remaining > 0).then_some(Blocker::DocumentsUnverified { remaining })
                })
            }
            Action::SendToCreditManager | Action::SendToChecklistReview => {
                offered_on(&[Screen::DocumentApproval])
            }
            Action::StartMemoGeneration => {
                offered_on(&[Screen::MemoQueue, Screen::MemoGeneration])
                    .or_else(|| self.run_blocker(TaskKind::MemoGeneration))
            }
            Action::AcknowledgeSecurity => offered_on(&[Screen::MemoDecision]),
            Action::Approve | Action::SendBack | Action::Reject => {
                offered_on(&[Screen::MemoDecision]).or_else(|| {
                    (!self.security.is_acknowledged()).then_some(Blocker::SecurityUnacknowledged)
                })
            }
            Action::CheckReviewItem => offered_on(&[Screen::ChecklistReview]),
            Action::CompleteReview => offered_on(&[Screen::ChecklistReview]).or_else(|| {
                let remaining = self.review.remaining();
                (remaining > 0).then_some(Blocker::ReviewIncomplete { remaining })
            }),
            Action::GoBack => screen
                .back_target()
                .is_none()
                .then_some(Blocker::WrongScreen { current: screen }),
            Action::ReturnToDashboard => (screen == Screen::Dashboard)
                .then_some(Blocker::WrongScreen { current: screen }),
        }
    }

    fn run_blocker(&self, task: TaskKind) -> Option<Blocker> {
        let slot = self.slot(task);
        (slot.engine.is_active() && slot.engine.policy() == DuplicateRunPolicy::Reject)
            .then_some(Blocker::RunInProgress { task })
    }

    fn guard(&self, action: Action) -> Result<(), WorkflowError> {
        let Some(blocker) = self.blocker(action) else {
            return Ok(());
        };

        if let Blocker::RunInProgress { task } = blocker {
            if let Some(active) = self.active_run(task) {
                warn!(%task, %active, "duplicate run rejected");
                return Err(WorkflowError::DuplicateRun { task, active });
            }
        }

        warn!(%action, %blocker, screen = ?self.state.screen, "intent rejected");
        Err(WorkflowError::PreconditionNotMet { action, blocker })
    }

    fn require_application(&self, action: Action) -> Result<String, WorkflowError> {
        self.state
            .selected_application_id
            .clone()
            .ok_or(WorkflowError::PreconditionNotMet {
                action,
                blocker: Blocker::NoApplicationSelected,
            })
    }

    fn start_run(
        &mut self,
        task: TaskKind,
        blueprint: &ProgressBlueprint,
    ) -> Result<(), WorkflowError> {
        let start = self
            .slot_mut(task)
            .engine
            .start(blueprint)
            .map_err(|err| match err {
                ProgressError::DuplicateRun { active } => {
                    WorkflowError::DuplicateRun { task, active }
                }
            })?;

        let guard = self.ticker.schedule(start.handle, blueprint.tick_interval());
        let slot = self.slot_mut(task);
        // Dropping the previous guard silences a superseded run's tick source.
        slot.guard = Some(guard);
        slot.progress = Some(start.initial.clone());

        if let Some(previous) = start.superseded {
            self.publish(DeskEvent::RunCancelled {
                task,
                run: previous.run,
                value: previous.value,
            });
        }
        self.publish(DeskEvent::Progress {
            task,
            snapshot: start.initial,
        });
        Ok(())
    }

    fn cancel_run(&mut self, task: TaskKind) {
        let slot = self.slot_mut(task);
        if let Some(guard) = slot.guard.take() {
            guard.cancel();
        }
        let Some(snapshot) = slot.engine.cancel_active() else {
            return;
        };
        slot.progress = None;
        self.publish(DeskEvent::RunCancelled {
            task,
            run: snapshot.run,
            value: snapshot.value,
        });
    }

    fn finish(&mut self, task: TaskKind) {
        if task == TaskKind::DocumentUpload {
            let files = std::mem::take(&mut self.pending_files);
            info!(files = files.len(), "document upload complete");
            self.uploaded_files.extend(files);
        }
        self.transition(task.completion_screen());
    }

    fn record(&mut self, application_id: String, outcome: Outcome) {
        let record = OutcomeRecord {
            application_id,
            outcome,
            recorded_at: Utc::now(),
        };
        self.outcome = Some(record.clone());
        self.publish(DeskEvent::OutcomeRecorded { record });
    }

    /// Move to `to`, cancelling any run whose owning screen is being left.
    fn transition(&mut self, to: Screen) {
        for task in [TaskKind::DocumentUpload, TaskKind::MemoGeneration] {
            if task.screen() != to {
                self.cancel_run(task);
            }
        }
        if to == Screen::Dashboard {
            self.state.selected_application_id = None;
        }

        let from = self.state.screen;
        if from == to {
            return;
        }
        self.state.screen = to;
        info!(from = from.label(), to = to.label(), "screen changed");
        self.publish(DeskEvent::ScreenChanged {
            from,
            to,
            application_id: self.state.selected_application_id.clone(),
        });
    }

    fn publish(&self, event: DeskEvent) {
        for listener in self.listeners.values() {
            listener(&event);
        }
    }

    fn slot(&self, task: TaskKind) -> &TaskSlot {
        match task {
            TaskKind::DocumentUpload => &self.upload,
            TaskKind::MemoGeneration => &self.memo,
        }
    }

    fn slot_mut(&mut self, task: TaskKind) -> &mut TaskSlot {
        match task {
            TaskKind::DocumentUpload => &mut self.upload,
            TaskKind::MemoGeneration => &mut self.memo,
        }
    }
}

fn gate_for(requirements: &[DocumentRequirement]) -> VerificationGate {
    VerificationGate::new(requirements.iter().map(|requirement| requirement.to_item()))
}
