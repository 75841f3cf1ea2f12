use serde::Serialize;

use super::catalog::ApplicationSummary;
use super::domain::{Action, Blocker, OutcomeRecord, Screen, TaskKind};
use crate::workflows::gates::GateSnapshot;
use crate::workflows::progress::{ProgressSnapshot, RunHandle};

/// The authoritative "where are we" value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowState {
    pub screen: Screen,
    pub selected_application_id: Option<String>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            screen: Screen::Dashboard,
            selected_application_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionState {
    pub action: Action,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<Blocker>,
}

/// Enabled/disabled state of every action for the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableActions {
    pub actions: Vec<ActionState>,
}

impl AvailableActions {
    pub fn is_enabled(&self, action: Action) -> bool {
        self.blocker(action).is_none()
    }

    pub fn blocker(&self, action: Action) -> Option<Blocker> {
        self.actions
            .iter()
            .find(|state| state.action == action)
            .and_then(|state| state.blocked_by)
    }

    pub fn enabled(&self) -> Vec<Action> {
        self.actions
            .iter()
            .filter(|state| state.blocked_by.is_none())
            .map(|state| state.action)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Completed,
    Processing,
    Pending,
}

impl ProcessingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Processing => "Processing",
            Self::Pending => "Pending",
        }
    }
}

/// A memo source document and how far generation has got through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentProcessingView {
    pub name: &'static str,
    pub status: ProcessingStatus,
    pub status_label: &'static str,
}

/// Spread `documents` evenly over 0..=100 and classify each against `value`.
pub fn processing_status(documents: &[&'static str], value: f64) -> Vec<DocumentProcessingView> {
    let count = documents.len().max(1) as f64;
    documents
        .iter()
        .enumerate()
        .map(|(index, &name)| {
            let start = index as f64 * 100.0 / count;
            let end = (index + 1) as f64 * 100.0 / count;
            let status = if value >= end {
                ProcessingStatus::Completed
            } else if value > start {
                ProcessingStatus::Processing
            } else {
                ProcessingStatus::Pending
            };
            DocumentProcessingView {
                name,
                status,
                status_label: status.label(),
            }
        })
        .collect()
}

/// Everything the presentation layer needs to render the current screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeskView {
    pub state: WorkflowState,
    pub screen_label: &'static str,
    pub application: Option<ApplicationSummary>,
    pub upload: Option<ProgressSnapshot>,
    pub memo: Option<ProgressSnapshot>,
    pub memo_documents: Vec<DocumentProcessingView>,
    pub documents: GateSnapshot,
    pub review: GateSnapshot,
    pub uploaded_files: usize,
    pub security_acknowledged: bool,
    pub outcome: Option<OutcomeRecord>,
    pub actions: AvailableActions,
}

/// Push notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    ScreenChanged {
        from: Screen,
        to: Screen,
        application_id: Option<String>,
    },
    Progress {
        task: TaskKind,
        snapshot: ProgressSnapshot,
    },
    RunCompleted {
        task: TaskKind,
        run: RunHandle,
    },
    RunCancelled {
        task: TaskKind,
        run: RunHandle,
        value: f64,
    },
    DocumentsUpdated {
        snapshot: GateSnapshot,
    },
    ReviewUpdated {
        snapshot: GateSnapshot,
    },
    SecurityAcknowledged,
    OutcomeRecorded {
        record: OutcomeRecord,
    },
}
