use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflows::gates::GateError;
use crate::workflows::progress::RunHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Dashboard,
    DocumentVerification,
    Upload,
    DocumentApproval,
    MemoQueue,
    MemoGeneration,
    MemoDecision,
    ChecklistReview,
    DecisionSummary,
}

impl Screen {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::DocumentVerification => "Document Verification",
            Self::Upload => "Document Upload",
            Self::DocumentApproval => "Document Approval",
            Self::MemoQueue => "Credit Manager Queue",
            Self::MemoGeneration => "Credit Assessment Memo Generation",
            Self::MemoDecision => "Credit Decision",
            Self::ChecklistReview => "CPA Documentation Checklist",
            Self::DecisionSummary => "Decision Summary",
        }
    }

    /// Where a navigation-away intent leads from this screen.
    pub const fn back_target(self) -> Option<Self> {
        match self {
            Self::Dashboard => None,
            Self::DocumentVerification => Some(Self::Dashboard),
            Self::Upload => Some(Self::DocumentVerification),
            Self::DocumentApproval => Some(Self::DocumentVerification),
            Self::MemoQueue => Some(Self::Dashboard),
            Self::MemoGeneration => Some(Self::MemoQueue),
            Self::MemoDecision => Some(Self::MemoQueue),
            Self::ChecklistReview => Some(Self::Dashboard),
            Self::DecisionSummary => Some(Self::Dashboard),
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    New,
    InProgress,
    Pending,
    Verified,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InProgress => "In Progress",
            Self::Pending => "Pending",
            Self::Verified => "Verified",
        }
    }
}

/// Dashboard bucket for an application's completion bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBand {
    High,
    Medium,
    Low,
}

impl ProgressBand {
    pub const fn from_percent(percent: u8) -> Self {
        if percent >= 80 {
            Self::High
        } else if percent >= 50 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// The two long-running tasks the desk drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    DocumentUpload,
    MemoGeneration,
}

impl TaskKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::DocumentUpload => "Document Upload",
            Self::MemoGeneration => "CAM Generation",
        }
    }

    /// The screen that owns runs of this task; leaving it cancels them.
    pub const fn screen(self) -> Screen {
        match self {
            Self::DocumentUpload => Screen::Upload,
            Self::MemoGeneration => Screen::MemoGeneration,
        }
    }

    /// Where the workflow goes once a run of this task completes.
    pub const fn completion_screen(self) -> Screen {
        match self {
            Self::DocumentUpload => Screen::DocumentVerification,
            Self::MemoGeneration => Screen::MemoDecision,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Approve,
    SendBack,
    Reject,
}

impl DecisionAction {
    pub const fn ordered() -> [Self; 3] {
        [Self::Approve, Self::SendBack, Self::Reject]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "Approve",
            Self::SendBack => "Send Back",
            Self::Reject => "Reject",
        }
    }

    pub const fn action(self) -> Action {
        match self {
            Self::Approve => Action::Approve,
            Self::SendBack => Action::SendBack,
            Self::Reject => Action::Reject,
        }
    }
}

/// Every user action the desk can enable or block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    OpenApplication,
    StartUpload,
    CheckDocument,
    ContinueToApproval,
    SendToCreditManager,
    SendToChecklistReview,
    StartMemoGeneration,
    AcknowledgeSecurity,
    Approve,
    SendBack,
    Reject,
    CheckReviewItem,
    CompleteReview,
    GoBack,
    ReturnToDashboard,
}

impl Action {
    pub const fn ordered() -> [Self; 15] {
        [
            Self::OpenApplication,
            Self::StartUpload,
            Self::CheckDocument,
            Self::ContinueToApproval,
            Self::SendToCreditManager,
            Self::SendToChecklistReview,
            Self::StartMemoGeneration,
            Self::AcknowledgeSecurity,
            Self::Approve,
            Self::SendBack,
            Self::Reject,
            Self::CheckReviewItem,
            Self::CompleteReview,
            Self::GoBack,
            Self::ReturnToDashboard,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OpenApplication => "Open Application",
            Self::StartUpload => "Upload Documents",
            Self::CheckDocument => "Check Document",
            Self::ContinueToApproval => "Mark as Verified",
            Self::SendToCreditManager => "CM Queue",
            Self::SendToChecklistReview => "Send to CPA",
            Self::StartMemoGeneration => "Generate CAM",
            Self::AcknowledgeSecurity => "Complete Security Verification",
            Self::Approve => "Approve",
            Self::SendBack => "Send Back",
            Self::Reject => "Reject",
            Self::CheckReviewItem => "Check Review Item",
            Self::CompleteReview => "Next",
            Self::GoBack => "Back",
            Self::ReturnToDashboard => "Dashboard",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why an action is currently unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Blocker {
    WrongScreen { current: Screen },
    NoApplicationSelected,
    DocumentsUnverified { remaining: usize },
    ReviewIncomplete { remaining: usize },
    SecurityUnacknowledged,
    RunInProgress { task: TaskKind },
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blocker::WrongScreen { current } => write!(f, "not offered on {current}"),
            Blocker::NoApplicationSelected => write!(f, "no application selected"),
            Blocker::DocumentsUnverified { remaining } => {
                write!(f, "{remaining} document(s) still unverified")
            }
            Blocker::ReviewIncomplete { remaining } => {
                write!(f, "{remaining} checklist item(s) still open")
            }
            Blocker::SecurityUnacknowledged => write!(f, "security verification required"),
            Blocker::RunInProgress { task } => write!(f, "{task} is still running"),
        }
    }
}

/// File descriptor supplied by the file-selection collaborator. Contents are never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    pub fn format(&self) -> Option<DocumentFormat> {
        let (_, extension) = self.name.rsplit_once('.')?;
        DocumentFormat::from_extension(extension)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Doc,
    Docx,
    Xls,
    Xlsx,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "xls" => Some(Self::Xls),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// Validate a file set before an upload run starts.
pub fn validate_files(files: &[FileDescriptor]) -> Result<(), InputError> {
    if files.is_empty() {
        return Err(InputError::EmptyFileSet);
    }
    for file in files {
        if file.name.trim().is_empty() {
            return Err(InputError::UnnamedFile);
        }
        if file.size == 0 {
            return Err(InputError::EmptyFile(file.name.clone()));
        }
        if file.format().is_none() {
            return Err(InputError::UnsupportedFile(file.name.clone()));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    Decision(DecisionAction),
    ChecklistCleared,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Decision(action) => action.label(),
            Outcome::ChecklistCleared => "Checklist Cleared",
        }
    }
}

/// Terminal result of a review, shown on the summary screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord {
    pub application_id: String,
    pub outcome: Outcome,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("no files were selected")]
    EmptyFileSet,
    #[error("a selected file has no name")]
    UnnamedFile,
    #[error("file {0} is empty")]
    EmptyFile(String),
    #[error("file {0} is not a PDF, DOC, DOCX, XLS or XLSX document")]
    UnsupportedFile(String),
    #[error("application {0} not found")]
    UnknownApplication(String),
    #[error("checklist item {0} not found")]
    UnknownItem(String),
}

/// Failure of a workflow intent. State is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
    #[error("{action} is not available: {blocker}")]
    PreconditionNotMet { action: Action, blocker: Blocker },
    #[error("{task} already has an active run ({active})")]
    DuplicateRun { task: TaskKind, active: RunHandle },
}

impl From<GateError> for WorkflowError {
    fn from(value: GateError) -> Self {
        match value {
            GateError::NotFound(id) => Self::InvalidInput(InputError::UnknownItem(id)),
        }
    }
}
