//! Credit review desk: screen navigation, verification gates and the progress runs that
//! move an application from document verification to a recorded decision.

mod catalog;
mod controller;
mod domain;
mod session;
mod settings;
mod view;

pub use catalog::{ApplicationCatalog, ApplicationSummary, DocumentRequirement};
pub use controller::{Intent, Listener, SubscriptionId, WorkflowController};
pub use domain::{
    validate_files, Action, ApplicationStatus, Blocker, DecisionAction, DocumentFormat,
    FileDescriptor, InputError, Outcome, OutcomeRecord, ProgressBand, Screen, TaskKind,
    WorkflowError,
};
pub use session::{DeskHandle, DeskSession, SessionError, SessionEvent};
pub use settings::{staged_blueprint, uniform_blueprint, DeskSettings, CAM_STAGES, UPLOAD_STAGES};
pub use view::{
    processing_status, ActionState, AvailableActions, DeskEvent, DeskView,
    DocumentProcessingView, ProcessingStatus, WorkflowState,
};

#[cfg(test)]
mod tests;
