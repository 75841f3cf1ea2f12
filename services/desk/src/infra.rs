use credit_desk::config::MemoProfile;
use credit_desk::workflows::desk::{DecisionAction, FileDescriptor};
use credit_desk::workflows::progress::DuplicateRunPolicy;

/// Which reviewer the demo hands the application to after document approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ReviewRoute {
    #[default]
    CreditManager,
    Checklist,
}

pub(crate) fn parse_route(raw: &str) -> Result<ReviewRoute, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "cm" | "credit-manager" => Ok(ReviewRoute::CreditManager),
        "cpa" | "checklist" => Ok(ReviewRoute::Checklist),
        other => Err(format!("unknown route '{other}' (expected credit-manager or cpa)")),
    }
}

pub(crate) fn parse_decision(raw: &str) -> Result<DecisionAction, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "approve" => Ok(DecisionAction::Approve),
        "send-back" | "sendback" => Ok(DecisionAction::SendBack),
        "reject" => Ok(DecisionAction::Reject),
        other => Err(format!(
            "unknown decision '{other}' (expected approve, send-back or reject)"
        )),
    }
}

pub(crate) fn parse_memo_profile(raw: &str) -> Result<MemoProfile, String> {
    MemoProfile::parse(raw).ok_or_else(|| format!("unknown memo profile '{raw}' (expected staged or uniform)"))
}

pub(crate) fn parse_duplicate_runs(raw: &str) -> Result<DuplicateRunPolicy, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "reject" => Ok(DuplicateRunPolicy::Reject),
        "supersede" => Ok(DuplicateRunPolicy::Supersede),
        other => Err(format!("unknown policy '{other}' (expected reject or supersede)")),
    }
}

/// Files the demo hands to the upload run. Only names and sizes are ever inspected.
pub(crate) fn demo_files() -> Vec<FileDescriptor> {
    vec![
        FileDescriptor::new("bank-statements-fy24.pdf", 1_482_113),
        FileDescriptor::new("gst-returns-q1-q4.xlsx", 96_240),
        FileDescriptor::new("audited-financials.docx", 412_876),
    ]
}
