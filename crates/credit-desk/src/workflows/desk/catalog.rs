use serde::Serialize;

use super::domain::{ApplicationStatus, ProgressBand};
use crate::workflows::gates::ChecklistItem;

/// Read-only application record shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSummary {
    pub id: &'static str,
    pub applicant: &'static str,
    pub amount: &'static str,
    pub program: &'static str,
    pub status: ApplicationStatus,
    pub progress: u8,
}

impl ApplicationSummary {
    pub fn band(&self) -> ProgressBand {
        ProgressBand::from_percent(self.progress)
    }

    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.applicant.to_lowercase().contains(&term)
            || self.id.to_lowercase().contains(&term)
    }
}

/// A document the desk expects, grouped by checklist category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentRequirement {
    pub name: &'static str,
    pub category: &'static str,
}

impl DocumentRequirement {
    pub fn to_item(self) -> ChecklistItem {
        ChecklistItem::new(self.name, self.category)
    }
}

/// Static reference data for applications and their document requirements.
#[derive(Debug, Clone)]
pub struct ApplicationCatalog {
    applications: Vec<ApplicationSummary>,
    kyc_documents: Vec<DocumentRequirement>,
    cpa_checklist: Vec<DocumentRequirement>,
    memo_sources: Vec<&'static str>,
}

impl ApplicationCatalog {
    pub fn standard() -> Self {
        Self {
            applications: standard_applications(),
            kyc_documents: kyc_documents(),
            cpa_checklist: cpa_checklist(),
            memo_sources: vec![
                "Bank Statements",
                "Perfios Report",
                "CIBIL Consumer",
                "CIBIL Commercial",
                "GST Filing Report",
                "Shareholding Certificate",
                "Audit Report",
            ],
        }
    }

    pub fn applications(&self) -> &[ApplicationSummary] {
        &self.applications
    }

    pub fn get(&self, id: &str) -> Option<&ApplicationSummary> {
        self.applications
            .iter()
            .find(|application| application.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Case-insensitive filter on applicant name or id. An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<&ApplicationSummary> {
        self.applications
            .iter()
            .filter(|application| application.matches(term))
            .collect()
    }

    pub fn kyc_documents(&self) -> &[DocumentRequirement] {
        &self.kyc_documents
    }

    pub fn cpa_checklist(&self) -> &[DocumentRequirement] {
        &self.cpa_checklist
    }

    pub fn memo_sources(&self) -> &[&'static str] {
        &self.memo_sources
    }
}

fn standard_applications() -> Vec<ApplicationSummary> {
    vec![
        ApplicationSummary {
            id: "APP005",
            applicant: "Vishnu Packwell Pvt Ltd",
            amount: "₹35,00,000",
            program: "Term Loan",
            status: ApplicationStatus::Verified,
            progress: 100,
        },
        ApplicationSummary {
            id: "APP001",
            applicant: "Sharma Industries Pvt Ltd",
            amount: "₹25,00,000",
            program: "Term Loan",
            status: ApplicationStatus::InProgress,
            progress: 65,
        },
        ApplicationSummary {
            id: "APP002",
            applicant: "Tech Solutions Inc",
            amount: "₹50,00,000",
            program: "Working Capital",
            status: ApplicationStatus::Pending,
            progress: 35,
        },
        ApplicationSummary {
            id: "APP003",
            applicant: "Manufacturing Co.",
            amount: "₹1,00,00,000",
            program: "Equipment Loan",
            status: ApplicationStatus::Verified,
            progress: 55,
        },
        ApplicationSummary {
            id: "APP004",
            applicant: "Export Business Ltd",
            amount: "₹75,00,000",
            program: "LC Limit",
            status: ApplicationStatus::InProgress,
            progress: 10,
        },
    ]
}

fn kyc_documents() -> Vec<DocumentRequirement> {
    ["Aadhar", "PAN", "Application Form", "Bank Statements"]
        .into_iter()
        .map(|name| DocumentRequirement {
            name,
            category: "Documents",
        })
        .collect()
}

fn cpa_checklist() -> Vec<DocumentRequirement> {
    let sections: [(&'static str, &[&'static str]); 4] = [
        (
            "Documents",
            &["Aadhar Card", "Pan Card", "Application Form", "Bank Statements"],
        ),
        (
            "Compliance Documents",
            &["GST Returns", "IT Returns", "ROC Filings", "Audit Reports"],
        ),
        (
            "Financial Audit Reports",
            &[
                "Audited Financials",
                "Balance Sheets",
                "P&L Statements",
                "GST Statements",
            ],
        ),
        ("Application Track", &["Application Track Documents"]),
    ];

    sections
        .into_iter()
        .flat_map(|(category, names)| {
            names
                .iter()
                .map(move |&name| DocumentRequirement { name, category })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_matches_applicant_or_id_case_insensitively() {
        let catalog = ApplicationCatalog::standard();
        let ids = |term: &str| -> Vec<&str> {
            catalog
                .search(term)
                .into_iter()
                .map(|application| application.id)
                .collect()
        };

        assert_eq!(ids("").len(), 5);
        assert_eq!(ids("sharma"), vec!["APP001"]);
        assert_eq!(ids("app00"), vec!["APP005", "APP001", "APP002", "APP003", "APP004"]);
        assert_eq!(ids("LTD"), vec!["APP005", "APP001", "APP004"]);
        assert!(ids("nonexistent").is_empty());
    }

    #[test]
    fn cpa_checklist_spans_four_categories() {
        let catalog = ApplicationCatalog::standard();
        let mut categories: Vec<&str> = catalog
            .cpa_checklist()
            .iter()
            .map(|requirement| requirement.category)
            .collect();
        categories.dedup();
        assert_eq!(categories.len(), 4);
        assert_eq!(catalog.kyc_documents().len(), 4);
        assert_eq!(catalog.get("app003").map(|app| app.band()), Some(ProgressBand::Medium));
    }
}
