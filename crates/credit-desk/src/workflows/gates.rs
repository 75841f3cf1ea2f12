//! Boolean preconditions that unlock downstream workflow actions.

use serde::Serialize;

/// One required checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub id: String,
    pub category: String,
    pub checked: bool,
}

impl ChecklistItem {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            checked: false,
        }
    }
}

/// Completion of one category within a checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryProgress {
    pub category: String,
    pub checked: usize,
    pub total: usize,
    pub complete: bool,
}

/// Consistent view of a checklist after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateSnapshot {
    pub items: Vec<ChecklistItem>,
    pub categories: Vec<CategoryProgress>,
    pub checked: usize,
    pub total: usize,
    pub all_checked: bool,
}

impl GateSnapshot {
    pub fn remaining(&self) -> usize {
        self.total - self.checked
    }

    pub fn completed_categories(&self) -> usize {
        self.categories
            .iter()
            .filter(|category| category.complete)
            .count()
    }

    pub fn is_checked(&self, id: &str) -> Option<bool> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.checked)
    }
}

/// True when every item is checked. An empty checklist is satisfied.
pub fn all_checked(items: &[ChecklistItem]) -> bool {
    items.iter().all(|item| item.checked)
}

fn category_progress(items: &[ChecklistItem]) -> Vec<CategoryProgress> {
    let mut categories: Vec<CategoryProgress> = Vec::new();
    for item in items {
        let checked = usize::from(item.checked);
        match categories
            .iter_mut()
            .find(|entry| entry.category == item.category)
        {
            Some(entry) => {
                entry.total += 1;
                entry.checked += checked;
            }
            None => categories.push(CategoryProgress {
                category: item.category.clone(),
                checked,
                total: 1,
                complete: false,
            }),
        }
    }
    for entry in &mut categories {
        entry.complete = entry.checked == entry.total;
    }
    categories
}

/// Tracks a fixed set of checklist items, preserving their display order.
#[derive(Debug, Clone, Default)]
pub struct VerificationGate {
    items: Vec<ChecklistItem>,
}

impl VerificationGate {
    pub fn new(items: impl IntoIterator<Item = ChecklistItem>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub fn set_checked(&mut self, item_id: &str, value: bool) -> Result<GateSnapshot, GateError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| GateError::NotFound(item_id.to_owned()))?;
        item.checked = value;
        Ok(self.snapshot())
    }

    pub(crate) fn check_all(&mut self) -> GateSnapshot {
        for item in &mut self.items {
            item.checked = true;
        }
        self.snapshot()
    }

    pub fn all_checked(&self) -> bool {
        all_checked(&self.items)
    }

    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|item| !item.checked).count()
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn snapshot(&self) -> GateSnapshot {
        let checked = self.items.iter().filter(|item| item.checked).count();
        GateSnapshot {
            items: self.items.clone(),
            categories: category_progress(&self.items),
            checked,
            total: self.items.len(),
            all_checked: all_checked(&self.items),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("checklist item {0} not found")]
    NotFound(String),
}

/// Acknowledgement that must be given before decision actions unlock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecurityGate {
    acknowledged: bool,
}

impl SecurityGate {
    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub(crate) fn reset(&mut self) {
        self.acknowledged = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kyc_gate() -> VerificationGate {
        VerificationGate::new(
            ["Aadhar", "PAN", "Application Form", "Bank Statements"]
                .into_iter()
                .map(|id| ChecklistItem::new(id, "Documents")),
        )
    }

    #[test]
    fn all_checked_tracks_every_item() {
        let mut gate = kyc_gate();
        let mut snapshot = gate.snapshot();
        assert!(!snapshot.all_checked);
        assert_eq!(snapshot.remaining(), 4);

        for id in ["Aadhar", "PAN", "Application Form", "Bank Statements"] {
            snapshot = gate.set_checked(id, true).expect("known item");
        }
        assert!(snapshot.all_checked);
        assert_eq!(snapshot.checked, 4);

        let snapshot = gate.set_checked("PAN", false).expect("known item");
        assert!(!snapshot.all_checked);
        assert_eq!(snapshot.remaining(), 1);
        assert_eq!(snapshot.is_checked("PAN"), Some(false));

        let snapshot = gate.set_checked("PAN", true).expect("known item");
        assert!(snapshot.all_checked);
    }

    #[test]
    fn unknown_items_leave_state_untouched() {
        let mut gate = kyc_gate();
        gate.set_checked("Aadhar", true).expect("known item");
        let before = gate.snapshot();

        assert_eq!(
            gate.set_checked("Passport", true),
            Err(GateError::NotFound("Passport".to_string()))
        );
        assert_eq!(gate.snapshot(), before);
    }

    #[test]
    fn categories_report_completion_in_display_order() {
        let mut gate = VerificationGate::new(vec![
            ChecklistItem::new("GST Returns", "Compliance"),
            ChecklistItem::new("Aadhar Card", "Documents"),
            ChecklistItem::new("IT Returns", "Compliance"),
        ]);
        let snapshot = gate.set_checked("Aadhar Card", true).expect("known item");

        let names: Vec<&str> = snapshot
            .categories
            .iter()
            .map(|category| category.category.as_str())
            .collect();
        assert_eq!(names, vec!["Compliance", "Documents"]);
        assert_eq!(snapshot.completed_categories(), 1);
        assert_eq!(snapshot.categories[0].total, 2);
    }

    #[test]
    fn security_ack_is_idempotent() {
        let mut gate = SecurityGate::default();
        assert!(!gate.is_acknowledged());
        gate.acknowledge();
        gate.acknowledge();
        assert!(gate.is_acknowledged());
        gate.reset();
        assert!(!gate.is_acknowledged());
    }
}
