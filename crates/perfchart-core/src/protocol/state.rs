//! Process state owned by the protocol handler.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::adjustment::AdjustmentProposal;
use crate::domain::dataset::AbacDataset;
use crate::domain::index::{AbacIndex, DocumentMeta};
use crate::domain::model::CompiledModel;
use crate::domain::testing::TestResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Inventory,
    Extraction,
    Validation,
    Compile,
    Finalize,
    /// Terminal. No further message is processed.
    Aborted,
}

impl Phase {
    /// Numeric phase, `None` once aborted.
    pub fn number(self) -> Option<u8> {
        match self {
            Self::Inventory => Some(0),
            Self::Extraction => Some(1),
            Self::Validation => Some(2),
            Self::Compile => Some(3),
            Self::Finalize => Some(4),
            Self::Aborted => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Extraction => "extraction",
            Self::Validation => "validation",
            Self::Compile => "compile",
            Self::Finalize => "finalize",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adjustments proposed for a failed dataset, awaiting acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRevision {
    pub abac_id: String,
    pub adjustments: Vec<AdjustmentProposal>,
}

/// Everything the protocol remembers between messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolState {
    pub phase: Phase,
    pub current_abac_id: Option<String>,
    pub document_meta: Option<DocumentMeta>,
    pub abac_index: Option<AbacIndex>,
    /// Dataset extracted for the current abac, not yet saved.
    pub current_dataset: Option<AbacDataset>,
    /// Saved datasets, in save order, one per abac id.
    pub extracted_abacs: Vec<AbacDataset>,
    /// Every validation result received, in arrival order.
    pub test_results: Vec<TestResult>,
    pub pending_revision: Option<PendingRevision>,
    pub compiled_model: Option<CompiledModel>,
    pub abort_reason: Option<String>,
}

impl Default for ProtocolState {
    fn default() -> Self {
        Self {
            phase: Phase::Inventory,
            current_abac_id: None,
            document_meta: None,
            abac_index: None,
            current_dataset: None,
            extracted_abacs: Vec::new(),
            test_results: Vec::new(),
            pending_revision: None,
            compiled_model: None,
            abort_reason: None,
        }
    }
}

impl ProtocolState {
    pub fn is_aborted(&self) -> bool {
        self.phase == Phase::Aborted
    }

    /// Store `dataset` as saved, replacing an earlier save of the same id.
    pub fn save_dataset(&mut self, dataset: AbacDataset) {
        match self.extracted_abacs.iter_mut().find(|d| d.id == dataset.id) {
            Some(slot) => *slot = dataset,
            None => self.extracted_abacs.push(dataset),
        }
    }

    /// Ids whose most recent validation result failed, in first-seen order.
    pub fn suspect_abac_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for result in &self.test_results {
            if !ids.contains(&result.id) {
                ids.push(result.id.clone());
            }
        }
        ids.retain(|id| {
            self.test_results
                .iter()
                .rev()
                .find(|r| &r.id == id)
                .is_some_and(|r| !r.passed())
        });
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::purpose::Purpose;

    fn result(id: &str, pass: bool) -> TestResult {
        let mut r = TestResult::from_details(id, Vec::new());
        if !pass {
            r.status = crate::domain::TestStatus::Fail;
        }
        r
    }

    #[test]
    fn test_phase_numbers() {
        assert_eq!(Phase::Inventory.number(), Some(0));
        assert_eq!(Phase::Finalize.number(), Some(4));
        assert_eq!(Phase::Aborted.number(), None);
    }

    #[test]
    fn test_suspects_use_latest_result() {
        let mut state = ProtocolState::default();
        state.test_results = vec![
            result("a", false),
            result("b", false),
            result("a", true),
            result("c", false),
            result("b", false),
        ];
        assert_eq!(state.suspect_abac_ids(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_save_replaces_same_id() {
        let mut state = ProtocolState::default();
        state.save_dataset(AbacDataset::from_points("a", Purpose::Tas, vec![]));
        state.save_dataset(AbacDataset::from_points("b", Purpose::Tas, vec![]));
        state.save_dataset(AbacDataset::from_points("a", Purpose::FuelFlow, vec![]));
        assert_eq!(state.extracted_abacs.len(), 2);
        assert_eq!(state.extracted_abacs[0].purpose(), Purpose::FuelFlow);
    }
}
