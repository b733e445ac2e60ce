//! The extraction state machine.
//!
//! [`transition`] consumes the current state and one inbound message and
//! returns the next state with the message to emit, if any. It never blocks:
//! work that needs the collaborator is expressed as an outbound request, and
//! the machine resumes on the next inbound message.
//!
//! [`ProtocolHandler`] is the single owning handle around that function.

use crate::analyzer::{apply_adjustments, propose_adjustments};
use crate::checksum::checksum_of;
use crate::classify::{KeywordPurposeClassifier, PurposeClassifier};
use crate::config::ProtocolConfig;
use crate::domain::dataset::AbacDataset;
use crate::domain::error::ProtocolError;
use crate::domain::index::DocumentMeta;
use crate::domain::purpose::Purpose;
use crate::domain::testing::{TestCase, TestResult, TestStatus};
use crate::ingest::{build_index, extract_abac_data, find_figure, PageExtract};
use crate::metrics::METRICS;
use crate::obs;
use crate::validation::validate_abac_data;

use super::compile::compile_model;
use super::message::{
    AbacSaveOk, AbacTest, Detail, Envelope, InboundMessage, IngestNeed, ModelRepair, ModelSaveOk,
    OutboundMessage, PageSelection, ProcessAborted, RequestIngest, ReviseProposal,
};
use super::state::{PendingRevision, Phase, ProtocolState};

/// Manual section requested during inventory.
const INVENTORY_SECTION: &str = "performances";
const DEFAULT_ABORT_REASON: &str = "User abort";
const REPAIR_HINT: &str = "Check interpolation parameters";

/// Result of one step of the machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ProtocolState,
    pub response: Option<OutboundMessage>,
}

/// Enter phase 0 and request a minimal-detail scan of the performance pages.
pub fn start_inventory(state: &mut ProtocolState) -> OutboundMessage {
    state.phase = Phase::Inventory;
    state.current_abac_id = None;
    state.current_dataset = None;
    state.pending_revision = None;
    OutboundMessage::RequestIngest(RequestIngest {
        pages: PageSelection::Section(INVENTORY_SECTION.to_string()),
        need: IngestNeed::Both,
        detail: Detail::Minimal,
        abac_ids: None,
    })
}

/// Apply `msg` to `state`.
///
/// Once aborted, every message is ignored without a response.
pub fn transition(
    mut state: ProtocolState,
    msg: InboundMessage,
    config: &ProtocolConfig,
    classifier: &dyn PurposeClassifier,
) -> Transition {
    if state.is_aborted() {
        obs::emit_message_ignored(msg.kind(), "process aborted");
        METRICS.inc_messages_ignored();
        return Transition {
            state,
            response: None,
        };
    }
    obs::emit_message_received(msg.kind(), state.phase.as_str());
    METRICS.inc_messages_processed();

    let response = match msg {
        InboundMessage::DocMeta(meta) => {
            store_document_meta(&mut state, meta);
            None
        }
        InboundMessage::PageExtract(page) => Some(on_extract(&mut state, &[page], config, classifier)),
        InboundMessage::BatchExtract(batch) => {
            Some(on_extract(&mut state, &batch.pages, config, classifier))
        }
        InboundMessage::SelectAbac(select) => Some(select_abac(&mut state, &select.id)),
        InboundMessage::TestResult(result) => Some(on_test_result(&mut state, result, config)),
        InboundMessage::AcceptRevise => {
            accept_revision(&mut state);
            Some(next_abac(&mut state))
        }
        InboundMessage::RedoFromSource => Some(start_inventory(&mut state)),
        InboundMessage::NextAbac => Some(next_abac(&mut state)),
        InboundMessage::Compile => Some(compile(&mut state)),
        InboundMessage::Finalize(finalize) => Some(on_finalize(&mut state, finalize.status, config)),
        InboundMessage::Abort(abort) => Some(on_abort(&mut state, abort.reason)),
    };

    Transition { state, response }
}

// ============================================================================
// HANDLERS
// ============================================================================

fn store_document_meta(state: &mut ProtocolState, meta: DocumentMeta) {
    if state.document_meta.is_some() {
        obs::emit_message_ignored("APP_DOC_META", "document metadata already captured");
        return;
    }
    state.document_meta = Some(meta);
}

/// Phase 1 with a selected abac: build its dataset. Otherwise: inventory.
fn on_extract(
    state: &mut ProtocolState,
    pages: &[PageExtract],
    config: &ProtocolConfig,
    classifier: &dyn PurposeClassifier,
) -> OutboundMessage {
    if state.phase == Phase::Extraction {
        if let Some(id) = state.current_abac_id.clone() {
            return extract_current(state, &id, pages, config);
        }
    }

    let index = build_index(pages, state.document_meta.clone(), classifier);
    if state
        .current_abac_id
        .as_deref()
        .is_some_and(|id| index.position(id).is_none())
    {
        state.current_abac_id = None;
    }
    state.abac_index = Some(index.clone());
    OutboundMessage::AbacIndex(index)
}

fn extract_current(
    state: &mut ProtocolState,
    id: &str,
    pages: &[PageExtract],
    config: &ProtocolConfig,
) -> OutboundMessage {
    let Some(entry) = state.abac_index.as_ref().and_then(|i| i.find(id)) else {
        return OutboundMessage::error(ProtocolError::AbacNotFound(id.to_string()).to_string());
    };
    let Some(figure) = find_figure(pages, &entry.source_fig_ids) else {
        return OutboundMessage::error(format!(
            "no figure for ABAC {id} in extract (expected one of {:?})",
            entry.source_fig_ids
        ));
    };

    let dataset = extract_abac_data(figure, entry, config);
    let report = validate_abac_data(&dataset);
    obs::emit_dataset_extracted(id, dataset.grid.values.len(), report.data_quality);
    if !report.is_valid {
        return OutboundMessage::error(format!(
            "ABAC {id} extraction rejected: {}",
            report.errors.join("; ")
        ));
    }

    let request = AbacTest {
        id: dataset.id.clone(),
        method: "evaluate_cases".to_string(),
        interpolation: dataset.interpolation.method,
        cases: dataset.validation_tests.cases.clone(),
    };
    state.current_dataset = Some(dataset);
    state.phase = Phase::Validation;
    OutboundMessage::AbacTest(request)
}

/// Unknown ids leave the state untouched.
fn select_abac(state: &mut ProtocolState, id: &str) -> OutboundMessage {
    let Some(entry) = state.abac_index.as_ref().and_then(|i| i.find(id)) else {
        return OutboundMessage::error(ProtocolError::AbacNotFound(id.to_string()).to_string());
    };
    let request = RequestIngest {
        pages: PageSelection::Pages(entry.pages.clone()),
        need: IngestNeed::Abacs,
        detail: Detail::Full,
        abac_ids: Some(entry.source_fig_ids.clone()),
    };

    state.phase = Phase::Extraction;
    state.current_abac_id = Some(id.to_string());
    state.current_dataset = None;
    state.pending_revision = None;
    OutboundMessage::RequestIngest(request)
}

/// Dataset a result refers to: the one under test, else a saved one.
fn dataset_for<'a>(state: &'a ProtocolState, id: &str) -> Option<&'a AbacDataset> {
    state
        .current_dataset
        .as_ref()
        .filter(|d| d.id == id)
        .or_else(|| state.extracted_abacs.iter().find(|d| d.id == id))
}

fn on_test_result(state: &mut ProtocolState, result: TestResult, config: &ProtocolConfig) -> OutboundMessage {
    state.test_results.push(result.clone());
    if result.passed() {
        save_passed(state, &result.id)
    } else {
        propose_revision(state, &result, config)
    }
}

fn save_passed(state: &mut ProtocolState, id: &str) -> OutboundMessage {
    if state.current_dataset.as_ref().is_some_and(|d| d.id == id) {
        if let Some(dataset) = state.current_dataset.take() {
            state.save_dataset(dataset);
        }
    }
    state.pending_revision = None;

    let checksum = match state.extracted_abacs.iter().find(|d| d.id == id) {
        Some(dataset) => checksum_of(dataset),
        None => checksum_of(id),
    };
    match checksum {
        Ok(checksum) => {
            obs::emit_abac_saved(id, &checksum);
            OutboundMessage::AbacSaveOk(AbacSaveOk {
                id: id.to_string(),
                action: "save".to_string(),
                checksum,
            })
        }
        Err(e) => OutboundMessage::error(format!("cannot checksum ABAC {id}: {e}")),
    }
}

fn propose_revision(state: &mut ProtocolState, result: &TestResult, config: &ProtocolConfig) -> OutboundMessage {
    let placeholder;
    let dataset = match dataset_for(state, &result.id) {
        Some(d) => d,
        None => {
            placeholder = AbacDataset::from_points(result.id.clone(), Purpose::Other, Vec::new());
            &placeholder
        }
    };
    let adjustments = propose_adjustments(result, dataset);

    let new_tests: Vec<TestCase> = result
        .failed_cases()
        .map(|c| {
            TestCase::new(
                format!("revised_{}", c.case),
                c.inputs,
                c.exp,
                config.revised_tolerance,
            )
        })
        .collect();
    let failed = new_tests.len();

    obs::emit_revision_proposed(&result.id, adjustments.len(), failed);
    state.pending_revision = Some(PendingRevision {
        abac_id: result.id.clone(),
        adjustments: adjustments.clone(),
    });

    OutboundMessage::AbacReviseProposal(ReviseProposal {
        id: result.id.clone(),
        reason: format!(
            "test deviation: {failed} of {} cases outside tolerance",
            result.details.len()
        ),
        adjustment_plan: adjustments,
        new_tests,
    })
}

/// Apply the pending plan and keep the revised dataset for compilation.
fn accept_revision(state: &mut ProtocolState) {
    let Some(pending) = state.pending_revision.take() else {
        return;
    };
    let Some(dataset) = dataset_for(state, &pending.abac_id) else {
        obs::emit_message_ignored("APP_ACCEPT_REVISE", "no dataset for pending revision");
        return;
    };
    let revised = apply_adjustments(dataset, &pending.adjustments);
    state.save_dataset(revised);
    if state
        .current_dataset
        .as_ref()
        .is_some_and(|d| d.id == pending.abac_id)
    {
        state.current_dataset = None;
    }
}

/// Select the abac after the current one in discovery order, or compile
/// when the index is exhausted.
fn next_abac(state: &mut ProtocolState) -> OutboundMessage {
    let next_id = state.abac_index.as_ref().and_then(|index| {
        let next = state
            .current_abac_id
            .as_ref()
            .and_then(|current| index.position(current))
            .map_or(0, |p| p + 1);
        index.abacs.get(next).map(|e| e.id.clone())
    });
    match next_id {
        Some(id) => select_abac(state, &id),
        None => compile(state),
    }
}

fn compile(state: &mut ProtocolState) -> OutboundMessage {
    state.phase = Phase::Compile;
    let model = compile_model(state.document_meta.as_ref(), &state.extracted_abacs);
    obs::emit_model_compiled(model.functions.len(), model.data_gaps.len());
    state.compiled_model = Some(model.clone());
    OutboundMessage::PerfModelCompiled(model)
}

fn on_finalize(state: &mut ProtocolState, status: TestStatus, config: &ProtocolConfig) -> OutboundMessage {
    state.phase = Phase::Finalize;
    if status == TestStatus::Fail {
        return OutboundMessage::PerfModelRepair(ModelRepair {
            hint: REPAIR_HINT.to_string(),
            suspected_abac_ids: state.suspect_abac_ids(),
        });
    }

    let model = match &state.compiled_model {
        Some(model) => model.clone(),
        None => {
            let model = compile_model(state.document_meta.as_ref(), &state.extracted_abacs);
            state.compiled_model = Some(model.clone());
            model
        }
    };
    match checksum_of(&model) {
        Ok(checksum) => OutboundMessage::PerfModelSaveOk(ModelSaveOk {
            file: config.model_file.clone(),
            checksum,
        }),
        Err(e) => OutboundMessage::error(format!("cannot checksum model: {e}")),
    }
}

fn on_abort(state: &mut ProtocolState, reason: Option<String>) -> OutboundMessage {
    let reason = reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ABORT_REASON.to_string());
    obs::emit_process_aborted(&reason);
    state.phase = Phase::Aborted;
    state.abort_reason = Some(reason.clone());
    OutboundMessage::ProcessAborted(ProcessAborted { reason })
}

// ============================================================================
// OWNING HANDLE
// ============================================================================

/// Owns the process state and feeds it through [`transition`].
pub struct ProtocolHandler {
    state: ProtocolState,
    config: ProtocolConfig,
    classifier: Box<dyn PurposeClassifier>,
}

impl Default for ProtocolHandler {
    fn default() -> Self {
        Self::new(ProtocolConfig::default())
    }
}

impl ProtocolHandler {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            state: ProtocolState::default(),
            config,
            classifier: Box::new(KeywordPurposeClassifier),
        }
    }

    /// Replace the caption classifier.
    pub fn with_classifier(mut self, classifier: impl PurposeClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Read-only view of the current state.
    pub fn state(&self) -> &ProtocolState {
        &self.state
    }

    /// Begin (or restart) inventory. `None` once aborted.
    pub fn start(&mut self) -> Option<OutboundMessage> {
        if self.state.is_aborted() {
            obs::emit_message_ignored("START", "process aborted");
            return None;
        }
        Some(start_inventory(&mut self.state))
    }

    pub fn process(&mut self, msg: InboundMessage) -> Option<OutboundMessage> {
        let state = std::mem::take(&mut self.state);
        let Transition { state, response } =
            transition(state, msg, &self.config, self.classifier.as_ref());
        self.state = state;
        response
    }

    /// Decode and process a wire envelope.
    ///
    /// Unknown message types are logged and ignored. A known type with a
    /// payload that does not decode is answered with `ERROR`.
    pub fn process_envelope(&mut self, envelope: Envelope) -> Option<OutboundMessage> {
        let kind = envelope.kind.clone();
        match InboundMessage::from_envelope(envelope) {
            Ok(msg) => self.process(msg),
            Err(err @ ProtocolError::UnknownMessageType(_)) => {
                obs::emit_message_ignored(&kind, &err.to_string());
                METRICS.inc_messages_ignored();
                None
            }
            Err(err) => {
                if self.state.is_aborted() {
                    obs::emit_message_ignored(&kind, "process aborted");
                    METRICS.inc_messages_ignored();
                    return None;
                }
                obs::emit_message_ignored(&kind, &err.to_string());
                Some(OutboundMessage::error(err.to_string()))
            }
        }
    }

    /// Drop all progress and return to a fresh phase-0 state.
    pub fn reset(&mut self) {
        self.state = ProtocolState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::index::{AbacIndex, AbacIndexEntry};
    use crate::domain::testing::CaseOutcome;
    use crate::domain::QueryPoint;
    use crate::protocol::message::{Abort, Finalize, SelectAbac};

    fn entry(id: &str, purpose: Purpose) -> AbacIndexEntry {
        AbacIndexEntry {
            id: id.to_string(),
            title: id.to_string(),
            purpose,
            pages: vec![3],
            source_fig_ids: vec![format!("fig-{id}")],
            notes: None,
        }
    }

    fn indexed() -> ProtocolState {
        ProtocolState {
            abac_index: Some(AbacIndex {
                meta: None,
                abacs: vec![
                    entry("a", Purpose::DistanceGroundRoll),
                    entry("b", Purpose::LandingDistance),
                ],
            }),
            ..ProtocolState::default()
        }
    }

    fn step(state: ProtocolState, msg: InboundMessage) -> Transition {
        transition(state, msg, &ProtocolConfig::default(), &KeywordPurposeClassifier)
    }

    fn failing_result(id: &str) -> TestResult {
        TestResult::from_details(
            id,
            vec![CaseOutcome {
                case: "test_corner_1".to_string(),
                ok: false,
                pred: Some(525.0),
                exp: 500.0,
                abs_err: Some(25.0),
                pct_err: Some(5.0),
                inputs: QueryPoint::new().with_altitude(0.0),
                extrapolated: false,
                error: None,
            }],
        )
    }

    #[test]
    fn test_select_known_abac_requests_full_ingest() {
        let t = step(
            indexed(),
            InboundMessage::SelectAbac(SelectAbac { id: "b".into() }),
        );
        assert_eq!(t.state.phase, Phase::Extraction);
        assert_eq!(t.state.current_abac_id.as_deref(), Some("b"));
        let Some(OutboundMessage::RequestIngest(req)) = t.response else {
            panic!("expected REQUEST_INGEST");
        };
        assert_eq!(req.pages, PageSelection::Pages(vec![3]));
        assert_eq!(req.detail, Detail::Full);
        assert_eq!(req.abac_ids, Some(vec!["fig-b".to_string()]));
    }

    #[test]
    fn test_select_unknown_abac_keeps_state() {
        let before = step(
            indexed(),
            InboundMessage::SelectAbac(SelectAbac { id: "a".into() }),
        )
        .state;
        let t = step(
            before.clone(),
            InboundMessage::SelectAbac(SelectAbac { id: "zzz".into() }),
        );
        assert_eq!(t.state, before);
        assert_eq!(
            t.response,
            Some(OutboundMessage::error("ABAC zzz not found"))
        );
    }

    #[test]
    fn test_next_abac_walks_index_then_compiles() {
        let mut state = indexed();
        let t = step(state, InboundMessage::NextAbac);
        assert_eq!(t.state.current_abac_id.as_deref(), Some("a"));
        state = t.state;
        let t = step(state, InboundMessage::NextAbac);
        assert_eq!(t.state.current_abac_id.as_deref(), Some("b"));
        state = t.state;
        let t = step(state, InboundMessage::NextAbac);
        assert_eq!(t.state.phase, Phase::Compile);
        assert!(matches!(t.response, Some(OutboundMessage::PerfModelCompiled(_))));
    }

    #[test]
    fn test_next_abac_restarts_when_current_is_not_indexed() {
        let state = ProtocolState {
            current_abac_id: Some("gone".into()),
            ..indexed()
        };
        let t = step(state, InboundMessage::NextAbac);
        assert_eq!(t.state.phase, Phase::Extraction);
        assert_eq!(t.state.current_abac_id.as_deref(), Some("a"));
        assert_eq!(t.response.map(|m| m.kind()), Some("REQUEST_INGEST"));
    }

    #[test]
    fn test_redo_forgets_current_abac() {
        let selected = step(
            indexed(),
            InboundMessage::SelectAbac(SelectAbac { id: "b".into() }),
        )
        .state;
        let t = step(selected, InboundMessage::RedoFromSource);
        assert_eq!(t.state.phase, Phase::Inventory);
        assert!(t.state.current_abac_id.is_none());

        let t = step(t.state, InboundMessage::NextAbac);
        assert_eq!(t.state.current_abac_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_failed_result_proposes_revised_tests() {
        let t = step(indexed(), InboundMessage::TestResult(failing_result("a")));
        let Some(OutboundMessage::AbacReviseProposal(p)) = t.response else {
            panic!("expected ABAC_REVISE_PROPOSAL");
        };
        assert_eq!(p.new_tests.len(), 1);
        assert_eq!(p.new_tests[0].name, "revised_test_corner_1");
        assert_eq!(p.new_tests[0].expected, 500.0);
        assert_eq!(p.new_tests[0].tol_abs, 30.0);
        assert_eq!(p.new_tests[0].tol_pct, 10.0);
        assert!(t.state.pending_revision.is_some());
    }

    #[test]
    fn test_passed_result_without_dataset_still_confirms() {
        let t = step(
            indexed(),
            InboundMessage::TestResult(TestResult::from_details("a", Vec::new())),
        );
        let Some(OutboundMessage::AbacSaveOk(ok)) = t.response else {
            panic!("expected ABAC_SAVE_OK");
        };
        assert_eq!(ok.checksum, checksum_of("a").expect("checksum"));
        assert_eq!(ok.action, "save");
    }

    #[test]
    fn test_finalize_fail_names_suspects() {
        let t = step(indexed(), InboundMessage::TestResult(failing_result("b")));
        let t = step(
            t.state,
            InboundMessage::Finalize(Finalize {
                status: TestStatus::Fail,
            }),
        );
        assert_eq!(t.state.phase, Phase::Finalize);
        assert_eq!(
            t.response,
            Some(OutboundMessage::PerfModelRepair(ModelRepair {
                hint: REPAIR_HINT.to_string(),
                suspected_abac_ids: vec!["b".to_string()],
            }))
        );
    }

    #[test]
    fn test_abort_is_terminal() {
        let t = step(indexed(), InboundMessage::Abort(Abort::default()));
        assert_eq!(
            t.response,
            Some(OutboundMessage::ProcessAborted(ProcessAborted {
                reason: "User abort".to_string()
            }))
        );
        let aborted = t.state.clone();
        let t = step(t.state, InboundMessage::Abort(Abort::default()));
        assert!(t.response.is_none());
        assert_eq!(t.state, aborted);
    }

    #[test]
    fn test_doc_meta_is_set_once() {
        let first = DocumentMeta {
            title: Some("first".into()),
            ..DocumentMeta::default()
        };
        let second = DocumentMeta {
            title: Some("second".into()),
            ..DocumentMeta::default()
        };
        let t = step(ProtocolState::default(), InboundMessage::DocMeta(first));
        assert!(t.response.is_none());
        let t = step(t.state, InboundMessage::DocMeta(second));
        assert_eq!(
            t.state.document_meta.and_then(|m| m.title).as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_handler_reset() {
        let mut handler = ProtocolHandler::default();
        handler.process(InboundMessage::Abort(Abort::default()));
        assert!(handler.state().is_aborted());
        assert!(handler.start().is_none());
        handler.reset();
        assert_eq!(handler.state(), &ProtocolState::default());
        assert!(handler.start().is_some());
    }
}
