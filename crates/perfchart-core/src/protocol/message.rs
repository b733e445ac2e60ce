//! Protocol messages.
//!
//! Both directions travel as a `{type, data}` envelope. Inbound tags carry an
//! `APP_` prefix; outbound tags do not.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::adjustment::AdjustmentProposal;
use crate::domain::dataset::InterpolationMethod;
use crate::domain::error::ProtocolError;
use crate::domain::index::{AbacIndex, DocumentMeta};
use crate::domain::model::CompiledModel;
use crate::domain::testing::{TestCase, TestResult, TestStatus};
use crate::ingest::PageExtract;

// ============================================================================
// WIRE ENVELOPE
// ============================================================================

/// Raw tagged message as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

// ============================================================================
// INBOUND
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchExtract {
    #[serde(default)]
    pub pages: Vec<PageExtract>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectAbac {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finalize {
    pub status: TestStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Abort {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Messages from the digitization collaborator or the driving UI.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    DocMeta(DocumentMeta),
    PageExtract(PageExtract),
    BatchExtract(BatchExtract),
    SelectAbac(SelectAbac),
    TestResult(TestResult),
    AcceptRevise,
    RedoFromSource,
    NextAbac,
    Compile,
    Finalize(Finalize),
    Abort(Abort),
}

impl InboundMessage {
    /// Wire tag of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DocMeta(_) => "APP_DOC_META",
            Self::PageExtract(_) => "APP_PAGE_EXTRACT",
            Self::BatchExtract(_) => "APP_BATCH_EXTRACT",
            Self::SelectAbac(_) => "APP_SELECT_ABAC",
            Self::TestResult(_) => "APP_TEST_RESULT",
            Self::AcceptRevise => "APP_ACCEPT_REVISE",
            Self::RedoFromSource => "APP_REDO_FROM_SOURCE",
            Self::NextAbac => "APP_NEXT_ABAC",
            Self::Compile => "APP_COMPILE",
            Self::Finalize(_) => "APP_FINALIZE",
            Self::Abort(_) => "APP_ABORT",
        }
    }

    /// Decode an envelope. Payloads of data-less messages are ignored.
    pub fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        let Envelope { kind, data } = envelope;
        let msg = match kind.as_str() {
            "APP_DOC_META" => Self::DocMeta(payload(&kind, data)?),
            "APP_PAGE_EXTRACT" => Self::PageExtract(payload(&kind, data)?),
            "APP_BATCH_EXTRACT" => Self::BatchExtract(payload(&kind, data)?),
            "APP_SELECT_ABAC" => Self::SelectAbac(payload(&kind, data)?),
            "APP_TEST_RESULT" => Self::TestResult(payload(&kind, data)?),
            "APP_ACCEPT_REVISE" => Self::AcceptRevise,
            "APP_REDO_FROM_SOURCE" => Self::RedoFromSource,
            "APP_NEXT_ABAC" => Self::NextAbac,
            "APP_COMPILE" => Self::Compile,
            "APP_FINALIZE" => Self::Finalize(payload(&kind, data)?),
            "APP_ABORT" => Self::Abort(if data.is_null() {
                Abort::default()
            } else {
                payload(&kind, data)?
            }),
            _ => return Err(ProtocolError::UnknownMessageType(kind)),
        };
        Ok(msg)
    }
}

fn payload<T: serde::de::DeserializeOwned>(kind: &str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|e| ProtocolError::MalformedPayload {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// OUTBOUND
// ============================================================================

/// Pages to digitize: a named manual section or explicit page numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageSelection {
    Section(String),
    Pages(Vec<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestNeed {
    Tables,
    Abacs,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detail {
    Minimal,
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestIngest {
    pub pages: PageSelection,
    pub need: IngestNeed,
    pub detail: Detail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abac_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbacTest {
    pub id: String,
    pub method: String,
    pub interpolation: InterpolationMethod,
    pub cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbacSaveOk {
    pub id: String,
    pub action: String,
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviseProposal {
    pub id: String,
    pub reason: String,
    pub adjustment_plan: Vec<AdjustmentProposal>,
    pub new_tests: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSaveOk {
    pub file: String,
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRepair {
    pub hint: String,
    pub suspected_abac_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessAborted {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// Messages emitted by the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    RequestIngest(RequestIngest),
    AbacIndex(AbacIndex),
    AbacTest(AbacTest),
    AbacSaveOk(AbacSaveOk),
    AbacReviseProposal(ReviseProposal),
    PerfModelCompiled(CompiledModel),
    PerfModelSaveOk(ModelSaveOk),
    PerfModelRepair(ModelRepair),
    ProcessAborted(ProcessAborted),
    Error(ErrorMessage),
}

impl OutboundMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorMessage {
            message: message.into(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestIngest(_) => "REQUEST_INGEST",
            Self::AbacIndex(_) => "ABAC_INDEX",
            Self::AbacTest(_) => "ABAC_TEST",
            Self::AbacSaveOk(_) => "ABAC_SAVE_OK",
            Self::AbacReviseProposal(_) => "ABAC_REVISE_PROPOSAL",
            Self::PerfModelCompiled(_) => "PERF_MODEL_COMPILED",
            Self::PerfModelSaveOk(_) => "PERF_MODEL_SAVE_OK",
            Self::PerfModelRepair(_) => "PERF_MODEL_REPAIR",
            Self::ProcessAborted(_) => "PROCESS_ABORTED",
            Self::Error(_) => "ERROR",
        }
    }
}
