//! The compiled performance model handed to downstream consumers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::dataset::{DataGap, ExtrapolationPolicy, InterpolationMethod};
use super::index::DocumentMeta;
use super::purpose::Purpose;

/// Summary of one dataset included in the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncludedAbac {
    pub id: String,
    pub purpose: Purpose,
    pub interpolation: InterpolationMethod,
}

/// A named, computable performance function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelFunction {
    pub inputs: Vec<String>,
    pub unit: String,
    pub source_abac_id: String,
    pub interpolation: InterpolationMethod,
    pub policy_out_of_domain: ExtrapolationPolicy,
    #[serde(default)]
    pub assumptions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompiledModel {
    pub meta: Option<DocumentMeta>,
    pub abacs_included: Vec<IncludedAbac>,
    /// Canonical function name to function definition, sorted by name.
    pub functions: BTreeMap<String, ModelFunction>,
    #[serde(default)]
    pub data_gaps: Vec<DataGap>,
    #[serde(default)]
    pub notes: Vec<String>,
}
