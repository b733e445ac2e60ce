//! Assembly of saved datasets into the performance model.

use crate::domain::dataset::{AbacDataset, AxisName, DataGap};
use crate::domain::index::DocumentMeta;
use crate::domain::model::{CompiledModel, IncludedAbac, ModelFunction};
use crate::domain::purpose::{EXPECTED_PURPOSES, UNKNOWN_FUNCTION};

/// Build the model from `datasets`. Deterministic: the same inputs always
/// yield the same `functions` map.
///
/// When two datasets share a purpose, the later one defines the function.
pub fn compile_model(meta: Option<&DocumentMeta>, datasets: &[AbacDataset]) -> CompiledModel {
    let mut model = CompiledModel {
        meta: meta.cloned(),
        ..CompiledModel::default()
    };

    let inputs: Vec<String> = AxisName::ALL.iter().map(|a| a.as_str().to_string()).collect();
    for ds in datasets {
        let purpose = ds.purpose();
        model.abacs_included.push(IncludedAbac {
            id: ds.id.clone(),
            purpose,
            interpolation: ds.interpolation.method,
        });

        let name = purpose.function_name();
        if name == UNKNOWN_FUNCTION {
            model
                .notes
                .push(format!("abac {} has no canonical function ({purpose})", ds.id));
        }
        if let Some(prev) = model.functions.get(name) {
            model.notes.push(format!(
                "{name}: abac {} supersedes {}",
                ds.id, prev.source_abac_id
            ));
        }
        model.functions.insert(
            name.to_string(),
            ModelFunction {
                inputs: inputs.clone(),
                unit: purpose.unit().to_string(),
                source_abac_id: ds.id.clone(),
                interpolation: ds.interpolation.method,
                policy_out_of_domain: ds.interpolation.extrapolation_policy,
                assumptions: ds.conditions_defaults.assumptions.clone(),
            },
        );
    }

    model.data_gaps = identify_data_gaps(datasets);
    model
}

/// Expected purposes no dataset covers.
pub fn identify_data_gaps(datasets: &[AbacDataset]) -> Vec<DataGap> {
    EXPECTED_PURPOSES
        .iter()
        .filter(|&&p| !datasets.iter().any(|d| d.purpose() == p))
        .map(|p| DataGap {
            item: p.as_str().to_string(),
            reason: "No data extracted for this performance type".to_string(),
        })
        .collect()
}
