//! Document metadata and the inventory of charts discovered in it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::purpose::Purpose;

/// Identifies the source manual. Captured once, during inventory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aircraft: Option<String>,
    /// Any further fields supplied by the digitization collaborator.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One candidate performance chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbacIndexEntry {
    pub id: String,
    pub title: String,
    pub purpose: Purpose,
    pub pages: Vec<u32>,
    pub source_fig_ids: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Inventory of charts, in discovery order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AbacIndex {
    pub meta: Option<DocumentMeta>,
    pub abacs: Vec<AbacIndexEntry>,
}

impl AbacIndex {
    pub fn find(&self, id: &str) -> Option<&AbacIndexEntry> {
        self.abacs.iter().find(|a| a.id == id)
    }

    /// Position of `id` in discovery order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.abacs.iter().position(|a| a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_meta_keeps_unknown_fields() {
        let json = serde_json::json!({"title": "POH DR400", "revision": "7", "lang": "fr"});
        let meta: DocumentMeta = serde_json::from_value(json.clone()).expect("deserialize");
        assert_eq!(meta.title.as_deref(), Some("POH DR400"));
        assert_eq!(meta.extra.get("lang"), Some(&serde_json::json!("fr")));
        assert_eq!(serde_json::to_value(&meta).expect("serialize"), json);
    }

    #[test]
    fn test_index_lookup_by_id() {
        let index = AbacIndex {
            meta: None,
            abacs: vec![
                AbacIndexEntry {
                    id: "a".into(),
                    title: "Takeoff".into(),
                    purpose: Purpose::DistanceToObstacle,
                    pages: vec![4],
                    source_fig_ids: vec!["fig-1".into()],
                    notes: None,
                },
                AbacIndexEntry {
                    id: "b".into(),
                    title: "Landing".into(),
                    purpose: Purpose::LandingDistance,
                    pages: vec![5],
                    source_fig_ids: vec!["fig-2".into()],
                    notes: None,
                },
            ],
        };
        assert_eq!(index.position("b"), Some(1));
        assert_eq!(index.find("a").map(|e| e.pages.clone()), Some(vec![4]));
        assert!(index.find("zzz").is_none());
    }
}
