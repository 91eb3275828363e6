//! Serializable data set snapshots.
//!
//! A snapshot carries identity, attributes (with their values), and the
//! ordered case ids. Selection and the value cache are volatile and never
//! serialized; loading a snapshot starts them empty.

use serde::{Deserialize, Serialize};

use caseset_core::{CaseId, DataSetId};

use crate::attribute::Attribute;
use crate::config::DataSetConfig;
use crate::dataset::DataSet;
use crate::events::Mutation;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DataSetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<DataSetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Case ids in order; attribute values are aligned to this list.
    #[serde(default)]
    pub cases: Vec<CaseId>,
}

impl DataSetSnapshot {
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize snapshot: {}", e))
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Failed to parse snapshot: {}", e))
    }
}

impl DataSet {
    pub fn snapshot(&self) -> DataSetSnapshot {
        DataSetSnapshot {
            id: Some(self.id().clone()),
            source_id: self.source_id().cloned(),
            name: self.name().map(str::to_string),
            attributes: self.attributes().to_vec(),
            cases: self.case_ids().to_vec(),
        }
    }

    /// Build a data set from a snapshot. A snapshot without an id gets a
    /// fresh one. Attribute values are padded or truncated to the case count.
    pub fn from_snapshot(snapshot: DataSetSnapshot, config: DataSetConfig) -> DataSet {
        let mut data_set = DataSet::with_config(snapshot.name, config);
        if let Some(id) = snapshot.id.filter(|id| !id.is_empty()) {
            data_set.set_id(id);
        }
        data_set.set_source_id(snapshot.source_id);
        data_set.load(snapshot.attributes, snapshot.cases);
        data_set
    }

    /// Replace attributes and cases in place, keeping this data set's
    /// identity and listeners. Selection and the value cache are reset.
    /// The name is replaced only when the snapshot carries one.
    pub fn apply_snapshot(&mut self, snapshot: DataSetSnapshot) {
        if snapshot.name.is_some() {
            self.rename(snapshot.name.clone());
        }
        self.load(snapshot.attributes.clone(), snapshot.cases.clone());
        self.notify(Mutation::SnapshotApplied { snapshot });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeSpec;
    use crate::case::{Case, InsertAt};
    use caseset_core::Value;

    fn sample() -> DataSet {
        let mut data_set = DataSet::new("data");
        data_set.add_attribute(AttributeSpec::named("a").with_id("attrA"), None);
        data_set.add_cases_with_ids(
            vec![Case::new("1").with("a", 1), Case::new("2").with("a", "x")],
            InsertAt::End,
        );
        data_set
    }

    #[test]
    fn test_snapshot_roundtrip_through_json() {
        let mut original = sample();
        original.select_all_cases();
        let json = original.snapshot().to_json().unwrap();
        let restored = DataSet::from_snapshot(DataSetSnapshot::from_json(&json).unwrap(), DataSetConfig::default());

        assert_eq!(restored.id(), original.id());
        assert_eq!(restored.name(), Some("data"));
        assert_eq!(restored.case_ids(), original.case_ids());
        assert_eq!(
            restored.get_value(&CaseId::from("2"), &"attrA".into()),
            Some(&Value::from("x"))
        );
        assert!(!restored.is_case_selected(&CaseId::from("1")));
    }

    #[test]
    fn test_snapshot_pads_short_columns() {
        let json = r#"{
            "name": "short",
            "attributes": [{ "id": "A", "name": "a", "values": [1] }],
            "cases": ["1", "2", "3"]
        }"#;
        let data_set = DataSet::from_snapshot(DataSetSnapshot::from_json(json).unwrap(), DataSetConfig::default());
        assert_eq!(data_set.attribute(&"A".into()).unwrap().len(), 3);
        assert_eq!(data_set.get_value(&CaseId::from("3"), &"A".into()), Some(&Value::Empty));
        assert!(!data_set.id().is_empty());
    }

    #[test]
    fn test_apply_snapshot_keeps_identity() {
        let mut target = DataSet::new("target");
        let id = target.id().clone();
        target.apply_snapshot(sample().snapshot());
        assert_eq!(target.id(), &id);
        assert_eq!(target.case_count(), 2);
        assert_eq!(target.name(), Some("data"));

        let mut nameless = sample().snapshot();
        nameless.name = None;
        target.apply_snapshot(nameless);
        assert_eq!(target.name(), Some("data"));
    }

    #[test]
    fn test_invalid_json_reports_error() {
        let err = DataSetSnapshot::from_json("{ not json").unwrap_err();
        assert!(err.starts_with("Failed to parse snapshot"));
    }
}
