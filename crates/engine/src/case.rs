//! Row projections and insertion points.
//!
//! A `Case` is keyed by attribute name, a `CanonicalCase` by attribute id.
//! Both are views of the same stored row; neither is stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use caseset_core::{AttributeId, CaseId, Value};

/// Name-keyed row. Serializes as `{"__id__": ..., "<name>": value, ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Case {
    #[serde(rename = "__id__", default)]
    pub id: CaseId,
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl Case {
    pub fn new(id: impl Into<CaseId>) -> Self {
        Self {
            id: id.into(),
            values: BTreeMap::new(),
        }
    }

    /// A case with no id yet; `DataSet::add_cases` assigns one.
    pub fn unidentified() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Id-keyed row. Serializes as `{"__id__": ..., "<attr id>": value, ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCase {
    #[serde(rename = "__id__", default)]
    pub id: CaseId,
    #[serde(flatten)]
    pub values: BTreeMap<AttributeId, Value>,
}

impl CanonicalCase {
    pub fn new(id: impl Into<CaseId>) -> Self {
        Self {
            id: id.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, attribute_id: impl Into<AttributeId>, value: impl Into<Value>) -> Self {
        self.values.insert(attribute_id.into(), value.into());
        self
    }

    pub fn get(&self, attribute_id: &AttributeId) -> Option<&Value> {
        self.values.get(attribute_id)
    }
}

/// Where a batch of new cases goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertAt {
    /// Append in order.
    #[default]
    End,
    /// Every case goes before this id.
    Before(CaseId),
    /// One insertion point per case (`None` appends that case).
    PerCase(Vec<Option<CaseId>>),
}

impl InsertAt {
    /// Insertion point for the `index`th case of the batch.
    pub fn for_case(&self, index: usize) -> Option<&CaseId> {
        match self {
            InsertAt::End => None,
            InsertAt::Before(id) => Some(id),
            InsertAt::PerCase(ids) => ids.get(index).and_then(Option::as_ref),
        }
        .filter(|id| !id.is_empty())
    }
}

impl From<CaseId> for InsertAt {
    fn from(id: CaseId) -> Self {
        InsertAt::Before(id)
    }
}

impl From<Option<CaseId>> for InsertAt {
    fn from(id: Option<CaseId>) -> Self {
        id.map_or(InsertAt::End, InsertAt::Before)
    }
}

impl From<Vec<CaseId>> for InsertAt {
    fn from(ids: Vec<CaseId>) -> Self {
        InsertAt::PerCase(ids.into_iter().map(Some).collect())
    }
}
