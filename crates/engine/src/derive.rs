//! Derived data sets: attribute projection plus case filtering.
//!
//! A derived data set keeps the source's attribute ids and case ids. Its
//! contents are a point-in-time copy unless it is synchronized (see
//! `sync::derive`).

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use caseset_core::AttributeId;

use crate::case::{Case, InsertAt};
use crate::dataset::DataSet;

/// Keep, transform, or drop (`None`) a case.
pub type CaseFilter = Rc<dyn Fn(&Case) -> Option<Case>>;

/// How to derive a data set from a source.
#[derive(Clone, Default)]
pub struct DerivationSpec {
    /// Attributes to carry, in this order. `None` carries all of them and
    /// lets attributes added to the source later flow through.
    pub attribute_ids: Option<Vec<AttributeId>>,
    pub filter: Option<CaseFilter>,
    /// Keep the derived data set updated from the source.
    pub synchronize: bool,
}

impl DerivationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attributes(mut self, ids: Vec<AttributeId>) -> Self {
        self.attribute_ids = Some(ids);
        self
    }

    pub fn filter(mut self, filter: impl Fn(&Case) -> Option<Case> + 'static) -> Self {
        self.filter = Some(Rc::new(filter));
        self
    }

    pub fn synchronized(mut self) -> Self {
        self.synchronize = true;
        self
    }

    /// Run the filter on `case`. A panicking filter excludes the case.
    /// The result always keeps the source case id.
    pub fn admit(&self, case: Case) -> Option<Case> {
        let id = case.id.clone();
        let admitted = match &self.filter {
            None => Some(case),
            Some(filter) => match catch_unwind(AssertUnwindSafe(|| filter(&case))) {
                Ok(result) => result,
                Err(_) => {
                    log::warn!("Derivation filter panicked on case {}; excluding it", id);
                    None
                }
            },
        };
        admitted.map(|mut case| {
            case.id = id;
            case
        })
    }
}

impl std::fmt::Debug for DerivationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationSpec")
            .field("attribute_ids", &self.attribute_ids)
            .field("filter", &self.filter.is_some())
            .field("synchronize", &self.synchronize)
            .finish()
    }
}

impl DataSet {
    /// Point-in-time derived copy. The name defaults to the source's.
    ///
    /// Unknown attribute ids in the projection are skipped. Cases keep
    /// source order. `spec.synchronize` is ignored here.
    pub fn derive(&self, name: Option<&str>, spec: &DerivationSpec) -> DataSet {
        let name = name.or(self.name()).map(str::to_string);
        let mut derived = DataSet::with_config(name, self.config());
        derived.set_source_id(Some(self.id().clone()));

        let attributes: Vec<_> = match &spec.attribute_ids {
            Some(ids) => ids.iter().filter_map(|id| self.attribute(id)).collect(),
            None => self.attributes().iter().collect(),
        };
        for attribute in attributes {
            derived.add_attribute_with_id(attribute.derive(None), None);
        }

        let cases: Vec<Case> = self
            .case_ids()
            .iter()
            .filter_map(|id| self.get_case(id))
            .filter_map(|case| spec.admit(case))
            .collect();
        derived.add_cases_with_ids(cases, InsertAt::End);
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeSpec;
    use caseset_core::{CaseId, Value};

    fn source() -> DataSet {
        let mut data_set = DataSet::new("source");
        data_set.add_attribute(AttributeSpec::named("str").with_id("S"), None);
        data_set.add_attribute(AttributeSpec::named("num").with_id("N"), None);
        data_set.add_cases_with_ids(
            (1..=5)
                .map(|n| Case::new(n.to_string()).with("str", format!("s{}", n)).with("num", n))
                .collect(),
            InsertAt::End,
        );
        data_set
    }

    fn is_odd(case: &Case) -> Option<Case> {
        let n = case.get("num").and_then(Value::to_number)?;
        (n as i64 % 2 == 1).then(|| case.clone())
    }

    #[test]
    fn test_derive_projects_and_filters() {
        let source = source();
        let spec = DerivationSpec::new().attributes(vec!["N".into(), "missing".into()]).filter(is_odd);
        let derived = source.derive(Some("odds"), &spec);

        assert_eq!(derived.name(), Some("odds"));
        assert_eq!(derived.source_id(), Some(source.id()));
        assert_eq!(derived.attribute_count(), 1);
        assert_eq!(derived.attribute_id_at(0), Some(&AttributeId::from("N")));
        let order: Vec<&str> = derived.case_ids().iter().map(|id| id.as_str()).collect();
        assert_eq!(order, vec!["1", "3", "5"]);
        assert_eq!(derived.get_value(&CaseId::from("3"), &"N".into()), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_derive_defaults_name_and_attributes() {
        let source = source();
        let derived = source.derive(None, &DerivationSpec::new());
        assert_eq!(derived.name(), Some("source"));
        assert_eq!(derived.attribute_count(), 2);
        assert_eq!(derived.case_count(), 5);
        assert_ne!(derived.id(), source.id());
    }

    #[test]
    fn test_panicking_filter_excludes_case() {
        let source = source();
        let spec = DerivationSpec::new().filter(|case| {
            if case.id.as_str() == "2" {
                panic!("bad case");
            }
            Some(case.clone())
        });
        let derived = source.derive(None, &spec);
        assert_eq!(derived.case_count(), 4);
        assert!(!derived.contains_case(&CaseId::from("2")));
    }

    #[test]
    fn test_filter_cannot_change_case_id() {
        let source = source();
        let spec = DerivationSpec::new().filter(|case| Some(Case::new("other").with("num", case.get("num").cloned().unwrap_or_default())));
        let derived = source.derive(None, &spec);
        assert!(derived.contains_case(&CaseId::from("1")));
        assert!(!derived.contains_case(&CaseId::from("other")));
    }
}
