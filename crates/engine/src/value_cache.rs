//! Staged-value cache for interactive drags.
//!
//! While caching is on, staged values shadow stored values for the string and
//! numeric readers. Nothing is committed to storage by the cache; callers
//! write committed values through the normal mutators and then clear the
//! cache. Entries for removed cases or attributes are dropped immediately.

use rustc_hash::FxHashMap;

use caseset_core::{AttributeId, CaseId, Value};

use crate::case::CanonicalCase;
use crate::dataset::DataSet;

#[derive(Debug, Clone, Default)]
pub struct ValueCache {
    /// Nesting depth of begin/end caching calls
    depth: usize,
    entries: FxHashMap<CaseId, FxHashMap<AttributeId, Value>>,
}

impl ValueCache {
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, case_id: &CaseId, attribute_id: &AttributeId) -> Option<&Value> {
        self.entries.get(case_id)?.get(attribute_id)
    }

    fn stage(&mut self, case: &CanonicalCase) {
        let slot = self.entries.entry(case.id.clone()).or_default();
        for (attribute_id, value) in &case.values {
            slot.insert(attribute_id.clone(), value.clone());
        }
    }

    pub(crate) fn remove_case(&mut self, case_id: &CaseId) {
        self.entries.remove(case_id);
    }

    pub(crate) fn remove_attribute(&mut self, attribute_id: &AttributeId) {
        self.entries.retain(|_, values| {
            values.remove(attribute_id);
            !values.is_empty()
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl DataSet {
    /// Start (or nest) a caching session.
    pub fn begin_caching(&mut self) {
        self.cache.depth += 1;
    }

    /// Leave a caching session. Staged values stay until `clear_cache`.
    pub fn end_caching(&mut self) {
        self.cache.depth = self.cache.depth.saturating_sub(1);
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_active()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Stage values for one case. Unknown cases are ignored.
    pub fn cache_case_values(&mut self, case: &CanonicalCase) {
        if !self.contains_case(&case.id) {
            log::debug!("DataSet {}: not caching values for unknown case {}", self.id(), case.id);
            return;
        }
        self.cache.stage(case);
    }

    pub fn cache_cases_values(&mut self, cases: &[CanonicalCase]) {
        for case in cases {
            self.cache_case_values(case);
        }
    }

    pub fn value_cache(&self) -> &ValueCache {
        &self.cache
    }

    /// The value the readers see: staged while caching, else stored.
    fn effective_value(&self, index: usize, attribute_id: &AttributeId) -> Option<&Value> {
        if self.cache.is_active() {
            let staged = self
                .case_id_at(index)
                .and_then(|case_id| self.cache.get(case_id, attribute_id));
            if staged.is_some() {
                return staged;
            }
        }
        self.get_value_at_index(index, attribute_id)
    }

    /// String form at `index`; `""` when missing.
    pub fn get_str_value_at_index(&self, index: usize, attribute_id: &AttributeId) -> String {
        self.effective_value(index, attribute_id)
            .map(Value::to_text)
            .unwrap_or_default()
    }

    /// Finite numeric form at `index`, if any.
    pub fn get_numeric_at_index(&self, index: usize, attribute_id: &AttributeId) -> Option<f64> {
        self.effective_value(index, attribute_id)
            .and_then(Value::to_number)
    }
}
