//! The data set: ordered attributes over ordered cases.
//!
//! Storage is column-oriented. Each `Attribute` owns one value per case, and
//! `CaseIndex` maps case ids to positions. Every structural change is applied
//! to the index and to every attribute together, so for all attributes
//! `values.len() == case_count()` and `values[case_index(id)]` is that case's
//! value.
//!
//! Each public mutator applies its change, then notifies action listeners
//! with the post-state and the `Mutation` describing the change.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use caseset_core::{AttributeId, CaseId, DataSetId, Selection, Value};

use crate::attribute::{Attribute, AttributeSpec};
use crate::case::{CanonicalCase, Case, InsertAt};
use crate::case_index::CaseIndex;
use crate::config::DataSetConfig;
use crate::events::{ActionListeners, Mutation, RetiredListeners};
use crate::sync::SyncLink;
use crate::value_cache::ValueCache;

/// A data set shared between a UI owner and synchronization tasks.
pub type SharedDataSet = Rc<RefCell<DataSet>>;

/// Min/max of the finite numeric values of one attribute. With no such
/// values, `min` is `+inf` and `max` is `-inf`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const EMPTY: Bounds = Bounds {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    fn include(self, n: f64) -> Bounds {
        Bounds {
            min: self.min.min(n),
            max: self.max.max(n),
        }
    }
}

pub struct DataSet {
    id: DataSetId,
    source_id: Option<DataSetId>,
    name: Option<String>,
    config: DataSetConfig,

    attributes: Vec<Attribute>,
    attr_positions: FxHashMap<AttributeId, usize>,
    attr_names: FxHashMap<String, AttributeId>,

    cases: CaseIndex,
    transaction_count: usize,

    pub(crate) selection: Selection,
    pub(crate) cache: ValueCache,
    listeners: ActionListeners,
    /// Set on a synchronized derived data set.
    pub(crate) sync: Option<SyncLink>,
}

impl DataSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(Some(name.into()), DataSetConfig::default())
    }

    pub fn with_config(name: Option<String>, config: DataSetConfig) -> Self {
        Self {
            id: DataSetId::new(),
            source_id: None,
            name,
            config,
            attributes: Vec::new(),
            attr_positions: FxHashMap::default(),
            attr_names: FxHashMap::default(),
            cases: CaseIndex::new(),
            transaction_count: 0,
            selection: Selection::new(config.selection),
            cache: ValueCache::default(),
            listeners: ActionListeners::new(),
            sync: None,
        }
    }

    pub fn into_shared(self) -> SharedDataSet {
        Rc::new(RefCell::new(self))
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &DataSetId {
        &self.id
    }

    /// Id of the data set this one was derived from.
    pub fn source_id(&self) -> Option<&DataSetId> {
        self.source_id.as_ref()
    }

    pub(crate) fn set_source_id(&mut self, source_id: Option<DataSetId>) {
        self.source_id = source_id;
    }

    pub(crate) fn set_id(&mut self, id: DataSetId) {
        self.id = id;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn config(&self) -> DataSetConfig {
        self.config
    }

    /// Replace the name without notifying.
    pub(crate) fn rename(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name.clone();
        self.notify(Mutation::SetName { name });
    }

    // -------------------------------------------------------------------------
    // Attribute reads
    // -------------------------------------------------------------------------

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute(&self, id: &AttributeId) -> Option<&Attribute> {
        self.attribute_index(id).map(|i| &self.attributes[i])
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attr_names.get(name).and_then(|id| self.attribute(id))
    }

    pub fn attribute_index(&self, id: &AttributeId) -> Option<usize> {
        self.attr_positions.get(id).copied()
    }

    pub fn attribute_id_at(&self, index: usize) -> Option<&AttributeId> {
        self.attributes.get(index).map(Attribute::id)
    }

    fn attribute_mut(&mut self, id: &AttributeId) -> Option<&mut Attribute> {
        let index = self.attribute_index(id)?;
        self.attributes.get_mut(index)
    }

    /// Positions and names are rebuilt in order, so among duplicate names
    /// the rightmost attribute wins name lookups.
    fn rebuild_attribute_maps(&mut self) {
        self.attr_positions.clear();
        self.attr_names.clear();
        for (i, attribute) in self.attributes.iter().enumerate() {
            self.attr_positions.insert(attribute.id().clone(), i);
            self.attr_names
                .insert(attribute.name().to_string(), attribute.id().clone());
        }
    }

    // -------------------------------------------------------------------------
    // Attribute mutators
    // -------------------------------------------------------------------------

    /// Add `attribute` before `before_id` (appended when absent or unknown).
    /// Values are padded or truncated to the current case count.
    /// Returns `None`, changing nothing, if the id is already in use.
    pub fn add_attribute_with_id(
        &mut self,
        mut attribute: Attribute,
        before_id: Option<&AttributeId>,
    ) -> Option<&Attribute> {
        if attribute.id().is_empty() || self.attr_positions.contains_key(attribute.id()) {
            log::debug!(
                "DataSet {}: attribute id '{}' rejected",
                self.id,
                attribute.id()
            );
            return None;
        }
        attribute.resize(self.cases.len());
        let index = before_id
            .and_then(|id| self.attribute_index(id))
            .unwrap_or(self.attributes.len());
        let id = attribute.id().clone();
        self.attributes.insert(index, attribute.clone());
        self.rebuild_attribute_maps();
        self.notify(Mutation::AddAttribute {
            attribute,
            before_id: before_id.cloned(),
        });
        self.attribute(&id)
    }

    /// Like `add_attribute_with_id`, assigning an id when the spec has none.
    pub fn add_attribute(
        &mut self,
        spec: AttributeSpec,
        before_id: Option<&AttributeId>,
    ) -> Option<&Attribute> {
        self.add_attribute_with_id(spec.into(), before_id)
    }

    pub fn set_attribute_name(&mut self, id: &AttributeId, name: impl Into<String>) {
        let name = name.into();
        let Some(attribute) = self.attribute_mut(id) else {
            return;
        };
        attribute.set_name(name.clone());
        self.rebuild_attribute_maps();
        self.notify(Mutation::SetAttributeName {
            attribute_id: id.clone(),
            name,
        });
    }

    pub fn set_attribute_units(&mut self, id: &AttributeId, units: impl Into<String>) {
        let units = units.into();
        let Some(attribute) = self.attribute_mut(id) else {
            return;
        };
        attribute.set_units(units.clone());
        self.notify(Mutation::SetAttributeUnits {
            attribute_id: id.clone(),
            units,
        });
    }

    pub fn set_attribute_precision(&mut self, id: &AttributeId, precision: Option<u8>) {
        let Some(attribute) = self.attribute_mut(id) else {
            return;
        };
        attribute.set_precision(precision);
        self.notify(Mutation::SetAttributePrecision {
            attribute_id: id.clone(),
            precision,
        });
    }

    pub fn set_attribute_formula(&mut self, id: &AttributeId, formula: Option<String>) {
        let Some(attribute) = self.attribute_mut(id) else {
            return;
        };
        attribute.set_formula(formula.clone());
        self.notify(Mutation::SetAttributeFormula {
            attribute_id: id.clone(),
            formula,
        });
    }

    /// No-op for an unknown id.
    pub fn remove_attribute(&mut self, id: &AttributeId) -> Option<Attribute> {
        let index = self.attribute_index(id)?;
        let removed = self.attributes.remove(index);
        self.rebuild_attribute_maps();
        self.selection.retain_attributes(|a| a != id);
        self.cache.remove_attribute(id);
        self.notify(Mutation::RemoveAttribute {
            attribute_id: id.clone(),
        });
        Some(removed)
    }

    /// Move `id` before `before_id`, or to the end when `before_id` is
    /// absent or unknown.
    pub fn move_attribute(&mut self, id: &AttributeId, before_id: Option<&AttributeId>) {
        let Some(from) = self.attribute_index(id) else {
            return;
        };
        let attribute = self.attributes.remove(from);
        self.rebuild_attribute_maps();
        let to = before_id
            .and_then(|b| self.attribute_index(b))
            .unwrap_or(self.attributes.len());
        self.attributes.insert(to, attribute);
        self.rebuild_attribute_maps();
        self.notify(Mutation::MoveAttribute {
            attribute_id: id.clone(),
            before_id: before_id.cloned(),
        });
    }

    // -------------------------------------------------------------------------
    // Case reads
    // -------------------------------------------------------------------------

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    pub fn case_ids(&self) -> &[CaseId] {
        self.cases.ids()
    }

    pub fn contains_case(&self, id: &CaseId) -> bool {
        self.cases.contains(id)
    }

    pub fn case_index(&self, id: &CaseId) -> Option<usize> {
        self.cases.position(id)
    }

    pub fn case_id_at(&self, index: usize) -> Option<&CaseId> {
        self.cases.id_at(index)
    }

    /// The id of the case that follows `id` in order.
    pub fn next_case_id(&self, id: &CaseId) -> Option<&CaseId> {
        self.cases.next(id)
    }

    pub fn get_case(&self, id: &CaseId) -> Option<Case> {
        self.case_index(id).map(|index| self.case_at(index))
    }

    /// Unknown ids are skipped.
    pub fn get_cases(&self, ids: &[CaseId]) -> Vec<Case> {
        ids.iter().filter_map(|id| self.get_case(id)).collect()
    }

    pub fn get_case_at_index(&self, index: usize) -> Option<Case> {
        (index < self.cases.len()).then(|| self.case_at(index))
    }

    /// Cases from `start`, at most `count` of them (all remaining when `None`).
    pub fn get_cases_at_indices(&self, start: usize, count: Option<usize>) -> Vec<Case> {
        self.index_range(start, count)
            .map(|index| self.case_at(index))
            .collect()
    }

    pub fn get_canonical_case(&self, id: &CaseId) -> Option<CanonicalCase> {
        self.case_index(id).map(|index| self.canonical_case_at(index))
    }

    pub fn get_canonical_cases(&self, ids: &[CaseId]) -> Vec<CanonicalCase> {
        ids.iter()
            .filter_map(|id| self.get_canonical_case(id))
            .collect()
    }

    pub fn get_canonical_case_at_index(&self, index: usize) -> Option<CanonicalCase> {
        (index < self.cases.len()).then(|| self.canonical_case_at(index))
    }

    pub fn get_canonical_cases_at_indices(
        &self,
        start: usize,
        count: Option<usize>,
    ) -> Vec<CanonicalCase> {
        self.index_range(start, count)
            .map(|index| self.canonical_case_at(index))
            .collect()
    }

    pub fn get_value(&self, case_id: &CaseId, attribute_id: &AttributeId) -> Option<&Value> {
        let index = self.case_index(case_id)?;
        self.get_value_at_index(index, attribute_id)
    }

    pub fn get_value_at_index(&self, index: usize, attribute_id: &AttributeId) -> Option<&Value> {
        self.attribute(attribute_id)?.value(index)
    }

    fn index_range(&self, start: usize, count: Option<usize>) -> std::ops::Range<usize> {
        let len = self.cases.len();
        let start = start.min(len);
        let end = count.map_or(len, |c| start.saturating_add(c).min(len));
        start..end
    }

    fn case_at(&self, index: usize) -> Case {
        let mut case = Case::new(self.cases.id_at(index).cloned().unwrap_or_default());
        for attribute in &self.attributes {
            case.values.insert(
                attribute.name().to_string(),
                attribute.value(index).cloned().unwrap_or_default(),
            );
        }
        case
    }

    fn canonical_case_at(&self, index: usize) -> CanonicalCase {
        let mut case = CanonicalCase::new(self.cases.id_at(index).cloned().unwrap_or_default());
        for attribute in &self.attributes {
            case.values.insert(
                attribute.id().clone(),
                attribute.value(index).cloned().unwrap_or_default(),
            );
        }
        case
    }

    /// Re-key a name-keyed case by attribute id. Unknown names are dropped.
    pub fn to_canonical(&self, case: &Case) -> CanonicalCase {
        let mut canonical = CanonicalCase::new(case.id.clone());
        for (name, value) in &case.values {
            if let Some(id) = self.attr_names.get(name) {
                canonical.values.insert(id.clone(), value.clone());
            }
        }
        canonical
    }

    // -------------------------------------------------------------------------
    // Case mutators
    // -------------------------------------------------------------------------

    /// Insert cases that carry their own ids.
    ///
    /// Cases with an empty or already-present id are skipped. Insertion
    /// points must name cases that existed before this call; anything else
    /// appends. Missing attribute values are stored empty.
    pub fn add_cases_with_ids(&mut self, cases: Vec<Case>, at: InsertAt) {
        let canonical: Vec<CanonicalCase> = cases.iter().map(|c| self.to_canonical(c)).collect();
        let accepted = self.insert_cases(&canonical, &at);
        if accepted.is_empty() {
            return;
        }
        let at = used_insert_at(&at, &accepted);
        let cases = select_indices(cases, &accepted);
        self.notify(Mutation::AddCases { cases, at });
    }

    pub fn add_canonical_cases_with_ids(&mut self, cases: Vec<CanonicalCase>, at: InsertAt) {
        let accepted = self.insert_cases(&cases, &at);
        if accepted.is_empty() {
            return;
        }
        let at = used_insert_at(&at, &accepted);
        let cases = select_indices(cases, &accepted);
        self.notify(Mutation::AddCanonicalCases { cases, at });
    }

    /// Assign fresh ids to cases without one, insert, and return every id.
    pub fn add_cases(&mut self, mut cases: Vec<Case>, at: InsertAt) -> Vec<CaseId> {
        for case in cases.iter_mut().filter(|c| c.id.is_empty()) {
            case.id = CaseId::new();
        }
        let ids = cases.iter().map(|c| c.id.clone()).collect();
        self.add_cases_with_ids(cases, at);
        ids
    }

    pub fn add_canonical_cases(&mut self, mut cases: Vec<CanonicalCase>, at: InsertAt) -> Vec<CaseId> {
        for case in cases.iter_mut().filter(|c| c.id.is_empty()) {
            case.id = CaseId::new();
        }
        let ids = cases.iter().map(|c| c.id.clone()).collect();
        self.add_canonical_cases_with_ids(cases, at);
        ids
    }

    /// Returns the batch position and resolved insertion point of every
    /// case actually inserted.
    fn insert_cases(&mut self, cases: &[CanonicalCase], at: &InsertAt) -> Vec<(usize, Option<CaseId>)> {
        let batch: FxHashSet<&CaseId> = cases.iter().map(|c| &c.id).collect();
        // Anchors are checked against the pre-call state.
        let anchors: Vec<Option<CaseId>> = (0..cases.len())
            .map(|i| {
                at.for_case(i)
                    .filter(|id| self.cases.contains(id) && !batch.contains(id))
                    .cloned()
            })
            .collect();

        let mut accepted = Vec::with_capacity(cases.len());
        for (i, (case, anchor)) in cases.iter().zip(anchors).enumerate() {
            if case.id.is_empty() {
                log::debug!("DataSet {}: skipping case without an id", self.id);
                continue;
            }
            let before_index = anchor.as_ref().and_then(|id| self.cases.position(id));
            let Some(index) = self.cases.insert(case.id.clone(), before_index) else {
                log::debug!("DataSet {}: case '{}' already present", self.id, case.id);
                continue;
            };
            for attribute in &mut self.attributes {
                let value = case.values.get(attribute.id()).cloned().unwrap_or_default();
                attribute.add_value(value, Some(index));
            }
            accepted.push((i, anchor));
        }
        accepted
    }

    /// Update values by attribute name. Unknown cases and names are ignored.
    pub fn set_case_values(&mut self, cases: Vec<Case>) {
        for case in &cases {
            let Some(index) = self.case_index(&case.id) else {
                continue;
            };
            for (name, value) in &case.values {
                if let Some(position) = self.attr_names.get(name).and_then(|id| self.attr_positions.get(id)) {
                    self.attributes[*position].set_value(index, value.clone());
                }
            }
        }
        self.notify(Mutation::SetCaseValues { cases });
    }

    /// Update values by attribute id. Unknown cases and ids are ignored.
    pub fn set_canonical_case_values(&mut self, cases: Vec<CanonicalCase>) {
        for case in &cases {
            let Some(index) = self.case_index(&case.id) else {
                continue;
            };
            for (id, value) in &case.values {
                if let Some(attribute) = self.attribute_mut(id) {
                    attribute.set_value(index, value.clone());
                }
            }
        }
        self.notify(Mutation::SetCanonicalCaseValues { cases });
    }

    /// Unknown ids are ignored. Removed cases leave the selection.
    pub fn remove_cases(&mut self, ids: Vec<CaseId>) {
        for id in &ids {
            let Some(index) = self.cases.remove(id) else {
                continue;
            };
            for attribute in &mut self.attributes {
                attribute.remove_values(index, 1);
            }
            self.cache.remove_case(id);
        }
        let cases = &self.cases;
        self.selection.retain_cases(|id| cases.contains(id));
        self.notify(Mutation::RemoveCases { case_ids: ids });
    }

    /// Apply `new[i] = old[permutation[i]]` to the index and every attribute.
    pub(crate) fn reorder_cases(&mut self, permutation: &[usize]) {
        self.cases.reorder(permutation);
        for attribute in &mut self.attributes {
            attribute.order_values(permutation);
        }
    }

    /// Replace all attributes and cases. Attribute values are padded or
    /// truncated to the case count; duplicate attribute ids keep the first.
    pub(crate) fn load(&mut self, attributes: Vec<Attribute>, case_ids: Vec<CaseId>) {
        self.cases = CaseIndex::from_ids(case_ids.into_iter().filter(|id| !id.is_empty()));
        let mut seen = FxHashSet::default();
        self.attributes = attributes
            .into_iter()
            .filter(|a| seen.insert(a.id().clone()))
            .collect();
        let len = self.cases.len();
        for attribute in &mut self.attributes {
            attribute.resize(len);
        }
        self.rebuild_attribute_maps();
        self.selection.reset();
        self.cache.clear();
    }

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    pub fn begin_transaction(&mut self) {
        self.transaction_count += 1;
        self.notify(Mutation::BeginTransaction);
    }

    /// Unbalanced calls are clamped at zero.
    pub fn end_transaction(&mut self) {
        if self.transaction_count == 0 {
            log::debug!("DataSet {}: end_transaction without begin", self.id);
        }
        self.transaction_count = self.transaction_count.saturating_sub(1);
        self.notify(Mutation::EndTransaction);
    }

    pub fn is_in_transaction(&self) -> bool {
        self.transaction_count > 0
    }

    // -------------------------------------------------------------------------
    // Statistics
    // -------------------------------------------------------------------------

    /// Per-attribute bounds, in attribute order.
    pub fn numeric_bounds(&self) -> Vec<(AttributeId, Bounds)> {
        self.attributes
            .iter()
            .map(|attribute| {
                let bounds = (0..attribute.len())
                    .filter_map(|i| attribute.num_value(i))
                    .filter(|n| n.is_finite())
                    .fold(Bounds::EMPTY, Bounds::include);
                (attribute.id().clone(), bounds)
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    pub fn add_action_listener(
        &mut self,
        key: &str,
        listener: impl FnMut(&DataSet, &Mutation) + 'static,
    ) -> bool {
        self.listeners.add(key, Box::new(listener))
    }

    pub fn remove_action_listener(&mut self, key: &str) -> bool {
        self.listeners.remove(key)
    }

    pub fn has_action_listener(&self, key: &str) -> bool {
        self.listeners.contains(key)
    }

    pub(crate) fn retired_listeners(&self) -> RetiredListeners {
        self.listeners.retired()
    }

    pub(crate) fn notify(&mut self, mutation: Mutation) {
        if self.listeners.is_empty() {
            return;
        }
        let mut listeners = std::mem::take(&mut self.listeners);
        listeners.notify(self, &mutation);
        self.listeners.restore(listeners);
    }

    /// Re-apply a mutation recorded on another data set.
    ///
    /// Selection changes are per-instance and are not replayed.
    pub fn apply_mutation(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::SetName { name } => self.set_name(name.clone()),
            Mutation::AddAttribute {
                attribute,
                before_id,
            } => {
                self.add_attribute_with_id(attribute.clone(), before_id.as_ref());
            }
            Mutation::SetAttributeName { attribute_id, name } => {
                self.set_attribute_name(attribute_id, name.clone())
            }
            Mutation::SetAttributeUnits {
                attribute_id,
                units,
            } => self.set_attribute_units(attribute_id, units.clone()),
            Mutation::SetAttributePrecision {
                attribute_id,
                precision,
            } => self.set_attribute_precision(attribute_id, *precision),
            Mutation::SetAttributeFormula {
                attribute_id,
                formula,
            } => self.set_attribute_formula(attribute_id, formula.clone()),
            Mutation::RemoveAttribute { attribute_id } => {
                self.remove_attribute(attribute_id);
            }
            Mutation::MoveAttribute {
                attribute_id,
                before_id,
            } => self.move_attribute(attribute_id, before_id.as_ref()),
            Mutation::AddCases { cases, at } => self.add_cases_with_ids(cases.clone(), at.clone()),
            Mutation::AddCanonicalCases { cases, at } => {
                self.add_canonical_cases_with_ids(cases.clone(), at.clone())
            }
            Mutation::SetCaseValues { cases } => self.set_case_values(cases.clone()),
            Mutation::SetCanonicalCaseValues { cases } => {
                self.set_canonical_case_values(cases.clone())
            }
            Mutation::RemoveCases { case_ids } => self.remove_cases(case_ids.clone()),
            Mutation::SortByAttribute {
                attribute_id,
                direction,
            } => {
                self.sort_by_attribute(attribute_id, *direction);
            }
            Mutation::ReorderCases { case_ids } => {
                self.order_cases(case_ids);
            }
            Mutation::BeginTransaction => self.begin_transaction(),
            Mutation::EndTransaction => self.end_transaction(),
            Mutation::SelectionChanged => {}
            Mutation::SnapshotApplied { snapshot } => self.apply_snapshot(snapshot.clone()),
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Stop synchronizing and drop all listeners. Idempotent.
    ///
    /// Pending synchronization batches are discarded, and the subscription
    /// on the source data set is removed.
    pub fn destroy(&mut self) {
        if let Some(link) = self.sync.take() {
            link.dispose();
        }
        self.listeners.clear();
    }

    pub(crate) fn attach_sync(&mut self, link: SyncLink) {
        if let Some(previous) = self.sync.replace(link) {
            previous.dispose();
        }
    }
}

/// The insertion points the accepted cases were placed at. Anchors that
/// named a case of the same batch, or no known case, become appends.
fn used_insert_at(at: &InsertAt, accepted: &[(usize, Option<CaseId>)]) -> InsertAt {
    match at {
        InsertAt::PerCase(_) => InsertAt::PerCase(accepted.iter().map(|(_, anchor)| anchor.clone()).collect()),
        _ => accepted
            .first()
            .and_then(|(_, anchor)| anchor.clone())
            .map_or(InsertAt::End, InsertAt::Before),
    }
}

fn select_indices<T>(items: Vec<T>, keep: &[(usize, Option<CaseId>)]) -> Vec<T> {
    if keep.len() == items.len() {
        return items;
    }
    let mut keep = keep.iter().map(|(i, _)| *i).peekable();
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            if keep.peek() == Some(&i) {
                keep.next();
                Some(item)
            } else {
                None
            }
        })
        .collect()
}

impl std::fmt::Debug for DataSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSet")
            .field("id", &self.id)
            .field("source_id", &self.source_id)
            .field("name", &self.name)
            .field("attributes", &self.attributes.len())
            .field("cases", &self.cases.len())
            .field("listeners", &self.listeners)
            .field("synchronized", &self.sync.is_some())
            .finish()
    }
}
