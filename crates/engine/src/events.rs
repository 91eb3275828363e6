//! Mutation events for data set change notifications.
//!
//! Every public mutator on `DataSet` emits exactly one `Mutation` after the
//! change is applied. Listeners (grid re-renders, synchronization) see the
//! data set's post-state together with the mutation that produced it.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use caseset_core::{AttributeId, CaseId};

use crate::attribute::Attribute;
use crate::case::{CanonicalCase, Case, InsertAt};
use crate::dataset::DataSet;
use crate::snapshot::DataSetSnapshot;
use crate::sort::SortDirection;

/// A mutation that was applied to a data set.
#[derive(Debug, Clone)]
pub enum Mutation {
    SetName {
        name: Option<String>,
    },
    AddAttribute {
        attribute: Attribute,
        before_id: Option<AttributeId>,
    },
    SetAttributeName {
        attribute_id: AttributeId,
        name: String,
    },
    SetAttributeUnits {
        attribute_id: AttributeId,
        units: String,
    },
    SetAttributePrecision {
        attribute_id: AttributeId,
        precision: Option<u8>,
    },
    SetAttributeFormula {
        attribute_id: AttributeId,
        formula: Option<String>,
    },
    RemoveAttribute {
        attribute_id: AttributeId,
    },
    MoveAttribute {
        attribute_id: AttributeId,
        before_id: Option<AttributeId>,
    },
    AddCases {
        cases: Vec<Case>,
        at: InsertAt,
    },
    AddCanonicalCases {
        cases: Vec<CanonicalCase>,
        at: InsertAt,
    },
    SetCaseValues {
        cases: Vec<Case>,
    },
    SetCanonicalCaseValues {
        cases: Vec<CanonicalCase>,
    },
    RemoveCases {
        case_ids: Vec<CaseId>,
    },
    SortByAttribute {
        attribute_id: AttributeId,
        direction: SortDirection,
    },
    /// Cases were put into this order.
    ReorderCases {
        case_ids: Vec<CaseId>,
    },
    BeginTransaction,
    EndTransaction,
    /// Selection state changed (volatile; never replayed elsewhere).
    SelectionChanged,
    /// The whole data set was reloaded from a snapshot.
    SnapshotApplied {
        snapshot: DataSetSnapshot,
    },
}

impl Mutation {
    /// Stable action name, for logging and listener filtering.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::SetName { .. } => "setName",
            Mutation::AddAttribute { .. } => "addAttributeWithID",
            Mutation::SetAttributeName { .. } => "setAttributeName",
            Mutation::SetAttributeUnits { .. } => "setAttributeUnits",
            Mutation::SetAttributePrecision { .. } => "setAttributePrecision",
            Mutation::SetAttributeFormula { .. } => "setAttributeFormula",
            Mutation::RemoveAttribute { .. } => "removeAttribute",
            Mutation::MoveAttribute { .. } => "moveAttribute",
            Mutation::AddCases { .. } => "addCasesWithIDs",
            Mutation::AddCanonicalCases { .. } => "addCanonicalCasesWithIDs",
            Mutation::SetCaseValues { .. } => "setCaseValues",
            Mutation::SetCanonicalCaseValues { .. } => "setCanonicalCaseValues",
            Mutation::RemoveCases { .. } => "removeCases",
            Mutation::SortByAttribute { .. } => "sortByAttribute",
            Mutation::ReorderCases { .. } => "reorderCases",
            Mutation::BeginTransaction => "beginTransaction",
            Mutation::EndTransaction => "endTransaction",
            Mutation::SelectionChanged => "selectionChanged",
            Mutation::SnapshotApplied { .. } => "applySnapshot",
        }
    }

    /// Per-instance bookkeeping that a derived data set must not replay.
    pub fn is_bookkeeping(&self) -> bool {
        matches!(self, Mutation::SetName { .. } | Mutation::SelectionChanged)
    }
}

/// Listener callback: post-state data set plus the applied mutation.
pub type ActionListener = Box<dyn FnMut(&DataSet, &Mutation)>;

/// Keys of listeners to drop once the registry is back in place.
pub(crate) type RetiredListeners = Rc<RefCell<FxHashSet<String>>>;

/// Keyed listener registry, invoked in registration order.
#[derive(Default)]
pub struct ActionListeners {
    entries: Vec<(String, ActionListener)>,
    retired: RetiredListeners,
}

impl ActionListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under `key`. An empty key is refused; a duplicate key
    /// replaces the previous listener.
    pub fn add(&mut self, key: &str, listener: ActionListener) -> bool {
        if key.is_empty() {
            log::warn!("DataSet action listener registered with an empty key; ignoring");
            return false;
        }
        self.retired.borrow_mut().remove(key);
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            log::warn!("DataSet action listener '{}' already registered; replacing", key);
            entry.1 = listener;
        } else {
            self.entries.push((key.to_string(), listener));
        }
        true
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Handle for retiring listeners while the registry is detached.
    pub(crate) fn retired(&self) -> RetiredListeners {
        self.retired.clone()
    }

    /// Merge listeners that were registered while these were detached, and
    /// drop the ones retired meanwhile.
    pub(crate) fn restore(&mut self, detached: ActionListeners) {
        let added = std::mem::replace(&mut self.entries, detached.entries);
        let retired_meanwhile = std::mem::replace(&mut self.retired, detached.retired);
        self.retired
            .borrow_mut()
            .extend(retired_meanwhile.borrow_mut().drain());
        self.prune_retired();
        for (key, listener) in added {
            self.add(&key, listener);
        }
    }

    fn prune_retired(&mut self) {
        let mut retired = self.retired.borrow_mut();
        if retired.is_empty() {
            return;
        }
        self.entries.retain(|(key, _)| !retired.contains(key));
        retired.clear();
    }

    pub(crate) fn notify(&mut self, data_set: &DataSet, mutation: &Mutation) {
        for (_, listener) in self.entries.iter_mut() {
            listener(data_set, mutation);
        }
    }
}

impl std::fmt::Debug for ActionListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(k, _)| k))
            .finish()
    }
}

/// Simple mutation collector for testing.
#[derive(Debug, Default)]
pub struct MutationCollector {
    mutations: Vec<Mutation>,
}

impl MutationCollector {
    pub fn new() -> Self {
        Self {
            mutations: Vec::new(),
        }
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.mutations.iter().map(Mutation::name).collect()
    }

    pub fn clear(&mut self) {
        self.mutations.clear();
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listener_registry() {
        let mut listeners = ActionListeners::new();
        assert!(!listeners.add("", Box::new(|_, _| {})));
        assert!(listeners.add("grid", Box::new(|_, _| {})));
        assert!(listeners.add("grid", Box::new(|_, _| {})));
        assert_eq!(listeners.len(), 1);
        assert!(listeners.remove("grid"));
        assert!(!listeners.remove("grid"));
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_notify_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = ActionListeners::new();
        for key in ["first", "second"] {
            let order = order.clone();
            listeners.add(key, Box::new(move |_, m| order.borrow_mut().push((key, m.name()))));
        }
        let data_set = DataSet::new("data");
        listeners.notify(&data_set, &Mutation::BeginTransaction);
        assert_eq!(
            *order.borrow(),
            vec![("first", "beginTransaction"), ("second", "beginTransaction")]
        );
    }

    #[test]
    fn test_retired_listener_dropped_on_restore() {
        let mut listeners = ActionListeners::new();
        listeners.add("grid", Box::new(|_, _| {}));
        listeners.add("sync:view", Box::new(|_, _| {}));
        let retired = listeners.retired();

        let detached = std::mem::take(&mut listeners);
        retired.borrow_mut().insert("sync:view".to_string());
        listeners.add("late", Box::new(|_, _| {}));
        listeners.restore(detached);

        assert!(listeners.contains("grid"));
        assert!(listeners.contains("late"));
        assert!(!listeners.contains("sync:view"));
        assert!(retired.borrow().is_empty());
    }

    #[test]
    fn test_bookkeeping_mutations() {
        assert!(Mutation::SelectionChanged.is_bookkeeping());
        assert!(Mutation::SetName { name: None }.is_bookkeeping());
        assert!(!Mutation::RemoveCases { case_ids: vec![] }.is_bookkeeping());
    }

    #[test]
    fn test_collector() {
        let mut collector = MutationCollector::new();
        collector.push(Mutation::BeginTransaction);
        collector.push(Mutation::EndTransaction);
        assert_eq!(collector.names(), vec!["beginTransaction", "endTransaction"]);
        collector.clear();
        assert!(collector.is_empty());
    }
}
