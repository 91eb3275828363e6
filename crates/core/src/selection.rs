//! Selection model: attributes, cases, and cells.
//!
//! The three dimensions are mutually exclusive by default: selecting in one
//! clears the other two unless the caller opts out. Case selection understands
//! pseudo-cases (one id standing for a group of member cases). When
//! `cells_select_cases` is on, selected cells also select their cases.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::ids::{AttributeId, CaseId};

/// A single cell: one attribute of one case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRef {
    pub attribute_id: AttributeId,
    pub case_id: CaseId,
}

impl CellRef {
    pub fn new(attribute_id: impl Into<AttributeId>, case_id: impl Into<CaseId>) -> Self {
        Self {
            attribute_id: attribute_id.into(),
            case_id: case_id.into(),
        }
    }
}

/// Selection linkage policy, passed in at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPolicy {
    /// Selecting cells also selects their cases.
    pub cells_select_cases: bool,
}

/// Volatile selection state owned by a data set. Never serialized.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    policy: SelectionPolicy,
    attributes: BTreeSet<AttributeId>,
    cases: BTreeSet<CaseId>,
    cells: BTreeSet<CellRef>,
    /// pseudo-case id -> member case ids
    pseudo_cases: HashMap<CaseId, Vec<CaseId>>,
}

impl Selection {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: SelectionPolicy) {
        self.policy = policy;
    }

    // -------------------------------------------------------------------------
    // Pseudo-cases
    // -------------------------------------------------------------------------

    /// Register (or replace) a pseudo-case standing for `members`.
    pub fn set_pseudo_case(&mut self, id: CaseId, members: Vec<CaseId>) {
        self.pseudo_cases.insert(id, members);
    }

    pub fn remove_pseudo_case(&mut self, id: &CaseId) -> bool {
        self.pseudo_cases.remove(id).is_some()
    }

    pub fn pseudo_case_members(&self, id: &CaseId) -> Option<&[CaseId]> {
        self.pseudo_cases.get(id).map(|m| m.as_slice())
    }

    /// Replace every pseudo-case id with its members.
    fn expand_cases(&self, ids: &[CaseId]) -> Vec<CaseId> {
        let mut expanded = Vec::with_capacity(ids.len());
        for id in ids {
            match self.pseudo_cases.get(id) {
                Some(members) => expanded.extend(members.iter().cloned()),
                None => expanded.push(id.clone()),
            }
        }
        expanded
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Pseudo-cases count as selected only when every member is selected.
    pub fn is_case_selected(&self, id: &CaseId) -> bool {
        match self.pseudo_cases.get(id) {
            Some(members) => {
                !members.is_empty() && members.iter().all(|m| self.cases.contains(m))
            }
            None => self.cases.contains(id),
        }
    }

    pub fn is_attribute_selected(&self, id: &AttributeId) -> bool {
        self.attributes.contains(id)
    }

    pub fn is_cell_selected(&self, cell: &CellRef) -> bool {
        self.cells.contains(cell)
    }

    pub fn is_any_cell_selected(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn selected_case_ids(&self) -> Vec<CaseId> {
        self.cases.iter().cloned().collect()
    }

    pub fn selected_attribute_ids(&self) -> Vec<AttributeId> {
        self.attributes.iter().cloned().collect()
    }

    pub fn selected_cells(&self) -> Vec<CellRef> {
        self.cells.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty() && self.attributes.is_empty() && self.cells.is_empty()
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Select or deselect cases. Selecting clears attributes and cells.
    pub fn select_cases(&mut self, ids: &[CaseId], select: bool) {
        self.select_cases_with(ids, select, true);
    }

    /// Select or deselect cases; `exclusive = false` keeps other dimensions.
    pub fn select_cases_with(&mut self, ids: &[CaseId], select: bool, exclusive: bool) {
        let expanded = self.expand_cases(ids);
        if select {
            if exclusive {
                self.attributes.clear();
                self.cells.clear();
            }
            self.cases.extend(expanded);
        } else {
            for id in &expanded {
                self.cases.remove(id);
            }
        }
    }

    /// Select or deselect attributes. Selecting clears cases and cells.
    pub fn select_attributes(&mut self, ids: &[AttributeId], select: bool) {
        self.select_attributes_with(ids, select, true);
    }

    pub fn select_attributes_with(&mut self, ids: &[AttributeId], select: bool, exclusive: bool) {
        if select {
            if exclusive {
                self.cases.clear();
                self.cells.clear();
            }
            self.attributes.extend(ids.iter().cloned());
        } else {
            for id in ids {
                self.attributes.remove(id);
            }
        }
    }

    /// Select or deselect cells. Selecting clears attributes and cases.
    pub fn select_cells(&mut self, cells: &[CellRef], select: bool) {
        self.select_cells_with(cells, select, true);
    }

    pub fn select_cells_with(&mut self, cells: &[CellRef], select: bool, exclusive: bool) {
        if select {
            if exclusive {
                self.attributes.clear();
                self.cases.clear();
            }
            self.cells.extend(cells.iter().cloned());
            if self.policy.cells_select_cases {
                self.cases.extend(cells.iter().map(|c| c.case_id.clone()));
            }
        } else {
            for cell in cells {
                self.cells.remove(cell);
            }
            if self.policy.cells_select_cases {
                // A case stays selected while any of its cells is still selected.
                for cell in cells {
                    let still_referenced = self.cells.iter().any(|c| c.case_id == cell.case_id);
                    if !still_referenced {
                        self.cases.remove(&cell.case_id);
                    }
                }
            }
        }
    }

    /// Replace the whole selection with exactly these cases.
    pub fn set_selected_cases(&mut self, ids: &[CaseId]) {
        let expanded = self.expand_cases(ids);
        self.clear();
        self.cases.extend(expanded);
    }

    /// Replace the whole selection with exactly these attributes.
    pub fn set_selected_attributes(&mut self, ids: &[AttributeId]) {
        self.clear();
        self.attributes.extend(ids.iter().cloned());
    }

    /// Replace the whole selection with exactly these cells.
    pub fn set_selected_cells(&mut self, cells: &[CellRef]) {
        self.clear();
        self.select_cells_with(cells, true, false);
    }

    /// Clear all three dimensions. Pseudo-case registrations are kept.
    pub fn clear(&mut self) {
        self.attributes.clear();
        self.cases.clear();
        self.cells.clear();
    }

    /// Drop everything, including pseudo-case registrations (structural reload).
    pub fn reset(&mut self) {
        self.clear();
        self.pseudo_cases.clear();
    }

    /// Drop selection entries for cases that no longer exist.
    pub fn retain_cases(&mut self, mut keep: impl FnMut(&CaseId) -> bool) {
        self.cases.retain(|id| keep(id));
        self.cells.retain(|cell| keep(&cell.case_id));
    }

    /// Drop selection entries for attributes that no longer exist.
    pub fn retain_attributes(&mut self, mut keep: impl FnMut(&AttributeId) -> bool) {
        self.attributes.retain(|id| keep(id));
        self.cells.retain(|cell| keep(&cell.attribute_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<CaseId> {
        raw.iter().map(|s| CaseId::from(*s)).collect()
    }

    #[test]
    fn test_selecting_one_dimension_clears_others() {
        let mut sel = Selection::default();
        sel.select_attributes(&[AttributeId::from("a")], true);
        sel.select_cells(&[CellRef::new("a", "1")], true);
        assert!(!sel.is_attribute_selected(&AttributeId::from("a")));
        assert!(sel.is_cell_selected(&CellRef::new("a", "1")));

        sel.select_cases(&ids(&["1"]), true);
        assert!(!sel.is_any_cell_selected());
        assert!(sel.is_case_selected(&CaseId::from("1")));
    }

    #[test]
    fn test_deselect_does_not_clear_others() {
        let mut sel = Selection::default();
        sel.select_cases(&ids(&["1", "2"]), true);
        sel.select_attributes_with(&[AttributeId::from("a")], true, false);
        sel.select_attributes(&[AttributeId::from("b")], false);
        assert_eq!(sel.selected_case_ids().len(), 2);
        assert!(sel.is_attribute_selected(&AttributeId::from("a")));
    }

    #[test]
    fn test_non_exclusive_select_keeps_other_dimensions() {
        let mut sel = Selection::default();
        sel.select_attributes(&[AttributeId::from("a")], true);
        sel.select_cases_with(&ids(&["1"]), true, false);
        assert!(sel.is_attribute_selected(&AttributeId::from("a")));
        assert!(sel.is_case_selected(&CaseId::from("1")));
    }

    #[test]
    fn test_pseudo_case_selection() {
        let mut sel = Selection::default();
        sel.set_pseudo_case(CaseId::from("group"), ids(&["1", "2", "3"]));

        sel.select_cases(&ids(&["1", "2"]), true);
        assert!(!sel.is_case_selected(&CaseId::from("group")));

        sel.select_cases(&ids(&["3"]), true);
        assert!(sel.is_case_selected(&CaseId::from("group")));

        sel.select_cases(&ids(&["group"]), false);
        assert!(sel.selected_case_ids().is_empty());

        sel.select_cases(&ids(&["group"]), true);
        assert_eq!(sel.selected_case_ids(), ids(&["1", "2", "3"]));
    }

    #[test]
    fn test_empty_pseudo_case_is_never_selected() {
        let mut sel = Selection::default();
        sel.set_pseudo_case(CaseId::from("group"), Vec::new());
        assert!(!sel.is_case_selected(&CaseId::from("group")));
    }

    #[test]
    fn test_set_selected_replaces() {
        let mut sel = Selection::default();
        sel.select_cases(&ids(&["1", "2"]), true);
        sel.set_selected_cases(&ids(&["3"]));
        assert_eq!(sel.selected_case_ids(), ids(&["3"]));

        sel.set_selected_attributes(&[AttributeId::from("a")]);
        assert!(sel.selected_case_ids().is_empty());
        assert_eq!(sel.selected_attribute_ids(), vec![AttributeId::from("a")]);
    }

    #[test]
    fn test_cells_select_cases_policy() {
        let mut sel = Selection::new(SelectionPolicy { cells_select_cases: true });
        sel.select_cells(
            &[CellRef::new("a", "1"), CellRef::new("b", "1"), CellRef::new("a", "2")],
            true,
        );
        assert!(sel.is_case_selected(&CaseId::from("1")));
        assert!(sel.is_case_selected(&CaseId::from("2")));

        // Case 1 still has a selected cell in attribute b
        sel.select_cells(&[CellRef::new("a", "1"), CellRef::new("a", "2")], false);
        assert!(sel.is_case_selected(&CaseId::from("1")));
        assert!(!sel.is_case_selected(&CaseId::from("2")));

        sel.select_cells(&[CellRef::new("b", "1")], false);
        assert!(!sel.is_case_selected(&CaseId::from("1")));
    }

    #[test]
    fn test_cells_without_policy_leave_cases_alone() {
        let mut sel = Selection::default();
        sel.select_cells(&[CellRef::new("a", "1")], true);
        assert!(!sel.is_case_selected(&CaseId::from("1")));
    }

    #[test]
    fn test_retain_prunes_cells() {
        let mut sel = Selection::default();
        sel.select_cells(&[CellRef::new("a", "1"), CellRef::new("a", "2")], true);
        sel.retain_cases(|id| id.as_str() != "1");
        assert_eq!(sel.selected_cells(), vec![CellRef::new("a", "2")]);
        sel.retain_attributes(|id| id.as_str() != "a");
        assert!(!sel.is_any_cell_selected());
    }
}
