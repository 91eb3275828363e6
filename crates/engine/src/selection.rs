//! Selection operations on a data set.
//!
//! Thin wrappers over `caseset_core::Selection`; each mutator notifies
//! listeners with `Mutation::SelectionChanged`. "Select all" expands to the
//! data set's current attributes and cases.

use caseset_core::{AttributeId, CaseId, CellRef, Selection};

use crate::dataset::DataSet;
use crate::events::Mutation;

impl DataSet {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn is_case_selected(&self, id: &CaseId) -> bool {
        self.selection.is_case_selected(id)
    }

    pub fn is_attribute_selected(&self, id: &AttributeId) -> bool {
        self.selection.is_attribute_selected(id)
    }

    pub fn is_cell_selected(&self, cell: &CellRef) -> bool {
        self.selection.is_cell_selected(cell)
    }

    pub fn is_any_cell_selected(&self) -> bool {
        self.selection.is_any_cell_selected()
    }

    pub fn selected_case_ids(&self) -> Vec<CaseId> {
        self.selection.selected_case_ids()
    }

    pub fn selected_attribute_ids(&self) -> Vec<AttributeId> {
        self.selection.selected_attribute_ids()
    }

    pub fn selected_cells(&self) -> Vec<CellRef> {
        self.selection.selected_cells()
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Select (or deselect) cases, clearing the other dimensions.
    pub fn select_cases(&mut self, ids: &[CaseId], select: bool) {
        self.select_cases_with(ids, select, true);
    }

    pub fn select_cases_with(&mut self, ids: &[CaseId], select: bool, exclusive: bool) {
        self.selection.select_cases_with(ids, select, exclusive);
        self.notify(Mutation::SelectionChanged);
    }

    pub fn select_attributes(&mut self, ids: &[AttributeId], select: bool) {
        self.select_attributes_with(ids, select, true);
    }

    pub fn select_attributes_with(&mut self, ids: &[AttributeId], select: bool, exclusive: bool) {
        self.selection.select_attributes_with(ids, select, exclusive);
        self.notify(Mutation::SelectionChanged);
    }

    pub fn select_cells(&mut self, cells: &[CellRef], select: bool) {
        self.select_cells_with(cells, select, true);
    }

    pub fn select_cells_with(&mut self, cells: &[CellRef], select: bool, exclusive: bool) {
        self.selection.select_cells_with(cells, select, exclusive);
        self.notify(Mutation::SelectionChanged);
    }

    /// Replace the case selection with exactly `ids`.
    pub fn set_selected_cases(&mut self, ids: &[CaseId]) {
        self.selection.set_selected_cases(ids);
        self.notify(Mutation::SelectionChanged);
    }

    pub fn set_selected_attributes(&mut self, ids: &[AttributeId]) {
        self.selection.set_selected_attributes(ids);
        self.notify(Mutation::SelectionChanged);
    }

    pub fn set_selected_cells(&mut self, cells: &[CellRef]) {
        self.selection.set_selected_cells(cells);
        self.notify(Mutation::SelectionChanged);
    }

    pub fn select_all_cases(&mut self) {
        let ids = self.case_ids().to_vec();
        self.select_cases(&ids, true);
    }

    pub fn select_all_attributes(&mut self) {
        let ids: Vec<AttributeId> = self.attributes().iter().map(|a| a.id().clone()).collect();
        self.select_attributes(&ids, true);
    }

    pub fn select_all_cells(&mut self) {
        let mut cells = Vec::with_capacity(self.case_count() * self.attribute_count());
        for attribute in self.attributes() {
            for case_id in self.case_ids() {
                cells.push(CellRef::new(attribute.id().clone(), case_id.clone()));
            }
        }
        self.select_cells(&cells, true);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.notify(Mutation::SelectionChanged);
    }

    // -------------------------------------------------------------------------
    // Pseudo-cases
    // -------------------------------------------------------------------------

    /// Register a pseudo-case id that selects as the group of `members`.
    pub fn set_pseudo_case(&mut self, id: CaseId, members: Vec<CaseId>) {
        self.selection.set_pseudo_case(id, members);
    }

    pub fn remove_pseudo_case(&mut self, id: &CaseId) -> bool {
        self.selection.remove_pseudo_case(id)
    }
}
