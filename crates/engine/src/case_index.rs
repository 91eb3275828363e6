//! Case identity index: ordered case ids plus id -> position map.
//!
//! Key invariants:
//! - `positions[ids[i]] == i` for every position after every mutation
//! - ids are unique
//! - the owning `DataSet` applies the same insert/remove/permutation to every
//!   attribute's values, so positions double as value indices

use rustc_hash::FxHashMap;

use caseset_core::CaseId;

#[derive(Debug, Clone, Default)]
pub struct CaseIndex {
    /// Position -> case id
    ids: Vec<CaseId>,
    /// Inverse map: case id -> position (O(1) lookup)
    /// Rebuilt from the first changed position on every structural change
    positions: FxHashMap<CaseId, usize>,
}

impl CaseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an ordered id list. Later duplicates are dropped.
    pub fn from_ids(ids: impl IntoIterator<Item = CaseId>) -> Self {
        let mut index = Self::new();
        for id in ids {
            index.insert(id, None);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[CaseId] {
        &self.ids
    }

    pub fn contains(&self, id: &CaseId) -> bool {
        self.positions.contains_key(id)
    }

    pub fn position(&self, id: &CaseId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn id_at(&self, index: usize) -> Option<&CaseId> {
        self.ids.get(index)
    }

    /// The id following `id`, if any.
    pub fn next(&self, id: &CaseId) -> Option<&CaseId> {
        self.position(id).and_then(|i| self.ids.get(i + 1))
    }

    // -------------------------------------------------------------------------
    // Internal rebuilders
    // -------------------------------------------------------------------------

    fn rebuild_from(&mut self, start: usize) {
        for (offset, id) in self.ids[start..].iter().enumerate() {
            self.positions.insert(id.clone(), start + offset);
        }
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Insert `id` at `before_index` (append when `None` or out of range).
    /// Returns the position used, or `None` if the id is already present.
    pub fn insert(&mut self, id: CaseId, before_index: Option<usize>) -> Option<usize> {
        if self.positions.contains_key(&id) {
            return None;
        }
        let index = match before_index {
            Some(i) if i < self.ids.len() => i,
            _ => self.ids.len(),
        };
        self.ids.insert(index, id);
        self.rebuild_from(index);
        Some(index)
    }

    /// Remove `id`, returning the position it held.
    pub fn remove(&mut self, id: &CaseId) -> Option<usize> {
        let index = self.positions.remove(id)?;
        self.ids.remove(index);
        self.rebuild_from(index);
        Some(index)
    }

    /// Reorder so that `new[i] = old[permutation[i]]`. Caller validates.
    pub fn reorder(&mut self, permutation: &[usize]) {
        let reordered: Vec<CaseId> = permutation.iter().map(|&i| self.ids[i].clone()).collect();
        self.ids = reordered;
        self.rebuild_from(0);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.positions.clear();
    }
}
