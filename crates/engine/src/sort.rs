//! Stable case sorting by one attribute.
//!
//! Comparison rules:
//! - both values numeric: numeric order
//! - otherwise: case-insensitive string order, where empty/missing is `""`
//!
//! The mixed rule is not a total order (`9 < 10 < "1a" < 9`), so the
//! permutation comes from a merge sort that only ever asks "is right strictly
//! before left?". Ties keep their current relative order in both directions.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use caseset_core::{AttributeId, CaseId, Value};

use crate::dataset::DataSet;
use crate::events::Mutation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Where a case was and where it went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseMove {
    pub before_index: usize,
    pub after_index: usize,
}

/// Normalized comparison key for one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    number: Option<OrderedFloat<f64>>,
    /// Lowercased string form
    text: String,
}

impl SortKey {
    pub fn from_value(value: &Value) -> Self {
        Self {
            number: value.to_number().map(OrderedFloat),
            text: value.to_text().to_lowercase(),
        }
    }

    pub fn compare(&self, other: &SortKey) -> Ordering {
        match (self.number, other.number) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.text.cmp(&other.text),
        }
    }
}

/// Stable ordering of `keys`: returns `order` with `order[new] = old`.
pub fn stable_order<F>(len: usize, mut compare: F) -> Vec<usize>
where
    F: FnMut(usize, usize) -> Ordering,
{
    let mut order: Vec<usize> = (0..len).collect();
    let mut scratch = order.clone();
    merge_sort(&mut order, &mut scratch, &mut compare);
    order
}

fn merge_sort<F>(items: &mut [usize], scratch: &mut [usize], compare: &mut F)
where
    F: FnMut(usize, usize) -> Ordering,
{
    let len = items.len();
    if len < 2 {
        return;
    }
    let mid = len / 2;
    {
        let (left, right) = items.split_at_mut(mid);
        let (left_scratch, right_scratch) = scratch.split_at_mut(mid);
        merge_sort(left, left_scratch, compare);
        merge_sort(right, right_scratch, compare);
    }
    scratch[..len].copy_from_slice(items);
    let (left, right) = scratch[..len].split_at(mid);
    let (mut i, mut j) = (0, 0);
    for slot in items.iter_mut() {
        // Take from the right only when strictly before the left head.
        let take_right = j < right.len()
            && (i >= left.len() || compare(right[j], left[i]) == Ordering::Less);
        if take_right {
            *slot = right[j];
            j += 1;
        } else {
            *slot = left[i];
            i += 1;
        }
    }
}

impl DataSet {
    /// Reorder cases by `attribute_id`, stably.
    ///
    /// Returns the moves of every case whose position changed. When the
    /// attribute is unknown or the order is already correct, nothing is
    /// mutated, no listener fires, and the map is empty.
    pub fn sort_by_attribute(
        &mut self,
        attribute_id: &AttributeId,
        direction: SortDirection,
    ) -> BTreeMap<CaseId, CaseMove> {
        let Some(attribute) = self.attribute(attribute_id) else {
            log::debug!("DataSet {}: sort by unknown attribute {}", self.id(), attribute_id);
            return BTreeMap::new();
        };
        let keys: Vec<SortKey> = (0..self.case_count())
            .map(|i| SortKey::from_value(attribute.value(i).unwrap_or(&Value::Empty)))
            .collect();
        let order = stable_order(keys.len(), |a, b| match direction {
            SortDirection::Ascending => keys[a].compare(&keys[b]),
            SortDirection::Descending => keys[b].compare(&keys[a]),
        });

        let moves: BTreeMap<CaseId, CaseMove> = order
            .iter()
            .enumerate()
            .filter(|(after, before)| after != *before)
            .filter_map(|(after_index, &before_index)| {
                let id = self.case_id_at(before_index)?.clone();
                Some((id, CaseMove { before_index, after_index }))
            })
            .collect();
        if moves.is_empty() {
            return moves;
        }

        self.reorder_cases(&order);
        self.notify(Mutation::SortByAttribute {
            attribute_id: attribute_id.clone(),
            direction,
        });
        moves
    }

    /// Put the listed cases first, in the given order. Unknown and repeated
    /// ids are ignored; unlisted cases follow in their current order.
    ///
    /// Returns false, without notifying, when the order is unchanged.
    pub fn order_cases(&mut self, case_ids: &[CaseId]) -> bool {
        let mut placed = vec![false; self.case_count()];
        let mut order = Vec::with_capacity(placed.len());
        for index in case_ids.iter().filter_map(|id| self.case_index(id)) {
            if !placed[index] {
                placed[index] = true;
                order.push(index);
            }
        }
        order.extend((0..placed.len()).filter(|&i| !placed[i]));
        if order.iter().enumerate().all(|(after, &before)| after == before) {
            return false;
        }

        self.reorder_cases(&order);
        let case_ids = self.case_ids().to_vec();
        self.notify(Mutation::ReorderCases { case_ids });
        true
    }
}
