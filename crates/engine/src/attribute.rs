//! Attribute: a single named, typed column of values.
//!
//! Values are positional; index `i` belongs to the data set's `i`th case. The
//! owning `DataSet` keeps every attribute's length equal to its case count.

use std::cell::OnceCell;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use caseset_core::{AttributeId, Value};

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // ISO 8601 date, optional time and zone
        r"^\d{4}-\d{1,2}-\d{1,2}([T ]\d{1,2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$",
        // m/d/yyyy, m/d/yy
        r"^\d{1,2}/\d{1,2}/(\d{2}|\d{4})$",
        // Jan 5, 2020 / January 5 2020
        r"(?i)^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.? \d{1,2},? \d{4}$",
        // 5 Jan 2020
        r"(?i)^\d{1,2} (jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.? \d{4}$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static IMAGE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(ccimg://\S+|data:image/\S+|(https?://|/|\./)?[^\s]+\.(png|jpe?g|gif|svg|webp|bmp)(\?\S*)?)$",
    )
    .ok()
});

/// Inferred value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Numeric,
    Categorical,
    Date,
    Image,
}

/// Per-type tallies over the non-empty values of an attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCounts {
    pub non_empty: usize,
    pub numeric: usize,
    pub date: usize,
    pub image: usize,
}

impl TypeCounts {
    fn tally(values: &[Value]) -> Self {
        let mut counts = TypeCounts::default();
        for value in values {
            if value.is_empty() {
                continue;
            }
            counts.non_empty += 1;
            if value.to_number().is_some() {
                counts.numeric += 1;
                continue;
            }
            let text = value.to_text();
            let text = text.trim();
            if is_date_like(text) {
                counts.date += 1;
            } else if is_image_like(text) {
                counts.image += 1;
            }
        }
        counts
    }

    /// Largest type if it covers at least half of the non-empty values,
    /// otherwise categorical. `None` when every value is empty.
    pub fn most_common(&self) -> Option<ValueType> {
        if self.non_empty == 0 {
            return None;
        }
        let candidates = [
            (ValueType::Numeric, self.numeric),
            (ValueType::Date, self.date),
            (ValueType::Image, self.image),
        ];
        let mut best: Option<(ValueType, usize)> = None;
        for (ty, count) in candidates {
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((ty, count));
            }
        }
        match best {
            Some((ty, count)) if count * 2 >= self.non_empty => Some(ty),
            _ => Some(ValueType::Categorical),
        }
    }
}

pub fn is_date_like(text: &str) -> bool {
    DATE_PATTERNS.iter().any(|re| re.is_match(text))
}

pub fn is_image_like(text: &str) -> bool {
    IMAGE_PATTERN.as_ref().is_some_and(|re| re.is_match(text))
}

/// Creation spec for an attribute. `id: None` gets a fresh local id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeSpec {
    pub id: Option<AttributeId>,
    pub name: String,
    pub units: String,
    pub precision: Option<u8>,
    pub formula: Option<String>,
    pub values: Vec<Value>,
}

impl AttributeSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<AttributeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.values = values;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    id: AttributeId,
    name: String,
    #[serde(default)]
    units: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    precision: Option<u8>,
    /// Display string only; evaluation belongs to the formula collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(default)]
    values: Vec<Value>,
    /// Lazily inferred type, reset on every value change
    #[serde(skip)]
    inferred_type: OnceCell<Option<ValueType>>,
}

impl From<AttributeSpec> for Attribute {
    fn from(spec: AttributeSpec) -> Self {
        Self {
            id: spec.id.filter(|id| !id.is_empty()).unwrap_or_else(AttributeId::new),
            name: spec.name,
            units: spec.units,
            precision: spec.precision,
            formula: spec.formula,
            values: spec.values,
            inferred_type: OnceCell::new(),
        }
    }
}

impl Attribute {
    pub fn new(id: impl Into<AttributeId>, name: impl Into<String>) -> Self {
        AttributeSpec::named(name).with_id(id).into()
    }

    pub fn id(&self) -> &AttributeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn precision(&self) -> Option<u8> {
        self.precision
    }

    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // -------------------------------------------------------------------------
    // Metadata
    // -------------------------------------------------------------------------

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_units(&mut self, units: impl Into<String>) {
        self.units = units.into();
    }

    pub fn set_precision(&mut self, precision: Option<u8>) {
        self.precision = precision;
    }

    pub fn set_formula(&mut self, formula: Option<String>) {
        self.formula = formula;
    }

    // -------------------------------------------------------------------------
    // Values
    // -------------------------------------------------------------------------

    fn values_changed(&mut self) {
        self.inferred_type.take();
    }

    /// Insert before `before_index`; out-of-range or `None` appends.
    pub fn add_value(&mut self, value: Value, before_index: Option<usize>) {
        match before_index {
            Some(index) if index < self.values.len() => self.values.insert(index, value),
            _ => self.values.push(value),
        }
        self.values_changed();
    }

    /// Insert a run of values before `before_index`; out-of-range or `None` appends.
    pub fn add_values(&mut self, values: Vec<Value>, before_index: Option<usize>) {
        match before_index {
            Some(index) if index < self.values.len() => {
                self.values.splice(index..index, values);
            }
            _ => self.values.extend(values),
        }
        self.values_changed();
    }

    /// Out-of-range indices are ignored.
    pub fn set_value(&mut self, index: usize, value: Value) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
            self.values_changed();
        }
    }

    /// Best effort: pairs beyond the shorter input are dropped, and
    /// out-of-range indices are skipped.
    pub fn set_values(&mut self, indices: &[usize], values: &[Value]) {
        for (&index, value) in indices.iter().zip(values) {
            if let Some(slot) = self.values.get_mut(index) {
                *slot = value.clone();
            }
        }
        self.values_changed();
    }

    /// No-op if `index` is out of bounds or `count` is zero.
    pub fn remove_values(&mut self, index: usize, count: usize) {
        if index >= self.values.len() || count == 0 {
            return;
        }
        let end = (index + count).min(self.values.len());
        self.values.drain(index..end);
        self.values_changed();
    }

    /// Reorder so that `new[i] = old[permutation[i]]`.
    ///
    /// Rejected (no-op) unless `permutation` is a permutation of `0..len`.
    pub fn order_values(&mut self, permutation: &[usize]) -> bool {
        if !is_permutation(permutation, self.values.len()) {
            log::warn!(
                "Attribute {}: ignoring invalid permutation of length {} for {} values",
                self.id,
                permutation.len(),
                self.values.len()
            );
            return false;
        }
        let mut old: Vec<Option<Value>> = self.values.drain(..).map(Some).collect();
        self.values = permutation
            .iter()
            .map(|&i| old[i].take().unwrap_or_default())
            .collect();
        self.values_changed();
        true
    }

    /// Pad with empties or truncate to exactly `len` values.
    pub(crate) fn resize(&mut self, len: usize) {
        if self.values.len() != len {
            self.values.resize(len, Value::Empty);
            self.values_changed();
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// String form; missing, empty, and NaN values are `""`.
    pub fn str_value(&self, index: usize) -> String {
        self.values.get(index).map(Value::to_text).unwrap_or_default()
    }

    /// Finite numeric form, if the value coerces to one.
    pub fn num_value(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(Value::to_number)
    }

    /// `"true"`/`"yes"` (any case), or any non-zero number.
    pub fn boolean(&self, index: usize) -> bool {
        let text = self.str_value(index).to_lowercase();
        if text == "true" || text == "yes" {
            return true;
        }
        self.num_value(index).is_some_and(|n| n != 0.0)
    }

    pub fn str_values(&self) -> Vec<String> {
        self.values.iter().map(Value::to_text).collect()
    }

    // -------------------------------------------------------------------------
    // Type inference
    // -------------------------------------------------------------------------

    pub fn type_counts(&self) -> TypeCounts {
        TypeCounts::tally(&self.values)
    }

    /// Computed on first use after any value change.
    pub fn most_common_type(&self) -> Option<ValueType> {
        *self
            .inferred_type
            .get_or_init(|| self.type_counts().most_common())
    }

    /// A value-less copy with the same id, for seeding a derived data set.
    pub fn derive(&self, name: Option<&str>) -> Attribute {
        Attribute {
            id: self.id.clone(),
            name: name.map(str::to_string).unwrap_or_else(|| self.name.clone()),
            units: self.units.clone(),
            precision: self.precision,
            formula: self.formula.clone(),
            values: Vec::new(),
            inferred_type: OnceCell::new(),
        }
    }
}

/// Equality ignores the lazily inferred type.
impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
            && self.name() == other.name()
            && self.units() == other.units()
            && self.precision() == other.precision()
            && self.formula() == other.formula()
            && self.values() == other.values()
    }
}

fn is_permutation(permutation: &[usize], len: usize) -> bool {
    if permutation.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in permutation {
        if i >= len || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr_with(values: Vec<Value>) -> Attribute {
        AttributeSpec::named("a").with_values(values).into()
    }

    #[test]
    fn test_spec_assigns_id() {
        let attr: Attribute = AttributeSpec::named("x").into();
        assert!(!attr.id().is_empty());
        let attr: Attribute = AttributeSpec::named("x").with_id("fixed").into();
        assert_eq!(attr.id().as_str(), "fixed");
    }

    #[test]
    fn test_add_value_out_of_range_appends() {
        let mut attr = attr_with(vec![Value::from(1), Value::from(2)]);
        attr.add_value(Value::from(0), Some(0));
        attr.add_value(Value::from(9), Some(99));
        attr.add_value(Value::from(3), None);
        let nums: Vec<_> = (0..attr.len()).map(|i| attr.num_value(i).unwrap()).collect();
        assert_eq!(nums, vec![0.0, 1.0, 2.0, 9.0, 3.0]);
    }

    #[test]
    fn test_add_values_inserts_run() {
        let mut attr = attr_with(vec![Value::from("a"), Value::from("d")]);
        attr.add_values(vec![Value::from("b"), Value::from("c")], Some(1));
        assert_eq!(attr.str_values(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_set_values_best_effort() {
        let mut attr = attr_with(vec![Value::from(1), Value::from(2), Value::from(3)]);
        attr.set_values(&[0, 7, 2, 1], &[Value::from(10), Value::from(70), Value::from(30)]);
        assert_eq!(attr.str_values(), vec!["10", "2", "30"]);
    }

    #[test]
    fn test_remove_values_bounds() {
        let mut attr = attr_with(vec![Value::from(1), Value::from(2), Value::from(3)]);
        attr.remove_values(5, 1);
        attr.remove_values(0, 0);
        assert_eq!(attr.len(), 3);
        attr.remove_values(1, 10);
        assert_eq!(attr.str_values(), vec!["1"]);
    }

    #[test]
    fn test_order_values() {
        let mut attr = attr_with(vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        assert!(attr.order_values(&[2, 0, 1]));
        assert_eq!(attr.str_values(), vec!["c", "a", "b"]);
        assert!(!attr.order_values(&[0, 0, 1]));
        assert!(!attr.order_values(&[0, 1]));
        assert_eq!(attr.str_values(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_coercions() {
        let attr = attr_with(vec![
            Value::from("Yes"),
            Value::from("TRUE"),
            Value::from(0),
            Value::from("2"),
            Value::from("no"),
            Value::Empty,
            Value::Number(f64::NAN),
        ]);
        assert!(attr.boolean(0));
        assert!(attr.boolean(1));
        assert!(!attr.boolean(2));
        assert!(attr.boolean(3));
        assert!(!attr.boolean(4));
        assert!(!attr.boolean(5));
        assert_eq!(attr.str_value(5), "");
        assert_eq!(attr.str_value(6), "");
        assert_eq!(attr.num_value(6), None);
        assert_eq!(attr.num_value(3), Some(2.0));
        assert_eq!(attr.str_value(42), "");
    }

    #[test]
    fn test_most_common_type() {
        assert_eq!(attr_with(vec![]).most_common_type(), None);
        assert_eq!(attr_with(vec![Value::Empty, Value::from("")]).most_common_type(), None);
        assert_eq!(
            attr_with(vec![Value::from(1), Value::from("2"), Value::from("x")]).most_common_type(),
            Some(ValueType::Numeric)
        );
        assert_eq!(
            attr_with(vec![Value::from("red"), Value::from("blue")]).most_common_type(),
            Some(ValueType::Categorical)
        );
        // Numeric covers only one of three non-empty values
        assert_eq!(
            attr_with(vec![Value::from(1), Value::from("x"), Value::from("y")]).most_common_type(),
            Some(ValueType::Categorical)
        );
        assert_eq!(
            attr_with(vec![Value::from("2020-01-05"), Value::from("3/4/2021"), Value::Empty])
                .most_common_type(),
            Some(ValueType::Date)
        );
        assert_eq!(
            attr_with(vec![Value::from("ccimg://fbrtdb.concord.org/img"), Value::from("a.png")])
                .most_common_type(),
            Some(ValueType::Image)
        );
    }

    #[test]
    fn test_inferred_type_resets_on_change() {
        let mut attr = attr_with(vec![Value::from("a")]);
        assert_eq!(attr.most_common_type(), Some(ValueType::Categorical));
        attr.set_value(0, Value::from(5));
        assert_eq!(attr.most_common_type(), Some(ValueType::Numeric));
    }

    #[test]
    fn test_image_patterns() {
        assert!(is_image_like("https://example.com/cat.JPG"));
        assert!(is_image_like("data:image/png;base64,AAAA"));
        assert!(!is_image_like("hi"));
        assert!(!is_image_like("4/5 + 3.456"));
    }

    #[test]
    fn test_derive_drops_values() {
        let mut attr = attr_with(vec![Value::from(1)]);
        attr.set_units("cm");
        let derived = attr.derive(None);
        assert_eq!(derived.id(), attr.id());
        assert_eq!(derived.name(), "a");
        assert_eq!(derived.units(), "cm");
        assert!(derived.is_empty());
        assert_eq!(attr.derive(Some("b")).name(), "b");
    }
}
