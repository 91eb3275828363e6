// Data set behavior through the public API.
// Run with: cargo test -p caseset-engine --test dataset_tests

use std::cell::RefCell;
use std::rc::Rc;

use caseset_engine::{
    AttributeId, AttributeSpec, CanonicalCase, Case, CaseId, CaseMove, DataSet, DataSetConfig, DataSetSnapshot,
    InsertAt, Mutation, MutationCollector, SortDirection, Value,
};

fn with_a(cases: Vec<Case>) -> DataSet {
    let mut ds = DataSet::new("data");
    ds.add_attribute(AttributeSpec::named("A").with_id("A"), None);
    ds.add_cases_with_ids(cases, InsertAt::End);
    ds
}

fn order(ds: &DataSet) -> Vec<&str> {
    ds.case_ids().iter().map(|id| id.as_str()).collect()
}

#[test]
fn test_sort_is_stable_for_equal_values() {
    let mut ds = with_a(vec![
        Case::new("1").with("A", "same"),
        Case::new("2").with("A", "same"),
        Case::new("3").with("A", "same"),
    ]);
    let moves = ds.sort_by_attribute(&AttributeId::from("A"), SortDirection::Ascending);
    assert!(moves.is_empty());
    assert_eq!(order(&ds), vec!["1", "2", "3"]);
    ds.sort_by_attribute(&AttributeId::from("A"), SortDirection::Descending);
    assert_eq!(order(&ds), vec!["1", "2", "3"]);
}

#[test]
fn test_missing_values_sort_first() {
    let mut ds = with_a(vec![Case::new("1").with("A", "x"), Case::new("2"), Case::new("3").with("A", "y")]);
    let moves = ds.sort_by_attribute(&AttributeId::from("A"), SortDirection::Ascending);
    assert_eq!(order(&ds), vec!["2", "1", "3"]);
    assert_eq!(moves.len(), 2);
    assert_eq!(moves[&CaseId::from("2")], CaseMove { before_index: 1, after_index: 0 });

    ds.sort_by_attribute(&AttributeId::from("A"), SortDirection::Descending);
    assert_eq!(order(&ds), vec!["3", "1", "2"]);
}

#[test]
fn test_sort_mixes_numbers_and_text() {
    let mut ds = with_a(vec![
        Case::new("1").with("A", 10),
        Case::new("2").with("A", "apple"),
        Case::new("3").with("A", 9),
        Case::new("4").with("A", "Banana"),
    ]);
    ds.sort_by_attribute(&AttributeId::from("A"), SortDirection::Ascending);
    let sorted: Vec<String> = (0..4).map(|i| ds.get_str_value_at_index(i, &"A".into())).collect();
    assert_eq!(sorted, vec!["9", "10", "apple", "Banana"]);
}

#[test]
fn test_sort_keeps_columns_aligned() {
    let mut ds = with_a(vec![
        Case::new("1").with("A", 3).with("B", "three"),
        Case::new("2").with("A", 1).with("B", "one"),
    ]);
    ds.add_attribute(AttributeSpec::named("B").with_id("B"), None);
    ds.set_case_values(vec![Case::new("1").with("B", "three"), Case::new("2").with("B", "one")]);
    ds.sort_by_attribute(&AttributeId::from("A"), SortDirection::Ascending);
    assert_eq!(ds.get_case_at_index(0), Some(Case::new("2").with("A", 1).with("B", "one")));
}

#[test]
fn test_canonical_and_named_views_agree() {
    let mut ds = DataSet::new("data");
    ds.add_attribute(AttributeSpec::named("str").with_id("S"), None);
    ds.add_attribute(AttributeSpec::named("num").with_id("N"), None);
    let ids = ds.add_canonical_cases(
        vec![
            CanonicalCase::new("").with("S", "a").with("N", 1),
            CanonicalCase::new("k").with("N", 2),
        ],
        InsertAt::End,
    );
    assert_eq!(ids.len(), 2);
    for id in &ids {
        let named = ds.get_case(id).unwrap();
        let canonical = ds.get_canonical_case(id).unwrap();
        assert_eq!(named.id, canonical.id);
        for attribute in ds.attributes() {
            assert_eq!(named.get(attribute.name()), canonical.get(attribute.id()));
        }
    }
    assert_eq!(ds.get_case(&CaseId::from("k")).unwrap().get("str"), Some(&Value::Empty));
}

#[test]
fn test_pseudo_case_needs_every_child() {
    let mut ds = with_a(vec![Case::new("1"), Case::new("2"), Case::new("3")]);
    let group = CaseId::from("group");
    ds.set_pseudo_case(group.clone(), vec![CaseId::from("1"), CaseId::from("2"), CaseId::from("3")]);

    ds.select_cases(&[CaseId::from("1"), CaseId::from("2")], true);
    assert!(!ds.is_case_selected(&group));
    ds.select_cases(&[CaseId::from("3")], true);
    assert!(ds.is_case_selected(&group));
}

#[test]
fn test_selection_policy_from_settings() {
    let settings = caseset_config::Settings {
        cells_select_cases: true,
        ..Default::default()
    };
    let mut ds = DataSet::with_config(Some("data".into()), DataSetConfig::from(&settings));
    ds.add_attribute(AttributeSpec::named("A").with_id("A"), None);
    ds.add_cases_with_ids(vec![Case::new("1")], InsertAt::End);
    ds.select_all_cells();
    assert!(ds.is_case_selected(&CaseId::from("1")));
}

#[test]
fn test_every_mutator_notifies_after_applying() {
    let mut ds = with_a(vec![Case::new("1").with("A", 2), Case::new("2").with("A", 1)]);
    let seen = Rc::new(RefCell::new(MutationCollector::new()));
    let sink = seen.clone();
    ds.add_action_listener("grid", move |ds, m| {
        if let Mutation::RemoveCases { case_ids } = m {
            assert!(case_ids.iter().all(|id| !ds.contains_case(id)));
        }
        sink.borrow_mut().push(m.clone());
    });

    let a = AttributeId::from("A");
    ds.set_name(Some("renamed".into()));
    ds.set_attribute_units(&a, "cm");
    ds.set_attribute_precision(&a, Some(2));
    ds.set_attribute_formula(&a, Some("B * 2".into()));
    ds.begin_transaction();
    ds.sort_by_attribute(&a, SortDirection::Ascending);
    ds.remove_cases(vec![CaseId::from("1")]);
    ds.end_transaction();
    ds.move_attribute(&a, None);
    ds.select_all_cases();

    assert_eq!(
        seen.borrow().names(),
        vec![
            "setName",
            "setAttributeUnits",
            "setAttributePrecision",
            "setAttributeFormula",
            "beginTransaction",
            "sortByAttribute",
            "removeCases",
            "endTransaction",
            "moveAttribute",
            "selectionChanged",
        ]
    );
    assert_eq!(ds.attribute(&a).unwrap().formula(), Some("B * 2"));
    assert_eq!(ds.attribute(&a).unwrap().units(), "cm");
}

#[test]
fn test_unknown_ids_are_lenient() {
    let mut ds = with_a(vec![Case::new("1")]);
    let missing = AttributeId::from("missing");
    assert!(ds.remove_attribute(&missing).is_none());
    ds.move_attribute(&missing, None);
    ds.set_attribute_name(&missing, "x");
    ds.remove_cases(vec![CaseId::from("nope")]);
    assert_eq!(ds.get_case(&CaseId::from("nope")), None);
    assert_eq!(ds.get_value_at_index(10, &AttributeId::from("A")), None);
    assert_eq!(ds.case_count(), 1);
    assert_eq!(ds.attribute_count(), 1);
}

#[test]
fn test_snapshot_import_shape() {
    let json = r#"{
        "id": "ds-1",
        "name": "imported",
        "attributes": [
            { "id": "A", "name": "a", "values": [1, "two", null] },
            { "id": "B", "name": "b", "units": "kg", "values": [] }
        ],
        "cases": ["c1", "c2", "c3"]
    }"#;
    let snapshot = DataSetSnapshot::from_json(json).unwrap();
    let ds = DataSet::from_snapshot(snapshot, DataSetConfig::default());
    assert_eq!(ds.id().as_str(), "ds-1");
    assert_eq!(ds.get_case(&CaseId::from("c2")).unwrap().get("a"), Some(&Value::from("two")));
    assert_eq!(ds.attribute(&"B".into()).unwrap().len(), 3);
    assert_eq!(ds.attribute_by_name("b").unwrap().units(), "kg");
}
