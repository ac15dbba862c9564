//! Diff and copy behaviour across independently built snapshots

mod common;

use common::*;
use entity_lists::list::NewEntity;
use entity_lists::models::{Change, EntityId, Field, ValidationFailure};
use entity_lists::{ListError, ListStyle};
use pretty_assertions::assert_eq;

fn names_with(list: &entity_lists::EntityList<TaxType>, change: Change) -> Vec<String> {
    list.with_change(change)
        .filter_map(|e| e.name().map(str::to_string))
        .collect()
}

// ============================================================================
// Diff
// ============================================================================

#[test]
fn added_and_deleted_records_are_reported() {
    init_tracing();
    let previous = list_of(&[(1, "x"), (2, "y")]);
    let current = list_of(&[(1, "x"), (3, "z")]);

    let diff = current.diff_against(&previous).unwrap();

    assert_eq!(diff.style(), ListStyle::Diff);
    assert_eq!(diff.len(), 2);
    assert_eq!(names_with(&diff, Change::Added), vec!["z".to_string()]);
    assert_eq!(names_with(&diff, Change::Deleted), vec!["y".to_string()]);
    assert_eq!(diff.with_change(Change::Modified).count(), 0);

    let deleted = diff.with_change(Change::Deleted).next().unwrap();
    assert_eq!(deleted.id(), EntityId::new(2));
    assert!(!deleted.is_enabled());
}

#[test]
fn modified_record_links_to_previous_state() {
    let mut previous = empty_list();
    previous
        .add_item(
            NewEntity::new(TaxTypeClass::Income, "x")
                .with_id(EntityId::new(1))
                .with_order(1),
        )
        .unwrap();
    let mut current = empty_list();
    current
        .add_item(
            NewEntity::new(TaxTypeClass::Income, "x2")
                .with_id(EntityId::new(1))
                .with_order(1),
        )
        .unwrap();

    let diff = current.diff_against(&previous).unwrap();

    assert_eq!(diff.len(), 1);
    let modified = diff.iter().next().unwrap();
    assert_eq!(modified.change(), Some(Change::Modified));
    assert_eq!(modified.name(), Some("x2"));
    let base = diff.base_of(modified).unwrap();
    assert_eq!(base.name(), Some("x"));
    assert_eq!(base.id(), modified.id());
}

#[test]
fn order_only_change_is_a_modification() {
    let previous = list_of(&[(1, "x"), (2, "y")]);
    let mut edit = previous.to_edit_list().unwrap();
    edit.edit_item(EntityId::new(1), |e| e.set_order(5)).unwrap();
    edit.commit().unwrap();

    let diff = edit.diff_against(&previous).unwrap();
    assert_eq!(diff.len(), 1);
    assert_eq!(names_with(&diff, Change::Modified), vec!["x".to_string()]);
}

#[test]
fn diff_refuses_change_sets() {
    let core = list_of(&[(1, "x")]);
    let edit = core.to_edit_list().unwrap();

    let err = edit.diff_against(&core).unwrap_err();
    assert!(matches!(
        err,
        ListError::UnsupportedOperation {
            style: ListStyle::Edit,
            ..
        }
    ));
}

#[test]
fn diff_of_sealed_and_cleartext_inputs_compares_values() {
    let mut sealed_source = list_of(&[(1, "x")]);
    let records = sealed_source.seal_all().unwrap();

    let mut reloaded = empty_list();
    for record in records {
        reloaded
            .add_item(
                NewEntity::sealed(record.id, record.control_id, TaxTypeClass::Income, record.name)
                    .with_order(0),
            )
            .unwrap();
    }

    let diff = reloaded.diff_against(&list_of(&[(1, "x")])).unwrap();
    assert!(diff.is_empty());
}

// ============================================================================
// Deep copy
// ============================================================================

#[test]
fn deep_copy_shares_nothing_with_source() {
    let source = list_of(&[(1, "x"), (2, "y")]);
    let target = dataset();

    let clone = source.deep_copy(&target).unwrap();

    assert_eq!(clone.style(), ListStyle::Clone);
    assert_eq!(clone.len(), source.len());
    for (copy, original) in clone.iter().zip(source.iter()) {
        assert!(!std::ptr::eq(copy, original));
        assert!(!std::ptr::eq(copy.name_field(), original.name_field()));
        assert!(copy.is_identical(original));
    }
}

#[test]
fn committing_over_the_source_leaves_copies_alone() {
    let mut core = list_of(&[(1, "x")]);
    let copy = core.shallow_copy().unwrap();

    let mut session = core.to_edit_list().unwrap();
    session
        .edit_item(EntityId::new(1), |e| e.set_name("changed"))
        .unwrap();
    session.commit().unwrap();
    core = session;

    assert_eq!(core.find_by_id(EntityId::new(1)).unwrap().name(), Some("changed"));
    assert_eq!(copy.find_by_id(EntityId::new(1)).unwrap().name(), Some("x"));
}

#[test]
fn deep_copy_rebinds_to_target_control() {
    let mut source = list_of(&[(1, "x")]);
    let source_records = source.seal_all().unwrap();
    let target = entity_lists::DataSet::new(OTHER_CONTROL, shared_keys());

    let mut clone = source.deep_copy(&target).unwrap();
    let clone_records = clone.seal_all().unwrap();

    assert_eq!(clone.control_id(), OTHER_CONTROL);
    assert_eq!(clone_records[0].control_id, OTHER_CONTROL);
    assert_ne!(clone_records[0].name, source_records[0].name);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn empty_name_always_has_errors() {
    let core = list_of(&[(1, "x")]);
    let mut edit = core.to_edit_list().unwrap();

    let id = edit.add_new_item(TaxTypeClass::Social, |_| {}).unwrap();
    let item = edit.find_by_id(id).unwrap();

    assert!(item.has_errors());
    assert!(!item.errors().is_empty());
    assert!(item
        .errors()
        .contains(Field::Name, &ValidationFailure::Missing));
}

#[test]
fn empty_name_is_refused_by_add_item() {
    let mut list = list_of(&[(1, "x")]);

    let err = list
        .add_item(NewEntity::new(TaxTypeClass::Other, "   "))
        .unwrap_err();

    let errors = err.validation_errors().unwrap();
    assert!(errors.has(Field::Name));
    assert_eq!(list.len(), 1);
}

#[test]
fn kind_name_rule_applies() {
    let mut list = empty_list();
    let err = list
        .add_item(NewEntity::new(TaxTypeClass::Income, " leading"))
        .unwrap_err();

    assert!(err.validation_errors().unwrap().contains(
        Field::Name,
        &ValidationFailure::Rule("must not start with whitespace")
    ));
}
