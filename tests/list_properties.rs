//! Property-based tests for list invariants
//!
//! Uses proptest to check identity and name uniqueness, the field
//! encryption round trip and the shape of update extracts over arbitrary
//! inputs.

mod common;

use std::collections::HashSet;

use common::*;
use entity_lists::crypto::{decrypt_string, encrypt_string, ControlKey};
use entity_lists::list::NewEntity;
use entity_lists::models::{Change, EncryptedField, EntityId};
use entity_lists::ListError;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{0,30}"
}

/// Names from a tiny alphabet so collisions are common
fn colliding_name_strategy() -> impl Strategy<Value = String> {
    "[a-c]{1,2}"
}

fn id_strategy() -> impl Strategy<Value = i32> {
    1..20i32
}

fn key_strategy() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>()
}

fn unique_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(name_strategy(), 0..max)
        .prop_map(|names| names.into_iter().collect())
}

// ============================================================================
// Identity
// ============================================================================

mod identity_properties {
    use super::*;

    proptest! {
        #[test]
        fn ids_stay_pairwise_distinct(ids in prop::collection::vec(id_strategy(), 1..30)) {
            let mut list = empty_list();
            let mut seen = HashSet::new();

            for (position, id) in ids.iter().enumerate() {
                let before = list.len();
                let item = NewEntity::new(TaxTypeClass::Income, format!("item {}", position))
                    .with_id(EntityId::new(*id));
                let result = list.add_item(item);

                if seen.insert(*id) {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(list.len(), before + 1);
                } else {
                    let is_duplicate_id = matches!(result, Err(ListError::DuplicateId { .. }));
                    prop_assert!(is_duplicate_id);
                    prop_assert_eq!(list.len(), before);
                }
            }

            let ids: HashSet<EntityId> = list.iter().map(|e| e.id()).collect();
            prop_assert_eq!(ids.len(), list.len());
        }

        #[test]
        fn allocated_ids_never_collide(count in 1..25usize) {
            let mut list = list_of(&[(7, "seed")]);
            for i in 0..count {
                list.add_item(NewEntity::new(TaxTypeClass::Social, format!("n{}", i)))
                    .unwrap();
            }

            let ids: HashSet<EntityId> = list.iter().map(|e| e.id()).collect();
            prop_assert_eq!(ids.len(), count + 1);
            prop_assert!(list.iter().all(|e| !e.id().is_provisional()));
        }
    }
}

// ============================================================================
// Names
// ============================================================================

mod name_properties {
    use super::*;

    proptest! {
        #[test]
        fn enabled_names_stay_distinct(
            names in prop::collection::vec(colliding_name_strategy(), 1..20),
        ) {
            let mut list = empty_list();
            let mut seen = HashSet::new();

            for name in &names {
                let before = list.len();
                let result = list.add_item(NewEntity::new(TaxTypeClass::Other, name.clone()));

                if seen.insert(name.clone()) {
                    prop_assert!(result.is_ok());
                } else {
                    let is_duplicate_name = matches!(result, Err(ListError::DuplicateName { .. }));
                    prop_assert!(is_duplicate_name);
                    prop_assert_eq!(list.len(), before);
                }
            }

            let enabled: Vec<&str> = list.active().filter_map(|e| e.name()).collect();
            let distinct: HashSet<&str> = enabled.iter().copied().collect();
            prop_assert_eq!(distinct.len(), enabled.len());
        }

        #[test]
        fn disabled_items_may_share_names(name in name_strategy(), copies in 1..5usize) {
            let mut list = list_of(&[(1, name.as_str())]);
            for _ in 0..copies {
                prop_assert!(list
                    .add_item(NewEntity::new(TaxTypeClass::Income, name.clone()).disabled())
                    .is_ok());
            }

            prop_assert_eq!(list.len(), copies + 1);
            prop_assert_eq!(list.active().count(), 1);
        }
    }
}

// ============================================================================
// Encryption
// ============================================================================

mod encryption_properties {
    use super::*;

    proptest! {
        #[test]
        fn decrypt_inverts_encrypt(value in ".{0,100}", key in key_strategy()) {
            let key = ControlKey::from_bytes(CONTROL, key);
            let sealed = encrypt_string(&value, &key).unwrap();
            prop_assert_eq!(decrypt_string(&sealed, &key).unwrap(), value);
        }

        #[test]
        fn reading_a_sealed_field_keeps_its_ciphertext(value in ".{0,100}", key in key_strategy()) {
            let key = ControlKey::from_bytes(CONTROL, key);
            let sealed = encrypt_string(&value, &key).unwrap();

            let mut field = EncryptedField::from_ciphertext(CONTROL, sealed.clone());
            let clear = field.decrypt(&key).unwrap().to_string();
            prop_assert_eq!(clear, value);
            prop_assert_eq!(field.ciphertext(&key).unwrap(), &sealed);
        }

        #[test]
        fn sealed_lists_reload_unchanged(names in unique_names(10)) {
            let pairs: Vec<(i32, &str)> = names
                .iter()
                .enumerate()
                .map(|(i, n)| (i as i32 + 1, n.as_str()))
                .collect();
            let mut source = list_of(&pairs);
            let records = source.seal_all().unwrap();

            let mut reloaded = empty_list();
            for (position, record) in records.iter().enumerate() {
                reloaded
                    .add_item(
                        NewEntity::sealed(
                            record.id,
                            record.control_id,
                            TaxTypeClass::Income,
                            record.name.clone(),
                        )
                        .with_order(position as i32),
                    )
                    .unwrap();
            }

            prop_assert_eq!(reloaded.seal_all().unwrap(), records);
            prop_assert!(reloaded.diff_against(&source).unwrap().is_empty());
        }
    }
}

// ============================================================================
// Edit sessions
// ============================================================================

mod session_properties {
    use super::*;

    proptest! {
        #[test]
        fn untouched_session_has_no_changes(names in unique_names(15)) {
            let pairs: Vec<(i32, &str)> = names
                .iter()
                .enumerate()
                .map(|(i, n)| (i as i32 + 1, n.as_str()))
                .collect();
            let core = list_of(&pairs);

            let edit = core.to_edit_list().unwrap();
            prop_assert!(edit.to_update_extract().unwrap().is_empty());
        }

        #[test]
        fn removals_become_deletions(
            names in unique_names(15),
            remove in prop::collection::vec(any::<bool>(), 15),
        ) {
            let pairs: Vec<(i32, &str)> = names
                .iter()
                .enumerate()
                .map(|(i, n)| (i as i32 + 1, n.as_str()))
                .collect();
            let core = list_of(&pairs);
            let mut edit = core.to_edit_list().unwrap();

            let mut removed = HashSet::new();
            for (id, _) in &pairs {
                if remove[(*id - 1) as usize] {
                    edit.remove_item(EntityId::new(*id)).unwrap();
                    removed.insert(EntityId::new(*id));
                }
            }

            let extract = edit.to_update_extract().unwrap();
            prop_assert_eq!(extract.len(), removed.len());
            let deleted: HashSet<EntityId> = extract
                .with_change(Change::Deleted)
                .map(|e| e.id())
                .collect();
            prop_assert_eq!(deleted, removed);
            prop_assert!(extract.iter().all(|e| !e.is_enabled()));
        }
    }
}
