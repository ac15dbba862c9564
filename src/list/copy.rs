//! Independent duplicates of a list
//!
//! Copies never share an entity with their source. A shallow copy keeps the
//! source's key binding; a deep copy is rebound to another dataset and drops
//! every cached ciphertext so nothing sealed for the source leaks into it.

use tracing::{debug, info};

use crate::crypto::KeyResolver;
use crate::dataset::DataSet;
use crate::error::{ListError, ListResult};
use crate::models::{Entity, EntityKind};

use super::{EntityList, ListStyle};

impl<K: EntityKind> EntityList<K> {
    /// Duplicate this list as a COPY sharing the same key resolver
    ///
    /// Base links and change tags are not carried over.
    pub fn shallow_copy(&self) -> ListResult<EntityList<K>> {
        self.require_copyable("shallow_copy")?;

        let mut copy = self.derived(ListStyle::Copy);
        copy.items = self
            .items
            .iter()
            .map(|item| Entity::derive_from(item, None))
            .collect();

        debug!(kind = K::KIND_NAME, items = copy.items.len(), "Made shallow copy");
        Ok(copy)
    }

    /// Duplicate this list as a CLONE bound to `target`
    ///
    /// Every item moves to the target's control id and keys. Cached
    /// ciphertext is dropped even when the control id is unchanged.
    pub fn deep_copy(&self, target: &DataSet) -> ListResult<EntityList<K>> {
        self.require_copyable("deep_copy")?;
        target.keys().resolve(target.control_id())?;

        let mut clone =
            EntityList::with_style(ListStyle::Clone, target.control_id(), target.keys().clone());
        clone.high_water = self.high_water;
        for item in &self.items {
            let mut copy = Entity::derive_from(item, None);
            copy.rebind(target.control_id(), &*self.keys)?;
            clone.items.push(copy);
        }

        info!(
            kind = K::KIND_NAME,
            items = clone.items.len(),
            control = %target.control_id(),
            "Made deep copy"
        );
        Ok(clone)
    }

    fn require_copyable(&self, operation: &'static str) -> ListResult<()> {
        if self.style.is_change_set() {
            Err(ListError::unsupported(operation, self.style))
        } else {
            Ok(())
        }
    }
}
