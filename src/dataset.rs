//! Dataset container
//!
//! A dataset owns the CORE list of every installed kind together with the
//! key resolver and the control id its new items are sealed under. It is
//! the entry point for building lists bound to those keys.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use tracing::info;

use crate::audit::{self, AuditEntry};
use crate::crypto::SharedKeys;
use crate::error::{ListError, ListResult};
use crate::list::{EntityList, ListStyle};
use crate::models::{Change, ControlId, EntityKind};

/// Type-erased view of an `EntityList<K>`
trait AnyList {
    fn kind_name(&self) -> &'static str;
    fn len(&self) -> usize;
    fn change_count(&self, change: Change) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any_box(self: Box<Self>) -> Box<dyn Any>;
    fn deep_copy_core(&self, target: &DataSet) -> ListResult<Box<dyn AnyList>>;
    fn diff_boxed(&self, previous: Option<&dyn AnyList>) -> ListResult<Box<dyn AnyList>>;
    fn removed_boxed(&self) -> ListResult<Box<dyn AnyList>>;
    fn audit_trail(&self) -> ListResult<Vec<AuditEntry>>;
}

impl<K: EntityKind> AnyList for EntityList<K> {
    fn kind_name(&self) -> &'static str {
        K::KIND_NAME
    }

    fn len(&self) -> usize {
        EntityList::len(self)
    }

    fn change_count(&self, change: Change) -> usize {
        self.with_change(change).count()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any_box(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn deep_copy_core(&self, target: &DataSet) -> ListResult<Box<dyn AnyList>> {
        Ok(Box::new(self.deep_copy(target)?.into_core()?))
    }

    fn diff_boxed(&self, previous: Option<&dyn AnyList>) -> ListResult<Box<dyn AnyList>> {
        let previous = previous.and_then(|p| p.as_any().downcast_ref::<EntityList<K>>());
        let diff = match previous {
            Some(previous) => self.diff_against(previous)?,
            None => self.diff_against(&self.empty_core())?,
        };
        Ok(Box::new(diff))
    }

    fn removed_boxed(&self) -> ListResult<Box<dyn AnyList>> {
        Ok(Box::new(self.empty_core().diff_against(self)?))
    }

    fn audit_trail(&self) -> ListResult<Vec<AuditEntry>> {
        audit::trail(self)
    }
}

impl<K: EntityKind> EntityList<K> {
    fn empty_core(&self) -> EntityList<K> {
        EntityList::new(self.control_id(), self.shared_keys().clone())
    }
}

/// The authoritative lists of one dataset
pub struct DataSet {
    control_id: ControlId,
    keys: SharedKeys,
    lists: HashMap<TypeId, Box<dyn AnyList>>,
}

impl DataSet {
    /// Create an empty dataset sealing new items under `control_id`
    pub fn new(control_id: ControlId, keys: SharedKeys) -> Self {
        Self {
            control_id,
            keys,
            lists: HashMap::new(),
        }
    }

    pub fn control_id(&self) -> ControlId {
        self.control_id
    }

    pub fn keys(&self) -> &SharedKeys {
        &self.keys
    }

    /// Number of installed kinds
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Names of the installed kinds, sorted
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.lists.values().map(|l| l.kind_name()).collect();
        kinds.sort_unstable();
        kinds
    }

    /// An empty CORE list bound to this dataset's keys
    ///
    /// The list is not installed; load it, then hand it to [`DataSet::install`].
    pub fn new_core_list<K: EntityKind>(&self) -> EntityList<K> {
        EntityList::new(self.control_id, self.keys.clone())
    }

    /// Make `list` the CORE list of its kind, returning the one it replaces
    pub fn install<K: EntityKind>(
        &mut self,
        list: EntityList<K>,
    ) -> ListResult<Option<EntityList<K>>> {
        if list.style() != ListStyle::Core {
            return Err(ListError::unsupported("install", list.style()));
        }

        let replaced = self
            .lists
            .insert(TypeId::of::<K>(), Box::new(list))
            .and_then(|old| old.into_any_box().downcast::<EntityList<K>>().ok())
            .map(|old| *old);
        Ok(replaced)
    }

    pub fn core_list<K: EntityKind>(&self) -> Option<&EntityList<K>> {
        self.lists
            .get(&TypeId::of::<K>())
            .and_then(|l| l.as_any().downcast_ref())
    }

    pub fn core_list_mut<K: EntityKind>(&mut self) -> Option<&mut EntityList<K>> {
        self.lists
            .get_mut(&TypeId::of::<K>())
            .and_then(|l| l.as_any_mut().downcast_mut())
    }

    /// Like [`DataSet::core_list`], failing with `MissingList`
    pub fn require_list<K: EntityKind>(&self) -> ListResult<&EntityList<K>> {
        self.core_list()
            .ok_or(ListError::MissingList(K::LIST_NAME))
    }

    /// Start an edit session over the CORE list of kind `K`
    pub fn begin_edit<K: EntityKind>(&self) -> ListResult<EntityList<K>> {
        self.require_list::<K>()?.to_edit_list()
    }

    /// Commit an edit session and install the result as the new CORE list
    ///
    /// Returns the update extract for the persistence layer. On success the
    /// session is moved into the dataset and `edit` is left as an empty CORE
    /// list. On failure nothing changes and the session keeps its errors.
    pub fn commit_edit<K: EntityKind>(
        &mut self,
        edit: &mut EntityList<K>,
    ) -> ListResult<EntityList<K>> {
        let extract = edit.commit()?;
        let committed = std::mem::replace(edit, self.new_core_list());
        self.install(committed)?;
        Ok(extract)
    }

    /// Deep-copy every installed list into `target`, replacing its lists
    pub fn deep_copy_into(&self, target: &mut DataSet) -> ListResult<()> {
        let mut copies = Vec::with_capacity(self.lists.len());
        for (type_id, list) in &self.lists {
            copies.push((*type_id, list.deep_copy_core(target)?));
        }

        let count = copies.len();
        for (type_id, copy) in copies {
            target.lists.insert(type_id, copy);
        }

        info!(kinds = count, control = %target.control_id, "Deep-copied dataset");
        Ok(())
    }

    /// Compare every kind against an earlier dataset
    ///
    /// Kinds only installed here diff against an empty list; kinds only
    /// installed in `previous` come out fully deleted.
    pub fn diff_against(&self, previous: &DataSet) -> ListResult<DataSetDiff> {
        let mut lists: HashMap<TypeId, Box<dyn AnyList>> = HashMap::new();

        for (type_id, list) in &self.lists {
            let prior = previous.lists.get(type_id).map(|p| &**p);
            lists.insert(*type_id, list.diff_boxed(prior)?);
        }
        for (type_id, prior) in &previous.lists {
            if !self.lists.contains_key(type_id) {
                lists.insert(*type_id, prior.removed_boxed()?);
            }
        }

        Ok(DataSetDiff { lists })
    }
}

impl fmt::Debug for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSet")
            .field("control_id", &self.control_id)
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// DIFF lists of every kind of two datasets
pub struct DataSetDiff {
    lists: HashMap<TypeId, Box<dyn AnyList>>,
}

impl DataSetDiff {
    /// The DIFF list for kind `K`, if either dataset had one
    pub fn list<K: EntityKind>(&self) -> Option<&EntityList<K>> {
        self.lists
            .get(&TypeId::of::<K>())
            .and_then(|l| l.as_any().downcast_ref())
    }

    /// Total number of changed records across all kinds
    pub fn len(&self) -> usize {
        self.lists.values().map(|l| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records carrying `change` across all kinds
    pub fn count(&self, change: Change) -> usize {
        self.lists.values().map(|l| l.change_count(change)).sum()
    }

    /// Audit entries for every change, grouped by kind name
    pub fn audit_trail(&self) -> ListResult<Vec<AuditEntry>> {
        let mut lists: Vec<_> = self.lists.values().collect();
        lists.sort_by_key(|l| l.kind_name());

        let mut entries = Vec::new();
        for list in lists {
            entries.extend(list.audit_trail()?);
        }
        Ok(entries)
    }
}

impl fmt::Debug for DataSetDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSetDiff")
            .field("changes", &self.len())
            .finish()
    }
}
