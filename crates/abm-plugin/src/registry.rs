//! `DataManagerRegistry` — type-keyed storage for data managers.
//!
//! # Design
//!
//! Each data manager `D` is stored as a `Box<dyn Any>` in a map keyed by
//! `TypeId::of::<D>()`, so lookup is one hash probe plus a downcast.  There
//! are no defaults: asking for a type nobody registered is an error, never
//! a silently created empty manager.
//!
//! The registry is sealed when the run loop starts; registrations after
//! that point fail.

use std::any::{type_name, Any, TypeId};

use abm_core::PluginId;
use rustc_hash::FxHashMap;

use crate::error::{PluginError, PluginResult};

/// Marker for types that can be registered as data managers.
pub trait DataManager: Any {}

struct Entry {
    name:    &'static str,
    owner:   PluginId,
    manager: Box<dyn Any>,
}

#[derive(Default)]
pub struct DataManagerRegistry {
    entries: FxHashMap<TypeId, Entry>,
    /// Registration order, for listing.
    order:   Vec<TypeId>,
    sealed:  bool,
}

impl DataManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `manager` on behalf of plugin `owner`.
    pub fn register<D: DataManager>(&mut self, owner: PluginId, manager: D) -> PluginResult<()> {
        let name = type_name::<D>();
        if self.sealed {
            return Err(PluginError::DataManagerAfterStart(name));
        }
        let key = TypeId::of::<D>();
        if self.entries.contains_key(&key) {
            return Err(PluginError::DuplicateDataManager(name));
        }
        self.entries.insert(key, Entry { name, owner, manager: Box::new(manager) });
        self.order.push(key);
        Ok(())
    }

    /// Refuse further registrations.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn get<D: DataManager>(&self) -> PluginResult<&D> {
        self.entries
            .get(&TypeId::of::<D>())
            .and_then(|e| e.manager.downcast_ref::<D>())
            .ok_or(PluginError::UnknownDataManager(type_name::<D>()))
    }

    pub fn get_mut<D: DataManager>(&mut self) -> PluginResult<&mut D> {
        self.entries
            .get_mut(&TypeId::of::<D>())
            .and_then(|e| e.manager.downcast_mut::<D>())
            .ok_or(PluginError::UnknownDataManager(type_name::<D>()))
    }

    pub fn contains<D: DataManager>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<D>())
    }

    /// The plugin that registered `D`.
    pub fn owner_of<D: DataManager>(&self) -> Option<PluginId> {
        self.entries.get(&TypeId::of::<D>()).map(|e| e.owner)
    }

    /// `(type name, owning plugin)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, PluginId)> + '_ {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(k))
            .map(|e| (e.name, e.owner))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
