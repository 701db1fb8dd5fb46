/*
 * plugin/data.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Per-plugin opaque data storage.
 */

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{PluginDataScope, PluginId};
use crate::error::{CodeBlockError, Result};

/// Opaque, caller-typed data keyed by plugin identity.
///
/// Each plugin owns at most one value per store. The first access stores the
/// supplied default; later accesses hand back the same shared container, so
/// in-place mutations made in one hook are visible in the next.
pub struct PluginDataStore {
    scope: PluginDataScope,
    entries: HashMap<PluginId, Rc<dyn Any>>,
}

impl PluginDataStore {
    pub fn new(scope: PluginDataScope) -> Self {
        Self {
            scope,
            entries: HashMap::new(),
        }
    }

    /// Get the plugin's value, storing `default()` first if there is none.
    ///
    /// Fails with [`CodeBlockError::PluginDataType`] if the stored value has
    /// a different type than requested.
    pub fn get_or_insert_with<T: 'static>(
        &mut self,
        plugin: PluginId,
        plugin_name: &str,
        default: impl FnOnce() -> T,
    ) -> Result<Rc<RefCell<T>>> {
        let entry = self
            .entries
            .entry(plugin)
            .or_insert_with(|| Rc::new(RefCell::new(default())) as Rc<dyn Any>);
        Rc::clone(entry)
            .downcast::<RefCell<T>>()
            .map_err(|_| CodeBlockError::PluginDataType {
                plugin: plugin_name.to_string(),
                scope: self.scope,
                expected: type_name::<T>(),
            })
    }

    pub fn scope(&self) -> PluginDataScope {
        self.scope
    }

    pub fn contains(&self, plugin: PluginId) -> bool {
        self.entries.contains_key(&plugin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discard every plugin's value.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for PluginDataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDataStore")
            .field("scope", &self.scope)
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stored_on_first_access() {
        let mut store = PluginDataStore::new(PluginDataScope::Block);
        let first = store
            .get_or_insert_with(PluginId(0), "p", || vec![1])
            .unwrap();
        first.borrow_mut().push(2);

        let again = store
            .get_or_insert_with(PluginId(0), "p", || vec![99])
            .unwrap();
        assert_eq!(*again.borrow(), vec![1, 2]);
        assert!(Rc::ptr_eq(&first, &again));
    }

    #[test]
    fn test_plugins_are_isolated() {
        let mut store = PluginDataStore::new(PluginDataScope::Global);
        store
            .get_or_insert_with(PluginId(0), "same", || 1u32)
            .unwrap();
        let other = store
            .get_or_insert_with(PluginId(1), "same", || 2u32)
            .unwrap();
        assert_eq!(*other.borrow(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let mut store = PluginDataStore::new(PluginDataScope::Global);
        store
            .get_or_insert_with(PluginId(0), "p", || 1u32)
            .unwrap();
        let err = store
            .get_or_insert_with(PluginId(0), "p", String::new)
            .unwrap_err();
        assert!(matches!(
            err,
            CodeBlockError::PluginDataType {
                scope: PluginDataScope::Global,
                ..
            }
        ));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut store = PluginDataStore::new(PluginDataScope::Block);
        store
            .get_or_insert_with(PluginId(3), "p", || 0i64)
            .unwrap();
        assert!(store.contains(PluginId(3)));
        store.clear();
        assert!(store.is_empty());
    }
}
