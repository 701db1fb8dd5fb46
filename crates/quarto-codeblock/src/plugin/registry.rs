/*
 * plugin/registry.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Ordered plugin registry with per-hook dispatch lists.
 */

use std::collections::HashMap;

use super::{HookName, Plugin, PluginId};

/// The plugins of an engine, in registration order.
///
/// For every hook the registry precomputes which plugins implement it, so
/// dispatch is a walk over a short list instead of a lookup per plugin.
/// Plugins without a given hook are simply not in that hook's list.
#[derive(Debug, Default)]
pub struct HookRegistry {
    plugins: Vec<Plugin>,
    dispatch: HashMap<HookName, Vec<PluginId>>,
}

impl HookRegistry {
    pub fn new(plugins: Vec<Plugin>) -> Self {
        let mut dispatch: HashMap<HookName, Vec<PluginId>> = HashMap::new();
        for hook in HookName::ALL {
            let ids = plugins
                .iter()
                .enumerate()
                .filter(|(_, p)| p.implements(hook))
                .map(|(index, _)| PluginId(index))
                .collect();
            dispatch.insert(hook, ids);
        }
        Self { plugins, dispatch }
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn get(&self, id: PluginId) -> Option<&Plugin> {
        self.plugins.get(id.0)
    }

    /// Plugins implementing `hook`, in registration order.
    pub fn implementors(&self, hook: HookName) -> impl Iterator<Item = (PluginId, &Plugin)> {
        self.dispatch
            .get(&hook)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.plugins.get(id.0).map(|p| (*id, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::BlockStage;

    #[test]
    fn test_implementors_in_registration_order() {
        let registry = HookRegistry::new(vec![
            Plugin::new("a").on(BlockStage::AnnotateCode, |_| Ok(())),
            Plugin::new("b").on(BlockStage::PreprocessCode, |_| Ok(())),
            Plugin::new("c").on(BlockStage::AnnotateCode, |_| Ok(())),
        ]);

        let names: Vec<&str> = registry
            .implementors(HookName::AnnotateCode)
            .map(|(_, p)| p.name())
            .collect();
        assert_eq!(names, vec!["a", "c"]);

        let ids: Vec<usize> = registry
            .implementors(HookName::PreprocessCode)
            .map(|(id, _)| id.index())
            .collect();
        assert_eq!(ids, vec![1]);

        assert_eq!(registry.implementors(HookName::PostprocessRenderedLine).count(), 0);
    }

    #[test]
    fn test_empty_registry() {
        let registry = HookRegistry::new(Vec::new());
        assert!(registry.is_empty());
        assert!(registry.get(PluginId(0)).is_none());
        assert_eq!(registry.implementors(HookName::PreprocessMetadata).count(), 0);
    }
}
