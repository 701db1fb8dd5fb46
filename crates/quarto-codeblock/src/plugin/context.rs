/*
 * plugin/context.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Contexts handed to hook handlers.
 */

use std::cell::RefCell;
use std::rc::Rc;

use hashlink::LinkedHashSet;

use super::{PluginDataScope, PluginDataStore, PluginId};
use crate::ast::RenderNode;
use crate::block::{CodeBlock, Line};
use crate::error::Result;

/// The position of a block within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPosition {
    /// Index of the group within the current `process()` call
    pub group_index: usize,
    /// Index of the block within its group
    pub index: usize,
    /// Number of blocks in the group
    pub total: usize,
}

impl GroupPosition {
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

/// Engine services bound to the plugin whose hook is running.
pub(crate) struct HookServices<'a> {
    pub(crate) plugin: PluginId,
    pub(crate) plugin_name: &'a str,
    pub(crate) block_data: &'a mut PluginDataStore,
    pub(crate) global_data: &'a mut PluginDataStore,
    pub(crate) styles: &'a mut LinkedHashSet<String>,
    pub(crate) default_locale: &'a str,
}

impl HookServices<'_> {
    fn store(&mut self, scope: PluginDataScope) -> &mut PluginDataStore {
        match scope {
            PluginDataScope::Block => &mut *self.block_data,
            PluginDataScope::Global => &mut *self.global_data,
        }
    }

    fn plugin_data_with<T: 'static>(
        &mut self,
        scope: PluginDataScope,
        default: impl FnOnce() -> T,
    ) -> Result<Rc<RefCell<T>>> {
        let (plugin, name) = (self.plugin, self.plugin_name);
        self.store(scope).get_or_insert_with(plugin, name, default)
    }
}

// The data accessors are identical across the three hook contexts.
macro_rules! hook_services {
    ($ctx:ident) => {
        impl $ctx<'_> {
            /// This plugin's data in `scope`, storing `default` on first access.
            ///
            /// The returned container is shared: mutate it through
            /// `borrow_mut()` and later hooks see the change.
            pub fn plugin_data<T: 'static>(
                &mut self,
                scope: PluginDataScope,
                default: T,
            ) -> Result<Rc<RefCell<T>>> {
                self.services.plugin_data_with(scope, || default)
            }

            /// Like [`plugin_data`](Self::plugin_data), building the default lazily.
            pub fn plugin_data_with<T: 'static>(
                &mut self,
                scope: PluginDataScope,
                default: impl FnOnce() -> T,
            ) -> Result<Rc<RefCell<T>>> {
                self.services.plugin_data_with(scope, default)
            }

            /// Contribute CSS to the result of the current `process()` call.
            ///
            /// Styles keep the position of their first contribution.
            pub fn add_styles(&mut self, css: impl Into<String>) {
                self.services.styles.get_or_insert(css.into());
            }

            /// Name of the plugin whose hook is running.
            pub fn plugin_name(&self) -> &str {
                self.services.plugin_name
            }

            /// The block's locale, or the engine's default locale.
            pub fn locale(&self) -> &str {
                self.code_block
                    .locale()
                    .unwrap_or(self.services.default_locale)
            }
        }
    };
}

/// Context for the six stages that run before rendering.
pub struct BlockHookContext<'a> {
    /// The block being processed; mutators check the stage's permissions
    pub code_block: &'a mut CodeBlock,
    pub group: GroupPosition,
    pub(crate) services: HookServices<'a>,
}

hook_services!(BlockHookContext);

/// Rendered output of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRenderData {
    /// May be edited in place or replaced wholesale
    pub line_ast: RenderNode,
}

/// Context for `postprocessRenderedLine`.
pub struct LineRenderContext<'a> {
    pub code_block: &'a CodeBlock,
    pub line: &'a Line,
    pub line_index: usize,
    pub group: GroupPosition,
    pub render_data: &'a mut LineRenderData,
    pub(crate) services: HookServices<'a>,
}

hook_services!(LineRenderContext);

/// Rendered output of one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRenderData {
    /// May be edited in place or replaced wholesale
    pub block_ast: RenderNode,
}

/// Context for `postprocessRenderedBlock`.
pub struct BlockRenderContext<'a> {
    pub code_block: &'a CodeBlock,
    pub group: GroupPosition,
    pub render_data: &'a mut BlockRenderData,
    pub(crate) services: HookServices<'a>,
}

hook_services!(BlockRenderContext);
