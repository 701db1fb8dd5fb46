/*
 * plugin/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Plugin definitions and hook identifiers.
 */

//! Plugins and their hooks.
//!
//! A [`Plugin`] is a name plus zero or more hook handlers. Hooks are keyed by
//! a fixed set of stage identifiers ([`HookName`]) rather than by string, and
//! each handler is a closure receiving the stage's context:
//!
//! ```ignore
//! let plugin = Plugin::new("uppercase-meta")
//!     .on(BlockStage::PreprocessMetadata, |ctx| {
//!         let meta = ctx.code_block.meta().to_uppercase();
//!         ctx.code_block.set_meta(meta)?;
//!         Ok(())
//!     })
//!     .on_rendered_line(|ctx| {
//!         ctx.render_data.line_ast.add_class("shouty");
//!         Ok(())
//!     });
//! ```

mod context;
mod data;
mod registry;

use std::collections::HashMap;
use std::fmt;

use crate::block::ProcessingState;

pub use context::{
    BlockHookContext, BlockRenderContext, BlockRenderData, GroupPosition, LineRenderContext,
    LineRenderData,
};
pub(crate) use context::HookServices;
pub use data::PluginDataStore;
pub use registry::HookRegistry;

/// The pipeline stages plugins can hook into, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookName {
    PreprocessMetadata,
    PreprocessCode,
    PerformSyntaxAnalysis,
    PostprocessAnalyzedCode,
    AnnotateCode,
    PostprocessAnnotations,
    PostprocessRenderedLine,
    PostprocessRenderedBlock,
}

impl HookName {
    pub const ALL: [HookName; 8] = [
        HookName::PreprocessMetadata,
        HookName::PreprocessCode,
        HookName::PerformSyntaxAnalysis,
        HookName::PostprocessAnalyzedCode,
        HookName::AnnotateCode,
        HookName::PostprocessAnnotations,
        HookName::PostprocessRenderedLine,
        HookName::PostprocessRenderedBlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookName::PreprocessMetadata => "preprocessMetadata",
            HookName::PreprocessCode => "preprocessCode",
            HookName::PerformSyntaxAnalysis => "performSyntaxAnalysis",
            HookName::PostprocessAnalyzedCode => "postprocessAnalyzedCode",
            HookName::AnnotateCode => "annotateCode",
            HookName::PostprocessAnnotations => "postprocessAnnotations",
            HookName::PostprocessRenderedLine => "postprocessRenderedLine",
            HookName::PostprocessRenderedBlock => "postprocessRenderedBlock",
        }
    }

    /// The permissions a block carries while this stage runs.
    pub fn processing_state(&self) -> ProcessingState {
        match self {
            HookName::PreprocessMetadata => ProcessingState::new(true, false, true),
            HookName::PreprocessCode
            | HookName::PerformSyntaxAnalysis
            | HookName::PostprocessAnalyzedCode => ProcessingState::UNRESTRICTED,
            HookName::AnnotateCode | HookName::PostprocessAnnotations => {
                ProcessingState::new(false, false, true)
            }
            HookName::PostprocessRenderedLine | HookName::PostprocessRenderedBlock => {
                ProcessingState::READ_ONLY
            }
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six stages that run against a block before it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockStage {
    PreprocessMetadata,
    PreprocessCode,
    PerformSyntaxAnalysis,
    PostprocessAnalyzedCode,
    AnnotateCode,
    PostprocessAnnotations,
}

impl BlockStage {
    pub const ALL: [BlockStage; 6] = [
        BlockStage::PreprocessMetadata,
        BlockStage::PreprocessCode,
        BlockStage::PerformSyntaxAnalysis,
        BlockStage::PostprocessAnalyzedCode,
        BlockStage::AnnotateCode,
        BlockStage::PostprocessAnnotations,
    ];

    pub fn hook_name(&self) -> HookName {
        match self {
            BlockStage::PreprocessMetadata => HookName::PreprocessMetadata,
            BlockStage::PreprocessCode => HookName::PreprocessCode,
            BlockStage::PerformSyntaxAnalysis => HookName::PerformSyntaxAnalysis,
            BlockStage::PostprocessAnalyzedCode => HookName::PostprocessAnalyzedCode,
            BlockStage::AnnotateCode => HookName::AnnotateCode,
            BlockStage::PostprocessAnnotations => HookName::PostprocessAnnotations,
        }
    }
}

/// Lifetime of a plugin's data area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginDataScope {
    /// Reset at the start of every block
    Block,
    /// Kept for as long as the engine lives
    Global,
}

impl fmt::Display for PluginDataScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginDataScope::Block => write!(f, "block"),
            PluginDataScope::Global => write!(f, "global"),
        }
    }
}

/// Identity of a registered plugin: its position in the engine's plugin list.
///
/// Plugin data is keyed by this, not by name, so two plugins sharing a name
/// still get separate data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(pub(crate) usize);

impl PluginId {
    pub fn index(&self) -> usize {
        self.0
    }
}

pub type BlockHook = Box<dyn Fn(&mut BlockHookContext<'_>) -> anyhow::Result<()>>;
pub type LineRenderHook = Box<dyn Fn(&mut LineRenderContext<'_>) -> anyhow::Result<()>>;
pub type BlockRenderHook = Box<dyn Fn(&mut BlockRenderContext<'_>) -> anyhow::Result<()>>;

/// A named set of hook handlers plus optional style and script assets.
pub struct Plugin {
    name: String,
    block_hooks: HashMap<BlockStage, BlockHook>,
    rendered_line: Option<LineRenderHook>,
    rendered_block: Option<BlockRenderHook>,
    base_styles: Option<String>,
    js_modules: Vec<String>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            block_hooks: HashMap::new(),
            rendered_line: None,
            rendered_block: None,
            base_styles: None,
            js_modules: Vec::new(),
        }
    }

    /// Register the handler for a block stage, replacing any earlier one.
    pub fn on<F>(mut self, stage: BlockStage, handler: F) -> Self
    where
        F: Fn(&mut BlockHookContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.block_hooks.insert(stage, Box::new(handler));
        self
    }

    /// Register the `postprocessRenderedLine` handler.
    pub fn on_rendered_line<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut LineRenderContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.rendered_line = Some(Box::new(handler));
        self
    }

    /// Register the `postprocessRenderedBlock` handler.
    pub fn on_rendered_block<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut BlockRenderContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.rendered_block = Some(Box::new(handler));
        self
    }

    pub fn with_base_styles(mut self, css: impl Into<String>) -> Self {
        self.base_styles = Some(css.into());
        self
    }

    pub fn with_js_module(mut self, js: impl Into<String>) -> Self {
        self.js_modules.push(js.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_styles(&self) -> Option<&str> {
        self.base_styles.as_deref()
    }

    pub fn js_modules(&self) -> &[String] {
        &self.js_modules
    }

    /// Whether this plugin implements the given hook.
    pub fn implements(&self, hook: HookName) -> bool {
        match hook {
            HookName::PostprocessRenderedLine => self.rendered_line.is_some(),
            HookName::PostprocessRenderedBlock => self.rendered_block.is_some(),
            _ => self
                .block_stage_for(hook)
                .is_some_and(|stage| self.block_hooks.contains_key(&stage)),
        }
    }

    pub(crate) fn block_hook(&self, stage: BlockStage) -> Option<&BlockHook> {
        self.block_hooks.get(&stage)
    }

    pub(crate) fn rendered_line_hook(&self) -> Option<&LineRenderHook> {
        self.rendered_line.as_ref()
    }

    pub(crate) fn rendered_block_hook(&self) -> Option<&BlockRenderHook> {
        self.rendered_block.as_ref()
    }

    fn block_stage_for(&self, hook: HookName) -> Option<BlockStage> {
        BlockStage::ALL.into_iter().find(|s| s.hook_name() == hook)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks: Vec<&str> = HookName::ALL
            .iter()
            .filter(|h| self.implements(**h))
            .map(HookName::as_str)
            .collect();
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("hooks", &hooks)
            .finish_non_exhaustive()
    }
}
