/*
 * engine/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The code block processing engine.
 */

//! The processing engine.
//!
//! An [`Engine`] owns the plugin registry and the global plugin data. Each
//! [`Engine::process`] call runs its blocks strictly one after another:
//!
//! 1. the six block stages, with the block's permissions switched before
//!    each one (see [`HookName::processing_state`](crate::HookName::processing_state))
//! 2. rendering of every line
//! 3. `postprocessRenderedLine` once per line, then
//!    `postprocessRenderedBlock` once per block
//!
//! Consecutive blocks with the same parent-document group index are then
//! wrapped into one group. Processing is all-or-nothing: the first failing
//! block aborts the call and its error is returned. Global plugin data written
//! before the failure is kept.

mod input;
mod observer;
mod pipeline;
mod result;

use std::ops::Range;
use std::sync::Arc;

use hashlink::LinkedHashSet;

use crate::ast::RenderNode;
use crate::block::CodeBlock;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::highlight::SyntaxHighlighter;
use crate::plugin::{GroupPosition, HookRegistry, Plugin, PluginDataScope, PluginDataStore};
use crate::render::render_group;

pub use input::{BlockInput, ProcessInput};
pub use observer::{EngineObserver, NoopObserver, TracingObserver};
pub use result::{ProcessResult, RenderedBlock, RenderedGroup};

use pipeline::{BlockPipeline, block_label};

/// Runs code blocks through the plugin pipeline.
///
/// Reuse one engine for every block of a document (or a whole site) so
/// global plugin data accumulates; construct a new one for isolation.
pub struct Engine {
    registry: HookRegistry,
    global_data: PluginDataStore,
    config: EngineConfig,
    observer: Arc<dyn EngineObserver>,
    highlighter: Option<Box<dyn SyntaxHighlighter>>,
}

impl Engine {
    /// Create an engine with the default configuration.
    pub fn new(plugins: Vec<Plugin>) -> Self {
        Self::with_config(EngineConfig::default(), plugins)
    }

    pub fn with_config(config: EngineConfig, plugins: Vec<Plugin>) -> Self {
        Self {
            registry: HookRegistry::new(plugins),
            global_data: PluginDataStore::new(PluginDataScope::Global),
            config,
            observer: Arc::new(TracingObserver),
            highlighter: None,
        }
    }

    /// Replace the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn EngineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run `highlighter` at the start of `performSyntaxAnalysis`.
    pub fn with_highlighter(mut self, highlighter: impl SyntaxHighlighter + 'static) -> Self {
        self.highlighter = Some(Box::new(highlighter));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn plugins(&self) -> &[Plugin] {
        self.registry.plugins()
    }

    /// Base styles of all plugins, in registration order.
    pub fn base_styles(&self) -> String {
        self.plugins()
            .iter()
            .filter_map(Plugin::base_styles)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Script modules of all plugins, de-duplicated, in registration order.
    pub fn js_modules(&self) -> Vec<&str> {
        let mut modules: LinkedHashSet<&str> = LinkedHashSet::new();
        for module in self.plugins().iter().flat_map(|p| p.js_modules()) {
            modules.get_or_insert(module.as_str());
        }
        modules.into_iter().collect()
    }

    /// Process one block, one descriptor, or a sequence of either.
    pub fn process(&mut self, input: impl Into<ProcessInput>) -> Result<ProcessResult> {
        let mut blocks = input.into().into_blocks()?;
        let group_ranges = group_ranges(&blocks);

        let Self {
            registry,
            global_data,
            config,
            observer,
            highlighter,
        } = self;
        let observer: &dyn EngineObserver = &**observer;
        observer.on_process_start(blocks.len(), group_ranges.len());

        let mut pipeline = BlockPipeline::new(
            registry,
            global_data,
            config,
            observer,
            highlighter.as_deref(),
        );

        let mut block_asts = Vec::with_capacity(blocks.len());
        for (group_index, range) in group_ranges.iter().enumerate() {
            for call_index in range.clone() {
                let group = GroupPosition {
                    group_index,
                    index: call_index - range.start,
                    total: range.len(),
                };
                let block = &mut blocks[call_index];
                match pipeline.run(block, call_index, group) {
                    Ok(ast) => block_asts.push(ast),
                    Err(err) => {
                        observer.on_block_error(&block_label(block, call_index), &err);
                        return Err(err);
                    }
                }
            }
        }
        let styles = std::mem::take(&mut pipeline.styles);

        let group_contents: Vec<RenderedBlock> = blocks
            .into_iter()
            .zip(block_asts)
            .enumerate()
            .map(|(call_index, (code_block, block_ast))| RenderedBlock {
                code_block,
                block_ast,
                group_index: group_of(&group_ranges, call_index),
            })
            .collect();

        let groups: Vec<RenderedGroup> = group_ranges
            .into_iter()
            .map(|range| RenderedGroup {
                group_ast: render_group(
                    group_contents[range.clone()]
                        .iter()
                        .map(|b| b.block_ast.clone())
                        .collect(),
                    &config.group_class,
                ),
                blocks: range,
            })
            .collect();

        let rendered_ast = RenderNode::root(groups.iter().map(|g| g.group_ast.clone()).collect());
        observer.on_process_complete(group_contents.len());

        Ok(ProcessResult {
            group_contents,
            groups,
            rendered_ast,
            styles,
        })
    }

    /// Validate untyped JSON input, then [`process`](Self::process) it.
    ///
    /// Nothing runs if validation fails.
    pub fn process_json(&mut self, input: &serde_json::Value) -> Result<ProcessResult> {
        let input = ProcessInput::from_json(input)?;
        self.process(input)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("plugins", &self.registry.plugins())
            .field("config", &self.config)
            .field("global_data", &self.global_data)
            .field("highlighter", &self.highlighter.is_some())
            .finish_non_exhaustive()
    }
}

/// Split blocks into runs sharing a parent-document group index.
fn group_ranges(blocks: &[CodeBlock]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for (index, block) in blocks.iter().enumerate() {
        match ranges.last_mut() {
            Some(last) if blocks[last.start].group_index() == block.group_index() => {
                last.end = index + 1;
            }
            _ => ranges.push(index..index + 1),
        }
    }
    ranges
}

fn group_of(ranges: &[Range<usize>], call_index: usize) -> usize {
    ranges
        .iter()
        .position(|r| r.contains(&call_index))
        .unwrap_or_default()
}
