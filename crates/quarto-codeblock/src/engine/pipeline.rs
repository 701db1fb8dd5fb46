/*
 * engine/pipeline.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The per-block stage sequence.
 */

use hashlink::LinkedHashSet;

use crate::ast::RenderNode;
use crate::block::{CodeBlock, ProcessingState};
use crate::config::EngineConfig;
use crate::error::{BlockLabel, CodeBlockError, Result};
use crate::highlight::{SyntaxHighlighter, apply_tokens};
use crate::plugin::{
    BlockHookContext, BlockRenderContext, BlockRenderData, BlockStage, GroupPosition,
    HookRegistry, HookName, HookServices, LineRenderContext, LineRenderData, PluginDataScope,
    PluginDataStore, PluginId,
};
use crate::render::{render_block, render_line};

use super::observer::EngineObserver;

/// Everything one `process()` call needs while it walks its blocks.
///
/// Block-scoped plugin data lives here and is cleared per block; global data
/// is borrowed from the engine so it outlives the call.
pub(crate) struct BlockPipeline<'e> {
    pub(crate) registry: &'e HookRegistry,
    pub(crate) global_data: &'e mut PluginDataStore,
    pub(crate) config: &'e EngineConfig,
    pub(crate) observer: &'e dyn EngineObserver,
    pub(crate) highlighter: Option<&'e dyn SyntaxHighlighter>,
    pub(crate) block_data: PluginDataStore,
    pub(crate) styles: LinkedHashSet<String>,
}

impl<'e> BlockPipeline<'e> {
    pub(crate) fn new(
        registry: &'e HookRegistry,
        global_data: &'e mut PluginDataStore,
        config: &'e EngineConfig,
        observer: &'e dyn EngineObserver,
        highlighter: Option<&'e dyn SyntaxHighlighter>,
    ) -> Self {
        Self {
            registry,
            global_data,
            config,
            observer,
            highlighter,
            block_data: PluginDataStore::new(PluginDataScope::Block),
            styles: LinkedHashSet::new(),
        }
    }

    /// Run every stage for one block and return it with its final tree.
    pub(crate) fn run(
        &mut self,
        block: &mut CodeBlock,
        call_index: usize,
        group: GroupPosition,
    ) -> Result<RenderNode> {
        self.block_data.clear();
        self.observer.on_block_start(&block_label(block, call_index));

        for stage in BlockStage::ALL {
            self.run_block_stage(block, stage, call_index, group)?;
        }

        let registry = self.registry;
        block.enter_stage(None, ProcessingState::READ_ONLY);
        let mut rendered = render_lines(block, call_index)?;

        block.enter_stage(
            Some(HookName::PostprocessRenderedLine),
            ProcessingState::READ_ONLY,
        );
        for ((line_index, line), render_data) in
            block.lines().iter().enumerate().zip(rendered.iter_mut())
        {
            for (id, plugin) in registry.implementors(HookName::PostprocessRenderedLine) {
                let Some(handler) = plugin.rendered_line_hook() else {
                    continue;
                };
                self.observer.on_hook(
                    HookName::PostprocessRenderedLine,
                    plugin.name(),
                    &block_label(block, call_index),
                );
                let mut ctx = LineRenderContext {
                    code_block: &*block,
                    line,
                    line_index,
                    group,
                    render_data: &mut *render_data,
                    services: self.services(id, plugin.name()),
                };
                if let Err(source) = handler(&mut ctx) {
                    return Err(hook_error(
                        plugin.name(),
                        HookName::PostprocessRenderedLine,
                        block,
                        call_index,
                        source,
                    ));
                }
            }
        }
        let line_asts: Vec<RenderNode> = rendered.into_iter().map(|data| data.line_ast).collect();

        block.enter_stage(
            Some(HookName::PostprocessRenderedBlock),
            ProcessingState::READ_ONLY,
        );
        let mut render_data = BlockRenderData {
            block_ast: render_block(line_asts),
        };
        for (id, plugin) in registry.implementors(HookName::PostprocessRenderedBlock) {
            let Some(handler) = plugin.rendered_block_hook() else {
                continue;
            };
            self.observer.on_hook(
                HookName::PostprocessRenderedBlock,
                plugin.name(),
                &block_label(block, call_index),
            );
            let mut ctx = BlockRenderContext {
                code_block: &*block,
                group,
                render_data: &mut render_data,
                services: self.services(id, plugin.name()),
            };
            if let Err(source) = handler(&mut ctx) {
                return Err(hook_error(
                    plugin.name(),
                    HookName::PostprocessRenderedBlock,
                    block,
                    call_index,
                    source,
                ));
            }
        }

        block.enter_stage(None, ProcessingState::READ_ONLY);
        self.observer
            .on_block_complete(&block_label(block, call_index), block.line_count());
        Ok(render_data.block_ast)
    }

    fn run_block_stage(
        &mut self,
        block: &mut CodeBlock,
        stage: BlockStage,
        call_index: usize,
        group: GroupPosition,
    ) -> Result<()> {
        let hook = stage.hook_name();
        block.enter_stage(Some(hook), hook.processing_state());

        if stage == BlockStage::PerformSyntaxAnalysis {
            self.highlight(block, call_index)?;
        }

        let registry = self.registry;
        for (id, plugin) in registry.implementors(hook) {
            let Some(handler) = plugin.block_hook(stage) else {
                continue;
            };
            self.observer
                .on_hook(hook, plugin.name(), &block_label(block, call_index));
            let mut ctx = BlockHookContext {
                code_block: &mut *block,
                group,
                services: self.services(id, plugin.name()),
            };
            let outcome = handler(&mut ctx);
            if let Err(source) = outcome {
                return Err(hook_error(plugin.name(), hook, block, call_index, source));
            }
        }
        Ok(())
    }

    fn highlight(&self, block: &mut CodeBlock, call_index: usize) -> Result<()> {
        let Some(highlighter) = self.highlighter else {
            return Ok(());
        };
        let tokens = highlighter
            .highlight(&block.code(), block.language())
            .map_err(|source| CodeBlockError::Highlighter {
                block: block_label(block, call_index),
                source,
            })?;
        let applied = apply_tokens(block, tokens).map_err(|e| CodeBlockError::Highlighter {
            block: block_label(block, call_index),
            source: e.into(),
        })?;
        tracing::trace!(tokens = applied, "Applied syntax tokens");
        Ok(())
    }

    fn services<'s>(&'s mut self, plugin: PluginId, plugin_name: &'s str) -> HookServices<'s> {
        HookServices {
            plugin,
            plugin_name,
            block_data: &mut self.block_data,
            global_data: &mut *self.global_data,
            styles: &mut self.styles,
            default_locale: &self.config.default_locale,
        }
    }
}

/// Render every line before any render hook runs.
fn render_lines(block: &CodeBlock, call_index: usize) -> Result<Vec<LineRenderData>> {
    block
        .lines()
        .iter()
        .enumerate()
        .map(|(line_index, line)| {
            render_line(line, line_index)
                .map(|line_ast| LineRenderData { line_ast })
                .map_err(|source| CodeBlockError::Render {
                    block: block_label(block, call_index),
                    line: line_index,
                    source: Box::new(source),
                })
        })
        .collect()
}

/// Describe a block for error messages, using its current language.
pub(crate) fn block_label(block: &CodeBlock, call_index: usize) -> BlockLabel {
    let parent = block.parent_document();
    BlockLabel {
        language: block.language().to_string(),
        source_file: parent.and_then(|p| p.source_file_path.clone()),
        group_index: block.group_index(),
        call_index,
    }
}

fn hook_error(
    plugin: &str,
    hook: HookName,
    block: &CodeBlock,
    call_index: usize,
    source: anyhow::Error,
) -> CodeBlockError {
    CodeBlockError::PluginHook {
        plugin: plugin.to_string(),
        hook,
        block: block_label(block, call_index),
        source,
    }
}
