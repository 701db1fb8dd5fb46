/*
 * engine/result.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Output of a process() call.
 */

use std::ops::Range;

use hashlink::LinkedHashSet;

use crate::ast::RenderNode;
use crate::block::CodeBlock;

/// One processed block and its final render tree.
#[derive(Debug, Clone)]
pub struct RenderedBlock {
    /// The block after all stages, with any edits plugins made
    pub code_block: CodeBlock,
    /// The block tree after `postprocessRenderedBlock`
    pub block_ast: RenderNode,
    /// Index of the group this block belongs to
    pub group_index: usize,
}

/// Blocks rendered together as one logical unit.
#[derive(Debug, Clone)]
pub struct RenderedGroup {
    /// Indices into [`ProcessResult::group_contents`]
    pub blocks: Range<usize>,
    /// The group wrapper containing every block tree of the group
    pub group_ast: RenderNode,
}

#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// One entry per input block, in input order
    pub group_contents: Vec<RenderedBlock>,
    /// One or more groups covering `group_contents`
    pub groups: Vec<RenderedGroup>,
    /// A root node holding every group tree
    pub rendered_ast: RenderNode,
    /// CSS contributed by hooks during this call, in contribution order
    pub styles: LinkedHashSet<String>,
}

impl ProcessResult {
    /// The rendered blocks of one group.
    pub fn blocks_in(&self, group: &RenderedGroup) -> &[RenderedBlock] {
        self.group_contents
            .get(group.blocks.clone())
            .unwrap_or_default()
    }

    pub fn to_html(&self) -> String {
        self.rendered_ast.to_html()
    }
}
