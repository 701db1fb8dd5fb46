/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Conversion of finalized lines into render trees.
 */

//! Rendering of lines and blocks.
//!
//! A line starts as its text, cut into parts at every inline annotation
//! boundary. Inline annotations are then applied in render order, each
//! replacing the parts its range covers. The parts are wrapped in a `<div>`
//! and full-line annotations are applied to that node. A block is the
//! sequence of line nodes inside `<pre><code>`.

use crate::ast::RenderNode;
use crate::block::{Annotation, AnnotationRenderContext, Line, byte_offset};
use crate::error::{CodeBlockError, Result};

/// Render a single line with all of its annotations.
pub fn render_line(line: &Line, line_index: usize) -> Result<RenderNode> {
    let text = line.text();
    let column_count = line.column_count();

    // Stable: insertion order is kept within a phase
    let mut ordered: Vec<&Annotation> = line.annotations().iter().collect();
    ordered.sort_by_key(|a| a.render_phase());

    let (inline, full_line): (Vec<&Annotation>, Vec<&Annotation>) =
        ordered.into_iter().partition(|a| a.inline_range().is_some());

    let mut boundaries = vec![0, column_count];
    for annotation in &inline {
        if let Some(range) = annotation.inline_range() {
            if range.column_end > column_count {
                return Err(CodeBlockError::AnnotationOutOfRange {
                    name: annotation.name().to_string(),
                    column_start: range.column_start,
                    column_end: range.column_end,
                    line_length: column_count,
                });
            }
            boundaries.push(range.column_start);
            boundaries.push(range.column_end);
        }
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let spans: Vec<(usize, usize)> = boundaries.windows(2).map(|w| (w[0], w[1])).collect();
    let mut parts: Vec<RenderNode> = spans
        .iter()
        .map(|&(start, end)| {
            RenderNode::text(&text[byte_offset(text, start)..byte_offset(text, end)])
        })
        .collect();

    let ctx = AnnotationRenderContext {
        line_text: text,
        line_index,
    };

    for annotation in &inline {
        let Some(range) = annotation.inline_range() else {
            continue;
        };
        let covered: Vec<usize> = spans
            .iter()
            .enumerate()
            .filter(|(_, (start, end))| *start >= range.column_start && *end <= range.column_end)
            .map(|(i, _)| i)
            .collect();
        let nodes: Vec<RenderNode> = covered
            .iter()
            .map(|&i| std::mem::replace(&mut parts[i], RenderNode::root(Vec::new())))
            .collect();
        let rendered = apply(annotation, nodes, &ctx)?;
        for (i, node) in covered.into_iter().zip(rendered) {
            parts[i] = node;
        }
    }

    let mut node = RenderNode::element("div", parts);
    for annotation in &full_line {
        let mut rendered = apply(annotation, vec![node], &ctx)?;
        node = rendered.pop().unwrap_or_else(|| RenderNode::root(Vec::new()));
    }
    Ok(node)
}

/// Wrap rendered lines in the block container.
pub fn render_block(lines: Vec<RenderNode>) -> RenderNode {
    RenderNode::element("pre", vec![RenderNode::element("code", lines)])
}

/// Group container for the blocks of one group.
pub fn render_group(blocks: Vec<RenderNode>, class: &str) -> RenderNode {
    RenderNode::element("div", blocks).with_class(class)
}

fn apply(
    annotation: &Annotation,
    nodes: Vec<RenderNode>,
    ctx: &AnnotationRenderContext<'_>,
) -> Result<Vec<RenderNode>> {
    let expected = nodes.len();
    let rendered = annotation.render(nodes, ctx);
    if rendered.len() != expected {
        return Err(CodeBlockError::AnnotationRender {
            name: annotation.name().to_string(),
            expected,
            returned: rendered.len(),
        });
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{
        ClassAnnotation, CodeBlock, InlineRange, RenderPhase, TokenAnnotation, WrapperAnnotation,
    };
    use insta::assert_snapshot;

    fn render(block: &CodeBlock) -> String {
        let lines = block
            .lines()
            .iter()
            .enumerate()
            .map(|(i, l)| render_line(l, i))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        render_block(lines).to_html()
    }

    #[test]
    fn test_plain_block() {
        let block = CodeBlock::new("Example code...\n...with two lines!", "js", "");
        assert_snapshot!(render(&block), @"<pre><code><div>Example code...</div><div>...with two lines!</div></code></pre>");
    }

    #[test]
    fn test_inline_deletion() {
        let mut block = CodeBlock::new("Example code...\n...with two lines!", "js", "");
        block
            .add_annotation(1, WrapperAnnotation::inline("del", "del", InlineRange::new(8, 12)))
            .unwrap();
        assert_snapshot!(render(&block), @"<pre><code><div>Example code...</div><div>...with <del>two </del>lines!</div></code></pre>");
    }

    #[test]
    fn test_nesting_follows_insertion_order() {
        let mut block = CodeBlock::new("abcdef", "txt", "");
        block
            .add_annotation(0, WrapperAnnotation::inline("b", "b", InlineRange::new(1, 3)))
            .unwrap();
        block
            .add_annotation(0, WrapperAnnotation::inline("i", "i", InlineRange::new(1, 3)))
            .unwrap();
        block
            .add_annotation(0, ClassAnnotation::line("mark", "mark"))
            .unwrap();
        assert_snapshot!(render(&block), @r#"<pre><code><div class="mark">a<i><b>bc</b></i>def</div></code></pre>"#);
    }

    #[test]
    fn test_overlapping_ranges_split_parts() {
        let mut block = CodeBlock::new("abcdef", "txt", "");
        block
            .add_annotation(0, WrapperAnnotation::inline("m", "mark", InlineRange::new(0, 4)))
            .unwrap();
        block
            .add_annotation(0, WrapperAnnotation::inline("u", "u", InlineRange::new(2, 6)))
            .unwrap();
        assert_snapshot!(render(&block), @"<pre><code><div><mark>ab</mark><u><mark>cd</mark></u><u>ef</u></div></code></pre>");
    }

    #[test]
    fn test_render_phase_overrides_insertion_order() {
        let mut block = CodeBlock::new("let x", "rust", "");
        block
            .add_annotation(
                0,
                WrapperAnnotation::inline("mark", "mark", InlineRange::new(0, 3))
                    .with_render_phase(RenderPhase::Earlier),
            )
            .unwrap();
        block
            .add_annotation(0, TokenAnnotation::new("kw", InlineRange::new(0, 3)))
            .unwrap();
        assert_snapshot!(render(&block), @r#"<pre><code><div><mark><span class="kw">let</span></mark> x</div></code></pre>"#);
    }

    #[test]
    fn test_empty_line_renders_empty_div() {
        let block = CodeBlock::new("a\n\nb", "txt", "");
        assert_snapshot!(render(&block), @"<pre><code><div>a</div><div></div><div>b</div></code></pre>");
    }

    #[test]
    fn test_renderer_must_preserve_node_count() {
        let mut block = CodeBlock::new("abc", "txt", "");
        block
            .add_annotation(0, Annotation::from_fn("drop", |_nodes, _ctx| Vec::new()))
            .unwrap();
        let err = render_line(&block.lines()[0], 0).unwrap_err();
        assert!(matches!(
            err,
            CodeBlockError::AnnotationRender {
                expected: 1,
                returned: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_range_annotation_is_an_error() {
        let mut stale = Line::new("ab");
        stale.push_annotation(WrapperAnnotation::inline("u", "u", InlineRange::new(2, 6)));
        assert!(matches!(
            render_line(&stale, 0),
            Err(CodeBlockError::AnnotationOutOfRange { line_length: 2, .. })
        ));
    }

    #[test]
    fn test_group_container() {
        let group = render_group(vec![render_block(Vec::new())], "code-group");
        assert_eq!(group.to_html(), r#"<div class="code-group"><pre><code></code></pre></div>"#);
    }
}
