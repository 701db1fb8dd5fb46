/*
 * block/annotation.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Line annotations and their render functions.
 */

//! Annotations attached to lines.
//!
//! An [`Annotation`] is a named markup instruction: it optionally covers a
//! column span of its line and knows how to render itself by transforming
//! render nodes. Annotations are immutable once attached; edits that move
//! text around replace them with re-ranged copies.

use std::fmt;
use std::sync::Arc;

use crate::ast::RenderNode;

/// A column span within a line, counted in Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InlineRange {
    pub column_start: usize,
    pub column_end: usize,
}

impl InlineRange {
    /// Create a range; the bounds are ordered if given in reverse.
    pub fn new(column_start: usize, column_end: usize) -> Self {
        Self {
            column_start: column_start.min(column_end),
            column_end: column_start.max(column_end),
        }
    }

    pub fn len(&self) -> usize {
        self.column_end - self.column_start
    }

    pub fn is_empty(&self) -> bool {
        self.column_start == self.column_end
    }
}

/// Ordering bucket for rendering.
///
/// Annotations are rendered phase by phase, so an `Earliest` annotation ends
/// up innermost and a `Latest` one outermost. Within one phase, insertion
/// order decides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderPhase {
    Earliest,
    Earlier,
    #[default]
    Normal,
    Later,
    Latest,
}

/// Information available to an annotation while it renders.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationRenderContext<'a> {
    /// Full text of the line being rendered
    pub line_text: &'a str,
    /// Zero-based index of the line within its block
    pub line_index: usize,
}

/// The render capability of an annotation.
///
/// Receives the nodes the annotation covers (the text parts inside its
/// inline range, or the single line node for full-line annotations) and
/// returns their replacements. Implementations must return exactly as many
/// nodes as they were given, and must not assume they run first or last.
pub trait AnnotationRenderer: Send + Sync {
    fn render(&self, nodes: Vec<RenderNode>, ctx: &AnnotationRenderContext<'_>) -> Vec<RenderNode>;
}

impl<F> AnnotationRenderer for F
where
    F: Fn(Vec<RenderNode>, &AnnotationRenderContext<'_>) -> Vec<RenderNode> + Send + Sync,
{
    fn render(&self, nodes: Vec<RenderNode>, ctx: &AnnotationRenderContext<'_>) -> Vec<RenderNode> {
        self(nodes, ctx)
    }
}

/// A named, optionally range-scoped markup instruction attached to a line.
#[derive(Clone)]
pub struct Annotation {
    name: String,
    inline_range: Option<InlineRange>,
    render_phase: RenderPhase,
    renderer: Arc<dyn AnnotationRenderer>,
}

impl Annotation {
    /// Create a full-line annotation at the normal render phase.
    pub fn new(name: impl Into<String>, renderer: impl AnnotationRenderer + 'static) -> Self {
        Self {
            name: name.into(),
            inline_range: None,
            render_phase: RenderPhase::Normal,
            renderer: Arc::new(renderer),
        }
    }

    /// Create a full-line annotation from a render closure.
    pub fn from_fn<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(Vec<RenderNode>, &AnnotationRenderContext<'_>) -> Vec<RenderNode>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, render)
    }

    /// Builder: restrict the annotation to a column span.
    pub fn with_inline_range(mut self, range: InlineRange) -> Self {
        self.inline_range = Some(range);
        self
    }

    /// Builder: set the render phase.
    pub fn with_render_phase(mut self, phase: RenderPhase) -> Self {
        self.render_phase = phase;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The covered span, or `None` for a full-line annotation.
    pub fn inline_range(&self) -> Option<InlineRange> {
        self.inline_range
    }

    pub fn render_phase(&self) -> RenderPhase {
        self.render_phase
    }

    pub fn render(
        &self,
        nodes: Vec<RenderNode>,
        ctx: &AnnotationRenderContext<'_>,
    ) -> Vec<RenderNode> {
        self.renderer.render(nodes, ctx)
    }

    /// A copy of this annotation covering a different span.
    pub(crate) fn reranged(&self, range: InlineRange) -> Self {
        Self {
            inline_range: Some(range),
            ..self.clone()
        }
    }
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotation")
            .field("name", &self.name)
            .field("inline_range", &self.inline_range)
            .field("render_phase", &self.render_phase)
            .finish_non_exhaustive()
    }
}

/// Wraps each covered node in an element, e.g. `<del>` or `<mark>`.
#[derive(Debug, Clone)]
pub struct WrapperAnnotation {
    pub tag: String,
    pub class: Option<String>,
}

impl WrapperAnnotation {
    /// An inline annotation wrapping `range` of a line in `<tag>`.
    pub fn inline(name: impl Into<String>, tag: impl Into<String>, range: InlineRange) -> Annotation {
        Annotation::new(
            name,
            Self {
                tag: tag.into(),
                class: None,
            },
        )
        .with_inline_range(range)
    }
}

impl AnnotationRenderer for WrapperAnnotation {
    fn render(&self, nodes: Vec<RenderNode>, _ctx: &AnnotationRenderContext<'_>) -> Vec<RenderNode> {
        nodes
            .into_iter()
            .map(|node| {
                let wrapped = RenderNode::element(self.tag.clone(), vec![node]);
                match &self.class {
                    Some(class) => wrapped.with_class(class),
                    None => wrapped,
                }
            })
            .collect()
    }
}

/// Adds a class to each covered node; the usual full-line marker.
#[derive(Debug, Clone)]
pub struct ClassAnnotation {
    pub class: String,
}

impl ClassAnnotation {
    /// A full-line annotation adding `class` to the line element.
    pub fn line(name: impl Into<String>, class: impl Into<String>) -> Annotation {
        Annotation::new(
            name,
            Self {
                class: class.into(),
            },
        )
    }
}

impl AnnotationRenderer for ClassAnnotation {
    fn render(&self, nodes: Vec<RenderNode>, _ctx: &AnnotationRenderContext<'_>) -> Vec<RenderNode> {
        nodes
            .into_iter()
            .map(|node| match node {
                RenderNode::Element(_) => node.with_class(&self.class),
                other => RenderNode::element("span", vec![other]).with_class(&self.class),
            })
            .collect()
    }
}

/// A syntax token: wraps its span in `<span class="scope">`.
#[derive(Debug, Clone)]
pub struct TokenAnnotation {
    pub scope: String,
}

impl TokenAnnotation {
    pub const NAME: &'static str = "syntax-token";

    pub fn new(scope: impl Into<String>, range: InlineRange) -> Annotation {
        Annotation::new(
            Self::NAME,
            Self {
                scope: scope.into(),
            },
        )
        .with_inline_range(range)
        .with_render_phase(RenderPhase::Earliest)
    }
}

impl AnnotationRenderer for TokenAnnotation {
    fn render(&self, nodes: Vec<RenderNode>, _ctx: &AnnotationRenderContext<'_>) -> Vec<RenderNode> {
        nodes
            .into_iter()
            .map(|node| RenderNode::element("span", vec![node]).with_class(&self.scope))
            .collect()
    }
}
