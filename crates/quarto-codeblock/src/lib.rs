//! Plugin-driven annotation and rendering of code blocks
//!
//! This crate takes code blocks (source text plus language and meta), runs
//! them through an ordered pipeline of plugin hooks, and renders each block
//! into a markup tree.
//!
//! # Architecture
//!
//! - [`CodeBlock`] - Mutable block model with permission-gated mutators
//! - [`Annotation`] - Named, optionally range-scoped markup attached to a line
//! - [`Plugin`] - A name plus hook handlers for any of the pipeline stages
//! - [`Engine`] - Owns the plugins and global plugin data; runs `process()`
//! - [`RenderNode`] - The rendered tree, serializable to HTML
//!
//! # Example
//!
//! ```ignore
//! use quarto_codeblock::{BlockStage, CodeBlock, Engine, InlineRange, Plugin, WrapperAnnotation};
//!
//! let strike = Plugin::new("strike").on(BlockStage::AnnotateCode, |ctx| {
//!     let range = InlineRange::new(8, 12);
//!     ctx.code_block
//!         .add_annotation(1, WrapperAnnotation::inline("del", "del", range))?;
//!     Ok(())
//! });
//!
//! let mut engine = Engine::new(vec![strike]);
//! let result = engine.process(CodeBlock::new("Example code...\n...with two lines!", "js", ""))?;
//!
//! // <pre><code><div>Example code...</div><div>...with <del>two </del>lines!</div></code></pre>
//! println!("{}", result.group_contents[0].block_ast.to_html());
//! ```

pub mod ast;
pub mod block;
pub mod config;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod meta;
pub mod plugin;
pub mod plugins;
pub mod render;

// Re-export commonly used types
pub use ast::{Element, RenderNode};
pub use block::{
    Annotation, AnnotationRenderContext, AnnotationRenderer, ClassAnnotation, CodeBlock,
    CodeBlockDescriptor, InlineRange, Line, ParentDocument, Permission, PositionInDocument,
    ProcessingState, RenderPhase, TokenAnnotation, WrapperAnnotation,
};
pub use config::EngineConfig;
pub use engine::{
    BlockInput, Engine, EngineObserver, NoopObserver, ProcessInput, ProcessResult, RenderedBlock,
    RenderedGroup, TracingObserver,
};
pub use error::{BlockLabel, CodeBlockError, Result};
pub use highlight::{HighlightToken, NoopHighlighter, SyntaxHighlighter};
pub use meta::{LineRange, MetaOption, MetaOptions, MetaValue};
pub use plugin::{
    BlockHookContext, BlockRenderContext, BlockRenderData, BlockStage, GroupPosition, HookName,
    LineRenderContext, LineRenderData, Plugin, PluginDataScope, PluginId,
};
