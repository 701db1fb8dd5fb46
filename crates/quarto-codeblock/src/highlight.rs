/*
 * highlight.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The syntax highlighter seam.
 */

//! Syntax highlighting interface.
//!
//! The engine does not highlight code itself. A [`SyntaxHighlighter`] is
//! consulted at the start of `performSyntaxAnalysis`, and every token it
//! returns is attached to its line as a [`TokenAnnotation`].

use crate::block::{CodeBlock, InlineRange, TokenAnnotation};
use crate::error::Result;

/// A scoped span of highlighted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightToken {
    /// Zero-based line index
    pub line: usize,
    pub range: InlineRange,
    /// Class name applied to the token, e.g. `"hl-keyword"`
    pub scope: String,
}

impl HighlightToken {
    pub fn new(line: usize, range: InlineRange, scope: impl Into<String>) -> Self {
        Self {
            line,
            range,
            scope: scope.into(),
        }
    }
}

/// Produces scoped tokens for code in a given language.
pub trait SyntaxHighlighter {
    fn highlight(&self, code: &str, language: &str) -> anyhow::Result<Vec<HighlightToken>>;
}

/// Highlighter that never produces tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHighlighter;

impl SyntaxHighlighter for NoopHighlighter {
    fn highlight(&self, _code: &str, _language: &str) -> anyhow::Result<Vec<HighlightToken>> {
        Ok(Vec::new())
    }
}

/// Attach tokens to a block as token annotations.
///
/// Tokens are validated like any other annotation, so a token outside its
/// line is an error. Zero-width tokens are skipped. Returns the number applied.
pub(crate) fn apply_tokens(block: &mut CodeBlock, tokens: Vec<HighlightToken>) -> Result<usize> {
    let mut applied = 0;
    // Zero-width tokens have nothing to style
    for token in tokens.into_iter().filter(|t| !t.range.is_empty()) {
        block.add_annotation(token.line, TokenAnnotation::new(token.scope, token.range))?;
        applied += 1;
    }
    Ok(applied)
}
