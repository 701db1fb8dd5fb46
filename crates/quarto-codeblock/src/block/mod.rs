/*
 * block/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The mutable code block model.
 */

//! The code block model.
//!
//! A [`CodeBlock`] holds its text as an ordered list of [`Line`]s, each with
//! its own annotations. All mutation goes through permission-gated methods:
//! the engine attaches a [`ProcessingState`] before each pipeline stage, and a
//! mutator called outside its permitted stage fails with
//! [`CodeBlockError::PermissionDenied`] without changing anything.

pub mod annotation;
mod line;
mod state;

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{CodeBlockError, Result};
use crate::plugin::HookName;

pub use annotation::{
    Annotation, AnnotationRenderContext, AnnotationRenderer, ClassAnnotation, InlineRange,
    RenderPhase, TokenAnnotation, WrapperAnnotation,
};
pub use line::Line;
pub(crate) use line::byte_offset;
pub use state::{Permission, ProcessingState};

/// Where a block sits in the document it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentDocument {
    /// Path of the source document, used in error messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionInDocument>,
}

/// Logical group of a block within its document.
///
/// Consecutive blocks with the same `group_index` are rendered as one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInDocument {
    pub group_index: usize,
    pub total_groups: usize,
}

/// Plain data describing a block, as accepted by the engine entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlockDescriptor {
    pub code: String,
    pub language: String,
    pub meta: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_document: Option<ParentDocument>,
}

impl CodeBlockDescriptor {
    pub fn new(
        code: impl Into<String>,
        language: impl Into<String>,
        meta: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            meta: meta.into(),
            locale: None,
            parent_document: None,
        }
    }
}

/// One code block moving through the pipeline.
#[derive(Debug, Clone)]
pub struct CodeBlock {
    lines: Vec<Line>,
    language: String,
    meta: String,
    locale: Option<String>,
    parent_document: Option<ParentDocument>,
    state: ProcessingState,
    stage: Option<HookName>,
}

impl CodeBlock {
    pub fn new(code: &str, language: impl Into<String>, meta: impl Into<String>) -> Self {
        Self {
            lines: split_lines(code),
            language: language.into(),
            meta: meta.into(),
            locale: None,
            parent_document: None,
            state: ProcessingState::UNRESTRICTED,
            stage: None,
        }
    }

    pub fn from_descriptor(descriptor: CodeBlockDescriptor) -> Self {
        let mut block = Self::new(&descriptor.code, descriptor.language, descriptor.meta);
        block.locale = descriptor.locale;
        block.parent_document = descriptor.parent_document;
        block
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_parent_document(mut self, parent: ParentDocument) -> Self {
        self.parent_document = Some(parent);
        self
    }

    // Reading is always allowed.

    /// The full text: all lines joined with `\n`.
    pub fn code(&self) -> String {
        self.lines
            .iter()
            .map(Line::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn meta(&self) -> &str {
        &self.meta
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn parent_document(&self) -> Option<&ParentDocument> {
        self.parent_document.as_ref()
    }

    /// Group index from the parent document, if known.
    pub fn group_index(&self) -> Option<usize> {
        self.parent_document
            .as_ref()
            .and_then(|p| p.position)
            .map(|p| p.group_index)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Lines in `range`, which must lie within the block.
    pub fn lines_in(&self, range: Range<usize>) -> Result<&[Line]> {
        self.check_line_range(&range)?;
        Ok(&self.lines[range])
    }

    /// The permissions currently in force.
    pub fn state(&self) -> ProcessingState {
        self.state
    }

    /// The stage currently running, if the block is inside a pipeline.
    pub fn stage(&self) -> Option<HookName> {
        self.stage
    }

    pub(crate) fn enter_stage(&mut self, stage: Option<HookName>, state: ProcessingState) {
        self.stage = stage;
        self.state = state;
    }

    // Metadata

    pub fn set_language(&mut self, language: impl Into<String>) -> Result<()> {
        self.check(Permission::Metadata)?;
        self.language = language.into();
        Ok(())
    }

    pub fn set_meta(&mut self, meta: impl Into<String>) -> Result<()> {
        self.check(Permission::Metadata)?;
        self.meta = meta.into();
        Ok(())
    }

    pub fn set_locale(&mut self, locale: Option<String>) -> Result<()> {
        self.check(Permission::Metadata)?;
        self.locale = locale;
        Ok(())
    }

    // Code

    /// Replace the whole text. Lines are rebuilt and all annotations dropped.
    pub fn set_code(&mut self, code: &str) -> Result<()> {
        self.check(Permission::Code)?;
        self.lines = split_lines(code);
        Ok(())
    }

    /// Insert a line before `index` (`index == line_count()` appends).
    pub fn insert_line(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        self.insert_lines(index, [text])
    }

    pub fn insert_lines<I, S>(&mut self, index: usize, texts: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check(Permission::Code)?;
        if index > self.lines.len() {
            return Err(CodeBlockError::LineOutOfRange {
                index,
                line_count: self.lines.len(),
            });
        }
        let tail = self.lines.split_off(index);
        self.lines.extend(texts.into_iter().map(Line::new));
        self.lines.extend(tail);
        Ok(())
    }

    pub fn remove_line(&mut self, index: usize) -> Result<Line> {
        self.check(Permission::Code)?;
        self.check_line(index)?;
        Ok(self.lines.remove(index))
    }

    pub fn remove_lines(&mut self, range: Range<usize>) -> Result<Vec<Line>> {
        self.check(Permission::Code)?;
        self.check_line_range(&range)?;
        Ok(self.lines.drain(range).collect())
    }

    /// Replace a line's text. Inline annotations are re-ranged as for an
    /// edit spanning the whole old text.
    pub fn set_line_text(&mut self, index: usize, text: &str) -> Result<()> {
        self.check(Permission::Code)?;
        let line = self.line_mut(index)?;
        let end = line.column_count();
        line.edit_text(0, end, text);
        Ok(())
    }

    /// Replace `column_start..column_end` of a line, shifting, clipping or
    /// dropping inline annotations so they stay on the text they marked.
    pub fn edit_line_text(
        &mut self,
        index: usize,
        column_start: usize,
        column_end: usize,
        text: &str,
    ) -> Result<()> {
        self.check(Permission::Code)?;
        let line = self.line_mut(index)?;
        let line_length = line.column_count();
        if column_start > column_end || column_end > line_length {
            return Err(CodeBlockError::ColumnOutOfRange {
                line: index,
                column_start,
                column_end,
                line_length,
            });
        }
        line.edit_text(column_start, column_end, text);
        Ok(())
    }

    // Annotations

    /// Attach an annotation to a line. Inline ranges must be non-empty and
    /// fit the line text.
    pub fn add_annotation(&mut self, index: usize, annotation: Annotation) -> Result<()> {
        self.check(Permission::Annotations)?;
        let line = self.line_mut(index)?;
        if let Some(range) = annotation.inline_range() {
            if range.is_empty() {
                return Err(CodeBlockError::EmptyAnnotationRange {
                    name: annotation.name().to_string(),
                    column: range.column_start,
                });
            }
            let line_length = line.column_count();
            if range.column_end > line_length {
                return Err(CodeBlockError::AnnotationOutOfRange {
                    name: annotation.name().to_string(),
                    column_start: range.column_start,
                    column_end: range.column_end,
                    line_length,
                });
            }
        }
        line.push_annotation(annotation);
        Ok(())
    }

    /// Detach the annotation at `annotation_index` on a line.
    pub fn remove_annotation(&mut self, index: usize, annotation_index: usize) -> Result<Annotation> {
        self.check(Permission::Annotations)?;
        let line = self.line_mut(index)?;
        let count = line.annotations().len();
        line.remove_annotation(annotation_index)
            .ok_or(CodeBlockError::AnnotationIndexOutOfRange {
                index: annotation_index,
                count,
            })
    }

    /// Detach every annotation on a line matching `predicate`; returns how
    /// many were removed.
    pub fn remove_annotations_where(
        &mut self,
        index: usize,
        mut predicate: impl FnMut(&Annotation) -> bool,
    ) -> Result<usize> {
        self.check(Permission::Annotations)?;
        let line = self.line_mut(index)?;
        Ok(line.retain_annotations(|a| !predicate(a)))
    }

    fn check(&self, permission: Permission) -> Result<()> {
        if self.state.allows(permission) {
            Ok(())
        } else {
            Err(CodeBlockError::PermissionDenied {
                permission,
                stage: self.stage,
            })
        }
    }

    fn check_line(&self, index: usize) -> Result<()> {
        if index < self.lines.len() {
            Ok(())
        } else {
            Err(CodeBlockError::LineOutOfRange {
                index,
                line_count: self.lines.len(),
            })
        }
    }

    fn check_line_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start <= range.end && range.end <= self.lines.len() {
            Ok(())
        } else {
            Err(CodeBlockError::LineOutOfRange {
                index: range.end.max(range.start),
                line_count: self.lines.len(),
            })
        }
    }

    fn line_mut(&mut self, index: usize) -> Result<&mut Line> {
        let line_count = self.lines.len();
        self.lines
            .get_mut(index)
            .ok_or(CodeBlockError::LineOutOfRange { index, line_count })
    }
}

impl From<CodeBlockDescriptor> for CodeBlock {
    fn from(descriptor: CodeBlockDescriptor) -> Self {
        Self::from_descriptor(descriptor)
    }
}

/// Split text on `\n` or `\r\n`. Empty text is a single empty line.
fn split_lines(code: &str) -> Vec<Line> {
    code.split('\n')
        .map(|l| Line::new(l.strip_suffix('\r').unwrap_or(l)))
        .collect()
}
