/*
 * block/line.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * A single line of a code block with its annotations.
 */

use super::annotation::{Annotation, InlineRange};

/// One line of a code block.
///
/// Lines are owned by their [`CodeBlock`](super::CodeBlock) and can only be
/// edited through it, so that every change goes through the block's
/// permission checks.
#[derive(Debug, Clone, Default)]
pub struct Line {
    text: String,
    annotations: Vec<Annotation>,
}

impl Line {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            annotations: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in columns (Unicode scalar values).
    pub fn column_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Annotations in insertion order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations with the given name, in insertion order.
    pub fn annotations_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Annotation> {
        self.annotations.iter().filter(move |a| a.name() == name)
    }

    pub(crate) fn push_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    pub(crate) fn remove_annotation(&mut self, index: usize) -> Option<Annotation> {
        (index < self.annotations.len()).then(|| self.annotations.remove(index))
    }

    pub(crate) fn retain_annotations(&mut self, mut keep: impl FnMut(&Annotation) -> bool) -> usize {
        let before = self.annotations.len();
        self.annotations.retain(|a| keep(a));
        before - self.annotations.len()
    }

    /// Replace `column_start..column_end` with `new_text`, re-positioning
    /// inline annotations to follow the text they were attached to.
    ///
    /// Bounds must already be validated against the current text.
    pub(crate) fn edit_text(&mut self, column_start: usize, column_end: usize, new_text: &str) {
        let start_byte = byte_offset(&self.text, column_start);
        let end_byte = byte_offset(&self.text, column_end);
        self.text.replace_range(start_byte..end_byte, new_text);

        let edit = InlineRange::new(column_start, column_end);
        let inserted = new_text.chars().count();
        self.annotations = std::mem::take(&mut self.annotations)
            .into_iter()
            .filter_map(|annotation| match annotation.inline_range() {
                None => Some(annotation),
                Some(range) => {
                    adjust_range(range, edit, inserted).map(|adjusted| {
                        if adjusted == range {
                            annotation
                        } else {
                            annotation.reranged(adjusted)
                        }
                    })
                }
            })
            .collect();
    }
}

/// Compute where an annotation range lands after `edit` was replaced by
/// `inserted` columns of text. `None` means the annotation is dropped.
fn adjust_range(range: InlineRange, edit: InlineRange, inserted: usize) -> Option<InlineRange> {
    let shift = |column: usize| column + inserted - edit.len();
    let (start, end) = (range.column_start, range.column_end);

    // An empty annotation at an insertion point moves with the inserted text
    let at_insertion = edit.is_empty() && range.is_empty() && start == edit.column_start;
    if end <= edit.column_start && !at_insertion {
        return Some(range);
    }
    if start >= edit.column_end {
        return Some(InlineRange::new(shift(start), shift(end)));
    }
    if !edit.is_empty() && start >= edit.column_start && end <= edit.column_end {
        // Fully replaced
        return None;
    }
    if start <= edit.column_start && end >= edit.column_end {
        // Contains the edit: the end follows the length change
        return Some(InlineRange::new(start, shift(end)));
    }
    if start < edit.column_start {
        // Overlaps the edit's start: clip to it
        return Some(InlineRange::new(start, edit.column_start));
    }
    // Overlaps the edit's end: begin after the inserted text
    Some(InlineRange::new(edit.column_start + inserted, shift(end)))
}

/// Byte offset of a column, clamped to the end of the text.
pub(crate) fn byte_offset(text: &str, column: usize) -> usize {
    text.char_indices()
        .nth(column)
        .map_or(text.len(), |(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::annotation::WrapperAnnotation;

    fn line_with(text: &str, ranges: &[(usize, usize)]) -> Line {
        let mut line = Line::new(text);
        for (i, (s, e)) in ranges.iter().enumerate() {
            line.push_annotation(WrapperAnnotation::inline(
                format!("a{}", i),
                "mark",
                InlineRange::new(*s, *e),
            ));
        }
        line
    }

    fn ranges(line: &Line) -> Vec<(String, usize, usize)> {
        line.annotations()
            .iter()
            .map(|a| {
                let r = a.inline_range().unwrap();
                (a.name().to_string(), r.column_start, r.column_end)
            })
            .collect()
    }

    #[test]
    fn test_edit_shifts_later_annotations() {
        let mut line = line_with("let x = 1;", &[(0, 3), (8, 9)]);
        line.edit_text(4, 5, "value");
        assert_eq!(line.text(), "let value = 1;");
        assert_eq!(
            ranges(&line),
            vec![("a0".to_string(), 0, 3), ("a1".to_string(), 12, 13)]
        );
    }

    #[test]
    fn test_edit_removes_fully_replaced_annotation() {
        let mut line = line_with("abcdef", &[(2, 4)]);
        line.edit_text(1, 5, "X");
        assert_eq!(line.text(), "aXf");
        assert!(line.annotations().is_empty());
    }

    #[test]
    fn test_edit_inside_annotation_resizes_it() {
        let mut line = line_with("abcdef", &[(1, 5)]);
        line.edit_text(2, 3, "XYZ");
        assert_eq!(line.text(), "abXYZdef");
        assert_eq!(ranges(&line), vec![("a0".to_string(), 1, 7)]);
    }

    #[test]
    fn test_edit_clips_overlapping_annotations() {
        let mut line = line_with("abcdefgh", &[(0, 4), (5, 8)]);
        line.edit_text(3, 6, "");
        assert_eq!(line.text(), "abcgh");
        assert_eq!(
            ranges(&line),
            vec![("a0".to_string(), 0, 3), ("a1".to_string(), 3, 5)]
        );
    }

    #[test]
    fn test_edit_handles_multibyte_text() {
        let mut line = line_with("héllo wörld", &[(6, 11)]);
        line.edit_text(0, 5, "hi");
        assert_eq!(line.text(), "hi wörld");
        assert_eq!(ranges(&line), vec![("a0".to_string(), 3, 8)]);
    }

    #[test]
    fn test_remove_and_retain_annotations() {
        let mut line = line_with("abc", &[(0, 1), (1, 2), (2, 3)]);
        let removed = line.remove_annotation(1);
        assert_eq!(removed.as_ref().map(Annotation::name), Some("a1"));
        assert!(line.remove_annotation(5).is_none());
        assert_eq!(line.retain_annotations(|a| a.name() != "a2"), 1);
        assert_eq!(line.annotations_named("a0").count(), 1);
    }
}
