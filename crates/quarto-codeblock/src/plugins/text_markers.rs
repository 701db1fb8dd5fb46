/*
 * plugins/text_markers.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Line and text markers driven by meta options.
 */

//! Text markers.
//!
//! Marks, insertions and deletions are requested in the meta string:
//!
//! ```text
//! ```js {3} ins={5-6} del="old()" mark=/\bTODO\b/i "highlight me"
//! ```
//!
//! Line ranges produce a full-line class (`mark`, `ins` or `del`); strings and
//! regexes wrap every match in `<mark>`, `<ins>` or `<del>`. Bare ranges and
//! bare strings mean `mark`.

use regex::{Regex, RegexBuilder};

use crate::block::{ClassAnnotation, InlineRange, RenderPhase, WrapperAnnotation};
use crate::meta::{LineRange, MetaOptions, MetaValue};
use crate::plugin::{BlockHookContext, BlockStage, Plugin, PluginDataScope};

pub const PLUGIN_NAME: &str = "text-markers";

const BASE_STYLES: &str = "\
div.mark { background: rgba(255, 225, 120, 0.25); }
div.ins { background: rgba(90, 200, 120, 0.2); }
div.del { background: rgba(240, 90, 90, 0.2); }
mark { background: rgba(255, 225, 120, 0.5); color: inherit; }
ins { background: rgba(90, 200, 120, 0.4); text-decoration: none; }
del { background: rgba(240, 90, 90, 0.4); text-decoration: line-through; }";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerType {
    Mark,
    Ins,
    Del,
}

impl MarkerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerType::Mark => "mark",
            MarkerType::Ins => "ins",
            MarkerType::Del => "del",
        }
    }

    /// Marker type for a meta key; unkeyed values are marks.
    fn from_key(key: Option<&str>) -> Option<Self> {
        match key {
            None | Some("mark") | Some("highlight") => Some(MarkerType::Mark),
            Some("ins") => Some(MarkerType::Ins),
            Some("del") => Some(MarkerType::Del),
            Some(_) => None,
        }
    }
}

#[derive(Debug)]
enum Term {
    Text(String),
    Pattern(Regex),
}

impl Term {
    /// Byte spans of every non-empty match in `text`.
    fn find_in(&self, text: &str) -> Vec<(usize, usize)> {
        match self {
            Term::Text(needle) => text
                .match_indices(needle.as_str())
                .map(|(start, m)| (start, start + m.len()))
                .collect(),
            Term::Pattern(re) => re
                .find_iter(text)
                .filter(|m| !m.is_empty())
                .map(|m| (m.start(), m.end()))
                .collect(),
        }
    }
}

/// Markers requested by one block's meta.
#[derive(Debug, Default)]
struct BlockMarkers {
    lines: Vec<(MarkerType, LineRange)>,
    terms: Vec<(MarkerType, Term)>,
}

/// The text markers plugin.
pub fn text_markers() -> Plugin {
    Plugin::new(PLUGIN_NAME)
        .with_base_styles(BASE_STYLES)
        .on(BlockStage::PreprocessMetadata, collect_markers)
        .on(BlockStage::AnnotateCode, annotate_markers)
}

fn collect_markers(ctx: &mut BlockHookContext<'_>) -> anyhow::Result<()> {
    let options = MetaOptions::parse(ctx.code_block.meta());
    let data = ctx.plugin_data_with(PluginDataScope::Block, BlockMarkers::default)?;
    let mut markers = data.borrow_mut();

    for option in options.iter() {
        let Some(marker) = MarkerType::from_key(option.key.as_deref()) else {
            continue;
        };
        match &option.value {
            MetaValue::Ranges(ranges) => {
                markers
                    .lines
                    .extend(ranges.iter().map(|range| (marker, *range)));
            }
            MetaValue::String(text) if !text.is_empty() => {
                markers.terms.push((marker, Term::Text(text.clone())));
            }
            MetaValue::Regex { pattern, flags } => {
                let re = RegexBuilder::new(pattern)
                    .case_insensitive(flags.contains('i'))
                    .multi_line(flags.contains('m'))
                    .build()
                    .map_err(|e| {
                        anyhow::anyhow!("invalid {} pattern /{}/: {}", marker.as_str(), pattern, e)
                    })?;
                markers.terms.push((marker, Term::Pattern(re)));
            }
            _ => {}
        }
    }

    tracing::trace!(
        lines = markers.lines.len(),
        terms = markers.terms.len(),
        "Collected text markers"
    );
    Ok(())
}

fn annotate_markers(ctx: &mut BlockHookContext<'_>) -> anyhow::Result<()> {
    let data = ctx.plugin_data_with(PluginDataScope::Block, BlockMarkers::default)?;
    let markers = data.borrow();
    if markers.lines.is_empty() && markers.terms.is_empty() {
        return Ok(());
    }

    let texts: Vec<String> = ctx
        .code_block
        .lines()
        .iter()
        .map(|line| line.text().to_string())
        .collect();

    for (index, text) in texts.iter().enumerate() {
        for (marker, range) in &markers.lines {
            if range.contains_index(index) {
                let annotation = ClassAnnotation::line(marker.as_str(), marker.as_str())
                    .with_render_phase(RenderPhase::Earlier);
                ctx.code_block.add_annotation(index, annotation)?;
            }
        }
        for (marker, term) in &markers.terms {
            for (start, end) in term.find_in(text) {
                let range = InlineRange::new(column_at(text, start), column_at(text, end));
                let annotation = WrapperAnnotation::inline(marker.as_str(), marker.as_str(), range)
                    .with_render_phase(RenderPhase::Earlier);
                ctx.code_block.add_annotation(index, annotation)?;
            }
        }
    }
    Ok(())
}

fn column_at(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}
