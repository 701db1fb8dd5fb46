/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Generic markup tree produced by the renderer.
 */

//! Render tree types.
//!
//! A [`RenderNode`] is a small hast-like markup tree: a root fragment, an
//! element with ordered properties and children, or a text leaf. The renderer
//! produces one element per line and one per block, and plugins may edit or
//! wholly replace either in the post-processing hooks.

use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};

/// A node in the rendered markup tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderNode {
    /// A fragment without a tag of its own
    Root { children: Vec<RenderNode> },
    /// A tagged element
    Element(Element),
    /// A text leaf (escaped when serialized)
    Text { value: String },
}

/// A tagged element with ordered properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,

    /// Element properties in insertion order.
    ///
    /// LinkedHashMap keeps serialization stable, which matters for
    /// snapshot tests and cache keys downstream.
    pub properties: LinkedHashMap<String, String>,

    pub children: Vec<RenderNode>,
}

impl RenderNode {
    /// Create an element node with no properties.
    pub fn element(tag: impl Into<String>, children: Vec<RenderNode>) -> Self {
        Self::Element(Element {
            tag: tag.into(),
            properties: LinkedHashMap::new(),
            children,
        })
    }

    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    /// Create a root fragment.
    pub fn root(children: Vec<RenderNode>) -> Self {
        Self::Root { children }
    }

    /// Builder: set a property on an element (ignored for other nodes).
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element(el) = &mut self {
            el.properties.insert(name.into(), value.into());
        }
        self
    }

    /// Builder: add a class to an element (ignored for other nodes).
    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Add a class to an element's `class` property, skipping duplicates.
    pub fn add_class(&mut self, class: &str) {
        let Self::Element(el) = self else {
            return;
        };
        match el.properties.get_mut("class") {
            Some(existing) => {
                if !existing.split_whitespace().any(|c| c == class) {
                    if !existing.is_empty() {
                        existing.push(' ');
                    }
                    existing.push_str(class);
                }
            }
            None => {
                el.properties.insert("class".to_string(), class.to_string());
            }
        }
    }

    /// Whether an element carries the given class.
    pub fn has_class(&self, class: &str) -> bool {
        self.as_element()
            .and_then(|el| el.properties.get("class"))
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Tag name of an element node.
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|el| el.tag.as_str())
    }

    /// Children of a root or element node; empty for text.
    pub fn children(&self) -> &[RenderNode] {
        match self {
            Self::Root { children } => children,
            Self::Element(el) => &el.children,
            Self::Text { .. } => &[],
        }
    }

    /// Mutable children of a root or element node.
    pub fn children_mut(&mut self) -> Option<&mut Vec<RenderNode>> {
        match self {
            Self::Root { children } => Some(children),
            Self::Element(el) => Some(&mut el.children),
            Self::Text { .. } => None,
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Serialize this tree to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }
}

fn collect_text(node: &RenderNode, out: &mut String) {
    match node {
        RenderNode::Text { value } => out.push_str(value),
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn write_node(node: &RenderNode, out: &mut String) {
    match node {
        RenderNode::Root { children } => {
            for child in children {
                write_node(child, out);
            }
        }
        RenderNode::Text { value } => out.push_str(&escape_html(value)),
        RenderNode::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in &el.properties {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_html(value));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                return;
            }
            for child in &el.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
