/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for the code block pipeline.
 */

//! Error types for quarto-codeblock

use std::fmt;

use thiserror::Error;

use crate::block::Permission;
use crate::plugin::{HookName, PluginDataScope};

/// Identifies a block in error messages.
///
/// Carries the block's language and an approximate location built from its
/// parent document information, so errors can point a user at the right
/// fence in a long document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLabel {
    /// Language tag of the failing block
    pub language: String,
    /// Source file path, if the caller supplied one
    pub source_file: Option<String>,
    /// Group index within the parent document, if known
    pub group_index: Option<usize>,
    /// Index of the block within the current `process()` call
    pub call_index: usize,
}

impl fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let language = if self.language.is_empty() {
            "<no language>"
        } else {
            &self.language
        };
        write!(f, "block #{} ({})", self.call_index, language)?;
        match (&self.source_file, self.group_index) {
            (Some(file), Some(group)) => write!(f, " in {} (group {})", file, group),
            (Some(file), None) => write!(f, " in {}", file),
            (None, Some(group)) => write!(f, " (group {})", group),
            (None, None) => Ok(()),
        }
    }
}

#[derive(Error, Debug)]
pub enum CodeBlockError {
    /// Malformed input to the engine's entry operation.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A mutator was called while the active processing state forbids it.
    #[error("Cannot edit {permission} during {}", .stage.map_or("this stage", |s| s.as_str()))]
    PermissionDenied {
        permission: Permission,
        stage: Option<HookName>,
    },

    #[error("Line index {index} is out of range (block has {line_count} lines)")]
    LineOutOfRange { index: usize, line_count: usize },

    #[error(
        "Columns {column_start}..{column_end} are outside line {line} (length {line_length})"
    )]
    ColumnOutOfRange {
        line: usize,
        column_start: usize,
        column_end: usize,
        line_length: usize,
    },

    #[error(
        "Annotation '{name}' range {column_start}..{column_end} exceeds line length {line_length}"
    )]
    AnnotationOutOfRange {
        name: String,
        column_start: usize,
        column_end: usize,
        line_length: usize,
    },

    #[error("Annotation '{name}' has an empty range at column {column}")]
    EmptyAnnotationRange { name: String, column: usize },

    #[error("Annotation index {index} is out of range (line has {count} annotations)")]
    AnnotationIndexOutOfRange { index: usize, count: usize },

    /// An annotation's render function broke the node-count contract.
    #[error("Annotation '{name}' returned {returned} nodes for {expected} input nodes")]
    AnnotationRender {
        name: String,
        expected: usize,
        returned: usize,
    },

    /// A line of a block could not be rendered.
    #[error("Rendering line {line} failed for {block}: {source}")]
    Render {
        block: BlockLabel,
        line: usize,
        source: Box<CodeBlockError>,
    },

    /// A plugin hook failed; wraps whatever the hook returned.
    #[error("Plugin '{plugin}' failed in {hook} for {block}: {source}")]
    PluginHook {
        plugin: String,
        hook: HookName,
        block: BlockLabel,
        #[source]
        source: anyhow::Error,
    },

    #[error("Syntax highlighting failed for {block}: {source}")]
    Highlighter {
        block: BlockLabel,
        #[source]
        source: anyhow::Error,
    },

    /// Plugin data was requested with a different type than it was stored with.
    #[error("Plugin '{plugin}' {scope} data is not of type {expected}")]
    PluginDataType {
        plugin: String,
        scope: PluginDataScope,
        expected: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CodeBlockError {
    /// Create a validation error from any message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Check whether this error is, or was caused by, a permission violation.
    ///
    /// Permission errors raised inside a hook reach the caller wrapped in
    /// [`CodeBlockError::PluginHook`]; this looks through that wrapper.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::PermissionDenied { .. } => true,
            Self::PluginHook { source, .. } => source
                .downcast_ref::<CodeBlockError>()
                .is_some_and(CodeBlockError::is_permission_denied),
            _ => false,
        }
    }

    /// The hook that failed, if this error came from a plugin.
    pub fn hook(&self) -> Option<HookName> {
        match self {
            Self::PluginHook { hook, .. } => Some(*hook),
            _ => None,
        }
    }

    /// The block the error was raised for, if known.
    pub fn block(&self) -> Option<&BlockLabel> {
        match self {
            Self::PluginHook { block, .. }
            | Self::Highlighter { block, .. }
            | Self::Render { block, .. } => Some(block),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodeBlockError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn label() -> BlockLabel {
        BlockLabel {
            language: "rust".to_string(),
            source_file: Some("docs/intro.md".to_string()),
            group_index: Some(2),
            call_index: 0,
        }
    }

    #[test]
    fn test_block_label_display() {
        assert_eq!(
            label().to_string(),
            "block #0 (rust) in docs/intro.md (group 2)"
        );

        let bare = BlockLabel {
            language: String::new(),
            source_file: None,
            group_index: None,
            call_index: 3,
        };
        assert_eq!(bare.to_string(), "block #3 (<no language>)");
    }

    #[test]
    fn test_permission_denied_display() {
        let err = CodeBlockError::PermissionDenied {
            permission: Permission::Code,
            stage: Some(HookName::AnnotateCode),
        };
        let msg = err.to_string();
        assert!(msg.contains("code"));
        assert!(msg.contains("annotateCode"));
    }

    #[test]
    fn test_permission_denied_through_hook_wrapper() {
        let inner = CodeBlockError::PermissionDenied {
            permission: Permission::Metadata,
            stage: Some(HookName::PreprocessCode),
        };
        let err = CodeBlockError::PluginHook {
            plugin: "test".to_string(),
            hook: HookName::PreprocessCode,
            block: label(),
            source: anyhow::Error::new(inner),
        };
        assert!(err.is_permission_denied());
        assert_eq!(err.hook(), Some(HookName::PreprocessCode));
        assert_eq!(err.block().map(|b| b.language.as_str()), Some("rust"));
    }

    #[test]
    fn test_render_error_names_block_and_line() {
        let err = CodeBlockError::Render {
            block: label(),
            line: 4,
            source: Box::new(CodeBlockError::AnnotationRender {
                name: "drop".to_string(),
                expected: 1,
                returned: 0,
            }),
        };
        assert_eq!(
            err.to_string(),
            "Rendering line 4 failed for block #0 (rust) in docs/intro.md (group 2): \
             Annotation 'drop' returned 0 nodes for 1 input nodes"
        );
        assert_eq!(err.block().map(|b| b.call_index), Some(0));
        assert_eq!(err.hook(), None);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_plain_hook_error_is_not_permission_denied() {
        let err = CodeBlockError::PluginHook {
            plugin: "test".to_string(),
            hook: HookName::AnnotateCode,
            block: label(),
            source: anyhow::anyhow!("boom"),
        };
        assert!(!err.is_permission_denied());
        assert!(err.to_string().contains("boom"));
    }
}
