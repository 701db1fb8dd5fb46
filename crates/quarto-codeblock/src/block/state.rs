/*
 * block/state.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Processing state: which parts of a block may be edited right now.
 */

use std::fmt;

/// The edit permissions active while a pipeline stage runs.
///
/// The engine attaches one state to a block before each stage; every mutator
/// on [`CodeBlock`](super::CodeBlock) checks it before touching anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessingState {
    /// Language and meta may be changed
    pub can_edit_metadata: bool,
    /// Code, line text and line count may be changed
    pub can_edit_code: bool,
    /// Annotations may be attached and detached
    pub can_edit_annotations: bool,
}

impl ProcessingState {
    /// Everything editable. Blocks start here, outside of any pipeline.
    pub const UNRESTRICTED: Self = Self {
        can_edit_metadata: true,
        can_edit_code: true,
        can_edit_annotations: true,
    };

    /// Nothing editable. Used once rendering begins.
    pub const READ_ONLY: Self = Self {
        can_edit_metadata: false,
        can_edit_code: false,
        can_edit_annotations: false,
    };

    pub const fn new(
        can_edit_metadata: bool,
        can_edit_code: bool,
        can_edit_annotations: bool,
    ) -> Self {
        Self {
            can_edit_metadata,
            can_edit_code,
            can_edit_annotations,
        }
    }

    /// Whether the given permission is granted.
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::Metadata => self.can_edit_metadata,
            Permission::Code => self.can_edit_code,
            Permission::Annotations => self.can_edit_annotations,
        }
    }
}

impl Default for ProcessingState {
    fn default() -> Self {
        Self::UNRESTRICTED
    }
}

/// One of the three independently gated edit surfaces of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Metadata,
    Code,
    Annotations,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Metadata => write!(f, "metadata"),
            Permission::Code => write!(f, "code"),
            Permission::Annotations => write!(f, "annotations"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_matches_flags() {
        let state = ProcessingState::new(false, true, false);
        assert!(!state.allows(Permission::Metadata));
        assert!(state.allows(Permission::Code));
        assert!(!state.allows(Permission::Annotations));
    }

    #[test]
    fn test_default_is_unrestricted() {
        assert_eq!(ProcessingState::default(), ProcessingState::UNRESTRICTED);
        assert!(!ProcessingState::READ_ONLY.allows(Permission::Annotations));
    }
}
