/*
 * plugins/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Built-in plugins.
 */

mod text_markers;

pub use text_markers::{MarkerType, PLUGIN_NAME as TEXT_MARKERS, text_markers};
