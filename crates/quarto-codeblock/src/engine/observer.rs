/*
 * engine/observer.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Engine observer for tracing and test instrumentation.
 */

//! Observer abstraction for engine execution events.
//!
//! The engine reports progress through an [`EngineObserver`] instead of
//! logging directly, so callers can route events to `tracing`, collect them
//! in tests, or drop them entirely.

use crate::error::{BlockLabel, CodeBlockError};
use crate::plugin::HookName;

/// Observer for engine execution events.
///
/// All methods have empty default implementations, allowing observers
/// to implement only the events they care about.
pub trait EngineObserver: Send + Sync {
    /// Called when a `process()` call begins.
    ///
    /// # Arguments
    ///
    /// * `block_count` - Number of blocks in the call
    /// * `group_count` - Number of block groups they form
    fn on_process_start(&self, _block_count: usize, _group_count: usize) {}

    /// Called before a block enters the first stage.
    fn on_block_start(&self, _block: &BlockLabel) {}

    /// Called before each plugin hook invocation.
    fn on_hook(&self, _hook: HookName, _plugin: &str, _block: &BlockLabel) {}

    /// Called after a block has been rendered and post-processed.
    fn on_block_complete(&self, _block: &BlockLabel, _line_count: usize) {}

    /// Called when a block fails. Processing stops after this.
    fn on_block_error(&self, _block: &BlockLabel, _error: &CodeBlockError) {}

    /// Called when every block of a call completed successfully.
    fn on_process_complete(&self, _block_count: usize) {}
}

/// No-op observer implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// Tracing observer that emits `tracing` events.
///
/// This is the engine's default. Per-hook events are emitted at debug level
/// since a busy document produces many of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn on_process_start(&self, block_count: usize, group_count: usize) {
        tracing::info!(
            process.blocks = block_count,
            process.groups = group_count,
            "Processing code blocks"
        );
    }

    fn on_block_start(&self, block: &BlockLabel) {
        tracing::debug!(
            block.index = block.call_index,
            block.language = %block.language,
            "Starting block"
        );
    }

    fn on_hook(&self, hook: HookName, plugin: &str, block: &BlockLabel) {
        tracing::debug!(
            hook.name = hook.as_str(),
            plugin.name = plugin,
            block.index = block.call_index,
            "Running hook"
        );
    }

    fn on_block_complete(&self, block: &BlockLabel, line_count: usize) {
        tracing::debug!(
            block.index = block.call_index,
            block.lines = line_count,
            "Completed block"
        );
    }

    fn on_block_error(&self, block: &BlockLabel, error: &CodeBlockError) {
        tracing::error!(
            block = %block,
            error = %error,
            "Block failed"
        );
    }

    fn on_process_complete(&self, block_count: usize) {
        tracing::info!(process.blocks = block_count, "Processed code blocks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records hook names in order.
    #[derive(Default)]
    struct RecordingObserver {
        hooks: Mutex<Vec<String>>,
    }

    impl EngineObserver for RecordingObserver {
        fn on_hook(&self, hook: HookName, plugin: &str, _block: &BlockLabel) {
            self.hooks
                .lock()
                .unwrap()
                .push(format!("{}:{}", plugin, hook));
        }
    }

    fn label() -> BlockLabel {
        BlockLabel {
            language: "js".to_string(),
            source_file: None,
            group_index: None,
            call_index: 0,
        }
    }

    #[test]
    fn test_default_methods_are_noops() {
        let observer = NoopObserver;
        observer.on_process_start(1, 1);
        observer.on_hook(HookName::AnnotateCode, "p", &label());
        observer.on_block_error(&label(), &CodeBlockError::validation("x"));
        observer.on_process_complete(1);
    }

    #[test]
    fn test_tracing_observer_without_subscriber() {
        let observer = TracingObserver;
        observer.on_block_start(&label());
        observer.on_block_complete(&label(), 3);
    }

    #[test]
    fn test_custom_observer_overrides_one_event() {
        let observer = RecordingObserver::default();
        observer.on_block_start(&label());
        observer.on_hook(HookName::PreprocessCode, "a", &label());
        observer.on_hook(HookName::AnnotateCode, "b", &label());
        assert_eq!(
            *observer.hooks.lock().unwrap(),
            vec!["a:preprocessCode", "b:annotateCode"]
        );
    }
}
