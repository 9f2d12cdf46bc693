//! Diagnostic tracing for lookup resolution.

use std::sync::Arc;

use tracing::trace;

use crate::model::ObjectAndRelation;

/// Sink for structured diagnostic events emitted during resolution.
///
/// Tracers form a tree mirroring the resolution tree; each handler labels
/// its own subtree with `child` and records resolved objects with
/// `child_onr`.
pub trait DebugTracer: Send + Sync {
    /// Creates a child tracer labeled with `label`.
    fn child(&self, label: &str) -> Arc<dyn DebugTracer>;

    /// Creates a child tracer labeled with an object-relation triple.
    fn child_onr(&self, onr: &ObjectAndRelation) -> Arc<dyn DebugTracer> {
        self.child(&onr.to_string())
    }
}

/// A tracer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTracer;

impl DebugTracer for NullTracer {
    fn child(&self, _label: &str) -> Arc<dyn DebugTracer> {
        Arc::new(NullTracer)
    }
}

/// A tracer that emits every node as a `tracing` trace event, carrying the
/// full path from the root.
#[derive(Debug, Default)]
pub struct EventTracer {
    path: String,
}

impl EventTracer {
    /// Creates a root event tracer.
    pub fn root() -> Arc<dyn DebugTracer> {
        Arc::new(Self::default())
    }
}

impl DebugTracer for EventTracer {
    fn child(&self, label: &str) -> Arc<dyn DebugTracer> {
        let path = if self.path.is_empty() {
            label.to_string()
        } else {
            format!("{} > {}", self.path, label)
        };
        trace!(%path, "lookup trace");
        Arc::new(EventTracer { path })
    }
}
