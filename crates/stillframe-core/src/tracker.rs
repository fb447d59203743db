//! Live resource accounting
//!
//! Backends attach a `TrackedResource` token to every surface and scene graph
//! they create. The token decrements its counter on drop, so a tracker with a
//! zero live count proves that nothing allocated by a capture survived it.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Kind of tracked resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Offscreen render target
    Surface,
    /// Backend-side scene graph
    SceneGraph,
}

impl ResourceKind {
    fn index(self) -> usize {
        match self {
            Self::Surface => 0,
            Self::SceneGraph => 1,
        }
    }
}

#[derive(Default)]
struct Counters {
    live: [AtomicUsize; 2],
    allocated: [AtomicUsize; 2],
}

/// Shared live/allocated counters
#[derive(Clone, Default)]
pub struct ResourceTracker {
    counters: Arc<Counters>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new resource; it stays live until the token is dropped
    pub fn track(&self, kind: ResourceKind) -> TrackedResource {
        let i = kind.index();
        self.counters.live[i].fetch_add(1, Ordering::SeqCst);
        self.counters.allocated[i].fetch_add(1, Ordering::SeqCst);

        TrackedResource {
            kind,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Resources of this kind currently alive
    pub fn live(&self, kind: ResourceKind) -> usize {
        self.counters.live[kind.index()].load(Ordering::SeqCst)
    }

    /// All resources currently alive
    pub fn live_total(&self) -> usize {
        self.live(ResourceKind::Surface) + self.live(ResourceKind::SceneGraph)
    }

    /// Resources of this kind ever allocated through this tracker
    pub fn allocated(&self, kind: ResourceKind) -> usize {
        self.counters.allocated[kind.index()].load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ResourceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTracker")
            .field("live_surfaces", &self.live(ResourceKind::Surface))
            .field("live_scene_graphs", &self.live(ResourceKind::SceneGraph))
            .finish()
    }
}

/// RAII token for one tracked resource
pub struct TrackedResource {
    kind: ResourceKind,
    counters: Arc<Counters>,
}

impl TrackedResource {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl fmt::Debug for TrackedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedResource")
            .field("kind", &self.kind)
            .finish()
    }
}

impl Drop for TrackedResource {
    fn drop(&mut self) {
        self.counters.live[self.kind.index()].fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(kind = ?self.kind, "Released resource");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_and_release() {
        let tracker = ResourceTracker::new();
        let surface = tracker.track(ResourceKind::Surface);
        let graph = tracker.track(ResourceKind::SceneGraph);

        assert_eq!(tracker.live(ResourceKind::Surface), 1);
        assert_eq!(tracker.live_total(), 2);
        assert_eq!(surface.kind(), ResourceKind::Surface);

        drop(surface);
        assert_eq!(tracker.live(ResourceKind::Surface), 0);
        assert_eq!(tracker.live(ResourceKind::SceneGraph), 1);

        drop(graph);
        assert_eq!(tracker.live_total(), 0);
        assert_eq!(tracker.allocated(ResourceKind::Surface), 1);
        assert_eq!(tracker.allocated(ResourceKind::SceneGraph), 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let tracker = ResourceTracker::new();
        let clone = tracker.clone();

        let _token = clone.track(ResourceKind::Surface);
        assert_eq!(tracker.live(ResourceKind::Surface), 1);
    }
}
