//! Snapshot subscription feed for the menu forest.
//!
//! # Responsibility
//! - Fan out immutable forest snapshots to any number of readers.
//! - Keep subscription state owned by the service instead of ambient globals.
//!
//! # Invariants
//! - `revision` strictly increases per published snapshot.
//! - Publishing never blocks; lagging receivers skip to newer snapshots.

use crate::model::forest::MenuForest;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

/// One published state of the forest.
#[derive(Debug, Clone)]
pub struct ForestSnapshot {
    pub revision: u64,
    pub forest: Arc<MenuForest>,
}

/// Broadcast sender for forest snapshots.
#[derive(Debug)]
pub struct SnapshotFeed {
    sender: broadcast::Sender<ForestSnapshot>,
    revision: AtomicU64,
}

impl SnapshotFeed {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            revision: AtomicU64::new(0),
        }
    }

    /// Returns a receiver for snapshots published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ForestSnapshot> {
        self.sender.subscribe()
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    /// Revision of the latest published snapshot (0 before any).
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Publishes `forest` and returns its revision.
    pub fn publish(&self, forest: Arc<MenuForest>) -> u64 {
        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        // No receivers is not an error for a feed.
        let _ = self.sender.send(ForestSnapshot { revision, forest });
        revision
    }
}

impl Default for SnapshotFeed {
    fn default() -> Self {
        Self::new()
    }
}
