//! In-memory record store for one session.
//!
//! Visit events accumulate across ingestion batches; the inventory is a
//! snapshot that each non-empty inventory upload replaces wholesale. Every
//! mutation bumps [`RecordStore::revision`], which is what the dashboard keys
//! its memoized aggregates on.

use insights_core::models::{InventoryItem, VisitEvent};
use insights_core::reference::demo_inventory;

// ── RecordStore ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordStore {
    visits: Vec<VisitEvent>,
    inventory: Vec<InventoryItem>,
    revision: u64,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Store seeded with the demo inventory catalog and no visits.
    pub fn new() -> Self {
        Self::with_inventory(demo_inventory())
    }

    pub fn with_inventory(inventory: Vec<InventoryItem>) -> Self {
        Self {
            visits: Vec::new(),
            inventory,
            revision: 0,
        }
    }

    pub fn visits(&self) -> &[VisitEvent] {
        &self.visits
    }

    pub fn inventory(&self) -> &[InventoryItem] {
        &self.inventory
    }

    /// Monotonic counter, incremented on every change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append `events` after the existing ones. No de-duplication.
    pub fn append_visits(&mut self, events: Vec<VisitEvent>) {
        if events.is_empty() {
            return;
        }
        self.visits.extend(events);
        self.revision += 1;
    }

    /// Replace the inventory snapshot. An empty list leaves it untouched.
    ///
    /// Returns whether the snapshot was replaced.
    pub fn replace_inventory(&mut self, items: Vec<InventoryItem>) -> bool {
        if items.is_empty() {
            return false;
        }
        self.inventory = items;
        self.revision += 1;
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
