//! Dashboard presentation state.
//!
//! The dashboard starts on the aggregate view and moves to a producer's
//! detail view on selection. Neither transition touches the records; the
//! selected producer is only a pointer into the store.
//!
//! Aggregates are bundled into a [`DashboardSnapshot`] that is recomputed only
//! when the store revision or the location filter changes.

use insights_core::models::{GeneticsDose, ALL_LOCATIONS};
use insights_core::reference::genetics_doses;
use insights_data::aggregator::{
    DateTotal, InventoryPoint, LocationTotal, ProducerDetail, ProducerStats, ProducerTotal,
    RegionalChampion, ServiceTotal, VisitAggregator,
};
use serde::Serialize;
use tracing::debug;

use crate::store::RecordStore;

// ── DashboardView ─────────────────────────────────────────────────────────────

/// Which screen the dashboard is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DashboardView {
    Aggregate,
    ProducerDetail { producer: String },
}

// ── DashboardSnapshot ─────────────────────────────────────────────────────────

/// Every aggregate the aggregate view shows, for one filter.
///
/// Series are computed over the location-filtered events;
/// `available_locations` always covers every event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub location_filter: String,
    pub available_locations: Vec<String>,
    pub visit_count: usize,
    pub locations: Vec<LocationTotal>,
    pub timeline: Vec<DateTotal>,
    pub service_mix: Vec<ServiceTotal>,
    pub producer_ranking: Vec<ProducerStats>,
    pub regional_champions: Vec<RegionalChampion>,
    pub producers_in_region: Vec<ProducerTotal>,
    pub inventory: Vec<InventoryPoint>,
    pub genetics: Vec<GeneticsDose>,
}

impl DashboardSnapshot {
    pub fn build(store: &RecordStore, location_filter: &str) -> Self {
        let filtered = VisitAggregator::filter_by_location(store.visits(), location_filter);

        Self {
            location_filter: location_filter.to_string(),
            available_locations: VisitAggregator::available_locations(store.visits()),
            visit_count: filtered.len(),
            locations: VisitAggregator::bar_series(&filtered),
            timeline: VisitAggregator::time_series(&filtered),
            service_mix: VisitAggregator::service_mix(&filtered),
            producer_ranking: VisitAggregator::producer_ranking(&filtered),
            regional_champions: VisitAggregator::regional_champions(&filtered),
            producers_in_region: VisitAggregator::producers_in_region(&filtered, location_filter),
            inventory: VisitAggregator::inventory_points(store.inventory()),
            genetics: genetics_doses(),
        }
    }
}

// ── Dashboard ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CachedSnapshot {
    revision: u64,
    location_filter: String,
    snapshot: DashboardSnapshot,
}

/// Presentation state machine over a [`RecordStore`].
#[derive(Debug, Clone)]
pub struct Dashboard {
    view: DashboardView,
    location_filter: String,
    cache: Option<CachedSnapshot>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            view: DashboardView::Aggregate,
            location_filter: ALL_LOCATIONS.to_string(),
            cache: None,
        }
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn location_filter(&self) -> &str {
        &self.location_filter
    }

    pub fn set_location_filter(&mut self, location: impl Into<String>) {
        self.location_filter = location.into();
    }

    /// Open the detail view for `producer`.
    pub fn select_producer(&mut self, producer: impl Into<String>) {
        self.view = DashboardView::ProducerDetail {
            producer: producer.into(),
        };
    }

    /// Go back to the aggregate view.
    pub fn return_to_dashboard(&mut self) {
        self.view = DashboardView::Aggregate;
    }

    /// Aggregates for the current filter, rebuilt only when stale.
    pub fn snapshot(&mut self, store: &RecordStore) -> &DashboardSnapshot {
        let stale = match &self.cache {
            Some(cached) => {
                cached.revision != store.revision() || cached.location_filter != self.location_filter
            }
            None => true,
        };

        if stale {
            self.cache = None;
        }

        let location_filter = &self.location_filter;
        let cached = self.cache.get_or_insert_with(|| {
            debug!(
                "Rebuilding dashboard snapshot (revision {}, filter {})",
                store.revision(),
                location_filter
            );
            CachedSnapshot {
                revision: store.revision(),
                location_filter: location_filter.clone(),
                snapshot: DashboardSnapshot::build(store, location_filter),
            }
        });
        &cached.snapshot
    }

    /// Detail for the selected producer over every event, or `None` on the
    /// aggregate view.
    pub fn producer_detail(&self, store: &RecordStore) -> Option<ProducerDetail> {
        match &self.view {
            DashboardView::Aggregate => None,
            DashboardView::ProducerDetail { producer } => {
                Some(VisitAggregator::producer_detail(store.visits(), producer))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
