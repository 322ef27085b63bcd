//! Dashboard aggregates over the accumulated visit list.
//!
//! Every function is pure: it borrows its input, never mutates it, and runs
//! in linear or log-linear time so callers can recompute on each filter
//! change. Groupings preserve first-seen order and sorts are stable, so ties
//! always resolve to the earliest record.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use insights_core::models::{InventoryItem, VisitEvent, ALL_LOCATIONS, UNIDENTIFIED_PRODUCER};
use serde::Serialize;

/// Service bucket for visits with a blank service label in the mix chart.
pub const OTHER_SERVICE: &str = "Other";
/// Service bucket for visits with a blank service label in producer detail.
pub const GENERAL_SERVICE_BUCKET: &str = "General";

// ── Output rows ───────────────────────────────────────────────────────────────

/// Summed quantity for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationTotal {
    pub location: String,
    pub total: u64,
}

/// Summed quantity for one ISO date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateTotal {
    pub date: String,
    pub quantity: u64,
}

/// Summed quantity for one service label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceTotal {
    pub service: String,
    pub total: u64,
}

/// Number of visits for one service label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCount {
    pub service: String,
    pub visits: usize,
}

/// Accumulated activity of one producer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProducerStats {
    pub producer: String,
    pub visits: usize,
    pub quantity: u64,
    pub hours: f64,
    /// Location of the producer's most recent record in list order.
    pub last_location: String,
}

/// Producer with the highest summed quantity in a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalChampion {
    pub location: String,
    pub producer: String,
    pub quantity: u64,
}

/// Summed quantity for one producer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProducerTotal {
    pub producer: String,
    pub total: u64,
}

/// Everything the producer detail view shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProducerDetail {
    pub producer: String,
    pub visits: usize,
    pub total_hours: f64,
    /// `total_hours / visits`, or `0.0` without visits.
    pub average_hours: f64,
    /// Distinct locations in first-seen order.
    pub locations: Vec<String>,
    pub services: Vec<ServiceCount>,
    pub timeline: Vec<DateTotal>,
    /// The producer's visits, in list order.
    pub diary: Vec<VisitEvent>,
}

/// One point of the inventory valuation scatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryPoint {
    pub name: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub total_value: f64,
}

// ── OrderedGroups ─────────────────────────────────────────────────────────────

/// Insertion-ordered grouping keyed by a domain string.
///
/// Iteration follows the order in which keys were first seen, which is what
/// gives every aggregate its first-encountered tie-break.
#[derive(Debug, Default)]
struct OrderedGroups<V> {
    index: HashMap<String, usize>,
    groups: Vec<(String, V)>,
}

impl<V: Default> OrderedGroups<V> {
    fn new() -> Self {
        Self::default()
    }

    /// Accumulator for `key`, created on first sight.
    fn entry(&mut self, key: &str) -> &mut V {
        let pos = match self.index.get(key) {
            Some(&pos) => pos,
            None => {
                self.groups.push((key.to_string(), V::default()));
                let pos = self.groups.len() - 1;
                self.index.insert(key.to_string(), pos);
                pos
            }
        };
        &mut self.groups[pos].1
    }

    fn into_vec(self) -> Vec<(String, V)> {
        self.groups
    }
}

// ── VisitAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that derives dashboard series from visit events.
pub struct VisitAggregator;

impl VisitAggregator {
    /// Events at `location`, or all events when it is [`ALL_LOCATIONS`].
    pub fn filter_by_location(events: &[VisitEvent], location: &str) -> Vec<VisitEvent> {
        if location == ALL_LOCATIONS {
            return events.to_vec();
        }
        events
            .iter()
            .filter(|e| e.location == location)
            .cloned()
            .collect()
    }

    /// Quantity per location, in first-seen order.
    pub fn bar_series(events: &[VisitEvent]) -> Vec<LocationTotal> {
        let mut groups: OrderedGroups<u64> = OrderedGroups::new();
        for event in events {
            add_quantity(groups.entry(&event.location), event.quantity);
        }
        groups
            .into_vec()
            .into_iter()
            .map(|(location, total)| LocationTotal { location, total })
            .collect()
    }

    /// Quantity per date, ascending by date.
    pub fn time_series(events: &[VisitEvent]) -> Vec<DateTotal> {
        let mut map: BTreeMap<&str, u64> = BTreeMap::new();
        for event in events {
            add_quantity(map.entry(event.date.as_str()).or_default(), event.quantity);
        }
        map.into_iter()
            .map(|(date, quantity)| DateTotal {
                date: date.to_string(),
                quantity,
            })
            .collect()
    }

    /// Quantity per service label, descending; blank labels count as
    /// [`OTHER_SERVICE`].
    pub fn service_mix(events: &[VisitEvent]) -> Vec<ServiceTotal> {
        let mut groups: OrderedGroups<u64> = OrderedGroups::new();
        for event in events {
            let service = non_blank_or(&event.service_type, OTHER_SERVICE);
            add_quantity(groups.entry(service), event.quantity);
        }
        let mut out: Vec<ServiceTotal> = groups
            .into_vec()
            .into_iter()
            .map(|(service, total)| ServiceTotal { service, total })
            .collect();
        out.sort_by(|a, b| b.total.cmp(&a.total));
        out
    }

    /// Producers by summed quantity, descending, without the unidentified
    /// sentinel.
    pub fn producer_ranking(events: &[VisitEvent]) -> Vec<ProducerStats> {
        let mut groups: OrderedGroups<ProducerStats> = OrderedGroups::new();
        for event in events.iter().filter(|e| !e.is_unidentified()) {
            let stats = groups.entry(&event.producer_name);
            stats.visits += 1;
            add_quantity(&mut stats.quantity, event.quantity);
            stats.hours += event.duration_hours;
            stats.last_location.clone_from(&event.location);
        }
        let mut out: Vec<ProducerStats> = groups
            .into_vec()
            .into_iter()
            .map(|(producer, stats)| ProducerStats { producer, ..stats })
            .collect();
        out.sort_by(|a, b| b.quantity.cmp(&a.quantity));
        out
    }

    /// Top producer per location, descending by the champion's quantity.
    ///
    /// Ties go to the producer seen first in that location. Locations won by
    /// the unidentified sentinel or an empty name are dropped.
    pub fn regional_champions(events: &[VisitEvent]) -> Vec<RegionalChampion> {
        let mut locations: OrderedGroups<OrderedGroups<u64>> = OrderedGroups::new();
        for event in events {
            let total = locations
                .entry(&event.location)
                .entry(&event.producer_name);
            add_quantity(total, event.quantity);
        }

        let mut out: Vec<RegionalChampion> = locations
            .into_vec()
            .into_iter()
            .filter_map(|(location, producers)| {
                let (producer, quantity) = first_max(producers.into_vec())?;
                if producer.is_empty() || producer == UNIDENTIFIED_PRODUCER {
                    return None;
                }
                Some(RegionalChampion {
                    location,
                    producer,
                    quantity,
                })
            })
            .collect();
        out.sort_by(|a, b| b.quantity.cmp(&a.quantity));
        out
    }

    /// Producers active at `location`, by summed quantity, descending.
    ///
    /// Empty when `location` is [`ALL_LOCATIONS`]; the sentinel producer is
    /// excluded.
    pub fn producers_in_region(events: &[VisitEvent], location: &str) -> Vec<ProducerTotal> {
        if location == ALL_LOCATIONS {
            return Vec::new();
        }
        let mut groups: OrderedGroups<u64> = OrderedGroups::new();
        for event in events
            .iter()
            .filter(|e| e.location == location && !e.is_unidentified())
        {
            add_quantity(groups.entry(&event.producer_name), event.quantity);
        }
        let mut out: Vec<ProducerTotal> = groups
            .into_vec()
            .into_iter()
            .map(|(producer, total)| ProducerTotal { producer, total })
            .collect();
        out.sort_by(|a, b| b.total.cmp(&a.total));
        out
    }

    /// Sorted, de-duplicated locations.
    pub fn available_locations(events: &[VisitEvent]) -> Vec<String> {
        events
            .iter()
            .map(|e| e.location.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Detail view for `producer`.
    pub fn producer_detail(events: &[VisitEvent], producer: &str) -> ProducerDetail {
        let diary: Vec<VisitEvent> = events
            .iter()
            .filter(|e| e.producer_name == producer)
            .cloned()
            .collect();

        let visits = diary.len();
        let total_hours: f64 = diary.iter().map(|e| e.duration_hours).sum();
        let average_hours = if visits > 0 {
            total_hours / visits as f64
        } else {
            0.0
        };

        let mut locations: Vec<String> = Vec::new();
        for event in &diary {
            if !locations.contains(&event.location) {
                locations.push(event.location.clone());
            }
        }

        let mut services: OrderedGroups<usize> = OrderedGroups::new();
        for event in &diary {
            *services.entry(non_blank_or(&event.service_type, GENERAL_SERVICE_BUCKET)) += 1;
        }

        ProducerDetail {
            producer: producer.to_string(),
            visits,
            total_hours,
            average_hours,
            locations,
            services: services
                .into_vec()
                .into_iter()
                .map(|(service, visits)| ServiceCount { service, visits })
                .collect(),
            timeline: Self::time_series(&diary),
            diary,
        }
    }

    /// Valuation scatter points for an inventory snapshot.
    pub fn inventory_points(items: &[InventoryItem]) -> Vec<InventoryPoint> {
        items
            .iter()
            .map(|item| InventoryPoint {
                name: item.name.clone(),
                quantity: item.current_quantity,
                unit_cost: item.unit_cost,
                total_value: item.total_value(),
            })
            .collect()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Quantity sums saturate at `u64::MAX`.
fn add_quantity(total: &mut u64, quantity: u64) {
    *total = total.saturating_add(quantity);
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Entry with the largest value; the earliest entry wins ties.
fn first_max(entries: Vec<(String, u64)>) -> Option<(String, u64)> {
    let mut best: Option<(String, u64)> = None;
    for (key, value) in entries {
        match &best {
            Some((_, top)) if value <= *top => {}
            _ => best = Some((key, value)),
        }
    }
    best
}

// ── Tests ─────────────────────────────────────────────────────────────────────
