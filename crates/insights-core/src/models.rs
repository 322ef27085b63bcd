use serde::{Deserialize, Serialize};

/// Producer name substituted when a row carries none.
pub const UNIDENTIFIED_PRODUCER: &str = "Unidentified";

/// Location substituted when a row carries none.
pub const GENERAL_LOCATION: &str = "General";

/// Service label substituted when a row carries none.
pub const GENERAL_SERVICE: &str = "General Visit";

/// Species recorded on every ingested visit; exports never carry one.
pub const GENERAL_SPECIES: &str = "General";

/// Location filter value that disables filtering.
pub const ALL_LOCATIONS: &str = "All";

/// One normalised occurrence of a service rendered to a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitEvent {
    /// Locality the visit took place in.
    pub location: String,
    /// Producer (farmer) who received the service.
    pub producer_name: String,
    /// Human-readable service label.
    pub service_type: String,
    pub species: String,
    /// ISO-8601 calendar date (`YYYY-MM-DD`).
    pub date: String,
    /// Units of service, always at least 1.
    pub quantity: u64,
    /// Technical hours spent, two-decimal precision.
    pub duration_hours: f64,
}

impl VisitEvent {
    /// `true` when the producer is the [`UNIDENTIFIED_PRODUCER`] sentinel.
    pub fn is_unidentified(&self) -> bool {
        self.producer_name == UNIDENTIFIED_PRODUCER
    }
}

/// Kind of consumable held in the inventory snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCategory {
    Input,
    Medication,
}

/// One line of an inventory (stock) snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    /// Cost per unit in local currency.
    pub unit_cost: f64,
    /// Units currently on hand.
    pub current_quantity: f64,
    pub category: InventoryCategory,
}

impl InventoryItem {
    /// Stock value on hand (`current_quantity × unit_cost`).
    pub fn total_value(&self) -> f64 {
        self.current_quantity * self.unit_cost
    }
}

/// Semen doses available per breed; static reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneticsDose {
    pub breed: String,
    pub dose_count: u32,
}

/// A single canonical record produced from one raw row.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Visit(VisitEvent),
    Inventory(InventoryItem),
}
