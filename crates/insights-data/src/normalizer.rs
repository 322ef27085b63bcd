//! Row-level conversion from raw cells to canonical records.
//!
//! The schema is decided once per file by [`crate::schema::SchemaDetector`];
//! [`RecordNormalizer`] then maps every data row through the matching column
//! layout, applying sentinel defaults and the coercions in
//! [`insights_core::coercion`].

use std::collections::HashMap;

use insights_core::coercion::{
    ceil_quantity, compute_duration, normalize_date, parse_locale_number, round2, DateSource,
};
use insights_core::models::{
    InventoryCategory, InventoryItem, Record, VisitEvent, GENERAL_LOCATION, GENERAL_SERVICE,
    GENERAL_SPECIES, UNIDENTIFIED_PRODUCER,
};
use tracing::debug;

use crate::schema::{
    Detection, ForestryColumns, GenericVisitColumns, InventoryColumns, MasterProfileColumns,
    SchemaLayout, VeterinaryColumns,
};

/// Service label for veterinary counts in master profile exports.
pub const VETERINARY_VISIT_SERVICE: &str = "Veterinary Visit";
/// Service label for forestry rows without a service of their own.
pub const FORESTRY_SERVICE: &str = "Forestry";
/// Service label for every row of a detailed veterinary log.
pub const VETERINARY_SERVICE: &str = "Veterinary";

const VET_HOURS_PER_SERVICE: f64 = 2.0;
const FORESTRY_HOURS_PER_SERVICE: f64 = 4.0;
const FORESTRY_HOURS_PER_AREA: f64 = 3.0;

// ── NormalizedFile ────────────────────────────────────────────────────────────

/// Records extracted from one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFile {
    pub visits: Vec<VisitEvent>,
    pub inventory: Vec<InventoryItem>,
    /// Data rows that produced no record.
    pub rows_skipped: usize,
}

// ── RecordNormalizer ──────────────────────────────────────────────────────────

/// Converts raw rows into [`Record`]s.
///
/// Borrows the [`DateSource`] used for rows without a usable date.
pub struct RecordNormalizer<'a> {
    dates: &'a dyn DateSource,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(dates: &'a dyn DateSource) -> Self {
        Self { dates }
    }

    /// Normalise every row after the detected header.
    ///
    /// Inventory items sharing a name keep the first position and the last
    /// row's values.
    pub fn normalize_file(&self, detection: &Detection, rows: &[Vec<String>]) -> NormalizedFile {
        let mut out = NormalizedFile::default();
        let Some(header) = detection.header_row else {
            return out;
        };

        let mut inventory_index: HashMap<String, usize> = HashMap::new();

        for row in rows.iter().skip(header + 1) {
            let records = self.normalize(&detection.layout, row);
            if records.is_empty() {
                out.rows_skipped += 1;
                continue;
            }
            for record in records {
                match record {
                    Record::Visit(visit) => out.visits.push(visit),
                    Record::Inventory(item) => {
                        let existing = inventory_index.get(&item.name).copied();
                        match existing {
                            Some(pos) => out.inventory[pos] = item,
                            None => {
                                inventory_index.insert(item.name.clone(), out.inventory.len());
                                out.inventory.push(item);
                            }
                        }
                    }
                }
            }
        }

        debug!(
            "Normalized {} rows: {} visits, {} inventory items, {} skipped",
            rows.len().saturating_sub(header + 1),
            out.visits.len(),
            out.inventory.len(),
            out.rows_skipped
        );

        out
    }

    /// Normalise one data row. An empty result means the row was rejected.
    pub fn normalize(&self, layout: &SchemaLayout, row: &[String]) -> Vec<Record> {
        match layout {
            SchemaLayout::Inventory(cols) => self
                .inventory_item(cols, row)
                .map(Record::Inventory)
                .into_iter()
                .collect(),
            SchemaLayout::MasterProfile(cols) => self
                .master_profile(cols, row)
                .into_iter()
                .map(Record::Visit)
                .collect(),
            SchemaLayout::Forestry(cols) => self
                .forestry(cols, row)
                .map(Record::Visit)
                .into_iter()
                .collect(),
            SchemaLayout::Veterinary(cols) => self
                .veterinary(cols, row)
                .map(Record::Visit)
                .into_iter()
                .collect(),
            SchemaLayout::GenericVisit(cols) => self
                .generic_visit(cols, row)
                .map(Record::Visit)
                .into_iter()
                .collect(),
            SchemaLayout::Unrecognized => Vec::new(),
        }
    }

    // ── Per-schema rules ──────────────────────────────────────────────────────

    fn inventory_item(&self, cols: &InventoryColumns, row: &[String]) -> Option<InventoryItem> {
        let name = cell(row, Some(cols.item))?;
        if name.to_lowercase().starts_with("total") {
            return None;
        }

        Some(InventoryItem {
            name: name.to_string(),
            unit_cost: number(row, Some(cols.cost)).max(0.0),
            current_quantity: number(row, cols.quantity).max(0.0),
            category: InventoryCategory::Input,
        })
    }

    /// Up to two visits: one per non-zero service count.
    fn master_profile(&self, cols: &MasterProfileColumns, row: &[String]) -> Vec<VisitEvent> {
        let Some(producer) = cell(row, cols.name) else {
            return Vec::new();
        };
        let location = location(row, cols.location);
        let date = self.date(row, None);

        let programs = [
            (cols.vet_services, VETERINARY_VISIT_SERVICE, VET_HOURS_PER_SERVICE),
            (cols.forestry_services, FORESTRY_SERVICE, FORESTRY_HOURS_PER_SERVICE),
        ];

        programs
            .into_iter()
            .filter_map(|(column, service, hours_per_service)| {
                let count = number(row, Some(column));
                (count > 0.0).then(|| VisitEvent {
                    location: location.clone(),
                    producer_name: producer.to_string(),
                    service_type: service.to_string(),
                    species: GENERAL_SPECIES.to_string(),
                    date: date.clone(),
                    quantity: ceil_quantity(count),
                    duration_hours: round2(count * hours_per_service),
                })
            })
            .collect()
    }

    fn forestry(&self, cols: &ForestryColumns, row: &[String]) -> Option<VisitEvent> {
        let producer = cell(row, cols.name)?;
        let area = number(row, cols.area);
        let basis = if area > 0.0 { area } else { 1.0 };

        Some(VisitEvent {
            location: location(row, cols.location),
            producer_name: producer.to_string(),
            service_type: cell(row, cols.service)
                .unwrap_or(FORESTRY_SERVICE)
                .to_string(),
            species: GENERAL_SPECIES.to_string(),
            date: self.date(row, cols.date),
            quantity: 1,
            duration_hours: round2(basis * FORESTRY_HOURS_PER_AREA),
        })
    }

    fn veterinary(&self, cols: &VeterinaryColumns, row: &[String]) -> Option<VisitEvent> {
        let producer = cell(row, cols.name)?;

        Some(VisitEvent {
            location: location(row, cols.location),
            producer_name: producer.to_string(),
            service_type: VETERINARY_SERVICE.to_string(),
            species: GENERAL_SPECIES.to_string(),
            date: self.date(row, cols.date),
            quantity: ceil_quantity(number(row, Some(cols.animals))),
            duration_hours: compute_duration(
                cell(row, cols.entry).unwrap_or_default(),
                cell(row, cols.exit).unwrap_or_default(),
                true,
            ),
        })
    }

    /// Keyed by producer when a name column exists, otherwise by location.
    fn generic_visit(&self, cols: &GenericVisitColumns, row: &[String]) -> Option<VisitEvent> {
        let producer = match cols.name {
            Some(_) => cell(row, cols.name)?.to_string(),
            None => {
                cell(row, cols.location)?;
                UNIDENTIFIED_PRODUCER.to_string()
            }
        };

        let quantity = match cols.quantity {
            Some(_) => ceil_quantity(number(row, cols.quantity)),
            None => 1,
        };

        let duration_hours = match (cols.entry, cols.exit) {
            (Some(_), Some(_)) => compute_duration(
                cell(row, cols.entry).unwrap_or_default(),
                cell(row, cols.exit).unwrap_or_default(),
                false,
            ),
            _ => 0.0,
        };

        Some(VisitEvent {
            location: location(row, cols.location),
            producer_name: producer,
            service_type: cell(row, cols.service)
                .unwrap_or(GENERAL_SERVICE)
                .to_string(),
            species: GENERAL_SPECIES.to_string(),
            date: self.date(row, cols.date),
            quantity,
            duration_hours,
        })
    }

    fn date(&self, row: &[String], column: Option<usize>) -> String {
        normalize_date(cell(row, column).unwrap_or_default(), self.dates)
    }
}

// ── Cell helpers ──────────────────────────────────────────────────────────────

/// Trimmed, non-blank cell at `column`.
fn cell(row: &[String], column: Option<usize>) -> Option<&str> {
    row.get(column?)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
}

fn number(row: &[String], column: Option<usize>) -> f64 {
    cell(row, column).map(parse_locale_number).unwrap_or(0.0)
}

fn location(row: &[String], column: Option<usize>) -> String {
    cell(row, column).unwrap_or(GENERAL_LOCATION).to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
