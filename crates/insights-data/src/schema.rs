//! Header sniffing for exports of unknown layout.
//!
//! Exports arrive with title banners above the header, columns in any order
//! and no declaration of what they describe. [`SchemaDetector::detect`] scans
//! the top of the file for the first row that looks like a known header and
//! fixes a typed column map for the rest of the file.

use std::fmt;

use serde::Serialize;

/// Rows inspected when looking for a header.
pub const HEADER_SCAN_LIMIT: usize = 25;

const INVENTORY_ITEM: &[&str] = &["insumo", "medicamento", "descrição"];
const INVENTORY_COST: &[&str] = &["custo", "valor"];
const INVENTORY_QUANTITY: &[&str] = &["quantidade", "estoque", "saldo"];
const MASTER_VET: &str = "atendimento vet";
const MASTER_FORESTRY: &str = "carvoejamento";
const FORESTRY_FILE: &str = "silvicultura";
const FORESTRY_AREA_TOTAL: &str = "area total";
const VET_ANIMALS_SEEN: &str = "animais atendidos";
const GENERIC_PLACE: &[&str] = &["local", "propriedade", "fazenda"];
const GENERIC_NAME_EXACT: &[&str] = &["nome", "produtor"];

const NAME: &[&str] = &["nome"];
const LOCATION: &[&str] = &["local"];
const SERVICE: &[&str] = &["serviço", "servico"];
const DATE: &[&str] = &["data"];
const ENTRY: &[&str] = &["entrada"];
const EXIT: &[&str] = &["saida", "saída"];

// ── Schema kinds and column maps ──────────────────────────────────────────────

/// Classification assigned to an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SchemaKind {
    Inventory,
    MasterProfile,
    Forestry,
    Veterinary,
    GenericVisit,
    Unrecognized,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SchemaKind::Inventory => "inventory",
            SchemaKind::MasterProfile => "master profile",
            SchemaKind::Forestry => "forestry",
            SchemaKind::Veterinary => "veterinary",
            SchemaKind::GenericVisit => "generic visit",
            SchemaKind::Unrecognized => "unrecognized",
        };
        f.write_str(label)
    }
}

/// Stock listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryColumns {
    pub item: usize,
    pub cost: usize,
    pub quantity: Option<usize>,
}

/// One row per producer with service counts per program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterProfileColumns {
    pub name: Option<usize>,
    pub location: Option<usize>,
    pub vet_services: usize,
    pub forestry_services: usize,
}

/// Forestry/agronomic visits; area drives the hours estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestryColumns {
    pub name: Option<usize>,
    pub location: Option<usize>,
    pub service: Option<usize>,
    pub date: Option<usize>,
    pub area: Option<usize>,
}

/// Detailed veterinary log with clock-in/clock-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VeterinaryColumns {
    pub name: Option<usize>,
    pub location: Option<usize>,
    pub treatment: Option<usize>,
    pub animals: usize,
    pub entry: Option<usize>,
    pub exit: Option<usize>,
    pub date: Option<usize>,
}

/// Anything keyed by a place or a producer name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericVisitColumns {
    pub name: Option<usize>,
    pub location: Option<usize>,
    pub service: Option<usize>,
    pub date: Option<usize>,
    pub quantity: Option<usize>,
    pub entry: Option<usize>,
    pub exit: Option<usize>,
}

/// Column map for a classified file, fixed once per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaLayout {
    Inventory(InventoryColumns),
    MasterProfile(MasterProfileColumns),
    Forestry(ForestryColumns),
    Veterinary(VeterinaryColumns),
    GenericVisit(GenericVisitColumns),
    Unrecognized,
}

impl SchemaLayout {
    pub fn kind(&self) -> SchemaKind {
        match self {
            SchemaLayout::Inventory(_) => SchemaKind::Inventory,
            SchemaLayout::MasterProfile(_) => SchemaKind::MasterProfile,
            SchemaLayout::Forestry(_) => SchemaKind::Forestry,
            SchemaLayout::Veterinary(_) => SchemaKind::Veterinary,
            SchemaLayout::GenericVisit(_) => SchemaKind::GenericVisit,
            SchemaLayout::Unrecognized => SchemaKind::Unrecognized,
        }
    }
}

/// Result of scanning one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Index of the header row; data starts on the next row.
    pub header_row: Option<usize>,
    pub layout: SchemaLayout,
}

impl Detection {
    fn unrecognized() -> Self {
        Self {
            header_row: None,
            layout: SchemaLayout::Unrecognized,
        }
    }

    pub fn kind(&self) -> SchemaKind {
        self.layout.kind()
    }
}

// ── SchemaDetector ────────────────────────────────────────────────────────────

/// Stateless header classifier.
pub struct SchemaDetector;

impl SchemaDetector {
    /// Classify `rows` by the first of the top [`HEADER_SCAN_LIMIT`] rows that
    /// matches a signature.
    ///
    /// Signatures are tried per row in a fixed order (inventory, master
    /// profile, forestry, veterinary, generic visit); the first hit wins.
    pub fn detect(rows: &[Vec<String>], file_name: &str) -> Detection {
        let forestry_file = file_name.to_lowercase().contains(FORESTRY_FILE);

        for (index, row) in rows.iter().take(HEADER_SCAN_LIMIT).enumerate() {
            let cells: Vec<String> = row.iter().map(|c| c.trim().to_lowercase()).collect();
            if let Some(layout) = Self::classify_row(&cells, forestry_file) {
                return Detection {
                    header_row: Some(index),
                    layout,
                };
            }
        }

        Detection::unrecognized()
    }

    /// Test one lower-cased, trimmed row against every signature in order.
    fn classify_row(cells: &[String], forestry_file: bool) -> Option<SchemaLayout> {
        if let (Some(item), Some(cost)) =
            (find_any(cells, INVENTORY_ITEM), find_any(cells, INVENTORY_COST))
        {
            return Some(SchemaLayout::Inventory(InventoryColumns {
                item,
                cost,
                quantity: find_any(cells, INVENTORY_QUANTITY),
            }));
        }

        if let (Some(vet_services), Some(forestry_services)) =
            (find_one(cells, MASTER_VET), find_one(cells, MASTER_FORESTRY))
        {
            return Some(SchemaLayout::MasterProfile(MasterProfileColumns {
                name: find_any(cells, NAME),
                location: find_any(cells, LOCATION),
                vet_services,
                forestry_services,
            }));
        }

        if forestry_file || find_one(cells, FORESTRY_AREA_TOTAL).is_some() {
            return Some(SchemaLayout::Forestry(ForestryColumns {
                name: find_any(cells, NAME),
                location: find_any(cells, LOCATION),
                service: find_any(cells, SERVICE),
                date: find_any(cells, DATE),
                area: find_any(cells, &["area", "área"]),
            }));
        }

        if find_one(cells, VET_ANIMALS_SEEN).is_some() {
            return Some(SchemaLayout::Veterinary(VeterinaryColumns {
                name: find_any(cells, NAME),
                location: find_any(cells, LOCATION),
                treatment: find_any(cells, &["tratamento"]),
                animals: find_one(cells, "animais")?,
                entry: find_any(cells, ENTRY),
                exit: find_any(cells, EXIT),
                date: find_any(cells, DATE),
            }));
        }

        let has_place = find_any(cells, GENERIC_PLACE).is_some();
        let has_name = find_exact(cells, GENERIC_NAME_EXACT).is_some();
        if has_place || has_name {
            return Some(SchemaLayout::GenericVisit(GenericVisitColumns {
                name: find_exact(cells, GENERIC_NAME_EXACT)
                    .or_else(|| find_any(cells, GENERIC_NAME_EXACT)),
                location: find_any(cells, GENERIC_PLACE),
                service: find_any(cells, &["serviço", "servico", "atendimento", "tipo"]),
                date: find_any(cells, DATE),
                quantity: find_any(cells, &["quantidade", "qtd"]),
                entry: find_any(cells, ENTRY),
                exit: find_any(cells, EXIT),
            }));
        }

        None
    }
}

/// First cell containing any of `needles`.
fn find_any(cells: &[String], needles: &[&str]) -> Option<usize> {
    cells
        .iter()
        .position(|cell| needles.iter().any(|needle| cell.contains(needle)))
}

/// First cell equal to any of `names`.
fn find_exact(cells: &[String], names: &[&str]) -> Option<usize> {
    cells.iter().position(|cell| names.contains(&cell.as_str()))
}

fn find_one(cells: &[String], needle: &str) -> Option<usize> {
    find_any(cells, &[needle])
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    // ── signatures ────────────────────────────────────────────────────────────

    #[test]
    fn test_detect_inventory() {
        let data = rows(&[&["Descrição", "Custo", "Saldo"], &["Luva", "0,50", "100"]]);
        let d = SchemaDetector::detect(&data, "estoque.csv");
        assert_eq!(d.header_row, Some(0));
        assert_eq!(
            d.layout,
            SchemaLayout::Inventory(InventoryColumns {
                item: 0,
                cost: 1,
                quantity: Some(2),
            })
        );
    }

    #[test]
    fn test_detect_inventory_without_quantity() {
        let data = rows(&[&["Medicamento", "Valor Unitário"]]);
        let d = SchemaDetector::detect(&data, "x.csv");
        assert_eq!(
            d.layout,
            SchemaLayout::Inventory(InventoryColumns {
                item: 0,
                cost: 1,
                quantity: None,
            })
        );
    }

    #[test]
    fn test_detect_master_profile() {
        let data = rows(&[&["Nome", "Localidade", "Atendimento Vet", "Carvoejamento"]]);
        let d = SchemaDetector::detect(&data, "perfil.csv");
        assert_eq!(
            d.layout,
            SchemaLayout::MasterProfile(MasterProfileColumns {
                name: Some(0),
                location: Some(1),
                vet_services: 2,
                forestry_services: 3,
            })
        );
    }

    #[test]
    fn test_detect_forestry_by_area_total() {
        let data = rows(&[&["Nome", "Local", "Serviço", "Data", "Area Total (ha)"]]);
        let d = SchemaDetector::detect(&data, "campo.csv");
        assert_eq!(
            d.layout,
            SchemaLayout::Forestry(ForestryColumns {
                name: Some(0),
                location: Some(1),
                service: Some(2),
                date: Some(3),
                area: Some(4),
            })
        );
    }

    #[test]
    fn test_detect_forestry_by_file_name_takes_first_row() {
        let data = rows(&[&["Relatório 2025"], &["Nome", "Local"]]);
        let d = SchemaDetector::detect(&data, "Silvicultura_Marco.csv");
        assert_eq!(d.kind(), SchemaKind::Forestry);
        assert_eq!(d.header_row, Some(0));
    }

    #[test]
    fn test_detect_veterinary() {
        let data = rows(&[&[
            "Data",
            "Nome",
            "Local",
            "Tratamento",
            "Animais Atendidos",
            "Hora Entrada",
            "Hora Saida",
        ]]);
        let d = SchemaDetector::detect(&data, "vet.csv");
        assert_eq!(
            d.layout,
            SchemaLayout::Veterinary(VeterinaryColumns {
                name: Some(1),
                location: Some(2),
                treatment: Some(3),
                animals: 4,
                entry: Some(5),
                exit: Some(6),
                date: Some(0),
            })
        );
    }

    #[test]
    fn test_detect_generic_visit_by_place() {
        let data = rows(&[&["Fazenda", "Serviço", "Data", "Quantidade"]]);
        let d = SchemaDetector::detect(&data, "visitas.csv");
        assert_eq!(
            d.layout,
            SchemaLayout::GenericVisit(GenericVisitColumns {
                name: None,
                location: Some(0),
                service: Some(1),
                date: Some(2),
                quantity: Some(3),
                entry: None,
                exit: None,
            })
        );
    }

    #[test]
    fn test_detect_generic_visit_by_exact_name() {
        let data = rows(&[&["Produtor", "Data"]]);
        let d = SchemaDetector::detect(&data, "x.csv");
        assert_eq!(d.kind(), SchemaKind::GenericVisit);

        // "nome" only as a substring is not enough on its own.
        let data = rows(&[&["Nome completo", "Data"]]);
        assert_eq!(SchemaDetector::detect(&data, "x.csv").kind(), SchemaKind::Unrecognized);
    }

    #[test]
    fn test_generic_visit_prefers_exact_name_column() {
        let data = rows(&[&["Fazenda", "Nome do Técnico", "Produtor", "Data"]]);
        match SchemaDetector::detect(&data, "visitas.csv").layout {
            SchemaLayout::GenericVisit(cols) => {
                assert_eq!(cols.name, Some(2));
                assert_eq!(cols.location, Some(0));
            }
            other => panic!("expected generic visit, got {other:?}"),
        }

        let data = rows(&[&["Nome do Técnico", "Local", "Nome"]]);
        match SchemaDetector::detect(&data, "visitas.csv").layout {
            SchemaLayout::GenericVisit(cols) => assert_eq!(cols.name, Some(2)),
            other => panic!("expected generic visit, got {other:?}"),
        }

        // Substring match is still the fallback.
        let data = rows(&[&["Fazenda", "Nome do Produtor", "Data"]]);
        match SchemaDetector::detect(&data, "visitas.csv").layout {
            SchemaLayout::GenericVisit(cols) => assert_eq!(cols.name, Some(1)),
            other => panic!("expected generic visit, got {other:?}"),
        }
    }

    // ── scanning ──────────────────────────────────────────────────────────────

    #[test]
    fn test_header_after_banner_rows() {
        let data = rows(&[
            &["Prefeitura Municipal"],
            &["Relatório de estoque", ""],
            &["  DESCRIÇÃO ", " CUSTO "],
            &["Luva", "0,50"],
        ]);
        let d = SchemaDetector::detect(&data, "x.csv");
        assert_eq!(d.header_row, Some(2));
        assert_eq!(d.kind(), SchemaKind::Inventory);
    }

    #[test]
    fn test_first_signature_wins_within_row() {
        // Inventory and generic tokens on the same row: inventory is tested first.
        let data = rows(&[&["Local", "Insumo", "Custo"]]);
        assert_eq!(SchemaDetector::detect(&data, "x.csv").kind(), SchemaKind::Inventory);

        // Master profile beats forestry even when the file name says forestry.
        let data = rows(&[&["Nome", "Atendimento Vet", "Carvoejamento"]]);
        assert_eq!(
            SchemaDetector::detect(&data, "silvicultura.csv").kind(),
            SchemaKind::MasterProfile
        );
    }

    #[test]
    fn test_first_matching_row_wins() {
        let data = rows(&[&["Local", "Data"], &["Insumo", "Custo"]]);
        let d = SchemaDetector::detect(&data, "x.csv");
        assert_eq!(d.kind(), SchemaKind::GenericVisit);
        assert_eq!(d.header_row, Some(0));
    }

    #[test]
    fn test_header_beyond_scan_window_is_unrecognized() {
        let mut data: Vec<Vec<String>> = (0..HEADER_SCAN_LIMIT)
            .map(|i| vec![format!("linha {i}")])
            .collect();
        data.push(vec!["Insumo".to_string(), "Custo".to_string()]);
        let d = SchemaDetector::detect(&data, "x.csv");
        assert_eq!(d.kind(), SchemaKind::Unrecognized);
        assert_eq!(d.header_row, None);
    }

    #[test]
    fn test_empty_file_is_unrecognized() {
        assert_eq!(SchemaDetector::detect(&[], "x.csv").kind(), SchemaKind::Unrecognized);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let data = rows(&[&["Nome", "Local", "Animais Atendidos"]]);
        assert_eq!(
            SchemaDetector::detect(&data, "x.csv"),
            SchemaDetector::detect(&data, "x.csv")
        );
    }
}
