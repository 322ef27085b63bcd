//! Static reference data shipped with the dashboard.

use crate::models::{GeneticsDose, InventoryCategory, InventoryItem};

/// Semen doses in stock per breed.
pub fn genetics_doses() -> Vec<GeneticsDose> {
    [
        ("Nelore", 120),
        ("Gir Leiteiro", 85),
        ("Girolando", 140),
        ("Holandês", 60),
        ("Angus", 45),
    ]
    .into_iter()
    .map(|(breed, dose_count)| GeneticsDose {
        breed: breed.to_string(),
        dose_count,
    })
    .collect()
}

/// Inventory snapshot shown until the first inventory export is uploaded.
pub fn demo_inventory() -> Vec<InventoryItem> {
    use InventoryCategory::{Input, Medication};

    [
        ("Agua destilada 5l", 1.0, 25.00, Input),
        ("Agua Oxigenada 10 Vol 1l", 11.0, 6.25, Input),
        ("Agulha 25x7", 500.0, 0.30, Input),
        ("Agulha 40x1,20 mm", 1000.0, 0.10, Input),
        ("Alcool gel 500g", 7.0, 8.00, Input),
        ("Alcool gel 5l", 4.0, 80.00, Input),
        ("Algodão 500g", 8.0, 15.98, Input),
        ("Atadura Crepe 13 Fios", 120.0, 0.54, Input),
        ("Avental manga curta desc.", 25.0, 5.00, Input),
        ("Desinfetante Duofor 1L", 6.0, 76.26, Input),
        ("Luva Procedimento", 100.0, 0.50, Input),
        ("Soro EGG", 44.0, 160.88, Medication),
        ("Seringa 10ml sem agulha", 467.0, 0.70, Input),
        ("Seringa 20ml com agulha", 69.0, 1.50, Input),
        ("Sonda Traqueal", 5.0, 8.10, Input),
        ("Tintura de iodo 500ml", 5.0, 20.00, Input),
    ]
    .into_iter()
    .map(|(name, current_quantity, unit_cost, category)| InventoryItem {
        name: name.to_string(),
        unit_cost,
        current_quantity,
        category,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genetics_doses_non_empty() {
        let doses = genetics_doses();
        assert_eq!(doses.len(), 5);
        assert!(doses.iter().all(|d| !d.breed.is_empty()));
    }

    #[test]
    fn test_demo_inventory_has_one_medication() {
        let items = demo_inventory();
        let meds: Vec<_> = items
            .iter()
            .filter(|i| i.category == InventoryCategory::Medication)
            .collect();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].name, "Soro EGG");
        assert!(items.iter().all(|i| i.unit_cost >= 0.0 && i.current_quantity >= 0.0));
    }
}
