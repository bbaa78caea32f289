//! Production standard domain types
//!
//! Reference rates mapping (service_type, subcategory, line item) to labor
//! hours per unit and material cost per unit. Seeded once, rarely mutated.

use rust_decimal::prelude::*;
use serde::Serialize;
use sqlx::FromRow;

/// Production standard entity. At least one of `labor_hours_per_unit` /
/// `material_cost_per_unit` is non-null: a row is a labor rate, a material
/// rate, or both.
#[derive(Debug, Clone, FromRow)]
pub struct ProductionStandard {
    pub id: i64,
    pub service_type: String,
    pub subcategory: String,
    pub item_description: String,
    pub unit_of_measure: String,
    pub labor_hours_per_unit: Option<f64>,
    pub material_cost_per_unit: Option<rust_decimal::Decimal>,
}

impl ProductionStandard {
    /// Material cost per unit in integer cents.
    pub fn material_cost_cents(&self) -> Option<i64> {
        self.material_cost_per_unit.map(|d| {
            (d * rust_decimal::Decimal::from(100))
                .round()
                .to_i64()
                .unwrap_or(0)
        })
    }
}

/// Response DTO for a production standard
#[derive(Debug, Clone, Serialize)]
pub struct ProductionStandardResponse {
    pub id: i64,
    pub service_type: String,
    pub subcategory: String,
    pub item_description: String,
    pub unit_of_measure: String,
    pub labor_hours_per_unit: Option<f64>,
    pub material_cost_cents: Option<i64>,
}

impl From<ProductionStandard> for ProductionStandardResponse {
    fn from(s: ProductionStandard) -> Self {
        let material_cost_cents = s.material_cost_cents();
        Self {
            id: s.id,
            service_type: s.service_type,
            subcategory: s.subcategory,
            item_description: s.item_description,
            unit_of_measure: s.unit_of_measure,
            labor_hours_per_unit: s.labor_hours_per_unit,
            material_cost_cents,
        }
    }
}
