//! Structured scope domain types
//!
//! The scope document is the pipeline's final output: line items, materials,
//! labor, permits, cost composition, tax, regional adjustment, and
//! diagnostics naming the data sources that contributed. It is ephemeral and
//! may be regenerated; only job completion persists a snapshot of it.

use serde::{Deserialize, Serialize};

/// A jurisdiction's classification of how broadly it taxes services.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegime {
    Broad,
    Selective,
    NoTax,
    Unknown,
}

impl std::fmt::Display for TaxRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Broad => write!(f, "broad"),
            Self::Selective => write!(f, "selective"),
            Self::NoTax => write!(f, "no_tax"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Sales tax breakdown for a scope. All amounts are integer cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesTaxBreakdown {
    pub is_taxable: bool,
    pub tax_rate: f64,
    pub tax_amount_cents: i64,
    pub taxable_amount_cents: i64,
    pub regime: TaxRegime,
    pub notes: String,
}

/// Regional labor-cost adjustment. Applies to labor only; material costs
/// are nationally priced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionalAdjustment {
    pub multiplier: f64,
    pub label: String,
    pub adjustment_percent: i32,
    pub applies_to: String,
}

impl RegionalAdjustment {
    pub fn new(multiplier: f64, label: impl Into<String>) -> Self {
        Self {
            multiplier,
            label: label.into(),
            adjustment_percent: ((multiplier - 1.0) * 100.0).round() as i32,
            applies_to: "labor only".to_string(),
        }
    }
}

impl Default for RegionalAdjustment {
    fn default() -> Self {
        Self::new(1.0, "Standard rate")
    }
}

/// Coarse property category inferred from the address. Low-confidence
/// heuristic, used only as a diagnostics signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCategory {
    Apartment,
    Commercial,
    #[default]
    Standard,
}

impl std::fmt::Display for PropertyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apartment => write!(f, "apartment"),
            Self::Commercial => write!(f, "commercial"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

/// One scoped unit of work derived from a production standard row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeLineItem {
    pub description: String,
    pub unit_of_measure: String,
    pub quantity: f64,
    pub labor_hours: f64,
    pub labor_cost_cents: i64,
    pub material_cost_cents: i64,
    pub total_cents: i64,
}

/// Material needed for the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub description: String,
    pub unit: String,
    pub quantity: f64,
    pub unit_cost_cents: i64,
    pub total_cents: i64,
}

/// Labor entry with the regionally adjusted rate applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaborEntry {
    pub task: String,
    pub hours: f64,
    pub rate_cents_per_hour: i64,
    pub total_cents: i64,
}

/// Narrative sections of the scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeNarrative {
    pub existing_conditions: String,
    pub project_description: String,
    pub scope_of_work: Vec<String>,
}

/// Cost composition. All amounts are integer cents; labor is shown both
/// before and after the regional adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSummary {
    pub labor_cents: i64,
    pub labor_cents_adjusted: i64,
    pub material_cents: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub urgency_fee_cents: i64,
    pub total_cents: i64,
}

/// Diagnostics describing how the scope was derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeDiagnostics {
    pub detected_service_type: String,
    pub detected_subcategory: String,
    pub detected_issues: Vec<String>,
    pub confidence: f64,
    /// Which corpora contributed to the cost basis:
    /// "production_standards" and/or "historical_jobs".
    pub data_sources_used: Vec<String>,
    pub property_category: PropertyCategory,
    pub precedent_count: usize,
    /// Observed actual-hours range across the matched precedents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedent_hours_range: Option<(f64, f64)>,
    /// Observed actual-cost range (cents) across the matched precedents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedent_cost_range_cents: Option<(i64, i64)>,
}

/// The generated scope document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredScope {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<ScopeNarrative>,
    pub line_items: Vec<ScopeLineItem>,
    pub materials: Vec<MaterialEntry>,
    pub labor: Vec<LaborEntry>,
    pub permits: Vec<String>,
    pub disposal: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub required_after_photos: Vec<String>,
    /// User-visible "please clarify" items. Missing standards or required
    /// answers land here instead of failing the request.
    pub clarifications: Vec<String>,
    pub estimated_man_hours: f64,
    pub cost: CostSummary,
    pub tax: SalesTaxBreakdown,
    pub regional: RegionalAdjustment,
    pub diagnostics: ScopeDiagnostics,
}

/// Response wrapper for scope generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeResponse {
    pub session_id: uuid::Uuid,
    pub scope: StructuredScope,
    pub cached: bool,
}
