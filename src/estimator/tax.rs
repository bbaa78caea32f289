//! Sales tax calculation
//!
//! Per-state regime classification: no-tax states owe nothing, broad-regime
//! states tax the full subtotal, selective-regime states tax labor+material
//! only for service types registered as commonly taxable. Urgency fees are
//! never taxed. All amounts are integer cents; tax rounds half-up.

use crate::domain::scope::{SalesTaxBreakdown, TaxRegime};

/// States with no statewide sales tax.
const NO_TAX_STATES: &[&str] = &["AK", "DE", "MT", "NH", "OR"];

/// States taxing services broadly (gross-receipts style regimes).
const BROAD_STATES: &[&str] = &["HI", "NM", "SD", "WV"];

/// Statewide base rates, as fractions.
const STATE_BASE_RATES: &[(&str, f64)] = &[
    ("AL", 0.04),
    ("AZ", 0.056),
    ("AR", 0.065),
    ("CA", 0.0725),
    ("CO", 0.029),
    ("CT", 0.0635),
    ("FL", 0.06),
    ("GA", 0.04),
    ("HI", 0.04),
    ("ID", 0.06),
    ("IL", 0.0625),
    ("IN", 0.07),
    ("IA", 0.06),
    ("KS", 0.065),
    ("KY", 0.06),
    ("LA", 0.0445),
    ("ME", 0.055),
    ("MD", 0.06),
    ("MA", 0.0625),
    ("MI", 0.06),
    ("MN", 0.06875),
    ("MS", 0.07),
    ("MO", 0.04225),
    ("NE", 0.055),
    ("NV", 0.0685),
    ("NJ", 0.06625),
    ("NM", 0.05125),
    ("NY", 0.04),
    ("NC", 0.0475),
    ("ND", 0.05),
    ("OH", 0.0575),
    ("OK", 0.045),
    ("PA", 0.06),
    ("RI", 0.07),
    ("SC", 0.06),
    ("SD", 0.042),
    ("TN", 0.07),
    ("TX", 0.0625),
    ("UT", 0.0485),
    ("VT", 0.06),
    ("VA", 0.053),
    ("WA", 0.065),
    ("WV", 0.06),
    ("WI", 0.05),
    ("WY", 0.04),
    ("DC", 0.06),
];

/// Used when a selective-regime state is missing from the base rate table.
const DEFAULT_BASE_RATE: f64 = 0.06;

/// Per-service-type taxability in selective-regime states:
/// (service_type, commonly taxable, override rate).
///
/// Deliberately sparse: service types not registered here default to not
/// taxable, matching observed collection behavior.
const SERVICE_TAX_RULES: &[(&str, bool, Option<f64>)] = &[
    ("Cleaning", true, None),
    ("Landscaping", true, None),
    ("Pest Control", true, None),
    ("Appliance Repair", true, None),
    ("Pool Service", true, Some(0.045)),
    ("Plumbing", false, None),
    ("Electrical", false, None),
    ("HVAC", false, None),
    ("Roofing", false, None),
    ("Painting", false, None),
    ("Carpentry", false, None),
];

/// Input for a tax calculation. Amounts are integer cents; `subtotal_cents`
/// excludes urgency and other add-on fees.
#[derive(Debug, Clone)]
pub struct SalesTaxInput<'a> {
    pub state: Option<&'a str>,
    pub service_type: &'a str,
    pub subtotal_cents: i64,
    pub labor_cost_cents: i64,
    pub material_cost_cents: i64,
}

fn base_rate(state: &str) -> f64 {
    STATE_BASE_RATES
        .iter()
        .find(|(s, _)| *s == state)
        .map(|(_, r)| *r)
        .unwrap_or(DEFAULT_BASE_RATE)
}

/// Round half-up on a cents amount scaled by a fractional rate.
fn round_tax(amount_cents: i64, rate: f64) -> i64 {
    (amount_cents as f64 * rate).round() as i64
}

fn not_taxable(regime: TaxRegime, notes: impl Into<String>) -> SalesTaxBreakdown {
    SalesTaxBreakdown {
        is_taxable: false,
        tax_rate: 0.0,
        tax_amount_cents: 0,
        taxable_amount_cents: 0,
        regime,
        notes: notes.into(),
    }
}

/// Compute the sales tax owed on a scope's cost breakdown.
pub fn calculate_sales_tax(input: &SalesTaxInput) -> SalesTaxBreakdown {
    let state = match input.state {
        Some(s) if !s.is_empty() => s,
        _ => {
            return not_taxable(
                TaxRegime::Unknown,
                "No state available; tax not estimated",
            )
        }
    };

    if NO_TAX_STATES.contains(&state) {
        return not_taxable(
            TaxRegime::NoTax,
            format!("{} has no statewide sales tax", state),
        );
    }

    if BROAD_STATES.contains(&state) {
        let rate = base_rate(state);
        let taxable = input.subtotal_cents;
        return SalesTaxBreakdown {
            is_taxable: true,
            tax_rate: rate,
            tax_amount_cents: round_tax(taxable, rate),
            taxable_amount_cents: taxable,
            regime: TaxRegime::Broad,
            notes: format!("{} taxes services broadly; full subtotal is taxable", state),
        };
    }

    // Selective regime: consult the per-service taxability table
    match SERVICE_TAX_RULES
        .iter()
        .find(|(svc, _, _)| svc.eq_ignore_ascii_case(input.service_type))
    {
        Some((_, true, override_rate)) => {
            let rate = override_rate.unwrap_or_else(|| base_rate(state));
            let taxable = input.labor_cost_cents + input.material_cost_cents;
            SalesTaxBreakdown {
                is_taxable: true,
                tax_rate: rate,
                tax_amount_cents: round_tax(taxable, rate),
                taxable_amount_cents: taxable,
                regime: TaxRegime::Selective,
                notes: format!(
                    "{} is commonly taxable in {}; labor and materials taxed, fees excluded",
                    input.service_type, state
                ),
            }
        }
        Some((_, false, _)) => not_taxable(
            TaxRegime::Selective,
            format!("{} is not commonly taxable in {}", input.service_type, state),
        ),
        None => not_taxable(
            TaxRegime::Selective,
            format!(
                "{} is not registered for taxation in {}",
                input.service_type, state
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(state: Option<&'a str>, service_type: &'a str) -> SalesTaxInput<'a> {
        SalesTaxInput {
            state,
            service_type,
            subtotal_cents: 100_000,
            labor_cost_cents: 70_000,
            material_cost_cents: 30_000,
        }
    }

    #[test]
    fn oregon_never_taxes() {
        for svc in ["Cleaning", "Plumbing", "Anything"] {
            let result = calculate_sales_tax(&input(Some("OR"), svc));
            assert!(!result.is_taxable);
            assert_eq!(result.tax_amount_cents, 0);
            assert_eq!(result.regime, TaxRegime::NoTax);
        }
    }

    #[test]
    fn no_state_means_unknown_regime() {
        let result = calculate_sales_tax(&input(None, "Cleaning"));
        assert!(!result.is_taxable);
        assert_eq!(result.regime, TaxRegime::Unknown);
    }

    #[test]
    fn broad_regime_taxes_full_subtotal() {
        let result = calculate_sales_tax(&input(Some("NM"), "Plumbing"));
        assert!(result.is_taxable);
        assert_eq!(result.regime, TaxRegime::Broad);
        assert_eq!(result.taxable_amount_cents, 100_000);
        assert_eq!(result.tax_amount_cents, 5_125);
    }

    #[test]
    fn selective_regime_taxes_registered_service() {
        let result = calculate_sales_tax(&input(Some("TX"), "Cleaning"));
        assert!(result.is_taxable);
        assert_eq!(result.regime, TaxRegime::Selective);
        // Labor + material, not the subtotal with fees
        assert_eq!(result.taxable_amount_cents, 100_000);
        assert_eq!(result.tax_amount_cents, 6_250);
    }

    #[test]
    fn selective_regime_skips_non_taxable_service() {
        let result = calculate_sales_tax(&input(Some("TX"), "Plumbing"));
        assert!(!result.is_taxable);
        assert_eq!(result.tax_amount_cents, 0);
    }

    #[test]
    fn unregistered_service_defaults_to_not_taxable() {
        let result = calculate_sales_tax(&input(Some("TX"), "Chimney Sweeping"));
        assert!(!result.is_taxable);
        assert_eq!(result.regime, TaxRegime::Selective);
    }

    #[test]
    fn override_rate_beats_state_base_rate() {
        let result = calculate_sales_tax(&input(Some("TX"), "Pool Service"));
        assert!(result.is_taxable);
        assert!((result.tax_rate - 0.045).abs() < f64::EPSILON);
        assert_eq!(result.tax_amount_cents, 4_500);
    }

    #[test]
    fn tax_rounds_half_up() {
        let result = calculate_sales_tax(&SalesTaxInput {
            state: Some("GA"),
            service_type: "Cleaning",
            subtotal_cents: 1_013,
            labor_cost_cents: 1_013,
            material_cost_cents: 0,
        });
        // 1013 * 0.04 = 40.52 -> 41
        assert_eq!(result.tax_amount_cents, 41);
    }
}
