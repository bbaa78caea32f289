//! Estimation orchestration
//!
//! Composes classification, answers, production standards, precedents,
//! regional adjustment, sales tax, and the urgency surcharge into the final
//! structured scope. Deterministic: identical inputs produce identical cost
//! figures.

use std::collections::HashMap;

use crate::domain::jobs::CompletedJob;
use crate::domain::questions::DynamicQuestion;
use crate::domain::scope::{
    CostSummary, LaborEntry, MaterialEntry, ScopeDiagnostics, ScopeLineItem, ScopeNarrative,
    StructuredScope,
};
use crate::domain::sessions::EstimateSession;
use crate::domain::standards::ProductionStandard;
use crate::estimator::precedent;
use crate::estimator::questions::missing_required;
use crate::estimator::regional::{parse_location, property_category, regional_multiplier};
use crate::estimator::tax::{calculate_sales_tax, SalesTaxInput};

/// Hourly labor rates in cents per service type, nationally priced before
/// the regional adjustment.
const SERVICE_LABOR_RATES: &[(&str, i64)] = &[
    ("Plumbing", 9_500),
    ("Electrical", 9_800),
    ("HVAC", 10_500),
    ("Roofing", 7_500),
    ("Carpentry", 7_800),
    ("Painting", 6_500),
    ("Landscaping", 5_500),
    ("Cleaning", 4_500),
    ("Appliance Repair", 8_500),
    ("Pest Control", 6_000),
    ("Handyman", 6_500),
];

const DEFAULT_LABOR_RATE_CENTS: i64 = 7_500;

/// Precedent averages pull up to half the weight against the standards base
/// once five or more comparable jobs exist.
const PRECEDENT_WEIGHT_PER_JOB: f64 = 0.1;
const PRECEDENT_WEIGHT_CAP: f64 = 0.5;

pub fn labor_rate_cents_per_hour(service_type: &str) -> i64 {
    SERVICE_LABOR_RATES
        .iter()
        .find(|(svc, _)| svc.eq_ignore_ascii_case(service_type))
        .map(|(_, rate)| *rate)
        .unwrap_or(DEFAULT_LABOR_RATE_CENTS)
}

/// Everything the orchestrator needs, fetched by the caller.
#[derive(Debug)]
pub struct EstimateInput<'a> {
    pub session: &'a EstimateSession,
    pub questions: &'a [DynamicQuestion],
    pub answers: &'a HashMap<i64, String>,
    pub standards: &'a [ProductionStandard],
    pub precedents: &'a [CompletedJob],
    /// Flat additive surcharge applied when the request is urgent, e.g. 25.0.
    pub urgency_fee_percent: f64,
}

fn round_cents(value: f64) -> i64 {
    value.round() as i64
}

fn format_dollars(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, (cents % 100).abs())
}

/// Generate the structured scope for a session.
///
/// Failure modes surface as `clarifications` entries, never as silently
/// zeroed costs: a scope with no matching production standards says so.
pub fn generate_scope(input: &EstimateInput) -> StructuredScope {
    let session = input.session;

    let location = session
        .address
        .as_deref()
        .map(parse_location)
        .unwrap_or_default();
    let regional = regional_multiplier(&location);
    let property = session
        .address
        .as_deref()
        .map(property_category)
        .unwrap_or_default();

    let rate = labor_rate_cents_per_hour(&session.service_type);

    // Base figures from production standards, quantity 1 per line item.
    let base_hours: f64 = input
        .standards
        .iter()
        .filter_map(|s| s.labor_hours_per_unit)
        .sum();

    // Blend in precedent actuals when comparable jobs exist.
    let stats = precedent::summarize(input.precedents);
    let blended_hours = match stats.as_ref().and_then(|s| s.avg_actual_hours) {
        Some(avg) if base_hours > 0.0 => {
            let weight = (input.precedents.len() as f64 * PRECEDENT_WEIGHT_PER_JOB)
                .min(PRECEDENT_WEIGHT_CAP);
            (base_hours + avg * weight) / (1.0 + weight)
        }
        Some(avg) => avg,
        None => base_hours,
    };
    let hour_scale = if base_hours > 0.0 {
        blended_hours / base_hours
    } else {
        1.0
    };

    let mut line_items = Vec::new();
    let mut materials = Vec::new();
    let mut labor = Vec::new();
    let mut labor_cents = 0i64;
    let mut material_cents = 0i64;

    for standard in input.standards {
        let hours = standard.labor_hours_per_unit.unwrap_or(0.0) * hour_scale;
        let line_labor = round_cents(hours * rate as f64);
        let line_material = standard.material_cost_cents().unwrap_or(0);
        labor_cents += line_labor;
        material_cents += line_material;

        line_items.push(ScopeLineItem {
            description: standard.item_description.clone(),
            unit_of_measure: standard.unit_of_measure.clone(),
            quantity: 1.0,
            labor_hours: hours,
            labor_cost_cents: line_labor,
            material_cost_cents: line_material,
            total_cents: line_labor + line_material,
        });

        if line_material > 0 {
            materials.push(MaterialEntry {
                description: standard.item_description.clone(),
                unit: standard.unit_of_measure.clone(),
                quantity: 1.0,
                unit_cost_cents: line_material,
                total_cents: line_material,
            });
        }
        if hours > 0.0 {
            labor.push(LaborEntry {
                task: standard.item_description.clone(),
                hours,
                rate_cents_per_hour: round_cents(rate as f64 * regional.multiplier),
                total_cents: round_cents(hours * rate as f64 * regional.multiplier),
            });
        }
    }

    // Precedent-only cost basis when no labor standard exists but
    // comparable jobs carry hours.
    if base_hours == 0.0 {
        if let Some(avg) = stats.as_ref().and_then(|s| s.avg_actual_hours) {
            let line_labor = round_cents(avg * rate as f64);
            labor_cents += line_labor;
            labor.push(LaborEntry {
                task: format!("{} labor (from comparable completed jobs)", session.subcategory),
                hours: avg,
                rate_cents_per_hour: round_cents(rate as f64 * regional.multiplier),
                total_cents: round_cents(avg * rate as f64 * regional.multiplier),
            });
        }
    }

    // Regional adjustment applies to labor only.
    let labor_adjusted = round_cents(labor_cents as f64 * regional.multiplier);
    let subtotal = labor_adjusted + material_cents;

    let tax = calculate_sales_tax(&SalesTaxInput {
        state: location.state.as_deref(),
        service_type: &session.service_type,
        subtotal_cents: subtotal,
        labor_cost_cents: labor_adjusted,
        material_cost_cents: material_cents,
    });

    let urgency_fee = if session.urgent {
        round_cents(subtotal as f64 * input.urgency_fee_percent / 100.0)
    } else {
        0
    };

    let total = subtotal + tax.tax_amount_cents + urgency_fee;
    let estimated_man_hours = blended_hours;

    // Clarifications: the user-visible "please clarify" channel.
    let mut clarifications = Vec::new();
    if input.standards.is_empty() {
        clarifications.push(format!(
            "No production standards cover {} / {} yet; this estimate needs manual review \
             before it can be priced.",
            session.service_type, session.subcategory
        ));
    }
    for question in missing_required(input.questions, input.answers) {
        clarifications.push(format!("Missing detail: {}", question.question_text));
    }
    if let Some(clarifier) = &session.classifier_clarifier {
        clarifications.push(clarifier.clone());
    }

    let mut data_sources = Vec::new();
    if !input.standards.is_empty() {
        data_sources.push("production_standards".to_string());
    }
    if !input.precedents.is_empty() {
        data_sources.push("historical_jobs".to_string());
    }

    let mut scope_of_work: Vec<String> = line_items
        .iter()
        .map(|li| format!("{} ({} {})", li.description, li.quantity, li.unit_of_measure))
        .collect();
    if scope_of_work.is_empty() {
        scope_of_work.push("Assess on site and confirm scope with the customer".to_string());
    }

    let narrative = ScopeNarrative {
        existing_conditions: session.description.clone(),
        project_description: format!(
            "{} - {} ({})",
            session.service_type, session.subcategory, session.service_intent
        ),
        scope_of_work,
    };

    let permits = derive_permits(session);
    let disposal = derive_disposal(session);

    let acceptance_criteria: Vec<String> = line_items
        .iter()
        .map(|li| format!("{} completed and verified with the customer", li.description))
        .chain(std::iter::once(
            "Work area left clean and free of debris".to_string(),
        ))
        .collect();

    let required_after_photos: Vec<String> = line_items
        .iter()
        .map(|li| format!("After photo: {}", li.description))
        .collect();

    let summary = if line_items.is_empty() {
        format!(
            "{} / {}: needs clarification before pricing",
            session.service_type, session.subcategory
        )
    } else {
        format!(
            "{} / {}: {} line item(s), est. {:.1} hours, {} total",
            session.service_type,
            session.subcategory,
            line_items.len(),
            estimated_man_hours,
            format_dollars(total)
        )
    };

    StructuredScope {
        summary,
        narrative: Some(narrative),
        line_items,
        materials,
        labor,
        permits,
        disposal,
        acceptance_criteria,
        required_after_photos,
        clarifications,
        estimated_man_hours,
        cost: CostSummary {
            labor_cents,
            labor_cents_adjusted: labor_adjusted,
            material_cents,
            subtotal_cents: subtotal,
            tax_cents: tax.tax_amount_cents,
            urgency_fee_cents: urgency_fee,
            total_cents: total,
        },
        tax,
        regional,
        diagnostics: ScopeDiagnostics {
            detected_service_type: session.service_type.clone(),
            detected_subcategory: session.subcategory.clone(),
            detected_issues: session
                .classifier_reasoning
                .clone()
                .map(|r| vec![r])
                .unwrap_or_default(),
            confidence: session.confidence,
            data_sources_used: data_sources,
            property_category: property,
            precedent_count: input.precedents.len(),
            precedent_hours_range: stats.as_ref().and_then(|s| s.hours_range),
            precedent_cost_range_cents: stats.as_ref().and_then(|s| s.cost_range_cents),
        },
    }
}

fn derive_permits(session: &EstimateSession) -> Vec<String> {
    let permit_trades = ["Electrical", "Plumbing", "HVAC", "Roofing"];
    if session.service_intent == "installation"
        && permit_trades
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&session.service_type))
    {
        vec![format!(
            "A {} permit may be required for this installation; confirm with the local \
             jurisdiction",
            session.service_type.to_lowercase()
        )]
    } else {
        Vec::new()
    }
}

fn derive_disposal(session: &EstimateSession) -> Vec<String> {
    let text = format!("{} {}", session.service_type, session.description).to_lowercase();
    if ["roof", "demolition", "tear out", "removal", "landscap"]
        .iter()
        .any(|k| text.contains(k))
    {
        vec!["Haul away and dispose of removed material".to_string()]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn session(service_type: &str, subcategory: &str, address: Option<&str>) -> EstimateSession {
        EstimateSession {
            id: Uuid::new_v4(),
            description: "Leaking pipe under the kitchen sink".to_string(),
            address: address.map(str::to_string),
            photos: sqlx::types::Json(vec![]),
            urgent: false,
            service_intent: "service".to_string(),
            service_type: service_type.to_string(),
            subcategory: subcategory.to_string(),
            confidence: 0.92,
            classifier_reasoning: None,
            classifier_clarifier: None,
            classifier_degraded: None,
            phase: "ready_for_scope".to_string(),
            created_at: Utc::now(),
        }
    }

    fn standard(desc: &str, hours: Option<f64>, material_dollars: Option<i64>) -> ProductionStandard {
        ProductionStandard {
            id: 1,
            service_type: "Plumbing".to_string(),
            subcategory: "Leak Repair".to_string(),
            item_description: desc.to_string(),
            unit_of_measure: "each".to_string(),
            labor_hours_per_unit: hours,
            material_cost_per_unit: material_dollars.map(Decimal::from),
        }
    }

    fn input<'a>(
        session: &'a EstimateSession,
        standards: &'a [ProductionStandard],
        precedents: &'a [CompletedJob],
        answers: &'a HashMap<i64, String>,
    ) -> EstimateInput<'a> {
        EstimateInput {
            session,
            questions: &[],
            answers,
            standards,
            precedents,
            urgency_fee_percent: 25.0,
        }
    }

    #[test]
    fn standards_only_scope_uses_production_standards_source() {
        let s = session("Plumbing", "Leak Repair", Some("Dallas, TX"));
        let standards = vec![standard("Repair supply line leak", Some(2.0), Some(45))];
        let answers = HashMap::new();
        let scope = generate_scope(&input(&s, &standards, &[], &answers));

        assert_eq!(
            scope.diagnostics.data_sources_used,
            vec!["production_standards".to_string()]
        );
        // 2.0h * $95/h = $190 labor, TX multiplier 1.0, $45 material
        assert_eq!(scope.cost.labor_cents, 19_000);
        assert_eq!(scope.cost.labor_cents_adjusted, 19_000);
        assert_eq!(scope.cost.material_cents, 4_500);
        assert_eq!(scope.cost.subtotal_cents, 23_500);
        assert!(scope.clarifications.is_empty());
    }

    #[test]
    fn regional_multiplier_applies_to_labor_only() {
        let s = session("Plumbing", "Leak Repair", Some("San Francisco, CA"));
        let standards = vec![standard("Repair supply line leak", Some(2.0), Some(45))];
        let answers = HashMap::new();
        let scope = generate_scope(&input(&s, &standards, &[], &answers));

        assert_eq!(scope.regional.adjustment_percent, 25);
        assert_eq!(scope.cost.labor_cents, 19_000);
        assert_eq!(scope.cost.labor_cents_adjusted, 23_750);
        // Material unchanged by region
        assert_eq!(scope.cost.material_cents, 4_500);
    }

    #[test]
    fn urgency_fee_is_additive_and_untaxed() {
        let mut s = session("Plumbing", "Leak Repair", Some("Dallas, TX"));
        s.urgent = true;
        let standards = vec![standard("Repair supply line leak", Some(2.0), None)];
        let answers = HashMap::new();
        let scope = generate_scope(&input(&s, &standards, &[], &answers));

        // Plumbing is not commonly taxable in a selective state
        assert_eq!(scope.cost.tax_cents, 0);
        assert_eq!(scope.cost.urgency_fee_cents, 19_000 / 4);
        assert_eq!(
            scope.cost.total_cents,
            scope.cost.subtotal_cents + scope.cost.urgency_fee_cents
        );
    }

    #[test]
    fn no_matching_standard_yields_clarification_not_silence() {
        let s = session("Plumbing", "Leak Repair", None);
        let answers = HashMap::new();
        let scope = generate_scope(&input(&s, &[], &[], &answers));

        assert!(scope.line_items.is_empty());
        assert!(!scope.clarifications.is_empty());
        assert!(scope.clarifications[0].contains("No production standards"));
        assert!(scope.summary.contains("needs clarification"));
    }

    #[test]
    fn precedents_blend_hours_and_extend_data_sources() {
        let s = session("Plumbing", "Leak Repair", Some("Dallas, TX"));
        let standards = vec![standard("Repair supply line leak", Some(2.0), None)];
        let answers = HashMap::new();

        let precedent = CompletedJob {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            service_type: "Plumbing".to_string(),
            subcategory: "Leak Repair".to_string(),
            original_scope: serde_json::json!({}),
            structured_answers: HashMap::new(),
            estimated_man_hours: Some(2.0),
            estimated_cost_cents: Some(19_000),
            actual_man_hours: Some(4.0),
            actual_cost_cents: Some(38_000),
            customer_rating: Some(3),
            issues_encountered: None,
            accuracy_score: Some(0.5),
            tags: vec![],
            completed_at: Utc::now(),
        };

        let precedents = vec![precedent];
        let scope = generate_scope(&input(&s, &standards, &precedents, &answers));

        assert_eq!(
            scope.diagnostics.data_sources_used,
            vec![
                "production_standards".to_string(),
                "historical_jobs".to_string()
            ]
        );
        // One precedent: weight 0.1, blended = (2.0 + 4.0*0.1) / 1.1
        let expected = (2.0 + 0.4) / 1.1;
        assert!((scope.estimated_man_hours - expected).abs() < 1e-9);
        assert_eq!(scope.diagnostics.precedent_count, 1);
    }

    #[test]
    fn generation_is_idempotent() {
        let s = session("Plumbing", "Leak Repair", Some("Seattle, WA"));
        let standards = vec![
            standard("Repair supply line leak", Some(2.0), Some(45)),
            standard("Replace P-trap", Some(0.5), Some(18)),
        ];
        let answers: HashMap<i64, String> = [(1, "under sink".to_string())].into();

        let a = generate_scope(&input(&s, &standards, &[], &answers));
        let b = generate_scope(&input(&s, &standards, &[], &answers));
        assert_eq!(a.cost.total_cents, b.cost.total_cents);
        assert_eq!(a.cost.tax_cents, b.cost.tax_cents);
        assert_eq!(a.estimated_man_hours, b.estimated_man_hours);
    }

    #[test]
    fn missing_required_answers_surface_as_clarifications() {
        use crate::domain::questions::DynamicQuestion;
        let s = session("Plumbing", "Leak Repair", None);
        let questions = vec![DynamicQuestion {
            id: 1,
            service_type: "Plumbing".to_string(),
            subcategory: "Leak Repair".to_string(),
            question_text: "Where is the leak located?".to_string(),
            response_type: "text".to_string(),
            options: sqlx::types::Json(vec![]),
            sequence: 10,
            required_for_scope: true,
            conditional_tag: None,
        }];
        let standards = vec![standard("Repair supply line leak", Some(2.0), None)];
        let answers = HashMap::new();

        let scope = generate_scope(&EstimateInput {
            session: &s,
            questions: &questions,
            answers: &answers,
            standards: &standards,
            precedents: &[],
            urgency_fee_percent: 25.0,
        });

        assert!(scope
            .clarifications
            .iter()
            .any(|c| c.contains("Where is the leak located?")));
    }

    #[test]
    fn installation_intent_flags_permit_for_regulated_trades() {
        let mut s = session("Electrical", "Panel Upgrade", None);
        s.service_intent = "installation".to_string();
        let standards = vec![standard("Install 200A panel", Some(6.0), Some(800))];
        let answers = HashMap::new();
        let scope = generate_scope(&input(&s, &standards, &[], &answers));
        assert_eq!(scope.permits.len(), 1);
    }
}
