//! Regional pricing adjustment
//!
//! Parses a free-text address into (city, state) and resolves a labor-cost
//! multiplier: curated metro match first, then state default, then a rural
//! fallback. An unparseable location resolves to the standard rate, never an
//! error. The multiplier applies to labor only; materials are nationally
//! priced.

use crate::domain::scope::{PropertyCategory, RegionalAdjustment};

/// Curated metro multipliers: (city, state, multiplier, label).
const CITY_MULTIPLIERS: &[(&str, &str, f64, &str)] = &[
    ("san francisco", "CA", 1.25, "San Francisco Bay Area"),
    ("san jose", "CA", 1.25, "San Francisco Bay Area"),
    ("oakland", "CA", 1.20, "San Francisco Bay Area"),
    ("los angeles", "CA", 1.15, "Greater Los Angeles"),
    ("san diego", "CA", 1.12, "San Diego metro"),
    ("sacramento", "CA", 1.08, "Sacramento metro"),
    ("new york", "NY", 1.30, "New York City metro"),
    ("brooklyn", "NY", 1.28, "New York City metro"),
    ("queens", "NY", 1.28, "New York City metro"),
    ("seattle", "WA", 1.18, "Seattle metro"),
    ("boston", "MA", 1.20, "Greater Boston"),
    ("washington", "DC", 1.18, "Washington DC metro"),
    ("chicago", "IL", 1.12, "Chicagoland"),
    ("denver", "CO", 1.10, "Denver metro"),
    ("austin", "TX", 1.08, "Austin metro"),
    ("miami", "FL", 1.10, "South Florida"),
    ("portland", "OR", 1.10, "Portland metro"),
    ("philadelphia", "PA", 1.08, "Philadelphia metro"),
    ("honolulu", "HI", 1.25, "Honolulu"),
    ("anchorage", "AK", 1.15, "Anchorage"),
    ("minneapolis", "MN", 1.05, "Twin Cities"),
    ("atlanta", "GA", 1.05, "Atlanta metro"),
    ("nashville", "TN", 1.05, "Nashville metro"),
    ("las vegas", "NV", 1.05, "Las Vegas metro"),
    ("phoenix", "AZ", 1.02, "Phoenix metro"),
];

/// State-level defaults: (state, multiplier). States not listed fall back to
/// the rural multiplier.
const STATE_MULTIPLIERS: &[(&str, f64)] = &[
    ("CA", 1.18),
    ("NY", 1.15),
    ("MA", 1.15),
    ("WA", 1.12),
    ("CT", 1.12),
    ("NJ", 1.12),
    ("MD", 1.08),
    ("DC", 1.22),
    ("HI", 1.20),
    ("AK", 1.10),
    ("OR", 1.08),
    ("CO", 1.08),
    ("IL", 1.05),
    ("VA", 1.02),
    ("MN", 1.02),
    ("FL", 1.02),
    ("NH", 1.02),
    ("RI", 1.05),
    ("NV", 1.02),
    ("TX", 1.00),
    ("AZ", 1.00),
    ("UT", 1.00),
    ("GA", 1.00),
    ("NC", 0.98),
    ("PA", 1.02),
    ("OH", 0.96),
    ("MI", 0.96),
    ("WI", 0.98),
    ("MO", 0.95),
    ("TN", 0.96),
    ("IN", 0.95),
    ("SC", 0.95),
    ("AL", 0.92),
    ("KY", 0.92),
    ("LA", 0.94),
    ("OK", 0.92),
    ("KS", 0.94),
    ("IA", 0.95),
];

/// Fallback for recognized states without a listed default.
const RURAL_MULTIPLIER: f64 = 0.90;
const RURAL_LABEL: &str = "Rural / low-density rate";

/// All recognized state codes, including DC.
const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC",
];

/// Full state names for addresses spelling the state out.
const STATE_NAMES: &[(&str, &str)] = &[
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
    ("district of columbia", "DC"),
];

/// City and state parsed out of a free-text address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLocation {
    pub city: Option<String>,
    pub state: Option<String>,
}

fn match_state_segment(segment: &str) -> Option<&'static str> {
    // Strip zip-looking tokens, then try the remainder as a full state name
    let words: Vec<&str> = segment
        .split_whitespace()
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit() || c == '-'))
        .collect();

    let joined = words.join(" ").to_lowercase();
    if let Some((_, code)) = STATE_NAMES.iter().find(|(name, _)| *name == joined) {
        return Some(code);
    }

    // Otherwise look for a bare two-letter code among the tokens
    for word in words {
        if word.len() == 2 {
            let upper = word.to_ascii_uppercase();
            if let Some(code) = STATE_CODES.iter().find(|c| **c == upper) {
                return Some(code);
            }
        }
    }

    None
}

/// Split the address on commas and scan segments right-to-left for a state;
/// the segment immediately preceding the state is taken as the city.
pub fn parse_location(address: &str) -> ParsedLocation {
    let segments: Vec<&str> = address.split(',').map(str::trim).collect();

    for idx in (0..segments.len()).rev() {
        if let Some(code) = match_state_segment(segments[idx]) {
            let city = if idx > 0 {
                let c = segments[idx - 1].trim();
                (!c.is_empty()).then(|| c.to_string())
            } else {
                None
            };
            return ParsedLocation {
                city,
                state: Some(code.to_string()),
            };
        }
    }

    ParsedLocation::default()
}

/// Resolve the labor-cost multiplier for a parsed location.
///
/// Resolution order: curated metro match, state default, rural fallback.
/// Never zero, negative, or an error.
pub fn regional_multiplier(location: &ParsedLocation) -> RegionalAdjustment {
    let state = match &location.state {
        Some(s) => s.as_str(),
        None => return RegionalAdjustment::new(1.0, "Standard rate"),
    };

    if let Some(city) = &location.city {
        let city_lower = city.to_lowercase();
        if let Some((_, _, mult, label)) = CITY_MULTIPLIERS
            .iter()
            .find(|(c, s, _, _)| *c == city_lower && *s == state)
        {
            return RegionalAdjustment::new(*mult, *label);
        }
    }

    if let Some((_, mult)) = STATE_MULTIPLIERS.iter().find(|(s, _)| *s == state) {
        let label = if (*mult - 1.0).abs() < f64::EPSILON {
            "Standard rate".to_string()
        } else {
            format!("{} state average", state)
        };
        return RegionalAdjustment::new(*mult, label);
    }

    RegionalAdjustment::new(RURAL_MULTIPLIER, RURAL_LABEL)
}

/// Infer a coarse property category from the address text. This is the only
/// job-size signal the pipeline has and it is explicitly low-confidence.
pub fn property_category(address: &str) -> PropertyCategory {
    let lower = address.to_lowercase();
    if ["apt", "unit", "#"].iter().any(|m| lower.contains(m)) {
        PropertyCategory::Apartment
    } else if ["suite", "ste ", "floor", "plaza", "office"]
        .iter()
        .any(|m| lower.contains(m))
    {
        PropertyCategory::Commercial
    } else {
        PropertyCategory::Standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_city_and_state_code() {
        let loc = parse_location("123 Main St, Dallas, TX 75201");
        assert_eq!(loc.city.as_deref(), Some("Dallas"));
        assert_eq!(loc.state.as_deref(), Some("TX"));
    }

    #[test]
    fn parses_full_state_name() {
        let loc = parse_location("456 Oak Ave, Portland, Oregon");
        assert_eq!(loc.city.as_deref(), Some("Portland"));
        assert_eq!(loc.state.as_deref(), Some("OR"));
    }

    #[test]
    fn no_state_parses_to_empty() {
        assert_eq!(parse_location("123 Main St"), ParsedLocation::default());
    }

    #[test]
    fn dallas_resolves_to_standard_rate() {
        let adj = regional_multiplier(&parse_location("Dallas, TX"));
        assert!((adj.multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(adj.label, "Standard rate");
        assert_eq!(adj.adjustment_percent, 0);
    }

    #[test]
    fn san_francisco_resolves_to_metro_rate() {
        let adj = regional_multiplier(&parse_location("San Francisco, CA"));
        assert!((adj.multiplier - 1.25).abs() < f64::EPSILON);
        assert_eq!(adj.adjustment_percent, 25);
    }

    #[test]
    fn unknown_location_resolves_without_error() {
        let adj = regional_multiplier(&parse_location("123 Main St"));
        assert!((adj.multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(adj.label, "Standard rate");
    }

    #[test]
    fn unlisted_state_gets_rural_fallback() {
        let adj = regional_multiplier(&parse_location("Cheyenne, WY"));
        assert!(adj.multiplier < 1.0);
        assert!(adj.multiplier > 0.0);
        assert_eq!(adj.label, RURAL_LABEL);
    }

    #[test]
    fn multiplier_is_always_positive() {
        for addr in ["", "nowhere", "Fargo, ND", "Boston, MA", "Honolulu, HI"] {
            let adj = regional_multiplier(&parse_location(addr));
            assert!(adj.multiplier > 0.0, "address {:?}", addr);
        }
    }

    #[test]
    fn apartment_heuristic_from_address() {
        assert_eq!(
            property_category("12 Elm St Apt 4B, Austin, TX"),
            PropertyCategory::Apartment
        );
        assert_eq!(
            property_category("500 Market St Suite 900"),
            PropertyCategory::Commercial
        );
        assert_eq!(
            property_category("9 Birch Lane"),
            PropertyCategory::Standard
        );
    }
}
