//! Deterministic comparison between entered oil facts and the
//! recommended spec. This is the single source of truth for
//! `is_matching`; AI output never overrides it.

use crate::model::{MatchResult, Mismatch, OilSpec};

/// Litres of slack allowed on the fill quantity before it counts as a
/// mismatch.
pub const QUANTITY_TOLERANCE: f64 = 0.5;

/// Compare entered facts against the recommendation field by field.
///
/// Type and viscosity compare case-insensitively after trimming;
/// quantity compares within [`QUANTITY_TOLERANCE`] litres.
pub fn check_match(entered: &OilSpec, recommended: &OilSpec) -> MatchResult {
    let mut mismatches = Vec::new();

    if !eq_text(&entered.oil_type, &recommended.oil_type) {
        mismatches.push(Mismatch {
            field: "نوع الزيت".to_string(),
            expected: recommended.oil_type.trim().to_string(),
            actual: entered.oil_type.trim().to_string(),
        });
    }

    if !eq_text(&entered.oil_viscosity, &recommended.oil_viscosity) {
        mismatches.push(Mismatch {
            field: "اللزوجة".to_string(),
            expected: recommended.oil_viscosity.trim().to_string(),
            actual: entered.oil_viscosity.trim().to_string(),
        });
    }

    if (entered.oil_quantity - recommended.oil_quantity).abs() > QUANTITY_TOLERANCE {
        mismatches.push(Mismatch {
            field: "الكمية".to_string(),
            expected: format_litres(recommended.oil_quantity),
            actual: format_litres(entered.oil_quantity),
        });
    }

    MatchResult {
        is_matching: mismatches.is_empty(),
        mismatches,
    }
}

fn eq_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Render a quantity for display, e.g. "4.5 لتر". Whole litres drop
/// the fraction ("4 لتر").
pub fn format_litres(q: f64) -> String {
    if q.fract() == 0.0 {
        format!("{} لتر", q as i64)
    } else {
        format!("{} لتر", q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(t: &str, v: &str, q: f64) -> OilSpec {
        OilSpec {
            oil_type: t.to_string(),
            oil_viscosity: v.to_string(),
            oil_quantity: q,
        }
    }

    #[test]
    fn exact_match() {
        let r = check_match(
            &spec("Toyota Genuine", "0W-20", 4.5),
            &spec("Toyota Genuine", "0W-20", 4.5),
        );
        assert!(r.is_matching);
        assert!(r.mismatches.is_empty());
    }

    #[test]
    fn case_and_whitespace_insensitive() {
        let r = check_match(
            &spec("  toyota genuine ", "0w-20", 4.5),
            &spec("Toyota Genuine", "0W-20", 4.5),
        );
        assert!(r.is_matching);
    }

    #[test]
    fn quantity_within_tolerance() {
        let r = check_match(
            &spec("Toyota Genuine", "0W-20", 4.0),
            &spec("Toyota Genuine", "0W-20", 4.5),
        );
        assert!(r.is_matching, "0.5L delta is still a match");
    }

    #[test]
    fn quantity_beyond_tolerance() {
        let r = check_match(
            &spec("Toyota Genuine", "0W-20", 3.9),
            &spec("Toyota Genuine", "0W-20", 4.5),
        );
        assert!(!r.is_matching);
        assert_eq!(r.mismatches.len(), 1);
        let m = &r.mismatches[0];
        assert_eq!(m.field, "الكمية");
        assert_eq!(m.expected, "4.5 لتر");
        assert_eq!(m.actual, "3.9 لتر");
    }

    #[test]
    fn multiple_mismatches() {
        let r = check_match(
            &spec("Castrol", "5W-30", 6.0),
            &spec("Toyota Genuine", "0W-20", 4.5),
        );
        assert!(!r.is_matching);
        assert_eq!(r.mismatches.len(), 3);
        assert_eq!(r.mismatches[0].field, "نوع الزيت");
        assert_eq!(r.mismatches[1].field, "اللزوجة");
        assert_eq!(r.mismatches[2].field, "الكمية");
    }

    #[test]
    fn whole_litres_format() {
        assert_eq!(format_litres(4.0), "4 لتر");
        assert_eq!(format_litres(4.5), "4.5 لتر");
    }
}
