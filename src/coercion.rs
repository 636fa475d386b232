//! # Numeric coercion of external feed values
//!
//! Catalog feeds deliver numbers in every shape imaginable: plain JSON numbers, numbers
//! wrapped in strings, empty cells for masked values, textual sentinels such as `"nan"`
//! or `"--"`, and the occasional non-finite float. The helpers below turn any of these
//! into an explicit `Option<f64>` so that downstream code only ever consumes a
//! *defined-or-absent* real number.
//!
//! ## Rules
//!
//! - A value is **defined** only when it converts to a **finite** `f64`.
//! - Strings are trimmed before parsing; masked sentinels (`""`, `"nan"`, `"null"`,
//!   `"none"`, `"--"`, `"masked"`) are absent.
//! - Booleans, arrays, objects and `null` are absent.
//!
//! ## See also
//! * [`first_defined`] – ordered fallback chains over several field names.
//! * [`coerce_non_negative`] – sign normalization used for uncertainties.

use serde_json::{Map, Value};

/// Textual values that catalogs use to mark a masked or missing cell.
const MASKED_SENTINELS: [&str; 6] = ["", "nan", "null", "none", "--", "masked"];

/// Convert a tabular cell or JSON string into a finite real number.
///
/// Arguments
/// -----------------
/// * `raw`: the textual representation of the value.
///
/// Return
/// ----------
/// * `Some(x)` if `raw` parses into a finite `f64`, `None` otherwise.
pub fn coerce_text_f64(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if MASKED_SENTINELS
        .iter()
        .any(|sentinel| trimmed.eq_ignore_ascii_case(sentinel))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Convert an arbitrary JSON value into a finite real number.
///
/// Arguments
/// -----------------
/// * `value`: the JSON value as received from the feed.
///
/// Return
/// ----------
/// * `Some(x)` for finite numbers and numeric strings, `None` for everything else.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => coerce_text_f64(s),
        _ => None,
    }
}

/// Convert a JSON value into a non-empty, trimmed string.
///
/// Numbers are rendered with their JSON representation so that catalog keys such as
/// `55` are still usable as names.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolve the first defined numeric field of an ordered fallback chain.
///
/// Arguments
/// -----------------
/// * `record`: the JSON object of one catalog entry.
/// * `fields`: candidate field names, in decreasing order of preference.
///
/// Return
/// ----------
/// * The first field value that coerces to a finite real, or `None` if no field does.
pub fn first_defined(record: &Map<String, Value>, fields: &[&str]) -> Option<f64> {
    fields
        .iter()
        .filter_map(|field| record.get(*field))
        .find_map(coerce_f64)
}

/// Sign-normalize an optional quantity that is only meaningful as a magnitude.
///
/// Some catalogs publish lower uncertainties as negative numbers; the ephemeris only
/// needs their size.
pub fn coerce_non_negative(value: Option<f64>) -> Option<f64> {
    value.map(f64::abs)
}

/// Normalize a free-form priority label into Title Case (`"hIGH"` → `"High"`).
pub fn title_case(raw: &str) -> String {
    let mut chars = raw.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod coercion_test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_f64_numbers_and_strings() {
        assert_eq!(coerce_f64(&json!(3.5)), Some(3.5));
        assert_eq!(coerce_f64(&json!(12)), Some(12.0));
        assert_eq!(coerce_f64(&json!(" 2.25 ")), Some(2.25));
        assert_eq!(coerce_f64(&json!("1e-3")), Some(0.001));
    }

    #[test]
    fn test_coerce_f64_absent_values() {
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&json!([1.0])), None);
        assert_eq!(coerce_f64(&json!({"value": 1.0})), None);
        assert_eq!(coerce_f64(&json!("")), None);
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!("inf")), None);
        assert_eq!(coerce_f64(&json!("--")), None);
        assert_eq!(coerce_f64(&json!("twelve")), None);
    }

    #[test]
    fn test_coerce_text_cells() {
        assert_eq!(coerce_text_f64("  "), None);
        assert_eq!(coerce_text_f64("masked"), None);
        assert_eq!(coerce_text_f64("-0.5"), Some(-0.5));
    }

    #[test]
    fn test_first_defined_fallback_chain() {
        let record = json!({"v_mag": null, "r_mag": "", "gaia_g_mag": 11.2});
        let record = record.as_object().unwrap();
        assert_eq!(
            first_defined(record, &["v_mag", "r_mag", "gaia_g_mag"]),
            Some(11.2)
        );
        assert_eq!(first_defined(record, &["v_mag", "r_mag"]), None);
        assert_eq!(first_defined(record, &["missing"]), None);
    }

    #[test]
    fn test_non_negative_and_strings() {
        assert_eq!(coerce_non_negative(Some(-0.0004)), Some(0.0004));
        assert_eq!(coerce_non_negative(None), None);
        assert_eq!(coerce_string(&json!("  WASP-12 ")), Some("WASP-12".into()));
        assert_eq!(coerce_string(&json!("   ")), None);
        assert_eq!(coerce_string(&json!(55)), Some("55".into()));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("high"), "High");
        assert_eq!(title_case("ALERT"), "Alert");
        assert_eq!(title_case(" medium "), "Medium");
        assert_eq!(title_case(""), "");
    }
}
