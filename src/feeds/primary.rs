use serde_json::{Map, Value};

use crate::coercion::{coerce_non_negative, coerce_string, first_defined, title_case};
use crate::constants::{Hour, Inch, MilliMag, JD};
use crate::exo_errors::ExoError;

use super::{FeedError, PrimaryFeed};

/// Magnitude fallback chain: visual, then red, then Gaia G.
const MAGNITUDE_FIELDS: [&str; 3] = ["v_mag", "r_mag", "gaia_g_mag"];
const EPOCH_FIELDS: [&str; 2] = ["t0_bjd_tdb", "ephem_mid_time"];
const PERIOD_FIELDS: [&str; 2] = ["period_days", "ephem_period"];
const EPOCH_UNCERTAINTY_FIELDS: [&str; 2] = ["t0_unc", "ephem_mid_time_e1"];
const PERIOD_UNCERTAINTY_FIELDS: [&str; 2] = ["period_unc", "ephem_period_e1"];

/// One object of the primary feed, with every numeric field already coerced.
///
/// Coordinates are kept as the sexagesimal strings found in the document: resolving them
/// (with the (0, 0) substitution on failure) is the reconciler's job.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryRecord {
    /// Catalog key the record was found under.
    pub key: String,
    /// Display name (falls back to the catalog key).
    pub name: String,
    pub host: String,
    pub ra: Option<String>,
    pub dec: Option<String>,
    /// First defined magnitude of the fallback chain, 0.0 when none is.
    pub magnitude: f64,
    pub epoch: Option<JD>,
    pub period: Option<f64>,
    pub epoch_uncertainty: Option<f64>,
    pub period_uncertainty: Option<f64>,
    pub duration_hours: Hour,
    pub depth_mmag: MilliMag,
    pub min_aperture_in: Option<Inch>,
    /// Title Case label, `"Normal"` when absent.
    pub priority: String,
}

/// Non-negative quantity: negative or absent values collapse to `None`.
fn non_negative(record: &Map<String, Value>, field: &str) -> Option<f64> {
    first_defined(record, &[field]).filter(|v| *v >= 0.0)
}

/// Build a [`PrimaryRecord`] from one entry of the feed.
///
/// Arguments
/// -----------------
/// * `key`: the catalog key of the entry.
/// * `value`: the JSON value stored under that key.
///
/// Return
/// ----------
/// * The coerced record.
///
/// Errors
/// ----------
/// * [`ExoError::MissingField`] if the entry is not an object or has no host star name.
pub fn primary_record(key: &str, value: &Value) -> Result<PrimaryRecord, ExoError> {
    let record = value
        .as_object()
        .ok_or_else(|| ExoError::MissingField(format!("{key}: record is not an object")))?;

    let name = record
        .get("name")
        .and_then(coerce_string)
        .or_else(|| {
            let key = key.trim();
            (!key.is_empty()).then(|| key.to_string())
        })
        .ok_or_else(|| ExoError::MissingField(format!("{key}: name")))?;

    let host = record
        .get("star")
        .and_then(coerce_string)
        .ok_or_else(|| ExoError::MissingField(format!("{name}: star")))?;

    let priority = record
        .get("priority")
        .and_then(Value::as_str)
        .map(title_case)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "Normal".to_string());

    Ok(PrimaryRecord {
        key: key.to_string(),
        name,
        host,
        ra: record.get("ra_j2000").and_then(coerce_string),
        dec: record.get("dec_j2000").and_then(coerce_string),
        magnitude: first_defined(record, &MAGNITUDE_FIELDS).unwrap_or(0.0),
        epoch: first_defined(record, &EPOCH_FIELDS),
        period: first_defined(record, &PERIOD_FIELDS),
        epoch_uncertainty: coerce_non_negative(first_defined(record, &EPOCH_UNCERTAINTY_FIELDS)),
        period_uncertainty: coerce_non_negative(first_defined(
            record,
            &PERIOD_UNCERTAINTY_FIELDS,
        )),
        duration_hours: non_negative(record, "duration_hours").unwrap_or(0.0),
        depth_mmag: non_negative(record, "depth_r_mmag").unwrap_or(0.0),
        min_aperture_in: non_negative(record, "min_telescope_inches"),
        priority,
    })
}

/// Parse a primary feed document.
///
/// Return
/// ----------
/// * One entry per catalog key, in key order.
///
/// Errors
/// ----------
/// * [`FeedError::Json`] if the body is not JSON.
/// * [`FeedError::Shape`] if the document is not a JSON object.
pub fn parse_primary(body: &str) -> Result<PrimaryFeed, FeedError> {
    let document: Value = serde_json::from_str(body)?;
    let Value::Object(entries) = document else {
        return Err(FeedError::Shape(
            "primary feed must be an object keyed by catalog key".into(),
        ));
    };
    Ok(entries
        .iter()
        .map(|(key, value)| primary_record(key, value))
        .collect())
}

#[cfg(test)]
mod primary_test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_record() {
        let value = json!({
            "name": "WASP-12b",
            "star": "WASP-12",
            "ra_j2000": "06:30:32.7947",
            "dec_j2000": "+29:40:20.266",
            "v_mag": "11.57",
            "r_mag": 11.2,
            "ephem_mid_time": 2457010.512173,
            "ephem_period": "1.09141890",
            "ephem_mid_time_e1": -0.00007,
            "ephem_period_e1": 0.00000024,
            "duration_hours": 3.0,
            "depth_r_mmag": 14.1,
            "min_telescope_inches": 6.0,
            "priority": "high"
        });
        let rec = primary_record("WASP-12b", &value).unwrap();
        assert_eq!(rec.magnitude, 11.57);
        assert_eq!(rec.epoch, Some(2457010.512173));
        assert_eq!(rec.period, Some(1.0914189));
        assert_eq!(rec.epoch_uncertainty, Some(0.00007));
        assert_eq!(rec.priority, "High");
        assert_eq!(rec.min_aperture_in, Some(6.0));
        assert_eq!(rec.ra.as_deref(), Some("06:30:32.7947"));
    }

    #[test]
    fn test_fallbacks() {
        let value = json!({
            "star": "HD 1",
            "v_mag": null,
            "r_mag": "",
            "t0_bjd_tdb": 2459000.0,
            "ephem_mid_time": 1.0,
            "period_days": 3.0
        });
        let rec = primary_record("HD1b", &value).unwrap();
        assert_eq!(rec.name, "HD1b");
        assert_eq!(rec.magnitude, 0.0);
        assert_eq!(rec.epoch, Some(2459000.0));
        assert_eq!(rec.priority, "Normal");
        assert_eq!(rec.duration_hours, 0.0);
        assert_eq!(rec.depth_mmag, 0.0);
        assert_eq!(rec.ra, None);
    }

    #[test]
    fn test_missing_host_is_a_record_error() {
        assert_eq!(
            primary_record("x", &json!({"name": "Xb"})),
            Err(ExoError::MissingField("Xb: star".into()))
        );
        assert!(primary_record("x", &json!([1, 2])).is_err());
    }

    #[test]
    fn test_parse_document() {
        let body = r#"{"a": {"name": "Ab", "star": "A"}, "b": "oops"}"#;
        let feed = parse_primary(body).unwrap();
        assert_eq!(feed.len(), 2);
        assert!(feed[0].is_ok());
        assert!(feed[1].is_err());

        assert!(matches!(parse_primary("[]"), Err(FeedError::Shape(_))));
        assert!(matches!(parse_primary("<html>"), Err(FeedError::Json(_))));
    }
}
