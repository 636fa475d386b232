use serde::Deserialize;

use crate::coercion::coerce_text_f64;
use crate::constants::{Degree, JD};
use crate::exo_errors::ExoError;

use super::{FeedError, SecondaryFeed, SECONDARY_COLUMNS};

/// Raw archive row; every cell is text so that masked cells survive deserialization.
#[derive(Debug, Deserialize)]
struct RawRow {
    pl_name: String,
    hostname: String,
    #[serde(default)]
    ra: String,
    #[serde(default)]
    dec: String,
    #[serde(default)]
    sy_vmag: String,
    #[serde(default)]
    pl_orbper: String,
    #[serde(default)]
    pl_tranmid: String,
    #[serde(default)]
    pl_trandur: String,
    #[serde(default)]
    pl_trandep: String,
}

/// One planet row of the secondary archive.
///
/// Every numeric cell is optional: masked, blank or non-finite cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryRow {
    pub name: String,
    pub host: String,
    pub ra: Option<Degree>,
    pub dec: Option<Degree>,
    pub magnitude: Option<f64>,
    pub period: Option<f64>,
    pub epoch: Option<JD>,
    pub duration_hours: Option<f64>,
    /// Transit depth in **percent** of the stellar flux.
    pub depth_percent: Option<f64>,
}

impl TryFrom<RawRow> for SecondaryRow {
    type Error = ExoError;

    fn try_from(raw: RawRow) -> Result<Self, Self::Error> {
        let name = raw.pl_name.trim();
        if name.is_empty() {
            return Err(ExoError::MissingField("pl_name".into()));
        }
        let host = raw.hostname.trim();
        if host.is_empty() {
            return Err(ExoError::MissingField(format!("{name}: hostname")));
        }
        Ok(SecondaryRow {
            name: name.to_string(),
            host: host.to_string(),
            ra: coerce_text_f64(&raw.ra),
            dec: coerce_text_f64(&raw.dec),
            magnitude: coerce_text_f64(&raw.sy_vmag),
            period: coerce_text_f64(&raw.pl_orbper),
            epoch: coerce_text_f64(&raw.pl_tranmid),
            duration_hours: coerce_text_f64(&raw.pl_trandur),
            depth_percent: coerce_text_f64(&raw.pl_trandep),
        })
    }
}

/// Parse the CSV answer of the secondary archive.
///
/// The header row must name at least the planet and host columns; other requested columns
/// may be missing and are then treated as masked.
///
/// Errors
/// ----------
/// * [`FeedError::Csv`] if the header row cannot be read.
/// * [`FeedError::Shape`] if the planet or host column is missing.
pub fn parse_secondary(body: &str) -> Result<SecondaryFeed, FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    for required in &SECONDARY_COLUMNS[..2] {
        if !headers.iter().any(|h| h == *required) {
            return Err(FeedError::Shape(format!(
                "secondary feed has no '{required}' column"
            )));
        }
    }

    Ok(reader
        .deserialize::<RawRow>()
        .map(|row| {
            row.map_err(|e| ExoError::Feed(FeedError::Csv(e)))
                .and_then(SecondaryRow::try_from)
        })
        .collect())
}

#[cfg(test)]
mod secondary_test {
    use super::*;

    const BODY: &str = "\
pl_name,hostname,ra,dec,sy_vmag,pl_orbper,pl_tranmid,pl_trandur,pl_trandep
WASP-12 b,WASP-12,97.6366,29.6723,11.569,1.0914203,2455147.4582,3.0,1.38
TOI-1000 b,TOI-1000,10.0,-5.0,,2.5,2459000.1,2.0,
,Nameless,1,1,1,1,1,1,1
";

    #[test]
    fn test_parse_rows() {
        let rows = parse_secondary(BODY).unwrap();
        assert_eq!(rows.len(), 3);

        let wasp = rows[0].as_ref().unwrap();
        assert_eq!(wasp.name, "WASP-12 b");
        assert_eq!(wasp.ra, Some(97.6366));
        assert_eq!(wasp.depth_percent, Some(1.38));

        let toi = rows[1].as_ref().unwrap();
        assert_eq!(toi.magnitude, None);
        assert_eq!(toi.depth_percent, None);

        assert_eq!(rows[2], Err(ExoError::MissingField("pl_name".into())));
    }

    #[test]
    fn test_missing_identity_column() {
        assert!(matches!(
            parse_secondary("name,ra\nx,1\n"),
            Err(FeedError::Shape(_))
        ));
    }

    #[test]
    fn test_empty_body_has_no_rows() {
        // a header-only answer is a valid, empty result set
        let header = SECONDARY_COLUMNS.join(",");
        assert!(parse_secondary(&header).unwrap().is_empty());
    }
}
