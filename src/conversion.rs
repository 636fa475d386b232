use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::Degree;
use crate::exo_errors::ExoError;

/// Three sexagesimal fields separated by blanks, colons or unit letters
/// (`06:30:32.79`, `06 30 32.79`, `06h30m32.79s`, `+29°40'20.2"`).
static SEXAGESIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*([+-]?)(\d+(?:\.\d*)?)[\s:hd°]+(\d+(?:\.\d*)?)[\s:m']+(\d+(?:\.\d*)?)\s*[s"]?\s*$"#)
        .expect("static sexagesimal pattern")
});

/// Split a sexagesimal string into its sign and its three components.
fn split_sexagesimal(raw: &str) -> Option<(f64, f64, f64, f64)> {
    let caps = SEXAGESIMAL.captures(raw)?;
    let sign = if &caps[1] == "-" { -1.0 } else { 1.0 };
    let first: f64 = caps[2].parse().ok()?;
    let minutes: f64 = caps[3].parse().ok()?;
    let seconds: f64 = caps[4].parse().ok()?;
    if minutes >= 60.0 || seconds >= 60.0 {
        return None;
    }
    Some((sign, first, minutes, seconds))
}

/// Parse a right ascension string to degrees
///
/// Arguments
/// ---------
/// * `ra`: a string representing the right ascension in hours, e.g. `HH:MM:SS.SS` or `HH MM SS.SS`
///
/// Returns
/// -------
/// * `Option<Degree>`: the right ascension in degrees within [0, 360), or `None` if the
///   input format is invalid.
pub fn parse_ra_to_deg(ra: &str) -> Option<Degree> {
    let (sign, h, m, s) = split_sexagesimal(ra)?;
    if sign < 0.0 {
        return None;
    }
    let ra_deg = (h + m / 60.0 + s / 3600.0) * 15.0;
    (ra_deg < 360.0).then_some(ra_deg)
}

/// Parse a declination string to degrees
///
/// Arguments
/// ---------
/// * `dec`: a string representing the declination in the format `±DD:MM:SS.SS` (blank separators are accepted too)
///
/// Returns
/// -------
/// * `Option<Degree>`: the declination in degrees, or `None` if the input format is invalid
///   or the value falls outside [-90, 90].
pub fn parse_dec_to_deg(dec: &str) -> Option<Degree> {
    let (sign, d, m, s) = split_sexagesimal(dec)?;
    let dec_deg = sign * (d + m / 60.0 + s / 3600.0);
    (dec_deg.abs() <= 90.0).then_some(dec_deg)
}

/// Parse a pair of sexagesimal coordinates.
///
/// Arguments
/// ---------
/// * `ra`: right ascension in hours (sexagesimal).
/// * `dec`: declination in degrees (sexagesimal).
///
/// Returns
/// -------
/// * `(ra_deg, dec_deg)` or [`ExoError::InvalidCoordinate`] naming the offending string.
pub fn parse_radec(ra: &str, dec: &str) -> Result<(Degree, Degree), ExoError> {
    let ra_deg =
        parse_ra_to_deg(ra).ok_or_else(|| ExoError::InvalidCoordinate(format!("RA '{ra}'")))?;
    let dec_deg =
        parse_dec_to_deg(dec).ok_or_else(|| ExoError::InvalidCoordinate(format!("Dec '{dec}'")))?;
    Ok((ra_deg, dec_deg))
}

#[cfg(test)]
mod conversion_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ra_to_deg() {
        assert_relative_eq!(
            parse_ra_to_deg("22 52 23.37").unwrap(),
            343.097375,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            parse_ra_to_deg("23:58:57.68").unwrap(),
            359.7403333333333,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            parse_ra_to_deg("04h41m04.77s").unwrap(),
            70.269875,
            epsilon = 1e-9
        );
        assert_eq!(parse_ra_to_deg("1 2 3.4.5"), None);
        assert_eq!(parse_ra_to_deg("1 2"), None);
        assert_eq!(parse_ra_to_deg("25:00:00"), None);
        assert_eq!(parse_ra_to_deg("24:00:00"), None);
        // fractional hour field pushing the total past 24h
        assert_eq!(parse_ra_to_deg("23.9999:59:59"), None);
        assert_eq!(parse_ra_to_deg("-01:00:00"), None);
        assert_eq!(parse_ra_to_deg(""), None);
    }

    #[test]
    fn test_dec_to_deg() {
        assert_relative_eq!(
            parse_dec_to_deg("-00:30:14.2").unwrap(),
            -0.5039444444444444,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            parse_dec_to_deg("+13 55 42.7").unwrap(),
            13.928527777777777,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            parse_dec_to_deg("+29°40'20.266\"").unwrap(),
            29.672296111111112,
            epsilon = 1e-9
        );
        assert_eq!(parse_dec_to_deg("89 15 50.2.3"), None);
        assert_eq!(parse_dec_to_deg("89 15"), None);
        assert_eq!(parse_dec_to_deg("91:00:00"), None);
        assert_eq!(parse_dec_to_deg("10:75:00"), None);
    }

    #[test]
    fn test_parse_radec_reports_the_bad_field() {
        assert_eq!(
            parse_radec("06:30:32.79", "north"),
            Err(ExoError::InvalidCoordinate("Dec 'north'".into()))
        );
        let (ra, dec) = parse_radec("06:30:32.79", "+29:40:20.27").unwrap();
        assert_relative_eq!(ra, 97.63662500000001, epsilon = 1e-9);
        assert_relative_eq!(dec, 29.67229722222222, epsilon = 1e-9);
    }
}
