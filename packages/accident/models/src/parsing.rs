//! Field interpretation helpers.
//!
//! Every function here takes raw field text and either returns a typed value
//! or a [`FieldParseError`]. Nothing is coerced: text that does not match the
//! expected shape is rejected before conversion.

use std::sync::LazyLock;

use chrono::{NaiveTime, Timelike as _};
use regex::Regex;

use crate::{Field, FieldParseError};

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap_or_else(|_| unreachable!()));

/// A run of dashes and spaces containing at least one spaced dash. Bare
/// dashes inside a segment (`"Winston-Salem"`) are left alone.
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ -]*(?: -|- )[ -]*").unwrap_or_else(|_| unreachable!()));

/// Returns `true` if `value` is a non-empty run of ASCII digits.
#[must_use]
pub fn is_digits(value: &str) -> bool {
    DIGITS.is_match(value)
}

/// Converts an all-digit count field to a number.
///
/// # Errors
///
/// Returns [`FieldParseError::NotNumeric`] for anything other than ASCII
/// digits and [`FieldParseError::OutOfRange`] if the value overflows.
pub fn parse_count(field: Field, value: &str) -> Result<u64, FieldParseError> {
    if !is_digits(value) {
        return Err(FieldParseError::NotNumeric {
            field,
            value: value.to_string(),
        });
    }
    value.parse().map_err(|_| FieldParseError::OutOfRange {
        field,
        value: value.to_string(),
    })
}

/// Reads the four characters at `offset` as a year.
///
/// # Errors
///
/// Returns [`FieldParseError::InvalidYear`] if those characters are missing
/// or not all digits.
pub fn parse_year_at(field: Field, value: &str, offset: usize) -> Result<i32, FieldParseError> {
    let year: String = value.chars().skip(offset).take(4).collect();
    if year.len() != 4 || !is_digits(&year) {
        return Err(FieldParseError::InvalidYear {
            field,
            value: value.to_string(),
        });
    }
    year.parse().map_err(|_| FieldParseError::InvalidYear {
        field,
        value: value.to_string(),
    })
}

/// Reads the hour from an `HH:MM` clock time.
///
/// # Errors
///
/// Returns [`FieldParseError::InvalidTime`] if `value` is not a valid time.
pub fn parse_hour(field: Field, value: &str) -> Result<u32, FieldParseError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map(|t| t.hour())
        .map_err(|_| FieldParseError::InvalidTime {
            field,
            value: value.to_string(),
        })
}

/// Splits a route into trimmed segments, keeping empty ones.
fn route_segments(raw: &str) -> Result<Vec<String>, FieldParseError> {
    if !raw.contains('-') {
        return Err(FieldParseError::NoRouteSeparator {
            value: raw.to_string(),
        });
    }

    let collapsed = raw
        .replace('\t', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    Ok(SEPARATOR
        .split(&collapsed)
        .map(|segment| segment.trim().to_string())
        .collect())
}

/// Cleans a free-text route into canonical `"A - B - C"` form.
///
/// Tabs become spaces, whitespace runs collapse to one space, every dash
/// separator (including repeated ones such as `" - - "`) becomes a single
/// `" - "`, and empty segments are dropped.
///
/// # Errors
///
/// Returns [`FieldParseError::NoRouteSeparator`] if `raw` contains no dash
/// at all (free text such as `"Training flight"`).
pub fn normalize_route(raw: &str) -> Result<String, FieldParseError> {
    Ok(route_segments(raw)?
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" - "))
}

/// Extracts the departure point of a route: the text before the first
/// separator.
///
/// # Errors
///
/// Returns [`FieldParseError`] if the route has no dash or nothing precedes
/// its first separator.
pub fn route_origin(raw: &str) -> Result<String, FieldParseError> {
    route_segments(raw)?
        .into_iter()
        .next()
        .filter(|origin| !origin.is_empty())
        .ok_or_else(|| FieldParseError::EmptyRouteOrigin {
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_reject_null_text() {
        assert!(is_digits("500"));
        assert!(is_digits("0"));
        assert!(!is_digits("NULL"));
        assert!(!is_digits("abc"));
        assert!(!is_digits(" 5"));
        assert!(!is_digits("-5"));
        assert!(!is_digits("5.0"));
        assert!(!is_digits(""));
    }

    #[test]
    fn parses_counts() {
        assert_eq!(parse_count(Field::Aboard, "42"), Ok(42));
        assert!(matches!(
            parse_count(Field::Aboard, "99999999999999999999999"),
            Err(FieldParseError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_count(Field::Aboard, "NULL"),
            Err(FieldParseError::NotNumeric { .. })
        ));
    }

    #[test]
    fn reads_year_at_offset() {
        assert_eq!(parse_year_at(Field::Date, "07/12/1955", 6), Ok(1955));
        assert!(parse_year_at(Field::Date, "7/12/1955", 6).is_err());
        assert!(parse_year_at(Field::Date, "07/12/55", 6).is_err());
        assert!(parse_year_at(Field::Date, "", 6).is_err());
    }

    #[test]
    fn reads_hour() {
        assert_eq!(parse_hour(Field::Time, "06:00"), Ok(6));
        assert_eq!(parse_hour(Field::Time, "17:59"), Ok(17));
        assert_eq!(parse_hour(Field::Time, "23:30"), Ok(23));
        assert!(parse_hour(Field::Time, "c 14:00").is_err());
        assert!(parse_hour(Field::Time, "25:00").is_err());
        assert!(parse_hour(Field::Time, "noon").is_err());
    }

    #[test]
    fn normalizes_messy_route() {
        assert_eq!(
            normalize_route("Paris\t- \tLondon  -  Rome").unwrap(),
            "Paris - London - Rome"
        );
        assert_eq!(
            normalize_route("  New York -Chicago").unwrap(),
            "New York - Chicago"
        );
        assert_eq!(
            normalize_route("Winston-Salem - Atlanta").unwrap(),
            "Winston-Salem - Atlanta"
        );
    }

    #[test]
    fn canonical_route_has_no_empty_segments() {
        assert_eq!(normalize_route("Paris -").unwrap(), "Paris");
        assert_eq!(normalize_route("Paris - - London").unwrap(), "Paris - London");
        assert_eq!(normalize_route("Paris -\t-London").unwrap(), "Paris - London");
        assert_eq!(normalize_route("- London").unwrap(), "London");
        assert_eq!(normalize_route("Paris-London").unwrap(), "Paris-London");
    }

    #[test]
    fn extracts_origin() {
        assert_eq!(route_origin("Paris\t- \tLondon  -  Rome").unwrap(), "Paris");
        assert_eq!(route_origin("Winston-Salem").unwrap(), "Winston-Salem");
    }

    #[test]
    fn rejects_routes_without_dash() {
        assert_eq!(
            route_origin("Training flight"),
            Err(FieldParseError::NoRouteSeparator {
                value: "Training flight".to_string()
            })
        );
    }

    #[test]
    fn rejects_empty_origin() {
        assert!(matches!(
            route_origin(" - London"),
            Err(FieldParseError::EmptyRouteOrigin { .. })
        ));
        assert!(matches!(
            route_origin("- - London"),
            Err(FieldParseError::EmptyRouteOrigin { .. })
        ));
        assert_eq!(route_origin("Paris - - London").unwrap(), "Paris");
    }
}
