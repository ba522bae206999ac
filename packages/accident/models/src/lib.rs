#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Aviation accident record types.
//!
//! An [`AccidentRecord`] holds one crash exactly as it appears in the source
//! dataset: every field is optional text, including the counts. Numeric and
//! temporal interpretation happens lazily through the accessors on the
//! record, which fail with a [`FieldParseError`] instead of coercing.

pub mod parsing;

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use parsing::{normalize_route, route_origin};

/// A named field of an [`AccidentRecord`].
///
/// Report definitions refer to record data only through this enum, so the
/// mapping from a report to the columns it reads is always explicit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    /// Crash date, `MM/DD/YYYY`.
    Date,
    /// Local time of the crash, `HH:MM`.
    Time,
    /// Crash site, usually `"City, Region"`.
    Location,
    /// Airline or other operating entity.
    Operator,
    /// Aircraft model designation.
    AircraftType,
    /// Planned flight path, `"City A - City B"`.
    Route,
    /// Persons aboard.
    Aboard,
    /// Fatalities aboard.
    Fatalities,
    /// Fatalities on the ground.
    Ground,
}

impl Field {
    /// Returns `true` for fields that hold counts stored as text.
    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Aboard | Self::Fatalities | Self::Ground)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Date,
            Self::Time,
            Self::Location,
            Self::Operator,
            Self::AircraftType,
            Self::Route,
            Self::Aboard,
            Self::Fatalities,
            Self::Ground,
        ]
    }
}

/// One crash from the accident dataset.
///
/// Column names follow the public "Airplane Crashes and Fatalities" export
/// (`Date`, `AC Type`, ...); camelCase and `snake_case` aliases are accepted
/// for JSON inputs. Blank values deserialize as `None`, JSON numbers are kept
/// as their decimal text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentRecord {
    /// See [`Field::Date`].
    #[serde(rename = "Date", alias = "date", default, deserialize_with = "text")]
    pub date: Option<String>,
    /// See [`Field::Time`].
    #[serde(rename = "Time", alias = "time", default, deserialize_with = "text")]
    pub time: Option<String>,
    /// See [`Field::Location`].
    #[serde(
        rename = "Location",
        alias = "location",
        default,
        deserialize_with = "text"
    )]
    pub location: Option<String>,
    /// See [`Field::Operator`].
    #[serde(
        rename = "Operator",
        alias = "operator",
        default,
        deserialize_with = "text"
    )]
    pub operator: Option<String>,
    /// See [`Field::AircraftType`].
    #[serde(
        rename = "AC Type",
        alias = "aircraftType",
        alias = "aircraft_type",
        default,
        deserialize_with = "text"
    )]
    pub aircraft_type: Option<String>,
    /// See [`Field::Route`].
    #[serde(rename = "Route", alias = "route", default, deserialize_with = "text")]
    pub route: Option<String>,
    /// See [`Field::Aboard`].
    #[serde(rename = "Aboard", alias = "aboard", default, deserialize_with = "text")]
    pub aboard: Option<String>,
    /// See [`Field::Fatalities`].
    #[serde(
        rename = "Fatalities",
        alias = "fatalities",
        default,
        deserialize_with = "text"
    )]
    pub fatalities: Option<String>,
    /// See [`Field::Ground`].
    #[serde(rename = "Ground", alias = "ground", default, deserialize_with = "text")]
    pub ground: Option<String>,
}

impl AccidentRecord {
    /// Returns the raw text of `field`, or `None` when it is null.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Date => self.date.as_deref(),
            Field::Time => self.time.as_deref(),
            Field::Location => self.location.as_deref(),
            Field::Operator => self.operator.as_deref(),
            Field::AircraftType => self.aircraft_type.as_deref(),
            Field::Route => self.route.as_deref(),
            Field::Aboard => self.aboard.as_deref(),
            Field::Fatalities => self.fatalities.as_deref(),
            Field::Ground => self.ground.as_deref(),
        }
    }

    /// Returns the raw text of `field`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldParseError::Missing`] if the field is null.
    pub fn require(&self, field: Field) -> Result<&str, FieldParseError> {
        self.get(field).ok_or(FieldParseError::Missing { field })
    }

    /// Interprets `field` as a non-negative count.
    ///
    /// The text must consist of ASCII digits only; `"NULL"`, signs, decimals
    /// and padding are all rejected before any conversion is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`FieldParseError`] if the field is null, not all digits, or
    /// too large for a `u64`.
    pub fn count(&self, field: Field) -> Result<u64, FieldParseError> {
        parsing::parse_count(field, self.require(field)?)
    }

    /// Reads a four-digit year starting at character `offset` of `field`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldParseError`] if the field is null or the four
    /// characters at `offset` are not all digits.
    pub fn year_at(&self, field: Field, offset: usize) -> Result<i32, FieldParseError> {
        parsing::parse_year_at(field, self.require(field)?, offset)
    }

    /// Reads the hour component of an `HH:MM` field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldParseError`] if the field is null or not a valid
    /// clock time.
    pub fn hour(&self, field: Field) -> Result<u32, FieldParseError> {
        parsing::parse_hour(field, self.require(field)?)
    }
}

/// Error returned when a record field cannot be interpreted as a report
/// requires.
///
/// These are per-record data-quality problems: callers skip the record for
/// the report at hand and carry on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldParseError {
    /// The field is null or blank.
    Missing {
        /// Field that was read.
        field: Field,
    },
    /// A count field holds something other than ASCII digits.
    NotNumeric {
        /// Field that was read.
        field: Field,
        /// Offending text.
        value: String,
    },
    /// A count field is all digits but does not fit in a `u64`.
    OutOfRange {
        /// Field that was read.
        field: Field,
        /// Offending text.
        value: String,
    },
    /// No four-digit year at the expected offset.
    InvalidYear {
        /// Field that was read.
        field: Field,
        /// Offending text.
        value: String,
    },
    /// Not an `HH:MM` clock time.
    InvalidTime {
        /// Field that was read.
        field: Field,
        /// Offending text.
        value: String,
    },
    /// Route text without any `-` separator.
    NoRouteSeparator {
        /// Offending text.
        value: String,
    },
    /// Route text whose first segment is empty after cleaning.
    EmptyRouteOrigin {
        /// Offending text.
        value: String,
    },
}

impl fmt::Display for FieldParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { field } => write!(f, "{field} is null"),
            Self::NotNumeric { field, value } => {
                write!(f, "{field} '{value}' is not a digit string")
            }
            Self::OutOfRange { field, value } => write!(f, "{field} '{value}' is out of range"),
            Self::InvalidYear { field, value } => {
                write!(f, "{field} '{value}' has no four-digit year")
            }
            Self::InvalidTime { field, value } => {
                write!(f, "{field} '{value}' is not an HH:MM time")
            }
            Self::NoRouteSeparator { value } => write!(f, "route '{value}' has no '-' separator"),
            Self::EmptyRouteOrigin { value } => write!(f, "route '{value}' has an empty origin"),
        }
    }
}

impl std::error::Error for FieldParseError {}

/// Deserializes any self-describing scalar into optional text.
///
/// Only suitable for typed formats such as JSON. Formats that guess types
/// from text (CSV) must read plain strings instead.
///
/// Strings are kept verbatim unless blank, integers and integral floats are
/// rendered without a fractional part, and null/unit become `None`.
fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number, or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(if v.trim().is_empty() {
                None
            } else {
                Some(v.to_string())
            })
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(if v.trim().is_empty() { None } else { Some(v) })
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            // Document stores often widen integer counts to doubles.
            if v.is_finite() && v.fract().abs() < f64::EPSILON {
                Ok(Some(format!("{v:.0}")))
            } else {
                Ok(Some(v.to_string()))
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(Self)
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_round_trip_through_strum() {
        for field in Field::all() {
            let parsed: Field = field.as_ref().parse().unwrap();
            assert_eq!(parsed, *field);
        }
        assert_eq!(Field::AircraftType.to_string(), "aircraft_type");
    }

    #[test]
    fn only_counts_are_count_fields() {
        let counts: Vec<Field> = Field::all().iter().copied().filter(|f| f.is_count()).collect();
        assert_eq!(counts, vec![Field::Aboard, Field::Fatalities, Field::Ground]);
    }

    #[test]
    fn deserializes_dataset_column_names() {
        let record: AccidentRecord = serde_json::from_value(serde_json::json!({
            "Date": "09/17/1908",
            "Time": "17:18",
            "Location": "Fort Myer, Virginia",
            "Operator": "Military - U.S. Army",
            "AC Type": "Wright Flyer III",
            "Route": "Demonstration",
            "Aboard": "2",
            "Fatalities": "1",
            "Ground": "0",
            "Summary": "ignored"
        }))
        .unwrap();

        assert_eq!(record.get(Field::AircraftType), Some("Wright Flyer III"));
        assert_eq!(record.count(Field::Fatalities), Ok(1));
        assert_eq!(record.year_at(Field::Date, 6), Ok(1908));
        assert_eq!(record.hour(Field::Time), Ok(17));
    }

    #[test]
    fn deserializes_numbers_and_nulls_as_text() {
        let record: AccidentRecord = serde_json::from_value(serde_json::json!({
            "operator": null,
            "aircraftType": "Boeing 747",
            "aboard": 300,
            "fatalities": 12.0,
            "ground": "   "
        }))
        .unwrap();

        assert_eq!(record.operator, None);
        assert_eq!(record.aboard.as_deref(), Some("300"));
        assert_eq!(record.fatalities.as_deref(), Some("12"));
        assert_eq!(record.ground, None);
        assert_eq!(record.date, None);
    }

    #[test]
    fn null_text_is_not_numeric() {
        let record = AccidentRecord {
            fatalities: Some("NULL".to_string()),
            ..AccidentRecord::default()
        };
        assert_eq!(
            record.count(Field::Fatalities),
            Err(FieldParseError::NotNumeric {
                field: Field::Fatalities,
                value: "NULL".to_string(),
            })
        );
        assert_eq!(
            record.count(Field::Aboard),
            Err(FieldParseError::Missing {
                field: Field::Aboard
            })
        );
    }

    #[test]
    fn errors_name_the_field() {
        let err = FieldParseError::NotNumeric {
            field: Field::Ground,
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "ground 'abc' is not a digit string");
    }
}
