#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report identifiers and result types.
//!
//! A report run produces a [`ReportOutput`]: an ordered list of
//! [`ReportRow`]s, each an ordered mapping of column names to scalar
//! [`ReportValue`]s, plus bookkeeping on how many records were excluded.

use std::fmt;

use serde::ser::SerializeMap as _;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Identifier of a report in the catalog.
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
pub enum ReportName {
    /// Aircraft models with the most accidents.
    TopAircraftTypes,
    /// Mean fatalities per crash for each operator.
    OperatorAverageFatalities,
    /// Fatalities over persons aboard for each aircraft model.
    AircraftFatalityRatio,
    /// Share of crashes with military versus civil operators.
    MilitaryVsCivil,
    /// Fatalities per decade since 1950 with the change between decades.
    DecadeFatalityTrend,
    /// Crashes during daylight versus nighttime hours.
    DaylightVsNighttime,
    /// The date with the most combined onboard and ground fatalities.
    DeadliestDate,
    /// Crash sites by number of incidents.
    TopLocations,
    /// Crash sites by ground fatalities.
    TopGroundFatalityLocations,
    /// Number of crashes without onboard fatalities.
    ZeroFatalityIncidents,
    /// Percentage of persons aboard killed, per operator.
    OperatorFatalityRate,
    /// Regions (last component of the crash site) by number of incidents.
    TopCrashRegions,
    /// Departure points taken from the route text.
    TopDepartureOrigins,
    /// Number of operators with at least 500 total fatalities.
    SevereOperatorCount,
}

impl ReportName {
    /// Returns all variants of this enum, in catalog order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::TopAircraftTypes,
            Self::OperatorAverageFatalities,
            Self::AircraftFatalityRatio,
            Self::MilitaryVsCivil,
            Self::DecadeFatalityTrend,
            Self::DaylightVsNighttime,
            Self::DeadliestDate,
            Self::TopLocations,
            Self::TopGroundFatalityLocations,
            Self::ZeroFatalityIncidents,
            Self::OperatorFatalityRate,
            Self::TopCrashRegions,
            Self::TopDepartureOrigins,
            Self::SevereOperatorCount,
        ]
    }
}

/// A scalar output value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportValue {
    /// Absent value (e.g. a null grouping key or the first trend difference).
    Null,
    /// Whole number.
    Int(i64),
    /// Fractional number.
    Float(f64),
    /// Text.
    Text(String),
}

impl ReportValue {
    /// Returns the value as a float if it is numeric.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Null | Self::Text(_) => None,
        }
    }

    /// Returns the value as an integer if it is one.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as text if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` for [`ReportValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:.4}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for ReportValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ReportValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ReportValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ReportValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for ReportValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One output row: column names mapped to values, in column order.
///
/// Serializes as a flat JSON object, e.g. `{"origin": "Paris", "count": 142}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportRow {
    columns: Vec<(String, ReportValue)>,
}

impl ReportRow {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Appends a column, replacing any existing column of the same name.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<ReportValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a column, replacing any existing column of the same name.
    pub fn set(&mut self, name: &str, value: impl Into<ReportValue>) {
        let value = value.into();
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.columns.push((name.to_string(), value));
        }
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ReportValue> {
        self.columns
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    /// Iterates over `(name, value)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &ReportValue)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for ReportRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// The result of running one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutput {
    /// Which report produced these rows.
    pub report: ReportName,
    /// Result rows in report order.
    pub rows: Vec<ReportRow>,
    /// Records examined.
    pub scanned: u64,
    /// Records rejected by the report's filters.
    pub filtered: u64,
    /// Records excluded because a required field could not be parsed.
    pub skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_names_parse_from_snake_case() {
        for name in ReportName::all() {
            let parsed: ReportName = name.as_ref().parse().unwrap();
            assert_eq!(parsed, *name);
        }
        assert_eq!(
            "top_departure_origins".parse::<ReportName>().unwrap(),
            ReportName::TopDepartureOrigins
        );
        assert!("top_airports".parse::<ReportName>().is_err());
    }

    #[test]
    fn row_serializes_as_flat_object_in_column_order() {
        let row = ReportRow::new()
            .with("origin", "Paris")
            .with("count", 142_i64)
            .with("difference", None::<i64>);

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"origin":"Paris","count":142,"difference":null}"#);
    }

    #[test]
    fn set_replaces_existing_column() {
        let mut row = ReportRow::new().with("count", 1_i64);
        row.set("count", 2_i64);
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("count").and_then(ReportValue::as_i64), Some(2));
    }

    #[test]
    fn numeric_accessors() {
        assert_eq!(ReportValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ReportValue::Float(0.5).as_i64(), None);
        assert_eq!(ReportValue::from("x").as_str(), Some("x"));
        assert!(ReportValue::from(None::<f64>).is_null());
    }
}
