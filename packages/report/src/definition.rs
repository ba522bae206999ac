//! Config-driven report definition.
//!
//! [`ReportDefinition`] captures everything unique about a report in a
//! serializable config struct: which records it keeps, how it derives a
//! grouping key, what it aggregates, and how it shapes, sorts and limits the
//! result. A single generic pipeline in [`crate::pipeline`] executes all of
//! them, so no report has bespoke code.

use crash_reports_accident_models::{AccidentRecord, Field, FieldParseError, parsing};
use crash_reports_report_models::ReportName;
use serde::Deserialize;

// ── Top-level report definition ──────────────────────────────────────────

/// A complete, config-driven report definition.
///
/// Loaded from TOML files embedded at compile time (see
/// [`crate::registry`]).
#[derive(Debug, Clone, Deserialize)]
pub struct ReportDefinition {
    /// Catalog identifier.
    pub id: ReportName,
    /// Human-readable title.
    pub title: String,
    /// Record predicates, all of which must pass.
    #[serde(default)]
    pub filters: Vec<RecordFilter>,
    /// How records are partitioned.
    pub group: GroupKey,
    /// What is computed per group.
    pub aggregate: Aggregator,
    /// Post-aggregation shaping.
    #[serde(default)]
    pub shape: Shape,
    /// Result ordering. Groups stay in first-seen order when omitted.
    pub sort: Option<SortSpec>,
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
    /// Output column names.
    pub columns: Columns,
}

/// Output column names for the group key and the aggregated value.
#[derive(Debug, Clone, Deserialize)]
pub struct Columns {
    /// Column for the group key. Omitted for single-bucket reports.
    pub key: Option<String>,
    /// Column for the aggregated value.
    pub value: String,
}

// ── Filters ──────────────────────────────────────────────────────────────

/// A predicate on a raw record.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordFilter {
    /// Field must not be null.
    NotNull {
        /// Field to test.
        field: Field,
    },
    /// Field must be non-null and differ from `value`. Used for textual
    /// null markers such as `"NULL"`.
    NotEquals {
        /// Field to test.
        field: Field,
        /// Rejected text.
        value: String,
    },
    /// Field must contain a substring (case-sensitive). Null fails.
    Contains {
        /// Field to test.
        field: Field,
        /// Required substring.
        substring: String,
    },
    /// Field must be an all-digit string. Null and `"NULL"` fail.
    Digits {
        /// Field to test.
        field: Field,
    },
    /// Count field must equal `value`.
    NumberEquals {
        /// Field to test.
        field: Field,
        /// Expected count.
        value: u64,
    },
    /// Four-digit year at `offset` must be at least `min`.
    YearAtLeast {
        /// Field holding the date text.
        field: Field,
        /// Character offset of the year.
        offset: usize,
        /// Smallest year kept.
        min: i32,
    },
}

impl RecordFilter {
    /// Tests `record` against this filter.
    ///
    /// Returns `Ok(false)` when the record is simply rejected and `Err` when
    /// the filter needs a value that cannot be parsed.
    ///
    /// # Errors
    ///
    /// Returns [`FieldParseError`] for `number_equals` and `year_at_least`
    /// filters whose field cannot be interpreted.
    pub fn test(&self, record: &AccidentRecord) -> Result<bool, FieldParseError> {
        match self {
            Self::NotNull { field } => Ok(record.get(*field).is_some()),
            Self::NotEquals { field, value } => {
                Ok(record.get(*field).is_some_and(|v| v != value.as_str()))
            }
            Self::Contains { field, substring } => Ok(record
                .get(*field)
                .is_some_and(|v| v.contains(substring.as_str()))),
            Self::Digits { field } => Ok(record.get(*field).is_some_and(parsing::is_digits)),
            Self::NumberEquals { field, value } => Ok(record.count(*field)? == *value),
            Self::YearAtLeast { field, offset, min } => {
                Ok(record.year_at(*field, *offset)? >= *min)
            }
        }
    }
}

// ── Grouping ─────────────────────────────────────────────────────────────

/// How to derive the grouping key from a record.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupKey {
    /// The raw field text. Null values form their own group.
    Field {
        /// Field to group by.
        field: Field,
    },
    /// Binary classification by a case-insensitive regex. Null text counts
    /// as not matching.
    Matches {
        /// Field to test.
        field: Field,
        /// Regular expression, matched anywhere in the text.
        pattern: String,
        /// Key for matching records.
        matched: String,
        /// Key for all other records.
        unmatched: String,
    },
    /// Decade start (`year - year % 10`) of a four-digit year at `offset`.
    Decade {
        /// Field holding the date text.
        field: Field,
        /// Character offset of the year.
        offset: usize,
    },
    /// Two buckets by the hour of an `HH:MM` field: `[start, end)` and the
    /// rest.
    HourOfDay {
        /// Field holding the time text.
        field: Field,
        /// First hour inside the window.
        start: u32,
        /// First hour after the window.
        end: u32,
        /// Key for hours inside the window.
        inside: String,
        /// Key for hours outside the window.
        outside: String,
    },
    /// Departure point of a normalised route.
    RouteOrigin {
        /// Field holding the route text.
        field: Field,
    },
    /// Last component of the text after splitting on `separator`.
    LastSegment {
        /// Field to split.
        field: Field,
        /// Component separator.
        separator: String,
    },
    /// A single bucket holding every record.
    All,
}

// ── Aggregation ──────────────────────────────────────────────────────────

/// What to compute for each group.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Aggregator {
    /// Number of records.
    Count,
    /// Sum of one or more count fields, added per record.
    Sum {
        /// Fields to add.
        fields: Vec<Field>,
    },
    /// Arithmetic mean of a count field.
    Mean {
        /// Field to average.
        field: Field,
    },
    /// Sum of `numerator` over sum of `denominator`, times `scale`. Defined
    /// as `0` when the denominator total is `0`.
    Ratio {
        /// Dividend field.
        numerator: Field,
        /// Divisor field.
        denominator: Field,
        /// Multiplier applied to the quotient (e.g. `100` for a percentage).
        #[serde(default = "default_scale")]
        scale: f64,
    },
}

const fn default_scale() -> f64 {
    1.0
}

// ── Shaping ──────────────────────────────────────────────────────────────

/// Post-aggregation shaping of the grouped rows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Rows are returned as aggregated.
    #[default]
    None,
    /// Adds each group's share of the total, `100 * value / total`.
    Percentage {
        /// Column for the share.
        column: String,
    },
    /// Adds the signed difference from the previous row (null for the first)
    /// and a label formed from the key and `label_suffix`.
    Trend {
        /// Column for the difference.
        difference_column: String,
        /// Column for the label.
        label_column: String,
        /// Text appended to the key to form the label (e.g. `"s"`).
        #[serde(default)]
        label_suffix: String,
    },
    /// Replaces the rows with a single count of groups whose value is at
    /// least `min_value`.
    CountGroups {
        /// Inclusive threshold.
        min_value: f64,
        /// Column for the count.
        column: String,
    },
}

// ── Sorting ──────────────────────────────────────────────────────────────

/// Result ordering. Sorting is stable: ties keep first-seen group order.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SortSpec {
    /// What to sort by.
    pub by: SortKey,
    /// Direction.
    pub order: SortOrder,
}

/// Sort target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// The group key.
    Key,
    /// The aggregated value.
    Value,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// Parses a TOML string into a [`ReportDefinition`].
///
/// # Errors
///
/// Returns an error string if the TOML is malformed or doesn't match the
/// expected schema.
pub fn parse_report_toml(toml_str: &str) -> Result<ReportDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}
