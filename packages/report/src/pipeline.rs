//! Generic report pipeline.
//!
//! Executes a [`ReportDefinition`] over a sequence of records in five
//! stages: filter, derive key, aggregate, shape/sort, limit. Records whose
//! fields cannot be interpreted are skipped and counted; they never abort
//! the run.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use crash_reports_accident_models::{AccidentRecord, FieldParseError, route_origin};
use crash_reports_report_models::{ReportOutput, ReportRow, ReportValue};
use regex::{Regex, RegexBuilder};

use crate::ReportError;
use crate::definition::{
    Aggregator, GroupKey, ReportDefinition, Shape, SortKey, SortOrder, SortSpec,
};

/// A derived grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum GroupValue {
    Null,
    Int(i64),
    Text(String),
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<GroupValue> for ReportValue {
    fn from(value: GroupValue) -> Self {
        match value {
            GroupValue::Null => Self::Null,
            GroupValue::Int(v) => Self::Int(v),
            GroupValue::Text(v) => Self::Text(v),
        }
    }
}

/// What a single record adds to its group.
#[derive(Debug, Default, Clone, Copy)]
struct Contribution {
    amount: u64,
    numerator: u64,
    denominator: u64,
}

/// Running totals for one group.
#[derive(Debug)]
struct Group {
    key: GroupValue,
    records: u64,
    amount: u64,
    numerator: u64,
    denominator: u64,
}

impl Group {
    const fn new(key: GroupValue) -> Self {
        Self {
            key,
            records: 0,
            amount: 0,
            numerator: 0,
            denominator: 0,
        }
    }

    fn add(&mut self, c: Contribution) {
        self.records += 1;
        self.amount = self.amount.saturating_add(c.amount);
        self.numerator = self.numerator.saturating_add(c.numerator);
        self.denominator = self.denominator.saturating_add(c.denominator);
    }

    #[allow(clippy::cast_precision_loss)]
    fn value(&self, aggregate: &Aggregator) -> ReportValue {
        match aggregate {
            Aggregator::Count => ReportValue::Int(saturating_i64(self.records)),
            Aggregator::Sum { .. } => ReportValue::Int(saturating_i64(self.amount)),
            Aggregator::Mean { .. } => {
                ReportValue::Float(self.amount as f64 / self.records.max(1) as f64)
            }
            Aggregator::Ratio { scale, .. } => {
                if self.denominator == 0 {
                    ReportValue::Float(0.0)
                } else {
                    ReportValue::Float(self.numerator as f64 / self.denominator as f64 * scale)
                }
            }
        }
    }
}

/// An aggregated group ready for shaping.
#[derive(Debug)]
struct Aggregated {
    key: GroupValue,
    value: ReportValue,
    metric: f64,
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// A [`ReportDefinition`] prepared for execution.
#[derive(Debug)]
pub struct Pipeline<'a> {
    definition: &'a ReportDefinition,
    classifier: Option<Regex>,
}

impl<'a> Pipeline<'a> {
    /// Prepares `definition` for execution, compiling any patterns it uses.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Definition`] if a classification pattern is not
    /// a valid regular expression.
    pub fn new(definition: &'a ReportDefinition) -> Result<Self, ReportError> {
        let classifier = match &definition.group {
            GroupKey::Matches { pattern, .. } => Some(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ReportError::Definition {
                        report: definition.id,
                        message: e.to_string(),
                    })?,
            ),
            _ => None,
        };

        Ok(Self {
            definition,
            classifier,
        })
    }

    /// Runs the pipeline over `records`.
    ///
    /// The pipeline holds no state between runs, so running it twice over
    /// the same records yields identical output.
    pub fn run<'r, I>(&self, records: I) -> ReportOutput
    where
        I: IntoIterator<Item = &'r AccidentRecord>,
    {
        let def = self.definition;
        let mut groups: Vec<Group> = Vec::new();
        let mut index: HashMap<GroupValue, usize> = HashMap::new();
        let mut scanned = 0_u64;
        let mut filtered = 0_u64;
        let mut skipped = 0_u64;

        for record in records {
            scanned += 1;

            match self.admit(record) {
                Ok(true) => {}
                Ok(false) => {
                    filtered += 1;
                    continue;
                }
                Err(e) => {
                    log::trace!("{}: skipping record {scanned}: {e}", def.id);
                    skipped += 1;
                    continue;
                }
            }

            let (key, contribution) = match self
                .key(record)
                .and_then(|key| Ok((key, self.contribution(record)?)))
            {
                Ok(derived) => derived,
                Err(e) => {
                    log::trace!("{}: skipping record {scanned}: {e}", def.id);
                    skipped += 1;
                    continue;
                }
            };

            let slot = match index.entry(key) {
                Entry::Occupied(e) => *e.get(),
                Entry::Vacant(e) => {
                    groups.push(Group::new(e.key().clone()));
                    *e.insert(groups.len() - 1)
                }
            };
            groups[slot].add(contribution);
        }

        let mut aggregated: Vec<Aggregated> = groups
            .into_iter()
            .map(|g| {
                let value = g.value(&def.aggregate);
                Aggregated {
                    metric: value.as_f64().unwrap_or_default(),
                    value,
                    key: g.key,
                }
            })
            .collect();

        if let Some(sort) = def.sort {
            sort_groups(&mut aggregated, sort);
        }

        let mut rows = self.shape(aggregated);
        if let Some(limit) = def.limit {
            rows.truncate(limit);
        }

        log::debug!(
            "{}: {} rows from {scanned} records ({filtered} filtered, {skipped} skipped)",
            def.id,
            rows.len()
        );

        ReportOutput {
            report: def.id,
            rows,
            scanned,
            filtered,
            skipped,
        }
    }

    /// Applies every filter; the first rejection or parse failure wins.
    fn admit(&self, record: &AccidentRecord) -> Result<bool, FieldParseError> {
        for filter in &self.definition.filters {
            if !filter.test(record)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn key(&self, record: &AccidentRecord) -> Result<GroupValue, FieldParseError> {
        Ok(match &self.definition.group {
            GroupKey::Field { field } => record
                .get(*field)
                .map_or(GroupValue::Null, |v| GroupValue::Text(v.to_string())),
            GroupKey::Matches {
                field,
                matched,
                unmatched,
                ..
            } => {
                let hit = match (&self.classifier, record.get(*field)) {
                    (Some(re), Some(text)) => re.is_match(text),
                    _ => false,
                };
                GroupValue::Text((if hit { matched } else { unmatched }).clone())
            }
            GroupKey::Decade { field, offset } => {
                let year = record.year_at(*field, *offset)?;
                GroupValue::Int(i64::from(year - year % 10))
            }
            GroupKey::HourOfDay {
                field,
                start,
                end,
                inside,
                outside,
            } => {
                let hour = record.hour(*field)?;
                GroupValue::Text(if (*start..*end).contains(&hour) {
                    inside.clone()
                } else {
                    outside.clone()
                })
            }
            GroupKey::RouteOrigin { field } => {
                GroupValue::Text(route_origin(record.require(*field)?)?)
            }
            GroupKey::LastSegment { field, separator } => {
                record.get(*field).map_or(GroupValue::Null, |v| {
                    GroupValue::Text(
                        v.rsplit(separator.as_str())
                            .next()
                            .unwrap_or(v)
                            .to_string(),
                    )
                })
            }
            GroupKey::All => GroupValue::Null,
        })
    }

    fn contribution(&self, record: &AccidentRecord) -> Result<Contribution, FieldParseError> {
        Ok(match &self.definition.aggregate {
            Aggregator::Count => Contribution::default(),
            Aggregator::Sum { fields } => {
                let mut amount = 0_u64;
                for field in fields {
                    amount = amount.saturating_add(record.count(*field)?);
                }
                Contribution {
                    amount,
                    ..Contribution::default()
                }
            }
            Aggregator::Mean { field } => Contribution {
                amount: record.count(*field)?,
                ..Contribution::default()
            },
            Aggregator::Ratio {
                numerator,
                denominator,
                ..
            } => Contribution {
                numerator: record.count(*numerator)?,
                denominator: record.count(*denominator)?,
                ..Contribution::default()
            },
        })
    }

    fn shape(&self, aggregated: Vec<Aggregated>) -> Vec<ReportRow> {
        let columns = &self.definition.columns;
        let base = |group: &Aggregated| {
            let mut row = ReportRow::new();
            if let Some(key) = &columns.key {
                row.set(key, group.key.clone());
            }
            row.set(&columns.value, group.value.clone());
            row
        };

        match &self.definition.shape {
            Shape::None => aggregated.iter().map(base).collect(),
            Shape::Percentage { column } => {
                let total: f64 = aggregated.iter().map(|g| g.metric).sum();
                aggregated
                    .iter()
                    .map(|g| {
                        let share = if total <= 0.0 {
                            0.0
                        } else {
                            100.0 * g.metric / total
                        };
                        base(g).with(column, share)
                    })
                    .collect()
            }
            Shape::Trend {
                difference_column,
                label_column,
                label_suffix,
            } => {
                let mut previous: Option<&Aggregated> = None;
                aggregated
                    .iter()
                    .map(|g| {
                        let change = previous.map_or(ReportValue::Null, |p| difference(p, g));
                        previous = Some(g);
                        base(g)
                            .with(label_column, format!("{}{label_suffix}", g.key))
                            .with(difference_column, change)
                    })
                    .collect()
            }
            Shape::CountGroups { min_value, column } => {
                let qualifying = aggregated.iter().filter(|g| g.metric >= *min_value).count();
                vec![ReportRow::new().with(column, i64::try_from(qualifying).unwrap_or(i64::MAX))]
            }
        }
    }
}

/// Signed change from `previous` to `current`, exact for whole numbers.
fn difference(previous: &Aggregated, current: &Aggregated) -> ReportValue {
    match (&previous.value, &current.value) {
        (ReportValue::Int(p), ReportValue::Int(c)) => ReportValue::Int(c.saturating_sub(*p)),
        _ => ReportValue::Float(current.metric - previous.metric),
    }
}

fn sort_groups(groups: &mut [Aggregated], sort: SortSpec) {
    // `sort_by` is stable, so ties keep first-seen order.
    groups.sort_by(|a, b| {
        let ordering = match sort.by {
            SortKey::Key => a.key.cmp(&b.key),
            SortKey::Value => a.metric.total_cmp(&b.metric),
        };
        match sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}
