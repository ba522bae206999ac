//! Report registry: loads every report definition from embedded TOML.
//!
//! Each `.toml` file in `packages/report/reports/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a report means adding a
//! [`ReportName`] variant, a TOML file, and an entry in the list below.

use std::sync::LazyLock;

use crash_reports_report_models::ReportName;

use crate::definition::{ReportDefinition, parse_report_toml};

/// TOML configs embedded at compile time, in catalog order.
const REPORT_TOMLS: &[(&str, &str)] = &[
    // ── Aircraft and operator safety ─────────────────────────────────
    (
        "top_aircraft_types",
        include_str!("../reports/top_aircraft_types.toml"),
    ),
    (
        "operator_average_fatalities",
        include_str!("../reports/operator_average_fatalities.toml"),
    ),
    (
        "aircraft_fatality_ratio",
        include_str!("../reports/aircraft_fatality_ratio.toml"),
    ),
    (
        "military_vs_civil",
        include_str!("../reports/military_vs_civil.toml"),
    ),
    // ── Temporal patterns ────────────────────────────────────────────
    (
        "decade_fatality_trend",
        include_str!("../reports/decade_fatality_trend.toml"),
    ),
    (
        "daylight_vs_nighttime",
        include_str!("../reports/daylight_vs_nighttime.toml"),
    ),
    ("deadliest_date", include_str!("../reports/deadliest_date.toml")),
    // ── Geography ────────────────────────────────────────────────────
    ("top_locations", include_str!("../reports/top_locations.toml")),
    (
        "top_ground_fatality_locations",
        include_str!("../reports/top_ground_fatality_locations.toml"),
    ),
    (
        "zero_fatality_incidents",
        include_str!("../reports/zero_fatality_incidents.toml"),
    ),
    // ── Data-quality sensitive ───────────────────────────────────────
    (
        "operator_fatality_rate",
        include_str!("../reports/operator_fatality_rate.toml"),
    ),
    (
        "top_crash_regions",
        include_str!("../reports/top_crash_regions.toml"),
    ),
    (
        "top_departure_origins",
        include_str!("../reports/top_departure_origins.toml"),
    ),
    (
        "severe_operator_count",
        include_str!("../reports/severe_operator_count.toml"),
    ),
];

static CATALOG: LazyLock<Vec<ReportDefinition>> = LazyLock::new(all_reports);

/// Returns all configured report definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_reports() -> Vec<ReportDefinition> {
    REPORT_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_report_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the parsed catalog, loading it on first use.
#[must_use]
pub fn catalog() -> &'static [ReportDefinition] {
    &CATALOG
}

/// Looks up the definition for `name`.
#[must_use]
pub fn definition(name: ReportName) -> Option<&'static ReportDefinition> {
    catalog().iter().find(|def| def.id == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_reports() {
        assert_eq!(all_reports().len(), ReportName::all().len());
    }

    #[test]
    fn every_report_name_has_one_definition() {
        for name in ReportName::all() {
            let count = catalog().iter().filter(|def| def.id == *name).count();
            assert_eq!(count, 1, "{name} has {count} definitions");
        }
    }

    #[test]
    fn file_names_match_ids() {
        for ((file, _), def) in REPORT_TOMLS.iter().zip(catalog()) {
            assert_eq!(*file, def.id.as_ref());
        }
    }

    #[test]
    fn catalog_order_matches_report_names() {
        let ids: Vec<ReportName> = catalog().iter().map(|def| def.id).collect();
        assert_eq!(ids, ReportName::all());
    }

    #[test]
    fn all_reports_have_titles_and_value_columns() {
        for def in catalog() {
            assert!(!def.title.is_empty(), "{}: title is empty", def.id);
            assert!(!def.columns.value.is_empty(), "{}: no value column", def.id);
        }
    }
}
