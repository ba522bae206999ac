//! Plain-text rendering of report output.

use crash_reports_report_models::ReportOutput;

/// Renders `output` as a title line followed by left-aligned columns.
///
/// Column names come from the first row; reports produce uniform rows.
pub fn render(output: &ReportOutput) -> String {
    let mut out = format!(
        "== {} ({} rows, {} scanned, {} filtered, {} skipped)\n",
        output.report,
        output.rows.len(),
        output.scanned,
        output.filtered,
        output.skipped
    );

    let Some(first) = output.rows.first() else {
        out.push_str("(no rows)");
        return out;
    };

    let headers: Vec<&str> = first.columns().map(|(name, _)| name).collect();
    let cells: Vec<Vec<String>> = output
        .rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| row.get(h).map(ToString::to_string).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let lines: Vec<String> = std::iter::once(line(headers.iter().copied(), &widths))
        .chain(cells.iter().map(|row| line(row.iter().map(String::as_str), &widths)))
        .collect();
    out.push_str(&lines.join("\n"));

    out
}

fn line<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    values
        .zip(widths)
        .map(|(v, w)| format!("{v:<w$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use crash_reports_report_models::{ReportName, ReportRow};

    use super::*;

    fn output(rows: Vec<ReportRow>) -> ReportOutput {
        ReportOutput {
            report: ReportName::TopDepartureOrigins,
            rows,
            scanned: 5,
            filtered: 2,
            skipped: 0,
        }
    }

    #[test]
    fn renders_aligned_columns() {
        let rendered = render(&output(vec![
            ReportRow::new().with("origin", "Paris").with("count", 2_i64),
            ReportRow::new().with("origin", "London").with("count", 1_i64),
        ]));

        assert_eq!(
            rendered,
            "== top_departure_origins (2 rows, 5 scanned, 2 filtered, 0 skipped)\n\
             origin  count\n\
             Paris   2\n\
             London  1"
        );
    }

    #[test]
    fn renders_empty_result() {
        let rendered = render(&output(Vec::new()));
        assert!(rendered.ends_with("(no rows)"));
    }
}
