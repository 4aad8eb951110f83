use std::io::Write;

use cesm_catalog_core::{BuildReport, COLUMNS, CatalogEntry};
use snafu::ResultExt;
use tabled::{
    builder::Builder,
    settings::{Style, object::Rows, style::LineText, width::MinWidth},
};

use crate::error::{CliResult, OutputSnafu};

fn render_table(label: &str, rows: &[[String; 11]]) -> String {
    const LABEL_OFFSET: usize = 6;
    let min_width = LABEL_OFFSET + label.len() + 4;

    let mut builder = Builder::default();
    builder.push_record(COLUMNS);
    for row in rows {
        builder.push_record(row.iter().map(String::as_str));
    }

    let mut table = builder.build();

    table.with(Style::rounded());
    table.with(MinWidth::new(min_width));
    table.with(LineText::new(label, Rows::first()).offset(LABEL_OFFSET));
    // LineText re-estimates dimensions, so re-apply MinWidth afterwards.
    table.with(MinWidth::new(min_width));
    table.to_string()
}

fn row(entry: &CatalogEntry) -> [String; 11] {
    entry.cells().map(Option::unwrap_or_default)
}

/// Render up to `limit` entries as a table; `None` when there is nothing
/// to show.
pub fn render_entries(label: &str, entries: &[CatalogEntry], limit: usize) -> Option<String> {
    if limit == 0 || entries.is_empty() {
        return None;
    }
    let rows: Vec<[String; 11]> = entries.iter().take(limit).map(row).collect();
    Some(render_table(label, &rows))
}

/// Print the skip list, optional preview and summary of a finished build.
pub fn write_build_summary<W: Write>(
    report: &BuildReport,
    catalog_path: &str,
    last_updated: &str,
    preview: usize,
    out: &mut W,
) -> CliResult<()> {
    let entries = report.catalog.entries();
    if let Some(rendered) = render_entries("Catalog preview", entries, preview) {
        writeln!(out, "{rendered}").context(OutputSnafu)?;
    }

    for skipped in &report.skipped {
        writeln!(out, "skipped: {} ({})", skipped.path, skipped.reason).context(OutputSnafu)?;
    }

    writeln!(
        out,
        "wrote {} rows to {catalog_path} ({} partitions skipped)",
        entries.len(),
        report.skipped.len()
    )
    .context(OutputSnafu)?;
    writeln!(out, "last_updated: {last_updated}").context(OutputSnafu)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use cesm_catalog_core::{Catalog, PartitionKey, SkippedPartition, storage::ObjectPath};

    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn static_entries() -> Result<Vec<CatalogEntry>, Box<dyn std::error::Error>> {
        let key = PartitionKey::parse(&ObjectPath::from("ice_sh/static/grid.zarr"))?;
        Ok(CatalogEntry::static_entries(&key, "s3://b/ice_sh/static/grid.zarr"))
    }

    #[test]
    fn render_entries_limits_rows() -> TestResult {
        let entries = static_entries()?;
        let rendered = render_entries("Catalog preview", &entries, 2).ok_or("no table")?;
        assert!(rendered.contains("Catalog preview"));
        assert!(rendered.contains("southern_hemisphere"));
        assert!(rendered.contains("CTRL"));
        assert!(rendered.contains("HIST"));
        assert!(!rendered.contains("RCP85"));
        Ok(())
    }

    #[test]
    fn render_entries_skips_empty() -> TestResult {
        assert!(render_entries("x", &static_entries()?, 0).is_none());
        assert!(render_entries("x", &[], 5).is_none());
        Ok(())
    }

    #[test]
    fn summary_lists_skips() -> TestResult {
        let report = BuildReport {
            catalog: static_entries()?.into_iter().collect::<Catalog>(),
            skipped: vec![SkippedPartition {
                path: "s3://b/ocn/monthly/bad.zarr".to_string(),
                reason: "no suffix".to_string(),
            }],
        };

        let mut out = Vec::new();
        write_build_summary(&report, "c.csv", "2020-01-01T00:00:00Z", 0, &mut out)?;
        let text = String::from_utf8(out)?;
        assert_eq!(
            text,
            "skipped: s3://b/ocn/monthly/bad.zarr (no suffix)\n\
             wrote 4 rows to c.csv (1 partitions skipped)\n\
             last_updated: 2020-01-01T00:00:00Z\n"
        );
        Ok(())
    }
}
