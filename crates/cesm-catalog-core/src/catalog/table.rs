//! Arrow and CSV rendering of the catalog.

use std::{path::Path, sync::Arc};

use arrow::{
    array::{ArrayRef, RecordBatch, StringArray, UInt32Array},
    datatypes::{DataType, Field, Schema, SchemaRef},
    error::ArrowError,
};
use snafu::prelude::*;

use crate::{
    catalog::{
        entry::{COLUMNS, Catalog, CatalogEntry},
        error::{ArrowSnafu, CatalogResult, WriteSnafu},
    },
    storage::{StoreLocation, output::open_output_sink},
};

/// Arrow schema of the catalog table.
///
/// `vertical_levels` is a non-null `UInt32`; `component`, `experiment`,
/// `frequency`, `spatial_domain` and `path` are non-null strings; the rest
/// are nullable strings.
pub fn catalog_schema() -> SchemaRef {
    let fields = COLUMNS.iter().map(|name| match *name {
        "vertical_levels" => Field::new(*name, DataType::UInt32, false),
        "component" | "experiment" | "frequency" | "spatial_domain" | "path" => {
            Field::new(*name, DataType::Utf8, false)
        }
        _ => Field::new(*name, DataType::Utf8, true),
    });
    Arc::new(Schema::new(fields.collect::<Vec<_>>()))
}

impl Catalog {
    /// Convert the catalog into a single record batch with
    /// [`catalog_schema`].
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let entries = self.entries();
        let strings = |cell: fn(&CatalogEntry) -> Option<&str>| -> ArrayRef {
            Arc::new(entries.iter().map(cell).collect::<StringArray>())
        };

        let columns: Vec<ArrayRef> = vec![
            strings(|e| e.variable.as_deref()),
            strings(|e| e.long_name.as_deref()),
            strings(|e| Some(e.component.as_str())),
            strings(|e| Some(e.experiment.as_str())),
            strings(|e| Some(e.frequency.as_str())),
            Arc::new(UInt32Array::from_iter_values(
                entries.iter().map(|e| e.vertical_levels),
            )),
            strings(|e| Some(e.spatial_domain)),
            strings(|e| e.units.as_deref()),
            strings(|e| e.start_time.as_deref()),
            strings(|e| e.end_time.as_deref()),
            strings(|e| Some(e.path.as_str())),
        ];

        RecordBatch::try_new(catalog_schema(), columns)
    }
}

/// Write `catalog` as CSV to `rel_path` inside the local `location`.
///
/// The header row is always written. Null cells become empty fields. The
/// target is replaced atomically.
pub async fn write_catalog_csv(
    location: &StoreLocation,
    rel_path: &Path,
    catalog: &Catalog,
) -> CatalogResult<()> {
    let target = location.display_path(rel_path);
    let batch = catalog.to_record_batch().context(ArrowSnafu)?;

    let sink = open_output_sink(location, rel_path)
        .await
        .context(WriteSnafu {
            path: target.as_str(),
        })?;

    let mut writer = arrow_csv::WriterBuilder::new()
        .with_header(true)
        .build(sink);
    writer.write(&batch).context(ArrowSnafu)?;

    writer
        .into_inner()
        .finish()
        .await
        .context(WriteSnafu {
            path: target.as_str(),
        })?;

    log::info!("wrote {} catalog rows to {target}", catalog.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        layout::{Component, Frequency, PartitionKey},
        storage::ObjectPath,
    };

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn monthly_entry() -> CatalogEntry {
        CatalogEntry {
            variable: Some("SST".to_string()),
            long_name: Some("potential temperature".to_string()),
            component: Component::Ocean,
            experiment: "HIST".to_string(),
            frequency: Frequency::new("monthly"),
            vertical_levels: 1,
            spatial_domain: "global_ocean",
            units: Some("degC".to_string()),
            start_time: Some("1920-01-16 12:00:00".to_string()),
            end_time: Some("2005-12-16 12:00:00".to_string()),
            path: "s3://ncar-cesm-lens/ocn/monthly/cesmLE-HIST-SST.zarr".to_string(),
        }
    }

    #[test]
    fn record_batch_matches_schema() -> TestResult {
        let catalog: Catalog = vec![monthly_entry()].into_iter().collect();
        let batch = catalog.to_record_batch()?;
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), COLUMNS.len());

        let names: Vec<&str> = batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(names, COLUMNS);
        assert_eq!(
            batch.schema_ref().field(5).data_type(),
            &DataType::UInt32
        );
        Ok(())
    }

    #[tokio::test]
    async fn csv_has_header_and_empty_nulls() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StoreLocation::local(tmp.path());

        let key = PartitionKey::parse(&ObjectPath::from("atm/static/grid.zarr"))?;
        let mut catalog: Catalog = vec![monthly_entry()].into_iter().collect();
        let statics = CatalogEntry::static_entries(&key, "s3://b/atm/static/grid.zarr");
        catalog.extend(statics.into_iter().take(1));

        write_catalog_csv(&location, Path::new("aws-cesm1-le.csv"), &catalog).await?;

        let csv = std::fs::read_to_string(tmp.path().join("aws-cesm1-le.csv"))?;
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "variable,long_name,component,experiment,frequency,vertical_levels,\
                 spatial_domain,units,start_time,end_time,path",
                "SST,potential temperature,ocn,HIST,monthly,1,global_ocean,degC,\
                 1920-01-16 12:00:00,2005-12-16 12:00:00,\
                 s3://ncar-cesm-lens/ocn/monthly/cesmLE-HIST-SST.zarr",
                ",,atm,CTRL,static,1,global,,,,s3://b/atm/static/grid.zarr",
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_catalog_still_has_header() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StoreLocation::local(tmp.path());
        write_catalog_csv(&location, Path::new("out/c.csv"), &Catalog::new()).await?;

        let csv = std::fs::read_to_string(tmp.path().join("out/c.csv"))?;
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("variable,long_name,"));
        Ok(())
    }

    #[tokio::test]
    async fn rewrite_is_byte_identical() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StoreLocation::local(tmp.path());
        let catalog: Catalog = vec![monthly_entry()].into_iter().collect();
        let rel = Path::new("c.csv");

        write_catalog_csv(&location, rel, &catalog).await?;
        let first = std::fs::read(tmp.path().join(rel))?;
        write_catalog_csv(&location, rel, &catalog).await?;
        assert_eq!(std::fs::read(tmp.path().join(rel))?, first);
        Ok(())
    }
}
