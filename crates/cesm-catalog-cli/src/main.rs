//! CLI tool that builds the CESM LENS intake catalog.

mod error;
mod preview;

use std::{io::Write, path::PathBuf};

use cesm_catalog_core::{
    Store, StoreLocation, build_catalog, entries_for_partition,
    storage::{DEFAULT_BUCKET, DEFAULT_REGION, ObjectPath},
    touch_last_updated, write_catalog_csv,
};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use snafu::ResultExt;

use crate::{
    error::{
        BuildCatalogSnafu, CliResult, InspectSnafu, InvalidStoreSnafu, OpenStoreSnafu,
        OutputSnafu, SidecarSnafu, WriteCatalogSnafu,
    },
    preview::{render_entries, write_build_summary},
};

#[derive(Debug, Subcommand)]
enum Command {
    /// Walk the bucket, write the catalog CSV and refresh the sidecar timestamp
    Build {
        /// Bucket name, s3:// URL, or local directory with the same layout
        #[arg(default_value = DEFAULT_BUCKET)]
        bucket: String,

        /// AWS region of the bucket
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,

        /// Catalog CSV to (re)write
        #[arg(long, default_value = "aws-cesm1-le.csv")]
        catalog: PathBuf,

        /// Existing JSON sidecar whose last_updated field is refreshed
        #[arg(long, default_value = "aws-cesm1-le.json")]
        sidecar: PathBuf,

        /// Print the first N catalog rows as a table
        #[arg(long, default_value_t = 0)]
        preview: usize,
    },

    /// Print the catalog rows of one partition (e.g. ocn/monthly/x.zarr); nothing is written
    Inspect {
        partition: String,

        #[arg(long, default_value = DEFAULT_BUCKET)]
        bucket: String,

        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,
    },
}

#[derive(Debug, Parser)]
#[command(name = "cesmcat", version, about)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace); warnings are always shown
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .ok();
}

fn open_store(bucket: &str, region: &str) -> CliResult<Store> {
    let location = StoreLocation::parse(bucket)
        .context(InvalidStoreSnafu)?
        .with_region(region);

    Store::open(location.clone()).context(OpenStoreSnafu {
        location: location.to_string(),
    })
}

async fn cmd_build(
    bucket: &str,
    region: &str,
    catalog: PathBuf,
    sidecar: PathBuf,
    preview: usize,
) -> CliResult<()> {
    let store = open_store(bucket, region)?;
    let report = build_catalog(&store).await.context(BuildCatalogSnafu {
        location: store.location().to_string(),
    })?;

    // Output paths are taken relative to the working directory.
    let out = StoreLocation::local("");

    write_catalog_csv(&out, &catalog, &report.catalog)
        .await
        .context(WriteCatalogSnafu {
            path: catalog.display().to_string(),
        })?;

    let last_updated = touch_last_updated(&out, &sidecar, Utc::now())
        .await
        .context(SidecarSnafu {
            path: sidecar.display().to_string(),
        })?;

    let mut stdout = std::io::stdout().lock();
    write_build_summary(
        &report,
        &catalog.display().to_string(),
        &last_updated,
        preview,
        &mut stdout,
    )
}

async fn cmd_inspect(partition: &str, bucket: &str, region: &str) -> CliResult<()> {
    let store = open_store(bucket, region)?;
    let key = ObjectPath::from(partition.trim_matches('/'));

    let entries = entries_for_partition(&store, &key)
        .await
        .context(InspectSnafu { partition })?;

    let mut stdout = std::io::stdout().lock();
    if let Some(rendered) = render_entries(key.as_ref(), &entries, entries.len()) {
        writeln!(stdout, "{rendered}").context(OutputSnafu)?;
    }
    writeln!(stdout, "{} rows", entries.len()).context(OutputSnafu)?;
    Ok(())
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Command::Build {
            bucket,
            region,
            catalog,
            sidecar,
            preview,
        } => cmd_build(&bucket, &region, catalog, sidecar, preview).await,
        Command::Inspect {
            partition,
            bucket,
            region,
        } => cmd_inspect(&partition, &bucket, &region).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
