//! Command line interface.

pub mod command;

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{command, Args, Parser, Subcommand};
use indicatif::ProgressBar;

use crate::fetch::DEFAULT_CONCURRENCY;
use crate::plan::{BoundingBox, Product};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch monthly forcing files (surface or pressure levels)
    Fetch(FetchArgs),
    /// Fetch the monthly-means correction series
    Means(MeansArgs),
    /// Merge monthly files into one time-ordered series
    Merge(MergeArgs),
}

#[derive(Args)]
pub struct FetchArgs {
    /// First date of the forcing period, YYYY-MM-DD
    #[arg(long)]
    pub start: NaiveDate,

    /// Last date of the forcing period, YYYY-MM-DD
    #[arg(long)]
    pub end: NaiveDate,

    /// Directory monthly files are written to
    #[arg(long)]
    pub dir: PathBuf,

    #[command(flatten)]
    pub bbox: BboxArgs,

    /// Forcing time step in hours: 1, 3 or 6
    #[arg(long, default_value_t = 1)]
    pub step: u8,

    /// `surf` for the single-level archive, `plev` for pressure levels
    #[arg(long)]
    pub kind: String,

    /// Pressure levels in hPa, required with `--kind plev`
    #[arg(long, value_delimiter = ',')]
    pub levels: Option<Vec<u32>>,

    /// Model run to request
    #[arg(long, value_enum, default_value_t = Product::Reanalysis)]
    pub product: Product,

    /// Maximum number of requests in flight
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Fetch missing files without asking for confirmation
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct MeansArgs {
    /// First date of the forcing period, YYYY-MM-DD
    #[arg(long)]
    pub start: NaiveDate,

    /// Last date of the forcing period, YYYY-MM-DD
    #[arg(long)]
    pub end: NaiveDate,

    /// Directory the series is written to
    #[arg(long)]
    pub dir: PathBuf,

    #[command(flatten)]
    pub bbox: BboxArgs,
}

#[derive(Args)]
pub struct MergeArgs {
    /// Directory holding the monthly files
    #[arg(long)]
    pub dir: PathBuf,

    /// File name prefix to merge, e.g. SURF or PLEV
    #[arg(long)]
    pub prefix: String,

    /// Concatenate along a record dimension (ensemble files)
    #[arg(long)]
    pub record_dim: bool,
}

#[derive(Args)]
pub struct BboxArgs {
    /// North edge of the bounding box, decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub north: f64,

    /// South edge of the bounding box, decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub south: f64,

    /// East edge of the bounding box, decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub east: f64,

    /// West edge of the bounding box, decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub west: f64,
}

impl BboxArgs {
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            north: self.north,
            south: self.south,
            east: self.east,
            west: self.west,
        }
    }
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}
