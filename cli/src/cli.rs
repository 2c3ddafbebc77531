use std::path::PathBuf;

/// Zonal aggregation CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "zonal", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Aggregate an impact layer into zones and write the zone table
    Aggregate(AggregateArgs),

    /// Split a vector layer into per-zone fragments
    Preprocess(PreprocessArgs),
}

/// Inputs shared by every command.
#[derive(clap::Args, Debug)]
pub struct ZoneArgs {
    /// Zone layer (.geojson or .shp); omit for a single "Entire area" zone
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub zones: Option<PathBuf>,

    /// Working extent as xmin,ymin,xmax,ymax; defaults to the zone or impact extent
    #[arg(long, value_delimiter = ',', num_args = 4, allow_negative_numbers = true)]
    pub extent: Option<Vec<f64>>,

    /// Keyword store (JSON object of layer name -> keywords)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub keywords: Option<PathBuf>,

    /// Aggregation config (JSON)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct AggregateArgs {
    /// Impact layer (.geojson, .shp or .asc)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub impact: PathBuf,

    #[command(flatten)]
    pub zone: ZoneArgs,

    /// Hazard layer, defaults to the impact layer
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub hazard: Option<PathBuf>,

    /// Exposure layer, defaults to the impact layer
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub exposure: Option<PathBuf>,

    /// Use the native (scanline) raster strategy
    #[arg(long)]
    pub native: bool,

    /// Rename the sum field
    #[arg(long)]
    pub sum_field: Option<String>,

    /// Output zone table, defaults to "./aggregation.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Also write the zone layer as GeoJSON
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub geojson: Option<PathBuf>,

    /// Write the per-zone contribution records as JSON
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub contributions: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct PreprocessArgs {
    /// Vector layer to split (.geojson or .shp)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    #[command(flatten)]
    pub zone: ZoneArgs,

    /// Output GeoJSON file, defaults to "./preprocessed.geojson"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
