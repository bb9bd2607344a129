//! Command line front end of the landmask crate.
//!
//! ```bash
//! # download the published GSHHG assets into $LANDMASK_DATA_DIR and check their digests
//! landmask fetch --provider gshhg
//!
//! # rebuild the OSM index from assets/osm.wkb[.xz]
//! landmask rasterize --provider osm
//!
//! # an ocean mask is not the provider's index, so it goes elsewhere
//! landmask rasterize --provider osm --invert --output osm_ocean.lmsk
//!
//! # convert an old one-byte-per-cell raster
//! landmask compress --input gshhg_mask.bin --nx 86400 --ny 43200 --output gshhg_mask.lmsk
//!
//! landmask query --lon 15.0 --lat 65.6
//! landmask info --provider gshhg
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use landmask::{
    CompressedIndex, DenseRaster, GeometrySource, Grid, Landmask, LandmaskConfig, Provider,
    RasterBuilder,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "landmask")]
#[command(about = "Build, inspect and query land/ocean masks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download a provider's published assets and verify their SHA-256 digests
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// Download again even when a verified copy is present
        #[arg(long)]
        force: bool,
    },

    /// Rasterize a provider's WKB geometry into its index file
    Rasterize {
        #[command(flatten)]
        source: SourceArgs,

        /// Grid columns, defaults to the provider's grid
        #[arg(long, requires = "ny")]
        nx: Option<u32>,

        /// Grid rows, defaults to the provider's grid
        #[arg(long, requires = "nx")]
        ny: Option<u32>,

        /// Burn the ocean instead of the land
        #[arg(long)]
        invert: bool,

        /// Write the index xz compressed
        #[arg(long)]
        xz: bool,

        /// Write the index here instead of the provider's index file. Required with --invert or
        /// a custom grid, which do not produce the provider's index
        #[arg(long, conflicts_with = "xz")]
        output: Option<PathBuf>,

        /// Also write the raster in the legacy one-byte-per-cell format
        #[arg(long)]
        dense_out: Option<PathBuf>,
    },

    /// Convert a legacy one-byte-per-cell raster into an index
    Compress {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        nx: u32,

        #[arg(long)]
        ny: u32,

        #[arg(long)]
        output: PathBuf,
    },

    /// Tell whether a point is on land
    Query {
        #[command(flatten)]
        source: SourceArgs,

        /// Longitude in decimal degrees, wrapped around the globe
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
    },

    /// Print the grid and encoding statistics of a provider's index
    Info {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// gshhg or osm
    #[arg(long, default_value_t = Provider::default())]
    provider: Provider,

    /// Directory holding the provider files
    #[arg(long, env = "LANDMASK_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

impl SourceArgs {
    fn config(&self) -> LandmaskConfig {
        let config = LandmaskConfig::from_env();
        match &self.data_dir {
            Some(dir) => config.with_data_dir(dir),
            None => config,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("landmask=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Fetch { source, force } => fetch(&source, force),
        Command::Rasterize {
            source,
            nx,
            ny,
            invert,
            xz,
            output,
            dense_out,
        } => {
            let grid = match (nx, ny) {
                (Some(nx), Some(ny)) => grid(nx, ny)?,
                _ => source.provider.grid(),
            };
            check_output(source.provider, grid, invert, output.as_deref())?;
            rasterize(&source, grid, invert, xz, output, dense_out)
        }
        Command::Compress {
            input,
            nx,
            ny,
            output,
        } => compress(input, grid(nx, ny)?, output),
        Command::Query { source, lon, lat } => {
            let mask = Landmask::with_config(source.provider, &source.config())?;
            let on_land = mask
                .contains(lon, lat)
                .with_context(|| format!("querying ({}, {})", lon, lat))?;
            println!("{}", if on_land { "land" } else { "ocean" });
            Ok(())
        }
        Command::Info { source } => {
            let config = source.config();
            let index = GeometrySource::new(source.provider, &config)
                .index(source.provider.grid())
                .with_context(|| format!("loading {} index", source.provider))?;
            println!("{}", serde_json::to_string_pretty(&index.stats())?);
            Ok(())
        }
    }
}

fn grid(nx: u32, ny: u32) -> Result<Grid> {
    match Grid::try_new(nx, ny) {
        Some(grid) => Ok(grid),
        None => bail!("grid dimensions must be non-zero, got {}x{}", nx, ny),
    }
}

/// Only the provider's own land mask may replace its index file.
fn check_output(provider: Provider, grid: Grid, invert: bool, output: Option<&Path>) -> Result<()> {
    if output.is_none() {
        if invert {
            bail!("--invert builds an ocean mask, pass --output to choose where it goes");
        }
        if grid != provider.grid() {
            bail!(
                "{} is not the {} grid ({}), pass --output to choose where the index goes",
                grid,
                provider,
                provider.grid()
            );
        }
    }
    Ok(())
}

fn fetch(args: &SourceArgs, force: bool) -> Result<()> {
    let source = GeometrySource::new(args.provider, &args.config());
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(600))
        .build()
        .context("creating HTTP client")?;

    for asset in source.assets() {
        if !force && source.check_asset(asset).is_ok() {
            info!(file = asset.file_name, "verified copy present");
            continue;
        }

        let url = asset.url();
        info!(%url, "downloading");
        let bytes = client
            .get(&url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .with_context(|| format!("downloading {}", url))?;

        let path = source
            .install(asset, &bytes)
            .with_context(|| format!("installing {}", asset.file_name))?;
        info!(path = %path.display(), bytes = bytes.len(), "installed asset");
    }
    Ok(())
}

fn rasterize(
    args: &SourceArgs,
    grid: Grid,
    invert: bool,
    xz: bool,
    output: Option<PathBuf>,
    dense_out: Option<PathBuf>,
) -> Result<()> {
    let source = GeometrySource::new(args.provider, &args.config()).compress(xz);
    let geometry = source
        .geometry()
        .with_context(|| format!("reading {} geometry", args.provider))?;

    let start = Instant::now();
    let raster = RasterBuilder::new(grid).invert(invert).build(&geometry)?;
    info!(elapsed = ?start.elapsed(), "rasterized {}", args.provider);

    if let Some(path) = dense_out {
        fs::write(&path, raster.to_bytes())
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote dense raster");
    }

    let index = CompressedIndex::from_dense(&raster);
    let path = match output {
        Some(path) => {
            write_index_file(&index, &path)?;
            path
        }
        None => source.write_index(&index)?,
    };
    info!(
        path = %path.display(),
        cells = index.cardinality(),
        bytes = index.serialized_size(),
        "wrote index"
    );
    Ok(())
}

fn compress(input: PathBuf, grid: Grid, output: PathBuf) -> Result<()> {
    let bytes = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
    let raster = DenseRaster::from_bytes(grid, &bytes)
        .with_context(|| format!("decoding {}", input.display()))?;
    let index = CompressedIndex::from_dense(&raster);

    write_index_file(&index, &output)?;
    info!(
        path = %output.display(),
        cells = index.cardinality(),
        bytes = index.serialized_size(),
        "wrote index"
    );
    Ok(())
}

fn write_index_file(index: &CompressedIndex, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    index.serialize_into(&mut writer)?;
    writer.flush()?;
    Ok(())
}
