//! Command line interface for TerraMosaic.
//!
//! Expands the input arguments, opens every source raster, delegates to
//! the mosaic engine with a progress bar attached, and writes the result
//! with its sidecars. Ctrl+C flips a shared flag that the progress
//! callback turns into a cooperative cancellation.

mod error;
mod progress;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use terramosaic::composite::MosaicInput;
use terramosaic::geo::BoundingBox;
use terramosaic::input::expand_inputs;
use terramosaic::mosaic::{mosaic, MosaicSpec};
use terramosaic::raster::{guard_destination, open_source, write_mosaic};
use terramosaic::reconcile::ResolutionPolicy;

use crate::error::CliError;
use crate::progress::ProgressReporter;

#[derive(Parser, Debug)]
#[command(name = "terramosaic")]
#[command(version = terramosaic::VERSION)]
#[command(about = "Assemble georeferenced rasters into a single mosaic", long_about = None)]
struct Cli {
    /// Input rasters in paint order: paths, glob patterns, or @FILE lists
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<String>,

    /// Destination image path
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Clip the mosaic to this extent, in georeferenced units
    #[arg(long, value_name = "XMIN,YMIN,XMAX,YMAX", allow_hyphen_values = true)]
    bbox: Option<BoundingBox>,

    /// Output resolution: same, average, highest, lowest, common, or an
    /// explicit X,Y pixel size
    #[arg(long, default_value = "same", value_name = "POLICY")]
    resolution: ResolutionPolicy,

    /// Align the output grid to multiples of the resolution
    #[arg(long)]
    target_aligned_pixels: bool,

    /// Select an input band by 1-based index; repeat to select and reorder
    #[arg(long = "band", value_name = "INDEX")]
    bands: Vec<usize>,

    /// Input pixel values to treat as transparent, comma separated per band
    #[arg(
        long,
        value_name = "VALUE[,VALUE...]",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    src_nodata: Option<Vec<f64>>,

    /// Nodata values advertised on the output, comma separated per band
    #[arg(
        long,
        value_name = "VALUE[,VALUE...]",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    dst_nodata: Option<Vec<f64>>,

    /// Fill uncovered cells with nodata but do not advertise the value
    #[arg(long)]
    hide_nodata: bool,

    /// Overwrite the destination if it already exists
    #[arg(long)]
    overwrite: bool,

    /// Output format token, for example png or gtiff; defaults to the
    /// destination extension
    #[arg(long = "of", value_name = "FORMAT")]
    format: Option<String>,

    /// Creation option as KEY=VALUE, for example DEPTH=16 or COMPRESS=best
    #[arg(long = "co", value_name = "KEY=VALUE")]
    creation_options: Vec<String>,

    /// Suppress the progress bar
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Increase log detail; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);
    if let Err(err) = run(&cli) {
        err.exit();
    }
}

/// Install a stderr subscriber honoring `RUST_LOG` over the flag-derived
/// default level.
fn init_logging(quiet: bool, verbose: u8) {
    let default_directive = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    // Fail on an existing destination before any source is opened.
    guard_destination(&cli.output, cli.overwrite)?;

    let cancelled = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancelled);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    let paths = expand_inputs(&cli.inputs)?;
    info!(inputs = paths.len(), "expanded input arguments");

    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        let (descriptor, grid) = open_source(path)?;
        sources.push(MosaicInput::new(descriptor, grid));
    }

    let spec = build_spec(cli);
    let reporter = ProgressReporter::new(cli.quiet, cancelled);
    let callback = reporter.callback();

    let outcome = mosaic(&sources, &spec, Some(&callback));
    reporter.finish();
    let result = outcome?;

    write_mosaic(
        &cli.output,
        &result,
        cli.format.as_deref(),
        &cli.creation_options,
    )?;
    Ok(())
}

fn build_spec(cli: &Cli) -> MosaicSpec {
    let mut spec = MosaicSpec::new()
        .with_resolution(cli.resolution)
        .with_target_aligned_pixels(cli.target_aligned_pixels)
        .with_hide_nodata(cli.hide_nodata);
    if let Some(bounds) = cli.bbox {
        spec = spec.with_bounds(bounds);
    }
    if !cli.bands.is_empty() {
        spec = spec.with_bands(cli.bands.clone());
    }
    if let Some(values) = &cli.src_nodata {
        spec = spec.with_src_nodata(values.clone());
    }
    if let Some(values) = &cli.dst_nodata {
        spec = spec.with_dst_nodata(values.clone());
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_inputs_then_output_split() {
        let cli = Cli::try_parse_from(["terramosaic", "a.png", "b.png", "out.png"]).unwrap();
        assert_eq!(cli.inputs, vec!["a.png", "b.png"]);
        assert_eq!(cli.output, PathBuf::from("out.png"));
    }

    #[test]
    fn test_single_input_is_enough() {
        let cli = Cli::try_parse_from(["terramosaic", "only.png", "out.png"]).unwrap();
        assert_eq!(cli.inputs, vec!["only.png"]);
    }

    #[test]
    fn test_output_alone_is_rejected() {
        assert!(Cli::try_parse_from(["terramosaic", "out.png"]).is_err());
    }

    #[test]
    fn test_bbox_parses_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "terramosaic",
            "--bbox",
            "-120,30,-119,31",
            "a.png",
            "out.png",
        ])
        .unwrap();
        let bbox = cli.bbox.unwrap();
        assert_eq!(bbox.min_x, -120.0);
        assert_eq!(bbox.max_y, 31.0);
    }

    #[test]
    fn test_resolution_defaults_to_same() {
        let cli = Cli::try_parse_from(["terramosaic", "a.png", "out.png"]).unwrap();
        assert_eq!(cli.resolution, ResolutionPolicy::Same);
    }

    #[test]
    fn test_resolution_accepts_explicit_pair() {
        let cli = Cli::try_parse_from(["terramosaic", "--resolution", "0.5,1", "a.png", "out.png"])
            .unwrap();
        assert_eq!(cli.resolution, ResolutionPolicy::Custom { x: 0.5, y: 1.0 });
    }

    #[test]
    fn test_band_flag_repeats_in_order() {
        let cli = Cli::try_parse_from([
            "terramosaic",
            "--band",
            "3",
            "--band",
            "2",
            "a.png",
            "out.png",
        ])
        .unwrap();
        assert_eq!(cli.bands, vec![3, 2]);
    }

    #[test]
    fn test_nodata_values_split_on_commas() {
        let cli = Cli::try_parse_from([
            "terramosaic",
            "--src-nodata",
            "0,-9999",
            "a.png",
            "out.png",
        ])
        .unwrap();
        assert_eq!(cli.src_nodata, Some(vec![0.0, -9999.0]));
        assert_eq!(cli.dst_nodata, None);
    }

    #[test]
    fn test_creation_options_accumulate() {
        let cli = Cli::try_parse_from([
            "terramosaic",
            "--co",
            "DEPTH=16",
            "--co",
            "COMPRESS=best",
            "a.png",
            "out.png",
        ])
        .unwrap();
        assert_eq!(cli.creation_options, vec!["DEPTH=16", "COMPRESS=best"]);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["terramosaic", "-q", "-v", "a.png", "out.png"]).is_err());
    }

    /// Only one test may call `run`, since the Ctrl+C handler can be
    /// installed once per process.
    #[test]
    fn test_run_mosaics_real_files() {
        use tempfile::TempDir;
        use terramosaic::align::OutputShape;
        use terramosaic::composite::MosaicBuffer;
        use terramosaic::geo::GeoTransform;
        use terramosaic::mosaic::MosaicResult;

        let dir = TempDir::new().unwrap();
        let west = dir.path().join("west.png");
        let east = dir.path().join("east.png");
        for (path, origin_x, value) in [(&west, 2.0, 50.0), (&east, 3.0, 200.0)] {
            let mut buffer = MosaicBuffer::filled(1, 1, &[0.0]);
            buffer.set(1, 0, 0, value);
            let tile = MosaicResult {
                shape: OutputShape {
                    width: 1,
                    height: 1,
                    transform: GeoTransform::north_up(origin_x, 49.0, 1.0, 1.0),
                },
                buffer,
                nodata: None,
                spatial_ref: None,
            };
            write_mosaic(path, &tile, None, &[]).unwrap();
        }

        let out = dir.path().join("mosaic.png");
        let cli = Cli::try_parse_from([
            "terramosaic",
            "-q",
            west.to_str().unwrap(),
            east.to_str().unwrap(),
            out.to_str().unwrap(),
        ])
        .unwrap();
        run(&cli).unwrap();
        assert!(out.exists());
        assert!(dir.path().join("mosaic.pgw").exists());
    }

    #[test]
    fn test_spec_carries_flags_through() {
        let cli = Cli::try_parse_from([
            "terramosaic",
            "--resolution",
            "highest",
            "--target-aligned-pixels",
            "--hide-nodata",
            "--dst-nodata",
            "255",
            "a.png",
            "out.png",
        ])
        .unwrap();
        let spec = build_spec(&cli);
        assert_eq!(spec.resolution, ResolutionPolicy::Highest);
        assert!(spec.target_aligned_pixels);
        assert!(spec.hide_nodata);
        assert_eq!(spec.dst_nodata, Some(vec![255.0]));
        assert_eq!(spec.bands, None);
    }
}
