//! Writing finished mosaics to disk.
//!
//! The writer renders the painted `f64` buffer into an image of 1 to 4
//! bands, encodes it in the requested format and lays the georeferencing
//! sidecars down next to it: the world file always, `.prj` when the
//! sources declared a spatial reference and `.aux.xml` when the mosaic
//! advertises nodata. Creation options tune the rendering: `DEPTH=8|16`
//! picks the sample type and `COMPRESS=fast|default|best` the PNG
//! compression level.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, ImageBuffer, ImageFormat, Pixel};
use thiserror::Error;

use super::pam;
use super::world_file::{write_world_file, WorldFileError};
use crate::mosaic::MosaicResult;

/// Errors raised while writing a mosaic.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The destination exists and overwriting was not requested.
    #[error(
        "File '{}' already exists. Specify the --overwrite option to overwrite it",
        path.display()
    )]
    DestinationExists { path: PathBuf },

    /// No image format could be derived from the name or token.
    #[error("Cannot determine an output format for '{name}'")]
    UnknownFormat { name: String },

    /// More bands than any supported pixel layout.
    #[error("Cannot write a {bands}-band mosaic; supported band counts are 1 to 4")]
    UnsupportedBandCount { bands: usize },

    /// A recognized creation option carries an unusable value.
    #[error("Unsupported value '{value}' for creation option {key}")]
    CreationOption { key: &'static str, value: String },

    /// The mosaic is larger than the image encoder can address.
    #[error("Mosaic dimensions {width}x{height} exceed what the image encoder supports")]
    Dimensions { width: usize, height: usize },

    /// The destination could not be created or written.
    #[error("Cannot write '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding the pixel data failed.
    #[error("Cannot encode '{}'", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The world file sidecar could not be written.
    #[error(transparent)]
    WorldFile(#[from] WorldFileError),
}

/// Refuses to clobber an existing destination unless overwriting was
/// requested.
///
/// # Errors
///
/// Returns `WriteError::DestinationExists` when the path exists and
/// `overwrite` is false.
pub fn guard_destination(path: &Path, overwrite: bool) -> Result<(), WriteError> {
    if !overwrite && path.exists() {
        return Err(WriteError::DestinationExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Writes a mosaic and its sidecars.
///
/// # Arguments
///
/// * `path` - Destination image path
/// * `result` - Finished mosaic to render
/// * `format` - Format token overriding the path extension, for example
///   `png` or `gtiff`
/// * `creation_options` - `KEY=VALUE` pairs; unrecognized keys are
///   ignored with a warning
///
/// # Errors
///
/// Returns `WriteError` if the format or options are unusable, the band
/// count has no pixel layout, or any file cannot be written.
pub fn write_mosaic(
    path: &Path,
    result: &MosaicResult,
    format: Option<&str>,
    creation_options: &[String],
) -> Result<(), WriteError> {
    let format = resolve_format(path, format)?;
    let options = parse_creation_options(creation_options)?;
    let image = render_image(result, options.depth)?;

    match (format, options.compression) {
        (ImageFormat::Png, Some(compression)) => {
            let file = File::create(path).map_err(|source| WriteError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let encoder =
                PngEncoder::new_with_quality(BufWriter::new(file), compression, PngFilter::Adaptive);
            image
                .write_with_encoder(encoder)
                .map_err(|source| WriteError::Encode {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            if options.compression.is_some() {
                tracing::warn!(format = ?format, "COMPRESS applies to png output only, ignoring");
            }
            image
                .save_with_format(path, format)
                .map_err(|source| WriteError::Encode {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
    }

    write_world_file(path, &result.shape.transform)?;
    write_projection(path, result.spatial_ref.as_deref())?;
    write_nodata(path, result.nodata.as_deref())?;

    tracing::info!(
        path = %path.display(),
        width = result.shape.width,
        height = result.shape.height,
        bands = result.band_count(),
        "wrote mosaic"
    );
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleDepth {
    Eight,
    Sixteen,
}

struct CreationOptions {
    depth: SampleDepth,
    compression: Option<CompressionType>,
}

fn parse_creation_options(options: &[String]) -> Result<CreationOptions, WriteError> {
    let mut parsed = CreationOptions {
        depth: SampleDepth::Eight,
        compression: None,
    };
    for option in options {
        let Some((key, value)) = option.split_once('=') else {
            tracing::warn!(option = %option, "ignoring creation option without '='");
            continue;
        };
        match key.trim().to_ascii_uppercase().as_str() {
            "DEPTH" => {
                parsed.depth = match value.trim() {
                    "8" => SampleDepth::Eight,
                    "16" => SampleDepth::Sixteen,
                    other => {
                        return Err(WriteError::CreationOption {
                            key: "DEPTH",
                            value: other.to_string(),
                        })
                    }
                };
            }
            "COMPRESS" => {
                parsed.compression = Some(match value.trim().to_ascii_lowercase().as_str() {
                    "fast" => CompressionType::Fast,
                    "default" => CompressionType::Default,
                    "best" => CompressionType::Best,
                    other => {
                        return Err(WriteError::CreationOption {
                            key: "COMPRESS",
                            value: other.to_string(),
                        })
                    }
                });
            }
            _ => tracing::warn!(option = %option, "ignoring unsupported creation option"),
        }
    }
    Ok(parsed)
}

fn resolve_format(path: &Path, format: Option<&str>) -> Result<ImageFormat, WriteError> {
    match format {
        Some(name) => {
            // GIS tooling spells TIFF output "GTiff"
            if name.eq_ignore_ascii_case("gtiff") {
                return Ok(ImageFormat::Tiff);
            }
            ImageFormat::from_extension(name).ok_or_else(|| WriteError::UnknownFormat {
                name: name.to_string(),
            })
        }
        None => ImageFormat::from_path(path).map_err(|_| WriteError::UnknownFormat {
            name: path.display().to_string(),
        }),
    }
}

fn render_image(result: &MosaicResult, depth: SampleDepth) -> Result<DynamicImage, WriteError> {
    let width = checked_dimension(result.shape.width, result)?;
    let height = checked_dimension(result.shape.height, result)?;
    let bands = result.band_count();

    let image = match depth {
        SampleDepth::Eight => {
            let data = interleave(result, |v| v.round().clamp(0.0, 255.0) as u8);
            match bands {
                1 => DynamicImage::ImageLuma8(raw_buffer(width, height, data)?),
                2 => DynamicImage::ImageLumaA8(raw_buffer(width, height, data)?),
                3 => DynamicImage::ImageRgb8(raw_buffer(width, height, data)?),
                4 => DynamicImage::ImageRgba8(raw_buffer(width, height, data)?),
                bands => return Err(WriteError::UnsupportedBandCount { bands }),
            }
        }
        SampleDepth::Sixteen => {
            let data = interleave(result, |v| v.round().clamp(0.0, 65535.0) as u16);
            match bands {
                1 => DynamicImage::ImageLuma16(raw_buffer(width, height, data)?),
                2 => DynamicImage::ImageLumaA16(raw_buffer(width, height, data)?),
                3 => DynamicImage::ImageRgb16(raw_buffer(width, height, data)?),
                4 => DynamicImage::ImageRgba16(raw_buffer(width, height, data)?),
                bands => return Err(WriteError::UnsupportedBandCount { bands }),
            }
        }
    };
    Ok(image)
}

fn checked_dimension(value: usize, result: &MosaicResult) -> Result<u32, WriteError> {
    u32::try_from(value).map_err(|_| WriteError::Dimensions {
        width: result.shape.width,
        height: result.shape.height,
    })
}

/// Interleaves band-planar samples into pixel order.
fn interleave<T>(result: &MosaicResult, convert: impl Fn(f64) -> T) -> Vec<T> {
    let pixels = result.shape.width * result.shape.height;
    let bands: Vec<&[f64]> = (1..=result.band_count())
        .map(|band| result.buffer.band(band))
        .collect();
    let mut data = Vec::with_capacity(pixels * bands.len());
    for index in 0..pixels {
        for band in &bands {
            data.push(convert(band[index]));
        }
    }
    data
}

fn raw_buffer<P: Pixel>(
    width: u32,
    height: u32,
    data: Vec<P::Subpixel>,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, WriteError> {
    ImageBuffer::from_raw(width, height, data).ok_or(WriteError::Dimensions {
        width: width as usize,
        height: height as usize,
    })
}

fn write_projection(path: &Path, spatial_ref: Option<&str>) -> Result<(), WriteError> {
    let sidecar = path.with_extension("prj");
    match spatial_ref {
        Some(projection) => {
            std::fs::write(&sidecar, projection).map_err(|source| WriteError::Io {
                path: sidecar.clone(),
                source,
            })
        }
        None => {
            remove_stale(&sidecar);
            Ok(())
        }
    }
}

fn write_nodata(path: &Path, nodata: Option<&[f64]>) -> Result<(), WriteError> {
    match nodata {
        Some(values) => {
            pam::write_band_nodata(path, values).map_err(|source| WriteError::Io {
                path: pam::pam_path(path),
                source,
            })?;
            Ok(())
        }
        None => {
            remove_stale(&pam::pam_path(path));
            Ok(())
        }
    }
}

/// Drops a sidecar left over from an earlier write of the same path.
fn remove_stale(path: &Path) {
    if let Err(source) = std::fs::remove_file(path) {
        if source.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                path = %path.display(),
                error = %source,
                "could not remove stale sidecar"
            );
        }
    }
}
