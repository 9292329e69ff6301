//! ESRI world file georeferencing.
//!
//! A world file carries an affine pixel-to-world transform as six plain
//! numbers, one per line: x pixel size, y skew, x skew, y pixel size, then
//! the world coordinates of the CENTER of the top-left pixel. The
//! geotransform convention used everywhere else in this crate anchors the
//! top-left CORNER instead, so reading and writing shift by half a pixel.
//!
//! The sidecar extension derives from the raster's: its first and last
//! letters plus `w`, lowercased, so `tile.tif` pairs with `tile.tfw` and
//! `tile.png` with `tile.pgw`. Readers additionally accept the generic
//! `.wld` extension as a fallback.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::geo::GeoTransform;

/// Errors raised while reading or writing world files.
#[derive(Debug, Error)]
pub enum WorldFileError {
    /// Neither the derived nor the `.wld` sidecar exists.
    #[error("No world file found for '{}'", raster.display())]
    Missing { raster: PathBuf },

    /// A line could not be parsed as a number.
    #[error("World file '{}' line {line}: cannot parse '{text}' as a number", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        text: String,
    },

    /// Fewer than six values were present.
    #[error("World file '{}' holds {found} values, expected 6", path.display())]
    Truncated { path: PathBuf, found: usize },

    /// The transform steps zero distance per pixel on an axis.
    #[error("World file '{}' declares a zero pixel size", path.display())]
    ZeroPixelSize { path: PathBuf },

    /// The sidecar exists but could not be read or written.
    #[error("Cannot access world file '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Derived world file path for a raster.
pub fn world_file_path(raster: &Path) -> PathBuf {
    let extension = raster
        .extension()
        .and_then(OsStr::to_str)
        .and_then(derive_world_extension)
        .unwrap_or_else(|| "wld".to_string());
    raster.with_extension(extension)
}

/// First and last letter of the raster extension plus `w`, lowercased.
/// Extensions shorter than two letters fall back to `wld`.
fn derive_world_extension(extension: &str) -> Option<String> {
    let mut letters = extension.chars();
    let first = letters.next()?;
    let last = letters.next_back()?;
    Some(format!("{}{}w", first, last).to_lowercase())
}

/// Reads the world file paired with a raster.
///
/// The derived extension is tried first, then `.wld`.
///
/// # Errors
///
/// Returns `WorldFileError` if no sidecar exists, one exists but cannot be
/// read, or its contents do not form a usable transform.
pub fn read_world_file(raster: &Path) -> Result<GeoTransform, WorldFileError> {
    let derived = world_file_path(raster);
    let fallback = raster.with_extension("wld");
    for candidate in [&derived, &fallback] {
        match fs::read_to_string(candidate) {
            Ok(contents) => return parse_world_file(candidate, &contents),
            Err(source) if source.kind() == io::ErrorKind::NotFound => continue,
            Err(source) => {
                return Err(WorldFileError::Io {
                    path: candidate.clone(),
                    source,
                })
            }
        }
    }
    Err(WorldFileError::Missing {
        raster: raster.to_path_buf(),
    })
}

fn parse_world_file(path: &Path, contents: &str) -> Result<GeoTransform, WorldFileError> {
    let mut values = [0.0f64; 6];
    let mut found = 0;
    for (number, line) in contents.lines().enumerate() {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if found == 6 {
            // Trailing content is ignored once all six values are in
            break;
        }
        values[found] = text.parse().map_err(|_| WorldFileError::Malformed {
            path: path.to_path_buf(),
            line: number + 1,
            text: text.to_string(),
        })?;
        found += 1;
    }
    if found < 6 {
        return Err(WorldFileError::Truncated {
            path: path.to_path_buf(),
            found,
        });
    }

    let [a, d, b, e, c, f] = values;
    if a == 0.0 || e == 0.0 {
        return Err(WorldFileError::ZeroPixelSize {
            path: path.to_path_buf(),
        });
    }
    // Shift the pixel-center anchor back to the top-left corner
    Ok(GeoTransform::from_coefficients([
        c - 0.5 * a - 0.5 * b,
        a,
        b,
        f - 0.5 * d - 0.5 * e,
        d,
        e,
    ]))
}

/// Writes the world file paired with a raster and returns its path.
///
/// # Errors
///
/// Returns `WorldFileError::Io` if the sidecar cannot be written.
pub fn write_world_file(
    raster: &Path,
    transform: &GeoTransform,
) -> Result<PathBuf, WorldFileError> {
    let path = world_file_path(raster);
    let center_x =
        transform.origin_x + 0.5 * transform.pixel_width + 0.5 * transform.row_rotation;
    let center_y =
        transform.origin_y + 0.5 * transform.column_rotation + 0.5 * transform.pixel_height;
    let contents = format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n",
        transform.pixel_width,
        transform.column_rotation,
        transform.row_rotation,
        transform.pixel_height,
        center_x,
        center_y,
    );
    fs::write(&path, contents).map_err(|source| WorldFileError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
