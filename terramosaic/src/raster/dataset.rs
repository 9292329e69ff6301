//! Opening raster files as mosaic sources.
//!
//! A source on disk is an image file plus up to three sidecars: the world
//! file for georeferencing (required), a `.prj` holding an opaque spatial
//! reference string (optional) and a `.aux.xml` carrying per-band nodata
//! (optional). Opening decodes the full image into a [`MemoryGrid`] and
//! folds the sidecars into a [`SourceDescriptor`].

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::pam;
use super::world_file::{read_world_file, WorldFileError};
use crate::grid::MemoryGrid;
use crate::source::{SourceDescriptor, SourceError};

/// Errors raised while opening a raster source.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The image file is missing or not decodable.
    #[error("Cannot open '{}'", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The world file is missing or unusable.
    #[error(transparent)]
    WorldFile(#[from] WorldFileError),

    /// The decoded raster fails descriptor validation.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The projection sidecar exists but could not be read.
    #[error("Cannot read projection sidecar '{}'", path.display())]
    Projection {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Opens one raster source: pixels, georeferencing and sidecar metadata.
///
/// # Arguments
///
/// * `path` - Image file with a world file next to it
///
/// # Errors
///
/// Returns `RasterError` if the image cannot be decoded, no world file is
/// found, or a sidecar is unreadable.
pub fn open_source(path: &Path) -> Result<(SourceDescriptor, MemoryGrid), RasterError> {
    let image = image::open(path).map_err(|source| RasterError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let transform = read_world_file(path)?;
    let grid = MemoryGrid::from_image(&image);

    let mut descriptor = SourceDescriptor::new(
        path.display().to_string(),
        transform,
        grid.width(),
        grid.height(),
        grid.band_count(),
    )?;
    if let Some(projection) = read_projection(path)? {
        descriptor = descriptor.with_spatial_ref(projection);
    }
    let nodata = pam::read_band_nodata(path, grid.band_count());
    if nodata.iter().any(Option::is_some) {
        descriptor = descriptor.with_band_nodata(nodata)?;
    }

    tracing::debug!(
        source = descriptor.name(),
        width = descriptor.width(),
        height = descriptor.height(),
        bands = descriptor.band_count(),
        "opened raster source"
    );
    Ok((descriptor, grid))
}

fn read_projection(path: &Path) -> Result<Option<String>, RasterError> {
    let sidecar = path.with_extension("prj");
    match std::fs::read_to_string(&sidecar) {
        Ok(contents) => {
            let trimmed = contents.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RasterError::Projection {
            path: sidecar,
            source,
        }),
    }
}
