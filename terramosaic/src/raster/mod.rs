//! Raster file access: opening sources and writing mosaics.
//!
//! Georeferencing travels in sidecar files next to the image rather than
//! inside it, which keeps the engine format-agnostic: any image the
//! decoder understands becomes a mosaic source once a world file sits
//! next to it. Optional `.prj` and `.aux.xml` sidecars carry the spatial
//! reference and per-band nodata.

mod dataset;
mod pam;
mod world_file;
mod writer;

pub use dataset::{open_source, RasterError};
pub use world_file::{read_world_file, world_file_path, write_world_file, WorldFileError};
pub use writer::{guard_destination, write_mosaic, WriteError};
