//! TerraMosaic - Assembling georeferenced rasters into one seamless grid
//!
//! This library takes any number of overlapping georeferenced rasters and
//! paints them onto a single regular output grid, reconciling resolution,
//! extent, band layout and nodata along the way. Georeferencing comes
//! from world file sidecars, so any image the decoder understands can be
//! a source.
//!
//! # High-Level API
//!
//! For most use cases, the [`mosaic`] module is the entry point:
//!
//! ```ignore
//! use terramosaic::composite::MosaicInput;
//! use terramosaic::mosaic::{mosaic, MosaicSpec};
//! use terramosaic::raster::{open_source, write_mosaic};
//!
//! let mut inputs = Vec::new();
//! for path in ["tiles/n49e002.png", "tiles/n49e003.png"] {
//!     let (descriptor, grid) = open_source(Path::new(path))?;
//!     inputs.push(MosaicInput::new(descriptor, grid));
//! }
//! let result = mosaic(&inputs, &MosaicSpec::default(), None)?;
//! write_mosaic(Path::new("mosaic.png"), &result, None, &[])?;
//! ```

pub mod align;
pub mod bands;
pub mod composite;
pub mod geo;
pub mod grid;
pub mod input;
pub mod mosaic;
pub mod nodata;
pub mod progress;
pub mod raster;
pub mod reconcile;
pub mod source;

/// Version of the TerraMosaic library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
