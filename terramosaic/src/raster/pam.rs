//! Auxiliary metadata sidecars.
//!
//! None of the supported pixel formats carry nodata natively, so it
//! travels in a `.aux.xml` sidecar next to the raster, one
//! `<PAMRasterBand>` element per band holding a `<NoDataValue>`. The
//! format follows the GDAL persistent auxiliary metadata layout, so
//! sidecars written by other GIS tooling are readable too. Reads are
//! tolerant: a missing or unparseable sidecar yields no nodata rather
//! than an error.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Sidecar path for a raster, its full filename plus `.aux.xml`.
pub fn pam_path(raster: &Path) -> PathBuf {
    let mut name = raster.as_os_str().to_os_string();
    name.push(".aux.xml");
    PathBuf::from(name)
}

/// Reads per-band nodata from a raster's sidecar.
///
/// Returns one entry per band, `None` wherever the sidecar declares
/// nothing. Band numbers outside `1..=bands` are ignored.
pub fn read_band_nodata(raster: &Path, bands: usize) -> Vec<Option<f64>> {
    let mut nodata = vec![None; bands];
    let path = pam_path(raster);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return nodata,
        Err(source) => {
            tracing::warn!(
                path = %path.display(),
                error = %source,
                "ignoring unreadable metadata sidecar"
            );
            return nodata;
        }
    };

    for section in contents.split("<PAMRasterBand").skip(1) {
        let section = section.split("</PAMRasterBand>").next().unwrap_or(section);
        let Some(band) = attribute_value(section, "band").and_then(|v| v.parse::<usize>().ok())
        else {
            continue;
        };
        let Some(value) = element_text(section, "NoDataValue")
            .and_then(|v| v.trim().parse::<f64>().ok())
        else {
            continue;
        };
        if (1..=bands).contains(&band) {
            nodata[band - 1] = Some(value);
        }
    }
    nodata
}

/// Writes a sidecar declaring one nodata value per band, returning its
/// path.
pub fn write_band_nodata(raster: &Path, nodata: &[f64]) -> io::Result<PathBuf> {
    let path = pam_path(raster);
    let mut contents = String::from("<PAMDataset>\n");
    for (index, value) in nodata.iter().enumerate() {
        // String formatting cannot fail
        let _ = write!(
            contents,
            "  <PAMRasterBand band=\"{}\">\n    <NoDataValue>{}</NoDataValue>\n  </PAMRasterBand>\n",
            index + 1,
            value
        );
    }
    contents.push_str("</PAMDataset>\n");
    fs::write(&path, contents)?;
    Ok(path)
}

fn attribute_value<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let marker = format!("{}=\"", name);
    let start = text.find(&marker)? + marker.len();
    let rest = &text[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn element_text<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = text.find(&open)? + open.len();
    let rest = &text[start..];
    let end = rest.find(&close)?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pam_path_appends_to_full_filename() {
        assert_eq!(
            pam_path(Path::new("out.png")),
            Path::new("out.png.aux.xml")
        );
        assert_eq!(
            pam_path(Path::new("dir/mosaic.tif")),
            Path::new("dir/mosaic.tif.aux.xml")
        );
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let raster = dir.path().join("out.png");
        write_band_nodata(&raster, &[255.0, 0.0, 2.5]).unwrap();
        let nodata = read_band_nodata(&raster, 3);
        assert_eq!(nodata, vec![Some(255.0), Some(0.0), Some(2.5)]);
    }

    #[test]
    fn test_missing_sidecar_yields_no_nodata() {
        let dir = TempDir::new().unwrap();
        let raster = dir.path().join("out.png");
        assert_eq!(read_band_nodata(&raster, 2), vec![None, None]);
    }

    #[test]
    fn test_gdal_style_sidecar_with_extra_elements() {
        let dir = TempDir::new().unwrap();
        let raster = dir.path().join("out.tif");
        std::fs::write(
            dir.path().join("out.tif.aux.xml"),
            r#"<PAMDataset>
  <Metadata>
    <MDI key="AREA_OR_POINT">Area</MDI>
  </Metadata>
  <PAMRasterBand band="1">
    <Description>elevation</Description>
    <NoDataValue>-9999</NoDataValue>
    <Metadata>
      <MDI key="STATISTICS_MINIMUM">1</MDI>
    </Metadata>
  </PAMRasterBand>
  <PAMRasterBand band="2">
    <Description>slope</Description>
  </PAMRasterBand>
</PAMDataset>
"#,
        )
        .unwrap();
        let nodata = read_band_nodata(&raster, 2);
        assert_eq!(nodata, vec![Some(-9999.0), None]);
    }

    #[test]
    fn test_band_numbers_outside_range_ignored() {
        let dir = TempDir::new().unwrap();
        let raster = dir.path().join("out.png");
        write_band_nodata(&raster, &[1.0, 2.0, 3.0]).unwrap();
        let nodata = read_band_nodata(&raster, 2);
        assert_eq!(nodata, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_garbage_sidecar_tolerated() {
        let dir = TempDir::new().unwrap();
        let raster = dir.path().join("out.png");
        std::fs::write(dir.path().join("out.png.aux.xml"), "not xml at all").unwrap();
        assert_eq!(read_band_nodata(&raster, 1), vec![None]);
    }
}
