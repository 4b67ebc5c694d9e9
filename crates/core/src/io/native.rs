//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate for the pixel data and reads the handful of GeoTIFF
//! tags the engine needs: pixel scale, tiepoint, the EPSG code from the
//! GeoKey directory, and the GDAL no-data string.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement, Window};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tracing::{debug, warn};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const KEY_MODEL_TYPE: u32 = 1024;
const KEY_RASTER_TYPE: u32 = 1025;
const KEY_GEOGRAPHIC_TYPE: u32 = 2048;
const KEY_PROJECTED_CS_TYPE: u32 = 3072;
const USER_DEFINED: u32 = 32767;

/// Read a GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file))
}

/// Read the part of a GeoTIFF covering world `bounds` (min_x, min_y, max_x, max_y).
///
/// The native reader decodes the whole image and cuts the window afterwards.
pub fn read_geotiff_bounds<T, P>(path: P, bounds: (f64, f64, f64, f64)) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let raster: Raster<T> = read_geotiff(path)?;
    let window = Window::from_bounds(bounds, raster.transform(), raster.rows(), raster.cols())?;
    debug!(
        rows = window.height,
        cols = window.width,
        row_off = window.row_off,
        col_off = window.col_off,
        "area of interest window"
    );
    raster.subset(&window)
}

/// Spatial reference of a GeoTIFF, from its tags alone.
///
/// Pixel data is not decoded.
pub fn read_geotiff_crs<P: AsRef<Path>>(path: P) -> Result<Option<CRS>> {
    let file = File::open(path.as_ref())?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(tiff_err("TIFF decode error"))?;
    Ok(read_crs(&mut decoder))
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

/// Tag for a GeoTIFF/GDAL code; `tiff` stores these under named variants
fn geo_tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn tiff_err(context: &'static str) -> impl Fn(tiff::TiffError) -> Error {
    move |e| Error::Other(format!("{context}: {e}"))
}

fn cast_all<T: RasterElement, V: Copy + Into<f64>>(buf: Vec<V>) -> Vec<T> {
    buf.into_iter().map(|v| T::from_f64(v.into())).collect()
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader).map_err(tiff_err("TIFF decode error"))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(tiff_err("Cannot read dimensions"))?;
    let rows = height as usize;
    let cols = width as usize;

    let data: Vec<T> = match decoder
        .read_image()
        .map_err(tiff_err("Cannot read image data"))?
    {
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    match read_geotransform(&mut decoder) {
        Some(transform) => raster.set_transform(transform),
        None => warn!("GeoTIFF has no pixel scale or tiepoint, using identity transform"),
    }
    let crs = read_crs(&mut decoder);
    if crs.is_none() {
        warn!("GeoTIFF carries no EPSG code");
    }
    raster.set_crs(crs);
    debug!(rows, cols, "decoded GeoTIFF");

    if let Ok(text) = decoder.get_tag_ascii_string(geo_tag(GDAL_NODATA)) {
        if let Ok(value) = text.trim_matches(char::from(0)).trim().parse::<f64>() {
            raster.set_nodata(Some(T::from_f64(value)));
        }
    }

    Ok(raster)
}

/// Geotransform from ModelPixelScale + ModelTiepoint
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(geo_tag(MODEL_PIXEL_SCALE))
        .ok()?;
    let tiepoint = decoder.get_tag_f64_vec(geo_tag(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// EPSG code from the GeoKey directory, projected key first
fn read_crs<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder
        .get_tag_u32_vec(geo_tag(GEO_KEY_DIRECTORY))
        .ok()?;
    if keys.len() < 4 {
        return None;
    }

    // Header [version, revision, minor, count], then [key, location, count, value]
    let inline_value = |wanted: u32| {
        keys[4..]
            .chunks_exact(4)
            .find(|entry| entry[0] == wanted && entry[1] == 0)
            .map(|entry| entry[3])
            .filter(|&code| code != 0 && code != USER_DEFINED)
    };

    inline_value(KEY_PROJECTED_CS_TYPE)
        .or_else(|| inline_value(KEY_GEOGRAPHIC_TYPE))
        .map(CRS::from_epsg)
}

/// Write a Raster to a GeoTIFF file as 32-bit float
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file)
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn geokeys(crs: Option<&CRS>) -> Vec<u16> {
    let mut entries: Vec<[u16; 4]> = Vec::new();
    let code = crs.and_then(CRS::epsg).and_then(|c| u16::try_from(c).ok());
    let geographic = crs.is_some_and(CRS::is_geographic);

    entries.push([KEY_MODEL_TYPE as u16, 0, 1, if geographic { 2 } else { 1 }]);
    // RasterPixelIsArea
    entries.push([KEY_RASTER_TYPE as u16, 0, 1, 1]);
    if let Some(code) = code {
        let key = if geographic {
            KEY_GEOGRAPHIC_TYPE
        } else {
            KEY_PROJECTED_CS_TYPE
        };
        entries.push([key as u16, 0, 1, code]);
    }

    let mut out = vec![1, 1, 0, entries.len() as u16];
    out.extend(entries.into_iter().flatten());
    out
}

/// Internal: encode a Raster as GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: std::io::Write + std::io::Seek,
{
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_err("TIFF encoder error"))?;

    let (rows, cols) = raster.shape();
    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| v.to_f64().map_or(f32::NAN, |f| f as f32))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(tiff_err("Cannot create TIFF image"))?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(geo_tag(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(tiff_err("Cannot write scale tag"))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(geo_tag(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(tiff_err("Cannot write tiepoint tag"))?;

    let keys = geokeys(raster.crs());
    image
        .encoder()
        .write_tag(geo_tag(GEO_KEY_DIRECTORY), keys.as_slice())
        .map_err(tiff_err("Cannot write geokey tag"))?;

    if let Some(nodata) = raster.nodata().and_then(|v| v.to_f64()) {
        let text = nodata.to_string();
        image
            .encoder()
            .write_tag(geo_tag(GDAL_NODATA), text.as_str())
            .map_err(tiff_err("Cannot write nodata tag"))?;
    }

    image
        .write_data(&data)
        .map_err(tiff_err("Cannot write image data"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample() -> Raster<f64> {
        let mut raster = Raster::filled(20, 30, 100.0)
            .with_transform(GeoTransform::new(500_000.0, 4_400_000.0, 30.0, -30.0))
            .with_crs(CRS::from_epsg(32636))
            .with_nodata(-9999.0);
        raster.set(3, 4, 112.5).unwrap();
        raster.set(0, 0, -9999.0).unwrap();
        raster
    }

    #[test]
    fn test_write_read_roundtrip() {
        let raster = sample();
        let tmp = NamedTempFile::new().unwrap();
        write_geotiff(&raster, tmp.path()).unwrap();

        let loaded: Raster<f64> = read_geotiff(tmp.path()).unwrap();
        assert_eq!(loaded.shape(), (20, 30));
        assert_eq!(loaded.transform(), raster.transform());
        assert_eq!(loaded.crs().and_then(CRS::epsg), Some(32636));
        assert_eq!(loaded.nodata(), Some(-9999.0));
        assert_eq!(loaded.get(3, 4).unwrap(), 112.5);
        assert!(loaded.is_nodata(loaded.get(0, 0).unwrap()));
    }

    #[test]
    fn test_buffer_roundtrip_geographic() {
        let raster: Raster<f64> = Raster::filled(4, 5, 1.0)
            .with_transform(GeoTransform::new(32.0, 40.0, 0.001, -0.001))
            .with_crs(CRS::wgs84());
        let bytes = write_geotiff_to_buffer(&raster).unwrap();
        let loaded: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();
        assert!(loaded.crs().is_some_and(CRS::is_geographic));
        assert_eq!(loaded.nodata(), None);
    }

    #[test]
    fn test_read_bounds_cuts_window() {
        let raster = sample();
        let tmp = NamedTempFile::new().unwrap();
        write_geotiff(&raster, tmp.path()).unwrap();

        let bounds = (500_090.0, 4_399_730.0, 500_240.0, 4_399_910.0);
        let sub: Raster<f64> = read_geotiff_bounds(tmp.path(), bounds).unwrap();
        assert_eq!(sub.shape(), (6, 5));
        assert_eq!(sub.transform().origin_x, 500_090.0);
        assert_eq!(sub.get(0, 1).unwrap(), 112.5);
    }

    #[test]
    fn test_geo_tags_resolve_by_code() {
        let bytes = write_geotiff_to_buffer(&sample()).unwrap();
        let mut decoder = Decoder::new(Cursor::new(bytes.as_slice())).unwrap();

        let scale = decoder.get_tag_f64_vec(geo_tag(MODEL_PIXEL_SCALE)).unwrap();
        assert_eq!(&scale[..2], &[30.0, 30.0]);
        let tiepoint = decoder.get_tag_f64_vec(geo_tag(MODEL_TIEPOINT)).unwrap();
        assert_eq!(tiepoint[3], 500_000.0);
        assert_eq!(tiepoint[4], 4_400_000.0);
        assert_eq!(read_crs(&mut decoder), Some(CRS::from_epsg(32636)));
        let nodata = decoder.get_tag_ascii_string(geo_tag(GDAL_NODATA)).unwrap();
        assert_eq!(nodata.trim_matches(char::from(0)).trim(), "-9999");
    }

    #[test]
    fn test_crs_from_header() {
        let tmp = NamedTempFile::new().unwrap();
        write_geotiff(&sample(), tmp.path()).unwrap();
        assert_eq!(read_geotiff_crs(tmp.path()).unwrap(), Some(CRS::from_epsg(32636)));

        let bare: Raster<f64> = Raster::filled(3, 3, 0.0);
        write_geotiff(&bare, tmp.path()).unwrap();
        assert_eq!(read_geotiff_crs(tmp.path()).unwrap(), None);
    }
}
