//! Native multiband TIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate. Band layouts understood:
//! - one image with several samples per pixel, pixel- or band-interleaved
//!   (the GDAL multiband layout, see [`super::multiband`])
//! - one single-sample page (IFD) per band
//!
//! GDAL keeps per-dataset metadata (such as the acquisition date) as an XML
//! string in TIFF tag 42112; it is read back verbatim.

use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use chrono::NaiveDate;
use ndarray::{s, Array2, Array3, ArrayView2};
use num_traits::ToPrimitive;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

use crate::error::{Error, Result};
use crate::io::multiband::read_page_planes;
use crate::observation::BandMeans;

/// GDAL_METADATA private tag
pub const GDAL_METADATA_TAG: u16 = 42112;

/// Bands of one image, stored as `(band, row, col)`
#[derive(Debug, Clone)]
pub struct BandStack {
    bands: Array3<f64>,
    metadata: Option<String>,
}

impl BandStack {
    /// Wrap an existing `(band, row, col)` array
    pub fn new(bands: Array3<f64>) -> Self {
        Self {
            bands,
            metadata: None,
        }
    }

    pub fn band_count(&self) -> usize {
        self.bands.dim().0
    }

    /// `(rows, cols)` of every band
    pub fn shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.bands.dim();
        (rows, cols)
    }

    pub fn band(&self, index: usize) -> Option<ArrayView2<'_, f64>> {
        (index < self.band_count()).then(|| self.bands.slice(s![index, .., ..]))
    }

    /// Raw GDAL metadata XML, when the file carried tag 42112
    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// Acquisition date from the GDAL metadata `date` item
    pub fn metadata_date(&self) -> Option<NaiveDate> {
        self.metadata().and_then(parse_gdal_metadata_date)
    }

    /// Mean of one band over its finite pixels.
    ///
    /// NaN when the band has no finite pixel.
    pub fn band_mean(&self, index: usize) -> Option<f64> {
        let band = self.band(index)?;
        let (sum, count) = band
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
        Some(if count == 0 { f64::NAN } else { sum / count as f64 })
    }

    /// Per-band means of the first five bands (blue, green, red, NIR, red-edge)
    pub fn band_means(&self) -> Option<BandMeans> {
        if self.band_count() < BandMeans::BAND_COUNT {
            return None;
        }
        let mut means = [0.0; BandMeans::BAND_COUNT];
        for (i, m) in means.iter_mut().enumerate() {
            *m = self.band_mean(i)?;
        }
        Some(BandMeans::from_ordered(means))
    }
}

/// Read every band of a TIFF file
pub fn read_band_stack<P: AsRef<Path>>(path: P) -> Result<BandStack> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    decode_band_stack(&data).map_err(|reason| Error::Tiff {
        path: path.to_path_buf(),
        reason,
    })
}

/// Read every band of an in-memory TIFF
pub fn read_band_stack_from_buffer(data: &[u8]) -> Result<BandStack> {
    decode_band_stack(data).map_err(|reason| Error::Tiff {
        path: "<buffer>".into(),
        reason,
    })
}

/// Internal: decode all same-sized pages of a TIFF into a band stack
fn decode_band_stack(data: &[u8]) -> std::result::Result<BandStack, String> {
    let mut decoder =
        Decoder::new(Cursor::new(data)).map_err(|e| format!("TIFF decode error: {}", e))?;

    let metadata = decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_METADATA_TAG))
        .ok();

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| format!("Cannot read dimensions: {}", e))?;
    let rows = height as usize;
    let cols = width as usize;
    if rows * cols == 0 {
        return Err(format!("Invalid raster dimensions: {}x{}", cols, rows));
    }

    let mut planes: Vec<f64> = Vec::new();
    let mut band_count = 0;

    loop {
        let (page, page_bands) = read_page(&mut decoder, data, rows * cols)?;
        planes.extend(page);
        band_count += page_bands;

        if !decoder.more_images() {
            break;
        }
        decoder
            .next_image()
            .map_err(|e| format!("Cannot advance to next page: {}", e))?;
        // Overviews and thumbnails have other dimensions
        match decoder.dimensions() {
            Ok((w, h)) if w == width && h == height => {}
            _ => break,
        }
    }

    let bands = Array3::from_shape_vec((band_count, rows, cols), planes)
        .map_err(|e| e.to_string())?;

    Ok(BandStack { bands, metadata })
}

/// Internal: band-major planes of the current page and their count.
///
/// Color types the decoder understands go through `read_image`; multi-sample
/// grayscale (the GDAL multiband layout) is expanded by [`read_page_planes`].
fn read_page(
    decoder: &mut Decoder<Cursor<&[u8]>>,
    data: &[u8],
    pixels: usize,
) -> std::result::Result<(Vec<f64>, usize), String> {
    if decoder.colortype().is_err() {
        return read_page_planes(decoder, data);
    }

    let samples = samples_to_f64(
        decoder
            .read_image()
            .map_err(|e| format!("Cannot read image data: {}", e))?,
    )?;
    if samples.len() % pixels != 0 {
        return Err(format!(
            "{} samples do not fit a {}-pixel image",
            samples.len(),
            pixels
        ));
    }
    let per_pixel = samples.len() / pixels;
    if per_pixel == 1 {
        return Ok((samples, 1));
    }

    // Chunky layout: pixel-major, one column per band
    let interleaved =
        Array2::from_shape_vec((pixels, per_pixel), samples).map_err(|e| e.to_string())?;
    let planes = interleaved
        .columns()
        .into_iter()
        .flat_map(|column| column.to_vec())
        .collect();
    Ok((planes, per_pixel))
}

fn cast_all<T: ToPrimitive + Copy>(buf: &[T]) -> Vec<f64> {
    buf.iter().map(|v| v.to_f64().unwrap_or(f64::NAN)).collect()
}

fn samples_to_f64(result: DecodingResult) -> std::result::Result<Vec<f64>, String> {
    Ok(match result {
        DecodingResult::F32(buf) => cast_all(&buf),
        DecodingResult::F64(buf) => buf,
        DecodingResult::U8(buf) => cast_all(&buf),
        DecodingResult::U16(buf) => cast_all(&buf),
        DecodingResult::U32(buf) => cast_all(&buf),
        DecodingResult::U64(buf) => cast_all(&buf),
        DecodingResult::I8(buf) => cast_all(&buf),
        DecodingResult::I16(buf) => cast_all(&buf),
        DecodingResult::I32(buf) => cast_all(&buf),
        DecodingResult::I64(buf) => cast_all(&buf),
        #[allow(unreachable_patterns)]
        _ => return Err("Unsupported TIFF pixel format".to_string()),
    })
}

/// Extract the `date` item (`YYYY-MM-DD`, optionally followed by a time)
/// from a GDAL metadata XML string.
pub fn parse_gdal_metadata_date(xml: &str) -> Option<NaiveDate> {
    let mut rest = xml;
    while let Some(start) = rest.find("<Item") {
        rest = &rest[start + 5..];
        let open_end = rest.find('>')?;
        let attrs = &rest[..open_end];
        let body = &rest[open_end + 1..];
        let close = body.find('<')?;
        let text = body[..close].trim();

        let is_date = attrs
            .split_whitespace()
            .any(|a| a.eq_ignore_ascii_case("name=\"date\""));
        if is_date {
            return NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .or_else(|| NaiveDate::parse_from_str(text.get(..10)?, "%Y-%m-%d").ok());
        }
        rest = &body[close..];
    }
    None
}

/// Write bands as single-sample 32-bit float pages, tagging the acquisition
/// date in GDAL metadata when given.
pub fn write_band_stack<P: AsRef<Path>>(
    path: P,
    stack: &BandStack,
    date: Option<NaiveDate>,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    encode_band_stack(stack, date, file).map_err(|reason| Error::Tiff {
        path: path.to_path_buf(),
        reason,
    })
}

/// Write bands to an in-memory TIFF buffer
pub fn write_band_stack_to_buffer(stack: &BandStack, date: Option<NaiveDate>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_band_stack(stack, date, Cursor::new(&mut buf)).map_err(|reason| Error::Tiff {
        path: "<buffer>".into(),
        reason,
    })?;
    Ok(buf)
}

/// Internal: encode a band stack into any `Write + Seek` sink
fn encode_band_stack<W: Write + Seek>(
    stack: &BandStack,
    date: Option<NaiveDate>,
    writer: W,
) -> std::result::Result<(), String> {
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| format!("TIFF encoder error: {}", e))?;
    let (rows, cols) = stack.shape();

    let metadata = date.map(|d| {
        format!(
            "<GDALMetadata>\n  <Item name=\"date\">{}</Item>\n</GDALMetadata>",
            d.format("%Y-%m-%d")
        )
    });

    for (i, band) in stack.bands.outer_iter().enumerate() {
        let data: Vec<f32> = band.iter().map(|&v| v as f32).collect();

        let mut image = encoder
            .new_image::<Gray32Float>(cols as u32, rows as u32)
            .map_err(|e| format!("Cannot create TIFF image: {}", e))?;

        if let (0, Some(xml)) = (i, metadata.as_deref()) {
            image
                .encoder()
                .write_tag(Tag::Unknown(GDAL_METADATA_TAG), xml)
                .map_err(|e| format!("Cannot write metadata tag: {}", e))?;
        }

        image
            .write_data(&data)
            .map_err(|e| format!("Cannot write image data: {}", e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fixtures::{five_band_2x2, gdal_multiband_tiff, Interleave};
    use approx::assert_relative_eq;

    fn stack_of(values: &[f64], rows: usize, cols: usize) -> BandStack {
        let mut bands = Array3::zeros((values.len(), rows, cols));
        for (i, &v) in values.iter().enumerate() {
            bands.slice_mut(s![i, .., ..]).fill(v);
        }
        BandStack::new(bands)
    }

    #[test]
    fn test_band_means_uniform() {
        let stack = stack_of(&[0.1, 0.2, 0.15, 0.45, 0.3], 4, 3);
        let means = stack.band_means().unwrap();
        assert_relative_eq!(means.blue, 0.1);
        assert_relative_eq!(means.green, 0.2);
        assert_relative_eq!(means.red, 0.15);
        assert_relative_eq!(means.nir, 0.45);
        assert_relative_eq!(means.red_edge, 0.3);
    }

    #[test]
    fn test_band_mean_ignores_nan() {
        let mut stack = stack_of(&[0.4], 2, 2);
        stack.bands[[0, 0, 0]] = f64::NAN;
        stack.bands[[0, 1, 1]] = 0.1;
        // (0.4 + 0.4 + 0.1) / 3
        assert_relative_eq!(stack.band_mean(0).unwrap(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_band_means_needs_five_bands() {
        let stack = stack_of(&[0.1, 0.2, 0.3, 0.4], 2, 2);
        assert!(stack.band_means().is_none());
    }

    #[test]
    fn test_parse_gdal_metadata_date() {
        let xml = "<GDALMetadata>\n  <Item name=\"description\">Test data</Item>\n  \
                   <Item name=\"date\">2024-02-10</Item>\n</GDALMetadata>";
        assert_eq!(
            parse_gdal_metadata_date(xml),
            NaiveDate::from_ymd_opt(2024, 2, 10)
        );
    }

    #[test]
    fn test_parse_gdal_metadata_datetime_prefix() {
        let xml = "<GDALMetadata><Item name=\"date\">2024-03-01T10:30:00</Item></GDALMetadata>";
        assert_eq!(
            parse_gdal_metadata_date(xml),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn test_parse_gdal_metadata_without_date() {
        let xml = "<GDALMetadata><Item name=\"description\">x</Item></GDALMetadata>";
        assert_eq!(parse_gdal_metadata_date(xml), None);
    }

    #[test]
    fn test_buffer_roundtrip_pages_and_date() {
        let stack = stack_of(&[0.1, 0.2, 0.15, 0.45, 0.3], 6, 5);
        let date = NaiveDate::from_ymd_opt(2024, 2, 1);

        let buf = write_band_stack_to_buffer(&stack, date).unwrap();
        let read = read_band_stack_from_buffer(&buf).unwrap();

        assert_eq!(read.band_count(), 5);
        assert_eq!(read.shape(), (6, 5));
        assert_eq!(read.metadata_date(), date);
        let means = read.band_means().unwrap();
        assert_relative_eq!(means.nir, 0.45, epsilon = 1e-6);
        assert_relative_eq!(means.red_edge, 0.3, epsilon = 1e-6);
    }

    fn assert_wheat_fixture(stack: &BandStack) {
        assert_eq!(stack.band_count(), 5);
        assert_eq!(stack.shape(), (2, 2));
        // Pixel (row 1, col 0) is the third sample of each band
        let nir = stack.band(3).unwrap();
        assert_relative_eq!(nir[[1, 0]], 0.50, epsilon = 1e-6);
        assert_relative_eq!(nir[[0, 1]], 0.45, epsilon = 1e-6);
        let red_edge = stack.band(4).unwrap();
        assert_relative_eq!(red_edge[[0, 0]], 0.28, epsilon = 1e-6);

        let means = stack.band_means().unwrap();
        assert_relative_eq!(means.blue, 0.10, epsilon = 1e-6);
        assert_relative_eq!(means.green, 0.20, epsilon = 1e-6);
        assert_relative_eq!(means.red, 0.15, epsilon = 1e-6);
        assert_relative_eq!(means.nir, 0.45, epsilon = 1e-6);
        assert_relative_eq!(means.red_edge, 0.30, epsilon = 1e-6);
    }

    #[test]
    fn test_read_gdal_pixel_interleaved() {
        let buf = gdal_multiband_tiff(2, 2, &five_band_2x2(), Interleave::Pixel, None);
        let stack = read_band_stack_from_buffer(&buf).unwrap();
        assert_wheat_fixture(&stack);
        assert!(stack.metadata().is_none());
    }

    #[test]
    fn test_read_gdal_band_interleaved() {
        let buf = gdal_multiband_tiff(2, 2, &five_band_2x2(), Interleave::Band, None);
        let stack = read_band_stack_from_buffer(&buf).unwrap();
        assert_wheat_fixture(&stack);
    }

    #[test]
    fn test_read_gdal_metadata_date() {
        let xml = "<GDALMetadata>\n  <Item name=\"date\">2024-02-21</Item>\n</GDALMetadata>";
        let buf = gdal_multiband_tiff(2, 2, &five_band_2x2(), Interleave::Pixel, Some(xml));
        let stack = read_band_stack_from_buffer(&buf).unwrap();
        assert_eq!(stack.metadata_date(), NaiveDate::from_ymd_opt(2024, 2, 21));
    }

    #[test]
    fn test_read_gdal_strip_outside_file_fails() {
        let mut buf = gdal_multiband_tiff(2, 2, &five_band_2x2(), Interleave::Pixel, None);
        let ifd = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;
        let entries = u16::from_le_bytes([buf[ifd], buf[ifd + 1]]) as usize;
        let strip_counts = (0..entries)
            .map(|i| ifd + 2 + 12 * i)
            .find(|&e| u16::from_le_bytes([buf[e], buf[e + 1]]) == 279)
            .unwrap();
        buf[strip_counts + 8..strip_counts + 12].copy_from_slice(&100_000u32.to_le_bytes());

        let result = read_band_stack_from_buffer(&buf);
        assert!(matches!(result, Err(Error::Tiff { .. })));
    }

    #[test]
    fn test_read_garbage_fails() {
        let result = read_band_stack_from_buffer(b"not a tiff at all");
        assert!(matches!(result, Err(Error::Tiff { .. })));
    }
}
