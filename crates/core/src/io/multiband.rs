//! Direct strip/tile decoding for multi-sample grayscale images
//!
//! GDAL writes a multispectral raster as one image with `SamplesPerPixel = N`
//! and `PhotometricInterpretation = BlackIsZero`, either pixel-interleaved
//! (`PlanarConfiguration = 1`) or band-interleaved (`PlanarConfiguration = 2`).
//! The `tiff` decoder only expands single-sample grayscale, so these pages are
//! read here from the chunk offsets it parsed.
//!
//! Supports uncompressed, DEFLATE (via `flate2`) and LZW (via `weezl`) chunks
//! without a predictor.

use std::io::{Cursor, Read};

use tiff::decoder::Decoder;
use tiff::tags::Tag;

/// TIFF compression codes
pub mod compression {
    pub const NONE: u16 = 1;
    pub const LZW: u16 = 5;
    pub const DEFLATE: u16 = 8;
    pub const ADOBE_DEFLATE: u16 = 32946;
}

/// TIFF sample format codes
pub mod sample_format {
    pub const UNSIGNED_INT: u16 = 1;
    pub const SIGNED_INT: u16 = 2;
    pub const FLOAT: u16 = 3;
}

const PLANAR_SEPARATE: u16 = 2;
const PREDICTOR_NONE: u16 = 1;

/// Byte order from the file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffByteOrder {
    LittleEndian,
    BigEndian,
}

impl TiffByteOrder {
    pub fn from_header(data: &[u8]) -> Result<Self, String> {
        match data.get(..2) {
            Some(b"II") => Ok(TiffByteOrder::LittleEndian),
            Some(b"MM") => Ok(TiffByteOrder::BigEndian),
            _ => Err("Missing TIFF byte order mark".to_string()),
        }
    }
}

/// Decompress one chunk according to the TIFF compression code
pub fn decompress_chunk(data: &[u8], compression_code: u16, expected_len: usize) -> Result<Vec<u8>, String> {
    match compression_code {
        compression::NONE => Ok(data.to_vec()),

        compression::DEFLATE | compression::ADOBE_DEFLATE => {
            // TIFF DEFLATE chunks carry a zlib header; fall back to raw deflate.
            let mut out = Vec::with_capacity(expected_len);
            if flate2::read::ZlibDecoder::new(data).read_to_end(&mut out).is_ok() {
                return Ok(out);
            }
            out.clear();
            flate2::read::DeflateDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| format!("DEFLATE: {}", e))?;
            Ok(out)
        }

        compression::LZW => weezl::decode::Decoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
            .decode(data)
            .map_err(|e| format!("LZW: {}", e)),

        code => Err(format!("Unsupported TIFF compression: {}", code)),
    }
}

macro_rules! decode_as {
    ($raw:expr, $order:expr, $t:ty) => {{
        const N: usize = std::mem::size_of::<$t>();
        $raw.chunks_exact(N)
            .map(|b| {
                let mut bytes = [0u8; N];
                bytes.copy_from_slice(b);
                let v = match $order {
                    TiffByteOrder::LittleEndian => <$t>::from_le_bytes(bytes),
                    TiffByteOrder::BigEndian => <$t>::from_be_bytes(bytes),
                };
                v as f64
            })
            .collect::<Vec<f64>>()
    }};
}

/// Interpret decompressed bytes as samples of the given width and format
pub fn decode_samples(
    raw: &[u8],
    bits_per_sample: u16,
    format: u16,
    order: TiffByteOrder,
) -> Result<Vec<f64>, String> {
    Ok(match (bits_per_sample, format) {
        (8, sample_format::UNSIGNED_INT) => raw.iter().map(|&b| b as f64).collect(),
        (8, sample_format::SIGNED_INT) => raw.iter().map(|&b| b as i8 as f64).collect(),
        (16, sample_format::UNSIGNED_INT) => decode_as!(raw, order, u16),
        (16, sample_format::SIGNED_INT) => decode_as!(raw, order, i16),
        (32, sample_format::UNSIGNED_INT) => decode_as!(raw, order, u32),
        (32, sample_format::SIGNED_INT) => decode_as!(raw, order, i32),
        (32, sample_format::FLOAT) => decode_as!(raw, order, f32),
        (64, sample_format::FLOAT) => decode_as!(raw, order, f64),
        (bps, sf) => {
            return Err(format!(
                "Unsupported sample type: {} bits, sample format {}",
                bps, sf
            ))
        }
    })
}

/// Chunk grid of one page
struct ChunkLayout {
    chunk_width: usize,
    chunk_height: usize,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
}

fn chunk_layout<R: Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    width: usize,
    height: usize,
) -> Result<ChunkLayout, String> {
    let tag_err = |e: tiff::TiffError| format!("Cannot read chunk tags: {}", e);

    let tile_width = decoder.find_tag_unsigned::<u32>(Tag::TileWidth).map_err(tag_err)?;
    let tile_length = decoder.find_tag_unsigned::<u32>(Tag::TileLength).map_err(tag_err)?;

    if let (Some(tw), Some(tl)) = (tile_width, tile_length) {
        return Ok(ChunkLayout {
            chunk_width: tw as usize,
            chunk_height: tl as usize,
            offsets: decoder.get_tag_u64_vec(Tag::TileOffsets).map_err(tag_err)?,
            byte_counts: decoder.get_tag_u64_vec(Tag::TileByteCounts).map_err(tag_err)?,
        });
    }

    let rows_per_strip = decoder
        .find_tag_unsigned::<u32>(Tag::RowsPerStrip)
        .map_err(tag_err)?
        .map(|r| (r as usize).min(height))
        .unwrap_or(height);

    Ok(ChunkLayout {
        chunk_width: width,
        chunk_height: rows_per_strip,
        offsets: decoder.get_tag_u64_vec(Tag::StripOffsets).map_err(tag_err)?,
        byte_counts: decoder.get_tag_u64_vec(Tag::StripByteCounts).map_err(tag_err)?,
    })
}

/// Decode the current page into band-major planes.
///
/// Returns the planes concatenated (`band * rows * cols + row * cols + col`)
/// and the band count. `data` is the whole file the decoder reads from.
pub fn read_page_planes(
    decoder: &mut Decoder<Cursor<&[u8]>>,
    data: &[u8],
) -> Result<(Vec<f64>, usize), String> {
    let tag_err = |e: tiff::TiffError| format!("Cannot read image tags: {}", e);

    let order = TiffByteOrder::from_header(data)?;
    let (w, h) = decoder.dimensions().map_err(tag_err)?;
    let (width, height) = (w as usize, h as usize);
    let pixels = width * height;

    let samples = decoder
        .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)
        .map_err(tag_err)?
        .unwrap_or(1) as usize;
    let bits = decoder.get_tag_u16_vec(Tag::BitsPerSample).map_err(tag_err)?;
    let bits_per_sample = bits.first().copied().unwrap_or(1);
    if bits.iter().any(|&b| b != bits_per_sample) {
        return Err(format!("Mixed bits per sample: {:?}", bits));
    }
    let format = decoder
        .find_tag_unsigned_vec::<u16>(Tag::SampleFormat)
        .map_err(tag_err)?
        .and_then(|v| v.first().copied())
        .unwrap_or(sample_format::UNSIGNED_INT);
    let compression_code = decoder
        .find_tag_unsigned::<u16>(Tag::Compression)
        .map_err(tag_err)?
        .unwrap_or(compression::NONE);
    let predictor = decoder
        .find_tag_unsigned::<u16>(Tag::Predictor)
        .map_err(tag_err)?
        .unwrap_or(PREDICTOR_NONE);
    if predictor != PREDICTOR_NONE {
        return Err(format!("Unsupported TIFF predictor: {}", predictor));
    }
    let planar = decoder
        .find_tag_unsigned::<u16>(Tag::PlanarConfiguration)
        .map_err(tag_err)?
        .unwrap_or(1)
        == PLANAR_SEPARATE;

    let layout = chunk_layout(decoder, width, height)?;
    if layout.chunk_width == 0 || layout.chunk_height == 0 {
        return Err("Invalid chunk dimensions".to_string());
    }

    let across = width.div_ceil(layout.chunk_width);
    let down = height.div_ceil(layout.chunk_height);
    let per_plane = across * down;
    // Separate planes hold one sample per pixel each
    let (plane_count, chunk_samples) = if planar { (samples, 1) } else { (1, samples) };

    if layout.offsets.len() < per_plane * plane_count
        || layout.byte_counts.len() < layout.offsets.len()
    {
        return Err(format!(
            "Expected {} chunks, found {}",
            per_plane * plane_count,
            layout.offsets.len()
        ));
    }

    let mut planes = vec![f64::NAN; samples * pixels];
    let bytes_per_sample = (bits_per_sample as usize).div_ceil(8);

    for plane in 0..plane_count {
        for cy in 0..down {
            for cx in 0..across {
                let index = plane * per_plane + cy * across + cx;
                let start = layout.offsets[index] as usize;
                let end = start + layout.byte_counts[index] as usize;
                let raw = data
                    .get(start..end)
                    .ok_or_else(|| format!("Chunk {} lies outside the file", index))?;

                let expected = layout.chunk_width * layout.chunk_height * chunk_samples * bytes_per_sample;
                let bytes = decompress_chunk(raw, compression_code, expected)?;
                let values = decode_samples(&bytes, bits_per_sample, format, order)?;

                let (x0, y0) = (cx * layout.chunk_width, cy * layout.chunk_height);
                let rows = layout.chunk_height.min(height - y0);
                for r in 0..rows {
                    for c in 0..layout.chunk_width {
                        let x = x0 + c;
                        if x >= width {
                            continue;
                        }
                        for s in 0..chunk_samples {
                            let i = (r * layout.chunk_width + c) * chunk_samples + s;
                            let v = *values
                                .get(i)
                                .ok_or_else(|| format!("Chunk {} is truncated", index))?;
                            let band = plane + s;
                            planes[band * pixels + (y0 + r) * width + x] = v;
                        }
                    }
                }
            }
        }
    }

    Ok((planes, samples))
}
