//! Hand-assembled TIFF files in the layouts GDAL writes for multiband
//! float rasters, independent of the crate's own encoder.

const SHORT: u16 = 3;
const LONG: u16 = 4;
const ASCII: u16 = 2;

/// Band arrangement inside the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interleave {
    /// `PlanarConfiguration = 1`: all samples of a pixel are adjacent
    Pixel,
    /// `PlanarConfiguration = 2`: one strip per band
    Band,
}

struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    payload: Vec<u8>,
}

fn shorts(tag: u16, values: &[u16]) -> Entry {
    Entry {
        tag,
        kind: SHORT,
        count: values.len() as u32,
        payload: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
    }
}

fn longs(tag: u16, values: &[u32]) -> Entry {
    Entry {
        tag,
        kind: LONG,
        count: values.len() as u32,
        payload: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
    }
}

/// Little-endian, uncompressed, single-strip-per-plane float32 TIFF with
/// `SamplesPerPixel = bands.len()` and `BlackIsZero`, as GDAL's GTiff driver
/// writes a `count = N, dtype = float32` raster. `metadata` goes into tag
/// 42112 verbatim.
pub(crate) fn gdal_multiband_tiff(
    width: u32,
    height: u32,
    bands: &[Vec<f32>],
    interleave: Interleave,
    metadata: Option<&str>,
) -> Vec<u8> {
    let pixels = (width * height) as usize;
    let band_count = bands.len();
    assert!(bands.iter().all(|b| b.len() == pixels));

    let mut pixel_data = Vec::new();
    match interleave {
        Interleave::Pixel => {
            for i in 0..pixels {
                for band in bands {
                    pixel_data.extend_from_slice(&band[i].to_le_bytes());
                }
            }
        }
        Interleave::Band => {
            for band in bands {
                for v in band {
                    pixel_data.extend_from_slice(&v.to_le_bytes());
                }
            }
        }
    }

    let data_start = 8u32;
    let plane_len = (pixels * 4) as u32;
    let (offsets, counts, planar) = match interleave {
        Interleave::Pixel => (
            vec![data_start],
            vec![plane_len * band_count as u32],
            1,
        ),
        Interleave::Band => (
            (0..band_count as u32).map(|b| data_start + b * plane_len).collect(),
            vec![plane_len; band_count],
            2,
        ),
    };

    let mut entries = vec![
        longs(256, &[width]),
        longs(257, &[height]),
        shorts(258, &vec![32; band_count]),
        shorts(259, &[1]),
        shorts(262, &[1]),
        longs(273, &offsets),
        shorts(277, &[band_count as u16]),
        longs(278, &[height]),
        longs(279, &counts),
        shorts(284, &[planar]),
        shorts(339, &vec![3; band_count]),
    ];
    if let Some(xml) = metadata {
        let mut payload = xml.as_bytes().to_vec();
        payload.push(0);
        entries.push(Entry {
            tag: 42112,
            kind: ASCII,
            count: payload.len() as u32,
            payload,
        });
    }

    let ifd_offset = data_start + pixel_data.len() as u32;
    let ifd_len = 2 + 12 * entries.len() as u32 + 4;
    let mut external_offset = ifd_offset + ifd_len;

    let mut ifd = Vec::new();
    let mut external = Vec::new();
    ifd.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in &entries {
        ifd.extend_from_slice(&entry.tag.to_le_bytes());
        ifd.extend_from_slice(&entry.kind.to_le_bytes());
        ifd.extend_from_slice(&entry.count.to_le_bytes());
        if entry.payload.len() <= 4 {
            let mut inline = entry.payload.clone();
            inline.resize(4, 0);
            ifd.extend_from_slice(&inline);
        } else {
            ifd.extend_from_slice(&external_offset.to_le_bytes());
            external.extend_from_slice(&entry.payload);
            if external.len() % 2 == 1 {
                external.push(0);
            }
            external_offset = ifd_offset + ifd_len + external.len() as u32;
        }
    }
    ifd.extend_from_slice(&0u32.to_le_bytes());

    let mut file = Vec::new();
    file.extend_from_slice(b"II");
    file.extend_from_slice(&42u16.to_le_bytes());
    file.extend_from_slice(&ifd_offset.to_le_bytes());
    file.extend_from_slice(&pixel_data);
    file.extend_from_slice(&ifd);
    file.extend_from_slice(&external);
    file
}

/// Five 2x2 bands: blue, green, red, NIR, red-edge with distinct pixels
pub(crate) fn five_band_2x2() -> Vec<Vec<f32>> {
    vec![
        vec![0.08, 0.10, 0.12, 0.10],
        vec![0.18, 0.20, 0.22, 0.20],
        vec![0.14, 0.15, 0.16, 0.15],
        vec![0.40, 0.45, 0.50, 0.45],
        vec![0.28, 0.30, 0.32, 0.30],
    ]
}
