//! I/O operations for reading multiband drone imagery

#[cfg(test)]
pub(crate) mod fixtures;
mod multiband;
mod native;
mod series;

pub use native::{
    parse_gdal_metadata_date, read_band_stack, read_band_stack_from_buffer, write_band_stack,
    write_band_stack_to_buffer, BandStack, GDAL_METADATA_TAG,
};
pub use series::{date_from_file_name, list_tiffs, load_observation, load_time_series};
