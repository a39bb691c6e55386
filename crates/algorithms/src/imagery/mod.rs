//! Imagery analysis algorithms
//!
//! Vegetation indices from per-image band means:
//! NDVI, NDRE, SAVI, GNDVI, MCARI, CIred-edge.

mod indices;

pub use indices::{
    ci_red_edge, compute_index, gndvi, index_time_series, mcari, ndre, ndvi,
    normalized_difference, savi, vegetation_indices, SaviParams, VegetationIndices,
};
