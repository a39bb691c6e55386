//! # wheatn Algorithms
//!
//! Estimation algorithms for winter wheat nitrogen monitoring.
//!
//! ## Available Algorithm Categories
//!
//! - **imagery**: Vegetation indices from band means (NDVI, NDRE, SAVI, GNDVI, MCARI, CIred-edge)
//! - **nitrogen**: Literature-ensemble N estimation, quality classes, time-series prediction

pub(crate) mod maybe_rayon;

pub mod imagery;
pub mod nitrogen;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::imagery::{
        index_time_series, vegetation_indices, SaviParams, VegetationIndices,
    };
    pub use crate::nitrogen::{
        classify_quality, estimate_nitrogen, predict_time_series, DatedEstimationResult,
        EstimationQuality, EstimationResult, EstimatorParams, NitrogenEstimate, Prediction,
        RegressionMethod, TimeSeriesPredict, Uncertainty,
    };
    pub use wheatn_core::prelude::*;
}
