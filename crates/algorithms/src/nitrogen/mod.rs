//! Above-ground nitrogen estimation for winter wheat
//!
//! - `regression`: fixed table of literature index → N regressions
//! - `estimator`: R²-weighted ensemble for a single observation
//! - `quality`: confidence classes from the ensemble uncertainty
//! - `predictor`: per-date estimation over a time series

mod estimator;
mod predictor;
mod quality;
mod regression;

pub use estimator::{
    estimate_nitrogen, ConfidenceInterval, EstimationResult, EstimatorParams, NitrogenEstimate,
    Uncertainty,
};
pub use predictor::{
    predict_time_series, DatedEstimationResult, Prediction, SkippedObservation, TimeSeriesPredict,
};
pub use quality::{classify_quality, EstimationQuality};
pub use regression::{
    references, LiteratureRegression, RegressionMethod, REGRESSION_TABLE,
    SAVI_CORRECTION_REFERENCE,
};
