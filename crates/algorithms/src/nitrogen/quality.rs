//! Estimation quality classes

use std::fmt;

use serde::{Deserialize, Serialize};

use super::estimator::Uncertainty;

/// High tier: mean R² above this
pub const HIGH_R2: f64 = 0.85;
/// High tier: combined RMSE below this
pub const HIGH_RMSE: f64 = 0.35;
/// Moderate tier: mean R² above this
pub const MODERATE_R2: f64 = 0.75;
/// Moderate tier: combined RMSE below this
pub const MODERATE_RMSE: f64 = 0.45;

/// Confidence in a fused estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EstimationQuality {
    #[serde(rename = "High Confidence")]
    High,
    #[serde(rename = "Moderate Confidence")]
    Moderate,
    #[serde(rename = "Low Confidence")]
    Low,
}

impl EstimationQuality {
    pub fn label(self) -> &'static str {
        match self {
            EstimationQuality::High => "High Confidence",
            EstimationQuality::Moderate => "Moderate Confidence",
            EstimationQuality::Low => "Low Confidence",
        }
    }
}

impl fmt::Display for EstimationQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify an uncertainty summary, tightest tier first.
///
/// A tier needs both the R² and the RMSE condition.
pub fn classify_quality(uncertainty: &Uncertainty) -> EstimationQuality {
    let Uncertainty { rmse, r2_mean, .. } = *uncertainty;
    if r2_mean > HIGH_R2 && rmse < HIGH_RMSE {
        EstimationQuality::High
    } else if r2_mean > MODERATE_R2 && rmse < MODERATE_RMSE {
        EstimationQuality::Moderate
    } else {
        EstimationQuality::Low
    }
}
