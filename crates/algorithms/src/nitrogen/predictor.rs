//! Time-series nitrogen prediction
//!
//! Applies [`estimate_nitrogen`] to each dated index set. An observation that
//! fails validation is skipped and reported; it never aborts the run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;
use wheatn_core::{Algorithm, Error, IndexSet, Observation, Result};

use super::estimator::{estimate_nitrogen, EstimationResult, EstimatorParams};
use crate::maybe_rayon::*;

/// Estimation result for one acquisition date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedEstimationResult {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub result: EstimationResult,
}

/// An observation excluded from the output, with the reason
#[derive(Debug)]
pub struct SkippedObservation {
    pub date: NaiveDate,
    pub error: Error,
}

/// Outcome of a time-series prediction
#[derive(Debug, Default)]
pub struct Prediction {
    /// Successful estimates, in input order
    pub estimates: Vec<DatedEstimationResult>,
    /// Observations that failed validation, in input order
    pub skipped: Vec<SkippedObservation>,
}

impl Prediction {
    /// Number of observations that were submitted
    pub fn total_observations(&self) -> usize {
        self.estimates.len() + self.skipped.len()
    }

    /// True when nothing could be estimated
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    /// True when there was input but every observation was rejected
    pub fn all_rejected(&self) -> bool {
        self.estimates.is_empty() && !self.skipped.is_empty()
    }

    /// Last successful estimate in input order
    pub fn latest(&self) -> Option<&DatedEstimationResult> {
        self.estimates.last()
    }
}

/// Time-series prediction algorithm
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSeriesPredict;

impl Algorithm for TimeSeriesPredict {
    type Input = Vec<Observation<IndexSet>>;
    type Output = Prediction;
    type Params = EstimatorParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "TimeSeriesPredict"
    }

    fn description(&self) -> &'static str {
        "Estimate N content for each dated observation, skipping invalid ones"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        predict_time_series(&input, params)
    }
}

/// Estimate N content for each observation, preserving input order.
///
/// Observations are not re-sorted. Failed observations end up in
/// [`Prediction::skipped`] and are logged as warnings; an empty result is
/// not an error.
///
/// # Errors
/// Only [`Error::InvalidParameter`] for inconsistent `params`.
pub fn predict_time_series(
    observations: &[Observation<IndexSet>],
    params: EstimatorParams,
) -> Result<Prediction> {
    params.validate()?;

    let outcomes: Vec<Result<EstimationResult>> = observations
        .into_par_iter()
        .map(|obs| estimate_nitrogen(&obs.value, params))
        .collect();

    let mut prediction = Prediction::default();
    for (obs, outcome) in observations.iter().zip(outcomes) {
        match outcome {
            Ok(result) => prediction.estimates.push(DatedEstimationResult {
                date: obs.date,
                result,
            }),
            Err(error) => {
                warn!(
                    "Could not estimate N content for date {}: {}",
                    obs.date, error
                );
                prediction.skipped.push(SkippedObservation {
                    date: obs.date,
                    error,
                });
            }
        }
    }

    Ok(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheatn_core::VegetationIndex::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn valid(ndre: f64) -> IndexSet {
        IndexSet::from([
            (Ndvi, 0.7),
            (Ndre, ndre),
            (Savi, 0.6),
            (Mcari, 0.3),
            (CiRedEdge, 2.0),
        ])
    }

    #[test]
    fn test_empty_input() {
        let prediction = predict_time_series(&[], EstimatorParams::default()).unwrap();
        assert!(prediction.is_empty());
        assert!(prediction.skipped.is_empty());
        assert!(!prediction.all_rejected());
        assert!(prediction.latest().is_none());
    }

    #[test]
    fn test_one_valid_one_invalid() {
        let observations = vec![
            Observation::new(date(2, 1), IndexSet::from([(Ndvi, -1.0)])),
            Observation::new(date(2, 11), valid(0.5)),
        ];
        let prediction = predict_time_series(&observations, EstimatorParams::default()).unwrap();

        assert_eq!(prediction.estimates.len(), 1);
        assert_eq!(prediction.estimates[0].date, date(2, 11));
        assert_eq!(prediction.skipped.len(), 1);
        assert_eq!(prediction.skipped[0].date, date(2, 1));
        assert!(matches!(prediction.skipped[0].error, Error::NoApplicableMethod));
        assert_eq!(prediction.total_observations(), 2);
    }

    #[test]
    fn test_all_rejected() {
        let observations = vec![
            Observation::new(date(2, 1), IndexSet::new()),
            Observation::new(date(2, 11), valid(1.7)),
        ];
        let prediction = predict_time_series(&observations, EstimatorParams::default()).unwrap();
        assert!(prediction.is_empty());
        assert!(prediction.all_rejected());
        assert!(matches!(prediction.skipped[0].error, Error::EmptyIndexSet));
        assert!(matches!(
            prediction.skipped[1].error,
            Error::IndexOutOfDomain { index: Ndre, .. }
        ));
    }

    #[test]
    fn test_input_order_preserved() {
        let dates = [date(3, 1), date(2, 1), date(2, 20)];
        let observations: Vec<_> = dates
            .iter()
            .enumerate()
            .map(|(i, &d)| Observation::new(d, valid(0.3 + 0.1 * i as f64)))
            .collect();
        let prediction = predict_time_series(&observations, EstimatorParams::default()).unwrap();

        let out: Vec<_> = prediction.estimates.iter().map(|e| e.date).collect();
        assert_eq!(out, dates.to_vec());
        assert_eq!(prediction.latest().unwrap().date, date(2, 20));
    }

    #[test]
    fn test_matches_single_estimates() {
        let observations = vec![
            Observation::new(date(2, 1), valid(0.4)),
            Observation::new(date(2, 11), valid(0.6)),
        ];
        let prediction = predict_time_series(&observations, EstimatorParams::default()).unwrap();
        for (obs, dated) in observations.iter().zip(&prediction.estimates) {
            let single = estimate_nitrogen(&obs.value, EstimatorParams::default()).unwrap();
            assert_eq!(dated.result, single);
        }
    }

    #[test]
    fn test_deterministic() {
        let observations: Vec<_> = (0..8)
            .map(|i| Observation::new(date(2, 1 + i), valid(0.2 + 0.05 * i as f64)))
            .collect();
        let a = predict_time_series(&observations, EstimatorParams::default()).unwrap();
        let b = predict_time_series(&observations, EstimatorParams::default()).unwrap();
        assert_eq!(a.estimates, b.estimates);
    }

    #[test]
    fn test_invalid_params_is_error() {
        let params = EstimatorParams {
            savi_dense_factor: 0.0,
            ..Default::default()
        };
        let result = predict_time_series(&[Observation::new(date(2, 1), valid(0.5))], params);
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_algorithm_trait() {
        let observations = vec![Observation::new(date(2, 1), valid(0.5))];
        let prediction = TimeSeriesPredict.execute_default(observations).unwrap();
        assert_eq!(prediction.estimates.len(), 1);
    }
}
