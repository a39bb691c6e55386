//! # wheatn Core
//!
//! Core types, traits and I/O for winter wheat nitrogen estimation.
//!
//! This crate provides:
//! - `VegetationIndex` / `IndexSet`: the per-observation index values
//! - `BandMeans` / `Observation<T>`: dated band reflectances
//! - Algorithm traits for consistent API
//! - I/O for multiband drone imagery (TIFF time series)

pub mod error;
pub mod index;
pub mod io;
pub mod observation;

pub use error::{Error, Result};
pub use index::{IndexSet, VegetationIndex};
pub use observation::{BandMeans, Observation};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::index::{IndexSet, VegetationIndex};
    pub use crate::observation::{BandMeans, Observation};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in wheatn.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
