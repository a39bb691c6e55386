//! Vegetation indices and index sets
//!
//! A [`VegetationIndexSet`](IndexSet) holds the scalar index values derived
//! for one observation. Keys are the closed [`VegetationIndex`] enum, so an
//! index is either present with a value or absent.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Vegetation indices produced by the index calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VegetationIndex {
    /// Normalized Difference Vegetation Index
    #[serde(rename = "NDVI")]
    Ndvi,
    /// Normalized Difference Red Edge Index
    #[serde(rename = "NDRE")]
    Ndre,
    /// Soil Adjusted Vegetation Index (L = 0.5)
    #[serde(rename = "SAVI")]
    Savi,
    /// Green Normalized Difference Vegetation Index
    #[serde(rename = "GNDVI")]
    Gndvi,
    /// Modified Chlorophyll Absorption in Reflectance Index
    #[serde(rename = "MCARI")]
    Mcari,
    /// Red Edge Chlorophyll Index
    #[serde(rename = "CIred-edge")]
    CiRedEdge,
}

impl VegetationIndex {
    /// All indices, in report order
    pub const ALL: [VegetationIndex; 6] = [
        VegetationIndex::Ndvi,
        VegetationIndex::Ndre,
        VegetationIndex::Savi,
        VegetationIndex::Gndvi,
        VegetationIndex::Mcari,
        VegetationIndex::CiRedEdge,
    ];

    /// Canonical display name
    pub fn name(self) -> &'static str {
        match self {
            VegetationIndex::Ndvi => "NDVI",
            VegetationIndex::Ndre => "NDRE",
            VegetationIndex::Savi => "SAVI",
            VegetationIndex::Gndvi => "GNDVI",
            VegetationIndex::Mcari => "MCARI",
            VegetationIndex::CiRedEdge => "CIred-edge",
        }
    }

    /// Closed range of physically possible values, from the index definition.
    ///
    /// - Normalized differences (NDVI, NDRE, GNDVI): `[-1, 1]`
    /// - SAVI with L = 0.5 scales a normalized difference by 1.5: `[-1.5, 1.5]`
    /// - CIred-edge is a ratio of non-negative reflectances minus one: `[-1, +inf)`
    /// - MCARI has no sign constraint
    pub fn legal_range(self) -> (f64, f64) {
        match self {
            VegetationIndex::Ndvi | VegetationIndex::Ndre | VegetationIndex::Gndvi => (-1.0, 1.0),
            VegetationIndex::Savi => (-1.5, 1.5),
            VegetationIndex::CiRedEdge => (-1.0, f64::INFINITY),
            VegetationIndex::Mcari => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    /// Check a value against [`legal_range`](Self::legal_range).
    ///
    /// Non-finite values are always rejected.
    pub fn check(self, value: f64) -> Result<()> {
        let (min, max) = self.legal_range();
        if !value.is_finite() || value < min || value > max {
            return Err(Error::IndexOutOfDomain {
                index: self,
                value,
                min,
                max,
            });
        }
        Ok(())
    }
}

impl fmt::Display for VegetationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mapping from vegetation index to value for a single observation.
///
/// Not every index has to be present. Built once, then read only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexSet {
    values: BTreeMap<VegetationIndex, f64>,
}

impl IndexSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a repeated index keeps the last value
    pub fn with(mut self, index: VegetationIndex, value: f64) -> Self {
        self.values.insert(index, value);
        self
    }

    /// Value of `index`, if present
    pub fn get(&self, index: VegetationIndex) -> Option<f64> {
        self.values.get(&index).copied()
    }

    pub fn contains(&self, index: VegetationIndex) -> bool {
        self.values.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate present indices in [`VegetationIndex::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (VegetationIndex, f64)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }

    /// Check every present value against its legal range.
    ///
    /// Reports the first offending index.
    pub fn validate(&self) -> Result<()> {
        self.iter().try_for_each(|(index, value)| index.check(value))
    }
}

impl FromIterator<(VegetationIndex, f64)> for IndexSet {
    fn from_iter<I: IntoIterator<Item = (VegetationIndex, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(VegetationIndex, f64); N]> for IndexSet {
    fn from(pairs: [(VegetationIndex, f64); N]) -> Self {
        pairs.into_iter().collect()
    }
}
