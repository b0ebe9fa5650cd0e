// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration

use crate::Result;
use ifc_estate_model::{GeometryCompleteness, METRIC};
use serde::{Deserialize, Serialize};

/// Which elements a building receives
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementPartition {
    /// Elements spatially contained in the building; uncontained elements
    /// go to the first building
    #[default]
    SpatialContainment,
    /// Every building receives every element
    AllElements,
}

/// How a building's bounding box is obtained
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Union of the element geometry in world space
    #[default]
    Computed,
    /// Fixed volume x -50..50, y -30..30, z 0..25
    Placeholder,
}

/// Settings for [`ModelParser`](crate::ModelParser)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Assemble elements on the rayon pool
    pub parallel: bool,
    pub partition: ElementPartition,
    pub bounds: BoundsPolicy,
    /// Tag stamped on every building
    pub coordinate_system: String,
    /// Geometry reading for each building's BIM maturity
    pub maturity_basis: GeometryCompleteness,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            partition: ElementPartition::default(),
            bounds: BoundsPolicy::default(),
            coordinate_system: METRIC.to_string(),
            maturity_basis: GeometryCompleteness::default(),
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_partition(mut self, partition: ElementPartition) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_bounds(mut self, bounds: BoundsPolicy) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_coordinate_system(mut self, tag: impl Into<String>) -> Self {
        self.coordinate_system = tag.into();
        self
    }

    pub fn with_maturity_basis(mut self, basis: GeometryCompleteness) -> Self {
        self.maturity_basis = basis;
        self
    }
}
