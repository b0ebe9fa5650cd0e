// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building element entity

use crate::{ElementCategory, GeometryPayload, PropertyMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Level label used when an element has no containing storey
pub const DEFAULT_LEVEL: &str = "Ground Floor";

/// One physical building element with its geometry and semantics
///
/// Created once per parse and read-only afterwards. Positions are in metres.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BimElement {
    /// Native instance id, stringified
    pub id: String,
    pub global_id: Option<String>,
    /// IFC class name (e.g. "IfcWall")
    pub element_type: String,
    pub name: String,
    pub level: String,
    pub geometry: GeometryPayload,
    /// Material mapping; holds `"type"` when a material is associated
    pub material: BTreeMap<String, String>,
    /// Relative placement location
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    /// Placement origin in world coordinates, after the PlacementRelTo chain
    #[serde(default)]
    pub world_position: [f64; 3],
    pub area: Option<f64>,
    pub volume: Option<f64>,
    pub properties: PropertyMap,
    is_structural: bool,
}

impl BimElement {
    /// Create an element with default name, level and placement
    ///
    /// The name defaults to `"{type}_{id}"`.
    pub fn new(
        id: impl Into<String>,
        element_type: impl Into<String>,
        geometry: GeometryPayload,
    ) -> Self {
        let id = id.into();
        let element_type = element_type.into();
        let is_structural = ElementCategory::from_type_name(&element_type).is_structural();
        Self {
            name: format!("{}_{}", element_type, id),
            id,
            global_id: None,
            element_type,
            level: DEFAULT_LEVEL.to_string(),
            geometry,
            material: BTreeMap::new(),
            position: [0.0; 3],
            rotation: [0.0; 3],
            world_position: [0.0; 3],
            area: None,
            volume: None,
            properties: PropertyMap::new(),
            is_structural,
        }
    }

    /// Fixed at construction from the element type
    pub fn is_structural(&self) -> bool {
        self.is_structural
    }

    pub fn category(&self) -> ElementCategory {
        ElementCategory::from_type_name(&self.element_type)
    }

    /// Material `"type"` entry, if any
    pub fn material_type(&self) -> Option<&str> {
        self.material.get("type").map(String::as_str)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_global_id(mut self, global_id: Option<String>) -> Self {
        self.global_id = global_id;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_placement(mut self, position: [f64; 3], rotation: [f64; 3]) -> Self {
        self.position = position;
        self.rotation = rotation;
        self
    }

    pub fn with_world_position(mut self, world_position: [f64; 3]) -> Self {
        self.world_position = world_position;
        self
    }

    pub fn with_material(mut self, material: BTreeMap<String, String>) -> Self {
        self.material = material;
        self
    }

    pub fn with_quantities(mut self, area: Option<f64>, volume: Option<f64>) -> Self {
        self.area = area;
        self.volume = volume;
        self
    }

    pub fn with_properties(mut self, properties: PropertyMap) -> Self {
        self.properties = properties;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dimensions, GeometrySource};

    fn cube() -> GeometryPayload {
        GeometryPayload::new(
            Vec::new(),
            Vec::new(),
            Dimensions::new(2.0, 2.0, 2.0),
            None,
            GeometrySource::MinimalFallback,
        )
    }

    #[test]
    fn test_structural_membership_both_ways() {
        for ty in ["IfcWall", "IfcColumn", "IfcBeam", "IfcSlab", "IfcFooting"] {
            assert!(BimElement::new("1", ty, cube()).is_structural(), "{ty}");
        }
        for ty in ["IfcWindow", "IfcDoor", "IfcRoof", "IfcSpace", "IfcFurniture", "IfcStair"] {
            assert!(!BimElement::new("1", ty, cube()).is_structural(), "{ty}");
        }
    }

    #[test]
    fn test_defaults() {
        let element = BimElement::new("42", "IfcDoor", cube());
        assert_eq!(element.name, "IfcDoor_42");
        assert_eq!(element.level, DEFAULT_LEVEL);
        assert_eq!(element.rotation, [0.0; 3]);
        assert_eq!(element.material_type(), None);
        assert_eq!(element.category(), ElementCategory::Door);
    }

    #[test]
    fn test_is_structural_survives_serialization() {
        let element = BimElement::new("7", "IfcBeam", cube());
        let json = serde_json::to_string(&element).unwrap();
        let back: BimElement = serde_json::from_str(&json).unwrap();
        assert!(back.is_structural());
        assert_eq!(back, element);
    }
}
