// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building and model aggregates with their derived metrics

use crate::{
    ArchitecturalStyle, BimElement, BimMaturity, BoundingBox, ComplexityLevel, ConstructionType,
    ElementCategory, GeometryCompleteness,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default coordinate-system tag
pub const METRIC: &str = "metric";

/// A building and the elements assigned to it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub elements: Vec<BimElement>,
    pub bounds: BoundingBox,
    pub coordinate_system: String,
    /// Geometry reading used by [`Building::bim_maturity`]
    #[serde(default)]
    pub maturity_basis: GeometryCompleteness,
}

impl Building {
    pub fn new(id: impl Into<String>, name: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            elements: Vec::new(),
            bounds,
            coordinate_system: METRIC.to_string(),
            maturity_basis: GeometryCompleteness::default(),
        }
    }

    pub fn with_elements(mut self, elements: Vec<BimElement>) -> Self {
        self.elements = elements;
        self
    }

    pub fn with_maturity_basis(mut self, basis: GeometryCompleteness) -> Self {
        self.maturity_basis = basis;
        self
    }

    fn slabs(&self) -> impl Iterator<Item = &BimElement> {
        self.elements
            .iter()
            .filter(|e| e.category() == ElementCategory::Slab)
    }

    fn count_of(&self, category: ElementCategory) -> usize {
        self.elements
            .iter()
            .filter(|e| e.category() == category)
            .count()
    }

    /// Distinct storey levels among slabs, at least one
    pub fn floor_count(&self) -> usize {
        let levels: BTreeSet<&str> = self.slabs().map(|e| e.level.as_str()).collect();
        levels.len().max(1)
    }

    /// Sum of slab areas where known
    pub fn total_floor_area(&self) -> f64 {
        self.slabs().filter_map(|e| e.area).sum()
    }

    pub fn complexity_level(&self) -> ComplexityLevel {
        ComplexityLevel::for_building(self.elements.len())
    }

    pub fn architectural_style(&self) -> ArchitecturalStyle {
        ArchitecturalStyle::from_counts(
            self.count_of(ElementCategory::Window),
            self.count_of(ElementCategory::Wall),
        )
    }

    /// Majority vote over material names mentioning steel or concrete
    pub fn construction_type(&self) -> ConstructionType {
        let (mut steel, mut concrete) = (0, 0);
        for material in self.elements.iter().filter_map(|e| e.material_type()) {
            let material = material.to_lowercase();
            if material.contains("steel") {
                steel += 1;
            }
            if material.contains("concrete") {
                concrete += 1;
            }
        }
        ConstructionType::from_votes(steel, concrete)
    }

    /// Distinct element types over twenty, capped at one
    pub fn complexity_score(&self) -> f64 {
        let types: BTreeSet<&str> = self.elements.iter().map(|e| e.element_type.as_str()).collect();
        (types.len() as f64 / 20.0).min(1.0)
    }

    /// Average geometry and material completeness
    ///
    /// Geometry completeness follows [`Building::maturity_basis`].
    pub fn bim_maturity(&self) -> BimMaturity {
        if self.elements.is_empty() {
            return BimMaturity::Lod100;
        }
        let total: f64 = self
            .elements
            .iter()
            .map(|e| {
                let geometry = f64::from(u8::from(self.maturity_basis.counts(&e.geometry)));
                let material = f64::from(u8::from(!e.material.is_empty()));
                (geometry + material) / 2.0
            })
            .sum();
        BimMaturity::from_score(total / self.elements.len() as f64)
    }

    pub fn structural_elements(&self) -> Vec<&BimElement> {
        self.elements.iter().filter(|e| e.is_structural()).collect()
    }

    pub fn non_structural_elements(&self) -> Vec<&BimElement> {
        self.elements.iter().filter(|e| !e.is_structural()).collect()
    }
}

/// Project metadata carried by a model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub description: Option<String>,
    pub schema: String,
}

/// Aggregate root of one parse
///
/// Always holds at least one building.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub file_path: String,
    pub schema: String,
    pub buildings: Vec<Building>,
    pub project: ProjectInfo,
    pub global_bounds: BoundingBox,
    pub total_elements: usize,
    pub file_size_bytes: u64,
    /// Set when the model stands in for a file that could not be read
    pub degraded: bool,
    pub warnings: Vec<String>,
}

impl Model {
    /// Stand-in model for an unreadable file
    pub fn fallback(file_path: impl Into<String>, warning: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            schema: "IFC2X3".to_string(),
            buildings: vec![Building::new("fallback", "Fallback Building", BoundingBox::fallback())],
            project: ProjectInfo {
                name: "Fallback Project".to_string(),
                description: None,
                schema: "IFC2X3".to_string(),
            },
            global_bounds: BoundingBox::fallback(),
            total_elements: 0,
            file_size_bytes: 0,
            degraded: true,
            warnings: vec![warning.into()],
        }
    }

    pub fn complexity(&self) -> ComplexityLevel {
        ComplexityLevel::for_model(self.total_elements)
    }

    /// First building, if any
    pub fn primary_building(&self) -> Option<&Building> {
        self.buildings.first()
    }

    /// Elements across all buildings
    pub fn elements(&self) -> impl Iterator<Item = &BimElement> {
        self.buildings.iter().flat_map(|b| b.elements.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dimensions, GeometryPayload, GeometrySource};
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn payload(source: GeometrySource) -> GeometryPayload {
        GeometryPayload::new(Vec::new(), Vec::new(), Dimensions::new(1.0, 1.0, 1.0), None, source)
    }

    fn element(id: usize, ty: &str) -> BimElement {
        BimElement::new(id.to_string(), ty, payload(GeometrySource::OptimizedFallback))
    }

    fn material(name: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("type".to_string(), name.to_string())])
    }

    fn building(elements: Vec<BimElement>) -> Building {
        Building::new("1", "Test", BoundingBox::placeholder()).with_elements(elements)
    }

    #[test]
    fn test_floor_count_and_area() {
        let b = building(vec![
            element(1, "IfcSlab").with_level("Level 1").with_quantities(Some(100.0), None),
            element(2, "IfcSlab").with_level("Level 2").with_quantities(Some(80.5), None),
            element(3, "IfcSlabStandardCase").with_level("Level 2"),
            element(4, "IfcWall").with_level("Level 3").with_quantities(Some(12.0), None),
        ]);
        assert_eq!(b.floor_count(), 2);
        assert_relative_eq!(b.total_floor_area(), 180.5);
    }

    #[test]
    fn test_empty_building_metrics() {
        let b = building(Vec::new());
        assert_eq!(b.floor_count(), 1);
        assert_relative_eq!(b.total_floor_area(), 0.0);
        assert_eq!(b.complexity_level(), ComplexityLevel::Low);
        assert_eq!(b.construction_type(), ConstructionType::Mixed);
        assert_eq!(b.bim_maturity(), BimMaturity::Lod100);
        assert_relative_eq!(b.complexity_score(), 0.0);
    }

    #[test]
    fn test_construction_vote() {
        let b = building(vec![
            element(1, "IfcBeam").with_material(material("Steel S355")),
            element(2, "IfcColumn").with_material(material("STEEL")),
            element(3, "IfcSlab").with_material(material("Concrete C30/37")),
        ]);
        assert_eq!(b.construction_type(), ConstructionType::SteelFrame);
    }

    #[test]
    fn test_style_uses_window_to_wall_ratio() {
        let mut elements: Vec<_> = (0..10).map(|i| element(i, "IfcWall")).collect();
        elements.extend((10..14).map(|i| element(i, "IfcWindow")));
        assert_eq!(building(elements).architectural_style(), ArchitecturalStyle::ModernCommercial);
    }

    #[test]
    fn test_maturity_counts_any_payload() {
        let authentic = BimElement::new("1", "IfcWall", payload(GeometrySource::Authentic))
            .with_material(material("Brick"));
        let boxed = element(2, "IfcWall").with_material(material("Brick"));
        let bare = element(3, "IfcWall");
        assert_eq!(building(vec![authentic.clone()]).bim_maturity(), BimMaturity::Lod400Plus);
        // Fallback boxes count as geometry
        assert_eq!(building(vec![boxed.clone()]).bim_maturity(), BimMaturity::Lod400Plus);
        // (1.0 + 1.0 + 1.0 + 0.0) / 4
        assert_eq!(building(vec![authentic, bare]).bim_maturity(), BimMaturity::Lod300);
        // (1.0 + 0.0) / 2
        assert_eq!(building(vec![element(4, "IfcWall")]).bim_maturity(), BimMaturity::Lod200);
    }

    #[test]
    fn test_maturity_authentic_only() {
        let authentic = BimElement::new("1", "IfcWall", payload(GeometrySource::Authentic))
            .with_material(material("Brick"));
        let boxed = element(2, "IfcWall").with_material(material("Brick"));
        let rate = |elements: Vec<BimElement>| {
            building(elements)
                .with_maturity_basis(GeometryCompleteness::AuthenticOnly)
                .bim_maturity()
        };
        assert_eq!(rate(vec![authentic.clone()]), BimMaturity::Lod400Plus);
        // (0.0 + 1.0) / 2
        assert_eq!(rate(vec![boxed.clone()]), BimMaturity::Lod200);
        // (1.0 + 1.0 + 0.0 + 1.0) / 4
        assert_eq!(rate(vec![authentic, boxed]), BimMaturity::Lod300);
    }

    #[test]
    fn test_structural_partition_and_score() {
        let b = building(vec![
            element(1, "IfcWall"),
            element(2, "IfcDoor"),
            element(3, "IfcFooting"),
            element(4, "IfcFurniture"),
        ]);
        assert_eq!(b.structural_elements().len(), 2);
        assert_eq!(b.non_structural_elements().len(), 2);
        assert_relative_eq!(b.complexity_score(), 0.2);
    }

    #[test]
    fn test_fallback_model() {
        let model = Model::fallback("missing.ifc", "file not found");
        assert_eq!(model.buildings.len(), 1);
        assert_eq!(model.buildings[0].id, "fallback");
        assert_eq!(model.total_elements, 0);
        assert_eq!(model.file_size_bytes, 0);
        assert!(model.degraded);
        assert_eq!(model.project.name, "Fallback Project");
        assert_eq!(model.primary_building().map(|b| b.name.as_str()), Some("Fallback Building"));
    }
}
