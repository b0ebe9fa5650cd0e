// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serializable views for the dashboard
//!
//! - [`ElementView`] - flat `{id, type, name, properties}` dictionary
//! - [`BuildingSummary`] - headline figures of the first building
//! - [`ViewerPayload`] - render groups and insights for the 3D viewer

use crate::parser::UNKNOWN_PROJECT;
use crate::properties::read_properties;
use ifc_estate_model::{
    ArchitecturalStyle, BimElement, BimMaturity, BoundingBox, Building, BuildingRecord,
    ConstructionType, ElementCategory, ElementRecord, EntityId, GeometryPayload, IfcModel,
    IfcModelExt, PropertyMap, PropertyReader, PropertyValue, Record,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder for summary fields with no source data
pub const UNKNOWN: &str = "Unknown";

/// Assumed storey height in metres
const STOREY_HEIGHT: f64 = 3.0;

/// Flat element dictionary
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementView {
    /// GlobalId, or the native id when the element has none
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
    pub name: String,
    pub properties: PropertyMap,
}

impl ElementView {
    pub fn from_record(model: &dyn IfcModel, record: &ElementRecord) -> Self {
        let native = record.id().0.to_string();
        Self {
            name: record
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}_{}", record.class_name(), native)),
            id: record.global_id().map(str::to_string).unwrap_or(native),
            element_type: record.class_name().to_string(),
            properties: read_properties(model, record),
        }
    }
}

/// Headline figures of a model's first building
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub building_type: String,
    pub location: String,
    pub floors: usize,
    /// Sum of storey gross floor areas
    pub area: f64,
    /// Estimated height in metres
    pub height: f64,
    pub year_built: u32,
    pub status: String,
    pub element_count: usize,
}

impl Default for BuildingSummary {
    fn default() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            building_type: UNKNOWN.to_string(),
            location: UNKNOWN.to_string(),
            floors: 0,
            area: 0.0,
            height: 0.0,
            year_built: 0,
            status: UNKNOWN.to_string(),
            element_count: 0,
        }
    }
}

impl BuildingSummary {
    /// Summarize a loaded model; `path` feeds the year fallback
    pub fn from_model(model: &dyn IfcModel, path: &Path) -> Self {
        let reader = model.properties();
        let building = model.building_records().into_iter().next();
        let props = building
            .as_ref()
            .map(|b| flat_properties(reader, b.id()))
            .unwrap_or_default();
        let text = |key: &str| props.get(key).map(|v| v.to_string()).filter(|s| !s.is_empty());

        let storeys = model.storey_records();
        let area = storeys
            .iter()
            .filter_map(|s| number(reader, s.id(), "GrossFloorArea"))
            .sum();
        let height = if storeys.is_empty() {
            0.0
        } else {
            let top = storeys
                .iter()
                .filter_map(|s| s.elevation())
                .map(|e| e * model.unit_scale())
                .fold(0.0, f64::max);
            (top + STOREY_HEIGHT).max(storeys.len() as f64 * STOREY_HEIGHT)
        };

        let name = building
            .as_ref()
            .and_then(|b| b.name())
            .map(str::to_string)
            .or_else(|| model.project().and_then(|p| p.name().map(str::to_string)))
            .unwrap_or_else(|| UNKNOWN_PROJECT.to_string());

        Self {
            name,
            building_type: text("BuildingType").unwrap_or_else(|| UNKNOWN.to_string()),
            location: text("Address")
                .or_else(|| text("Location"))
                .or_else(|| building.as_ref().and_then(|b| postal_address(model, b)))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            floors: storeys.len(),
            area,
            height,
            year_built: props
                .get("YearBuilt")
                .and_then(year_of)
                .or_else(|| year_from_file_name(path))
                .unwrap_or(0),
            status: text("ConstructionStatus").unwrap_or_else(|| UNKNOWN.to_string()),
            element_count: model.element_records().len(),
        }
    }
}

/// Property and quantity values of any rooted entity
fn flat_properties(reader: &dyn PropertyReader, id: EntityId) -> PropertyMap {
    let mut map = PropertyMap::new();
    for property in reader.property_sets(id).into_iter().flat_map(|p| p.properties) {
        map.insert(property.name, property.value);
    }
    for quantity in reader.quantities(id) {
        map.insert(quantity.name, PropertyValue::Number(quantity.value));
    }
    map
}

fn number(reader: &dyn PropertyReader, id: EntityId, name: &str) -> Option<f64> {
    reader
        .get_quantity(id, name)
        .map(|q| q.value)
        .or_else(|| reader.get_property(id, name)?.value.as_number())
}

fn year_of(value: &PropertyValue) -> Option<u32> {
    match value {
        PropertyValue::Number(n) if *n >= 1.0 => Some(*n as u32),
        PropertyValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Year from a `*_YYYY.ifc` file name, any case
pub fn year_from_file_name(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    let lower = name.to_ascii_lowercase();
    let stem = lower.strip_suffix(".ifc")?;
    let digits = stem.get(stem.len().checked_sub(4)?..)?;
    let underscore = stem.get(stem.len().checked_sub(5)?..stem.len() - 4)?;
    if underscore != "_" || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Street lines, town, region and country of the building's IfcPostalAddress
fn postal_address(model: &dyn IfcModel, building: &BuildingRecord) -> Option<String> {
    let address = model.resolver().get(building.address()?)?;
    let mut parts: Vec<String> = address
        .get_list(4)
        .unwrap_or_default()
        .iter()
        .filter_map(|line| line.as_non_empty_string())
        .map(str::to_string)
        .collect();
    parts.extend(
        [6, 7, 9]
            .into_iter()
            .filter_map(|i| address.get_non_empty_string(i))
            .map(str::to_string),
    );
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Render settings of one element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderMaterial {
    pub color: String,
    pub opacity: f64,
    pub material_type: String,
    pub wireframe: bool,
    pub transparent: bool,
}

impl RenderMaterial {
    /// Category colour, with the element's own material type when it has one
    pub fn for_element(element: &BimElement) -> Self {
        let (color, opacity, kind) = match element.category() {
            ElementCategory::Wall => ("#E0E0E0", 0.9, "concrete"),
            ElementCategory::Slab => ("#C0C0C0", 0.9, "concrete"),
            ElementCategory::Column => ("#808080", 0.9, "concrete"),
            ElementCategory::Beam => ("#A0A0A0", 0.9, "steel"),
            ElementCategory::Window => ("#87CEEB", 0.7, "glass"),
            ElementCategory::Door => ("#8B4513", 0.9, "wood"),
            ElementCategory::Roof => ("#654321", 0.9, "tile"),
            _ => ("#CCCCCC", 0.8, "generic"),
        };
        Self {
            color: color.to_string(),
            opacity,
            material_type: element.material_type().unwrap_or(kind).to_string(),
            wireframe: false,
            transparent: opacity < 1.0,
        }
    }
}

/// One element as drawn by the viewer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
    pub name: String,
    pub level: String,
    pub geometry: GeometryPayload,
    pub material: RenderMaterial,
    pub position: [f64; 3],
    pub rotation: [f64; 3],
}

impl From<&BimElement> for MeshEntry {
    fn from(element: &BimElement) -> Self {
        Self {
            id: element.id.clone(),
            element_type: element.element_type.clone(),
            name: element.name.clone(),
            level: element.level.clone(),
            geometry: element.geometry.clone(),
            material: RenderMaterial::for_element(element),
            position: element.position,
            rotation: element.rotation,
        }
    }
}

/// Elements grouped for batched rendering
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshGroups {
    pub structure: Vec<MeshEntry>,
    pub walls: Vec<MeshEntry>,
    pub floors: Vec<MeshEntry>,
    pub roofs: Vec<MeshEntry>,
    pub windows: Vec<MeshEntry>,
    pub doors: Vec<MeshEntry>,
}

impl MeshGroups {
    fn push(&mut self, element: &BimElement) {
        let group = match element.category() {
            ElementCategory::Wall => &mut self.walls,
            ElementCategory::Slab => &mut self.floors,
            ElementCategory::Roof => &mut self.roofs,
            ElementCategory::Window => &mut self.windows,
            ElementCategory::Door => &mut self.doors,
            _ => &mut self.structure,
        };
        group.push(MeshEntry::from(element));
    }

    /// Entries across all groups
    pub fn len(&self) -> usize {
        [
            &self.structure,
            &self.walls,
            &self.floors,
            &self.roofs,
            &self.windows,
            &self.doors,
        ]
        .iter()
        .map(|g| g.len())
        .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingInsights {
    pub architectural_style: ArchitecturalStyle,
    pub construction_type: ConstructionType,
    pub structural_elements: usize,
    pub non_structural_elements: usize,
    pub complexity_score: f64,
    pub bim_maturity_level: BimMaturity,
}

impl From<&Building> for BuildingInsights {
    fn from(building: &Building) -> Self {
        Self {
            architectural_style: building.architectural_style(),
            construction_type: building.construction_type(),
            structural_elements: building.structural_elements().len(),
            non_structural_elements: building.non_structural_elements().len(),
            complexity_score: building.complexity_score(),
            bim_maturity_level: building.bim_maturity(),
        }
    }
}

/// Scene data for the 3D viewer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewerPayload {
    pub mesh_groups: MeshGroups,
    pub bounds: BoundingBox,
    /// Number of rendered entries, one per element
    pub total_triangles: usize,
    pub coordinate_system: String,
    pub building_insights: BuildingInsights,
}

impl From<&Building> for ViewerPayload {
    fn from(building: &Building) -> Self {
        let mut mesh_groups = MeshGroups::default();
        for element in &building.elements {
            mesh_groups.push(element);
        }
        Self {
            total_triangles: mesh_groups.len(),
            mesh_groups,
            bounds: building.bounds,
            coordinate_system: building.coordinate_system.clone(),
            building_insights: BuildingInsights::from(building),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::model_for;
    use ifc_estate_geometry::{parametric_box, unit_cube};
    use ifc_estate_model::Dimensions;
    use std::collections::BTreeMap;

    const SUMMARY: &str = "#1=IFCPROJECT('p',$,'Harbour Project',$,$,$,$,$,$);
#2=IFCBUILDING('b',$,$,$,$,$,$,$,.ELEMENT.,$,$,#30);
#3=IFCBUILDINGSTOREY('s0',$,'Ground',$,$,$,$,$,.ELEMENT.,0.);
#4=IFCBUILDINGSTOREY('s1',$,'First',$,$,$,$,$,.ELEMENT.,4.);
#5=IFCBUILDINGSTOREY('s2',$,'Second',$,$,$,$,$,.ELEMENT.,8.);
#10=IFCPROPERTYSINGLEVALUE('BuildingType',$,IFCLABEL('Office'),$);
#11=IFCPROPERTYSINGLEVALUE('ConstructionStatus',$,IFCLABEL('Completed'),$);
#12=IFCPROPERTYSET('pb',$,'Pset_BuildingCommon',$,(#10,#11));
#13=IFCRELDEFINESBYPROPERTIES('r1',$,$,$,(#2),#12);
#20=IFCQUANTITYAREA('GrossFloorArea',$,$,400.,$);
#21=IFCELEMENTQUANTITY('q',$,'Qto_BuildingStoreyBaseQuantities',$,$,(#20));
#22=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#3,#4),#21);
#23=IFCPROPERTYSINGLEVALUE('GrossFloorArea',$,IFCAREAMEASURE(250.),$);
#24=IFCPROPERTYSET('ps',$,'Pset_Storey',$,(#23));
#25=IFCRELDEFINESBYPROPERTIES('r3',$,$,$,(#5),#24);
#30=IFCPOSTALADDRESS($,$,$,$,('1 Quay Street'),$,'Auckland',$,$,'New Zealand');
#40=IFCWALL('w',$,$,$,$,$,$,$,$);
#41=IFCDOOR('d',$,$,$,$,$,$,$,$,$,$,$,$);";

    #[test]
    fn test_summary() {
        let model = model_for(SUMMARY);
        let summary = BuildingSummary::from_model(model.as_ref(), Path::new("/data/harbour_2019.IFC"));

        // Unnamed building takes the project name
        assert_eq!(summary.name, "Harbour Project");
        assert_eq!(summary.building_type, "Office");
        assert_eq!(summary.status, "Completed");
        assert_eq!(summary.location, "1 Quay Street, Auckland, New Zealand");
        assert_eq!(summary.floors, 3);
        assert_eq!(summary.area, 1050.0);
        assert_eq!(summary.height, 11.0);
        assert_eq!(summary.year_built, 2019);
        assert_eq!(summary.element_count, 2);
    }

    #[test]
    fn test_summary_defaults() {
        let model = model_for("#1=IFCWALL('w',$,$,$,$,$,$,$,$);");
        let summary = BuildingSummary::from_model(model.as_ref(), Path::new("plain.ifc"));
        assert_eq!(summary.name, UNKNOWN_PROJECT);
        assert_eq!(summary.building_type, UNKNOWN);
        assert_eq!(summary.location, UNKNOWN);
        assert_eq!(summary.floors, 0);
        assert_eq!(summary.height, 0.0);
        assert_eq!(summary.year_built, 0);
        assert_eq!(summary.element_count, 1);

        let json = serde_json::to_value(BuildingSummary::default()).unwrap();
        assert_eq!(json["type"], "Unknown");
        assert_eq!(json["floors"], 0);
    }

    #[test]
    fn test_year_from_file_name() {
        assert_eq!(year_from_file_name(Path::new("tower_2023.ifc")), Some(2023));
        assert_eq!(year_from_file_name(Path::new("TOWER_1999.IFC")), Some(1999));
        assert_eq!(year_from_file_name(Path::new("tower2023.ifc")), None);
        assert_eq!(year_from_file_name(Path::new("tower_20x3.ifc")), None);
        assert_eq!(year_from_file_name(Path::new("tower_2023.ifczip")), None);
        assert_eq!(year_from_file_name(Path::new("2023.ifc")), None);
    }

    #[test]
    fn test_element_view() {
        let model = model_for(
            "#1=IFCWINDOW('0aBcD',$,'Window A',$,$,$,$,$,$,$,$,$,$);
#2=IFCSLAB($,$,$,$,$,$,$,$,$);",
        );
        let window = ElementView::from_record(model.as_ref(), &model.element(EntityId(1)).unwrap());
        assert_eq!(window.id, "0aBcD");
        assert_eq!(window.name, "Window A");
        assert_eq!(window.properties["ElementType"], "Window".into());

        let slab = ElementView::from_record(model.as_ref(), &model.element(EntityId(2)).unwrap());
        assert_eq!(slab.id, "2");
        assert_eq!(slab.name, "IfcSlab_2");

        let json = serde_json::to_value(&slab).unwrap();
        assert_eq!(json["type"], "IfcSlab");
    }

    fn element(id: &str, ty: &str, material: Option<&str>) -> BimElement {
        let geometry = parametric_box(Dimensions::new(1.0, 1.0, 1.0), ty).unwrap();
        let mut mapping = BTreeMap::new();
        if let Some(m) = material {
            mapping.insert("type".to_string(), m.to_string());
        }
        BimElement::new(id, ty, geometry).with_material(mapping)
    }

    #[test]
    fn test_render_materials() {
        let window = RenderMaterial::for_element(&element("1", "IfcWindow", None));
        assert_eq!(window.color, "#87CEEB");
        assert_eq!(window.material_type, "glass");
        assert!(window.transparent);
        assert!(!window.wireframe);

        let wall = RenderMaterial::for_element(&element("2", "IfcWallStandardCase", Some("Brick")));
        assert_eq!(wall.color, "#E0E0E0");
        assert_eq!(wall.material_type, "Brick");

        let other = RenderMaterial::for_element(&BimElement::new("3", "IfcFurniture", unit_cube()));
        assert_eq!(other.color, "#CCCCCC");
        assert_eq!(other.material_type, "generic");
        assert_eq!(other.opacity, 0.8);
    }

    #[test]
    fn test_viewer_payload() {
        let building = Building::new("5", "Tower", BoundingBox::placeholder()).with_elements(vec![
            element("1", "IfcWall", Some("Concrete")),
            element("2", "IfcWall", Some("Concrete")),
            element("3", "IfcSlab", Some("Concrete")),
            element("4", "IfcWindow", None),
            element("5", "IfcColumn", Some("Steel")),
            element("6", "IfcFurniture", None),
        ]);
        let payload = ViewerPayload::from(&building);

        assert_eq!(payload.mesh_groups.walls.len(), 2);
        assert_eq!(payload.mesh_groups.floors.len(), 1);
        assert_eq!(payload.mesh_groups.windows.len(), 1);
        assert_eq!(payload.mesh_groups.structure.len(), 2);
        assert!(payload.mesh_groups.doors.is_empty());
        assert_eq!(payload.total_triangles, 6);
        assert_eq!(payload.coordinate_system, "metric");

        let insights = &payload.building_insights;
        assert_eq!(insights.structural_elements, 4);
        assert_eq!(insights.non_structural_elements, 2);
        assert_eq!(insights.architectural_style, ArchitecturalStyle::ModernCommercial);
        assert_eq!(insights.construction_type, ConstructionType::Concrete);
        assert_eq!(insights.complexity_score, 0.25);

        let json = serde_json::to_value(&payload).unwrap();
        // Fallback boxes count as geometry: (6 + 4) / 12
        assert_eq!(json["building_insights"]["bim_maturity_level"], "LOD 400+");
        assert_eq!(json["mesh_groups"]["walls"][0]["type"], "IfcWall");
        assert_eq!(json["mesh_groups"]["walls"][0]["geometry"]["type"], "BufferGeometry");
    }
}
