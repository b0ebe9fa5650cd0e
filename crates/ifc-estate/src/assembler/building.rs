// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building assembly
//!
//! Distributes assembled elements over the native buildings and derives each
//! building's extent. A model without buildings gets one synthetic building
//! holding every element.

use crate::config::{BoundsPolicy, ElementPartition, ParserConfig};
use ifc_estate_model::{
    BimElement, BoundingBox, Building, BuildingRecord, EntityId, GeometryCompleteness, IfcModel,
    Record,
};
use log::debug;

/// Id of the building synthesized for models without one
pub const MAIN_BUILDING_ID: &str = "main_building";
pub const MAIN_BUILDING_NAME: &str = "Main Building";
/// Name for a native building that carries none
pub const DEFAULT_BUILDING_NAME: &str = "Building";

/// Turns native building records and assembled elements into [`Building`]s
#[derive(Debug, Clone)]
pub struct BuildingAssembler {
    partition: ElementPartition,
    bounds: BoundsPolicy,
    coordinate_system: String,
    maturity_basis: GeometryCompleteness,
}

impl BuildingAssembler {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            partition: config.partition,
            bounds: config.bounds,
            coordinate_system: config.coordinate_system.clone(),
            maturity_basis: config.maturity_basis,
        }
    }

    /// Build one native building around its elements
    pub fn assemble(&self, record: &BuildingRecord, elements: Vec<BimElement>) -> Building {
        let name = record.name().unwrap_or(DEFAULT_BUILDING_NAME);
        self.finish(record.id().0.to_string(), name, elements)
    }

    /// Single building wrapping every element
    pub fn synthetic(&self, elements: Vec<BimElement>) -> Building {
        self.finish(MAIN_BUILDING_ID, MAIN_BUILDING_NAME, elements)
    }

    /// Build every building of a model
    ///
    /// `elements` pairs each assembled element with its native id, in file
    /// order. The order is kept within each building.
    pub fn assemble_all(
        &self,
        model: &dyn IfcModel,
        records: &[BuildingRecord],
        elements: Vec<(EntityId, BimElement)>,
    ) -> Vec<Building> {
        if records.is_empty() {
            debug!("no native buildings, wrapping {} elements", elements.len());
            return vec![self.synthetic(elements.into_iter().map(|(_, e)| e).collect())];
        }

        self.partition(model, records, elements)
            .into_iter()
            .zip(records)
            .map(|(members, record)| self.assemble(record, members))
            .collect()
    }

    /// Element lists, one per building record
    fn partition(
        &self,
        model: &dyn IfcModel,
        records: &[BuildingRecord],
        elements: Vec<(EntityId, BimElement)>,
    ) -> Vec<Vec<BimElement>> {
        let mut groups = vec![Vec::new(); records.len()];
        match self.partition {
            ElementPartition::AllElements => {
                let all: Vec<BimElement> = elements.into_iter().map(|(_, e)| e).collect();
                groups.fill(all);
            }
            ElementPartition::SpatialContainment => {
                let spatial = model.spatial();
                for (id, element) in elements {
                    let slot = spatial
                        .building_of(id)
                        .and_then(|b| records.iter().position(|r| r.id() == b))
                        .unwrap_or(0);
                    groups[slot].push(element);
                }
            }
        }
        groups
    }

    fn finish(&self, id: impl Into<String>, name: &str, elements: Vec<BimElement>) -> Building {
        let bounds = match self.bounds {
            BoundsPolicy::Placeholder => BoundingBox::placeholder(),
            BoundsPolicy::Computed => extent(&elements).unwrap_or_else(BoundingBox::placeholder),
        };
        let mut building = Building::new(id, name, bounds)
            .with_elements(elements)
            .with_maturity_basis(self.maturity_basis);
        building.coordinate_system = self.coordinate_system.clone();
        building
    }
}

/// Union of element geometry in world space
///
/// Kernel meshes are already placed; boxes are centred on the element's
/// world placement origin.
pub fn extent(elements: &[BimElement]) -> Option<BoundingBox> {
    let boxes: Vec<BoundingBox> = elements
        .iter()
        .filter_map(|e| {
            let bounds = e.geometry.bounds()?;
            Some(if e.geometry.has_authentic_geometry {
                bounds
            } else {
                bounds.translated(e.world_position)
            })
        })
        .collect();
    BoundingBox::union_all(&boxes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::ElementAssembler;
    use crate::tests::{model_for, FailingKernel};
    use approx::assert_relative_eq;
    use ifc_estate_geometry::{parametric_box, unit_cube, ShapeKernel};
    use ifc_estate_model::{Dimensions, GeometryPayload, GeometrySource, IfcModelExt};

    const TWO_BUILDINGS: &str = "#1=IFCPROJECT('p',$,'Estate',$,$,$,$,$,$);
#2=IFCSITE('s',$,'Site',$,$,$,$,$,.ELEMENT.,$,$,$,$,$);
#3=IFCBUILDING('b1',$,'North',$,$,$,$,$,.ELEMENT.,$,$,$);
#4=IFCBUILDING('b2',$,$,$,$,$,$,$,.ELEMENT.,$,$,$);
#5=IFCRELAGGREGATES('a1',$,$,$,#1,(#2));
#6=IFCRELAGGREGATES('a2',$,$,$,#2,(#3,#4));
#7=IFCBUILDINGSTOREY('st',$,'Ground',$,$,$,$,$,.ELEMENT.,0.);
#8=IFCRELAGGREGATES('a3',$,$,$,#4,(#7));
#10=IFCWALL('w1',$,$,$,$,$,$,$,$);
#11=IFCWALL('w2',$,$,$,$,$,$,$,$);
#12=IFCDOOR('d1',$,$,$,$,$,$,$,$,$,$,$,$);
#13=IFCRELCONTAINEDINSPATIALSTRUCTURE('c1',$,$,$,(#10),#3);
#14=IFCRELCONTAINEDINSPATIALSTRUCTURE('c2',$,$,$,(#11),#7);";

    fn boxed(id: u32, ty: &str, position: [f64; 3]) -> (EntityId, BimElement) {
        let geometry = parametric_box(Dimensions::new(2.0, 2.0, 2.0), ty).unwrap();
        let element = BimElement::new(id.to_string(), ty, geometry)
            .with_placement(position, [0.0; 3])
            .with_world_position(position);
        (EntityId(id), element)
    }

    fn elements() -> Vec<(EntityId, BimElement)> {
        vec![
            boxed(10, "IfcWall", [0.0; 3]),
            boxed(11, "IfcWall", [10.0, 0.0, 0.0]),
            boxed(12, "IfcDoor", [0.0, 5.0, 0.0]),
        ]
    }

    fn ids(building: &Building) -> Vec<&str> {
        building.elements.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_spatial_partition() {
        let model = model_for(TWO_BUILDINGS);
        let records = model.building_records();
        let assembler = BuildingAssembler::new(&ParserConfig::default());
        let buildings = assembler.assemble_all(model.as_ref(), &records, elements());

        assert_eq!(buildings.len(), 2);
        assert_eq!(buildings[0].id, "3");
        assert_eq!(buildings[0].name, "North");
        // Uncontained door lands in the first building
        assert_eq!(ids(&buildings[0]), vec!["10", "12"]);
        assert_eq!(buildings[1].name, DEFAULT_BUILDING_NAME);
        assert_eq!(ids(&buildings[1]), vec!["11"]);
        assert_eq!(
            buildings[1].bounds,
            BoundingBox::new([9.0, -1.0, -1.0], [11.0, 1.0, 1.0])
        );
    }

    #[test]
    fn test_all_elements_partition() {
        let model = model_for(TWO_BUILDINGS);
        let records = model.building_records();
        let config = ParserConfig::default()
            .with_partition(ElementPartition::AllElements)
            .with_bounds(BoundsPolicy::Placeholder);
        let buildings = BuildingAssembler::new(&config).assemble_all(model.as_ref(), &records, elements());

        for building in &buildings {
            assert_eq!(ids(building), vec!["10", "11", "12"]);
            assert_eq!(building.bounds, BoundingBox::placeholder());
        }
    }

    #[test]
    fn test_synthetic_building() {
        let config = ParserConfig::default()
            .with_coordinate_system("local")
            .with_maturity_basis(GeometryCompleteness::AuthenticOnly);
        let model = model_for("#1=IFCWALL('w',$,$,$,$,$,$,$,$);");
        let buildings = BuildingAssembler::new(&config).assemble_all(model.as_ref(), &[], elements());

        assert_eq!(buildings.len(), 1);
        assert_eq!(buildings[0].id, MAIN_BUILDING_ID);
        assert_eq!(buildings[0].name, MAIN_BUILDING_NAME);
        assert_eq!(buildings[0].elements.len(), 3);
        assert_eq!(buildings[0].coordinate_system, "local");
        assert_eq!(buildings[0].maturity_basis, GeometryCompleteness::AuthenticOnly);
        assert_eq!(
            buildings[0].bounds,
            BoundingBox::new([-1.0, -1.0, -1.0], [11.0, 6.0, 1.0])
        );
    }

    #[test]
    fn test_empty_building_uses_placeholder() {
        let assembler = BuildingAssembler::new(&ParserConfig::default());
        assert_eq!(assembler.synthetic(Vec::new()).bounds, BoundingBox::placeholder());
    }

    #[test]
    fn test_extent_keeps_authentic_geometry_in_place() {
        let mesh = GeometryPayload::new(
            vec![[100.0, 0.0, 0.0], [101.0, 1.0, 0.0], [100.0, 1.0, 3.0]],
            vec![[0, 1, 2]],
            Dimensions::new(1.0, 1.0, 3.0),
            Some("IfcWall".into()),
            GeometrySource::Authentic,
        );
        let placed = BimElement::new("1", "IfcWall", mesh).with_placement([100.0, 0.0, 0.0], [0.0; 3]);
        let cube = BimElement::new("2", "IfcFurniture", unit_cube());

        let bounds = extent(&[placed, cube]).unwrap();
        assert_eq!(bounds, BoundingBox::new([-1.0, -1.0, -1.0], [101.0, 1.0, 3.0]));
        assert!(extent(&[]).is_none());
    }

    const RAISED_STOREY: &str = "#1=IFCPROJECT('p',$,'Project',$,$,$,$,$,#90);
#2=IFCBUILDING('b',$,'Tower',$,$,#20,$,$,.ELEMENT.,$,$,$);
#3=IFCBUILDINGSTOREY('s',$,'Level 4',$,$,#21,$,$,.ELEMENT.,10000.);
#4=IFCRELAGGREGATES('a1',$,$,$,#1,(#2));
#5=IFCRELAGGREGATES('a2',$,$,$,#2,(#3));
#10=IFCWALL('w',$,'Wall',$,$,#22,$,$,$);
#11=IFCRELCONTAINEDINSPATIALSTRUCTURE('c',$,$,$,(#10),#3);
#12=IFCQUANTITYLENGTH('Length',$,$,4000.,$);
#13=IFCQUANTITYLENGTH('Width',$,$,250.,$);
#14=IFCQUANTITYLENGTH('Height',$,$,2800.,$);
#15=IFCELEMENTQUANTITY('q',$,'Qto_WallBaseQuantities',$,$,(#12,#13,#14));
#16=IFCRELDEFINESBYPROPERTIES('r',$,$,$,(#10),#15);
#20=IFCLOCALPLACEMENT($,#30);
#21=IFCLOCALPLACEMENT(#20,#31);
#22=IFCLOCALPLACEMENT(#21,#32);
#30=IFCAXIS2PLACEMENT3D(#40,$,$);
#31=IFCAXIS2PLACEMENT3D(#41,$,$);
#32=IFCAXIS2PLACEMENT3D(#42,$,$);
#40=IFCCARTESIANPOINT((0.,0.,0.));
#41=IFCCARTESIANPOINT((0.,0.,10000.));
#42=IFCCARTESIANPOINT((1000.,0.,0.));
#90=IFCUNITASSIGNMENT((#91));
#91=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);";

    #[test]
    fn test_fallback_boxes_in_world_metres() {
        let model = model_for(RAISED_STOREY);
        let kernel = FailingKernel;
        let session = kernel.session(model.as_ref());
        let wall = ElementAssembler::new(model.as_ref(), session.as_ref())
            .assemble(&model.element(EntityId(10)).unwrap())
            .unwrap();

        // Position stays relative to the storey, the world origin does not
        assert_relative_eq!(wall.position[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(wall.position[2], 0.0, epsilon = 1e-9);
        assert_relative_eq!(wall.world_position[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(wall.world_position[2], 10.0, epsilon = 1e-9);

        let [width, height, depth] = wall.geometry.parameters.as_array();
        assert_relative_eq!(width, 4.0, epsilon = 1e-9);
        assert_relative_eq!(height, 0.25, epsilon = 1e-9);
        assert_relative_eq!(depth, 2.8, epsilon = 1e-9);

        let records = model.building_records();
        let buildings = BuildingAssembler::new(&ParserConfig::default()).assemble_all(
            model.as_ref(),
            &records,
            vec![(EntityId(10), wall)],
        );
        let bounds = buildings[0].bounds;
        assert_relative_eq!(bounds.min_x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.max_x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.min_y, -0.125, epsilon = 1e-9);
        assert_relative_eq!(bounds.max_y, 0.125, epsilon = 1e-9);
        assert_relative_eq!(bounds.min_z, 8.6, epsilon = 1e-9);
        assert_relative_eq!(bounds.max_z, 11.4, epsilon = 1e-9);
    }
}
