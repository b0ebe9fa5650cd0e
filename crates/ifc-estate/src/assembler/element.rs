// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element assembly: one native element record into one [`BimElement`]

use crate::properties::read_properties;
use ifc_estate_geometry::{local_frame, object_placement, GeometryExtractor, ShapeSession};
use ifc_estate_model::{
    BimElement, ElementRecord, EntityResolverExt, IfcModel, IfcModelExt, ProductRecord, Quantity,
    QuantityType, Record, DEFAULT_LEVEL,
};
use log::debug;
use std::collections::BTreeMap;

/// Level label for a storey that carries no name
pub const UNNAMED_LEVEL: &str = "Level 1";

/// Material label for an association without a usable name
pub const UNKNOWN_MATERIAL: &str = "Unknown";

/// Builds [`BimElement`]s from element records of one model
pub struct ElementAssembler<'a> {
    model: &'a dyn IfcModel,
    extractor: GeometryExtractor<'a>,
}

impl<'a> ElementAssembler<'a> {
    pub fn new(model: &'a dyn IfcModel, session: &'a dyn ShapeSession) -> Self {
        Self {
            model,
            extractor: GeometryExtractor::new(session).with_unit_scale(model.unit_scale()),
        }
    }

    /// Assemble an element
    ///
    /// Returns `None` only when the record's handle no longer resolves in
    /// the model. Every other sub-step falls back to a default.
    pub fn assemble(&self, record: &ElementRecord) -> Option<BimElement> {
        let id = record.id();
        if !self.model.resolver().exists(id) {
            debug!("element {} does not resolve", id);
            return None;
        }

        let properties = read_properties(self.model, record);
        let geometry = self.extractor.extract(record, self.model.properties());
        let (position, rotation) = self.placement(record);
        let world_position = self.world_position(record).unwrap_or(position);
        let quantities = self.model.properties().quantities(id);

        let mut element = BimElement::new(id.0.to_string(), record.class_name(), geometry)
            .with_global_id(record.global_id().map(str::to_string))
            .with_level(self.level(record))
            .with_placement(position, rotation)
            .with_world_position(world_position)
            .with_material(self.material(record))
            .with_quantities(
                pick(&quantities, QuantityType::Area, &["NetArea", "GrossArea"]),
                pick(&quantities, QuantityType::Volume, &["NetVolume", "GrossVolume"]),
            )
            .with_properties(properties);
        if let Some(name) = record.name() {
            element = element.with_name(name);
        }
        Some(element)
    }

    /// Relative placement location in metres and rotation about Z
    fn placement(&self, record: &ElementRecord) -> ([f64; 3], [f64; 3]) {
        let Some(frame) = record
            .placement()
            .and_then(|p| local_frame(self.model.resolver(), p))
        else {
            return ([0.0; 3], [0.0; 3]);
        };

        let scale = self.model.unit_scale();
        let location = frame.location.coords * scale;
        (
            [location.x, location.y, location.z],
            [0.0, 0.0, frame.rotation_z()],
        )
    }

    /// World placement origin in metres
    fn world_position(&self, record: &ElementRecord) -> Option<[f64; 3]> {
        let transform = object_placement(self.model.resolver(), record.placement()?)?;
        let scale = self.model.unit_scale();
        Some([
            transform[(0, 3)] * scale,
            transform[(1, 3)] * scale,
            transform[(2, 3)] * scale,
        ])
    }

    fn level(&self, record: &ElementRecord) -> String {
        match self
            .model
            .spatial()
            .containing_storey(record.id())
            .and_then(|id| self.model.storey(id))
        {
            Some(storey) => storey.name().unwrap_or(UNNAMED_LEVEL).to_string(),
            None => DEFAULT_LEVEL.to_string(),
        }
    }

    fn material(&self, record: &ElementRecord) -> BTreeMap<String, String> {
        let mut material = BTreeMap::new();
        if let Some(definition) = self.model.properties().material(record.id()) {
            let name = definition.primary_name().unwrap_or(UNKNOWN_MATERIAL);
            material.insert("type".to_string(), name.to_string());
        }
        material
    }
}

/// First quantity named in `preferred`, else any quantity of the kind
fn pick(quantities: &[Quantity], kind: QuantityType, preferred: &[&str]) -> Option<f64> {
    preferred
        .iter()
        .find_map(|name| quantities.iter().find(|q| q.name == *name))
        .or_else(|| quantities.iter().find(|q| q.quantity_type == kind))
        .map(|q| q.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{model_for, FailingKernel};
    use approx::assert_relative_eq;
    use ifc_estate_geometry::{GeometryRouter, ShapeKernel};
    use ifc_estate_model::{EntityId, GeometrySource};

    const ELEMENTS: &str = "#1=IFCPROJECT('p',$,'Project',$,$,$,$,$,#90);
#2=IFCBUILDING('b',$,'Block A',$,$,$,$,$,$,$,$,$);
#3=IFCBUILDINGSTOREY('s1',$,'Level 3',$,$,$,$,$,.ELEMENT.,6.);
#4=IFCBUILDINGSTOREY('s2',$,$,$,$,$,$,$,.ELEMENT.,9.);
#5=IFCRELAGGREGATES('a1',$,$,$,#1,(#2));
#6=IFCRELAGGREGATES('a2',$,$,$,#2,(#3,#4));
#10=IFCSLAB('3vB2YO$MX4xv5uCqZZG05x',$,'Floor slab',$,$,#20,$,$,$);
#11=IFCCOLUMN('c',$,$,$,$,$,$,$,$);
#12=IFCDOOR('d',$,'Door',$,$,$,$,$,$,$,$,$,$);
#13=IFCRELCONTAINEDINSPATIALSTRUCTURE('c1',$,$,$,(#10),#3);
#14=IFCRELCONTAINEDINSPATIALSTRUCTURE('c2',$,$,$,(#11),#4);
#20=IFCLOCALPLACEMENT($,#21);
#21=IFCAXIS2PLACEMENT3D(#22,$,#23);
#22=IFCCARTESIANPOINT((2000.,500.));
#23=IFCDIRECTION((0.,1.,0.));
#30=IFCQUANTITYAREA('GrossArea',$,$,36.,$);
#31=IFCQUANTITYAREA('NetArea',$,$,34.5,$);
#32=IFCQUANTITYVOLUME('Bulk',$,$,10.8,$);
#33=IFCELEMENTQUANTITY('q',$,'Qto_SlabBaseQuantities',$,$,(#30,#31,#32));
#34=IFCRELDEFINESBYPROPERTIES('r',$,$,$,(#10),#33);
#40=IFCMATERIAL('Concrete C30/37',$,$);
#41=IFCRELASSOCIATESMATERIAL('m1',$,$,$,(#10),#40);
#42=IFCMATERIAL('',$,$);
#43=IFCRELASSOCIATESMATERIAL('m2',$,$,$,(#11),#42);
#90=IFCUNITASSIGNMENT((#91));
#91=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);";

    fn assemble(id: u32) -> BimElement {
        let model = model_for(ELEMENTS);
        let kernel = FailingKernel;
        let session = kernel.session(model.as_ref());
        let assembler = ElementAssembler::new(model.as_ref(), session.as_ref());
        let record = model.element(EntityId(id)).unwrap();
        assembler.assemble(&record).unwrap()
    }

    #[test]
    fn test_full_element() {
        let slab = assemble(10);
        assert_eq!(slab.id, "10");
        assert_eq!(slab.global_id.as_deref(), Some("3vB2YO$MX4xv5uCqZZG05x"));
        assert_eq!(slab.element_type, "IfcSlab");
        assert_eq!(slab.name, "Floor slab");
        assert_eq!(slab.level, "Level 3");
        assert_eq!(slab.material_type(), Some("Concrete C30/37"));
        assert_eq!(slab.area, Some(34.5));
        assert_eq!(slab.volume, Some(10.8));
        assert!(slab.is_structural());

        // Millimetre file, 2D location padded with zero
        assert_relative_eq!(slab.position[0], 2.0);
        assert_relative_eq!(slab.position[1], 0.5);
        assert_relative_eq!(slab.position[2], 0.0);
        assert_relative_eq!(slab.rotation[2], std::f64::consts::FRAC_PI_2);
        assert_eq!(slab.rotation[0], 0.0);
    }

    #[test]
    fn test_defaults() {
        let column = assemble(11);
        assert_eq!(column.name, "IfcColumn_11");
        assert_eq!(column.level, UNNAMED_LEVEL);
        assert_eq!(column.material_type(), Some(UNKNOWN_MATERIAL));
        assert_eq!(column.position, [0.0; 3]);
        assert_eq!(column.area, None);

        let door = assemble(12);
        assert_eq!(door.level, DEFAULT_LEVEL);
        assert!(door.material.is_empty());
        assert!(!door.is_structural());
        assert_eq!(door.geometry.parameters.as_array(), [0.9, 2.1, 0.1]);
        assert_eq!(door.geometry.geometry_source, GeometrySource::OptimizedFallback);
    }

    #[test]
    fn test_authentic_geometry_through_router() {
        let model = model_for(
            "#1=IFCWALL('w',$,'Wall',$,$,#2,#10,$,$);
#2=IFCLOCALPLACEMENT($,#3);
#3=IFCAXIS2PLACEMENT3D(#4,$,$);
#4=IFCCARTESIANPOINT((5.,0.,0.));
#5=IFCCARTESIANPOINTLIST3D(((0.,0.,0.),(1.,0.,0.),(0.,1.,0.)));
#6=IFCTRIANGULATEDFACESET(#5,$,$,((1,2,3)),$);
#7=IFCSHAPEREPRESENTATION($,'Body','Tessellation',(#6));
#10=IFCPRODUCTDEFINITIONSHAPE($,$,(#7));",
        );
        let router = GeometryRouter::with_default_processors();
        let session = router.session(model.as_ref());
        let assembler = ElementAssembler::new(model.as_ref(), session.as_ref());
        let wall = assembler.assemble(&model.element(EntityId(1)).unwrap()).unwrap();

        assert!(wall.geometry.has_authentic_geometry);
        assert_eq!(wall.geometry.vertices[0], [5.0, 0.0, 0.0]);
        assert_eq!(wall.position, [5.0, 0.0, 0.0]);
        assert_eq!(wall.properties["HasGeometry"], true.into());
    }
}
