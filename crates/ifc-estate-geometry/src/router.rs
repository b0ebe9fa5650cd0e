// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry Router - Dynamic dispatch to geometry processors
//!
//! Routes IFC representation items to the processor registered for their
//! type and walks the product representation chain:
//! Element -> ProductDefinitionShape -> ShapeRepresentation -> Items.
//! The router is the default [`ShapeKernel`]; each session keeps its own
//! cache of instanced (MappedItem) geometry.

use crate::kernel::{RawShape, ShapeKernel, ShapeSession};
use crate::placement::{axis2_placement_3d, object_placement, transformation_operator};
use crate::{Error, Mesh, Result};
use ifc_estate_model::{DecodedEntity, EntityId, EntityResolver, IfcModel, IfcType};
use log::debug;
use nalgebra::Matrix4;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Nesting limit for mapped items and boolean operands
const MAX_NESTING: usize = 8;

/// Representation identifiers that describe the body of a product
const BODY_IDENTIFIERS: [&str; 2] = ["Body", "Facetation"];

/// Geometry processor trait
///
/// Each processor handles one or more types of IFC representation items and
/// produces a mesh in the item's coordinate system, in file units.
pub trait GeometryProcessor: Send + Sync {
    /// Process entity into mesh
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh>;

    /// Get supported IFC types
    fn supported_types(&self) -> Vec<IfcType>;
}

/// Geometry router - routes entities to processors
pub struct GeometryRouter {
    /// Registered processors by type
    processors: FxHashMap<IfcType, Arc<dyn GeometryProcessor>>,
}

impl GeometryRouter {
    /// Create new router without any processors registered
    pub fn new() -> Self {
        Self {
            processors: FxHashMap::default(),
        }
    }

    /// Create router with default processors registered
    ///
    /// Registers the following processors:
    /// - `ExtrudedAreaSolidProcessor` (IfcExtrudedAreaSolid)
    /// - `FaceSetProcessor` (IfcTriangulatedFaceSet, IfcPolygonalFaceSet)
    /// - `FacetedBrepProcessor` (IfcFacetedBrep)
    pub fn with_default_processors() -> Self {
        use crate::processors::{
            ExtrudedAreaSolidProcessor, FaceSetProcessor, FacetedBrepProcessor,
        };

        let mut router = Self::new();
        router.register(Arc::new(ExtrudedAreaSolidProcessor::new()));
        router.register(Arc::new(FaceSetProcessor::new()));
        router.register(Arc::new(FacetedBrepProcessor::new()));
        router
    }

    /// Register a geometry processor
    pub fn register(&mut self, processor: Arc<dyn GeometryProcessor>) {
        for ifc_type in processor.supported_types() {
            self.processors.insert(ifc_type, Arc::clone(&processor));
        }
    }

    /// Check if a type has a registered processor
    pub fn has_processor(&self, ifc_type: &IfcType) -> bool {
        self.processors.contains_key(ifc_type)
    }

    /// Open a session over a model
    pub fn open<'m>(&'m self, model: &'m dyn IfcModel) -> RouterSession<'m> {
        RouterSession {
            router: self,
            resolver: model.resolver(),
            unit_scale: model.unit_scale(),
            mapped_cache: RwLock::new(FxHashMap::default()),
        }
    }

    fn processor_for(&self, ifc_type: &IfcType) -> Result<&Arc<dyn GeometryProcessor>> {
        self.processors
            .get(ifc_type)
            .ok_or_else(|| Error::unsupported_type(ifc_type.class_name()))
    }
}

impl Default for GeometryRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeKernel for GeometryRouter {
    fn session<'m>(&'m self, model: &'m dyn IfcModel) -> Box<dyn ShapeSession + 'm> {
        Box::new(self.open(model))
    }
}

/// Router bound to one model
pub struct RouterSession<'m> {
    router: &'m GeometryRouter,
    resolver: &'m dyn EntityResolver,
    unit_scale: f64,
    /// MappedRepresentation id -> source mesh in map coordinates
    mapped_cache: RwLock<FxHashMap<EntityId, Arc<Mesh>>>,
}

impl<'m> RouterSession<'m> {
    /// Number of cached representation maps
    pub fn cached_maps(&self) -> usize {
        self.mapped_cache.read().map(|c| c.len()).unwrap_or(0)
    }

    fn refs_at(&self, entity: &DecodedEntity, index: usize) -> Vec<Arc<DecodedEntity>> {
        entity
            .get(index)
            .map(|value| self.resolver.resolve_ref_list(value))
            .unwrap_or_default()
    }

    /// World-space mesh of an element's body, in metres
    pub fn element_mesh(&self, element: &DecodedEntity) -> Result<Mesh> {
        let shape_id = element
            .get_ref(6)
            .ok_or_else(|| Error::geometry(format!("{} has no representation", element.id)))?;
        let shape = self
            .resolver
            .get(shape_id)
            .ok_or_else(|| Error::entity_not_found(shape_id))?;

        let mut combined = Mesh::new();
        let mut first_error = None;

        // Representations at index 2 of IfcProductDefinitionShape (Name, Description, Representations)
        for representation in self.refs_at(&shape, 2) {
            let accepted = match representation.get_non_empty_string(1) {
                Some(identifier) => BODY_IDENTIFIERS.contains(&identifier),
                None => true,
            };
            if !accepted {
                continue;
            }
            match self.representation_mesh(&representation, 0) {
                Ok(mesh) => combined.merge(&mesh),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        if combined.is_empty() {
            return Err(first_error.unwrap_or_else(|| {
                Error::geometry(format!("{} has no body geometry", element.id))
            }));
        }

        if let Some(placement_id) = element.get_ref(5) {
            match object_placement(self.resolver, placement_id) {
                Some(transform) => combined.transform(&transform),
                None => debug!("unresolved placement {} on {}", placement_id, element.id),
            }
        }
        combined.scale(self.unit_scale);

        Ok(combined)
    }

    /// Merged mesh of every item of a shape representation
    fn representation_mesh(&self, representation: &DecodedEntity, depth: usize) -> Result<Mesh> {
        let mut combined = Mesh::new();
        let mut first_error = None;

        // Items at index 3 of IfcShapeRepresentation
        for item in self.refs_at(representation, 3) {
            match self.item_mesh(&item, depth) {
                Ok(mesh) => combined.merge(&mesh),
                Err(e) => {
                    debug!("skipping item {}: {}", item.id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if combined.is_empty() => Err(e),
            _ => Ok(combined),
        }
    }

    fn item_mesh(&self, item: &DecodedEntity, depth: usize) -> Result<Mesh> {
        if depth > MAX_NESTING {
            return Err(Error::geometry(format!("{} is nested too deeply", item.id)));
        }

        match item.ifc_type {
            IfcType::IfcMappedItem => self.mapped_item_mesh(item, depth),
            IfcType::IfcBooleanResult | IfcType::IfcBooleanClippingResult => {
                // Only the FirstOperand (index 1) is kept; cuts are not applied
                let operand_id = item
                    .get_ref(1)
                    .ok_or_else(|| Error::invalid_attribute(1, "Missing FirstOperand"))?;
                let operand = self
                    .resolver
                    .get(operand_id)
                    .ok_or_else(|| Error::entity_not_found(operand_id))?;
                self.item_mesh(&operand, depth + 1)
            }
            _ => self
                .router
                .processor_for(&item.ifc_type)?
                .process(item, self.resolver),
        }
    }

    /// Instanced geometry: source mesh placed by MappingTarget * MappingOrigin
    fn mapped_item_mesh(&self, item: &DecodedEntity, depth: usize) -> Result<Mesh> {
        let source_id = item
            .get_ref(0)
            .ok_or_else(|| Error::invalid_attribute(0, "Missing MappingSource"))?;
        let source = self
            .resolver
            .get(source_id)
            .ok_or_else(|| Error::entity_not_found(source_id))?;
        let representation_id = source
            .get_ref(1)
            .ok_or_else(|| Error::invalid_attribute(1, "Missing MappedRepresentation"))?;

        let cached = self
            .mapped_cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&representation_id).cloned());
        let shared = match cached {
            Some(mesh) => mesh,
            None => {
                let representation = self
                    .resolver
                    .get(representation_id)
                    .ok_or_else(|| Error::entity_not_found(representation_id))?;
                let mesh = Arc::new(self.representation_mesh(&representation, depth + 1)?);
                if let Ok(mut cache) = self.mapped_cache.write() {
                    cache.insert(representation_id, Arc::clone(&mesh));
                }
                mesh
            }
        };

        let origin = source
            .get_ref(0)
            .and_then(|id| self.resolver.get(id))
            .and_then(|p| axis2_placement_3d(self.resolver, &p))
            .unwrap_or_else(Matrix4::identity);
        let target = item
            .get_ref(1)
            .and_then(|id| self.resolver.get(id))
            .and_then(|op| transformation_operator(self.resolver, &op))
            .unwrap_or_else(Matrix4::identity);

        let mut mesh = (*shared).clone();
        mesh.transform(&(target * origin));
        Ok(mesh)
    }
}

impl ShapeSession for RouterSession<'_> {
    fn triangulate(&self, element: &DecodedEntity) -> Result<RawShape> {
        self.element_mesh(element).map(RawShape::from)
    }
}
