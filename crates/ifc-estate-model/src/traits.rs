// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core traits for reading IFC content

use crate::{
    BuildingRecord, ElementRecord, EntityId, EntityResolver, IfcType, ModelMetadata,
    ProjectRecord, PropertyReader, Result, SpatialQuery, StoreyRecord,
};
use std::sync::Arc;

/// Entry point for parsing IFC content
///
/// ```ignore
/// let model = parser.parse(&content)?;
/// println!("Schema: {}", model.metadata().schema_version);
/// ```
pub trait IfcParser: Send + Sync {
    /// Parse IFC content and return a model
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>>;
}

/// Read-only access to a parsed IFC file
///
/// Thread-safe so element assembly can fan out across a thread pool.
pub trait IfcModel: Send + Sync {
    /// Entity lookups and reference resolution
    fn resolver(&self) -> &dyn EntityResolver;

    /// Property sets, quantities and materials
    fn properties(&self) -> &dyn PropertyReader;

    /// Spatial structure (Project → Site → Building → Storey → Space)
    fn spatial(&self) -> &dyn SpatialQuery;

    /// Factor converting file length units to metres
    ///
    /// 1.0 for metres, 0.001 for millimetres, 0.3048 for feet.
    fn unit_scale(&self) -> f64;

    /// Header metadata (schema version, originating system, etc.)
    fn metadata(&self) -> &ModelMetadata;
}

/// Typed record lookups on any model
pub trait IfcModelExt: IfcModel {
    /// First IfcProject in the file
    fn project(&self) -> Option<ProjectRecord> {
        self.resolver()
            .entities_by_type(&IfcType::IfcProject)
            .into_iter()
            .find_map(ProjectRecord::from_entity)
    }

    /// Every IfcBuilding, in file order
    fn building_records(&self) -> Vec<BuildingRecord> {
        self.resolver()
            .entities_by_type(&IfcType::IfcBuilding)
            .into_iter()
            .filter_map(BuildingRecord::from_entity)
            .collect()
    }

    /// Every IfcBuildingStorey, in file order
    fn storey_records(&self) -> Vec<StoreyRecord> {
        self.resolver()
            .entities_by_type(&IfcType::IfcBuildingStorey)
            .into_iter()
            .filter_map(StoreyRecord::from_entity)
            .collect()
    }

    /// Every physical element, ordered by instance id
    fn element_records(&self) -> Vec<ElementRecord> {
        let mut ids: Vec<EntityId> = self
            .resolver()
            .type_census()
            .into_iter()
            .filter(|(ty, _)| ty.is_element())
            .flat_map(|(ty, _)| {
                self.resolver()
                    .entities_by_type(&ty)
                    .into_iter()
                    .map(|e| e.id)
                    .collect::<Vec<_>>()
            })
            .collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(|id| self.element(id)).collect()
    }

    /// Element view of a single entity
    fn element(&self, id: EntityId) -> Option<ElementRecord> {
        self.resolver().get(id).and_then(ElementRecord::from_entity)
    }

    /// Storey view of a single entity
    fn storey(&self, id: EntityId) -> Option<StoreyRecord> {
        self.resolver().get(id).and_then(StoreyRecord::from_entity)
    }
}

impl<T: IfcModel + ?Sized> IfcModelExt for T {}
