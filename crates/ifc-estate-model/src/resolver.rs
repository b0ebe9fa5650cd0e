// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity resolution trait for looking up and resolving IFC entities

use crate::{AttributeValue, DecodedEntity, EntityId, IfcType};
use std::sync::Arc;

/// Entity lookup and reference resolution
///
/// Implementations decode lazily and are expected to answer `get` in O(1)
/// once an entity has been seen. Everything downstream of the parser
/// (properties, spatial structure, geometry) reaches the file through this
/// trait.
///
/// # Example
///
/// ```ignore
/// use ifc_estate_model::{EntityResolver, EntityId};
///
/// fn placement_of(resolver: &dyn EntityResolver, wall_id: EntityId) {
///     if let Some(wall) = resolver.get(wall_id) {
///         if let Some(placement) = wall.get(5).and_then(|a| resolver.resolve_ref(a)) {
///             println!("{} placed by {}", wall.id, placement.id);
///         }
///     }
/// }
/// ```
pub trait EntityResolver: Send + Sync {
    /// Get entity by ID
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>>;

    /// Resolve an entity reference from an attribute value
    fn resolve_ref(&self, attr: &AttributeValue) -> Option<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::EntityRef(id) => self.get(*id),
            _ => None,
        }
    }

    /// Resolve a list of entity references
    ///
    /// Non-reference members and dangling references are skipped.
    fn resolve_ref_list(&self, attr: &AttributeValue) -> Vec<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::List(items) => items
                .iter()
                .filter_map(|item| self.resolve_ref(item))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Get all entities of a specific type, in file order
    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>>;

    /// Find entities by type name string (case-insensitive)
    fn find_by_type_name(&self, type_name: &str) -> Vec<Arc<DecodedEntity>> {
        self.entities_by_type(&IfcType::parse(type_name))
    }

    /// Count entities of a specific type
    fn count_by_type(&self, ifc_type: &IfcType) -> usize;

    /// Instance count per type present in the file
    ///
    /// Answered from the scan index, so no entity is decoded.
    fn type_census(&self) -> Vec<(IfcType, usize)>;

    /// Get all entity IDs in the model
    fn all_ids(&self) -> Vec<EntityId>;

    /// Get total entity count
    fn entity_count(&self) -> usize {
        self.all_ids().len()
    }
}

/// Extension methods for EntityResolver
pub trait EntityResolverExt: EntityResolver {
    /// Get entity by raw u32 ID
    fn get_by_u32(&self, id: u32) -> Option<Arc<DecodedEntity>> {
        self.get(EntityId(id))
    }

    /// Check if an entity exists
    fn exists(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Get entity or return error
    fn get_or_err(&self, id: EntityId) -> crate::Result<Arc<DecodedEntity>> {
        self.get(id).ok_or(crate::ParseError::EntityNotFound(id))
    }

    /// Follow the reference held at `index` of `entity`
    fn follow(&self, entity: &DecodedEntity, index: usize) -> Option<Arc<DecodedEntity>> {
        entity.get(index).and_then(|attr| self.resolve_ref(attr))
    }

    /// Follow every reference in the list held at `index` of `entity`
    fn follow_list(&self, entity: &DecodedEntity, index: usize) -> Vec<Arc<DecodedEntity>> {
        entity
            .get(index)
            .map(|attr| self.resolve_ref_list(attr))
            .unwrap_or_default()
    }

    /// Follow a required reference or return error
    fn require(&self, entity: &DecodedEntity, index: usize) -> crate::Result<Arc<DecodedEntity>> {
        self.follow(entity, index)
            .ok_or(crate::ParseError::missing(entity.id, index))
    }

    /// Number of physical elements in the model
    fn element_total(&self) -> usize {
        self.type_census()
            .iter()
            .filter(|(ty, _)| ty.is_element())
            .map(|(_, count)| count)
            .sum()
    }
}

// Blanket implementation for all EntityResolver types
impl<T: EntityResolver + ?Sized> EntityResolverExt for T {}
