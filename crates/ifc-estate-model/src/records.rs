// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed views over decoded records
//!
//! Each view wraps a [`DecodedEntity`] of a known class and exposes its
//! attributes by name, returning `None` wherever the file leaves a value
//! unset. Constructors check the class, so holding a view is proof of kind.

use crate::{DecodedEntity, EntityId, IfcType};
use std::sync::Arc;

/// Attributes shared by every rooted record (IfcRoot)
pub trait Record {
    /// Underlying decoded entity
    fn entity(&self) -> &DecodedEntity;

    fn id(&self) -> EntityId {
        self.entity().id
    }

    fn ifc_type(&self) -> &IfcType {
        &self.entity().ifc_type
    }

    /// GlobalId (attribute 0)
    fn global_id(&self) -> Option<&str> {
        self.entity().get_non_empty_string(0)
    }

    /// Name (attribute 2)
    fn name(&self) -> Option<&str> {
        self.entity().get_non_empty_string(2)
    }

    /// Description (attribute 3)
    fn description(&self) -> Option<&str> {
        self.entity().get_non_empty_string(3)
    }
}

macro_rules! record_view {
    ($(#[$doc:meta])* $name:ident, |$ty:ident| $accepts:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $name {
            entity: Arc<DecodedEntity>,
        }

        impl $name {
            /// Wrap an entity, or `None` if it is of another class
            pub fn from_entity(entity: Arc<DecodedEntity>) -> Option<Self> {
                let $ty = &entity.ifc_type;
                if $accepts {
                    Some(Self { entity })
                } else {
                    None
                }
            }
        }

        impl Record for $name {
            fn entity(&self) -> &DecodedEntity {
                &self.entity
            }
        }
    };
}

record_view!(
    /// IfcProject
    ProjectRecord,
    |ty| *ty == IfcType::IfcProject
);

record_view!(
    /// IfcBuilding
    BuildingRecord,
    |ty| *ty == IfcType::IfcBuilding
);

record_view!(
    /// IfcBuildingStorey
    StoreyRecord,
    |ty| *ty == IfcType::IfcBuildingStorey
);

record_view!(
    /// A physical element, or an IfcSpace
    ///
    /// Spaces share the product attribute layout and are listed alongside
    /// elements by the auxiliary queries.
    ElementRecord,
    |ty| ty.is_element() || *ty == IfcType::IfcSpace
);

record_view!(
    /// IfcPropertySet
    PropertySetRecord,
    |ty| *ty == IfcType::IfcPropertySet
);

record_view!(
    /// IfcElementQuantity
    QuantitySetRecord,
    |ty| *ty == IfcType::IfcElementQuantity
);

impl ProjectRecord {
    /// LongName (attribute 5)
    pub fn long_name(&self) -> Option<&str> {
        self.entity.get_non_empty_string(5)
    }

    /// Phase (attribute 6)
    pub fn phase(&self) -> Option<&str> {
        self.entity.get_non_empty_string(6)
    }

    /// UnitsInContext (attribute 8)
    pub fn units(&self) -> Option<EntityId> {
        self.entity.get_ref(8)
    }
}

/// Product attributes shared by buildings, storeys and elements
pub trait ProductRecord: Record {
    /// ObjectType (attribute 4)
    fn object_type(&self) -> Option<&str> {
        self.entity().get_non_empty_string(4)
    }

    /// ObjectPlacement (attribute 5)
    fn placement(&self) -> Option<EntityId> {
        self.entity().get_ref(5)
    }

    /// Representation (attribute 6)
    fn representation(&self) -> Option<EntityId> {
        self.entity().get_ref(6)
    }
}

impl ProductRecord for BuildingRecord {}
impl ProductRecord for StoreyRecord {}
impl ProductRecord for ElementRecord {}

impl BuildingRecord {
    /// ElevationOfRefHeight (attribute 9)
    pub fn elevation_of_ref_height(&self) -> Option<f64> {
        self.entity.get_float(9)
    }

    /// BuildingAddress (attribute 11)
    pub fn address(&self) -> Option<EntityId> {
        self.entity.get_ref(11)
    }
}

impl StoreyRecord {
    /// Elevation (attribute 9)
    pub fn elevation(&self) -> Option<f64> {
        self.entity.get_float(9)
    }
}

impl ElementRecord {
    /// Tag (attribute 7)
    pub fn tag(&self) -> Option<&str> {
        self.entity.get_non_empty_string(7)
    }

    /// Whether the element carries a shape representation
    pub fn has_representation(&self) -> bool {
        self.representation().is_some()
    }

    /// Schema class name (e.g. "IfcWall")
    pub fn class_name(&self) -> &str {
        self.entity.ifc_type.class_name()
    }

    /// Shared handle to the wrapped entity
    pub fn handle(&self) -> Arc<DecodedEntity> {
        Arc::clone(&self.entity)
    }
}

impl PropertySetRecord {
    /// HasProperties (attribute 4)
    pub fn property_ids(&self) -> Vec<EntityId> {
        self.entity.get_refs(4).unwrap_or_default()
    }
}

impl QuantitySetRecord {
    /// MethodOfMeasurement (attribute 4)
    pub fn method_of_measurement(&self) -> Option<&str> {
        self.entity.get_non_empty_string(4)
    }

    /// Quantities (attribute 5)
    pub fn quantity_ids(&self) -> Vec<EntityId> {
        self.entity.get_refs(5).unwrap_or_default()
    }
}
