// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Flattened element properties
//!
//! Collects attributes, property sets, quantities, materials and spatial
//! containment into one key/value map. Later sources overwrite earlier keys.

use ifc_estate_model::{
    ElementRecord, IfcModel, IfcModelExt, ProductRecord, PropertyMap, PropertyValue, Record,
};
use log::debug;

/// Read every property of an element into a flat map
pub fn read_properties(model: &dyn IfcModel, element: &ElementRecord) -> PropertyMap {
    let mut map = PropertyMap::new();
    let id = element.id();

    let attributes = [
        ("Name", element.name()),
        ("Description", element.description()),
        ("ObjectType", element.object_type()),
    ];
    for (key, value) in attributes {
        if let Some(value) = value {
            map.insert(key.to_string(), PropertyValue::from(value));
        }
    }

    let reader = model.properties();
    for pset in reader.property_sets(id) {
        for property in pset.properties {
            map.insert(property.name, property.value);
        }
    }
    for qset in reader.quantity_sets(id) {
        for quantity in qset.quantities {
            map.insert(quantity.name, PropertyValue::Number(quantity.value));
        }
    }

    match reader.material(id) {
        Some(material) => {
            if let Some((key, value)) = material.property_entry() {
                map.insert(key.to_string(), PropertyValue::Text(value));
            }
        }
        None => debug!("no material associated with {}", id),
    }

    let spatial = model.spatial();
    if let Some(storey) = spatial.containing_storey(id).and_then(|s| model.storey(s)) {
        if let Some(name) = storey.name() {
            map.insert("Floor".to_string(), name.into());
        }
    }
    if let Some(space) = spatial.containing_space(id).and_then(|s| model.resolver().get(s)) {
        if let Some(name) = space.get_non_empty_string(2) {
            map.insert("Space".to_string(), name.into());
        }
    }

    if let Some(label) = element.ifc_type().category().element_type_tag() {
        map.insert("ElementType".to_string(), label.into());
    }

    if element.has_representation() {
        map.insert("HasGeometry".to_string(), true.into());
    }

    map
}
