// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property, quantity and material access for IFC entities

use crate::{AttributeValue, EntityId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar property value
///
/// Serializes untagged, so a property map renders as plain JSON scalars.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Flattened property mapping of one element, ordered by key
pub type PropertyMap = BTreeMap<String, PropertyValue>;

impl PropertyValue {
    /// Coerce a decoded property value into a scalar
    ///
    /// Numeric kinds (`IFCINTEGER`, `IFCREAL`, any `*MEASURE`) become numbers,
    /// `IFCBOOLEAN` and `IFCLOGICAL` become booleans, everything else text.
    /// A numeric kind whose payload is not a number falls back to text.
    pub fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Null | AttributeValue::Derived => None,
            AttributeValue::TypedValue(kind, args) => {
                let inner = args.first()?;
                let kind = kind.to_ascii_uppercase();
                let coerced = if is_numeric_kind(&kind) {
                    inner.as_float().map(PropertyValue::Number)
                } else if kind == "IFCBOOLEAN" || kind == "IFCLOGICAL" {
                    inner.as_bool().map(PropertyValue::Bool)
                } else {
                    None
                };
                Some(coerced.unwrap_or_else(|| PropertyValue::Text(render(inner))))
            }
            AttributeValue::Bool(b) => Some(PropertyValue::Bool(*b)),
            AttributeValue::Integer(i) => Some(PropertyValue::Number(*i as f64)),
            AttributeValue::Float(f) => Some(PropertyValue::Number(*f)),
            other => Some(PropertyValue::Text(render(other))),
        }
    }

    /// Numeric view, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text view, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

fn is_numeric_kind(kind: &str) -> bool {
    matches!(kind, "IFCINTEGER" | "IFCREAL" | "IFCNUMERICMEASURE") || kind.ends_with("MEASURE")
}

/// Human-readable rendering of a decoded value
pub fn render(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Null => String::new(),
        AttributeValue::Derived => "*".to_string(),
        AttributeValue::EntityRef(id) => id.to_string(),
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Integer(i) => i.to_string(),
        AttributeValue::Float(f) => f.to_string(),
        AttributeValue::String(s) => s.clone(),
        AttributeValue::Enum(e) => e.clone(),
        AttributeValue::List(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        AttributeValue::TypedValue(_, args) => {
            args.iter().map(render).collect::<Vec<_>>().join(", ")
        }
    }
}

/// A single property value with optional unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Coerced value
    pub value: PropertyValue,
    /// Unit of measurement (if applicable)
    pub unit: Option<String>,
}

impl Property {
    /// Create a new property
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: None,
        }
    }

    /// Attach a unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// A property set containing multiple properties
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    /// Property set name (e.g., "Pset_WallCommon")
    pub name: String,
    /// Properties in this set
    pub properties: Vec<Property>,
}

impl PropertySet {
    /// Create a new property set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Add a property to this set
    pub fn add(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Get a property by name
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Quantity types supported in IFC
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantityType {
    /// IfcQuantityLength
    Length,
    /// IfcQuantityArea
    Area,
    /// IfcQuantityVolume
    Volume,
    /// IfcQuantityCount
    Count,
    /// IfcQuantityWeight
    Weight,
    /// IfcQuantityTime
    Time,
}

impl QuantityType {
    /// Get default unit for this quantity type
    pub fn default_unit(&self) -> &'static str {
        match self {
            QuantityType::Length => "m",
            QuantityType::Area => "m²",
            QuantityType::Volume => "m³",
            QuantityType::Count => "",
            QuantityType::Weight => "kg",
            QuantityType::Time => "s",
        }
    }
}

/// A quantity value with type and unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub quantity_type: QuantityType,
}

impl Quantity {
    /// Create a new quantity with the type's default unit
    pub fn new(name: impl Into<String>, value: f64, quantity_type: QuantityType) -> Self {
        Self {
            name: name.into(),
            value,
            unit: quantity_type.default_unit().to_string(),
            quantity_type,
        }
    }
}

/// An element quantity set (e.g. "Qto_WallBaseQuantities")
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantitySet {
    pub name: String,
    pub quantities: Vec<Quantity>,
}

impl QuantitySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantities: Vec::new(),
        }
    }

    /// Get a quantity by name
    pub fn get(&self, name: &str) -> Option<&Quantity> {
        self.quantities.iter().find(|q| q.name == name)
    }
}

/// Material definition associated with an element
///
/// Only the names are retained; layer thicknesses and profile shapes are not
/// needed downstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MaterialDefinition {
    /// IfcMaterial (name may be absent)
    Single(Option<String>),
    /// IfcMaterialList
    List(Vec<String>),
    /// IfcMaterialLayerSet or IfcMaterialLayerSetUsage
    LayerSet {
        name: Option<String>,
        layers: Vec<String>,
    },
    /// IfcMaterialConstituentSet
    ConstituentSet {
        name: Option<String>,
        constituents: Vec<String>,
    },
    /// IfcMaterialProfileSet or IfcMaterialProfileSetUsage
    ProfileSet {
        name: Option<String>,
        profiles: Vec<String>,
    },
}

impl MaterialDefinition {
    /// Name that best describes the element's material
    ///
    /// Set names win over member names; lists use their first entry.
    pub fn primary_name(&self) -> Option<&str> {
        let name = match self {
            MaterialDefinition::Single(name) => name.as_deref(),
            MaterialDefinition::List(names) => names.first().map(String::as_str),
            MaterialDefinition::LayerSet { name, layers: members }
            | MaterialDefinition::ConstituentSet {
                name,
                constituents: members,
            }
            | MaterialDefinition::ProfileSet {
                name,
                profiles: members,
            } => name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .or_else(|| members.first().map(String::as_str)),
        };
        name.filter(|n| !n.trim().is_empty())
    }

    /// Key and value under which this material appears in a property map
    pub fn property_entry(&self) -> Option<(&'static str, String)> {
        match self {
            MaterialDefinition::Single(name) => name
                .as_ref()
                .filter(|n| !n.is_empty())
                .map(|n| ("Material", n.clone())),
            MaterialDefinition::List(names) => joined(names).map(|v| ("Materials", v)),
            MaterialDefinition::LayerSet { layers, .. } => {
                joined(layers).map(|v| ("MaterialLayers", v))
            }
            MaterialDefinition::ConstituentSet { constituents, .. } => {
                joined(constituents).map(|v| ("Materials", v))
            }
            MaterialDefinition::ProfileSet { profiles, .. } => {
                joined(profiles).map(|v| ("Materials", v))
            }
        }
    }
}

fn joined(names: &[String]) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

/// Property, quantity and material reader trait
///
/// Property sets come from IfcPropertySet entities linked via
/// IfcRelDefinesByProperties, quantities from IfcElementQuantity entities and
/// materials from IfcRelAssociatesMaterial.
///
/// # Example
///
/// ```ignore
/// use ifc_estate_model::{PropertyReader, EntityId};
///
/// fn show(props: &dyn PropertyReader, wall_id: EntityId) {
///     for pset in props.property_sets(wall_id) {
///         for prop in &pset.properties {
///             println!("{}.{} = {}", pset.name, prop.name, prop.value);
///         }
///     }
/// }
/// ```
pub trait PropertyReader: Send + Sync {
    /// All property sets attached to an entity, in relationship order
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet>;

    /// All quantity sets attached to an entity, in relationship order
    fn quantity_sets(&self, id: EntityId) -> Vec<QuantitySet>;

    /// Material definition associated with an entity
    fn material(&self, id: EntityId) -> Option<MaterialDefinition>;

    /// Every quantity of every quantity set
    fn quantities(&self, id: EntityId) -> Vec<Quantity> {
        self.quantity_sets(id)
            .into_iter()
            .flat_map(|set| set.quantities)
            .collect()
    }

    /// First property with the given name across all sets
    fn get_property(&self, id: EntityId, name: &str) -> Option<Property> {
        self.property_sets(id)
            .into_iter()
            .flat_map(|pset| pset.properties)
            .find(|p| p.name == name)
    }

    /// First quantity with the given name across all sets
    fn get_quantity(&self, id: EntityId, name: &str) -> Option<Quantity> {
        self.quantities(id).into_iter().find(|q| q.name == name)
    }
}
