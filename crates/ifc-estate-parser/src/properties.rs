// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PropertyReader trait implementation

use ifc_estate_model::{
    render, AttributeValue, DecodedEntity, EntityId, EntityResolver, EntityResolverExt, IfcType,
    MaterialDefinition, Property, PropertyReader, PropertySet, PropertySetRecord, PropertyValue,
    Quantity, QuantitySet, QuantitySetRecord, QuantityType, Record,
};
use log::debug;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Property reader backed by relationship indices built at load time
pub struct PropertyReaderImpl {
    resolver: Arc<dyn EntityResolver>,
    /// Entity ID -> property set IDs
    pset_index: FxHashMap<EntityId, Vec<EntityId>>,
    /// Entity ID -> element quantity IDs
    qset_index: FxHashMap<EntityId, Vec<EntityId>>,
    /// Entity ID -> associated material definition ID
    material_index: FxHashMap<EntityId, EntityId>,
}

impl PropertyReaderImpl {
    /// Index IfcRelDefinesByProperties and IfcRelAssociatesMaterial
    pub fn new(resolver: Arc<dyn EntityResolver>) -> Self {
        let mut pset_index: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();
        let mut qset_index: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();

        // RelatedObjects at index 4, RelatingPropertyDefinition at index 5
        for rel in resolver.entities_by_type(&IfcType::IfcRelDefinesByProperties) {
            let (Some(related), Some(definition_id)) = (rel.get_refs(4), rel.get_ref(5)) else {
                continue;
            };
            let Some(definition) = resolver.get(definition_id) else {
                debug!("{} points at missing definition {}", rel.id, definition_id);
                continue;
            };
            let index = match definition.ifc_type {
                IfcType::IfcPropertySet => &mut pset_index,
                IfcType::IfcElementQuantity => &mut qset_index,
                _ => continue,
            };
            for object in related {
                index.entry(object).or_default().push(definition_id);
            }
        }

        // RelatedObjects at index 4, RelatingMaterial at index 5
        let mut material_index: FxHashMap<EntityId, EntityId> = FxHashMap::default();
        for rel in resolver.entities_by_type(&IfcType::IfcRelAssociatesMaterial) {
            let (Some(related), Some(material_id)) = (rel.get_refs(4), rel.get_ref(5)) else {
                continue;
            };
            for object in related {
                material_index.entry(object).or_insert(material_id);
            }
        }

        Self {
            resolver,
            pset_index,
            qset_index,
            material_index,
        }
    }

    fn read_property_set(&self, record: &PropertySetRecord) -> PropertySet {
        let mut set = PropertySet::new(record.name().unwrap_or("Unknown"));
        for id in record.property_ids() {
            match self.resolver.get(id) {
                Some(prop) => {
                    if let Some(property) = self.read_property(&prop) {
                        set.add(property);
                    }
                }
                None => debug!("property {} of {} is missing", id, record.id()),
            }
        }
        set
    }

    fn read_property(&self, prop: &DecodedEntity) -> Option<Property> {
        // Name at index 0
        let name = prop.get_non_empty_string(0)?;

        match prop.ifc_type {
            IfcType::IfcPropertySingleValue => {
                // NominalValue at index 2, Unit at index 3
                let value = PropertyValue::from_attribute(prop.get(2)?)?;
                let property = Property::new(name, value);
                Some(match self.unit_label(prop.get(3)) {
                    Some(unit) => property.with_unit(unit),
                    None => property,
                })
            }
            IfcType::IfcPropertyEnumeratedValue | IfcType::IfcPropertyListValue => {
                // EnumerationValues / ListValues at index 2
                let values = prop.get_list(2)?;
                Some(Property::new(name, joined(values)))
            }
            IfcType::IfcPropertyBoundedValue => {
                // UpperBoundValue at index 2, LowerBoundValue at index 3
                let upper = prop.get(2).filter(|v| !v.is_null()).map(render);
                let lower = prop.get(3).filter(|v| !v.is_null()).map(render);
                let value = match (lower, upper) {
                    (Some(l), Some(u)) => format!("{} - {}", l, u),
                    (Some(l), None) => format!(">= {}", l),
                    (None, Some(u)) => format!("<= {}", u),
                    (None, None) => return None,
                };
                Some(Property::new(name, value))
            }
            _ => None,
        }
    }

    /// Readable symbol for a unit reference
    fn unit_label(&self, attr: Option<&AttributeValue>) -> Option<String> {
        let unit = self.resolver.resolve_ref(attr?)?;

        match unit.ifc_type {
            IfcType::IfcSIUnit => {
                // Prefix at index 2, Name at index 3
                let prefix = match unit.get_enum(2) {
                    Some("MILLI") => "m",
                    Some("CENTI") => "c",
                    Some("KILO") => "k",
                    _ => "",
                };
                let symbol = match unit.get_enum(3)? {
                    "METRE" => "m",
                    "SQUARE_METRE" => "m²",
                    "CUBIC_METRE" => "m³",
                    "GRAM" => "g",
                    "SECOND" => "s",
                    "KELVIN" => "K",
                    "DEGREE_CELSIUS" => "°C",
                    "WATT" => "W",
                    "PASCAL" => "Pa",
                    "NEWTON" => "N",
                    other => other,
                };
                Some(format!("{}{}", prefix, symbol))
            }
            // Name at index 2
            IfcType::IfcConversionBasedUnit => unit.get_non_empty_string(2).map(str::to_string),
            _ => None,
        }
    }

    fn read_quantity_set(&self, record: &QuantitySetRecord) -> QuantitySet {
        let mut set = QuantitySet::new(record.name().unwrap_or("Unknown"));
        set.quantities = record
            .quantity_ids()
            .into_iter()
            .filter_map(|id| self.resolver.get(id))
            .filter_map(|qty| read_quantity(&qty))
            .collect();
        set
    }

    fn read_material(&self, material: &DecodedEntity) -> MaterialDefinition {
        match material.ifc_type {
            // Name at index 0
            IfcType::IfcMaterial => {
                MaterialDefinition::Single(material.get_non_empty_string(0).map(str::to_string))
            }
            // Materials at index 0
            IfcType::IfcMaterialList => MaterialDefinition::List(
                self.resolver
                    .follow_list(material, 0)
                    .iter()
                    .filter_map(|m| material_name(m))
                    .collect(),
            ),
            // ForLayerSet at index 0
            IfcType::IfcMaterialLayerSetUsage | IfcType::IfcMaterialProfileSetUsage => {
                match self.resolver.follow(material, 0) {
                    Some(set) => self.read_material(&set),
                    None => MaterialDefinition::Single(None),
                }
            }
            // MaterialLayers at index 0, LayerSetName at index 1
            IfcType::IfcMaterialLayerSet => MaterialDefinition::LayerSet {
                name: material.get_non_empty_string(1).map(str::to_string),
                layers: self.member_names(material, 0, 0),
            },
            // Name at index 0, MaterialConstituents at index 2
            IfcType::IfcMaterialConstituentSet => MaterialDefinition::ConstituentSet {
                name: material.get_non_empty_string(0).map(str::to_string),
                constituents: self.member_names(material, 2, 2),
            },
            // Name at index 0, MaterialProfiles at index 2
            IfcType::IfcMaterialProfileSet => MaterialDefinition::ProfileSet {
                name: material.get_non_empty_string(0).map(str::to_string),
                profiles: self.member_names(material, 2, 2),
            },
            // A bare layer or constituent names its material directly
            IfcType::IfcMaterialLayer => MaterialDefinition::Single(
                self.resolver
                    .follow(material, 0)
                    .and_then(|m| material_name(&m)),
            ),
            _ => {
                debug!("unsupported material definition {}", material.ifc_type);
                MaterialDefinition::Single(None)
            }
        }
    }

    /// Names of the materials referenced by the members of a material set
    fn member_names(&self, set: &DecodedEntity, members_at: usize, material_at: usize) -> Vec<String> {
        self.resolver
            .follow_list(set, members_at)
            .iter()
            .filter_map(|member| self.resolver.follow(member, material_at))
            .filter_map(|m| material_name(&m))
            .collect()
    }
}

fn joined(values: &[AttributeValue]) -> String {
    values.iter().map(render).collect::<Vec<_>>().join(", ")
}

fn material_name(material: &DecodedEntity) -> Option<String> {
    (material.ifc_type == IfcType::IfcMaterial)
        .then(|| material.get_non_empty_string(0))
        .flatten()
        .map(str::to_string)
}

/// Read an IfcPhysicalSimpleQuantity
fn read_quantity(qty: &DecodedEntity) -> Option<Quantity> {
    // Name at index 0
    let name = qty.get_non_empty_string(0)?;

    let quantity_type = match qty.ifc_type {
        IfcType::IfcQuantityLength => QuantityType::Length,
        IfcType::IfcQuantityArea => QuantityType::Area,
        IfcType::IfcQuantityVolume => QuantityType::Volume,
        IfcType::IfcQuantityCount => QuantityType::Count,
        IfcType::IfcQuantityWeight => QuantityType::Weight,
        IfcType::IfcQuantityTime => QuantityType::Time,
        _ => return None,
    };

    // Value at index 3
    Some(Quantity::new(name, qty.get_float(3)?, quantity_type))
}

impl PropertyReader for PropertyReaderImpl {
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet> {
        self.pset_index
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|pset_id| self.resolver.get(*pset_id))
            .filter_map(PropertySetRecord::from_entity)
            .map(|record| self.read_property_set(&record))
            .filter(|set| !set.properties.is_empty())
            .collect()
    }

    fn quantity_sets(&self, id: EntityId) -> Vec<QuantitySet> {
        self.qset_index
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|qset_id| self.resolver.get(*qset_id))
            .filter_map(QuantitySetRecord::from_entity)
            .map(|record| self.read_quantity_set(&record))
            .collect()
    }

    fn material(&self, id: EntityId) -> Option<MaterialDefinition> {
        let material_id = self.material_index.get(&id)?;
        Some(match self.resolver.get(*material_id) {
            Some(material) => self.read_material(&material),
            None => MaterialDefinition::Single(None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverImpl;
    use crate::scanner::EntityScanner;
    use approx::assert_relative_eq;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#10=IFCWALL('w1',$,'Wall 1',$,$,$,$,$,$);
#11=IFCSLAB('s1',$,'Slab 1',$,$,$,$,$,$);
#12=IFCBEAM('b1',$,'Beam 1',$,$,$,$,$,$);
#13=IFCDOOR('d1',$,'Door 1',$,$,$,$,$,$,$,$,$,$);
#20=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
#21=IFCPROPERTYSINGLEVALUE('Width',$,IFCLENGTHMEASURE(250.),#1);
#22=IFCPROPERTYSINGLEVALUE('FireRating',$,IFCLABEL('REI60'),$);
#23=IFCPROPERTYENUMERATEDVALUE('Finish',$,(IFCLABEL('Matt'),IFCLABEL('Raw')),$);
#24=IFCPROPERTYBOUNDEDVALUE('Temp',$,IFCREAL(30.),IFCREAL(10.),$,$);
#25=IFCPROPERTYSET('p1',$,'Pset_WallCommon',$,(#20,#21,#22,#23,#24));
#26=IFCRELDEFINESBYPROPERTIES('r1',$,$,$,(#10),#25);
#27=IFCPROPERTYSINGLEVALUE('LoadBearing',$,IFCLOGICAL(.U.),$);
#28=IFCPROPERTYSINGLEVALUE('Sealed',$,IFCLOGICAL(.T.),$);
#29=IFCPROPERTYSINGLEVALUE('Installed',$,IFCDATETIME('2024-05-01T08:00:00'),$);
#35=IFCPROPERTYSINGLEVALUE('Stamp',$,IFCTIMESTAMP(1700000000),$);
#36=IFCPROPERTYSET('p2',$,'Site_Log',$,(#27,#28,#29,#35));
#37=IFCRELDEFINESBYPROPERTIES('r3',$,$,$,(#12),#36);
#30=IFCQUANTITYLENGTH('Length',$,$,4.5,$);
#31=IFCQUANTITYAREA('NetSideArea',$,$,12.25,$);
#32=IFCQUANTITYVOLUME('NetVolume',$,$,3.1,$);
#33=IFCELEMENTQUANTITY('q1',$,'Qto_WallBaseQuantities',$,$,(#30,#31,#32));
#34=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#10,#11),#33);
#40=IFCMATERIAL('Concrete',$,$);
#41=IFCMATERIAL('Insulation',$,$);
#42=IFCMATERIALLAYER(#40,200.,$,$,$,$,$);
#43=IFCMATERIALLAYER(#41,100.,$,$,$,$,$);
#44=IFCMATERIALLAYERSET((#42,#43),'Exterior Wall',$);
#45=IFCMATERIALLAYERSETUSAGE(#44,.AXIS2.,.POSITIVE.,0.,$);
#46=IFCRELASSOCIATESMATERIAL('m1',$,$,$,(#10),#45);
#47=IFCMATERIALLIST((#40,#41));
#48=IFCRELASSOCIATESMATERIAL('m2',$,$,$,(#11),#47);
#49=IFCMATERIAL($,$,$);
#50=IFCRELASSOCIATESMATERIAL('m3',$,$,$,(#12),#49);
ENDSEC;
END-ISO-10303-21;
"#;

    fn reader() -> PropertyReaderImpl {
        let resolver = ResolverImpl::new(TEST_IFC.to_string(), EntityScanner::index(TEST_IFC));
        PropertyReaderImpl::new(Arc::new(resolver))
    }

    #[test]
    fn test_property_values_are_typed() {
        let reader = reader();
        let sets = reader.property_sets(EntityId(10));
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "Pset_WallCommon");

        let set = &sets[0];
        assert_eq!(set.get("IsExternal").unwrap().value, PropertyValue::Bool(true));
        let width = set.get("Width").unwrap();
        assert_eq!(width.value, PropertyValue::Number(250.0));
        assert_eq!(width.unit.as_deref(), Some("mm"));
        assert_eq!(
            set.get("FireRating").unwrap().value,
            PropertyValue::Text("REI60".into())
        );
        assert_eq!(
            set.get("Finish").unwrap().value,
            PropertyValue::Text("Matt, Raw".into())
        );
        assert_eq!(
            set.get("Temp").unwrap().value,
            PropertyValue::Text("10 - 30".into())
        );
    }

    #[test]
    fn test_logical_and_unknown_kinds() {
        let reader = reader();
        let get = |name: &str| reader.get_property(EntityId(12), name).unwrap().value;

        // Unknown logical stays readable as text
        assert_eq!(get("LoadBearing"), PropertyValue::Text("U".into()));
        assert_eq!(get("Sealed"), PropertyValue::Bool(true));
        // Kinds outside the numeric and boolean families render as text
        assert_eq!(get("Installed"), PropertyValue::Text("2024-05-01T08:00:00".into()));
        assert_eq!(get("Stamp"), PropertyValue::Text("1700000000".into()));
    }

    #[test]
    fn test_quantities_shared_between_elements() {
        let reader = reader();
        let wall = reader.quantities(EntityId(10));
        let slab = reader.quantities(EntityId(11));
        assert_eq!(wall.len(), 3);
        assert_eq!(slab.len(), 3);
        assert_relative_eq!(reader.get_quantity(EntityId(11), "NetVolume").unwrap().value, 3.1);
        assert_eq!(
            reader.quantity_sets(EntityId(10))[0].name,
            "Qto_WallBaseQuantities"
        );
    }

    #[test]
    fn test_materials() {
        let reader = reader();
        assert_eq!(
            reader.material(EntityId(10)),
            Some(MaterialDefinition::LayerSet {
                name: Some("Exterior Wall".into()),
                layers: vec!["Concrete".into(), "Insulation".into()],
            })
        );
        assert_eq!(
            reader.material(EntityId(11)),
            Some(MaterialDefinition::List(vec![
                "Concrete".into(),
                "Insulation".into()
            ]))
        );
        assert_eq!(reader.material(EntityId(12)), Some(MaterialDefinition::Single(None)));
        assert_eq!(reader.material(EntityId(13)), None);
    }

    #[test]
    fn test_unrelated_entity_has_nothing() {
        let reader = reader();
        assert!(reader.property_sets(EntityId(13)).is_empty());
        assert!(reader.quantities(EntityId(13)).is_empty());
        assert!(reader.get_property(EntityId(13), "IsExternal").is_none());
    }
}
