// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial structure builder and query implementation

use ifc_estate_model::{
    DecodedEntity, EntityId, EntityResolver, IfcType, SpatialNode, SpatialNodeType, SpatialQuery,
    StoreyInfo,
};
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

/// Spatial query implementation
pub struct SpatialQueryImpl {
    tree: Option<SpatialNode>,
    /// Sorted by elevation
    storeys: Vec<StoreyInfo>,
    element_storey: FxHashMap<EntityId, EntityId>,
    element_space: FxHashMap<EntityId, EntityId>,
    /// Contained elements by type
    type_index: FxHashMap<IfcType, Vec<EntityId>>,
    /// Lowercase name -> node IDs
    name_index: FxHashMap<String, Vec<EntityId>>,
}

impl SpatialQueryImpl {
    /// Build spatial structure from resolver
    pub fn build(resolver: &dyn EntityResolver) -> Self {
        let mut builder = SpatialBuilder::new(resolver);
        let tree = builder.build();

        let mut storeys: Vec<StoreyInfo> = tree
            .iter()
            .flat_map(|root| root.nodes_of_type(SpatialNodeType::Storey))
            .map(|node| StoreyInfo {
                id: node.id,
                name: node.name.clone(),
                elevation: node.elevation.unwrap_or(0.0),
                element_count: node.element_count(),
            })
            .collect();
        storeys.sort_by(|a, b| a.elevation.total_cmp(&b.elevation));

        let mut type_index: FxHashMap<IfcType, Vec<EntityId>> = FxHashMap::default();
        let mut name_index: FxHashMap<String, Vec<EntityId>> = FxHashMap::default();
        for node in tree.iter().flat_map(|root| root.iter()) {
            if node.node_type == SpatialNodeType::Element {
                type_index
                    .entry(IfcType::parse(&node.entity_type))
                    .or_default()
                    .push(node.id);
            }
            if let Some(name) = &node.name {
                name_index.entry(name.to_lowercase()).or_default().push(node.id);
            }
        }

        Self {
            tree,
            storeys,
            element_storey: builder.element_storey,
            element_space: builder.element_space,
            type_index,
            name_index,
        }
    }

    /// Create an empty spatial query
    pub fn empty() -> Self {
        Self {
            tree: None,
            storeys: Vec::new(),
            element_storey: FxHashMap::default(),
            element_space: FxHashMap::default(),
            type_index: FxHashMap::default(),
            name_index: FxHashMap::default(),
        }
    }
}

impl SpatialQuery for SpatialQueryImpl {
    fn spatial_tree(&self) -> Option<&SpatialNode> {
        self.tree.as_ref()
    }

    fn storeys(&self) -> Vec<StoreyInfo> {
        self.storeys.clone()
    }

    fn elements_in_storey(&self, storey_id: EntityId) -> Vec<EntityId> {
        self.tree
            .as_ref()
            .and_then(|tree| tree.find(storey_id))
            .filter(|node| node.node_type == SpatialNodeType::Storey)
            .map(|node| node.element_ids())
            .unwrap_or_default()
    }

    fn containing_storey(&self, element_id: EntityId) -> Option<EntityId> {
        self.element_storey.get(&element_id).copied()
    }

    fn containing_space(&self, element_id: EntityId) -> Option<EntityId> {
        self.element_space.get(&element_id).copied()
    }

    fn search(&self, query: &str) -> Vec<EntityId> {
        let needle = query.to_lowercase();
        let mut results: Vec<EntityId> = self
            .name_index
            .iter()
            .filter(|(name, _)| name.contains(&needle))
            .flat_map(|(_, ids)| ids.iter().copied())
            .chain(
                self.type_index
                    .iter()
                    .filter(|(ty, _)| ty.class_name().to_lowercase().contains(&needle))
                    .flat_map(|(_, ids)| ids.iter().copied()),
            )
            .collect();

        results.sort_unstable();
        results.dedup();
        results
    }

    fn elements_by_type(&self, ifc_type: &IfcType) -> Vec<EntityId> {
        self.type_index.get(ifc_type).cloned().unwrap_or_default()
    }
}

/// Walks aggregation and containment relationships from the project down
struct SpatialBuilder<'a> {
    resolver: &'a dyn EntityResolver,
    /// RelatingObject -> RelatedObjects
    aggregates: FxHashMap<EntityId, Vec<EntityId>>,
    /// RelatingStructure -> RelatedElements
    contains: FxHashMap<EntityId, Vec<EntityId>>,
    visited: FxHashSet<EntityId>,
    element_storey: FxHashMap<EntityId, EntityId>,
    element_space: FxHashMap<EntityId, EntityId>,
}

/// Nearest enclosing storey and space while descending
#[derive(Clone, Copy, Default)]
struct Enclosing {
    storey: Option<EntityId>,
    space: Option<EntityId>,
}

impl<'a> SpatialBuilder<'a> {
    fn new(resolver: &'a dyn EntityResolver) -> Self {
        let mut aggregates: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();
        // RelatingObject at index 4, RelatedObjects at index 5
        for rel in resolver.entities_by_type(&IfcType::IfcRelAggregates) {
            if let (Some(parent), Some(children)) = (rel.get_ref(4), rel.get_refs(5)) {
                aggregates.entry(parent).or_default().extend(children);
            }
        }

        let mut contains: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();
        // RelatedElements at index 4, RelatingStructure at index 5
        for rel in resolver.entities_by_type(&IfcType::IfcRelContainedInSpatialStructure) {
            if let (Some(elements), Some(structure)) = (rel.get_refs(4), rel.get_ref(5)) {
                contains.entry(structure).or_default().extend(elements);
            }
        }

        Self {
            resolver,
            aggregates,
            contains,
            visited: FxHashSet::default(),
            element_storey: FxHashMap::default(),
            element_space: FxHashMap::default(),
        }
    }

    fn build(&mut self) -> Option<SpatialNode> {
        let projects = self.resolver.entities_by_type(&IfcType::IfcProject);
        let project = projects.first()?;
        if projects.len() > 1 {
            warn!("{} projects found, using {}", projects.len(), project.id);
        }
        Some(self.descend(project, Enclosing::default()))
    }

    fn create_node(entity: &DecodedEntity) -> SpatialNode {
        let node = SpatialNode::new(
            entity.id,
            SpatialNodeType::from_ifc_type(&entity.ifc_type),
            entity.get_non_empty_string(2).map(str::to_string),
            entity.ifc_type.class_name(),
        );

        // Elevation at index 9
        match (&entity.ifc_type, entity.get_float(9)) {
            (IfcType::IfcBuildingStorey, Some(elevation)) => node.with_elevation(elevation),
            _ => node,
        }
    }

    fn descend(&mut self, entity: &DecodedEntity, enclosing: Enclosing) -> SpatialNode {
        self.visited.insert(entity.id);
        let mut node = Self::create_node(entity);

        let enclosing = match node.node_type {
            SpatialNodeType::Storey => Enclosing {
                storey: Some(entity.id),
                space: None,
            },
            SpatialNodeType::Space => Enclosing {
                space: Some(entity.id),
                ..enclosing
            },
            SpatialNodeType::Element => {
                self.record_container(entity.id, enclosing);
                enclosing
            }
            _ => enclosing,
        };

        let aggregated = self.aggregates.get(&entity.id).cloned().unwrap_or_default();
        let contained = if node.node_type == SpatialNodeType::Element {
            Vec::new()
        } else {
            self.contains.get(&entity.id).cloned().unwrap_or_default()
        };

        for child_id in aggregated.into_iter().chain(contained) {
            if self.visited.contains(&child_id) {
                debug!("{} reached twice, skipping under {}", child_id, entity.id);
                continue;
            }
            match self.resolver.get(child_id) {
                Some(child) => {
                    let child_node = self.descend(&child, enclosing);
                    node.add_child(child_node);
                }
                None => debug!("{} refers to missing {}", entity.id, child_id),
            }
        }

        node
    }

    fn record_container(&mut self, element: EntityId, enclosing: Enclosing) {
        if let Some(storey) = enclosing.storey {
            self.element_storey.insert(element, storey);
        }
        if let Some(space) = enclosing.space {
            self.element_space.insert(element, space);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverImpl;
    use crate::scanner::EntityScanner;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('p',$,'Test Project',$,$,$,$,$,$);
#2=IFCSITE('s',$,'Site',$,$,$,$,$,.ELEMENT.,$,$,$,$,$);
#3=IFCBUILDING('b',$,'Tower',$,$,$,$,$,.ELEMENT.,$,$,$);
#4=IFCBUILDINGSTOREY('g',$,'Ground Floor',$,$,$,$,$,.ELEMENT.,0.);
#5=IFCBUILDINGSTOREY('f',$,$,$,$,$,$,$,.ELEMENT.,3200.);
#6=IFCSPACE('r',$,'Office',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#10=IFCWALL('w1',$,'Wall 1',$,$,$,$,$);
#11=IFCSLAB('s1',$,'Floor Slab',$,$,$,$,$,.FLOOR.);
#12=IFCFURNITURE('f1',$,'Desk',$,$,$,$,$);
#13=IFCSTAIR('st',$,'Stair',$,$,$,$,$,.STRAIGHT_RUN_STAIR.);
#14=IFCSTAIRFLIGHT('sf',$,'Flight',$,$,$,$,$,$,$,$,$);
#15=IFCWALL('w2',$,'Orphan',$,$,$,$,$);
#20=IFCRELAGGREGATES('a1',$,$,$,#1,(#2));
#21=IFCRELAGGREGATES('a2',$,$,$,#2,(#3));
#22=IFCRELAGGREGATES('a3',$,$,$,#3,(#5,#4));
#23=IFCRELAGGREGATES('a4',$,$,$,#4,(#6));
#24=IFCRELCONTAINEDINSPATIALSTRUCTURE('c1',$,$,$,(#10,#11),#4);
#25=IFCRELCONTAINEDINSPATIALSTRUCTURE('c2',$,$,$,(#12),#6);
#26=IFCRELCONTAINEDINSPATIALSTRUCTURE('c3',$,$,$,(#13),#5);
#27=IFCRELAGGREGATES('a5',$,$,$,#13,(#14));
ENDSEC;
END-ISO-10303-21;
"#;

    fn spatial() -> SpatialQueryImpl {
        let resolver = ResolverImpl::new(TEST_IFC.to_string(), EntityScanner::index(TEST_IFC));
        SpatialQueryImpl::build(&resolver)
    }

    #[test]
    fn test_tree_shape() {
        let spatial = spatial();
        let tree = spatial.spatial_tree().unwrap();
        assert_eq!(tree.name.as_deref(), Some("Test Project"));
        assert_eq!(spatial.buildings(), vec![EntityId(3)]);
        // The orphan wall is not contained anywhere
        assert_eq!(spatial.element_count(), 5);
        assert!(tree.find(EntityId(15)).is_none());
    }

    #[test]
    fn test_storeys_sorted_by_elevation() {
        let storeys = spatial().storeys();
        assert_eq!(storeys.len(), 2);
        assert_eq!(storeys[0].name.as_deref(), Some("Ground Floor"));
        assert_eq!(storeys[0].element_count, 3);
        assert_eq!(storeys[1].name, None);
        assert_eq!(storeys[1].elevation, 3200.0);
    }

    #[test]
    fn test_containers() {
        let spatial = spatial();
        assert_eq!(spatial.containing_storey(EntityId(10)), Some(EntityId(4)));
        assert_eq!(spatial.containing_space(EntityId(10)), None);
        // Contained in a space, which sits on the ground floor
        assert_eq!(spatial.containing_storey(EntityId(12)), Some(EntityId(4)));
        assert_eq!(spatial.containing_space(EntityId(12)), Some(EntityId(6)));
        // Aggregated part inherits the storey of its whole
        assert_eq!(spatial.containing_storey(EntityId(14)), Some(EntityId(5)));
        assert_eq!(spatial.containing_storey(EntityId(15)), None);
    }

    #[test]
    fn test_building_lookups() {
        let spatial = spatial();
        assert_eq!(spatial.building_of(EntityId(14)), Some(EntityId(3)));
        assert_eq!(spatial.building_of(EntityId(15)), None);
        assert_eq!(spatial.elements_in_building(EntityId(3)).len(), 5);
        assert!(spatial.elements_in_building(EntityId(4)).is_empty());
    }

    #[test]
    fn test_search_and_type_lookup() {
        let spatial = spatial();
        assert_eq!(spatial.search("desk"), vec![EntityId(12)]);
        assert_eq!(spatial.search("ifcstair"), vec![EntityId(13), EntityId(14)]);
        assert_eq!(spatial.elements_by_type(&IfcType::IfcWall), vec![EntityId(10)]);
    }

    #[test]
    fn test_empty_spatial() {
        let spatial = SpatialQueryImpl::empty();
        assert!(spatial.spatial_tree().is_none());
        assert!(spatial.storeys().is_empty());
        assert!(spatial.buildings().is_empty());
    }
}
