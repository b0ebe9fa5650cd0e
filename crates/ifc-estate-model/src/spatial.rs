// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial structure and hierarchy traversal

use crate::{EntityId, IfcType};
use serde::{Deserialize, Serialize};

/// Type of spatial structure node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpatialNodeType {
    /// IfcProject - root of the hierarchy
    Project,
    /// IfcSite - geographic site
    Site,
    /// IfcBuilding
    Building,
    /// IfcBuildingStorey - a floor/level
    Storey,
    /// IfcSpace - a room or area
    Space,
    /// Contained element (wall, door, etc.)
    Element,
}

impl SpatialNodeType {
    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            SpatialNodeType::Project => "Project",
            SpatialNodeType::Site => "Site",
            SpatialNodeType::Building => "Building",
            SpatialNodeType::Storey => "Storey",
            SpatialNodeType::Space => "Space",
            SpatialNodeType::Element => "Element",
        }
    }

    /// Determine node type from IFC type
    pub fn from_ifc_type(ifc_type: &IfcType) -> Self {
        match ifc_type {
            IfcType::IfcProject => SpatialNodeType::Project,
            IfcType::IfcSite => SpatialNodeType::Site,
            IfcType::IfcBuilding => SpatialNodeType::Building,
            IfcType::IfcBuildingStorey => SpatialNodeType::Storey,
            IfcType::IfcSpace => SpatialNodeType::Space,
            _ => SpatialNodeType::Element,
        }
    }
}

/// Node in the spatial hierarchy tree
///
/// The tree follows Project → Site → Building → Storey → Space, with
/// contained elements hanging off whichever structure holds them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialNode {
    pub id: EntityId,
    pub node_type: SpatialNodeType,
    /// Name attribute, if the record carries one
    pub name: Option<String>,
    /// IFC class name (e.g., "IfcWall")
    pub entity_type: String,
    /// Elevation in file units (storeys only)
    pub elevation: Option<f64>,
    pub children: Vec<SpatialNode>,
}

impl SpatialNode {
    /// Create a new spatial node
    pub fn new(
        id: EntityId,
        node_type: SpatialNodeType,
        name: Option<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            node_type,
            name,
            entity_type: entity_type.into(),
            elevation: None,
            children: Vec::new(),
        }
    }

    /// Set elevation
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    /// Add a child node
    pub fn add_child(&mut self, child: SpatialNode) {
        self.children.push(child);
    }

    /// Get total element count (recursive)
    pub fn element_count(&self) -> usize {
        self.iter()
            .filter(|n| n.node_type == SpatialNodeType::Element)
            .count()
    }

    /// Find a node by ID (recursive)
    pub fn find(&self, id: EntityId) -> Option<&SpatialNode> {
        self.iter().find(|n| n.id == id)
    }

    /// Iterate all nodes (depth-first, pre-order)
    pub fn iter(&self) -> SpatialNodeIter<'_> {
        SpatialNodeIter { stack: vec![self] }
    }

    /// Get all element IDs in this subtree, in traversal order
    pub fn element_ids(&self) -> Vec<EntityId> {
        self.iter()
            .filter(|n| n.node_type == SpatialNodeType::Element)
            .map(|n| n.id)
            .collect()
    }

    /// Nodes of the given type in this subtree
    pub fn nodes_of_type(&self, node_type: SpatialNodeType) -> Vec<&SpatialNode> {
        self.iter().filter(|n| n.node_type == node_type).collect()
    }
}

/// Iterator over spatial nodes (depth-first)
pub struct SpatialNodeIter<'a> {
    stack: Vec<&'a SpatialNode>,
}

impl<'a> Iterator for SpatialNodeIter<'a> {
    type Item = &'a SpatialNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reverse so the first child is visited first
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}

/// Building storey information
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreyInfo {
    pub id: EntityId,
    pub name: Option<String>,
    /// Elevation in file units
    pub elevation: f64,
    /// Number of elements contained in this storey, spaces included
    pub element_count: usize,
}

/// Kind of spatial structure directly holding an element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Storey,
    Space,
}

/// The spatial structure directly holding an element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialContainer {
    pub id: EntityId,
    pub kind: ContainerKind,
    pub name: Option<String>,
}

/// Spatial query interface
///
/// # Example
///
/// ```ignore
/// use ifc_estate_model::SpatialQuery;
///
/// fn list_storeys(spatial: &dyn SpatialQuery) {
///     for storey in spatial.storeys() {
///         println!("{:?} at {} ({} elements)",
///             storey.name, storey.elevation, storey.element_count);
///     }
/// }
/// ```
pub trait SpatialQuery: Send + Sync {
    /// Root of the spatial structure tree (typically IfcProject)
    fn spatial_tree(&self) -> Option<&SpatialNode>;

    /// All building storeys, sorted by elevation
    fn storeys(&self) -> Vec<StoreyInfo>;

    /// Elements contained in a storey, including those held by its spaces
    fn elements_in_storey(&self, storey_id: EntityId) -> Vec<EntityId>;

    /// Storey an element belongs to, directly or through a space
    fn containing_storey(&self, element_id: EntityId) -> Option<EntityId>;

    /// Space directly holding an element
    fn containing_space(&self, element_id: EntityId) -> Option<EntityId>;

    /// Case-insensitive search across entity names and class names
    fn search(&self, query: &str) -> Vec<EntityId>;

    /// Contained elements of a specific type
    fn elements_by_type(&self, ifc_type: &IfcType) -> Vec<EntityId>;

    /// Building records present in the tree, in tree order
    fn buildings(&self) -> Vec<EntityId> {
        self.spatial_tree()
            .map(|tree| {
                tree.nodes_of_type(SpatialNodeType::Building)
                    .into_iter()
                    .map(|n| n.id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Elements anywhere below a building
    fn elements_in_building(&self, building_id: EntityId) -> Vec<EntityId> {
        self.spatial_tree()
            .and_then(|tree| tree.find(building_id))
            .filter(|node| node.node_type == SpatialNodeType::Building)
            .map(|node| node.element_ids())
            .unwrap_or_default()
    }

    /// Building an element belongs to
    fn building_of(&self, element_id: EntityId) -> Option<EntityId> {
        let tree = self.spatial_tree()?;
        tree.nodes_of_type(SpatialNodeType::Building)
            .into_iter()
            .find(|b| b.find(element_id).is_some())
            .map(|b| b.id)
    }

    /// Every contained element
    fn all_elements(&self) -> Vec<EntityId> {
        self.spatial_tree()
            .map(|tree| tree.element_ids())
            .unwrap_or_default()
    }

    /// Get element count
    fn element_count(&self) -> usize {
        self.all_elements().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(id: u32) -> SpatialNode {
        SpatialNode::new(EntityId(id), SpatialNodeType::Element, None, "IfcWall")
    }

    fn sample_tree() -> SpatialNode {
        let mut space = SpatialNode::new(EntityId(6), SpatialNodeType::Space, None, "IfcSpace");
        space.add_child(element(11));

        let mut storey = SpatialNode::new(
            EntityId(5),
            SpatialNodeType::Storey,
            Some("Ground Floor".into()),
            "IfcBuildingStorey",
        )
        .with_elevation(0.0);
        storey.add_child(element(10));
        storey.add_child(space);

        let mut building =
            SpatialNode::new(EntityId(4), SpatialNodeType::Building, None, "IfcBuilding");
        building.add_child(storey);

        let mut project = SpatialNode::new(EntityId(1), SpatialNodeType::Project, None, "IfcProject");
        project.add_child(building);
        project
    }

    #[test]
    fn test_traversal_order() {
        let tree = sample_tree();
        let ids: Vec<u32> = tree.iter().map(|n| n.id.0).collect();
        assert_eq!(ids, vec![1, 4, 5, 10, 6, 11]);
        assert_eq!(tree.element_ids(), vec![EntityId(10), EntityId(11)]);
        assert_eq!(tree.element_count(), 2);
    }

    #[test]
    fn test_find_and_filter() {
        let tree = sample_tree();
        assert_eq!(tree.find(EntityId(6)).map(|n| n.node_type), Some(SpatialNodeType::Space));
        assert!(tree.find(EntityId(99)).is_none());
        assert_eq!(tree.nodes_of_type(SpatialNodeType::Building).len(), 1);
    }

    #[test]
    fn test_node_type_mapping() {
        assert_eq!(
            SpatialNodeType::from_ifc_type(&IfcType::IfcBuildingStorey),
            SpatialNodeType::Storey
        );
        assert_eq!(
            SpatialNodeType::from_ifc_type(&IfcType::IfcWall),
            SpatialNodeType::Element
        );
        assert_eq!(SpatialNodeType::Space.display_name(), "Space");
    }
}
