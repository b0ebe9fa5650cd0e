// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for IFC data representation
//!
//! Entity identifiers, the IFC class enumeration, decoded attribute values and
//! the coarse element categories the pipeline reasons about.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe entity identifier
///
/// Wraps the raw STEP instance name (`#123` becomes `EntityId(123)`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Declares [`IfcType`] together with its STEP spelling.
///
/// Each entry maps a variant (which doubles as the schema class name) to the
/// upper-case keyword used in the DATA section.
macro_rules! ifc_types {
    ($($(#[$doc:meta])* $variant:ident => $step:literal,)*) => {
        /// IFC entity type enumeration
        ///
        /// Covers the classes the extraction pipeline reads. Anything else is
        /// captured as [`IfcType::Unknown`] with its upper-case STEP keyword.
        #[derive(Clone, PartialEq, Eq, Hash, Debug)]
        pub enum IfcType {
            $($(#[$doc])* $variant,)*
            /// Unknown type - stores the upper-case type keyword
            Unknown(String),
        }

        impl IfcType {
            /// Parse a type keyword (any case) into an IfcType
            pub fn parse(s: &str) -> Self {
                let upper = s.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $($step => IfcType::$variant,)*
                    _ => IfcType::Unknown(upper),
                }
            }

            /// Upper-case STEP keyword (e.g. `IFCWALL`)
            pub fn name(&self) -> &str {
                match self {
                    $(IfcType::$variant => $step,)*
                    IfcType::Unknown(s) => s,
                }
            }

            /// Schema class name (e.g. `IfcWall`)
            ///
            /// Unknown types have no recorded spelling and fall back to the
            /// STEP keyword.
            pub fn class_name(&self) -> &str {
                match self {
                    $(IfcType::$variant => stringify!($variant),)*
                    IfcType::Unknown(s) => s,
                }
            }
        }
    };
}

ifc_types! {
    // Spatial structure
    IfcProject => "IFCPROJECT",
    IfcSite => "IFCSITE",
    IfcBuilding => "IFCBUILDING",
    IfcBuildingStorey => "IFCBUILDINGSTOREY",
    IfcSpace => "IFCSPACE",

    // Building elements
    IfcWall => "IFCWALL",
    IfcWallStandardCase => "IFCWALLSTANDARDCASE",
    IfcWallElementedCase => "IFCWALLELEMENTEDCASE",
    IfcCurtainWall => "IFCCURTAINWALL",
    IfcSlab => "IFCSLAB",
    IfcSlabStandardCase => "IFCSLABSTANDARDCASE",
    IfcSlabElementedCase => "IFCSLABELEMENTEDCASE",
    IfcRoof => "IFCROOF",
    IfcBeam => "IFCBEAM",
    IfcBeamStandardCase => "IFCBEAMSTANDARDCASE",
    IfcColumn => "IFCCOLUMN",
    IfcColumnStandardCase => "IFCCOLUMNSTANDARDCASE",
    IfcDoor => "IFCDOOR",
    IfcDoorStandardCase => "IFCDOORSTANDARDCASE",
    IfcWindow => "IFCWINDOW",
    IfcWindowStandardCase => "IFCWINDOWSTANDARDCASE",
    IfcStair => "IFCSTAIR",
    IfcStairFlight => "IFCSTAIRFLIGHT",
    IfcRamp => "IFCRAMP",
    IfcRampFlight => "IFCRAMPFLIGHT",
    IfcRailing => "IFCRAILING",
    IfcCovering => "IFCCOVERING",
    IfcPlate => "IFCPLATE",
    IfcMember => "IFCMEMBER",
    IfcFooting => "IFCFOOTING",
    IfcPile => "IFCPILE",
    IfcChimney => "IFCCHIMNEY",
    IfcShadingDevice => "IFCSHADINGDEVICE",
    IfcBuildingElementProxy => "IFCBUILDINGELEMENTPROXY",
    IfcBuildingElementPart => "IFCBUILDINGELEMENTPART",
    IfcElementAssembly => "IFCELEMENTASSEMBLY",
    IfcDiscreteAccessory => "IFCDISCRETEACCESSORY",
    IfcMechanicalFastener => "IFCMECHANICALFASTENER",
    IfcReinforcingBar => "IFCREINFORCINGBAR",
    IfcReinforcingMesh => "IFCREINFORCINGMESH",
    IfcTendon => "IFCTENDON",

    // Distribution elements
    IfcDistributionElement => "IFCDISTRIBUTIONELEMENT",
    IfcDistributionFlowElement => "IFCDISTRIBUTIONFLOWELEMENT",
    IfcDistributionControlElement => "IFCDISTRIBUTIONCONTROLELEMENT",
    IfcFlowTerminal => "IFCFLOWTERMINAL",
    IfcFlowSegment => "IFCFLOWSEGMENT",
    IfcFlowFitting => "IFCFLOWFITTING",
    IfcFlowController => "IFCFLOWCONTROLLER",
    IfcFlowMovingDevice => "IFCFLOWMOVINGDEVICE",
    IfcFlowStorageDevice => "IFCFLOWSTORAGEDEVICE",
    IfcFlowTreatmentDevice => "IFCFLOWTREATMENTDEVICE",
    IfcEnergyConversionDevice => "IFCENERGYCONVERSIONDEVICE",
    IfcSanitaryTerminal => "IFCSANITARYTERMINAL",
    IfcLightFixture => "IFCLIGHTFIXTURE",
    IfcDuctSegment => "IFCDUCTSEGMENT",
    IfcPipeSegment => "IFCPIPESEGMENT",

    // Furnishing and equipment
    IfcFurnishingElement => "IFCFURNISHINGELEMENT",
    IfcFurniture => "IFCFURNITURE",
    IfcSystemFurnitureElement => "IFCSYSTEMFURNITUREELEMENT",

    // Openings and features
    IfcOpeningElement => "IFCOPENINGELEMENT",
    IfcOpeningStandardCase => "IFCOPENINGSTANDARDCASE",
    IfcVoidingFeature => "IFCVOIDINGFEATURE",
    IfcProjectionElement => "IFCPROJECTIONELEMENT",

    // Geometry representation items
    IfcExtrudedAreaSolid => "IFCEXTRUDEDAREASOLID",
    IfcFacetedBrep => "IFCFACETEDBREP",
    IfcTriangulatedFaceSet => "IFCTRIANGULATEDFACESET",
    IfcPolygonalFaceSet => "IFCPOLYGONALFACESET",
    IfcIndexedPolygonalFace => "IFCINDEXEDPOLYGONALFACE",
    IfcBooleanResult => "IFCBOOLEANRESULT",
    IfcBooleanClippingResult => "IFCBOOLEANCLIPPINGRESULT",
    IfcMappedItem => "IFCMAPPEDITEM",
    IfcRepresentationMap => "IFCREPRESENTATIONMAP",

    // Profiles
    IfcArbitraryClosedProfileDef => "IFCARBITRARYCLOSEDPROFILEDEF",
    IfcArbitraryProfileDefWithVoids => "IFCARBITRARYPROFILEDEFWITHVOIDS",
    IfcRectangleProfileDef => "IFCRECTANGLEPROFILEDEF",
    IfcCircleProfileDef => "IFCCIRCLEPROFILEDEF",
    IfcCircleHollowProfileDef => "IFCCIRCLEHOLLOWPROFILEDEF",
    IfcIShapeProfileDef => "IFCISHAPEPROFILEDEF",
    IfcLShapeProfileDef => "IFCLSHAPEPROFILEDEF",
    IfcTShapeProfileDef => "IFCTSHAPEPROFILEDEF",

    // Curves and points
    IfcPolyline => "IFCPOLYLINE",
    IfcIndexedPolyCurve => "IFCINDEXEDPOLYCURVE",
    IfcCartesianPoint => "IFCCARTESIANPOINT",
    IfcDirection => "IFCDIRECTION",
    IfcCartesianPointList2D => "IFCCARTESIANPOINTLIST2D",
    IfcCartesianPointList3D => "IFCCARTESIANPOINTLIST3D",

    // Placement and transforms
    IfcAxis2Placement2D => "IFCAXIS2PLACEMENT2D",
    IfcAxis2Placement3D => "IFCAXIS2PLACEMENT3D",
    IfcLocalPlacement => "IFCLOCALPLACEMENT",
    IfcCartesianTransformationOperator3D => "IFCCARTESIANTRANSFORMATIONOPERATOR3D",
    IfcCartesianTransformationOperator3DnonUniform => "IFCCARTESIANTRANSFORMATIONOPERATOR3DNONUNIFORM",

    // Representations
    IfcShapeRepresentation => "IFCSHAPEREPRESENTATION",
    IfcProductDefinitionShape => "IFCPRODUCTDEFINITIONSHAPE",
    IfcGeometricRepresentationContext => "IFCGEOMETRICREPRESENTATIONCONTEXT",
    IfcGeometricRepresentationSubContext => "IFCGEOMETRICREPRESENTATIONSUBCONTEXT",

    // Topology
    IfcClosedShell => "IFCCLOSEDSHELL",
    IfcOpenShell => "IFCOPENSHELL",
    IfcFace => "IFCFACE",
    IfcFaceBound => "IFCFACEBOUND",
    IfcFaceOuterBound => "IFCFACEOUTERBOUND",
    IfcPolyLoop => "IFCPOLYLOOP",

    // Relationships
    IfcRelContainedInSpatialStructure => "IFCRELCONTAINEDINSPATIALSTRUCTURE",
    IfcRelAggregates => "IFCRELAGGREGATES",
    IfcRelDefinesByProperties => "IFCRELDEFINESBYPROPERTIES",
    IfcRelDefinesByType => "IFCRELDEFINESBYTYPE",
    IfcRelAssociatesMaterial => "IFCRELASSOCIATESMATERIAL",
    IfcRelVoidsElement => "IFCRELVOIDSELEMENT",
    IfcRelFillsElement => "IFCRELFILLSELEMENT",
    IfcRelSpaceBoundary => "IFCRELSPACEBOUNDARY",

    // Properties and quantities
    IfcPropertySet => "IFCPROPERTYSET",
    IfcPropertySingleValue => "IFCPROPERTYSINGLEVALUE",
    IfcPropertyEnumeratedValue => "IFCPROPERTYENUMERATEDVALUE",
    IfcPropertyBoundedValue => "IFCPROPERTYBOUNDEDVALUE",
    IfcPropertyListValue => "IFCPROPERTYLISTVALUE",
    IfcElementQuantity => "IFCELEMENTQUANTITY",
    IfcQuantityLength => "IFCQUANTITYLENGTH",
    IfcQuantityArea => "IFCQUANTITYAREA",
    IfcQuantityVolume => "IFCQUANTITYVOLUME",
    IfcQuantityCount => "IFCQUANTITYCOUNT",
    IfcQuantityWeight => "IFCQUANTITYWEIGHT",
    IfcQuantityTime => "IFCQUANTITYTIME",

    // Materials
    IfcMaterial => "IFCMATERIAL",
    IfcMaterialList => "IFCMATERIALLIST",
    IfcMaterialLayer => "IFCMATERIALLAYER",
    IfcMaterialLayerSet => "IFCMATERIALLAYERSET",
    IfcMaterialLayerSetUsage => "IFCMATERIALLAYERSETUSAGE",
    IfcMaterialConstituent => "IFCMATERIALCONSTITUENT",
    IfcMaterialConstituentSet => "IFCMATERIALCONSTITUENTSET",
    IfcMaterialProfile => "IFCMATERIALPROFILE",
    IfcMaterialProfileSet => "IFCMATERIALPROFILESET",
    IfcMaterialProfileSetUsage => "IFCMATERIALPROFILESETUSAGE",

    // Units
    IfcUnitAssignment => "IFCUNITASSIGNMENT",
    IfcSIUnit => "IFCSIUNIT",
    IfcConversionBasedUnit => "IFCCONVERSIONBASEDUNIT",
    IfcMeasureWithUnit => "IFCMEASUREWITHUNIT",
}

impl FromStr for IfcType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl IfcType {
    /// Check if this type is a physical element (a subtype of IfcElement)
    ///
    /// Spatial structure, relationships and geometry items are excluded.
    pub fn is_element(&self) -> bool {
        matches!(
            self,
            IfcType::IfcWall
                | IfcType::IfcWallStandardCase
                | IfcType::IfcWallElementedCase
                | IfcType::IfcCurtainWall
                | IfcType::IfcSlab
                | IfcType::IfcSlabStandardCase
                | IfcType::IfcSlabElementedCase
                | IfcType::IfcRoof
                | IfcType::IfcBeam
                | IfcType::IfcBeamStandardCase
                | IfcType::IfcColumn
                | IfcType::IfcColumnStandardCase
                | IfcType::IfcDoor
                | IfcType::IfcDoorStandardCase
                | IfcType::IfcWindow
                | IfcType::IfcWindowStandardCase
                | IfcType::IfcStair
                | IfcType::IfcStairFlight
                | IfcType::IfcRamp
                | IfcType::IfcRampFlight
                | IfcType::IfcRailing
                | IfcType::IfcCovering
                | IfcType::IfcPlate
                | IfcType::IfcMember
                | IfcType::IfcFooting
                | IfcType::IfcPile
                | IfcType::IfcChimney
                | IfcType::IfcShadingDevice
                | IfcType::IfcBuildingElementProxy
                | IfcType::IfcBuildingElementPart
                | IfcType::IfcElementAssembly
                | IfcType::IfcDiscreteAccessory
                | IfcType::IfcMechanicalFastener
                | IfcType::IfcReinforcingBar
                | IfcType::IfcReinforcingMesh
                | IfcType::IfcTendon
                | IfcType::IfcDistributionElement
                | IfcType::IfcDistributionFlowElement
                | IfcType::IfcDistributionControlElement
                | IfcType::IfcFlowTerminal
                | IfcType::IfcFlowSegment
                | IfcType::IfcFlowFitting
                | IfcType::IfcFlowController
                | IfcType::IfcFlowMovingDevice
                | IfcType::IfcFlowStorageDevice
                | IfcType::IfcFlowTreatmentDevice
                | IfcType::IfcEnergyConversionDevice
                | IfcType::IfcSanitaryTerminal
                | IfcType::IfcLightFixture
                | IfcType::IfcDuctSegment
                | IfcType::IfcPipeSegment
                | IfcType::IfcFurnishingElement
                | IfcType::IfcFurniture
                | IfcType::IfcSystemFurnitureElement
                | IfcType::IfcOpeningElement
                | IfcType::IfcOpeningStandardCase
                | IfcType::IfcVoidingFeature
                | IfcType::IfcProjectionElement
        )
    }

    /// Check if this type is a spatial structure element
    pub fn is_spatial(&self) -> bool {
        matches!(
            self,
            IfcType::IfcProject
                | IfcType::IfcSite
                | IfcType::IfcBuilding
                | IfcType::IfcBuildingStorey
                | IfcType::IfcSpace
        )
    }

    /// Coarse category of this type
    pub fn category(&self) -> ElementCategory {
        ElementCategory::of(self)
    }
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Coarse element category
///
/// Groups related IFC classes (a wall and its standard case, a stair and its
/// flights) so defaults, classification tags and metrics can be keyed on one
/// value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementCategory {
    Wall,
    Slab,
    Column,
    Beam,
    Window,
    Door,
    Roof,
    Stair,
    Space,
    Foundation,
    Other,
}

impl ElementCategory {
    /// Every category, in declaration order
    pub const ALL: [ElementCategory; 11] = [
        ElementCategory::Wall,
        ElementCategory::Slab,
        ElementCategory::Column,
        ElementCategory::Beam,
        ElementCategory::Window,
        ElementCategory::Door,
        ElementCategory::Roof,
        ElementCategory::Stair,
        ElementCategory::Space,
        ElementCategory::Foundation,
        ElementCategory::Other,
    ];

    /// Categorize an IFC type
    pub fn of(ifc_type: &IfcType) -> Self {
        match ifc_type {
            IfcType::IfcWall | IfcType::IfcWallStandardCase | IfcType::IfcWallElementedCase => {
                ElementCategory::Wall
            }
            IfcType::IfcSlab | IfcType::IfcSlabStandardCase | IfcType::IfcSlabElementedCase => {
                ElementCategory::Slab
            }
            IfcType::IfcColumn | IfcType::IfcColumnStandardCase => ElementCategory::Column,
            IfcType::IfcBeam | IfcType::IfcBeamStandardCase => ElementCategory::Beam,
            IfcType::IfcWindow | IfcType::IfcWindowStandardCase => ElementCategory::Window,
            IfcType::IfcDoor | IfcType::IfcDoorStandardCase => ElementCategory::Door,
            IfcType::IfcRoof => ElementCategory::Roof,
            IfcType::IfcStair | IfcType::IfcStairFlight => ElementCategory::Stair,
            IfcType::IfcSpace => ElementCategory::Space,
            IfcType::IfcFooting | IfcType::IfcPile => ElementCategory::Foundation,
            _ => ElementCategory::Other,
        }
    }

    /// Categorize a class name or STEP keyword
    pub fn from_type_name(type_name: &str) -> Self {
        Self::of(&IfcType::parse(type_name))
    }

    /// Load-bearing categories
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            ElementCategory::Wall
                | ElementCategory::Column
                | ElementCategory::Beam
                | ElementCategory::Slab
                | ElementCategory::Foundation
        )
    }

    /// `ElementType` tag for the six tagged families
    pub fn element_type_tag(self) -> Option<&'static str> {
        match self {
            ElementCategory::Wall => Some("Wall"),
            ElementCategory::Door => Some("Door"),
            ElementCategory::Window => Some("Window"),
            ElementCategory::Slab => Some("Slab"),
            ElementCategory::Column => Some("Column"),
            ElementCategory::Beam => Some("Beam"),
            _ => None,
        }
    }
}

/// Decoded attribute value
///
/// Represents any value that can appear in an IFC entity's attribute list.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// Null value ($)
    #[default]
    Null,
    /// Derived value (*)
    Derived,
    /// Entity reference (#123)
    EntityRef(EntityId),
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Enumeration value (.VALUE.)
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Typed value like IFCLABEL('text')
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    /// Try to get as entity reference
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get as string (unwraps typed values)
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_string()),
            _ => None,
        }
    }

    /// Try to get as a non-empty string
    pub fn as_non_empty_string(&self) -> Option<&str> {
        self.as_string().filter(|s| !s.trim().is_empty())
    }

    /// Try to get as float (integers and typed measures included)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_float()),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_integer()),
            _ => None,
        }
    }

    /// Try to get as boolean (`.T.` / `.F.` enums included)
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Enum(s) => match s.to_ascii_uppercase().as_str() {
                "TRUE" | "T" => Some(true),
                "FALSE" | "F" => Some(false),
                _ => None,
            },
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_bool()),
            _ => None,
        }
    }

    /// Try to get as enum string
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as list
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// List of floats, skipping non-numeric members
    pub fn as_float_list(&self) -> Option<Vec<f64>> {
        self.as_list()
            .map(|items| items.iter().filter_map(|v| v.as_float()).collect())
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Decoded IFC entity
///
/// Represents a fully decoded IFC entity with its ID, type, and attribute values.
#[derive(Clone, Debug)]
pub struct DecodedEntity {
    /// Entity ID
    pub id: EntityId,
    /// Entity type
    pub ifc_type: IfcType,
    /// Attribute values in order
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    /// Get attribute at index
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    /// Get entity reference at index
    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    /// Get string at index
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_string())
    }

    /// Get a non-empty string at index
    pub fn get_non_empty_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_non_empty_string())
    }

    /// Get float at index
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(|v| v.as_float())
    }

    /// Get list at index
    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(|v| v.as_list())
    }

    /// Get enum string at index
    pub fn get_enum(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_enum())
    }

    /// Get list of entity references at index
    pub fn get_refs(&self, index: usize) -> Option<Vec<EntityId>> {
        self.get_list(index)
            .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
    }
}

/// Model metadata extracted from IFC header
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// IFC schema version (e.g., "IFC2X3", "IFC4", "IFC4X3")
    pub schema_version: String,
    /// Originating system (CAD application)
    pub originating_system: Option<String>,
    /// Preprocessor version
    pub preprocessor_version: Option<String>,
    /// File name from header
    pub file_name: Option<String>,
    /// File description
    pub file_description: Option<String>,
    /// Author
    pub author: Option<String>,
    /// Organization
    pub organization: Option<String>,
    /// Timestamp
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(IfcType::parse("IFCWALL"), IfcType::IfcWall);
        assert_eq!(IfcType::parse("IfcWall"), IfcType::IfcWall);
        assert_eq!(IfcType::parse("ifcbuildingstorey"), IfcType::IfcBuildingStorey);
    }

    #[test]
    fn test_names_round_trip_through_parse() {
        let ty = IfcType::IfcWallStandardCase;
        assert_eq!(ty.name(), "IFCWALLSTANDARDCASE");
        assert_eq!(ty.class_name(), "IfcWallStandardCase");
        assert_eq!(IfcType::parse(ty.class_name()), ty);
    }

    #[test]
    fn test_unknown_type_keeps_keyword() {
        let ty = IfcType::parse("IfcSomethingNew");
        assert_eq!(ty, IfcType::Unknown("IFCSOMETHINGNEW".to_string()));
        assert_eq!(ty.class_name(), "IFCSOMETHINGNEW");
        assert!(!ty.is_element());
    }

    #[test]
    fn test_element_classification() {
        assert!(IfcType::IfcWall.is_element());
        assert!(IfcType::IfcOpeningElement.is_element());
        assert!(!IfcType::IfcSpace.is_element());
        assert!(!IfcType::IfcBuildingStorey.is_element());
        assert!(IfcType::IfcSpace.is_spatial());
    }

    #[test]
    fn test_categories() {
        assert_eq!(IfcType::IfcWallStandardCase.category(), ElementCategory::Wall);
        assert_eq!(IfcType::IfcStairFlight.category(), ElementCategory::Stair);
        assert_eq!(IfcType::IfcFooting.category(), ElementCategory::Foundation);
        assert_eq!(IfcType::IfcCurtainWall.category(), ElementCategory::Other);
        assert_eq!(ElementCategory::from_type_name("IfcDoor"), ElementCategory::Door);
    }

    #[test]
    fn test_structural_categories() {
        let structural: Vec<_> = ElementCategory::ALL
            .iter()
            .copied()
            .filter(|c| c.is_structural())
            .collect();
        assert_eq!(
            structural,
            vec![
                ElementCategory::Wall,
                ElementCategory::Slab,
                ElementCategory::Column,
                ElementCategory::Beam,
                ElementCategory::Foundation,
            ]
        );
    }

    #[test]
    fn test_typed_value_accessors() {
        let label = AttributeValue::TypedValue(
            "IFCLABEL".into(),
            vec![AttributeValue::String("Concrete".into())],
        );
        assert_eq!(label.as_string(), Some("Concrete"));

        let length = AttributeValue::TypedValue(
            "IFCLENGTHMEASURE".into(),
            vec![AttributeValue::Float(2.5)],
        );
        assert_eq!(length.as_float(), Some(2.5));

        assert_eq!(AttributeValue::Enum("T".into()).as_bool(), Some(true));
        assert_eq!(AttributeValue::String("  ".into()).as_non_empty_string(), None);
    }
}
