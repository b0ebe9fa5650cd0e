// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Derived engineering classifications

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! labelled {
    ($(#[$doc:meta])* $name:ident { $($variant:ident => $label:literal,)* }) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)*
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labelled!(
    /// Building complexity by element count
    ComplexityLevel {
        Low => "Low",
        Medium => "Medium",
        MediumHigh => "Medium-High",
        High => "High",
    }
);

labelled!(
    /// Style guess from the window to wall ratio
    ArchitecturalStyle {
        ModernCommercial => "Modern Commercial",
        Traditional => "Traditional",
    }
);

labelled!(
    /// Dominant construction material
    ConstructionType {
        SteelFrame => "Steel Frame",
        Concrete => "Concrete",
        Mixed => "Mixed",
    }
);

labelled!(
    /// BIM level of development
    BimMaturity {
        Lod400Plus => "LOD 400+",
        Lod300 => "LOD 300",
        Lod200 => "LOD 200",
        Lod100 => "LOD 100",
    }
);

/// What counts as complete geometry when rating BIM maturity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryCompleteness {
    /// Any geometry payload, fallback boxes included
    #[default]
    AnyPayload,
    /// Only kernel-triangulated geometry
    AuthenticOnly,
}

impl GeometryCompleteness {
    /// Whether a payload counts as complete under this reading
    pub fn counts(self, payload: &crate::GeometryPayload) -> bool {
        match self {
            GeometryCompleteness::AnyPayload => true,
            GeometryCompleteness::AuthenticOnly => payload.has_authentic_geometry,
        }
    }
}

impl ComplexityLevel {
    /// Classify a building by its element count
    pub fn for_building(element_count: usize) -> Self {
        if element_count > 100_000 {
            ComplexityLevel::High
        } else if element_count > 10_000 {
            ComplexityLevel::MediumHigh
        } else if element_count > 1_000 {
            ComplexityLevel::Medium
        } else {
            ComplexityLevel::Low
        }
    }

    /// Classify a whole model by its total element count
    ///
    /// Models never rate below Medium.
    pub fn for_model(total_elements: usize) -> Self {
        if total_elements > 100_000 {
            ComplexityLevel::High
        } else if total_elements > 10_000 {
            ComplexityLevel::MediumHigh
        } else {
            ComplexityLevel::Medium
        }
    }
}

impl ArchitecturalStyle {
    pub fn from_counts(windows: usize, walls: usize) -> Self {
        if windows as f64 / walls.max(1) as f64 > 0.3 {
            ArchitecturalStyle::ModernCommercial
        } else {
            ArchitecturalStyle::Traditional
        }
    }
}

impl ConstructionType {
    pub fn from_votes(steel: usize, concrete: usize) -> Self {
        if steel > concrete {
            ConstructionType::SteelFrame
        } else if concrete > 0 {
            ConstructionType::Concrete
        } else {
            ConstructionType::Mixed
        }
    }
}

impl BimMaturity {
    /// Rate an average completeness score in `0.0..=1.0`
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            BimMaturity::Lod400Plus
        } else if score > 0.6 {
            BimMaturity::Lod300
        } else if score > 0.4 {
            BimMaturity::Lod200
        } else {
            BimMaturity::Lod100
        }
    }
}
