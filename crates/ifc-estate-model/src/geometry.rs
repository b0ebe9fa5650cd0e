// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry payloads attached to building elements

use serde::{Deserialize, Serialize};

/// Smallest extent reported on any axis, in metres
pub const MIN_DIMENSION: f64 = 0.1;

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl BoundingBox {
    pub const fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            min_x: min[0],
            max_x: max[0],
            min_y: min[1],
            max_y: max[1],
            min_z: min[2],
            max_z: max[2],
        }
    }

    /// Fixed volume used when a building's extent is not computed
    pub const fn placeholder() -> Self {
        Self::new([-50.0, -30.0, 0.0], [50.0, 30.0, 25.0])
    }

    /// Extent of the fallback building
    pub const fn fallback() -> Self {
        Self::new([-20.0, -10.0, 0.0], [20.0, 10.0, 25.0])
    }

    /// Tightest box around a set of points, `None` when empty
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [f64; 3]>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(*first, *first);
        for p in iter {
            bounds.include(p);
        }
        Some(bounds)
    }

    /// Grow to contain a point
    pub fn include(&mut self, p: &[f64; 3]) {
        self.min_x = self.min_x.min(p[0]);
        self.min_y = self.min_y.min(p[1]);
        self.min_z = self.min_z.min(p[2]);
        self.max_x = self.max_x.max(p[0]);
        self.max_y = self.max_y.max(p[1]);
        self.max_z = self.max_z.max(p[2]);
    }

    /// Smallest box containing both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
            min_z: self.min_z.min(other.min_z),
            max_z: self.max_z.max(other.max_z),
        }
    }

    /// Union of many boxes, `None` when empty
    pub fn union_all<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BoundingBox>, b| {
                Some(acc.map_or(*b, |a| a.union(b)))
            })
    }

    /// Same box moved by an offset
    pub fn translated(&self, offset: [f64; 3]) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x + offset[0],
            max_x: self.max_x + offset[0],
            min_y: self.min_y + offset[1],
            max_y: self.max_y + offset[1],
            min_z: self.min_z + offset[2],
            max_z: self.max_z + offset[2],
        }
    }

    /// Extent per axis
    pub fn size(&self) -> [f64; 3] {
        [
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        ]
    }
}

/// Box parameters of a payload, in metres
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Dimensions {
    /// Dimensions with every axis floored at [`MIN_DIMENSION`]
    pub fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width: floor_dimension(width),
            height: floor_dimension(height),
            depth: floor_dimension(depth),
        }
    }

    /// Dimensions of a bounding box
    pub fn of_bounds(bounds: &BoundingBox) -> Self {
        let [x, y, z] = bounds.size();
        Self::new(x, y, z)
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.width, self.height, self.depth]
    }
}

fn floor_dimension(value: f64) -> f64 {
    // NaN compares false and is floored as well
    if value >= MIN_DIMENSION {
        value
    } else {
        MIN_DIMENSION
    }
}

/// Which extraction tier produced a payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometrySource {
    /// Triangulated from the element's own representation
    Authentic,
    /// Type-dependent parametric box
    OptimizedFallback,
    /// Unit cube
    MinimalFallback,
}

impl GeometrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometrySource::Authentic => "authentic",
            GeometrySource::OptimizedFallback => "optimized_fallback",
            GeometrySource::MinimalFallback => "minimal_fallback",
        }
    }
}

/// Payload kind tag, kept for viewer compatibility
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    #[default]
    BufferGeometry,
}

/// Triangle mesh of one element with its provenance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryPayload {
    #[serde(rename = "type", default)]
    pub kind: PayloadKind,
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<[u32; 3]>,
    pub parameters: Dimensions,
    pub has_authentic_geometry: bool,
    pub vertex_count: usize,
    pub face_count: usize,
    /// IFC class name; absent on the unit cube
    pub element_type: Option<String>,
    pub geometry_source: GeometrySource,
}

impl GeometryPayload {
    /// Build a payload, deriving counts from the buffers
    pub fn new(
        vertices: Vec<[f64; 3]>,
        faces: Vec<[u32; 3]>,
        parameters: Dimensions,
        element_type: Option<String>,
        geometry_source: GeometrySource,
    ) -> Self {
        Self {
            kind: PayloadKind::BufferGeometry,
            vertex_count: vertices.len(),
            face_count: faces.len(),
            vertices,
            faces,
            parameters,
            has_authentic_geometry: geometry_source == GeometrySource::Authentic,
            element_type,
            geometry_source,
        }
    }

    /// Bounds of the vertex buffer
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounds_from_points() {
        let points = [[1.0, -2.0, 0.5], [-3.0, 4.0, 2.0], [0.0, 0.0, -1.0]];
        let bounds = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bounds, BoundingBox::new([-3.0, -2.0, -1.0], [1.0, 4.0, 2.0]));
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_union_all() {
        let a = BoundingBox::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = BoundingBox::new([-2.0, 0.5, 0.0], [0.5, 3.0, 4.0]);
        let u = BoundingBox::union_all([&a, &b]).unwrap();
        assert_eq!(u, BoundingBox::new([-2.0, 0.0, 0.0], [1.0, 3.0, 4.0]));
        assert!(BoundingBox::union_all(std::iter::empty()).is_none());
    }

    #[test]
    fn test_dimensions_are_floored() {
        let dims = Dimensions::new(4.0, 0.0, -1.0);
        assert_relative_eq!(dims.width, 4.0);
        assert_relative_eq!(dims.height, MIN_DIMENSION);
        assert_relative_eq!(dims.depth, MIN_DIMENSION);
        assert_relative_eq!(Dimensions::new(f64::NAN, 1.0, 1.0).width, MIN_DIMENSION);
    }

    #[test]
    fn test_payload_serialization() {
        let payload = GeometryPayload::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
            Dimensions::new(1.0, 1.0, 0.0),
            Some("IfcSlab".into()),
            GeometrySource::Authentic,
        );
        assert!(payload.has_authentic_geometry);
        assert_eq!(payload.vertex_count, 3);
        assert_eq!(payload.face_count, 1);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "BufferGeometry");
        assert_eq!(json["geometry_source"], "authentic");
        assert_eq!(json["parameters"]["depth"], 0.1);
    }
}
