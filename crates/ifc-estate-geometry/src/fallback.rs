// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Box geometry for elements without a usable representation

use crate::{Error, Result};
use ifc_estate_model::{Dimensions, ElementCategory, GeometryPayload, GeometrySource};

/// Triangles of the box, winding outwards
pub const BOX_FACES: [[u32; 3]; 12] = [
    [0, 1, 2],
    [0, 2, 3],
    [4, 7, 6],
    [4, 6, 5],
    [0, 4, 5],
    [0, 5, 1],
    [2, 6, 7],
    [2, 7, 3],
    [0, 3, 7],
    [0, 7, 4],
    [1, 5, 6],
    [1, 6, 2],
];

/// Typical size of an element of each category, in metres
pub fn default_dimensions(category: ElementCategory) -> Dimensions {
    let (width, height, depth) = match category {
        ElementCategory::Wall => (4.0, 0.2, 3.0),
        ElementCategory::Slab => (6.0, 6.0, 0.3),
        ElementCategory::Column => (0.3, 0.3, 3.0),
        ElementCategory::Beam => (4.0, 0.3, 0.5),
        ElementCategory::Window => (1.2, 1.5, 0.1),
        ElementCategory::Door => (0.9, 2.1, 0.1),
        ElementCategory::Roof => (6.0, 6.0, 0.4),
        ElementCategory::Stair => (3.0, 1.0, 0.2),
        ElementCategory::Space => (4.0, 4.0, 3.0),
        ElementCategory::Foundation | ElementCategory::Other => (2.0, 2.0, 2.0),
    };
    Dimensions::new(width, height, depth)
}

/// Corners of a box centred on the origin
pub fn box_vertices(dimensions: &Dimensions) -> Vec<[f64; 3]> {
    let w = dimensions.width / 2.0;
    let h = dimensions.height / 2.0;
    let d = dimensions.depth / 2.0;
    vec![
        [-w, -h, -d],
        [w, -h, -d],
        [w, h, -d],
        [-w, h, -d],
        [-w, -h, d],
        [w, -h, d],
        [w, h, d],
        [-w, h, d],
    ]
}

/// Parametric box payload
///
/// Fails if any corner is not finite.
pub fn parametric_box(dimensions: Dimensions, element_type: &str) -> Result<GeometryPayload> {
    let vertices = box_vertices(&dimensions);
    if vertices.iter().flatten().any(|c| !c.is_finite()) {
        return Err(Error::invalid_shape(format!(
            "box for {} has non-finite corners",
            element_type
        )));
    }
    Ok(GeometryPayload::new(
        vertices,
        BOX_FACES.to_vec(),
        dimensions,
        Some(element_type.to_string()),
        GeometrySource::OptimizedFallback,
    ))
}

/// Cube with corners at +-1, for when nothing else works
pub fn unit_cube() -> GeometryPayload {
    let dimensions = Dimensions::new(2.0, 2.0, 2.0);
    GeometryPayload::new(
        box_vertices(&dimensions),
        BOX_FACES.to_vec(),
        dimensions,
        None,
        GeometrySource::MinimalFallback,
    )
}
