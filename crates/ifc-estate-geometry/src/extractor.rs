// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Three-tier geometry extraction
//!
//! Every element gets a payload. The kernel's triangulation is used when it
//! is well formed; otherwise a box sized from the element's quantities or
//! from its category stands in, and as a last resort a unit cube.

use crate::fallback::{default_dimensions, parametric_box, unit_cube};
use crate::kernel::{RawShape, ShapeSession};
use crate::{Error, Result};
use ifc_estate_model::{
    BoundingBox, Dimensions, ElementRecord, GeometryPayload, GeometrySource, PropertyReader,
    Record,
};
use log::{debug, warn};

/// Names of the explicit size overrides, as (width, height, depth)
///
/// All three must be present. Door and window quantity sets carry only
/// Width and Height, so those elements keep their table size.
const SIZE_KEYS: [&str; 3] = ["Length", "Width", "Height"];

/// Geometry extractor over one kernel session
pub struct GeometryExtractor<'s> {
    session: &'s dyn ShapeSession,
    /// Metres per file length unit, applied to size overrides
    unit_scale: f64,
}

impl<'s> GeometryExtractor<'s> {
    pub fn new(session: &'s dyn ShapeSession) -> Self {
        Self {
            session,
            unit_scale: 1.0,
        }
    }

    /// Scale quantity-based sizes from file units to metres
    pub fn with_unit_scale(mut self, unit_scale: f64) -> Self {
        self.unit_scale = unit_scale;
        self
    }

    /// Payload for an element; never fails
    pub fn extract(&self, element: &ElementRecord, properties: &dyn PropertyReader) -> GeometryPayload {
        if element.has_representation() {
            match self.authentic(element) {
                Ok(payload) => return payload,
                Err(e) => debug!(
                    "kernel failed for {} {}: {}",
                    element.class_name(),
                    element.id(),
                    e
                ),
            }
        }

        let dimensions = size_overrides(element, properties, self.unit_scale)
            .unwrap_or_else(|| default_dimensions(element.ifc_type().category()));
        match parametric_box(dimensions, element.class_name()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("using unit cube for {}: {}", element.id(), e);
                unit_cube()
            }
        }
    }

    fn authentic(&self, element: &ElementRecord) -> Result<GeometryPayload> {
        let shape = self.session.triangulate(element.entity())?;
        let (vertices, faces) = reshape(shape)?;
        let bounds = BoundingBox::from_points(&vertices)
            .ok_or_else(|| Error::invalid_shape("no vertices"))?;

        Ok(GeometryPayload::new(
            vertices,
            faces,
            Dimensions::of_bounds(&bounds),
            Some(element.class_name().to_string()),
            GeometrySource::Authentic,
        ))
    }
}

/// Split flat kernel buffers into triples, checking they form valid triangles
pub fn reshape(shape: RawShape) -> Result<(Vec<[f64; 3]>, Vec<[u32; 3]>)> {
    let RawShape { vertices, faces } = shape;
    if vertices.is_empty() || vertices.len() % 3 != 0 {
        return Err(Error::invalid_shape(format!(
            "vertex buffer of length {}",
            vertices.len()
        )));
    }
    if faces.is_empty() || faces.len() % 3 != 0 {
        return Err(Error::invalid_shape(format!(
            "index buffer of length {}",
            faces.len()
        )));
    }

    let vertex_count = vertices.len() / 3;
    if let Some(bad) = faces.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(Error::invalid_shape(format!(
            "index {} out of range for {} vertices",
            bad, vertex_count
        )));
    }

    let vertices = vertices
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    let faces = faces.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
    Ok((vertices, faces))
}

/// Explicit Length / Width / Height in metres, when all three are present and positive
///
/// Quantity sets are consulted before numeric property-set values.
fn size_overrides(
    element: &ElementRecord,
    properties: &dyn PropertyReader,
    unit_scale: f64,
) -> Option<Dimensions> {
    let id = element.id();
    let lookup = |key: &str| {
        properties
            .get_quantity(id, key)
            .map(|q| q.value)
            .or_else(|| properties.get_property(id, key)?.value.as_number())
            .filter(|v| *v > 0.0)
            .map(|v| v * unit_scale)
    };

    let [width, height, depth] = SIZE_KEYS;
    Some(Dimensions::new(lookup(width)?, lookup(height)?, lookup(depth)?))
}
