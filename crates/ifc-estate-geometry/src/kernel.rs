// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape kernel seam
//!
//! The extractor talks to the geometry backend only through these traits, so
//! the pipeline can run against [`GeometryRouter`](crate::GeometryRouter) or
//! against a stub in tests.

use crate::{Mesh, Result};
use ifc_estate_model::{DecodedEntity, IfcModel};

/// Flat world-space triangle soup
///
/// `vertices` holds xyz triples in metres and `faces` holds index triples.
/// Vertices are not welded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawShape {
    pub vertices: Vec<f64>,
    pub faces: Vec<u32>,
}

impl RawShape {
    pub fn new(vertices: Vec<f64>, faces: Vec<u32>) -> Self {
        Self { vertices, faces }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }
}

impl From<Mesh> for RawShape {
    fn from(mesh: Mesh) -> Self {
        Self {
            vertices: mesh.positions,
            faces: mesh.indices,
        }
    }
}

/// Geometry backend shared across parses
pub trait ShapeKernel: Send + Sync {
    /// Open a triangulation session bound to one loaded model
    ///
    /// Sessions own whatever per-model caches the backend keeps, so nothing
    /// leaks from one file into the next.
    fn session<'m>(&'m self, model: &'m dyn IfcModel) -> Box<dyn ShapeSession + 'm>;
}

/// Triangulation of elements within one model
pub trait ShapeSession: Send + Sync {
    /// Triangulate an element's body representation in world coordinates
    fn triangulate(&self, element: &DecodedEntity) -> Result<RawShape>;
}
