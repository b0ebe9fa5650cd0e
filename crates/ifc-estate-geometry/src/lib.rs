// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # ifc-estate Geometry
//!
//! Turns IFC building elements into triangle meshes for the estate pipeline.
//! Entity lookup goes through the `EntityResolver` trait from
//! `ifc-estate-model`, so the crate does not depend on a particular parser.
//!
//! ## Overview
//!
//! - **Kernel**: [`GeometryRouter`] dispatches representation items to
//!   processors and places the result in world space, in metres
//! - **Processors**: extruded area solids, tessellated face sets, faceted breps
//! - **Profiles / Extrusion**: 2D profiles swept into closed prisms
//! - **Extraction**: [`GeometryExtractor`] picks between the kernel's mesh, a
//!   parametric box and a unit cube so every element gets a payload
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_estate_geometry::{GeometryExtractor, GeometryRouter, ShapeKernel};
//!
//! let router = GeometryRouter::with_default_processors();
//! let session = router.session(model.as_ref());
//! let extractor = GeometryExtractor::new(session.as_ref());
//! for element in model.element_records() {
//!     let payload = extractor.extract(&element, model.properties());
//!     println!("{}: {} triangles", element.class_name(), payload.face_count);
//! }
//! ```

pub mod error;
pub mod extractor;
pub mod extrusion;
pub mod fallback;
pub mod kernel;
pub mod mesh;
pub mod placement;
pub mod processors;
pub mod profile;
pub mod router;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

pub use error::{Error, Result};
pub use extractor::{reshape, GeometryExtractor};
pub use extrusion::extrude_profile;
pub use fallback::{default_dimensions, parametric_box, unit_cube, BOX_FACES};
pub use kernel::{RawShape, ShapeKernel, ShapeSession};
pub use mesh::Mesh;
pub use placement::{local_frame, object_placement, LocalFrame};
pub use processors::{ExtrudedAreaSolidProcessor, FaceSetProcessor, FacetedBrepProcessor};
pub use profile::Profile2D;
pub use router::{GeometryProcessor, GeometryRouter, RouterSession};
