// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ifc-estate model - traits, record views and domain entities
//!
//! This crate defines the seams between the STEP parser, the geometry kernel
//! and the building pipeline, plus the entities the pipeline produces.
//!
//! # Architecture
//!
//! - [`IfcParser`] / [`IfcModel`] - entry point and read-only model access
//! - [`EntityResolver`] - entity lookup and reference resolution
//! - [`PropertyReader`] - property sets, quantities and materials
//! - [`SpatialQuery`] - spatial hierarchy traversal
//! - [`records`] - typed views over decoded records
//! - [`Model`], [`Building`], [`BimElement`], [`GeometryPayload`] - output entities
//!
//! # Example
//!
//! ```ignore
//! use ifc_estate_model::{IfcModelExt, Record};
//!
//! let model = parser.parse(&content)?;
//! for building in model.building_records() {
//!     println!("{:?}", building.name());
//! }
//! ```

pub mod building;
pub mod element;
pub mod error;
pub mod geometry;
pub mod metrics;
pub mod properties;
pub mod records;
pub mod resolver;
pub mod spatial;
pub mod traits;
pub mod types;

pub use building::*;
pub use element::*;
pub use error::*;
pub use geometry::*;
pub use metrics::*;
pub use properties::*;
pub use records::*;
pub use resolver::*;
pub use spatial::*;
pub use traits::*;
pub use types::*;
