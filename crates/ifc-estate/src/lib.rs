// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # ifc-estate
//!
//! Building-entity pipeline for real-estate dashboards. Reads an IFC file,
//! gives every physical element a mesh and a flat property map, groups the
//! elements into buildings and derives engineering metrics from them.
//!
//! ## Overview
//!
//! - [`ModelParser`] - loads a file and assembles a [`Model`]; never fails in
//!   its lenient form, falling back to a stand-in model
//! - [`ElementAssembler`] / [`BuildingAssembler`] - native records into
//!   [`BimElement`]s and [`Building`]s
//! - [`read_properties`] - attributes, property sets, quantities and
//!   materials flattened into one map
//! - [`views`] - JSON-ready summaries for the dashboard and the 3D viewer
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_estate::{ModelParser, ParserConfig};
//!
//! let mut parser = ModelParser::with_default_kernel(ParserConfig::default());
//! let model = parser.parse("tower_2021.ifc");
//! for building in &model.buildings {
//!     println!("{}: {} floors", building.name, building.floor_count());
//! }
//! ```

pub mod assembler;
pub mod config;
pub mod error;
pub mod parser;
pub mod properties;
pub mod repository;
pub mod views;

pub use assembler::{BuildingAssembler, ElementAssembler};
pub use config::{BoundsPolicy, ElementPartition, ParserConfig};
pub use error::{Error, Result};
pub use parser::ModelParser;
pub use properties::read_properties;
pub use repository::{MemoryRepository, ModelRepository};
pub use views::{BuildingSummary, ElementView, ViewerPayload};

pub use ifc_estate_model::{BimElement, Building, GeometryPayload, Model};
