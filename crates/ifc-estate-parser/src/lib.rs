// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC STEP parser for ifc-estate
//!
//! Implements the `ifc-estate-model` traits over an in-memory STEP file.
//!
//! # Features
//!
//! - **Tokenization** using `nom` combinators
//! - **SIMD-accelerated scanning** using `memchr`
//! - **Lazy entity decoding** with an `Arc` cache
//! - **Header validation** against the supported IFC schemas
//!
//! # Example
//!
//! ```ignore
//! use ifc_estate_parser::StepParser;
//! use ifc_estate_model::IfcParser;
//!
//! let model = StepParser::new().parse(ifc_content)?;
//! let walls = model.resolver().find_by_type_name("IFCWALL");
//! println!("Found {} walls", walls.len());
//! ```

mod model;
mod properties;
mod resolver;
mod scanner;
mod spatial;
mod tokenizer;
mod units;

pub use model::ParsedModel;
pub use properties::PropertyReaderImpl;
pub use resolver::ResolverImpl;
pub use scanner::{parse_header, validate, EntityScanner, ScanIndex, SUPPORTED_SCHEMAS};
pub use spatial::SpatialQueryImpl;
pub use tokenizer::{decode_string, parse_entity, Token};
pub use units::extract_unit_scale;

use ifc_estate_model::{IfcModel, IfcParser, Result};
use std::sync::Arc;

/// STEP/IFC parser implementing `IfcParser`
#[derive(Debug, Clone)]
pub struct StepParser {
    /// Whether to build the spatial tree during parsing
    pub build_spatial_tree: bool,
}

impl Default for StepParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StepParser {
    pub fn new() -> Self {
        Self {
            build_spatial_tree: true,
        }
    }

    /// Set whether to build the spatial tree
    pub fn with_spatial_tree(mut self, enabled: bool) -> Self {
        self.build_spatial_tree = enabled;
        self
    }
}

impl IfcParser for StepParser {
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>> {
        ParsedModel::parse(content, self.build_spatial_tree)
            .map(|m| Arc::new(m) as Arc<dyn IfcModel>)
    }
}

/// Parse with default settings
pub fn parse(content: &str) -> Result<Arc<dyn IfcModel>> {
    StepParser::new().parse(content)
}
