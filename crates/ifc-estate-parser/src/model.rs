// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ParsedModel - the `IfcModel` implementation

use crate::properties::PropertyReaderImpl;
use crate::resolver::ResolverImpl;
use crate::scanner::{parse_header, validate, EntityScanner};
use crate::spatial::SpatialQueryImpl;
use crate::units::extract_unit_scale;

use ifc_estate_model::{
    EntityResolver, IfcModel, ModelMetadata, PropertyReader, Result, SpatialQuery,
};
use log::debug;
use std::sync::Arc;

/// Parsed IFC model
///
/// Entities are decoded lazily through the resolver; the scan index,
/// property indices and spatial tree are built up front.
pub struct ParsedModel {
    resolver: Arc<ResolverImpl>,
    properties: Arc<PropertyReaderImpl>,
    spatial: Arc<SpatialQueryImpl>,
    /// File units to metres
    unit_scale: f64,
    metadata: ModelMetadata,
}

impl ParsedModel {
    /// Validate and index IFC content
    ///
    /// Fails when the content is not an ISO-10303-21 file or declares a
    /// schema outside the supported IFC releases.
    pub fn parse(content: &str, build_spatial: bool) -> Result<Self> {
        validate(content)?;
        let metadata = parse_header(content)?;

        let scan = EntityScanner::index(content);
        debug!(
            "indexed {} instances of {} types ({})",
            scan.offsets.len(),
            scan.types.len(),
            metadata.schema_version
        );

        let resolver = Arc::new(ResolverImpl::new(content.to_string(), scan));
        let unit_scale = extract_unit_scale(resolver.as_ref());
        let properties = Arc::new(PropertyReaderImpl::new(
            resolver.clone() as Arc<dyn EntityResolver>
        ));
        let spatial = if build_spatial {
            Arc::new(SpatialQueryImpl::build(resolver.as_ref()))
        } else {
            Arc::new(SpatialQueryImpl::empty())
        };

        Ok(Self {
            resolver,
            properties,
            spatial,
            unit_scale,
            metadata,
        })
    }

    /// Shared handle to the resolver, for geometry processing
    pub fn resolver_arc(&self) -> Arc<ResolverImpl> {
        self.resolver.clone()
    }
}

impl IfcModel for ParsedModel {
    fn resolver(&self) -> &dyn EntityResolver {
        self.resolver.as_ref()
    }

    fn properties(&self) -> &dyn PropertyReader {
        self.properties.as_ref()
    }

    fn spatial(&self) -> &dyn SpatialQuery {
        self.spatial.as_ref()
    }

    fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
