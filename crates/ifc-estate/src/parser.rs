// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model parser - file to [`Model`]
//!
//! A `ModelParser` is either `Unloaded` or holds one loaded file. Parsing
//! loads the file, assembles every element once, distributes the elements
//! over buildings and stamps the model-level figures. The lenient
//! [`ModelParser::parse`] turns any failure into the fallback model; strict
//! callers use [`ModelParser::try_parse`].
//!
//! ```rust,ignore
//! let mut parser = ModelParser::with_default_kernel(ParserConfig::default());
//! let model = parser.parse("tower.ifc");
//! let walls = parser.elements_by_type("Wall");
//! ```

use crate::assembler::{BuildingAssembler, ElementAssembler};
use crate::repository::ModelRepository;
use crate::views::{BuildingSummary, ElementView};
use crate::{Error, ParserConfig, Result};
use ifc_estate_geometry::{GeometryRouter, ShapeKernel};
use ifc_estate_model::{
    BimElement, BoundingBox, ElementRecord, EntityId, EntityResolverExt, IfcModel, IfcModelExt,
    IfcParser, Model, ProjectInfo, Record,
};
use ifc_estate_parser::StepParser;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Project name when the file has no named IfcProject
pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// A file held by a loaded parser
struct LoadedFile {
    path: PathBuf,
    model: Arc<dyn IfcModel>,
    size_bytes: u64,
}

enum State {
    Unloaded,
    Loaded(LoadedFile),
}

/// Summary plus every element, as one document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub building: BuildingSummary,
    pub elements: Vec<ElementView>,
}

/// Orchestrates loading, element assembly and building assembly
pub struct ModelParser {
    config: ParserConfig,
    kernel: Arc<dyn ShapeKernel>,
    state: State,
}

impl ModelParser {
    pub fn new(config: ParserConfig, kernel: Arc<dyn ShapeKernel>) -> Self {
        Self {
            config,
            kernel,
            state: State::Unloaded,
        }
    }

    /// Parser backed by the built-in geometry router
    pub fn with_default_kernel(config: ParserConfig) -> Self {
        Self::new(config, Arc::new(GeometryRouter::with_default_processors()))
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, State::Loaded(_))
    }

    /// Path of the loaded file
    pub fn loaded_path(&self) -> Option<&Path> {
        match &self.state {
            State::Loaded(file) => Some(&file.path),
            State::Unloaded => None,
        }
    }

    /// Read and index a file
    ///
    /// On failure the parser is left unloaded, even if it held a file before.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.state = State::Unloaded;

        let start = Instant::now();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let content = String::from_utf8_lossy(&bytes);
        let model = StepParser::new().parse(&content)?;

        info!(
            "loaded {} ({} bytes, {}, {} entities) in {:?}",
            path.display(),
            bytes.len(),
            model.metadata().schema_version,
            model.resolver().entity_count(),
            start.elapsed()
        );
        self.state = State::Loaded(LoadedFile {
            path: path.to_path_buf(),
            model,
            size_bytes: bytes.len() as u64,
        });
        Ok(())
    }

    /// Load a file and assemble its model, reporting failures
    pub fn try_parse(&mut self, path: impl AsRef<Path>) -> Result<Model> {
        self.load_file(path)?;
        match &self.state {
            State::Loaded(file) => Ok(self.build_model(file)),
            State::Unloaded => Err(Error::NotLoaded),
        }
    }

    /// Load a file and assemble its model
    ///
    /// Never fails: unreadable or unparsable files yield
    /// [`Model::fallback`] with `degraded` set.
    pub fn parse(&mut self, path: impl AsRef<Path>) -> Model {
        let path = path.as_ref();
        match self.try_parse(path) {
            Ok(model) => model,
            Err(e) => {
                error!("falling back for {}: {}", path.display(), e);
                Model::fallback(path.display().to_string(), e.to_string())
            }
        }
    }

    /// Parse a file registered in a repository
    pub fn parse_stored(&mut self, repository: &dyn ModelRepository, id: &str) -> Model {
        match repository.get_path(id) {
            Some(path) => self.parse(path),
            None => {
                error!("no stored file for model {}", id);
                Model::fallback(id, format!("Unknown model id {}", id))
            }
        }
    }

    fn build_model(&self, file: &LoadedFile) -> Model {
        let start = Instant::now();
        let model = file.model.as_ref();
        let mut warnings = Vec::new();

        let project = model.project();
        let project = ProjectInfo {
            name: project
                .as_ref()
                .and_then(|p| p.name())
                .unwrap_or(UNKNOWN_PROJECT)
                .to_string(),
            description: project
                .as_ref()
                .and_then(|p| p.description())
                .map(str::to_string),
            schema: model.metadata().schema_version.clone(),
        };

        let elements = self.assemble_elements(model, &mut warnings);
        let element_total = elements.len();

        let buildings = BuildingAssembler::new(&self.config).assemble_all(
            model,
            &model.building_records(),
            elements,
        );
        let global_bounds = BoundingBox::union_all(buildings.iter().map(|b| &b.bounds))
            .unwrap_or_else(BoundingBox::placeholder);

        info!(
            "assembled {} elements into {} buildings in {:?}",
            element_total,
            buildings.len(),
            start.elapsed()
        );

        Model {
            file_path: file.path.display().to_string(),
            schema: project.schema.clone(),
            buildings,
            project,
            global_bounds,
            total_elements: model.resolver().element_total(),
            file_size_bytes: file.size_bytes,
            degraded: false,
            warnings,
        }
    }

    /// Every element once, in file order
    fn assemble_elements(
        &self,
        model: &dyn IfcModel,
        warnings: &mut Vec<String>,
    ) -> Vec<(EntityId, BimElement)> {
        let session = self.kernel.session(model);
        let assembler = ElementAssembler::new(model, session.as_ref());
        let records = model.element_records();
        let assemble = |record: &ElementRecord| (record.id(), assembler.assemble(record));

        let results: Vec<(EntityId, Option<BimElement>)> = if self.config.parallel {
            records.par_iter().map(assemble).collect()
        } else {
            records.iter().map(assemble).collect()
        };

        let mut elements = Vec::with_capacity(results.len());
        for (id, element) in results {
            match element {
                Some(element) => elements.push((id, element)),
                None => {
                    warn!("dropping element {}", id);
                    warnings.push(format!("Element {} could not be assembled", id));
                }
            }
        }
        debug!(
            "{} of {} elements have authentic geometry",
            elements
                .iter()
                .filter(|(_, e)| e.geometry.has_authentic_geometry)
                .count(),
            elements.len()
        );
        elements
    }

    /// Loaded model, or a warning naming the query
    fn loaded(&self, query: &str) -> Option<&LoadedFile> {
        match &self.state {
            State::Loaded(file) => Some(file),
            State::Unloaded => {
                warn!("{}: no IFC file loaded", query);
                None
            }
        }
    }

    fn views<I>(model: &dyn IfcModel, records: I) -> Vec<ElementView>
    where
        I: IntoIterator<Item = ElementRecord>,
    {
        records
            .into_iter()
            .map(|r| ElementView::from_record(model, &r))
            .collect()
    }

    /// Headline figures of the first building
    pub fn building_summary(&self) -> BuildingSummary {
        self.loaded("building_summary")
            .map(|f| BuildingSummary::from_model(f.model.as_ref(), &f.path))
            .unwrap_or_default()
    }

    pub fn all_elements(&self) -> Vec<ElementView> {
        self.loaded("all_elements")
            .map(|f| Self::views(f.model.as_ref(), f.model.element_records()))
            .unwrap_or_default()
    }

    /// Elements of exactly one class; `"Wall"` reads as `"IfcWall"`
    pub fn elements_by_type(&self, element_type: &str) -> Vec<ElementView> {
        let Some(file) = self.loaded("elements_by_type") else {
            return Vec::new();
        };
        let element_type = element_type.trim();
        let class = if element_type.to_ascii_lowercase().starts_with("ifc") {
            element_type.to_string()
        } else {
            format!("Ifc{}", element_type)
        };

        let model = file.model.as_ref();
        let records = model
            .resolver()
            .find_by_type_name(&class)
            .into_iter()
            .filter_map(ElementRecord::from_entity);
        Self::views(model, records)
    }

    /// Look an element up by GlobalId, then native id, then `ID` property
    pub fn element_by_id(&self, id: &str) -> Option<ElementView> {
        let file = self.loaded("element_by_id")?;
        let model = file.model.as_ref();
        let records = model.element_records();

        let record = records
            .iter()
            .find(|r| r.global_id() == Some(id))
            .cloned()
            .or_else(|| {
                id.trim()
                    .trim_start_matches('#')
                    .parse::<u32>()
                    .ok()
                    .and_then(|n| model.element(EntityId(n)))
            })
            .or_else(|| {
                records.iter().find_map(|r| {
                    model
                        .properties()
                        .get_property(r.id(), "ID")
                        .filter(|p| p.value.to_string() == id)
                        .map(|_| r.clone())
                })
            })?;
        Some(ElementView::from_record(model, &record))
    }

    /// Sorted distinct element class names
    pub fn element_types(&self) -> Vec<String> {
        let Some(file) = self.loaded("element_types") else {
            return Vec::new();
        };
        let types: BTreeSet<String> = file
            .model
            .element_records()
            .iter()
            .map(|r| r.class_name().to_string())
            .collect();
        types.into_iter().collect()
    }

    pub fn spaces(&self) -> Vec<ElementView> {
        self.elements_by_type("IfcSpace")
    }

    /// Summary and all elements of the loaded file
    pub fn to_document(&self) -> ModelDocument {
        ModelDocument {
            building: self.building_summary(),
            elements: self.all_elements(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }
}
