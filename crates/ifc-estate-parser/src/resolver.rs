// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! EntityResolver trait implementation

use crate::scanner::{EntityIndex, ScanIndex, TypeIndex};
use crate::tokenizer::parse_entity_at;
use ifc_estate_model::{DecodedEntity, EntityId, EntityResolver, IfcType};
use log::debug;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe lazy entity resolver
///
/// Owns the file content and decodes an instance the first time it is
/// requested; decoded entities are cached behind an `RwLock`.
pub struct ResolverImpl {
    content: String,
    /// Entity ID -> (start, end) byte offsets
    index: EntityIndex,
    cache: RwLock<FxHashMap<u32, Arc<DecodedEntity>>>,
    types: TypeIndex,
}

impl ResolverImpl {
    /// Create a resolver from a finished scan
    pub fn new(content: String, scan: ScanIndex) -> Self {
        Self {
            content,
            index: scan.offsets,
            cache: RwLock::new(FxHashMap::default()),
            types: scan.types,
        }
    }

    /// Get raw content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of entities decoded so far
    pub fn cached_count(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    fn decode_and_cache(&self, id: u32) -> Option<Arc<DecodedEntity>> {
        {
            let cache = self.cache.read().ok()?;
            if let Some(cached) = cache.get(&id) {
                return Some(Arc::clone(cached));
            }
        }

        let (start, end) = self.index.get(&id)?;
        let entity = match parse_entity_at(&self.content, *start, *end) {
            Ok(entity) => Arc::new(entity),
            Err(e) => {
                debug!("could not decode #{}: {}", id, e);
                return None;
            }
        };

        // Another thread may have decoded it meanwhile; keep the first copy
        let mut cache = self.cache.write().ok()?;
        Some(Arc::clone(cache.entry(id).or_insert(entity)))
    }
}

impl EntityResolver for ResolverImpl {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.decode_and_cache(id.0)
    }

    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>> {
        self.types
            .get(ifc_type)
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    fn count_by_type(&self, ifc_type: &IfcType) -> usize {
        self.types.get(ifc_type).map(Vec::len).unwrap_or(0)
    }

    fn type_census(&self) -> Vec<(IfcType, usize)> {
        self.types
            .iter()
            .map(|(ty, ids)| (ty.clone(), ids.len()))
            .collect()
    }

    fn all_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.index.keys().map(|&id| EntityId(id)).collect();
        ids.sort_unstable();
        ids
    }

    fn entity_count(&self) -> usize {
        self.index.len()
    }
}
