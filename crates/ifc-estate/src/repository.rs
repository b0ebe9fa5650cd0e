// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model file storage contract

use crate::{Error, Result};
use log::info;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Where uploaded IFC files are kept, keyed by model id
pub trait ModelRepository: Send + Sync {
    /// Register a file and return its model id
    fn save(&self, path: &Path) -> Result<String>;

    /// Stored path of a model, if the id is known
    fn get_path(&self, id: &str) -> Option<PathBuf>;
}

/// Repository that only records paths, for hosts and tests
#[derive(Debug, Default)]
pub struct MemoryRepository {
    paths: RwLock<FxHashMap<String, PathBuf>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.paths.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModelRepository for MemoryRepository {
    fn save(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a file"),
            ));
        }
        let mut paths = self.paths.write().map_err(|_| Error::Poisoned)?;
        let id = format!("model-{:04}", paths.len() + 1);
        paths.insert(id.clone(), path.to_path_buf());
        info!("registered {} as {}", path.display(), id);
        Ok(id)
    }

    fn get_path(&self, id: &str) -> Option<PathBuf> {
        self.paths.read().ok()?.get(id).cloned()
    }
}
