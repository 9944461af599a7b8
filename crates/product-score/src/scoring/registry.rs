use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::context::{validate_contexts, Context, ContextConfigError};
use super::criteria::{CategoryConfig, CategoryConfigError};

/// Scoring rules and usage contexts of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub category: CategoryConfig,
    #[serde(default)]
    pub contexts: Vec<Context>,
}

impl CategoryProfile {
    pub fn id(&self) -> &str {
        &self.category.category_id
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        self.category
            .validate()
            .map_err(|source| RegistryError::InvalidCategory {
                category_id: self.id().to_string(),
                source,
            })?;
        validate_contexts(&self.category, &self.contexts).map_err(|source| {
            RegistryError::InvalidContext {
                category_id: self.id().to_string(),
                source,
            }
        })
    }
}

/// Read-only set of category profiles, built once at startup and shared freely.
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    profiles: Arc<BTreeMap<String, Arc<CategoryProfile>>>,
}

impl CategoryRegistry {
    pub fn from_profiles(
        profiles: impl IntoIterator<Item = CategoryProfile>,
    ) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for profile in profiles {
            profile.validate()?;
            let id = profile.id().to_string();
            if map.contains_key(&id) {
                return Err(RegistryError::DuplicateCategory(id));
            }
            map.insert(id, Arc::new(profile));
        }

        Ok(Self {
            profiles: Arc::new(map),
        })
    }

    /// Load every `*.json` file in `dir` as one [`CategoryProfile`].
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| RegistryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RegistryError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut profiles = Vec::with_capacity(paths.len());
        for path in paths {
            profiles.push(Self::read_profile(&path)?);
        }

        let registry = Self::from_profiles(profiles)?;
        tracing::info!(
            dir = %dir.display(),
            categories = registry.len(),
            "category registry loaded"
        );
        Ok(registry)
    }

    pub fn read_profile(path: &Path) -> Result<CategoryProfile, RegistryError> {
        let raw = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, category_id: &str) -> Option<Arc<CategoryProfile>> {
        self.profiles.get(category_id).cloned()
    }

    pub fn category_ids(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Error raised while building the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("category '{category_id}' is invalid: {source}")]
    InvalidCategory {
        category_id: String,
        #[source]
        source: CategoryConfigError,
    },
    #[error("category '{category_id}' has an invalid context: {source}")]
    InvalidContext {
        category_id: String,
        #[source]
        source: ContextConfigError,
    },
    #[error("category '{0}' is defined more than once")]
    DuplicateCategory(String),
}
