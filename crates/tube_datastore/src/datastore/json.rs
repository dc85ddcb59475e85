use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;

use crate::{datastore::TopicStore, TopicCatalog};

/// Topic catalog persisted as a JSON document on disk.
///
/// Only the `last_used_index` key is ever rewritten; any other keys in the
/// document are preserved.
#[derive(Debug, Clone)]
pub struct JsonTopicStore {
    path: PathBuf,
}

impl JsonTopicStore {
    /// Points at `path` without touching the file. Errors surface on the
    /// first load instead.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonTopicStore { path: path.into() }
    }

    /// Opens the catalog at `path` and validates that it parses
    pub async fn init(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let store = JsonTopicStore::new(path);

        store
            .read_catalog()
            .inspect_err(|e| tracing::error!(error = ?e, path = ?store.path, "Failed to open topic catalog"))
            .context("Failed to open topic catalog")?;

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> anyhow::Result<Value> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", self.path.display()))
    }

    fn read_catalog(&self) -> anyhow::Result<TopicCatalog> {
        let document = self.read_document()?;
        serde_json::from_value(document)
            .with_context(|| format!("Unexpected catalog layout in {}", self.path.display()))
    }

    // write to a sibling file first so a crash never leaves a truncated catalog
    fn write_document(&self, document: &Value) -> anyhow::Result<()> {
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, serde_json::to_vec_pretty(document)?)
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        std::fs::rename(&staging, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl TopicStore for JsonTopicStore {
    async fn load_catalog(&self) -> anyhow::Result<TopicCatalog> {
        self.read_catalog()
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to load topic catalog"))
    }

    async fn save_index(&self, index: usize) -> anyhow::Result<()> {
        let mut document = self.read_document()?;
        let Some(object) = document.as_object_mut() else {
            anyhow::bail!("Topic catalog {} is not a JSON object", self.path.display());
        };
        object.insert("last_used_index".into(), Value::from(index));

        self.write_document(&document)
            .inspect_err(|e| tracing::error!(error = ?e, index, "Failed to persist topic index"))?;

        tracing::debug!(index, path = ?self.path, "Persisted topic index");
        Ok(())
    }
}
