use std::sync::{Arc, Mutex};

use crate::{datastore::TopicStore, TopicCatalog};

/// In-process catalog, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryTopicStore {
    catalog: Arc<Mutex<TopicCatalog>>,
}

impl MemoryTopicStore {
    pub fn new(catalog: TopicCatalog) -> Self {
        MemoryTopicStore {
            catalog: Arc::new(Mutex::new(catalog)),
        }
    }

    /// Current state of the catalog
    pub fn snapshot(&self) -> TopicCatalog {
        self.catalog
            .lock()
            .map(|catalog| catalog.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl TopicStore for MemoryTopicStore {
    async fn load_catalog(&self) -> anyhow::Result<TopicCatalog> {
        Ok(self.snapshot())
    }

    async fn save_index(&self, index: usize) -> anyhow::Result<()> {
        let mut catalog = self
            .catalog
            .lock()
            .map_err(|_| anyhow::anyhow!("topic catalog lock poisoned"))?;
        catalog.last_used_index = index;
        Ok(())
    }
}
