use tube_datastore::{MemoryTopicStore, TopicCatalog, TopicStore};

/// Serves the catalog but refuses to persist the rotation index
#[derive(Clone, Default)]
pub struct ReadOnlyTopicStore {
    pub inner: MemoryTopicStore,
}

impl ReadOnlyTopicStore {
    pub fn new(catalog: TopicCatalog) -> Self {
        Self {
            inner: MemoryTopicStore::new(catalog),
        }
    }
}

impl TopicStore for ReadOnlyTopicStore {
    async fn load_catalog(&self) -> anyhow::Result<TopicCatalog> {
        self.inner.load_catalog().await
    }

    async fn save_index(&self, _index: usize) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("Read-only file system"))
    }
}
