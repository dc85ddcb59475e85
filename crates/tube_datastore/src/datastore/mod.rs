use std::future::Future;

use crate::TopicCatalog;

pub mod json;
pub mod memory;

pub trait TopicStore {
    /// Loads the full topic catalog, including the last used index
    fn load_catalog(&self) -> impl Future<Output = anyhow::Result<TopicCatalog>> + Send;

    /// Durably records `index` as the next rotation position
    fn save_index(&self, index: usize) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<T: TopicStore + Send + Sync> TopicStore for &T {
    async fn load_catalog(&self) -> anyhow::Result<TopicCatalog> {
        (**self).load_catalog().await
    }

    async fn save_index(&self, index: usize) -> anyhow::Result<()> {
        (**self).save_index(index).await
    }
}
