//! Round-robin topic rotation.
//!
//! The rotation index is explicit state: it is read from a [`TopicStore`],
//! fed to [`select_topic`], and written back by the orchestrator only after
//! a run completes.

use tube_datastore::{Topic, TopicCatalog, TopicStore};

use crate::error::Error;

/// A topic picked from the catalog together with the index to persist
/// once the run that uses it succeeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSelection {
    pub topic: Topic,
    pub index: usize,
    pub next_index: usize,
}

/// Picks `topics[index mod N]` and computes `(index + 1) mod N`
pub fn select_topic(topics: &[Topic], index: usize) -> Result<TopicSelection, Error> {
    if topics.is_empty() {
        return Err(Error::NoTopicsConfigured);
    }

    let len = topics.len();
    let index = index % len;

    Ok(TopicSelection {
        topic: topics[index].clone(),
        index,
        next_index: (index + 1) % len,
    })
}

/// Loads the catalog and selects the topic at its persisted index
#[tracing::instrument(skip_all)]
pub async fn next_topic<D: TopicStore>(store: &D) -> Result<TopicSelection, Error> {
    let TopicCatalog {
        topics,
        last_used_index,
    } = store.load_catalog().await.map_err(Error::TopicStore)?;

    let selection = select_topic(&topics, last_used_index)?;
    tracing::info!(
        topic = %selection.topic.title,
        index = selection.index,
        "Selected topic from rotation"
    );

    Ok(selection)
}

/// Persists the index following `selection`
pub async fn advance<D: TopicStore>(store: &D, selection: &TopicSelection) -> Result<(), Error> {
    store
        .save_index(selection.next_index)
        .await
        .map_err(Error::TopicStore)
}
