//! # DataStore Module
//!
//! This module provides the durable state of the content pipeline: the
//! catalog of video topics and the round-robin index recording which topic
//! was used last.
//!
//! The catalog lives in a JSON file in production (`JsonTopicStore`) and in
//! memory for tests (`MemoryTopicStore`). Both sit behind the `TopicStore`
//! trait so the orchestrator's persistence boundary stays explicit.

mod datastore;
mod domain;

pub use datastore::json::JsonTopicStore;
pub use datastore::memory::MemoryTopicStore;
pub use datastore::TopicStore;
pub use domain::{Topic, TopicCatalog};
