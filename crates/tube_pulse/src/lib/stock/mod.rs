use std::{
    future::Future,
    path::{Path, PathBuf},
};

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub mod pexels;

pub use pexels::{FootageSize, PexelsClient};

/// A downloadable stock clip returned by a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootageCandidate {
    pub id: u64,
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: u32,
    pub query: String,
}

/// Stock footage library
pub trait FootageSource {
    /// At most `count` candidates for `query`, best match first
    fn search(
        &self,
        query: &str,
        count: usize,
    ) -> impl Future<Output = Result<Vec<FootageCandidate>, ServiceError>> + Send;

    fn download(
        &self,
        candidate: &FootageCandidate,
        dest: &Path,
    ) -> impl Future<Output = Result<PathBuf, ServiceError>> + Send;

    /// Downloads every `(candidate, dest)` pair concurrently. Results keep
    /// the order of `jobs`.
    fn download_all(
        &self,
        jobs: Vec<(FootageCandidate, PathBuf)>,
    ) -> impl Future<Output = Vec<Result<PathBuf, ServiceError>>> + Send
    where
        Self: Sync,
    {
        async move {
            join_all(
                jobs.iter()
                    .map(|(candidate, dest)| self.download(candidate, dest)),
            )
            .await
        }
    }
}

impl<T: FootageSource + Send + Sync> FootageSource for &T {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<FootageCandidate>, ServiceError> {
        (**self).search(query, count).await
    }

    async fn download(
        &self,
        candidate: &FootageCandidate,
        dest: &Path,
    ) -> Result<PathBuf, ServiceError> {
        (**self).download(candidate, dest).await
    }
}
