use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tube_pulse::{stock::FootageCandidate, FootageSource, ServiceError};

use super::Failure;

#[derive(Clone)]
pub struct MockFootageSource {
    pub searches: Arc<Mutex<Vec<String>>>,
    pub downloads: Arc<Mutex<Vec<PathBuf>>>,
    /// Queries whose search fails
    pub failing_queries: Vec<String>,
    pub search_failure: Option<Failure>,
    pub download_failure: Option<Failure>,
}

impl Default for MockFootageSource {
    fn default() -> Self {
        Self {
            searches: Arc::new(Mutex::new(Vec::new())),
            downloads: Arc::new(Mutex::new(Vec::new())),
            failing_queries: Vec::new(),
            search_failure: None,
            download_failure: None,
        }
    }
}

impl MockFootageSource {
    pub fn failing_search(failure: Failure) -> Self {
        Self {
            search_failure: Some(failure),
            ..Default::default()
        }
    }

    pub fn failing_downloads(failure: Failure) -> Self {
        Self {
            download_failure: Some(failure),
            ..Default::default()
        }
    }
}

impl FootageSource for MockFootageSource {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<FootageCandidate>, ServiceError> {
        self.searches.lock().unwrap().push(query.to_string());
        if let Some(ref failure) = self.search_failure {
            if self.failing_queries.is_empty() || self.failing_queries.iter().any(|q| q == query) {
                return Err(failure.to_error(ServiceError::NotFound));
            }
        }
        Ok((0..count as u64)
            .map(|id| FootageCandidate {
                id,
                url: format!("https://videos.example/{query}/{id}.mp4"),
                width: Some(1920),
                height: Some(1080),
                duration_secs: 10,
                query: query.to_string(),
            })
            .collect())
    }

    async fn download(
        &self,
        _candidate: &FootageCandidate,
        dest: &Path,
    ) -> Result<PathBuf, ServiceError> {
        if let Some(ref failure) = self.download_failure {
            return Err(failure.to_error(|msg| ServiceError::Api {
                status: 500,
                message: msg,
            }));
        }
        std::fs::write(dest, b"mp4")?;
        self.downloads.lock().unwrap().push(dest.to_path_buf());
        Ok(dest.to_path_buf())
    }
}
