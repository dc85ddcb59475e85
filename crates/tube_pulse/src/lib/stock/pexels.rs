use std::path::{Path, PathBuf};

use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::{
    error::ServiceError,
    http::{error_parts, retrying_client},
    stock::{FootageCandidate, FootageSource},
};

/// Pexels caps a search page at this many results
const MAX_PER_PAGE: usize = 15;

/// Preferred rendition size of a Pexels video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FootageSize {
    Large,
    #[default]
    Medium,
    Small,
}

impl FootageSize {
    /// Pexels `quality` values to look for, in order
    fn qualities(&self) -> &'static [&'static str] {
        match self {
            FootageSize::Large => &["hd", "sd"],
            FootageSize::Medium => &["sd", "hd"],
            FootageSize::Small => &["sd"],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VideoSearchResponse {
    #[serde(default)]
    pub videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
pub struct PexelsVideo {
    pub id: u64,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PexelsVideoFile {
    pub quality: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub link: String,
}

/// Picks the first file matching the size preference, else the first file
pub fn select_best_file(files: &[PexelsVideoFile], size: FootageSize) -> Option<&PexelsVideoFile> {
    size.qualities()
        .iter()
        .find_map(|quality| {
            files
                .iter()
                .find(|file| file.quality.as_deref() == Some(*quality))
        })
        .or_else(|| files.first())
}

fn classify_status(status: u16, message: String) -> ServiceError {
    match status {
        429 => ServiceError::QuotaExceeded(message),
        404 => ServiceError::NotFound(message),
        _ => ServiceError::Api { status, message },
    }
}

#[derive(Clone)]
pub struct PexelsClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    size: FootageSize,
    orientation: String,
}

impl PexelsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: retrying_client(),
            api_key: api_key.into(),
            base_url: "https://api.pexels.com".into(),
            size: FootageSize::default(),
            orientation: "landscape".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_size(mut self, size: FootageSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_orientation(mut self, orientation: impl Into<String>) -> Self {
        self.orientation = orientation.into();
        self
    }

    fn candidates(&self, query: &str, count: usize, response: VideoSearchResponse) -> Vec<FootageCandidate> {
        response
            .videos
            .into_iter()
            .take(count)
            .filter_map(|video| {
                let file = select_best_file(&video.video_files, self.size)?;
                Some(FootageCandidate {
                    id: video.id,
                    url: file.link.clone(),
                    width: file.width,
                    height: file.height,
                    duration_secs: video.duration,
                    query: query.to_string(),
                })
            })
            .collect()
    }
}

impl FootageSource for PexelsClient {
    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str, count: usize) -> Result<Vec<FootageCandidate>, ServiceError> {
        let per_page = count.clamp(1, MAX_PER_PAGE).to_string();

        let resp = self
            .client
            .get(format!("{}/videos/search", self.base_url))
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", self.orientation.as_str()),
            ])
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let (status, message) = error_parts(resp).await;
            tracing::error!(status, body = %message, "Pexels search failed");
            return Err(classify_status(status, message));
        }

        let response = resp.json::<VideoSearchResponse>().await?;
        let candidates = self.candidates(query, count, response);

        if candidates.is_empty() {
            tracing::warn!("No videos found");
        } else {
            tracing::info!(found = candidates.len(), "Found videos");
        }

        Ok(candidates)
    }

    #[tracing::instrument(skip(self, candidate, dest), fields(id = candidate.id, dest = %dest.display()))]
    async fn download(
        &self,
        candidate: &FootageCandidate,
        dest: &Path,
    ) -> Result<PathBuf, ServiceError> {
        let mut resp = self
            .client
            .get(&candidate.url)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let (status, message) = error_parts(resp).await;
            return Err(classify_status(status, message));
        }

        let partial = dest.with_extension("part");
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut written = 0usize;

        let copied: Result<(), ServiceError> = async {
            while let Some(chunk) = resp.chunk().await? {
                file.write_all(&chunk).await?;
                written += chunk.len();
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = copied {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        tokio::fs::rename(&partial, dest).await?;
        tracing::info!(bytes = written, "Downloaded clip");

        Ok(dest.to_path_buf())
    }
}
