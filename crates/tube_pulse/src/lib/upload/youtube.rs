use std::{fmt, path::Path};

use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};

use crate::{
    error::ServiceError,
    http::{error_parts, retrying_client},
    types::RemoteVideo,
    upload::{Credential, UploadMetadata, VideoHost},
};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/youtube/v3";

/// Installed-app OAuth client plus a long-lived refresh token
#[derive(Clone, Default)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl OAuthCredentials {
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.refresh_token.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource<'a> {
    snippet: VideoSnippet<'a>,
    status: VideoStatus<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet<'a> {
    title: &'a str,
    description: &'a str,
    tags: &'a [String],
    category_id: &'a str,
    default_language: &'a str,
    default_audio_language: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatus<'a> {
    privacy_status: &'a str,
    self_declared_made_for_kids: bool,
}

impl<'a> From<&'a UploadMetadata> for VideoResource<'a> {
    fn from(metadata: &'a UploadMetadata) -> Self {
        VideoResource {
            snippet: VideoSnippet {
                title: &metadata.title,
                description: &metadata.description,
                tags: &metadata.tags,
                category_id: &metadata.category_id,
                default_language: "en",
                default_audio_language: "en",
            },
            status: VideoStatus {
                privacy_status: metadata.privacy_status.as_str(),
                self_declared_made_for_kids: false,
            },
        }
    }
}

/// Maps a failed YouTube or OAuth response onto a [`ServiceError`]
pub fn classify_upload_error(status: u16, body: String) -> ServiceError {
    if status == 401 || body.contains("invalid_grant") {
        ServiceError::AuthExpired(body)
    } else if status == 429 || body.contains("quotaExceeded") || body.contains("uploadLimitExceeded") {
        ServiceError::QuotaExceeded(body)
    } else if (400..500).contains(&status) {
        ServiceError::UploadRejected(format!("{status} - {body}"))
    } else {
        ServiceError::Api {
            status,
            message: body,
        }
    }
}

/// YouTube Data API v3 uploader
pub struct YouTubeClient {
    client: ClientWithMiddleware,
    credentials: OAuthCredentials,
    token_url: String,
    upload_base_url: String,
}

impl YouTubeClient {
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            client: retrying_client(),
            credentials,
            token_url: TOKEN_URL.into(),
            upload_base_url: UPLOAD_BASE_URL.into(),
        }
    }

    pub fn with_endpoints(mut self, token_url: impl Into<String>, upload_base_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.upload_base_url = upload_base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Opens a resumable upload session and returns its url
    async fn start_session(
        &self,
        metadata: &UploadMetadata,
        content_length: usize,
        credential: &Credential,
    ) -> Result<String, ServiceError> {
        let resp = self
            .client
            .post(format!("{}/videos", self.upload_base_url))
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&credential.access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", content_length.to_string())
            .json(&VideoResource::from(metadata))
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let (status, body) = error_parts(resp).await;
            tracing::error!(status, body = %body, "Failed to open upload session");
            return Err(classify_upload_error(status, body));
        }

        resp.headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ServiceError::UploadRejected("No upload session url returned".into()))
    }
}

impl VideoHost for YouTubeClient {
    #[tracing::instrument(skip(self))]
    async fn authenticate(&self) -> Result<Credential, ServiceError> {
        if !self.credentials.is_complete() {
            return Err(ServiceError::AuthExpired(
                "OAuth client id, secret and refresh token are required".into(),
            ));
        }

        let params = serde_json::json!({
            "client_id": self.credentials.client_id,
            "client_secret": self.credentials.client_secret,
            "refresh_token": self.credentials.refresh_token,
            "grant_type": "refresh_token"
        });

        let resp = self
            .client
            .post(&self.token_url)
            .json(&params)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let (status, body) = error_parts(resp).await;
            tracing::error!(status, "Failed to refresh access token");
            return Err(classify_upload_error(status, body));
        }

        let token = resp.json::<TokenResponse>().await?;
        tracing::info!(expires_in = token.expires_in, "Access token refreshed");

        Ok(Credential {
            access_token: token.access_token,
            expires_in_secs: token.expires_in,
        })
    }

    #[tracing::instrument(skip(self, metadata, credential), fields(video = %video.display(), title = %metadata.title))]
    async fn upload(
        &self,
        video: &Path,
        metadata: &UploadMetadata,
        credential: &Credential,
    ) -> Result<RemoteVideo, ServiceError> {
        let bytes = tokio::fs::read(video).await?;
        let session_url = self.start_session(metadata, bytes.len(), credential).await?;

        tracing::info!(bytes = bytes.len(), privacy = %metadata.privacy_status, "Uploading video");

        let resp = self
            .client
            .put(&session_url)
            .bearer_auth(&credential.access_token)
            .header(reqwest::header::CONTENT_TYPE, "video/mp4")
            .body(bytes)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let (status, body) = error_parts(resp).await;
            tracing::error!(status, body = %body, "YouTube upload failed");
            return Err(classify_upload_error(status, body));
        }

        let uploaded = resp.json::<UploadedVideo>().await?;
        let remote = RemoteVideo::from_id(uploaded.id);
        tracing::info!(id = %remote.id, url = %remote.url, "Video published");

        Ok(remote)
    }

    #[tracing::instrument(skip(self, thumbnail, credential))]
    async fn set_thumbnail(
        &self,
        video_id: &str,
        thumbnail: &Path,
        credential: &Credential,
    ) -> Result<(), ServiceError> {
        let bytes = tokio::fs::read(thumbnail).await?;

        let resp = self
            .client
            .post(format!("{}/thumbnails/set", self.upload_base_url))
            .query(&[("videoId", video_id)])
            .bearer_auth(&credential.access_token)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(bytes)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let (status, body) = error_parts(resp).await;
            return Err(classify_upload_error(status, body));
        }

        tracing::info!("Thumbnail set");
        Ok(())
    }
}
