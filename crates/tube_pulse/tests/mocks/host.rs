use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tube_pulse::{
    types::RemoteVideo,
    upload::{Credential, UploadMetadata},
    ServiceError, VideoHost,
};

use super::Failure;

#[derive(Clone)]
pub struct MockVideoHost {
    pub uploads: Arc<Mutex<Vec<(PathBuf, UploadMetadata)>>>,
    pub thumbnails: Arc<Mutex<Vec<(String, PathBuf)>>>,
    pub auth_failure: Option<String>,
    pub upload_failure: Option<Failure>,
    pub thumbnail_failure: Option<String>,
}

impl Default for MockVideoHost {
    fn default() -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
            thumbnails: Arc::new(Mutex::new(Vec::new())),
            auth_failure: None,
            upload_failure: None,
            thumbnail_failure: None,
        }
    }
}

impl MockVideoHost {
    pub fn expired() -> Self {
        Self {
            auth_failure: Some("invalid_grant".into()),
            ..Default::default()
        }
    }

    pub fn failing_upload(failure: Failure) -> Self {
        Self {
            upload_failure: Some(failure),
            ..Default::default()
        }
    }
}

impl VideoHost for MockVideoHost {
    async fn authenticate(&self) -> Result<Credential, ServiceError> {
        if let Some(ref msg) = self.auth_failure {
            return Err(ServiceError::AuthExpired(msg.clone()));
        }
        Ok(Credential {
            access_token: "ya29.mock".into(),
            expires_in_secs: Some(3599),
        })
    }

    async fn upload(
        &self,
        video: &Path,
        metadata: &UploadMetadata,
        _credential: &Credential,
    ) -> Result<RemoteVideo, ServiceError> {
        if let Some(ref failure) = self.upload_failure {
            return Err(failure.to_error(ServiceError::UploadRejected));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((video.to_path_buf(), metadata.clone()));
        Ok(RemoteVideo::from_id("dQw4w9WgXcQ"))
    }

    async fn set_thumbnail(
        &self,
        video_id: &str,
        thumbnail: &Path,
        _credential: &Credential,
    ) -> Result<(), ServiceError> {
        if let Some(ref msg) = self.thumbnail_failure {
            return Err(ServiceError::UploadRejected(msg.clone()));
        }
        self.thumbnails
            .lock()
            .unwrap()
            .push((video_id.to_string(), thumbnail.to_path_buf()));
        Ok(())
    }
}
