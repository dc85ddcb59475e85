use std::{
    fmt,
    future::Future,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::ServiceError,
    types::{RemoteVideo, Script},
};

pub mod youtube;

pub use youtube::{OAuthCredentials, YouTubeClient};

pub const MAX_TITLE_CHARS: usize = 100;
pub const DESCRIPTION_EXCERPT_CHARS: usize = 500;
pub const MAX_DESCRIPTION_CHARS: usize = 5000;
pub const MAX_TAGS: usize = 15;
/// "People & Blogs"
pub const DEFAULT_CATEGORY_ID: &str = "22";

const DESCRIPTION_FOOTER: &str = "\
🔔 Subscribe for more content!
👍 Like this video if you found it helpful!
💬 Comment below with your thoughts!

#automation #ai #technology
";

/// Short-lived bearer token for the hosting API
#[derive(Clone)]
pub struct Credential {
    pub access_token: String,
    pub expires_in_secs: Option<u64>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_in_secs", &self.expires_in_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    Public,
    #[default]
    Private,
    Unlisted,
}

impl PrivacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Public => "public",
            PrivacyStatus::Private => "private",
            PrivacyStatus::Unlisted => "unlisted",
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title, description and classification sent along with a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub privacy_status: PrivacyStatus,
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

impl UploadMetadata {
    /// Derives upload metadata from a script, applying the platform limits
    pub fn from_script(
        script: &Script,
        category_id: impl Into<String>,
        privacy_status: PrivacyStatus,
    ) -> Self {
        let excerpt = truncate_chars(&script.body, DESCRIPTION_EXCERPT_CHARS);
        let description = format!("{excerpt}...\n\n{DESCRIPTION_FOOTER}");

        UploadMetadata {
            title: truncate_chars(&script.title, MAX_TITLE_CHARS),
            description: truncate_chars(&description, MAX_DESCRIPTION_CHARS),
            tags: script.tags.iter().take(MAX_TAGS).cloned().collect(),
            category_id: category_id.into(),
            privacy_status,
        }
    }
}

/// What `upload_metadata.json` holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub privacy_status: PrivacyStatus,
    pub thumbnail_set: bool,
    pub script_file: PathBuf,
    pub video_file: PathBuf,
}

/// Video hosting platform
pub trait VideoHost {
    fn authenticate(&self) -> impl Future<Output = Result<Credential, ServiceError>> + Send;

    fn upload(
        &self,
        video: &Path,
        metadata: &UploadMetadata,
        credential: &Credential,
    ) -> impl Future<Output = Result<RemoteVideo, ServiceError>> + Send;

    fn set_thumbnail(
        &self,
        video_id: &str,
        thumbnail: &Path,
        credential: &Credential,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(title: &str, body: &str, tags: usize) -> Script {
        Script::new(
            title.into(),
            body.into(),
            (0..tags).map(|i| format!("tag{i}")).collect(),
            "topic".into(),
        )
    }

    #[test]
    fn test_metadata_applies_platform_limits() {
        let long_title = "T".repeat(140);
        let long_body = "é".repeat(800);

        let metadata =
            UploadMetadata::from_script(&script(&long_title, &long_body, 20), "22", PrivacyStatus::Private);

        assert_eq!(metadata.title.chars().count(), 100);
        assert_eq!(metadata.tags.len(), 15);
        assert!(metadata.description.starts_with(&"é".repeat(500)));
        assert!(metadata.description[..].contains("é...\n\n🔔 Subscribe"));
        assert!(metadata.description.chars().count() <= MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_short_script_keeps_everything() {
        let metadata = UploadMetadata::from_script(
            &script("Bees", "Bees dance.", 3),
            DEFAULT_CATEGORY_ID,
            PrivacyStatus::Unlisted,
        );

        assert_eq!(metadata.title, "Bees");
        assert!(metadata.description.starts_with("Bees dance....\n\n"));
        assert!(metadata.description.ends_with("#automation #ai #technology\n"));
        assert_eq!(metadata.tags, vec!["tag0", "tag1", "tag2"]);
        assert_eq!(metadata.category_id, "22");
    }

    #[test]
    fn test_credential_debug_hides_token() {
        let credential = Credential {
            access_token: "ya29.secret".into(),
            expires_in_secs: Some(3599),
        };

        assert!(!format!("{credential:?}").contains("secret"));
    }

    #[test]
    fn test_privacy_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PrivacyStatus::Unlisted).unwrap(),
            "\"unlisted\""
        );
    }
}
