use std::{collections::BTreeMap, fmt, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FailureKind;

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Script,
    Voiceover,
    Visuals,
    Thumbnail,
    Composition,
    Upload,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Script,
        Stage::Voiceover,
        Stage::Visuals,
        Stage::Thumbnail,
        Stage::Composition,
        Stage::Upload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Script => "script",
            Stage::Voiceover => "voiceover",
            Stage::Visuals => "visuals",
            Stage::Thumbnail => "thumbnail",
            Stage::Composition => "composition",
            Stage::Upload => "upload",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// The narration script produced by the script stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub title: String,
    #[serde(rename = "script")]
    pub body: String,
    pub tags: Vec<String>,
    pub topic: String,
    pub word_count: usize,
    pub estimated_duration_secs: f64,
}

impl Script {
    /// Average speaking rate, 150 words per minute
    pub const WORDS_PER_SECOND: f64 = 2.5;

    pub fn new(title: String, body: String, tags: Vec<String>, topic: String) -> Self {
        let word_count = body.split_whitespace().count();
        Script {
            title,
            body,
            tags,
            topic,
            word_count,
            estimated_duration_secs: word_count as f64 / Self::WORDS_PER_SECOND,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioArtifact {
    #[serde(rename = "audio_path")]
    pub path: PathBuf,
    pub duration_secs: f64,
    pub voice: String,
}

/// Downloaded stock clips, in download order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipSet {
    pub queries: Vec<String>,
    #[serde(rename = "downloaded_files")]
    pub clips: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(rename = "thumbnail_path")]
    pub path: PathBuf,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalVideo {
    #[serde(rename = "video_path")]
    pub path: PathBuf,
    pub duration_secs: f64,
    pub clips_used: usize,
    pub resolution: String,
    pub fps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteVideo {
    pub id: String,
    pub url: String,
}

impl RemoteVideo {
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        RemoteVideo {
            url: format!("https://youtu.be/{id}"),
            id,
        }
    }
}

/// Paths of the artifacts a run produced, filled in stage by stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub script: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub clips: Vec<PathBuf>,
    pub thumbnail: Option<PathBuf>,
    pub video: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Complete,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one orchestrator invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub status: RunStatus,
    pub topic: Option<String>,
    pub stages: BTreeMap<Stage, StageStatus>,
    pub artifacts: ArtifactPaths,
    pub remote_video: Option<RemoteVideo>,
    pub failure: Option<StageFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunResult {
    pub fn new(run_id: impl Into<String>) -> Self {
        RunResult {
            run_id: run_id.into(),
            status: RunStatus::Pending,
            topic: None,
            stages: BTreeMap::new(),
            artifacts: ArtifactPaths::default(),
            remote_video: None,
            failure: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }

    /// The stage the run stopped at, if it failed
    pub fn failed_stage(&self) -> Option<Stage> {
        self.failure.as_ref().map(|f| f.stage)
    }

    /// Process exit code for this result: 0 only for a complete run
    pub fn exit_code(&self) -> u8 {
        if self.is_complete() {
            0
        } else {
            1
        }
    }
}
