//! The individual pipeline stages.
//!
//! Each stage can be invoked on its own: it checks that the artifacts it
//! depends on exist, calls its collaborator, and writes its own record
//! into the run directory.

use std::path::Path;

use tube_datastore::{Topic, TopicStore};

use crate::{
    artifacts::{
        write_record, RunLayout, AUDIO_RECORD, SCRIPT_RECORD, THUMBNAIL_RECORD, UPLOAD_RECORD,
        VIDEO_RECORD, VISUALS_RECORD,
    },
    error::{Error, ServiceError},
    llm::{ScriptWriter, Synthesizer},
    media::{Composer, ThumbnailRenderer},
    rotation::{self, TopicSelection},
    stock::FootageSource,
    types::{AudioArtifact, ClipSet, FinalVideo, RemoteVideo, Script, Stage, Thumbnail},
    upload::{UploadMetadata, UploadRecord, VideoHost},
    ContentPipeline,
};

pub const FALLBACK_QUERIES: [&str; 3] = ["technology", "abstract", "business"];
const MAX_TAG_QUERIES: usize = 3;

/// Stock footage queries for a topic: its own visual queries, else the
/// first script tags, else generic fallbacks
pub fn visual_queries(topic: &Topic, script: &Script) -> Vec<String> {
    let own = topic
        .visual_queries
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if !own.is_empty() {
        return own;
    }

    let from_tags = script
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .take(MAX_TAG_QUERIES)
        .map(str::to_string)
        .collect::<Vec<_>>();
    if !from_tags.is_empty() {
        return from_tags;
    }

    FALLBACK_QUERIES.iter().map(|q| q.to_string()).collect()
}

fn require_input(stage: Stage, path: &Path) -> Result<(), Error> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::StageInputMissing {
            stage,
            path: path.to_path_buf(),
        })
    }
}

impl<D, W, V, F, R, C, H> ContentPipeline<D, W, V, F, R, C, H>
where
    D: TopicStore + Send + Sync + 'static,
    W: ScriptWriter + Send + Sync + 'static,
    V: Synthesizer + Send + Sync + 'static,
    F: FootageSource + Send + Sync + 'static,
    R: ThumbnailRenderer + Send + Sync + 'static,
    C: Composer + Send + Sync + 'static,
    H: VideoHost + Send + Sync + 'static,
{
    /// Picks the topic for this run.
    ///
    /// An override is used verbatim, borrowing visual queries and keywords
    /// from a matching catalog entry, and never yields a rotation
    /// selection. Otherwise the next topic in rotation is returned along
    /// with the selection to persist once the run completes.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_topic(
        &self,
        topic_override: Option<&str>,
    ) -> Result<(Topic, Option<TopicSelection>), Error> {
        let Some(title) = topic_override.map(str::trim).filter(|t| !t.is_empty()) else {
            let selection = rotation::next_topic(&self.store).await?;
            return Ok((selection.topic.clone(), Some(selection)));
        };

        let matched = match self.store.load_catalog().await {
            Ok(catalog) => catalog.find_matching(title).cloned(),
            Err(e) => {
                tracing::warn!(error = %e, "Topic catalog unavailable, using bare override");
                None
            }
        };

        let topic = match matched {
            Some(entry) => Topic {
                title: title.to_string(),
                ..entry
            },
            None => Topic::from_title(title),
        };
        tracing::info!(topic = %topic.title, "Using topic override");

        Ok((topic, None))
    }

    #[tracing::instrument(skip(self, topic, layout), fields(topic = %topic.title))]
    pub async fn write_script(&self, topic: &Topic, layout: &RunLayout) -> Result<Script, Error> {
        let draft = self
            .writer
            .generate(topic)
            .await
            .map_err(|e| Error::service(Stage::Script, e))?;

        if draft.body.trim().is_empty() {
            return Err(Error::service(
                Stage::Script,
                ServiceError::Generation("Model returned an empty script".into()),
            ));
        }

        let script = Script::new(draft.title, draft.body, draft.tags, topic.title.clone());
        write_record(&layout.record(SCRIPT_RECORD), &script)?;

        tracing::info!(
            title = %script.title,
            words = script.word_count,
            estimated_secs = script.estimated_duration_secs,
            "Script written"
        );
        Ok(script)
    }

    #[tracing::instrument(skip_all)]
    pub async fn record_voiceover(
        &self,
        script: &Script,
        layout: &RunLayout,
    ) -> Result<AudioArtifact, Error> {
        require_input(Stage::Voiceover, &layout.record(SCRIPT_RECORD))?;

        let audio = self
            .voice
            .synthesize(&script.body, &self.options.voice, &layout.audio())
            .await
            .map_err(|e| Error::service(Stage::Voiceover, e))?;
        write_record(&layout.record(AUDIO_RECORD), &audio)?;

        tracing::info!(duration_secs = audio.duration_secs, "Voiceover recorded");
        Ok(audio)
    }

    /// Searches every query and downloads the hits concurrently. Failed
    /// searches and downloads are skipped unless they hit a quota; the
    /// stage only fails outright when nothing could be fetched.
    #[tracing::instrument(skip_all)]
    pub async fn gather_visuals(
        &self,
        topic: &Topic,
        script: &Script,
        layout: &RunLayout,
    ) -> Result<ClipSet, Error> {
        require_input(Stage::Visuals, &layout.record(SCRIPT_RECORD))?;

        let queries = visual_queries(topic, script);
        tracing::info!(queries = ?queries, "Fetching stock footage");

        let mut jobs = Vec::new();
        for (query_idx, query) in queries.iter().enumerate() {
            let candidates = match self.footage.search(query, self.options.clips_per_query).await {
                Ok(candidates) => candidates,
                Err(e @ ServiceError::QuotaExceeded(_)) => {
                    return Err(Error::service(Stage::Visuals, e));
                }
                Err(e) => {
                    tracing::warn!(%query, error = %e, "Search failed, skipping query");
                    continue;
                }
            };

            jobs.extend(
                candidates
                    .into_iter()
                    .take(self.options.clips_per_query)
                    .enumerate()
                    .map(|(clip_idx, candidate)| (candidate, layout.clip(query_idx, clip_idx))),
            );
        }

        let mut clips = Vec::with_capacity(jobs.len());
        for downloaded in self.footage.download_all(jobs).await {
            match downloaded {
                Ok(path) => clips.push(path),
                Err(e @ ServiceError::QuotaExceeded(_)) => {
                    return Err(Error::service(Stage::Visuals, e));
                }
                Err(e) => tracing::warn!(error = %e, "Download failed, skipping clip"),
            }
        }

        if clips.is_empty() {
            return Err(Error::service(
                Stage::Visuals,
                ServiceError::NotFound(format!("No clips downloaded for {}", queries.join(", "))),
            ));
        }

        let clip_set = ClipSet { queries, clips };
        write_record(&layout.record(VISUALS_RECORD), &clip_set)?;

        tracing::info!(clips = clip_set.clips.len(), "Stock footage downloaded");
        Ok(clip_set)
    }

    #[tracing::instrument(skip_all)]
    pub async fn render_thumbnail(
        &self,
        script: &Script,
        layout: &RunLayout,
    ) -> Result<Thumbnail, Error> {
        require_input(Stage::Thumbnail, &layout.record(SCRIPT_RECORD))?;

        let thumbnail = self
            .renderer
            .render(&script.title, &self.options.thumbnail_style, &layout.thumbnail())
            .map_err(|e| Error::service(Stage::Thumbnail, e))?;
        write_record(&layout.record(THUMBNAIL_RECORD), &thumbnail)?;

        Ok(thumbnail)
    }

    /// Composes into a staging file and only moves it to the final video
    /// path once composition succeeded
    #[tracing::instrument(skip_all)]
    pub async fn compose_video(
        &self,
        clips: &ClipSet,
        audio: &AudioArtifact,
        layout: &RunLayout,
    ) -> Result<FinalVideo, Error> {
        require_input(Stage::Composition, &audio.path)?;
        require_input(Stage::Composition, &layout.record(VISUALS_RECORD))?;

        let staging = layout.staging_video();
        let final_path = layout.video();
        discard(&staging);

        let composed = self
            .composer
            .compose(&clips.clips, audio, &staging)
            .and_then(|video| {
                if staging.is_file() {
                    Ok(video)
                } else {
                    Err(ServiceError::Encoding("Composer produced no output file".into()))
                }
            });

        let mut video = match composed {
            Ok(video) => video,
            Err(e) => {
                discard(&staging);
                return Err(Error::service(Stage::Composition, e));
            }
        };

        std::fs::rename(&staging, &final_path)?;
        video.path = final_path;
        write_record(&layout.record(VIDEO_RECORD), &video)?;

        tracing::info!(
            path = %video.path.display(),
            clips_used = video.clips_used,
            duration_secs = video.duration_secs,
            "Video composed"
        );
        Ok(video)
    }

    /// Uploads the video. Setting the thumbnail afterwards is best effort.
    #[tracing::instrument(skip_all)]
    pub async fn publish(
        &self,
        script: &Script,
        video: &FinalVideo,
        thumbnail: Option<&Thumbnail>,
        layout: &RunLayout,
    ) -> Result<RemoteVideo, Error> {
        require_input(Stage::Upload, &video.path)?;

        let metadata = UploadMetadata::from_script(
            script,
            self.options.category_id.clone(),
            self.options.privacy_status,
        );

        let credential = self
            .host
            .authenticate()
            .await
            .map_err(|e| Error::service(Stage::Upload, e))?;

        let remote = self
            .host
            .upload(&video.path, &metadata, &credential)
            .await
            .map_err(|e| Error::service(Stage::Upload, e))?;

        let mut thumbnail_set = false;
        if let Some(thumbnail) = thumbnail.filter(|t| t.path.is_file()) {
            match self
                .host
                .set_thumbnail(&remote.id, &thumbnail.path, &credential)
                .await
            {
                Ok(()) => thumbnail_set = true,
                Err(e) => tracing::warn!(error = %e, "Thumbnail upload failed, keeping default"),
            }
        }

        let record = UploadRecord {
            id: remote.id.clone(),
            url: remote.url.clone(),
            title: metadata.title,
            privacy_status: metadata.privacy_status,
            thumbnail_set,
            script_file: layout.record(SCRIPT_RECORD),
            video_file: video.path.clone(),
        };
        write_record(&layout.record(UPLOAD_RECORD), &record)?;

        Ok(remote)
    }
}

fn discard(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed partial video"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(error = %e, path = %path.display(), "Failed to remove partial video"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_with_tags(tags: &[&str]) -> Script {
        Script::new(
            "t".into(),
            "body".into(),
            tags.iter().map(|t| t.to_string()).collect(),
            "topic".into(),
        )
    }

    #[test]
    fn test_topic_queries_win() {
        let topic = Topic {
            visual_queries: vec!["ocean waves".into(), " ".into()],
            ..Topic::from_title("Ocean")
        };

        assert_eq!(
            visual_queries(&topic, &script_with_tags(&["a"])),
            vec!["ocean waves"]
        );
    }

    #[test]
    fn test_falls_back_to_first_three_tags() {
        let topic = Topic::from_title("Ocean");

        assert_eq!(
            visual_queries(&topic, &script_with_tags(&["a", "", "b", "c", "d"])),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_generic_queries_when_nothing_else() {
        let topic = Topic::from_title("Ocean");

        assert_eq!(
            visual_queries(&topic, &script_with_tags(&[])),
            vec!["technology", "abstract", "business"]
        );
    }
}
