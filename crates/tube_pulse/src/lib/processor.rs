use chrono::{Local, Utc};
use tokio_util::sync::CancellationToken;
use tube_datastore::TopicStore;

use crate::{
    artifacts::{write_record, RunLayout, RESULTS_RECORD, SCRIPT_RECORD},
    config::PipelineConfig,
    error::Error,
    llm::{ScriptWriter, Synthesizer},
    media::{Composer, ThumbnailRenderer, ThumbnailStyle},
    rotation::{self, TopicSelection},
    stock::FootageSource,
    types::{RunResult, RunStatus, Stage, StageFailure, StageStatus},
    upload::{PrivacyStatus, VideoHost, DEFAULT_CATEGORY_ID},
};

pub mod builder;
pub mod stages;

/// Knobs that shape a run without changing its collaborators
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub voice: String,
    pub clips_per_query: usize,
    pub thumbnail_style: ThumbnailStyle,
    pub privacy_status: PrivacyStatus,
    pub category_id: String,
    /// Fixed run directory label; a local timestamp when unset
    pub run_label: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            voice: "alloy".into(),
            clips_per_query: 2,
            thumbnail_style: ThumbnailStyle::default(),
            privacy_status: PrivacyStatus::Private,
            category_id: DEFAULT_CATEGORY_ID.into(),
            run_label: None,
        }
    }
}

/// A failure tagged with the stage it stopped the run at
#[derive(Debug)]
struct StageError {
    stage: Stage,
    error: Error,
}

fn at(stage: Stage) -> impl FnOnce(Error) -> StageError {
    move |error| StageError { stage, error }
}

/// Sequential orchestrator: topic → script → voiceover → visuals →
/// thumbnail → composition → upload.
///
/// Each stage hands its artifacts to the next through the run directory.
/// The first failing stage ends the run; nothing is retried here.
pub struct ContentPipeline<D, W, V, F, R, C, H>
where
    D: TopicStore + Send + Sync + 'static,
    W: ScriptWriter + Send + Sync + 'static,
    V: Synthesizer + Send + Sync + 'static,
    F: FootageSource + Send + Sync + 'static,
    R: ThumbnailRenderer + Send + Sync + 'static,
    C: Composer + Send + Sync + 'static,
    H: VideoHost + Send + Sync + 'static,
{
    pub(crate) store: D,
    pub(crate) writer: W,
    pub(crate) voice: V,
    pub(crate) footage: F,
    pub(crate) renderer: R,
    pub(crate) composer: C,
    pub(crate) host: H,
    pub(crate) options: PipelineOptions,
    pub(crate) cancel: CancellationToken,
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
    /// Token that stops the run before its next stage once cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn run_layout(&self, config: &PipelineConfig) -> RunLayout {
        let label = self
            .options
            .run_label
            .clone()
            .unwrap_or_else(|| Local::now().format("%Y%m%d_%H%M%S").to_string());
        RunLayout::new(&config.output_root, &label)
    }

    // Stages run blocking work on the caller's thread, so give a pending
    // interrupt handler the chance to fire before checking the token.
    async fn enter(&self, stage: Stage) -> Result<(), StageError> {
        tokio::task::yield_now().await;
        if self.cancel.is_cancelled() {
            tracing::warn!(%stage, "Cancellation requested, stopping");
            return Err(at(stage)(Error::Interrupted(stage)));
        }
        tracing::info!(%stage, "Starting stage");
        Ok(())
    }

    /// A stage that fails while an interrupt is pending (an ffmpeg child
    /// killed by the same Ctrl-C, say) is reported as interrupted.
    async fn interrupted_or(&self, stage: Stage, error: Error) -> Error {
        if matches!(error, Error::Interrupted(_)) {
            return error;
        }
        tokio::task::yield_now().await;
        if self.cancel.is_cancelled() {
            tracing::warn!(%stage, error = %error, "Stage failed after cancellation");
            return Error::Interrupted(stage);
        }
        error
    }

    /// Runs every stage in order. Always yields a [`RunResult`], which is
    /// also written to `pipeline_results.json` in the run directory.
    #[tracing::instrument(skip(self, config), fields(topic = ?config.topic, skip_upload = config.skip_upload))]
    pub async fn run(&self, config: &PipelineConfig) -> RunResult {
        let layout = self.run_layout(config);
        let run_id = layout
            .root()
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut result = RunResult::new(run_id);

        match self.execute(config, &layout, &mut result).await {
            Ok(selection) => {
                result.status = RunStatus::Complete;
                tracing::info!(
                    run_id = %result.run_id,
                    remote = ?result.remote_video.as_ref().map(|v| &v.url),
                    "Pipeline complete"
                );

                if let Some(selection) = selection {
                    if let Err(e) = rotation::advance(&self.store, &selection).await {
                        tracing::error!(error = %e, "Failed to persist rotation index");
                    }
                }
            }
            Err(StageError { stage, error }) => {
                let error = self.interrupted_or(stage, error).await;
                tracing::error!(%stage, error = %error, "Pipeline failed");
                result.stages.insert(stage, StageStatus::Failed);
                result.status = RunStatus::Failed;
                result.failure = Some(StageFailure {
                    stage,
                    kind: error.kind(),
                    message: error.to_string(),
                });
            }
        }

        result.finished_at = Some(Utc::now());

        let results_path = layout.record(RESULTS_RECORD);
        if let Err(e) = write_record(&results_path, &result) {
            tracing::error!(error = %e, path = %results_path.display(), "Failed to write run results");
        }

        result
    }

    async fn execute(
        &self,
        config: &PipelineConfig,
        layout: &RunLayout,
        result: &mut RunResult,
    ) -> Result<Option<TopicSelection>, StageError> {
        self.enter(Stage::Script).await?;
        layout.prepare().map_err(|e| at(Stage::Script)(e.into()))?;
        let (topic, selection) = self
            .resolve_topic(config.topic.as_deref())
            .await
            .map_err(at(Stage::Script))?;
        result.topic = Some(topic.title.clone());
        let script = self
            .write_script(&topic, layout)
            .await
            .map_err(at(Stage::Script))?;
        result.artifacts.script = Some(layout.record(SCRIPT_RECORD));
        result.stages.insert(Stage::Script, StageStatus::Succeeded);

        self.enter(Stage::Voiceover).await?;
        let audio = self
            .record_voiceover(&script, layout)
            .await
            .map_err(at(Stage::Voiceover))?;
        result.artifacts.audio = Some(audio.path.clone());
        result.stages.insert(Stage::Voiceover, StageStatus::Succeeded);

        self.enter(Stage::Visuals).await?;
        let clips = self
            .gather_visuals(&topic, &script, layout)
            .await
            .map_err(at(Stage::Visuals))?;
        result.artifacts.clips = clips.clips.clone();
        result.stages.insert(Stage::Visuals, StageStatus::Succeeded);

        self.enter(Stage::Thumbnail).await?;
        let thumbnail = self
            .render_thumbnail(&script, layout)
            .await
            .map_err(at(Stage::Thumbnail))?;
        result.artifacts.thumbnail = Some(thumbnail.path.clone());
        result.stages.insert(Stage::Thumbnail, StageStatus::Succeeded);

        self.enter(Stage::Composition).await?;
        let video = self
            .compose_video(&clips, &audio, layout)
            .await
            .map_err(at(Stage::Composition))?;
        result.artifacts.video = Some(video.path.clone());
        result.stages.insert(Stage::Composition, StageStatus::Succeeded);

        if config.skip_upload {
            tracing::info!("Skipping upload");
            result.stages.insert(Stage::Upload, StageStatus::Skipped);
            return Ok(selection);
        }

        self.enter(Stage::Upload).await?;
        let remote = self
            .publish(&script, &video, Some(&thumbnail), layout)
            .await
            .map_err(at(Stage::Upload))?;
        result.remote_video = Some(remote);
        result.stages.insert(Stage::Upload, StageStatus::Succeeded);

        Ok(selection)
    }
}
