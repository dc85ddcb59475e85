use std::{process::ExitCode, str::FromStr, time::Duration};

use apalis::{layers::sentry::SentryLayer, prelude::*};
use apalis_cron::{CronStream, Tick};
use clap::{Parser, Subcommand};
use cron::Schedule;
use tokio_util::sync::CancellationToken;
use tube_datastore::JsonTopicStore;
use tube_pulse::{
    media::{Ffmpeg, FfmpegComposer, FfmpegThumbnailer},
    openai::OpenAIClient,
    stock::PexelsClient,
    tracing::init_tracing_subscriber,
    types::RunResult,
    upload::{OAuthCredentials, YouTubeClient},
    ContentPipelineBuilder, PipelineConfig, PipelineOptions, Settings,
};

#[derive(Parser)]
#[command(name = "tube-pulse", about = "Automated YouTube content pipeline")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Use this topic instead of the next one in rotation
    #[arg(long)]
    topic: Option<String>,

    /// Stop after composing the video
    #[arg(long)]
    no_upload: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once and exit (default)
    Run,
    /// Start the cron scheduler
    Cron {
        /// Cron schedule expression
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 0 9 * * *")]
        schedule: String,
    },
}

#[derive(Clone)]
struct Config {
    settings: Settings,
    topic: Option<String>,
    skip_upload: bool,
}

async fn run_pipeline(config: &Config, cancel: CancellationToken) -> anyhow::Result<RunResult> {
    let settings = &config.settings;
    let backend = settings.llm_backend()?;

    let credentials = if config.skip_upload {
        OAuthCredentials::default()
    } else {
        settings.youtube_credentials()?
    };

    // an explicit topic never needs the rotation catalog to exist
    let store = match config.topic {
        Some(_) => JsonTopicStore::new(&settings.topics_path),
        None => JsonTopicStore::init(&settings.topics_path).await?,
    };

    let writer = OpenAIClient::new(backend.api_key(), Ffmpeg::default())
        .with_base_url(backend.base_url())
        .with_chat_model(backend.model())
        .with_target_duration(settings.duration);

    let voice = OpenAIClient::new(settings.tts_api_key.clone(), Ffmpeg::default())
        .with_base_url(&settings.tts_base_url)
        .with_speech_model(&settings.tts_model)
        .with_timeout(Duration::from_secs(300));

    let footage =
        PexelsClient::new(settings.require_pexels_api_key()?).with_size(settings.footage_size);

    let pipeline = ContentPipelineBuilder::new()
        .store(store)
        .writer(writer)
        .voice(voice)
        .footage(footage)
        .renderer(FfmpegThumbnailer::new(Ffmpeg::default()))
        .composer(FfmpegComposer::new(Ffmpeg::default(), settings.video_settings()))
        .host(YouTubeClient::new(credentials))
        .options(PipelineOptions {
            voice: settings.tts_voice.clone(),
            clips_per_query: settings.clips_per_query,
            thumbnail_style: settings.thumbnail_style(),
            privacy_status: settings.youtube_privacy_status,
            category_id: settings.youtube_category_id.clone(),
            run_label: None,
        })
        .cancel_token(cancel)
        .build();

    let mut run_config = PipelineConfig::new(&settings.output_root).skip_upload(config.skip_upload);
    run_config.topic = config.topic.clone();

    Ok(pipeline.run(&run_config).await)
}

async fn handle_tick(_tick: Tick, config: Data<Config>) -> anyhow::Result<()> {
    tracing::info!(skip_upload = config.skip_upload, "Running scheduled pipeline...");

    let result = run_pipeline(&config, CancellationToken::new()).await?;
    if !result.is_complete() {
        anyhow::bail!(
            "Scheduled run {} failed at {:?}",
            result.run_id,
            result.failed_stage()
        );
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let config = Config {
        settings: cli.settings,
        topic: cli.topic,
        skip_upload: cli.no_upload,
    };

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            tracing::info!(topic = ?config.topic, "Running pipeline once...");

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, finishing current stage");
                    on_signal.cancel();
                }
            });

            let result = run_pipeline(&config, cancel).await?;
            Ok(ExitCode::from(result.exit_code()))
        }
        Command::Cron { schedule } => {
            tracing::info!(%schedule, "Starting cron scheduler...");
            let schedule = Schedule::from_str(&schedule)?;

            let worker = WorkerBuilder::new("tube-pulse-cron")
                .backend(CronStream::new(schedule))
                .layer(SentryLayer::new())
                .data(config)
                .build(handle_tick);

            worker.run().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
