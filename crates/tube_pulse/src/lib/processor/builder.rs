use tokio_util::sync::CancellationToken;
use tube_datastore::TopicStore;

use crate::{
    llm::{ScriptWriter, Synthesizer},
    media::{Composer, ThumbnailRenderer},
    stock::FootageSource,
    upload::VideoHost,
    ContentPipeline, PipelineOptions,
};

pub struct ContentPipelineBuilder<D = (), W = (), V = (), F = (), R = (), C = (), H = ()> {
    store: D,
    writer: W,
    voice: V,
    footage: F,
    renderer: R,
    composer: C,
    host: H,
    options: PipelineOptions,
    cancel: CancellationToken,
}

impl Default for ContentPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentPipelineBuilder {
    pub fn new() -> Self {
        Self {
            store: (),
            writer: (),
            voice: (),
            footage: (),
            renderer: (),
            composer: (),
            host: (),
            options: PipelineOptions::default(),
            cancel: CancellationToken::new(),
        }
    }
}

impl<D, W, V, F, R, C, H> ContentPipelineBuilder<D, W, V, F, R, C, H> {
    pub fn store<D2: TopicStore + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> ContentPipelineBuilder<D2, W, V, F, R, C, H> {
        ContentPipelineBuilder {
            store,
            writer: self.writer,
            voice: self.voice,
            footage: self.footage,
            renderer: self.renderer,
            composer: self.composer,
            host: self.host,
            options: self.options,
            cancel: self.cancel,
        }
    }

    pub fn writer<W2: ScriptWriter + Send + Sync + 'static>(
        self,
        writer: W2,
    ) -> ContentPipelineBuilder<D, W2, V, F, R, C, H> {
        ContentPipelineBuilder {
            store: self.store,
            writer,
            voice: self.voice,
            footage: self.footage,
            renderer: self.renderer,
            composer: self.composer,
            host: self.host,
            options: self.options,
            cancel: self.cancel,
        }
    }

    pub fn voice<V2: Synthesizer + Send + Sync + 'static>(
        self,
        voice: V2,
    ) -> ContentPipelineBuilder<D, W, V2, F, R, C, H> {
        ContentPipelineBuilder {
            store: self.store,
            writer: self.writer,
            voice,
            footage: self.footage,
            renderer: self.renderer,
            composer: self.composer,
            host: self.host,
            options: self.options,
            cancel: self.cancel,
        }
    }

    pub fn footage<F2: FootageSource + Send + Sync + 'static>(
        self,
        footage: F2,
    ) -> ContentPipelineBuilder<D, W, V, F2, R, C, H> {
        ContentPipelineBuilder {
            store: self.store,
            writer: self.writer,
            voice: self.voice,
            footage,
            renderer: self.renderer,
            composer: self.composer,
            host: self.host,
            options: self.options,
            cancel: self.cancel,
        }
    }

    pub fn renderer<R2: ThumbnailRenderer + Send + Sync + 'static>(
        self,
        renderer: R2,
    ) -> ContentPipelineBuilder<D, W, V, F, R2, C, H> {
        ContentPipelineBuilder {
            store: self.store,
            writer: self.writer,
            voice: self.voice,
            footage: self.footage,
            renderer,
            composer: self.composer,
            host: self.host,
            options: self.options,
            cancel: self.cancel,
        }
    }

    pub fn composer<C2: Composer + Send + Sync + 'static>(
        self,
        composer: C2,
    ) -> ContentPipelineBuilder<D, W, V, F, R, C2, H> {
        ContentPipelineBuilder {
            store: self.store,
            writer: self.writer,
            voice: self.voice,
            footage: self.footage,
            renderer: self.renderer,
            composer,
            host: self.host,
            options: self.options,
            cancel: self.cancel,
        }
    }

    pub fn host<H2: VideoHost + Send + Sync + 'static>(
        self,
        host: H2,
    ) -> ContentPipelineBuilder<D, W, V, F, R, C, H2> {
        ContentPipelineBuilder {
            store: self.store,
            writer: self.writer,
            voice: self.voice,
            footage: self.footage,
            renderer: self.renderer,
            composer: self.composer,
            host,
            options: self.options,
            cancel: self.cancel,
        }
    }

    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Pins the run directory name instead of using a timestamp
    pub fn run_label(mut self, label: impl Into<String>) -> Self {
        self.options.run_label = Some(label.into());
        self
    }

    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl<D, W, V, F, R, C, H> ContentPipelineBuilder<D, W, V, F, R, C, H>
where
    D: TopicStore + Send + Sync + 'static,
    W: ScriptWriter + Send + Sync + 'static,
    V: Synthesizer + Send + Sync + 'static,
    F: FootageSource + Send + Sync + 'static,
    R: ThumbnailRenderer + Send + Sync + 'static,
    C: Composer + Send + Sync + 'static,
    H: VideoHost + Send + Sync + 'static,
{
    pub fn build(self) -> ContentPipeline<D, W, V, F, R, C, H> {
        ContentPipeline {
            store: self.store,
            writer: self.writer,
            voice: self.voice,
            footage: self.footage,
            renderer: self.renderer,
            composer: self.composer,
            host: self.host,
            options: self.options,
            cancel: self.cancel,
        }
    }
}
