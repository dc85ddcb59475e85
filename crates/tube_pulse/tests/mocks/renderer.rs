use std::{
    path::Path,
    sync::{Arc, Mutex},
};
use tokio::sync::Notify;
use tube_pulse::{
    media::ThumbnailStyle, types::Thumbnail, ServiceError, ThumbnailRenderer,
};

#[derive(Clone)]
pub struct MockRenderer {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
    /// Woken once a thumbnail has been rendered
    pub on_render: Option<Arc<Notify>>,
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            on_render: None,
        }
    }
}

impl MockRenderer {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl ThumbnailRenderer for MockRenderer {
    fn render(
        &self,
        title: &str,
        _style: &ThumbnailStyle,
        dest: &Path,
    ) -> Result<Thumbnail, ServiceError> {
        self.calls.lock().unwrap().push(title.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(ServiceError::Render(msg.clone()));
        }
        std::fs::write(dest, b"jpg")?;
        if let Some(ref notify) = self.on_render {
            notify.notify_one();
        }
        Ok(Thumbnail {
            path: dest.to_path_buf(),
            title: title.to_string(),
        })
    }
}
