use std::sync::{Arc, Mutex};
use tube_datastore::Topic;
use tube_pulse::{ScriptDraft, ScriptWriter, ServiceError};

use super::Failure;

#[derive(Clone)]
pub struct MockScriptWriter {
    pub body: String,
    pub tags: Vec<String>,
    /// Titles of the topics scripts were requested for
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<Failure>,
}

impl Default for MockScriptWriter {
    fn default() -> Self {
        Self {
            body: "Rust keeps memory safe without a garbage collector. ".repeat(10),
            tags: vec!["rust".into(), "programming".into(), "systems".into()],
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }
}

impl MockScriptWriter {
    pub fn failing(failure: Failure) -> Self {
        Self {
            fail_with: Some(failure),
            ..Default::default()
        }
    }

    pub fn with_body(body: &str) -> Self {
        Self {
            body: body.to_string(),
            ..Default::default()
        }
    }
}

impl ScriptWriter for MockScriptWriter {
    async fn generate(&self, topic: &Topic) -> Result<ScriptDraft, ServiceError> {
        self.calls.lock().unwrap().push(topic.title.clone());
        if let Some(ref failure) = self.fail_with {
            return Err(failure.to_error(ServiceError::Generation));
        }
        Ok(ScriptDraft {
            title: format!("{} Explained", topic.title),
            body: self.body.clone(),
            tags: self.tags.clone(),
        })
    }
}
