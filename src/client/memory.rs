//! In-memory content source for tests

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use super::{ClientError, ClientIdentity, ContentSource, QueryParams};

/// Answers the post query from a map keyed by slug and records every call
#[derive(Default)]
pub struct MemorySource {
    posts: HashMap<String, Value>,
    failure: Option<String>,
    identity: ClientIdentity,
    calls: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            identity: ClientIdentity::new("w9a2sij1", "production"),
            ..Self::default()
        }
    }

    pub fn with_post(mut self, slug: &str, doc: Value) -> Self {
        self.posts.insert(slug.to_string(), doc);
        self
    }

    /// Every fetch fails with `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Slugs requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ContentSource for MemorySource {
    fn fetch(
        &self,
        _query: &str,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Option<Value>, ClientError>> + Send {
        let slug = params
            .get("slug")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.calls.lock().unwrap().push(slug.clone());

        let outcome = match &self.failure {
            Some(message) => Err(ClientError::Transport(message.clone())),
            None => Ok(self.posts.get(&slug).cloned()),
        };
        async move { outcome }
    }

    fn config(&self) -> ClientIdentity {
        self.identity.clone()
    }
}
