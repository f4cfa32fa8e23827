//! Content store client
//!
//! Runs GROQ queries against the Sanity HTTP query API. The page controller
//! only sees the [`ContentSource`] trait, so anything that can answer a
//! query (including an in-memory map in tests) can stand in for the store.

#[cfg(test)]
pub(crate) mod memory;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::config::SanityConfig;
use crate::content::Post;

/// Query selecting one post by its slug
pub const POST_QUERY: &str = r#"*[_type == "post" && slug.current == $slug][0]"#;

/// Named query parameters, sent in insertion order
pub type QueryParams = IndexMap<String, Value>;

/// Errors raised while talking to the content store
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network or HTTP-level failure
    #[error("{0}")]
    Transport(String),

    /// The store rejected the query
    #[error("{description}")]
    Query { kind: String, description: String },

    /// Non-success status without a readable error body
    #[error("content store responded with status {0}")]
    Status(u16),

    /// The response body was not what the query API returns
    #[error("invalid response from content store: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// Store identity used to build asset URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIdentity {
    pub project_id: Option<String>,
    pub dataset: Option<String>,
}

impl ClientIdentity {
    /// Identity with empty values treated as unset
    pub fn new(project_id: &str, dataset: &str) -> Self {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        Self {
            project_id: non_empty(project_id),
            dataset: non_empty(dataset),
        }
    }
}

/// Something that can answer GROQ queries
pub trait ContentSource: Send + Sync {
    /// Run `query` with `params` and return the result, `None` when it is null
    fn fetch(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Option<Value>, ClientError>> + Send;

    /// Project and dataset this source reads from
    fn config(&self) -> ClientIdentity;

    /// Fetch the post whose `slug.current` equals `slug`
    fn fetch_post(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Post>, ClientError>> + Send {
        let mut params = QueryParams::new();
        params.insert("slug".to_string(), Value::String(slug.to_string()));

        async move {
            match self.fetch(POST_QUERY, &params).await? {
                Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
                None => Ok(None),
            }
        }
    }
}

impl<T: ContentSource> ContentSource for Arc<T> {
    fn fetch(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Option<Value>, ClientError>> + Send {
        (**self).fetch(query, params)
    }

    fn config(&self) -> ClientIdentity {
        (**self).config()
    }
}

/// Body returned by the query endpoint
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the Sanity query API
#[derive(Debug, Clone)]
pub struct ContentClient {
    http: reqwest::Client,
    config: SanityConfig,
}

impl ContentClient {
    /// Build a client for the given store
    pub fn new(config: SanityConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sanity-blog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    /// API host, honoring the override and the CDN switch
    pub fn api_host(&self) -> String {
        match &self.config.api_host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None if self.config.use_cdn => {
                format!("https://{}.apicdn.sanity.io", self.config.project_id)
            }
            None => format!("https://{}.api.sanity.io", self.config.project_id),
        }
    }

    /// Query endpoint for the configured dataset
    pub fn query_url(&self) -> String {
        format!(
            "{}/v{}/data/query/{}",
            self.api_host(),
            self.config.api_version.trim_start_matches('v'),
            self.config.dataset
        )
    }

    async fn run_query(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Option<Value>, ClientError> {
        let mut pairs = vec![("query".to_string(), query.to_string())];
        for (name, value) in params {
            pairs.push((format!("${}", name), serde_json::to_string(value)?));
        }

        let url = self.query_url();
        tracing::debug!("Querying {} with {:?}", url, params);

        let response = self.http.get(&url).query(&pairs).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let body: QueryResponse = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(ClientError::Status(status.as_u16())),
            Err(e) => return Err(e.into()),
        };

        if let Some(error) = body.error {
            return Err(query_error(error, body.message));
        }
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        Ok(body.result.filter(|value| !value.is_null()))
    }
}

impl ContentSource for ContentClient {
    fn fetch(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Option<Value>, ClientError>> + Send {
        self.run_query(query, params)
    }

    fn config(&self) -> ClientIdentity {
        ClientIdentity::new(&self.config.project_id, &self.config.dataset)
    }
}

/// Turn the `error` member of a response into a [`ClientError::Query`]
fn query_error(error: Value, message: Option<String>) -> ClientError {
    match error {
        Value::Object(map) => {
            let kind = map
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("error")
                .to_string();
            let description = map
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or(message)
                .unwrap_or_else(|| kind.clone());
            ClientError::Query { kind, description }
        }
        Value::String(kind) => ClientError::Query {
            description: message.unwrap_or_else(|| kind.clone()),
            kind,
        },
        other => ClientError::Query {
            kind: "error".to_string(),
            description: message.unwrap_or_else(|| other.to_string()),
        },
    }
}
