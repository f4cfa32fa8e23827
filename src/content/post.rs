//! Post document model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A blog post as stored in the content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Document id
    #[serde(rename = "_id", default)]
    pub id: Option<String>,

    /// Document type, always `post` for documents returned by the post query
    #[serde(rename = "_type", default)]
    pub doc_type: Option<String>,

    /// Post title
    #[serde(default)]
    pub title: Option<String>,

    /// URL identifier
    #[serde(default)]
    pub slug: Option<Slug>,

    /// Publication timestamp, kept raw until display
    #[serde(default)]
    pub published_at: Option<String>,

    /// Opaque image asset reference
    #[serde(default)]
    pub image: Option<Value>,

    /// Portable-text body; anything but an array is ignored
    #[serde(default)]
    pub body: Option<Value>,
}

/// Slug field as stored by the content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slug {
    #[serde(default)]
    pub current: Option<String>,
}

impl Post {
    /// Create a post with just a title and slug
    pub fn new(title: &str, slug: &str) -> Self {
        Self {
            id: None,
            doc_type: Some("post".to_string()),
            title: Some(title.to_string()),
            slug: Some(Slug {
                current: Some(slug.to_string()),
            }),
            published_at: None,
            image: None,
            body: None,
        }
    }

    /// Title for display, empty when missing
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Current slug value, if any
    pub fn slug(&self) -> Option<&str> {
        self.slug.as_ref()?.current.as_deref()
    }

    /// Body blocks, only when the body is array-shaped
    pub fn body_blocks(&self) -> Option<&[Value]> {
        match &self.body {
            Some(Value::Array(blocks)) => Some(blocks),
            _ => None,
        }
    }
}
