//! sanity-blog: a single-page blog front-end backed by Sanity
//!
//! Reads a post's slug from the request path, fetches the matching document
//! from a Sanity dataset and renders its title, image, publish date and
//! Portable Text body as HTML.

pub mod client;
pub mod config;
pub mod content;
pub mod helpers;
pub mod image;
pub mod page;
pub mod server;
pub mod templates;

use anyhow::Result;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use client::{ContentClient, ContentSource, QueryParams, POST_QUERY};

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Content store client shared by every page visit
    pub client: Arc<ContentClient>,
}

impl Blog {
    /// Create a blog from a configuration
    pub fn new(config: config::SiteConfig) -> Result<Self> {
        config.validate()?;
        let client = Arc::new(ContentClient::new(config.sanity.clone())?);
        Ok(Self { config, client })
    }

    /// Load `_config.yml` from `path` (defaults when it does not exist)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(config::SiteConfig::load_or_default(path)?)
    }

    /// Render the page for `path` once, as the server would
    pub async fn render(&self, path: &str) -> Result<String> {
        render_page(self.client.clone(), &self.config, path).await
    }

    /// Raw document for `slug`, if any
    pub async fn query(&self, slug: &str) -> Result<Option<Value>> {
        let mut params = QueryParams::new();
        params.insert("slug".to_string(), Value::String(slug.to_string()));
        Ok(self.client.fetch(POST_QUERY, &params).await?)
    }

    /// Serve the post page over HTTP
    pub async fn serve(&self, ip: &str, port: u16) -> Result<()> {
        server::start(self.client.clone(), self.config.clone(), ip, port).await
    }
}

/// Visit `path` with a fresh page backed by `client` and render the result
pub async fn render_page<C: ContentSource>(
    client: C,
    config: &config::SiteConfig,
    path: &str,
) -> Result<String> {
    let renderer = templates::PageRenderer::new(config.clone())?;
    let images = image::ImageUrlBuilder::new(client.config());

    let mut page = page::PostPage::new(client);
    let status = page.visit(path).await;
    renderer.render(status, &images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::MemorySource;
    use serde_json::json;

    #[tokio::test]
    async fn test_render_without_slug_shows_loading() {
        let source = Arc::new(MemorySource::new());
        let html = render_page(source.clone(), &config::SiteConfig::default(), "/")
            .await
            .unwrap();

        assert!(html.contains("<div>Loading...</div>"));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_render_loaded_post() {
        let source = Arc::new(MemorySource::new().with_post(
            "hello-world",
            json!({
                "_id": "p1",
                "_type": "post",
                "title": "Hello World",
                "slug": { "current": "hello-world" },
                "publishedAt": "2024-01-15T00:00:00Z"
            }),
        ));
        let html = render_page(source.clone(), &config::SiteConfig::default(), "/hello-world")
            .await
            .unwrap();

        assert!(html.contains("Hello World"));
        assert!(html.contains("1/15/2024"));
        assert_eq!(source.calls(), vec!["hello-world"]);
    }

    #[tokio::test]
    async fn test_blog_render_without_slug_skips_the_store() {
        // An unreachable host would surface as an error view if a fetch happened
        let mut config = config::SiteConfig::default();
        config.sanity.api_host = Some("http://127.0.0.1:9".to_string());
        let blog = Blog::new(config).unwrap();

        let html = blog.render("/").await.unwrap();
        assert!(html.contains("<div>Loading...</div>"));
    }
}
