//! Page views using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping is off; every value
//! is escaped here before it reaches a template, and only the rendered
//! Portable Text body is inserted as-is.

use anyhow::Result;
use chrono_tz::Tz;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{PortableTextRenderer, Post};
use crate::helpers::{display_date, html_escape};
use crate::image::ImageUrlBuilder;
use crate::page::FetchStatus;

/// Text shown while the fetch is outstanding
pub const LOADING_TEXT: &str = "Loading...";

/// Text shown when no post matches the slug
pub const NOT_FOUND_TEXT: &str = "Post not found";

/// Renders a [`FetchStatus`] into a full HTML page
pub struct PageRenderer {
    tera: Tera,
    portable_text: PortableTextRenderer,
    config: SiteConfig,
    tz: Tz,
}

impl PageRenderer {
    /// Create a new renderer with the page templates loaded
    pub fn new(config: SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("page/layout.html")),
            ("message.html", include_str!("page/message.html")),
            ("post.html", include_str!("page/post.html")),
        ])?;

        let tz = config.tz()?;
        Ok(Self {
            tera,
            portable_text: PortableTextRenderer::new(),
            config,
            tz,
        })
    }

    /// Render the page for `status`; `images` resolves the post image
    pub fn render(&self, status: &FetchStatus, images: &ImageUrlBuilder) -> Result<String> {
        let mut context = Context::new();
        context.insert("back_href", "/");

        let template = match status {
            FetchStatus::Loading => {
                context.insert("page_title", &html_escape(&self.config.title));
                context.insert("message", LOADING_TEXT);
                "message.html"
            }
            FetchStatus::Error(message) => {
                context.insert("page_title", &html_escape(&self.config.title));
                context.insert(
                    "message",
                    &format!("Error loading post: {}", html_escape(message)),
                );
                "message.html"
            }
            FetchStatus::NotFound => {
                context.insert("page_title", &html_escape(&self.config.title));
                context.insert("message", NOT_FOUND_TEXT);
                "message.html"
            }
            FetchStatus::Loaded(post) => {
                let view = self.post_view(post, images);
                let page_title = if view.title.is_empty() {
                    html_escape(&self.config.title)
                } else {
                    view.title.clone()
                };
                context.insert("page_title", &page_title);
                context.insert("post", &view);
                "post.html"
            }
        };

        Ok(self.tera.render(template, &context)?)
    }

    /// Escaped, display-ready fields of a loaded post
    pub fn post_view(&self, post: &Post, images: &ImageUrlBuilder) -> PostView {
        let (width, height) = (self.config.image.width, self.config.image.height);

        let image = post
            .image
            .as_ref()
            .and_then(|source| images.image(source))
            .and_then(|image| match image.width(width).height(height).url() {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Skipping post image: {}", e);
                    None
                }
            })
            .map(|src| ImageView {
                src: html_escape(&src),
                width,
                height,
            });

        let body = post
            .body_blocks()
            .map(|blocks| self.portable_text.render(blocks));
        if body.is_none() && post.body.is_some() {
            tracing::debug!("Post body is not a block array, leaving it out");
        }

        PostView {
            title: html_escape(post.title()),
            image,
            published: html_escape(&display_date(
                post.published_at.as_deref(),
                &self.tz,
                &self.config.date_format,
            )),
            body,
        }
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub image: Option<ImageView>,
    pub published: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub src: String,
    pub width: u32,
    pub height: u32,
}
