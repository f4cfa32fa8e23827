//! Post page controller
//!
//! One `PostPage` lives for one mounted page. It turns a path into a slug,
//! issues at most one fetch per distinct slug and tracks the outcome as a
//! [`FetchStatus`]. Every fetch carries a generation number; a result for
//! anything but the latest generation is dropped, so a slow response for an
//! old slug can never overwrite the page for a newer one.

use crate::client::{ClientError, ContentSource};
use crate::content::Post;
use percent_encoding::percent_decode_str;

/// Where the page is in its fetch cycle
#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus {
    Loading,
    Error(String),
    NotFound,
    Loaded(Post),
}

impl FetchStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchStatus::Loading)
    }

    pub fn post(&self) -> Option<&Post> {
        match self {
            FetchStatus::Loaded(post) => Some(post),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// A fetch the page has asked for and is waiting on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    slug: String,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

/// Last path segment, percent-decoded, or `None` when it is empty
///
/// # Examples
/// ```ignore
/// slug_from_path("/hello-world") // -> Some("hello-world")
/// slug_from_path("/caf%C3%A9") // -> Some("café")
/// slug_from_path("/hello-world/") // -> None
/// ```
pub fn slug_from_path(path: &str) -> Option<String> {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let last = path.rsplit('/').next().unwrap_or("");
    if last.is_empty() {
        return None;
    }
    // Segments that do not decode to UTF-8 are used as they arrived
    let slug = match percent_decode_str(last).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => last.to_string(),
    };
    Some(slug)
}

/// Controller for a single post page
pub struct PostPage<C> {
    client: C,
    slug: Option<String>,
    generation: u64,
    status: FetchStatus,
}

impl<C: ContentSource> PostPage<C> {
    /// New page in the `Loading` state
    pub fn new(client: C) -> Self {
        Self {
            client,
            slug: None,
            generation: 0,
            status: FetchStatus::Loading,
        }
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    /// Point the page at `path`.
    ///
    /// Returns a ticket when the slug changed to a new non-empty value; the
    /// page is then back in `Loading` until that ticket is resolved. A path
    /// without a slug issues nothing and leaves the status as it is, but any
    /// fetch still in flight becomes stale.
    pub fn navigate(&mut self, path: &str) -> Option<FetchTicket> {
        let slug = slug_from_path(path);
        if slug == self.slug {
            return None;
        }

        self.generation += 1;
        self.slug = slug.clone();

        let slug = slug?;
        self.status = FetchStatus::Loading;
        tracing::debug!("Fetching post {:?} (generation {})", slug, self.generation);
        Some(FetchTicket {
            generation: self.generation,
            slug,
        })
    }

    /// Apply the outcome of a fetch. Returns `false` when the ticket is stale
    /// and the outcome was dropped.
    pub fn resolve(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<Option<Post>, ClientError>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Dropping stale result for {:?} (generation {}, current {})",
                ticket.slug,
                ticket.generation,
                self.generation
            );
            return false;
        }

        self.status = match outcome {
            Ok(Some(post)) => FetchStatus::Loaded(post),
            Ok(None) => {
                tracing::info!("No post matches slug {:?}", ticket.slug);
                FetchStatus::NotFound
            }
            Err(e) => {
                tracing::warn!("Failed to load post {:?}: {}", ticket.slug, e);
                FetchStatus::Error(e.to_string())
            }
        };
        true
    }

    /// Run the fetch for `ticket` against the client and apply it
    pub async fn load(&mut self, ticket: FetchTicket) -> bool {
        let outcome = self.client.fetch_post(&ticket.slug).await;
        self.resolve(&ticket, outcome)
    }

    /// Navigate to `path` and, if that needs a fetch, wait for it
    pub async fn visit(&mut self, path: &str) -> &FetchStatus {
        if let Some(ticket) = self.navigate(path) {
            self.load(ticket).await;
        }
        &self.status
    }
}
