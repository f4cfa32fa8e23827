//! HTTP server for the post page
//!
//! A single dynamic route, `/:slug`. Each request is one page visit with its
//! own controller, so nothing is shared between requests except the client.

use anyhow::Result;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::client::ContentSource;
use crate::config::SiteConfig;
use crate::image::ImageUrlBuilder;
use crate::page::{FetchStatus, PostPage};
use crate::templates::PageRenderer;

/// Server state
struct ServerState<C> {
    client: Arc<C>,
    renderer: PageRenderer,
    images: ImageUrlBuilder,
}

/// Build the router around an injected content source
pub fn router<C: ContentSource + 'static>(client: Arc<C>, config: SiteConfig) -> Result<Router> {
    let images = ImageUrlBuilder::new(client.config());
    let state = Arc::new(ServerState {
        client,
        renderer: PageRenderer::new(config)?,
        images,
    });

    Ok(Router::new()
        .route("/:slug", get(post_handler::<C>))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the server
pub async fn start<C: ContentSource + 'static>(
    client: Arc<C>,
    config: SiteConfig,
    ip: &str,
    port: u16,
) -> Result<()> {
    let app = router(client, config)?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Response code for a settled page
fn status_code(status: &FetchStatus) -> StatusCode {
    match status {
        FetchStatus::Loaded(_) | FetchStatus::Loading => StatusCode::OK,
        FetchStatus::NotFound => StatusCode::NOT_FOUND,
        FetchStatus::Error(_) => StatusCode::BAD_GATEWAY,
    }
}

/// One page visit for the requested slug
async fn post_handler<C: ContentSource + 'static>(
    State(state): State<Arc<ServerState<C>>>,
    uri: Uri,
) -> Response {
    let mut page = PostPage::new(state.client.clone());
    let status = page.visit(uri.path()).await;

    match state.renderer.render(status, &state.images) {
        Ok(html) => (status_code(status), Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render {}: {:#}", uri.path(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

async fn fallback_handler(uri: Uri) -> Response {
    tracing::debug!("No route for {}", uri.path());
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
