//! Content module - post documents and rich-text rendering

mod portable_text;
mod post;

pub use portable_text::PortableTextRenderer;
pub use post::{Post, Slug};
