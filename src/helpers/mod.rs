//! Helper functions shared by the renderers
//!
//! Date display and HTML escaping used by the portable-text renderer and
//! the page views.

mod date;
mod html;

pub use date::*;
pub use html::*;
