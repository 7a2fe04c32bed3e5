//! Output renderers for parsed articles.
//!
//! Both renderers are pure functions over an [`Article`](crate::Article):
//! [`render_text`] produces a flat plain-text serialization, and
//! [`render_pdf`] composes a paginated PDF with a clickable table of
//! contents.

pub mod pdf;
pub mod text;

pub use pdf::{render_pdf, slugify};
pub use text::render_text;
