//! Vitalis core: pick a random Wikipedia "vital" article per topical
//! category and render it as plain text or as a paginated PDF with a
//! clickable table of contents.
//!
//! The pipeline: [`pick_random_article`] scrapes a category's vital-article
//! listing once per process and returns a random article URL;
//! [`fetch_article`] turns that URL into a structured [`Article`] (title,
//! ordered body blocks, cleaned references); [`render_text`] and
//! [`render_pdf`] serialize the model into downloadable bytes.

pub mod article;
pub mod category;
pub mod error;
pub mod fetch;
pub mod filename;
pub mod formatters;

pub use article::{Article, Block, HeadingLevel, clean_reference_text, fetch_article, parse_article};
pub use category::{ARTICLE_PATH_PREFIX, Category, WIKI_ORIGIN, pick_random_article, scrape_article_links};
pub use error::{Result, VitalisError};
pub use fetch::{FetchConfig, fetch_url};
pub use filename::{safe_filename, safe_filename_truncated};
pub use formatters::{render_pdf, render_text, slugify};
