//! HTML rendering for the record pages.

mod engine;

pub use engine::{render_template, TemplateError};
