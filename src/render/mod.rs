//! Document rendering - templates for generated customer documents

pub mod template;

pub use template::{DocumentRenderer, RenderError};
