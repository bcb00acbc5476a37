//! Prompt domain
//!
//! Builds the system prompt that grounds the model in the catalog and pins
//! its output to the two accepted query shapes.

mod template;

pub use template::PromptTemplate;
