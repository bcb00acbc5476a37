//! Application-level configuration.
//!
//! - [`TranslateParams`] - completion timeout and diagnostic limits

pub mod translate_params;

pub use translate_params::TranslateParams;
