//! Logging infrastructure - structured translation logging.
//!
//! Provides [`JsonlTranslationLogger`], a JSONL file writer that implements
//! the [`TranslationLogger`](nlq_application::TranslationLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlTranslationLogger;
