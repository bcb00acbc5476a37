//! Progress reporting for translate-and-run requests

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use nlq_application::TranslateProgressNotifier;
use nlq_domain::SafeQuery;
use std::sync::Mutex;
use std::time::Duration;

/// Spinner shown on stderr while a request is in flight
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn set_message(&self, message: String) {
        if let Ok(guard) = self.spinner.lock()
            && let Some(pb) = guard.as_ref()
        {
            pb.set_message(message);
        }
    }

    fn finish(&self) {
        if let Ok(mut guard) = self.spinner.lock()
            && let Some(pb) = guard.take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslateProgressNotifier for ProgressReporter {
    fn on_completion_start(&self, client: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix("Translating");
        pb.set_message(format!("asking {}...", client));
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut guard) = self.spinner.lock()
            && let Some(previous) = guard.replace(pb)
        {
            previous.finish_and_clear();
        }
    }

    fn on_completion_end(&self, _bytes: usize) {
        self.set_message("checking the query...".to_string());
    }

    fn on_query_ready(&self, query: &SafeQuery) {
        self.set_message(format!(
            "running {} on {}...",
            query.shape().kind(),
            query.collection()
        ));
    }

    fn on_results(&self, _count: usize) {
        self.finish();
    }

    fn on_failed(&self) {
        self.finish();
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl TranslateProgressNotifier for SimpleProgress {
    fn on_completion_start(&self, client: &str) {
        eprintln!("{} Asking {}", "->".cyan(), client.bold());
    }

    fn on_query_ready(&self, query: &SafeQuery) {
        eprintln!(
            "{} Running {} on {}",
            "->".cyan(),
            query.shape().kind(),
            query.collection().bold()
        );
    }

    fn on_results(&self, count: usize) {
        eprintln!("  {} {} documents", "v".green(), count);
    }

    fn on_failed(&self) {
        eprintln!("  {} failed", "x".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_lifecycle() {
        let reporter = ProgressReporter::new();
        reporter.on_completion_start("openai");
        assert!(reporter.spinner.lock().unwrap().is_some());
        reporter.on_completion_end(42);
        reporter.on_results(3);
        assert!(reporter.spinner.lock().unwrap().is_none());
    }

    #[test]
    fn test_failure_clears_spinner() {
        let reporter = ProgressReporter::new();
        reporter.on_completion_start("anthropic");
        reporter.on_failed();
        assert!(reporter.spinner.lock().unwrap().is_none());
        // no spinner: must not panic
        reporter.on_failed();
    }
}
