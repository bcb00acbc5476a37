//! Shared utilities for use cases.

use crate::use_cases::translate_and_run::TranslateError;
use tokio_util::sync::CancellationToken;

/// Check if cancellation has been requested.
///
/// Returns `Err(TranslateError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), TranslateError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(TranslateError::Cancelled);
    }
    Ok(())
}
