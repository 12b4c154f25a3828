//! Action outcomes as they cross from browser land to the HTTP layer.
//!
//! Every session operation funnels into an [`Outcome`]: either a JSON payload
//! for the success envelope or a named failure for the error envelope. Browser
//! failures are expected in normal operation (a selector that never shows up
//! usually means the page disagrees with what the caller asked for), so they
//! travel as data rather than as `Err`.

use {serde::Serialize, serde_json::Value};

use crate::error::BrowserError;

/// A named action failure, serialized into the error envelope.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActionFailure {
    pub name: String,
    pub message: String,
}

/// Result of a single session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Value),
    Failure(ActionFailure),
}

impl Outcome {
    pub fn success(payload: Value) -> Self {
        Self::Success(payload)
    }

    pub fn failure(err: &BrowserError) -> Self {
        Self::Failure(ActionFailure {
            name: err.name().to_owned(),
            message: err.to_string(),
        })
    }

    pub fn from_result(result: crate::error::Result<Value>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(err) => Self::failure(&err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn failure_carries_the_error_name() {
        let err = BrowserError::SelectorNotFound {
            selector: ".js-follow-btn".into(),
            waited_ms: 30_000,
        };
        let Outcome::Failure(failure) = Outcome::failure(&err) else {
            panic!("expected a failure");
        };
        assert_eq!(failure.name, "SelectorNotFound");
        assert!(failure.message.contains(".js-follow-btn"));
    }

    #[test]
    fn from_result_maps_both_arms() {
        assert!(Outcome::from_result(Ok(json!({"ok": true}))).is_success());
        let err = Err(BrowserError::NavigationFailed("timeout".into()));
        assert!(!Outcome::from_result(err).is_success());
    }
}
