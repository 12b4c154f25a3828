use {thiserror::Error, warble_common::FromMessage};

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    #[error("selector {selector:?} not found after {waited_ms}ms")]
    SelectorNotFound { selector: String, waited_ms: u64 },

    #[error("input {selector:?} did not reach {expected} typed characters")]
    TypeLagged { selector: String, expected: usize },

    #[error("javascript evaluation failed: {0}")]
    JsEvalFailed(String),

    #[error("cdp command failed: {0}")]
    Cdp(String),

    #[error("session limit reached ({0} live sessions)")]
    SessionLimit(usize),

    #[error("{message}")]
    Message { message: String },
}

impl BrowserError {
    /// Stable name carried in wrapped-error payloads, corresponding to the
    /// `name` field of the errors the HTTP surface has always reported.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LaunchFailed(_) => "LaunchFailed",
            Self::NavigationFailed(_) => "NavigationFailed",
            Self::SelectorNotFound { .. } => "SelectorNotFound",
            Self::TypeLagged { .. } => "TypeLagged",
            Self::JsEvalFailed(_) => "JsEvalFailed",
            Self::Cdp(_) => "Cdp",
            Self::SessionLimit(_) => "SessionLimit",
            Self::Message { .. } => "Error",
        }
    }
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Cdp(e.to_string())
    }
}

impl FromMessage for BrowserError {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, BrowserError>;

warble_common::impl_context!(BrowserError);
