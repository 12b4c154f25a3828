//! Shared plumbing used across the warble crates: the message-based error
//! context mechanism and log-redaction helpers.

pub mod error;

pub use error::FromMessage;

/// Shorten a capability key (or any secret token) for logging.
///
/// Keeps the first eight characters so operators can correlate log lines with
/// issued keys without the full secret ever reaching the log stream.
#[must_use]
pub fn redact_key(key: &str) -> String {
    let mut chars = key.chars();
    let prefix: String = chars.by_ref().take(8).collect();
    if chars.next().is_none() {
        prefix
    } else {
        format!("{prefix}…")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::redact_key;

    #[test]
    fn redact_key_truncates_long_keys() {
        let key = "41872b21-08aa-4a0b-8623-dc1fac0e1fae";
        assert_eq!(redact_key(key), "41872b21…");
    }

    #[test]
    fn redact_key_keeps_short_values() {
        assert_eq!(redact_key("dev"), "dev");
        assert_eq!(redact_key(""), "");
    }
}
