//! Error-context plumbing shared by the warble crates.
//!
//! Each crate keeps its own `thiserror` enum; what they share is the ability
//! to bolt a human-readable context prefix onto any fallible step. A crate's
//! error module implements [`FromMessage`] for its error type and then invokes
//! [`impl_context!`] to grow crate-local `.context()` / `.with_context()`
//! extension methods on `Result` and `Option`.

/// Error types that can be built from a plain message string.
///
/// The generated context methods render the underlying failure with `Display`
/// and fold it into the message, so the source error's text survives even
/// though the typed source does not.
pub trait FromMessage: Sized {
    fn from_message(message: String) -> Self;
}

/// Generate a crate-local `Context` extension trait for the given error type.
///
/// Expects the invoking module to define a `FromMessage` error type and
/// `type Result<T> = std::result::Result<T, TheError>`.
///
/// ```ignore
/// // in crates/foo/src/error.rs
/// warble_common::impl_context!(FooError);
/// ```
#[macro_export]
macro_rules! impl_context {
    ($err:ty) => {
        pub trait Context<T> {
            /// Wrap the failure with a fixed context message.
            fn context(self, context: impl Into<String>) -> Result<T>;
            /// Wrap the failure with a lazily-built context message.
            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C;
        }

        impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                self.with_context(|| context.into())
            }

            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.map_err(|source| {
                    <$err as $crate::FromMessage>::from_message(format!(
                        "{}: {source}",
                        f().into()
                    ))
                })
            }
        }

        impl<T> Context<T> for Option<T> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                self.with_context(|| context.into())
            }

            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.ok_or_else(|| <$err as $crate::FromMessage>::from_message(f().into()))
            }
        }
    };
}
