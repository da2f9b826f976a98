//! Utility macros shared by the scanner and view modules.

/// A macro for early returns with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
/// The error expression is only evaluated when the predicate fails, so it is fine to
/// call an error factory inside it.
///
/// # Example
///
/// ```ignore
/// ensure!(last == b'"', invalid_err());
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
