//! Secret wrapper for API keys and tokens

use std::fmt;
use zeroize::Zeroize;

/// Sensitive value (bearer token, consumer secret, refresh token, ...).
///
/// Redacted in Debug/Display so it can sit inside config structs that get
/// logged, and zeroized when dropped.
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Borrow the wrapped string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_owned())
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_redacted_in_debug_and_display() {
        let secret = Secret::from("AAAAAAAAAAAAAAAAAAAAAbearer");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(secret.to_string(), "[REDACTED]");
    }

    #[test]
    fn redaction_holds_inside_derived_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Creds {
            consumer_key: String,
            consumer_secret: Secret<String>,
        }

        let creds = Creds {
            consumer_key: "ck".into(),
            consumer_secret: Secret::from("cs-very-secret"),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("ck"));
        assert!(!debug.contains("cs-very-secret"), "got: {debug}");
    }

    #[test]
    fn expose_and_as_str_return_the_value() {
        let secret = Secret::new(String::from("rt_abc"));
        assert_eq!(secret.expose(), "rt_abc");
        assert_eq!(secret.as_str(), "rt_abc");
        assert_eq!(secret.clone().as_str(), "rt_abc");
    }
}
