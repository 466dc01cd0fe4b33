//! Error types for bouncer-sync data handling.

use thiserror::Error;

/// Errors decoding a tunnelled login password.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// No `/` between the user and network parts.
    #[error("malformed relay credentials: missing '/' separator")]
    MissingNetworkSeparator,

    /// No `:` between the network and secret parts.
    #[error("malformed relay credentials: missing ':' separator")]
    MissingSecretSeparator,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CredentialError::MissingSecretSeparator;
        assert_eq!(
            err.to_string(),
            "malformed relay credentials: missing ':' separator"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CredentialError>();
    }
}
