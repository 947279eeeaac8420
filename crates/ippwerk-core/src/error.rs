// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ippwerk.

use thiserror::Error;

/// Top-level error type for all ippwerk operations.
#[derive(Debug, Error)]
pub enum IppwerkError {
    // -- Wire codec errors --
    #[error("malformed IPP message: {0}")]
    MalformedMessage(String),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("short write: sink accepted {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    // -- Transport errors --
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("HTTP framing error: {0}")]
    Http(String),

    /// The print file could not be read while it was being sent.  Retrying
    /// the printer does not help.
    #[error("cannot read print file: {0}")]
    Document(String),

    // -- Protocol outcome errors --
    #[error("printer returned {name} (0x{code:04x}){}", status_suffix(.message))]
    Status {
        code: u16,
        name: &'static str,
        message: Option<String>,
    },

    #[error("submission cancelled")]
    Cancelled,

    #[error("printer unavailable, requeue on next class member: {0}")]
    Requeue(String),

    // -- Configuration --
    #[error("invalid device URI: {0}")]
    InvalidUri(String),

    #[error("configuration error: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IppwerkError {
    /// Whether this error came from the connection rather than the printer.
    ///
    /// Malformed replies count as transport failures: the bytes on the wire
    /// are what went wrong, not the request.  Local file errors do not.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Http(_) | Self::MalformedMessage(_)
        )
    }
}

fn status_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, IppwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_includes_message_when_present() {
        let err = IppwerkError::Status {
            code: 0x040a,
            name: "client-error-document-format-not-supported",
            message: Some("no PDF here".into()),
        };
        let text = err.to_string();
        assert!(text.contains("0x040a"));
        assert!(text.ends_with(": no PDF here"));
    }

    #[test]
    fn status_error_without_message() {
        let err = IppwerkError::Status {
            code: 0x0500,
            name: "server-error-internal-error",
            message: None,
        };
        assert_eq!(
            err.to_string(),
            "printer returned server-error-internal-error (0x0500)"
        );
    }

    #[test]
    fn transport_classification() {
        assert!(IppwerkError::Transport("refused".into()).is_transport());
        assert!(IppwerkError::MalformedMessage("eof".into()).is_transport());
        assert!(!IppwerkError::Cancelled.is_transport());
        assert!(!IppwerkError::Document("bad sector".into()).is_transport());
        let disk = std::io::Error::other("disk full");
        assert!(!IppwerkError::Io(disk).is_transport());
        assert!(
            !IppwerkError::TypeMismatch {
                expected: "integer",
                found: "string"
            }
            .is_transport()
        );
    }
}
