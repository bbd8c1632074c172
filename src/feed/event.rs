//! Raw change feed event types

use bytes::Bytes;
use serde::Serialize;

/// Origin kind of a change event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// A document was inserted
    Insert,
    /// A document was partially updated
    Update,
    /// A document was replaced wholesale
    Replace,
    /// A document was deleted
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Replace => "replace",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Opaque checkpoint identifying the point just after an event
///
/// Supplied by the store, handed back verbatim when resuming. The relay
/// never inspects the contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeToken {
    bytes: Bytes,
}

impl ResumeToken {
    /// Wrap a store-supplied token
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Borrow the raw token bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A single raw event yielded by the feed
#[derive(Debug, Clone)]
pub struct RawChangeEvent {
    /// Operation type reported by the store
    pub operation: Operation,

    /// Originating collection name, exactly as the store reports it
    pub collection: String,

    /// Position just after this event
    pub resume_token: ResumeToken,
}

impl RawChangeEvent {
    /// Create a new raw event
    pub fn new(
        operation: Operation,
        collection: impl Into<String>,
        resume_token: ResumeToken,
    ) -> Self {
        Self {
            operation,
            collection: collection.into(),
            resume_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Insert.to_string(), "insert");
        assert_eq!(Operation::Delete.to_string(), "delete");
    }

    #[test]
    fn test_operation_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Operation::Replace).unwrap(),
            r#""replace""#
        );
    }

    #[test]
    fn test_resume_token_opaque_roundtrip() {
        let token = ResumeToken::new(Bytes::from_static(b"pos-42"));
        assert_eq!(token.as_bytes(), b"pos-42");
        assert_eq!(token, token.clone());
    }
}
