//! Wire frames for `text/event-stream` responses
//!
//! A frame is encoded once into `Bytes` and then cloned per connection, so
//! fan-out only bumps a reference count (the same zero-copy scheme the
//! broadcast path uses for every payload).

use bytes::Bytes;

/// A single encoded server-sent-events frame
///
/// Cheap to clone due to `Bytes` reference counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    bytes: Bytes,
}

impl SseFrame {
    /// Create a named event frame with a data payload
    pub fn event(name: &str, data: &str) -> Self {
        Self {
            bytes: Bytes::from(format!("event: {}\ndata: {}\n\n", name, data)),
        }
    }

    /// Create a comment frame
    ///
    /// Comment frames are ignored by clients; intermediaries see traffic and
    /// keep the connection open.
    pub fn comment(text: &str) -> Self {
        Self {
            bytes: Bytes::from(format!(": {}\n\n", text)),
        }
    }

    /// The standard keep-alive frame
    pub fn heartbeat() -> Self {
        Self {
            bytes: Bytes::from_static(b": heartbeat\n\n"),
        }
    }

    /// Consume the frame, returning the encoded bytes
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Borrow the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_frame_encoding() {
        let frame = SseFrame::event("connected", r#"{"clientId":1}"#);
        assert_eq!(
            frame.as_bytes(),
            b"event: connected\ndata: {\"clientId\":1}\n\n"
        );
    }

    #[test]
    fn test_comment_frame_encoding() {
        let frame = SseFrame::comment("ping");
        assert_eq!(frame.as_bytes(), b": ping\n\n");
    }

    #[test]
    fn test_heartbeat_frame() {
        assert_eq!(SseFrame::heartbeat().as_bytes(), b": heartbeat\n\n");
    }

    #[test]
    fn test_clone_shares_payload() {
        let frame = SseFrame::event("change", "{}");
        let a = frame.clone().into_bytes();
        let b = frame.into_bytes();
        assert_eq!(a, b);
    }
}
