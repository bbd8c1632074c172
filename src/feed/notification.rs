//! Outward-facing change notifications
//!
//! A notification is derived once per raw feed event, broadcast to every
//! connected client, and then discarded. Classification is purely by origin
//! collection; the relay never looks at document contents.

use serde::Serialize;

use crate::sse::SseFrame;

use super::event::{Operation, RawChangeEvent};

/// A classified change, ready to serialize
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeNotification {
    /// Operation type
    #[serde(rename = "operationType")]
    pub operation: Operation,

    /// Collection name, lower-case with the configured prefix stripped
    pub collection: String,

    /// Collection name, lower-case with the prefix intact
    #[serde(rename = "fullCollection")]
    pub full_collection: String,
}

impl ChangeNotification {
    /// Classify a raw feed event
    ///
    /// The collection name is lower-cased; `prefix` (already lower-case, see
    /// [`RelayConfig::collection_prefix`](crate::RelayConfig)) is stripped
    /// from the short name when present.
    pub fn classify(event: &RawChangeEvent, prefix: &str) -> Self {
        let full_collection = event.collection.to_ascii_lowercase();
        let collection = full_collection
            .strip_prefix(prefix)
            .unwrap_or(&full_collection)
            .to_string();

        Self {
            operation: event.operation,
            collection,
            full_collection,
        }
    }

    /// Serialize to the JSON body broadcast to clients
    pub fn to_json(&self) -> String {
        // Plain struct of strings; serialization cannot fail.
        serde_json::to_string(self).expect("notification serializes")
    }

    /// Encode as an `event: change` frame
    pub fn to_frame(&self) -> SseFrame {
        SseFrame::event("change", &self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::event::ResumeToken;

    fn raw(operation: Operation, collection: &str) -> RawChangeEvent {
        RawChangeEvent::new(operation, collection, ResumeToken::new(&b"t"[..]))
    }

    #[test]
    fn test_classify_strips_prefix_and_lowercases() {
        let n = ChangeNotification::classify(&raw(Operation::Insert, "Acme_Orders"), "acme_");

        assert_eq!(n.collection, "orders");
        assert_eq!(n.full_collection, "acme_orders");
        assert_eq!(n.operation, Operation::Insert);
    }

    #[test]
    fn test_classify_without_matching_prefix() {
        let n = ChangeNotification::classify(&raw(Operation::Update, "users"), "acme_");

        assert_eq!(n.collection, "users");
        assert_eq!(n.full_collection, "users");
    }

    #[test]
    fn test_classify_empty_prefix() {
        let n = ChangeNotification::classify(&raw(Operation::Delete, "Orders"), "");

        assert_eq!(n.collection, "orders");
        assert_eq!(n.full_collection, "orders");
    }

    #[test]
    fn test_json_shape() {
        let n = ChangeNotification::classify(&raw(Operation::Insert, "acme_orders"), "acme_");

        assert_eq!(
            n.to_json(),
            r#"{"operationType":"insert","collection":"orders","fullCollection":"acme_orders"}"#
        );
    }

    #[test]
    fn test_change_frame_encoding() {
        let n = ChangeNotification::classify(&raw(Operation::Delete, "acme_runs"), "acme_");
        let frame = n.to_frame();

        let text = std::str::from_utf8(frame.as_bytes()).unwrap();
        assert!(text.starts_with("event: change\ndata: "));
        assert!(text.ends_with("\n\n"));
        assert!(text.contains(r#""operationType":"delete""#));
    }
}
