//! Request ledger: keyed storage for captured request records

use reqmap_common::{
    is_websocket_url, CapturedBody, RequestBody, RequestCompleted, RequestRecord, RequestStarted,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::warn;

/// Fallback initiator when the event carried none
const UNKNOWN_INITIATOR: &str = "N/A";

/// In-memory store of captured requests, keyed by request id.
///
/// Both lifecycle handlers are simple keyed upserts; identifiers are
/// independent keys, so no cross-record coordination is needed even when
/// events for different requests interleave.
pub struct RecordStore {
    records: RwLock<HashMap<String, RequestRecord>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Apply a "request started" event. Creates the record if absent
    /// (static fields are first-write-wins), then applies the body
    /// extraction policy.
    pub async fn apply_started(&self, event: RequestStarted) {
        let mut records = self.records.write().await;

        let record = records
            .entry(event.request_id.clone())
            .or_insert_with(|| RequestRecord {
                id: event.request_id.clone(),
                url: event.url.clone(),
                method: event.method.clone(),
                initiator: event
                    .initiator
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_INITIATOR.to_string()),
                time_stamp: event.time_stamp,
                status_code: None,
                body: None,
                is_web_socket: is_websocket_url(&event.url),
            });

        if let Some(captured) = event.request_body {
            if let Some(body) = extract_body(&event.request_id, captured) {
                record.body = Some(body);
            }
        }
    }

    /// Apply a "request completed" event. Sets the status code on the
    /// existing record, or synthesizes one with no body when the start
    /// event was missed.
    pub async fn apply_completed(&self, event: RequestCompleted) {
        let mut records = self.records.write().await;

        match records.get_mut(&event.request_id) {
            Some(record) => {
                record.status_code = Some(event.status_code);
            }
            None => {
                records.insert(
                    event.request_id.clone(),
                    RequestRecord {
                        id: event.request_id.clone(),
                        url: event.url.clone(),
                        method: event.method.clone(),
                        initiator: event
                            .initiator
                            .clone()
                            .unwrap_or_else(|| UNKNOWN_INITIATOR.to_string()),
                        time_stamp: event.time_stamp,
                        status_code: Some(event.status_code),
                        body: None,
                        is_web_socket: is_websocket_url(&event.url),
                    },
                );
            }
        }
    }

    /// Snapshot of all current records. Order is not guaranteed.
    pub async fn snapshot(&self) -> Vec<RequestRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Get a specific record by id
    pub async fn get(&self, id: &str) -> Option<RequestRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Drop all records. Called when a new capture session starts.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Body extraction policy: prefer structured form data; otherwise try a
/// UTF-8 decode of the first raw chunk. Multi-chunk bodies are not
/// reassembled. Decode failure is non-fatal.
fn extract_body(request_id: &str, captured: CapturedBody) -> Option<RequestBody> {
    if let Some(form) = captured.form_data {
        return Some(RequestBody::Form(form));
    }

    let first_chunk = captured.raw.into_iter().next()?;
    match String::from_utf8(first_chunk) {
        Ok(text) => Some(RequestBody::Text(text)),
        Err(err) => {
            warn!(request_id, "Failed to decode request body: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn started(id: &str, url: &str, method: &str) -> RequestStarted {
        RequestStarted {
            request_id: id.to_string(),
            tab_id: 5,
            url: url.to_string(),
            method: method.to_string(),
            initiator: Some("https://example.com".to_string()),
            time_stamp: Utc::now(),
            request_body: None,
        }
    }

    fn completed(id: &str, url: &str, status: u16) -> RequestCompleted {
        RequestCompleted {
            request_id: id.to_string(),
            tab_id: 5,
            url: url.to_string(),
            method: "GET".to_string(),
            initiator: None,
            time_stamp: Utc::now(),
            status_code: status,
        }
    }

    #[tokio::test]
    async fn test_start_then_complete_merges() {
        let store = RecordStore::new();
        store
            .apply_started(started("1", "http://a.com/x", "GET"))
            .await;
        store.apply_completed(completed("1", "http://a.com/x", 200)).await;

        let record = store.get("1").await.unwrap();
        assert_eq!(record.url, "http://a.com/x");
        assert_eq!(record.method, "GET");
        assert_eq!(record.status_code, Some(200));
        assert_eq!(record.body, None);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_complete_without_start_synthesizes() {
        let store = RecordStore::new();
        store.apply_completed(completed("9", "http://b.com/y", 404)).await;

        let record = store.get("9").await.unwrap();
        assert_eq!(record.status_code, Some(404));
        assert_eq!(record.body, None);
        assert_eq!(record.initiator, "N/A");
    }

    #[tokio::test]
    async fn test_static_fields_are_first_write_wins() {
        let store = RecordStore::new();
        store
            .apply_started(started("1", "http://a.com/first", "GET"))
            .await;
        store
            .apply_started(started("1", "http://a.com/second", "POST"))
            .await;

        let record = store.get("1").await.unwrap();
        assert_eq!(record.url, "http://a.com/first");
        assert_eq!(record.method, "GET");
    }

    #[tokio::test]
    async fn test_form_data_preferred_over_raw() {
        let mut form = BTreeMap::new();
        form.insert("q".to_string(), vec!["rust".to_string()]);

        let mut event = started("1", "http://a.com/search", "POST");
        event.request_body = Some(CapturedBody {
            form_data: Some(form.clone()),
            raw: vec![b"ignored".to_vec()],
        });

        let store = RecordStore::new();
        store.apply_started(event).await;

        let record = store.get("1").await.unwrap();
        assert_eq!(record.body, Some(RequestBody::Form(form)));
    }

    #[tokio::test]
    async fn test_only_first_raw_chunk_is_decoded() {
        let mut event = started("1", "http://a.com/upload", "POST");
        event.request_body = Some(CapturedBody {
            form_data: None,
            raw: vec![b"first".to_vec(), b"second".to_vec()],
        });

        let store = RecordStore::new();
        store.apply_started(event).await;

        let record = store.get("1").await.unwrap();
        assert_eq!(record.body, Some(RequestBody::Text("first".to_string())));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_left_null() {
        let mut event = started("1", "http://a.com/bin", "POST");
        event.request_body = Some(CapturedBody {
            form_data: None,
            raw: vec![vec![0xff, 0xfe, 0x00, 0x9f]],
        });

        let store = RecordStore::new();
        store.apply_started(event).await;

        let record = store.get("1").await.unwrap();
        assert_eq!(record.body, None);
    }

    #[tokio::test]
    async fn test_websocket_flag_derived_from_scheme() {
        let store = RecordStore::new();
        store
            .apply_started(started("1", "wss://a.com/live", "GET"))
            .await;

        let record = store.get("1").await.unwrap();
        assert!(record.is_web_socket);
        assert_eq!(record.display_method(), "WS");
    }

    #[tokio::test]
    async fn test_clear_empties_store() {
        let store = RecordStore::new();
        store
            .apply_started(started("1", "http://a.com/x", "GET"))
            .await;
        store
            .apply_started(started("2", "http://a.com/y", "GET"))
            .await;
        assert_eq!(store.len().await, 2);

        store.clear().await;
        assert!(store.is_empty().await);
    }
}
