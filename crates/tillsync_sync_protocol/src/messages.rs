//! Request and response bodies for the sync endpoints.

use crate::timestamp;
use crate::LEGACY_PUSH_MODEL;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tillsync_codec::{CodecResult, WireRecord};

/// Body of `POST /api/sync/push`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    /// Model name of every record in the batch.
    pub model: String,
    /// Encoded records.
    pub records: Vec<WireRecord>,
}

impl PushRequest {
    /// Creates a push request.
    pub fn new(model: impl Into<String>, records: Vec<WireRecord>) -> Self {
        Self {
            model: model.into(),
            records,
        }
    }
}

/// Any accepted push body.
///
/// Older Edge builds posted `{"orders": [...]}` with items and payments
/// inlined; that shape is still accepted and treated as an `Order` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PushPayload {
    /// `{"model": ..., "records": [...]}`.
    Model(PushRequest),
    /// `{"orders": [...]}`.
    LegacyOrders {
        /// Encoded orders.
        orders: Vec<WireRecord>,
    },
}

impl PushPayload {
    /// Normalizes either shape into a [`PushRequest`].
    pub fn into_request(self) -> PushRequest {
        match self {
            PushPayload::Model(request) => request,
            PushPayload::LegacyOrders { orders } => PushRequest::new(LEGACY_PUSH_MODEL, orders),
        }
    }
}

impl From<PushRequest> for PushPayload {
    fn from(request: PushRequest) -> Self {
        PushPayload::Model(request)
    }
}

/// A record the server could not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    /// External id of the record, when it had one.
    #[serde(default)]
    pub external_id: Option<String>,
    /// What went wrong.
    pub error: String,
}

impl RecordError {
    /// Creates a record error.
    pub fn new(external_id: Option<String>, error: impl Into<String>) -> Self {
        Self {
            external_id,
            error: error.into(),
        }
    }
}

/// Response to a push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushResponse {
    /// Whether the batch was committed.
    pub success: bool,
    /// Model the batch was applied to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Rows created.
    #[serde(default)]
    pub created: u32,
    /// Rows updated.
    #[serde(default)]
    pub updated: u32,
    /// Records that were skipped.
    #[serde(default)]
    pub errors: Vec<RecordError>,
    /// Error message if the batch failed as a whole.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PushResponse {
    /// Creates a response for a committed batch.
    pub fn success(model: impl Into<String>, created: u32, updated: u32, errors: Vec<RecordError>) -> Self {
        Self {
            success: true,
            model: Some(model.into()),
            created,
            updated,
            errors,
            error: None,
        }
    }

    /// Creates a response for a rejected batch.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            model: None,
            created: 0,
            updated: 0,
            errors: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Number of records the server applied.
    pub fn applied(&self) -> u32 {
        self.created + self.updated
    }
}

/// Query of `GET /api/sync/pull`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Model to pull.
    pub model: String,
    /// Only return records updated strictly after this time.
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Creates a pull request.
    pub fn new(model: impl Into<String>, since: Option<DateTime<Utc>>) -> Self {
        Self {
            model: model.into(),
            since,
        }
    }

    /// Builds a request from raw query values.
    pub fn from_query(model: &str, since: Option<&str>) -> CodecResult<Self> {
        let since = match since.map(str::trim) {
            Some(text) if !text.is_empty() => Some(tillsync_codec::parse_datetime(text)?),
            _ => None,
        };
        Ok(Self::new(model.trim(), since))
    }
}

/// Response to a pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullResponse {
    /// Whether the pull succeeded.
    pub success: bool,
    /// Model pulled.
    #[serde(default)]
    pub model: String,
    /// Encoded records, oldest `updated_at` first.
    #[serde(default)]
    pub records: Vec<WireRecord>,
    /// Number of records returned.
    #[serde(default)]
    pub count: usize,
    /// Server time taken before the query; the caller's next cursor.
    #[serde(with = "timestamp::required")]
    pub timestamp: DateTime<Utc>,
    /// Error message if the pull failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PullResponse {
    /// Creates a successful pull response.
    pub fn new(model: impl Into<String>, records: Vec<WireRecord>, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            model: model.into(),
            count: records.len(),
            records,
            timestamp,
            error: None,
        }
    }
}

/// Response to `GET /api/sync/ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    /// Whether the token was accepted.
    pub success: bool,
    /// Short status text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Error message if the token was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PingResponse {
    /// Creates an accepted ping response.
    pub fn ok() -> Self {
        Self {
            success: true,
            status: Some("ok".into()),
            error: None,
        }
    }
}

/// Response to `GET /api/sync/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always true.
    pub success: bool,
    /// Server time.
    #[serde(with = "timestamp::required")]
    pub timestamp: DateTime<Utc>,
    /// Model names the server accepts.
    pub models_available: Vec<String>,
}

/// Body of every non-200 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false.
    pub success: bool,
    /// What went wrong.
    pub error: String,
}

impl ErrorResponse {
    /// Creates an error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn current_push_shape() {
        let body = json!({"model": "Customer", "records": [{"external_id": "c-1"}]});
        let payload: PushPayload = serde_json::from_value(body).unwrap();
        let request = payload.into_request();
        assert_eq!(request.model, "Customer");
        assert_eq!(request.records.len(), 1);
    }

    #[test]
    fn legacy_orders_shape() {
        let body = json!({"orders": [{"external_id": "o-1", "items": []}]});
        let payload: PushPayload = serde_json::from_value(body).unwrap();
        assert!(matches!(payload, PushPayload::LegacyOrders { .. }));
        assert_eq!(payload.into_request().model, "Order");
    }

    #[test]
    fn push_body_without_records_is_rejected() {
        let body = json!({"model": "Order"});
        assert!(serde_json::from_value::<PushPayload>(body).is_err());
    }

    #[test]
    fn push_response_matches_wire_shape() {
        let response = PushResponse::success(
            "Order",
            1,
            2,
            vec![RecordError::new(None, "missing external_id")],
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["created"], json!(1));
        assert_eq!(value["updated"], json!(2));
        assert_eq!(value["errors"][0]["error"], json!("missing external_id"));
        assert_eq!(value["errors"][0]["external_id"], json!(null));
        assert!(value.get("error").is_none());
        assert_eq!(response.applied(), 3);
    }

    #[test]
    fn minimal_push_response_parses() {
        let response: PushResponse =
            serde_json::from_value(json!({"success": true, "created": 1, "updated": 0, "errors": []}))
                .unwrap();
        assert!(response.success);
        assert!(response.model.is_none());
    }

    #[test]
    fn pull_timestamp_uses_record_format() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let response = PullResponse::new("Category", Vec::new(), ts);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["timestamp"], json!("2026-03-01T08:00:00.000000Z"));
        assert_eq!(value["count"], json!(0));

        let back: PullResponse = serde_json::from_value(value).unwrap();
        assert_eq!(back.timestamp, ts);
    }

    #[test]
    fn pull_query_parsing() {
        let request = PullRequest::from_query("Category", Some("2026-03-01T08:00:00Z")).unwrap();
        assert_eq!(request.since, Some(Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()));

        let request = PullRequest::from_query("Category", Some("")).unwrap();
        assert!(request.since.is_none());

        assert!(PullRequest::from_query("Category", Some("last tuesday")).is_err());
    }
}
