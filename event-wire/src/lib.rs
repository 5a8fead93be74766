pub mod drain;
pub mod json;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::Full;
use serde::{Deserialize, Serialize};

/// Collection path of the events API.
pub const EVENTS_PATH: &str = "/api/v1/events";

#[inline]
pub fn empty_body() -> Full<Bytes> {
    Full::new(Bytes::new())
}

#[inline]
pub fn byte_body<B: Into<Bytes>>(bytes: B) -> Full<Bytes> {
    Full::new(bytes.into())
}

/// Path that books tickets for the event `event_id`.
#[must_use]
pub fn book_path(event_id: &str) -> String {
    format!("{EVENTS_PATH}/{event_id}/book")
}

/// Body of `POST /api/v1/events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    #[serde(serialize_with = "json::serialize_rfc3339")]
    pub date: DateTime<Utc>,
    pub total_tickets: i64,
}

impl CreateEventRequest {
    #[must_use]
    pub fn new(name: impl Into<String>, date: DateTime<Utc>, total_tickets: i64) -> Self {
        Self {
            name: name.into(),
            date,
            total_tickets,
        }
    }

    /// The event every load-test request creates.
    #[must_use]
    pub fn test_event() -> Self {
        let date = Utc
            .with_ymd_and_hms(2024, 5, 4, 12, 0, 0)
            .single()
            .unwrap_or_default();
        Self::new("Test Event", date, 100)
    }

    /// Request body bytes, see [`json::SpacedFormatter`].
    pub fn to_body(&self) -> serde_json::Result<Vec<u8>> {
        json::to_spaced_vec(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "json::serialize_rfc3339")]
    pub date: DateTime<Utc>,
    pub total_tickets: i64,
    pub available_tickets: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "EventID")]
    pub event_id: String,
}
