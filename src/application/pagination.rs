//! Keyset pagination over blog listings.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::PostRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct PostCursorPayload {
    date_published: OffsetDateTime,
    id: Uuid,
}

/// Position after the last post of a page, in `(date_published, id)`
/// descending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostCursor {
    date_published: OffsetDateTime,
    id: Uuid,
}

impl PostCursor {
    pub fn new(date_published: OffsetDateTime, id: Uuid) -> Self {
        Self { date_published, id }
    }

    pub fn after(record: &PostRecord) -> Self {
        Self::new(record.date_published, record.id)
    }

    pub fn date_published(&self) -> OffsetDateTime {
        self.date_published
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// True when `record` sorts strictly after this cursor.
    pub fn precedes(&self, record: &PostRecord) -> bool {
        (record.date_published, record.id) < (self.date_published, self.id)
    }

    pub fn encode(&self) -> String {
        let payload = PostCursorPayload {
            date_published: self.date_published,
            id: self.id,
        };
        let serialized =
            serde_json::to_vec(&payload).expect("serializing post cursor payload should succeed");
        URL_SAFE_NO_PAD.encode(serialized)
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let payload: PostCursorPayload = serde_json::from_slice(&bytes)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        Ok(Self {
            date_published: payload.date_published,
            id: payload.id,
        })
    }
}

/// Cursor-aware pagination request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<C> {
    pub limit: u32,
    pub cursor: Option<C>,
}

impl<C> PageRequest<C> {
    pub fn new(limit: u32, cursor: Option<C>) -> Self {
        Self { limit, cursor }
    }
}

/// Cursor-aware page result.
#[derive(Debug, Clone, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}
