//! Opaque cursor and page envelope primitives.
//!
//! Endpoints that page through result sets hand clients an opaque cursor
//! instead of a raw offset. The cursor is a base64url-encoded JSON document;
//! clients must treat it as a token and pass it back verbatim. Tampered or
//! truncated cursors are rejected rather than silently clamped.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Default number of items returned when the client does not ask for a limit.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Upper bound on the number of items a single page may carry.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Failures raised while decoding a client-supplied cursor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The cursor is not valid base64url.
    #[error("cursor is not valid base64: {message}")]
    Encoding { message: String },
    /// The cursor decoded but its payload is not the expected document.
    #[error("cursor payload is malformed: {message}")]
    Payload { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct CursorPayload {
    /// Number of items already consumed.
    o: u64,
}

/// Opaque position marker within a result set.
///
/// ## Invariants
/// - Round-trips through [`Cursor::encode`] and [`Cursor::decode`] unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    offset: u64,
}

impl Cursor {
    /// Build a cursor pointing past `offset` consumed items.
    #[must_use]
    pub fn at(offset: u64) -> Self {
        Self { offset }
    }

    /// Number of items the cursor skips.
    #[must_use]
    pub fn offset(self) -> u64 {
        self.offset
    }

    /// Render the cursor as the opaque token handed to clients.
    #[must_use]
    pub fn encode(self) -> String {
        let payload = CursorPayload { o: self.offset };
        // CursorPayload is a closed struct of primitives; serialisation
        // cannot fail, so fall back to an empty-offset token if it ever does.
        let json = serde_json::to_vec(&payload).unwrap_or_else(|_| b"{\"o\":0}".to_vec());
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Parse a client-supplied token back into a cursor.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError`] when the token is not base64url or does not
    /// decode to the expected payload document.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|err| CursorError::Encoding {
                message: err.to_string(),
            })?;
        let payload: CursorPayload =
            serde_json::from_slice(&bytes).map_err(|err| CursorError::Payload {
                message: err.to_string(),
            })?;
        Ok(Self { offset: payload.o })
    }
}

/// Clamped page-size request derived from client query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: u64,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request from an optional cursor token and requested limit.
    ///
    /// A missing cursor starts from the beginning; a missing or zero limit
    /// falls back to [`DEFAULT_PAGE_SIZE`]; limits above [`MAX_PAGE_SIZE`]
    /// are clamped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError`] when a supplied cursor token fails to decode.
    pub fn from_parts(cursor: Option<&str>, limit: Option<u32>) -> Result<Self, CursorError> {
        let offset = match cursor {
            Some(token) => Cursor::decode(token)?.offset(),
            None => 0,
        };
        let limit = match limit {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(requested) => requested.min(MAX_PAGE_SIZE),
        };
        Ok(Self { offset, limit })
    }

    /// Items to skip.
    #[must_use]
    pub fn offset(self) -> u64 {
        self.offset
    }

    /// Items to return.
    #[must_use]
    pub fn limit(self) -> u32 {
        self.limit
    }
}

/// One page of results plus the cursor for the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, in result-set order.
    pub items: Vec<T>,
    /// Token for the following page; absent on the final page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Total number of items matching the query.
    pub total: u64,
}

impl<T> Page<T> {
    /// Assemble a page envelope from a request and the total match count.
    ///
    /// The next cursor is emitted only while `offset + items` still lies
    /// short of `total`.
    #[must_use]
    pub fn assemble(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let consumed = request.offset().saturating_add(items.len() as u64);
        let next_cursor = (consumed < total).then(|| Cursor::at(consumed).encode());
        Self {
            items,
            next_cursor,
            total,
        }
    }

    /// Map the item type while keeping the envelope intact.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            total: self.total,
        }
    }
}
