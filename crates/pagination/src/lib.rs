//! Keyset pagination primitives shared by the store and the HTTP layer.
//!
//! Lists are ordered by `(created_at, id)`. A [`Cursor`] names the last row a
//! client has seen and is handed out as an opaque base64 token, so the next
//! page starts strictly after it regardless of concurrent inserts.

use std::cmp::Ordering;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while decoding a client-supplied cursor.
#[derive(Debug, Error)]
pub enum CursorError {
    /// The token is not valid base64.
    #[error("cursor is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The decoded token does not describe a position.
    #[error("cursor payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Position of a row in a `(created_at, id)` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Creation time of the row.
    #[serde(rename = "t")]
    pub created_at: DateTime<Utc>,
    /// Row ID, breaking ties between equal timestamps.
    pub id: Uuid,
}

impl Cursor {
    /// Creates a cursor pointing at a row.
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    /// Encodes the cursor as an opaque URL-safe token.
    pub fn encode(&self) -> String {
        // Serializing two plain fields cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decodes a token produced by [`Cursor::encode`].
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD.decode(token.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

/// Sort direction of a keyset listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Oldest first.
    #[default]
    Ascending,
    /// Newest first.
    Descending,
}

impl Direction {
    /// Orders two positions according to this direction.
    pub fn compare(&self, a: &Cursor, b: &Cursor) -> Ordering {
        match self {
            Self::Ascending => a.key().cmp(&b.key()),
            Self::Descending => b.key().cmp(&a.key()),
        }
    }

    /// Returns true if `position` comes strictly after `cursor` in this direction.
    pub fn is_past(&self, cursor: &Cursor, position: &Cursor) -> bool {
        self.compare(cursor, position) == Ordering::Less
    }
}

/// A bounded request for one page of a listing.
///
/// The listing itself decides the [`Direction`]; the request only carries
/// how many rows the caller wants and where the previous page ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    after: Option<Cursor>,
}

impl PageRequest {
    /// Builds a request, clamping `requested` into `1..=max` (absent means `max`).
    pub fn bounded(requested: Option<u32>, max: u32) -> Self {
        let max = max.max(1);
        Self {
            limit: requested.unwrap_or(max).clamp(1, max),
            after: None,
        }
    }

    /// Continues after the position encoded in `token`, if any.
    pub fn after_token(mut self, token: Option<&str>) -> Result<Self, CursorError> {
        self.after = match token {
            Some(token) if !token.trim().is_empty() => Some(Cursor::decode(token)?),
            _ => None,
        };
        Ok(self)
    }

    /// Continues after `cursor`.
    pub fn after(mut self, cursor: Cursor) -> Self {
        self.after = Some(cursor);
        self
    }

    /// Maximum number of items in the page.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Position the page starts after, if any.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.after.as_ref()
    }

    /// Number of rows to fetch so that a following page can be detected.
    pub fn fetch_limit(&self) -> i64 {
        i64::from(self.limit) + 1
    }

    /// Returns true if a row at `position` belongs on or after this page of a
    /// listing ordered by `direction`.
    pub fn admits(&self, direction: Direction, position: &Cursor) -> bool {
        self.after
            .as_ref()
            .is_none_or(|cursor| direction.is_past(cursor, position))
    }
}

/// One page of results plus the token for the next page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Token for the following page; `None` on the last page.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Builds a page from rows fetched with [`PageRequest::fetch_limit`].
    ///
    /// Rows must already be ordered. The extra row, if present, is dropped and
    /// signals that a next page exists.
    pub fn from_overfetch(
        mut rows: Vec<T>,
        request: &PageRequest,
        position: impl Fn(&T) -> Cursor,
    ) -> Self {
        let limit = request.limit() as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(|row| position(row).encode())
        } else {
            None
        };
        Self {
            items: rows,
            next_cursor,
        }
    }

    /// Transforms the items, keeping the cursor.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn at(seconds: i64) -> Cursor {
        Cursor::new(
            DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(seconds),
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_cursor_token_is_opaque_and_reversible() {
        let cursor = at(1_700_000_000);
        let token = cursor.encode();

        assert!(!token.contains('{'));
        assert_eq!(Cursor::decode(&token).unwrap(), cursor);
    }

    #[test]
    fn test_garbage_cursor_is_rejected() {
        assert!(matches!(
            Cursor::decode("not base64!"),
            Err(CursorError::Encoding(_))
        ));
        let not_json = URL_SAFE_NO_PAD.encode(b"hello");
        assert!(matches!(
            Cursor::decode(&not_json),
            Err(CursorError::Payload(_))
        ));
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(PageRequest::bounded(None, 20).limit(), 20);
        assert_eq!(PageRequest::bounded(Some(500), 20).limit(), 20);
        assert_eq!(PageRequest::bounded(Some(0), 20).limit(), 1);
        assert_eq!(PageRequest::bounded(Some(5), 20).fetch_limit(), 6);
    }

    #[test]
    fn test_blank_token_means_first_page() {
        let request = PageRequest::bounded(None, 10)
            .after_token(Some("  "))
            .unwrap();
        assert!(request.cursor().is_none());
    }

    #[test]
    fn test_admits_respects_direction() {
        let early = at(10);
        let late = at(20);

        let after_early = PageRequest::bounded(None, 10).after(early);
        assert!(after_early.admits(Direction::Ascending, &late));
        assert!(!after_early.admits(Direction::Ascending, &early));
        assert!(!after_early.admits(Direction::Descending, &late));

        let after_late = PageRequest::bounded(None, 10).after(late);
        assert!(after_late.admits(Direction::Descending, &early));
        assert!(!after_late.admits(Direction::Descending, &late));
        assert!(PageRequest::bounded(None, 10).admits(Direction::Descending, &late));
    }

    #[test]
    fn test_overfetch_produces_next_cursor() {
        let rows: Vec<Cursor> = (0..4).map(at).collect();
        let request = PageRequest::bounded(Some(3), 10);

        let page = Page::from_overfetch(rows.clone(), &request, |c| *c);
        assert_eq!(page.items.len(), 3);
        let next = Cursor::decode(page.next_cursor.as_deref().unwrap()).unwrap();
        assert_eq!(next, rows[2]);

        let last = Page::from_overfetch(rows[..2].to_vec(), &request, |c| *c);
        assert_eq!(last.items.len(), 2);
        assert!(last.next_cursor.is_none());
    }
}
