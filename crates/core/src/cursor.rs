//! Opaque pagination cursors.
//!
//! A cursor encodes a primary-key boundary as base64 over a tiny JSON
//! payload, e.g. `{"id":42}`. Clients must treat the token as opaque;
//! the only guarantee is that a cursor obtained from one page, passed as
//! the `after` bound of the next request, never re-returns a record with
//! an id at or below the boundary (the action log is insert-only).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::error::CoreError;
use crate::types::DbId;

#[derive(Deserialize)]
struct CursorPayload {
    id: DbId,
}

/// Encode a record id as an opaque cursor token.
pub fn encode_cursor(id: DbId) -> String {
    STANDARD.encode(format!("{{\"id\":{id}}}"))
}

/// Decode a cursor token back to the id boundary it wraps.
pub fn decode_cursor(token: &str) -> Result<DbId, CoreError> {
    let bytes = STANDARD
        .decode(token)
        .map_err(|_| CoreError::Validation("invalid cursor".into()))?;
    let payload: CursorPayload = serde_json::from_slice(&bytes)
        .map_err(|_| CoreError::Validation("invalid cursor".into()))?;
    Ok(payload.id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        for id in [0, 1, 42, i64::MAX] {
            assert_eq!(decode_cursor(&encode_cursor(id)).unwrap(), id);
        }
    }

    #[test]
    fn known_token_decodes() {
        // base64("{\"id\":1}")
        assert_eq!(decode_cursor("eyJpZCI6MX0=").unwrap(), 1);
        assert_eq!(encode_cursor(1), "eyJpZCI6MX0=");
    }

    #[test]
    fn cursors_are_monotonic_in_id() {
        let a = decode_cursor(&encode_cursor(10)).unwrap();
        let b = decode_cursor(&encode_cursor(11)).unwrap();
        assert!(a < b);
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert_matches!(decode_cursor("not base64!"), Err(CoreError::Validation(_)));
        // Valid base64, invalid payload.
        let token = STANDARD.encode(b"{\"other\":true}");
        assert_matches!(decode_cursor(&token), Err(CoreError::Validation(_)));
    }
}
