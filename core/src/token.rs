//! Access token parsing.
//!
//! Tokens look like `pk.<payload>.<signature>` where the payload is base64url
//! JSON carrying the owning account in `u`. The client only reads the
//! payload to fill in `:ownerId` when a caller leaves it out; the signature is
//! never checked locally.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Fields decoded from an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// `pk`, `sk` or `tk`.
    pub usage: String,
    /// Account that owns the token.
    pub user: String,
    pub authorization: Option<String>,
}

#[derive(Deserialize)]
struct Payload {
    u: String,
    a: Option<String>,
}

pub fn parse_token(token: &str) -> Result<TokenInfo> {
    let mut parts = token.split('.');
    let (Some(usage), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::invalid("accessToken", "expected three dot-separated parts"));
    };

    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD
        .decode(normalized)
        .map_err(|e| Error::invalid("accessToken", format!("payload is not base64: {e}")))?;
    let payload: Payload = serde_json::from_slice(&bytes)
        .map_err(|e| Error::invalid("accessToken", format!("payload is not token JSON: {e}")))?;

    Ok(TokenInfo {
        usage: usage.to_string(),
        user: payload.u,
        authorization: payload.a,
    })
}

#[cfg(test)]
pub(crate) fn fake_token(user: &str) -> String {
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"u":"{user}","a":"abc123"}}"#));
    format!("pk.{payload}.signature")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_user_from_payload() {
        let info = parse_token(&fake_token("alice")).unwrap();
        assert_eq!(info.usage, "pk");
        assert_eq!(info.user, "alice");
        assert_eq!(info.authorization.as_deref(), Some("abc123"));
    }

    #[test]
    fn accepts_padded_standard_alphabet() {
        let payload = base64::engine::general_purpose::STANDARD.encode(r#"{"u":"bob?"}"#);
        let info = parse_token(&format!("sk.{payload}.sig")).unwrap();
        assert_eq!(info.user, "bob?");
        assert!(info.authorization.is_none());
    }

    #[test]
    fn rejects_wrong_shape() {
        assert!(parse_token("pk.only-two").is_err());
        assert!(parse_token("a.b.c.d").is_err());
        assert!(parse_token("pk.!!!.sig").is_err());
    }

    #[test]
    fn rejects_payload_without_user() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"a":"x"}"#);
        assert!(parse_token(&format!("pk.{payload}.sig")).is_err());
    }
}
