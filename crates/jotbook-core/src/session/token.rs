//! JWT payload decoding.
//!
//! The client never holds the signing key, so only the payload is read; the
//! backend remains responsible for verifying signatures.

use std::collections::HashSet;

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;

use super::SessionError;

/// Claims the client relies on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Account email (`sub`)
    pub subject: String,
    /// Expiry as Unix seconds (`exp`)
    pub expires_at: i64,
    /// Numeric account id, when the backend includes a `userId` claim
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: String,
    exp: i64,
    #[serde(default, rename = "userId")]
    user_id: Option<Value>,
}

pub fn decode_claims(token: &str) -> Result<TokenClaims, SessionError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(SessionError::InvalidToken("token is empty".to_string()));
    }

    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

    let decoded = decode::<RawClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|error| SessionError::InvalidToken(sanitize(&error)))?;
    let claims = decoded.claims;

    let subject = claims.sub.trim().to_string();
    if subject.is_empty() {
        return Err(SessionError::InvalidToken("token subject is empty".to_string()));
    }

    Ok(TokenClaims {
        subject,
        expires_at: claims.exp,
        user_id: claims.user_id.as_ref().and_then(parse_user_id),
    })
}

fn parse_user_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

fn sanitize(error: &impl std::fmt::Display) -> String {
    error.to_string().replace('\n', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    use super::*;

    fn sign(claims: &Value) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(b"backend-secret"),
        )
        .unwrap()
    }

    #[test]
    fn decodes_subject_expiry_and_user_id() {
        let token = sign(&json!({"sub": "a@b.com", "exp": 2_000_000_000_i64, "userId": 7}));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.subject, "a@b.com");
        assert_eq!(claims.expires_at, 2_000_000_000);
        assert_eq!(claims.user_id, Some(7));
    }

    #[test]
    fn expired_tokens_still_decode() {
        let token = sign(&json!({"sub": "a@b.com", "exp": 10}));
        assert_eq!(decode_claims(&token).unwrap().expires_at, 10);
    }

    #[test]
    fn string_user_id_is_accepted() {
        let token = sign(&json!({"sub": "a@b.com", "exp": 10, "userId": "12"}));
        assert_eq!(decode_claims(&token).unwrap().user_id, Some(12));
    }

    #[test]
    fn rejects_garbage_and_missing_claims() {
        assert!(matches!(
            decode_claims("not-a-jwt"),
            Err(SessionError::InvalidToken(_))
        ));
        let no_exp = sign(&json!({"sub": "a@b.com"}));
        assert!(decode_claims(&no_exp).is_err());
        let blank_sub = sign(&json!({"sub": "  ", "exp": 10}));
        assert!(decode_claims(&blank_sub).is_err());
        assert!(decode_claims("").is_err());
    }
}
