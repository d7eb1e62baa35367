use axum::http::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{MembershipError, Result};
use crate::server::util::bearer_token;

type HmacSha256 = Hmac<Sha256>;

const JWT_HEADER: &[u8] = br#"{"alg":"HS256","typ":"JWT"}"#;
const DEFAULT_TTL_SECS: u64 = 86_400;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub email: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

fn jwt_secret() -> Result<String> {
    std::env::var("MS_JWT_SECRET")
        .map_err(|_| MembershipError::Config("missing env `MS_JWT_SECRET`".into()))
}

pub fn jwt_ttl_secs() -> u64 {
    std::env::var("MS_JWT_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TTL_SECS)
}

fn signer() -> Result<HmacSha256> {
    HmacSha256::new_from_slice(jwt_secret()?.as_bytes())
        .map_err(|_| MembershipError::Config("invalid `MS_JWT_SECRET`".into()))
}

pub fn issue_access_token(claims: &AccessTokenClaims) -> Result<String> {
    let header = URL_SAFE_NO_PAD.encode(JWT_HEADER);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{header}.{payload}");
    let mut mac = signer()?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{signing_input}.{signature}"))
}

pub fn decode_access_token(token: &str) -> Result<AccessTokenClaims> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(MembershipError::Unauthorized("malformed token".into()));
    };

    let signing_input = format!("{header}.{payload}");
    let mut mac = signer()?;
    mac.update(signing_input.as_bytes());
    let signature_bytes = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| MembershipError::Unauthorized("malformed token".into()))?;
    mac.verify_slice(&signature_bytes)
        .map_err(|_| MembershipError::Unauthorized("invalid token signature".into()))?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| MembershipError::Unauthorized("malformed token".into()))?;
    let claims: AccessTokenClaims = serde_json::from_slice(&payload_bytes)
        .map_err(|_| MembershipError::Unauthorized("malformed token claims".into()))?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(MembershipError::Unauthorized("token expired".into()));
    }

    Ok(claims)
}

pub fn require_user(headers: &HeaderMap) -> Result<AccessTokenClaims> {
    let token = bearer_token(headers)
        .ok_or_else(|| MembershipError::Unauthorized("missing bearer token".into()))?;
    decode_access_token(&token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn set_test_secret() {
        unsafe {
            std::env::set_var("MS_JWT_SECRET", "testsecret");
        }
    }

    fn claims_expiring_in(secs: i64) -> AccessTokenClaims {
        let now = Utc::now();
        AccessTokenClaims {
            sub: "u1".into(),
            email: "u1@example.com".into(),
            exp: (now + Duration::seconds(secs)).timestamp(),
            iat: Some(now.timestamp()),
        }
    }

    #[test]
    fn token_roundtrips_through_require_user() {
        set_test_secret();
        let token = issue_access_token(&claims_expiring_in(300)).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        let claims = require_user(&headers).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "u1@example.com");
    }

    #[test]
    fn tampered_signature_is_rejected() {
        set_test_secret();
        let token = issue_access_token(&claims_expiring_in(300)).unwrap();
        let mut tampered = token[..token.len() - 2].to_string();
        tampered.push_str("xx");
        let err = decode_access_token(&tampered).unwrap_err();
        assert!(matches!(err, MembershipError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        set_test_secret();
        let token = issue_access_token(&claims_expiring_in(-10)).unwrap();
        let err = decode_access_token(&token).unwrap_err();
        assert!(matches!(err, MembershipError::Unauthorized(_)));
    }

    #[test]
    fn missing_header_is_unauthorized() {
        set_test_secret();
        let err = require_user(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, MembershipError::Unauthorized(_)));
    }
}
