//! Signed session tokens.
//!
//! Tokens use the compact JWT layout with HS256: `header.claims.signature`,
//! each part base64url-encoded without padding. The claims carry the user ID,
//! the admin flag at issue time, and issued-at/expiry timestamps.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use tidewear_core::UserId;

type HmacSha256 = Hmac<Sha256>;

/// How long a session token stays valid, in days.
pub const SESSION_TTL_DAYS: i64 = 30;

const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Errors from issuing or verifying a token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Not three base64url parts, or the parts are not the expected JSON.
    #[error("token is malformed")]
    Malformed,

    /// The signature does not match the header and claims.
    #[error("token signature is invalid")]
    BadSignature,

    /// The token is past its expiry.
    #[error("token has expired")]
    Expired,

    /// The signing key was rejected by the MAC.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// The user the token was issued to.
    pub sub: UserId,
    /// Admin flag when the token was issued. Informational only; admin checks
    /// use the stored user.
    pub is_admin: bool,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// Issues and verifies session tokens with one secret.
pub struct TokenSigner<'a> {
    secret: &'a SecretString,
}

impl<'a> TokenSigner<'a> {
    /// Create a signer over the configured secret.
    #[must_use]
    pub const fn new(secret: &'a SecretString) -> Self {
        Self { secret }
    }

    /// Issue a token for a user, valid for [`SESSION_TTL_DAYS`] from `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if the MAC rejects the secret.
    pub fn issue(
        &self,
        user: UserId,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user,
            is_admin,
            iat: now.timestamp(),
            exp: (now + TimeDelta::days(SESSION_TTL_DAYS)).timestamp(),
        };
        let claims_json = serde_json::to_vec(&claims).map_err(|_| TokenError::Malformed)?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER_JSON),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = self.mac(&signing_input)?.finalize().into_bytes();

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Malformed`, `TokenError::BadSignature` or
    /// `TokenError::Expired` depending on the first check that fails.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let Some((signing_input, signature)) = token.rsplit_once('.') else {
            return Err(TokenError::Malformed);
        };
        let Some((header, claims)) = signing_input.split_once('.') else {
            return Err(TokenError::Malformed);
        };
        if claims.contains('.') {
            return Err(TokenError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        // verify_slice compares in constant time
        self.mac(signing_input)?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let header: Header = decode_part(header)?;
        if header.alg != "HS256" {
            return Err(TokenError::Malformed);
        }

        let claims: Claims = decode_part(claims)?;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self, signing_input: &str) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::InvalidKey)?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }
}

fn decode_part<T: DeserializeOwned>(part: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("kT9#mQ2$vX7!pL4@wZ8&nR3*hJ6^bF1%")
    }

    #[test]
    fn test_issue_then_verify() {
        let secret = secret();
        let signer = TokenSigner::new(&secret);
        let user = UserId::generate();
        let now = Utc::now();

        let token = signer.issue(user, true, now).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = signer.verify(&token, now).unwrap();
        assert_eq!(claims.sub, user);
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn test_rejects_expired() {
        let secret = secret();
        let signer = TokenSigner::new(&secret);
        let issued = Utc::now() - TimeDelta::days(SESSION_TTL_DAYS + 1);

        let token = signer.issue(UserId::generate(), false, issued).unwrap();
        assert_eq!(signer.verify(&token, Utc::now()), Err(TokenError::Expired));
    }

    #[test]
    fn test_rejects_other_secret() {
        let secret = secret();
        let token = TokenSigner::new(&secret)
            .issue(UserId::generate(), false, Utc::now())
            .unwrap();

        let other = SecretString::from("Zq8!rT3@xW6#mN1$kP9%vB4^hL7&cJ2*");
        assert_eq!(
            TokenSigner::new(&other).verify(&token, Utc::now()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_rejects_tampered_claims() {
        let secret = secret();
        let signer = TokenSigner::new(&secret);
        let token = signer.issue(UserId::generate(), false, Utc::now()).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"sub":"{}","isAdmin":true,"iat":0,"exp":9999999999}}"#,
            UserId::generate()
        ));
        let forged = format!("{}.{forged_claims}.{}", parts[0], parts[2]);

        assert_eq!(
            signer.verify(&forged, Utc::now()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_rejects_garbage() {
        let secret = secret();
        let signer = TokenSigner::new(&secret);
        for garbage in ["", "abc", "a.b", "a.b.c.d", "!!!.???.###"] {
            assert!(signer.verify(garbage, Utc::now()).is_err(), "{garbage}");
        }
    }
}
