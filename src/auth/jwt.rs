use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, SessionClaims};
use crate::config::JwtConfig;

/// Lifetime of every session token handed out on signup or login.
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing secret is not configured")]
    MissingSecret,
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Signs and checks stateless HS256 session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    has_secret: bool,
}

impl TokenIssuer {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            has_secret: !cfg.secret.trim().is_empty(),
        }
    }

    pub fn issue(&self, session: &SessionClaims, ttl: Duration) -> Result<String, TokenError> {
        if !self.has_secret {
            return Err(TokenError::MissingSecret);
        }
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            user_id: session.user_id,
            email: session.email.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %session.user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        if !self.has_secret {
            return Err(TokenError::MissingSecret);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_issuer(secret: &str, issuer: &str, audience: &str) -> TokenIssuer {
        TokenIssuer::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
        })
    }

    fn session() -> SessionClaims {
        SessionClaims {
            user_id: Uuid::new_v4(),
            email: "a@x.com".into(),
        }
    }

    #[test]
    fn issue_and_verify_session_token() {
        let tokens = make_issuer("dev-secret", "test-issuer", "test-aud");
        let session = session();
        let token = tokens.issue(&session, SESSION_TTL).expect("issue");
        let claims = tokens.verify(&token).expect("verify");
        assert_eq!(claims.session(), session);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, SESSION_TTL.as_secs() as usize);
    }

    #[test]
    fn payload_uses_user_id_key() {
        let tokens = make_issuer("dev-secret", "iss", "aud");
        let token = tokens.issue(&session(), SESSION_TTL).unwrap();
        let claims = tokens.verify(&token).unwrap();
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("userId").is_some());
        assert_eq!(json["email"], "a@x.com");
    }

    #[test]
    fn empty_secret_cannot_sign() {
        let tokens = make_issuer("", "iss", "aud");
        let err = tokens.issue(&session(), SESSION_TTL).unwrap_err();
        assert!(matches!(err, TokenError::MissingSecret));
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = make_issuer("secret-a", "iss", "aud");
        let bad = make_issuer("secret-b", "iss", "aud");
        let token = good.issue(&session(), SESSION_TTL).unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = make_issuer("same-secret", "good-iss", "good-aud");
        let bad = make_issuer("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(&session(), SESSION_TTL).unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let tokens = make_issuer("dev-secret", "iss", "aud");
        let token = tokens.issue(&session(), SESSION_TTL).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = {
            let other = make_issuer("dev-secret", "iss", "aud")
                .issue(&session(), SESSION_TTL)
                .unwrap();
            other.split('.').nth(1).unwrap().to_string()
        };
        parts[1] = &forged_payload;
        let forged = parts.join(".");
        assert!(tokens.verify(&forged).is_err());
    }
}
