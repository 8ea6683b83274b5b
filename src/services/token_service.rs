use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    fn issue(&self, user: &User, typ: TokenKind) -> Result<String> {
        let now = Utc::now();
        let ttl = match typ {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user.id,
            role: user.role,
            typ,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("failed to sign token: {e}")))
    }

    pub fn issue_access(&self, user: &User) -> Result<String> {
        self.issue(user, TokenKind::Access)
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue(user, TokenKind::Access)?,
            refresh: self.issue(user, TokenKind::Refresh)?,
        })
    }

    /// Verifies signature, expiry and token kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| Error::Unauthenticated("token is invalid or expired"))?;
        if data.claims.typ != expected {
            return Err(Error::Unauthenticated("token is invalid or expired"));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "c@x.com".into(),
            password_hash: String::new(),
            phone_number: String::new(),
            role: Role::Company,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, Duration::minutes(5), Duration::days(1))
    }

    #[test]
    fn access_token_round_trip() {
        let user = user();
        let token = service("k").issue_access(&user).unwrap();
        let claims = service("k").verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Company);
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let pair = service("k").issue_pair(&user()).unwrap();
        assert!(service("k").verify(&pair.access, TokenKind::Refresh).is_err());
        assert!(service("k").verify(&pair.refresh, TokenKind::Access).is_err());
        assert!(service("k").verify(&pair.refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn foreign_and_expired_tokens_fail() {
        let user = user();
        let token = service("k").issue_access(&user).unwrap();
        assert!(service("other").verify(&token, TokenKind::Access).is_err());

        let expired = TokenService::new("k", Duration::minutes(-10), Duration::days(1))
            .issue_access(&user)
            .unwrap();
        assert!(service("k").verify(&expired, TokenKind::Access).is_err());
    }
}
