use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use uuid::Uuid;

use crate::error::Result;
use crate::models::user::User;
use crate::utils::crypto::{constant_time_eq, hmac_sha256_hex};

pub fn random_suffix(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Opaque id segment of an activation link.
pub fn encode_uid(id: Uuid) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

pub fn decode_uid(encoded: &str) -> Option<Uuid> {
    let raw = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')).ok()?;
    let text = String::from_utf8(raw).ok()?;
    Uuid::parse_str(&text).ok()
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// One-time account activation tokens.
///
/// A token is `<issued-at base36>-<hex hmac>` where the MAC covers the user id,
/// the issue time and the current `is_active` flag. Flipping the flag on
/// activation invalidates every outstanding token for that user.
#[derive(Clone)]
pub struct ActivationTokens {
    secret: String,
    ttl: Duration,
}

impl ActivationTokens {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    fn digest(&self, user: &User, issued_at: i64) -> Result<String> {
        let payload = format!("{}{}{}", user.id, issued_at, user.is_active);
        hmac_sha256_hex(self.secret.as_bytes(), payload.as_bytes())
    }

    pub fn make(&self, user: &User, now: DateTime<Utc>) -> Result<String> {
        let issued_at = now.timestamp().max(0);
        let digest = self.digest(user, issued_at)?;
        Ok(format!("{}-{}", to_base36(issued_at as u64), digest))
    }

    /// Fails closed on any malformed, foreign, stale or replayed token.
    pub fn check(&self, user: &User, token: &str, now: DateTime<Utc>) -> bool {
        let Some((stamp, digest)) = token.split_once('-') else {
            return false;
        };
        let Ok(issued_at) = u64::from_str_radix(stamp, 36) else {
            return false;
        };
        let Ok(issued_at) = i64::try_from(issued_at) else {
            return false;
        };
        let Ok(expected) = self.digest(user, issued_at) else {
            return false;
        };
        if !constant_time_eq(&expected, digest) {
            return false;
        }
        let age = now.timestamp() - issued_at;
        age >= 0 && age <= self.ttl.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn user(active: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: String::new(),
            phone_number: String::new(),
            role: Role::Candidate,
            is_active: active,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn tokens() -> ActivationTokens {
        ActivationTokens::new("secret", Duration::hours(72))
    }

    #[test]
    fn uid_round_trips() {
        let id = Uuid::new_v4();
        assert_eq!(decode_uid(&encode_uid(id)), Some(id));
        assert_eq!(decode_uid("%%%"), None);
        assert_eq!(decode_uid(&URL_SAFE_NO_PAD.encode("not-a-uuid")), None);
    }

    #[test]
    fn token_is_bound_to_one_user() {
        let now = Utc::now();
        let alice = user(false);
        let bob = user(false);
        let token = tokens().make(&alice, now).unwrap();
        assert!(tokens().check(&alice, &token, now));
        assert!(!tokens().check(&bob, &token, now));
    }

    #[test]
    fn activation_invalidates_the_token() {
        let now = Utc::now();
        let mut u = user(false);
        let token = tokens().make(&u, now).unwrap();
        u.is_active = true;
        assert!(!tokens().check(&u, &token, now));
    }

    #[test]
    fn tampered_and_stale_tokens_fail() {
        let now = Utc::now();
        let u = user(false);
        let token = tokens().make(&u, now).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('0') { '1' } else { '0' });
        assert!(!tokens().check(&u, &tampered, now));
        assert!(!tokens().check(&u, "garbage", now));
        assert!(!tokens().check(&u, &token, now + Duration::hours(73)));
    }

    #[test]
    fn base36_matches_radix_parse() {
        for n in [0u64, 35, 36, 1_700_000_000] {
            assert_eq!(u64::from_str_radix(&to_base36(n), 36).unwrap(), n);
        }
    }
}
