use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::auth::dto::{Claims, JwtKeys};
use crate::config::JwtConfig;
use crate::db::AppState;

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            ttl_minutes,
        } = state.config.jwt.clone();
        Self::from_config(&secret, ttl_minutes)
    }
}

impl JwtKeys {
    pub fn from_config(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs(ttl_minutes.max(0) as u64 * 60),
        }
    }

    /// Signs an identity token bound to the username.
    pub fn sign(&self, username: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: username.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(username = %username, "jwt signed");
        Ok(token)
    }

    /// Verifies signature and expiry, returning the claims. Any
    /// structurally invalid, mis-signed or expired token is an error.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let validation = Validation::default();
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(username = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::from_config(secret, 5)
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret");
        let token = keys.sign("alice").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = make_keys("secret-a").sign("alice").expect("sign");
        assert!(make_keys("secret-b").verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let keys = make_keys("dev-secret");
        let mut token = keys.sign("alice").expect("sign");
        // Flip a character in the payload segment.
        let dot = token.find('.').unwrap() + 1;
        let original = token.as_bytes()[dot];
        let replacement = if original == b'A' { 'B' } else { 'A' };
        token.replace_range(dot..dot + 1, &replacement.to_string());
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("dev-secret");
        assert!(keys.verify("not-a-token").is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        // exp must sit further in the past than the default leeway.
        let keys = JwtKeys::from_config("dev-secret", 0);
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: "alice".into(),
            iat: (now - TimeDuration::minutes(10)).unix_timestamp() as usize,
            exp: (now - TimeDuration::minutes(5)).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn from_ref_uses_state_config() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign("bob").expect("sign");
        assert_eq!(keys.verify(&token).expect("verify").sub, "bob");
    }
}
