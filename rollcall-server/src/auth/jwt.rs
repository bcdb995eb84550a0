use std::fmt;

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use rollcall_core::auth::Claims;
use rollcall_model::User;

/// Signing/verification keys for bearer tokens. Built once at startup from
/// the configured secret and injected through `AppState` - no ambient
/// process-global key material.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    /// Issue a token for an authenticated staff user.
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_uuid(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::JwtKeys;
    use chrono::Utc;
    use rollcall_model::{Role, User, UserId};

    fn teacher() -> User {
        User {
            id: UserId::new(),
            username: "bu.ratna".to_string(),
            password_hash: String::new(),
            role: Role::Teacher,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_tokens_verify_and_carry_role() {
        let keys = JwtKeys::new("test-secret", 8);
        let user = teacher();

        let token = keys.issue(&user).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_uuid());
        assert_eq!(claims.username, "bu.ratna");
        assert_eq!(claims.role, Role::Teacher);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = JwtKeys::new("secret-a", 8).issue(&teacher()).unwrap();
        assert!(JwtKeys::new("secret-b", 8).verify(&token).is_err());
    }
}
