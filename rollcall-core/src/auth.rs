use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use rollcall_model::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, RosterError};

/// Bearer-token claims shared between token issuance and validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Password hashing for staff credentials.
///
/// Credential storage is commodity here: Argon2 with per-password salts,
/// verified in constant time by the argon2 crate itself.
#[derive(Debug, Default, Clone)]
pub struct AuthCrypto;

impl AuthCrypto {
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| RosterError::Internal(format!("Failed to hash password: {e}")))?;
        Ok(hash.to_string())
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::AuthCrypto;

    #[test]
    fn hash_then_verify_accepts_matching_password() {
        let crypto = AuthCrypto;
        let hash = crypto.hash_password("dismissal-2025").unwrap();
        assert!(crypto.verify_password("dismissal-2025", &hash));
        assert!(!crypto.verify_password("dismissal-2024", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        let crypto = AuthCrypto;
        assert!(!crypto.verify_password("anything", "not-a-phc-string"));
    }
}
