//! Envelope encryption for OAuth tokens at rest, grounded in the teacher's
//! `everruns-storage::encryption` module and trimmed to what
//! `UserServiceConnection` needs: no key-rotation bookkeeping beyond "try the
//! primary key, fall back to the previous one".

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{Context, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Hashes a plaintext password for `User.password_hash` (§3), used only by
/// the Seeder's fixed admin credential — the login path that verifies it is
/// out of scope for this core.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))
}

/// Verifies a plaintext password against a hash produced by [`hash_password`].
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("invalid password hash: {e}"))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EncryptedPayload {
    nonce: String,
    ciphertext: String,
}

/// Encrypts and decrypts provider OAuth tokens before they reach Postgres.
#[derive(Clone)]
pub struct TokenCipher {
    primary: Aes256Gcm,
    previous: Option<Aes256Gcm>,
}

impl TokenCipher {
    /// `primary_key`/`previous_key` are base64-encoded 32-byte AES-256 keys.
    pub fn new(primary_key: &str, previous_key: Option<&str>) -> Result<Self> {
        Ok(Self {
            primary: Self::parse_key(primary_key)?,
            previous: previous_key.map(Self::parse_key).transpose()?,
        })
    }

    /// `AREA_TOKEN_ENCRYPTION_KEY` is required; `AREA_TOKEN_ENCRYPTION_KEY_PREVIOUS`
    /// is consulted only when decryption with the primary key fails, so a key
    /// can be rotated without invalidating connections encrypted under the old one.
    pub fn from_env() -> Result<Self> {
        let primary = std::env::var("AREA_TOKEN_ENCRYPTION_KEY")
            .context("AREA_TOKEN_ENCRYPTION_KEY environment variable not set")?;
        let previous = std::env::var("AREA_TOKEN_ENCRYPTION_KEY_PREVIOUS").ok();
        Self::new(&primary, previous.as_deref())
    }

    fn parse_key(key_b64: &str) -> Result<Aes256Gcm> {
        let bytes = BASE64
            .decode(key_b64)
            .context("failed to decode encryption key from base64")?;
        if bytes.len() != KEY_SIZE {
            anyhow::bail!("encryption key must be {KEY_SIZE} bytes, got {}", bytes.len());
        }
        Aes256Gcm::new_from_slice(&bytes).map_err(|e| anyhow::anyhow!("invalid encryption key: {e}"))
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .primary
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| anyhow::anyhow!("token encryption failed: {e}"))?;

        let payload = EncryptedPayload {
            nonce: BASE64.encode(nonce_bytes),
            ciphertext: BASE64.encode(ciphertext),
        };
        serde_json::to_vec(&payload).context("failed to serialize encrypted token")
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<String> {
        let payload: EncryptedPayload =
            serde_json::from_slice(data).context("failed to parse encrypted token payload")?;
        let nonce_bytes = BASE64.decode(&payload.nonce).context("bad nonce encoding")?;
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = BASE64
            .decode(&payload.ciphertext)
            .context("bad ciphertext encoding")?;

        let plaintext = match self.primary.decrypt(nonce, ciphertext.as_ref()) {
            Ok(plaintext) => plaintext,
            Err(_) => match &self.previous {
                Some(previous) => previous
                    .decrypt(nonce, ciphertext.as_ref())
                    .map_err(|_| anyhow::anyhow!("token decryption failed under all available keys"))?,
                None => anyhow::bail!("token decryption failed under all available keys"),
            },
        };

        String::from_utf8(plaintext).context("decrypted token is not valid UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> String {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        BASE64.encode(bytes)
    }

    #[test]
    fn round_trips_a_token() {
        let cipher = TokenCipher::new(&key(), None).unwrap();
        let encrypted = cipher.encrypt("ya29.secret-access-token").unwrap();
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), "ya29.secret-access-token");
    }

    #[test]
    fn falls_back_to_previous_key_after_rotation() {
        let old_key = key();
        let new_key = key();
        let old_cipher = TokenCipher::new(&old_key, None).unwrap();
        let encrypted = old_cipher.encrypt("refresh-token-abc").unwrap();

        let rotated_cipher = TokenCipher::new(&new_key, Some(&old_key)).unwrap();
        assert_eq!(rotated_cipher.decrypt(&encrypted).unwrap(), "refresh-token-abc");
    }

    #[test]
    fn rejects_unknown_keys() {
        let cipher_a = TokenCipher::new(&key(), None).unwrap();
        let cipher_b = TokenCipher::new(&key(), None).unwrap();
        let encrypted = cipher_a.encrypt("secret").unwrap();
        assert!(cipher_b.decrypt(&encrypted).is_err());
    }

    #[test]
    fn password_hash_round_trips_and_rejects_wrong_password() {
        let hash = hash_password("Admin123!").unwrap();
        assert!(verify_password("Admin123!", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }
}
