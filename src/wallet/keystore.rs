//! Password-based key encryption
//!
//! Private keys are sealed with AES-256-GCM under a key stretched from the
//! account password with Argon2. Salt, nonce and ciphertext are stored as
//! base64 text.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use argon2::Argon2;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;

use super::wallet::WalletError;

/// Environment variable consulted before prompting for a password
pub const PASSWORD_ENV: &str = "GLOBALPARAM_PASSWORD";

const SALT_LEN: usize = 16;
const IV_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// A sealed private key as stored in a wallet file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedKey {
    pub ciphertext: String,
    pub salt: String,
    pub iv: String,
}

fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], WalletError> {
    let mut key = [0u8; KEY_LEN];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

fn decode_field(
    name: &str,
    value: &str,
    expected_len: Option<usize>,
) -> Result<Vec<u8>, WalletError> {
    let bytes = BASE64
        .decode(value)
        .map_err(|e| WalletError::CorruptAccount(format!("{} decoding failed: {}", name, e)))?;
    if let Some(len) = expected_len {
        if bytes.len() != len {
            return Err(WalletError::CorruptAccount(format!(
                "{} must be {} bytes, got {}",
                name,
                len,
                bytes.len()
            )));
        }
    }
    Ok(bytes)
}

/// Encrypt secret key bytes under a password with a fresh salt and nonce
pub fn seal(secret: &[u8], password: &str) -> Result<SealedKey, WalletError> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), secret)
        .map_err(|e| WalletError::Encryption(e.to_string()))?;

    Ok(SealedKey {
        ciphertext: BASE64.encode(ciphertext),
        salt: BASE64.encode(salt),
        iv: BASE64.encode(iv),
    })
}

/// Decrypt a sealed key. A wrong password surfaces as `None`.
pub fn open(sealed: &SealedKey, password: &str) -> Result<Option<Vec<u8>>, WalletError> {
    let salt = decode_field("salt", &sealed.salt, None)?;
    let iv = decode_field("iv", &sealed.iv, Some(IV_LEN))?;
    let ciphertext = decode_field("key", &sealed.ciphertext, None)?;

    let key = derive_key(password, &salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    Ok(cipher.decrypt(Nonce::from_slice(&iv), ciphertext.as_ref()).ok())
}

/// Read a password from `GLOBALPARAM_PASSWORD`, or prompt on the terminal
pub fn read_password(prompt: &str) -> Result<String, WalletError> {
    match std::env::var(PASSWORD_ENV) {
        Ok(password) => Ok(password),
        Err(_) => Ok(rpassword::prompt_password(prompt)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let secret = [42u8; 32];
        let sealed = seal(&secret, "correct horse").unwrap();

        assert_eq!(open(&sealed, "correct horse").unwrap(), Some(secret.to_vec()));
        assert_eq!(open(&sealed, "wrong").unwrap(), None);
    }

    #[test]
    fn test_fresh_salt_per_seal() {
        let a = seal(b"secret", "pw").unwrap();
        let b = seal(b"secret", "pw").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_corrupt_fields() {
        let mut sealed = seal(b"secret", "pw").unwrap();
        sealed.iv = BASE64.encode([0u8; 5]);
        assert!(matches!(
            open(&sealed, "pw"),
            Err(WalletError::CorruptAccount(_))
        ));

        sealed.iv = "%%%".to_string();
        assert!(matches!(
            open(&sealed, "pw"),
            Err(WalletError::CorruptAccount(_))
        ));
    }
}
