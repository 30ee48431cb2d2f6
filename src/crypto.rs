use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use rand_core::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("encryption error")]
    Encrypt,
    #[error("decryption error")]
    Decrypt,
    #[error("invalid key")]
    InvalidKey,
    #[error("payload encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// AES-256-GCM sealing for values kept on local disk. Output is base64 of
/// `nonce || ciphertext`.
#[derive(Clone)]
pub struct Crypto {
    cipher: Aes256Gcm,
}

impl Crypto {
    pub fn from_base64_key(key_b64: &str) -> Result<Self, CryptoError> {
        let key_bytes = general_purpose::STANDARD
            .decode(key_b64.trim())
            .map_err(|_| CryptoError::InvalidKey)?;
        Self::from_key_bytes(&key_bytes)
    }

    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, CryptoError> {
        if key_bytes.len() != 32 {
            return Err(CryptoError::InvalidKey);
        }
        let cipher = Aes256Gcm::new_from_slice(key_bytes).map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self { cipher })
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let mut ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::Encrypt)?;
        let mut combined = nonce_bytes.to_vec();
        combined.append(&mut ciphertext);
        Ok(general_purpose::STANDARD.encode(combined))
    }

    pub fn open(&self, sealed: &str) -> Result<Vec<u8>, CryptoError> {
        let data = general_purpose::STANDARD
            .decode(sealed)
            .map_err(|_| CryptoError::Decrypt)?;
        if data.len() <= NONCE_LEN {
            return Err(CryptoError::Decrypt);
        }
        let (nonce_bytes, cipher_bytes) = data.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), cipher_bytes)
            .map_err(|_| CryptoError::Decrypt)
    }

    pub fn seal_json<T: Serialize>(&self, value: &T) -> Result<String, CryptoError> {
        let bytes = serde_json::to_vec(value)?;
        self.seal(&bytes)
    }

    pub fn open_json<T: DeserializeOwned>(&self, sealed: &str) -> Result<T, CryptoError> {
        let bytes = self.open(sealed)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn crypto() -> Crypto {
        Crypto::from_key_bytes(&[7u8; 32]).unwrap()
    }

    #[test]
    fn sealed_json_opens_with_same_key() {
        let c = crypto();
        let sealed = c.seal_json(&json!({"day": 3})).unwrap();
        assert!(!sealed.contains("day"));
        let value: serde_json::Value = c.open_json(&sealed).unwrap();
        assert_eq!(value["day"], 3);
    }

    #[test]
    fn other_key_cannot_open() {
        let sealed = crypto().seal(b"plan").unwrap();
        let other = Crypto::from_key_bytes(&[8u8; 32]).unwrap();
        assert!(matches!(other.open(&sealed), Err(CryptoError::Decrypt)));
    }

    #[test]
    fn rejects_short_keys() {
        assert!(matches!(Crypto::from_key_bytes(&[1u8; 16]), Err(CryptoError::InvalidKey)));
        assert!(matches!(Crypto::from_base64_key("not base64!"), Err(CryptoError::InvalidKey)));
        let key = general_purpose::STANDARD.encode([3u8; 32]);
        assert!(Crypto::from_base64_key(&key).is_ok());
    }
}
