//! Cipher helpers
//!
//! Covers both directions of the pipeline's encryption contract:
//!
//! - Outbound fixtures are encrypted with AES-256-CTR under an issued data
//!   key, with a fresh random initialisation vector per message (the
//!   counter block is derived from the vector). Same key + plaintext gives
//!   different ciphertext per call; verification decodes and recomputes
//!   rather than comparing ciphertexts.
//! - Stored fields the pipeline produced are verified with AES-256-GCM
//!   (12-byte nonce, 16-byte tag appended to the ciphertext) and with the
//!   salted SHA-512 identifier hash.

use super::error::{HarnessError, HarnessResult};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha512};

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// Data keys are AES-256
pub const DATA_KEY_LEN: usize = 32;

const CTR_IV_LEN: usize = 16;
const GCM_NONCE_LEN: usize = 12;
// 12 nonce bytes encode to exactly 16 base64 characters, which is how the
// pipeline's concatenated iv||ciphertext fields are split
const GCM_NONCE_B64_LEN: usize = 16;

/// Base64-encoded (iv, ciphertext) pair
#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    pub initialisation_vector: String,
    pub ciphertext: String,
}

/// Encrypt a payload with AES-256-CTR under a fresh random IV
pub fn encrypt(data_key: &[u8], plaintext: &[u8]) -> HarnessResult<EncryptedPayload> {
    let mut iv = [0u8; CTR_IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let mut buffer = plaintext.to_vec();
    ctr_keystream(data_key, &iv, &mut buffer)?;

    Ok(EncryptedPayload {
        initialisation_vector: BASE64.encode(iv),
        ciphertext: BASE64.encode(buffer),
    })
}

/// Decrypt an AES-256-CTR payload produced by [`encrypt`]
pub fn decrypt(data_key: &[u8], iv_b64: &str, ciphertext_b64: &str) -> HarnessResult<Vec<u8>> {
    let iv = decoded(iv_b64, "initialisation vector")?;
    let mut buffer = decoded(ciphertext_b64, "ciphertext")?;
    ctr_keystream(data_key, &iv, &mut buffer)?;
    Ok(buffer)
}

/// Encrypt a payload with AES-256-GCM, the mode the pipeline uses for
/// re-encrypted statement fields. The tag is appended to the ciphertext.
pub fn encrypt_gcm(data_key: &[u8], plaintext: &[u8]) -> HarnessResult<EncryptedPayload> {
    let mut nonce = [0u8; GCM_NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let cipher = gcm_cipher(data_key)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| HarnessError::CryptoError {
            message: "GCM encryption failed".to_string(),
        })?;

    Ok(EncryptedPayload {
        initialisation_vector: BASE64.encode(nonce),
        ciphertext: BASE64.encode(ciphertext),
    })
}

/// Decrypt an AES-256-GCM payload; fails if the appended tag does not
/// authenticate
pub fn decrypt_gcm(data_key: &[u8], iv_b64: &str, ciphertext_b64: &str) -> HarnessResult<Vec<u8>> {
    let nonce = decoded(iv_b64, "initialisation vector")?;
    if nonce.len() != GCM_NONCE_LEN {
        return Err(HarnessError::CryptoError {
            message: format!(
                "GCM nonce must be {} bytes, got {}",
                GCM_NONCE_LEN,
                nonce.len()
            ),
        });
    }
    let ciphertext = decoded(ciphertext_b64, "ciphertext")?;

    let cipher = gcm_cipher(data_key)?;
    cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
        .map_err(|_| HarnessError::CryptoError {
            message: "GCM decryption failed, tag mismatch or wrong key".to_string(),
        })
}

/// Decrypt a field stored in the pipeline's concatenated form: the base64
/// nonce (16 characters) immediately followed by the base64 ciphertext.
pub fn decrypt_gcm_concatenated(data_key: &[u8], combined: &str) -> HarnessResult<Vec<u8>> {
    if combined.len() <= GCM_NONCE_B64_LEN {
        return Err(HarnessError::CryptoError {
            message: format!(
                "concatenated field too short to hold a nonce: {} chars",
                combined.len()
            ),
        });
    }
    let (iv_b64, ciphertext_b64) = combined.split_at(GCM_NONCE_B64_LEN);
    decrypt_gcm(data_key, iv_b64, ciphertext_b64)
}

/// Salted SHA-512 hash in the pipeline's encoding: standard base64 with
/// `+` and `/` swapped for `-` and `_`
pub fn salted_hash(value: &str, salt: &str) -> String {
    let digest = Sha512::digest(format!("{}{}", value, salt).as_bytes());
    BASE64.encode(digest).replace('+', "-").replace('/', "_")
}

fn ctr_keystream(data_key: &[u8], iv: &[u8], buffer: &mut [u8]) -> HarnessResult<()> {
    let mut cipher =
        Aes256Ctr::new_from_slices(data_key, iv).map_err(|e| HarnessError::CryptoError {
            message: format!("invalid key or IV length: {}", e),
        })?;
    cipher.apply_keystream(buffer);
    Ok(())
}

fn gcm_cipher(data_key: &[u8]) -> HarnessResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(data_key).map_err(|e| HarnessError::CryptoError {
        message: format!("invalid key length: {}", e),
    })
}

fn decoded(value: &str, what: &str) -> HarnessResult<Vec<u8>> {
    BASE64
        .decode(value.as_bytes())
        .map_err(|e| HarnessError::CryptoError {
            message: format!("failed to decode {}: {}", what, e),
        })
}
