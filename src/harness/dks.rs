//! Data-key service client
//!
//! Talks to the key-issuance service over mutual TLS. Issuance returns a
//! plaintext/ciphertext data-key pair; the decrypt endpoint unwraps a
//! previously issued key. Each decrypt call carries a fresh correlation id
//! so failures can be traced in the service's logs.

use super::config::DksConfig;
use super::error::{HarnessError, HarnessResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

/// A data key issued by the service
#[derive(Debug, Clone)]
pub struct IssuedDataKey {
    /// Key-encryption-key id the data key is wrapped under
    pub key_id: String,
    /// Unwrapped key material, used by the harness to encrypt payloads
    pub plaintext_key: Vec<u8>,
    /// Wrapped form, carried in envelope encryption blocks
    pub ciphertext_key: String,
}

#[derive(Debug, Deserialize)]
struct DataKeyResponse {
    #[serde(rename = "dataKeyEncryptionKeyId")]
    data_key_encryption_key_id: String,
    #[serde(rename = "plaintextDataKey")]
    plaintext_data_key: String,
    #[serde(rename = "ciphertextDataKey")]
    ciphertext_data_key: String,
}

#[derive(Debug, Deserialize)]
struct DecryptResponse {
    #[serde(rename = "plaintextDataKey")]
    plaintext_data_key: String,
}

pub struct DataKeyService {
    client: reqwest::Client,
    url: String,
}

impl DataKeyService {
    /// Build a client from config; identity and CA material are loaded
    /// eagerly so a bad path fails the scenario before any publishing
    pub fn new(config: &DksConfig) -> HarnessResult<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(path) = &config.identity_pem {
            let pem = read_pem(path)?;
            let identity =
                reqwest::Identity::from_pem(&pem).map_err(|e| HarnessError::KeyServiceError {
                    message: "failed to load client identity".to_string(),
                    source: Some(e.to_string()),
                })?;
            builder = builder.identity(identity);
        }

        if let Some(path) = &config.ca_pem {
            let pem = read_pem(path)?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                HarnessError::KeyServiceError {
                    message: "failed to load CA certificate".to_string(),
                    source: Some(e.to_string()),
                }
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        let client = builder.build().map_err(|e| HarnessError::KeyServiceError {
            message: "failed to build HTTP client".to_string(),
            source: Some(e.to_string()),
        })?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Request a fresh data key
    pub async fn issue(&self) -> HarnessResult<IssuedDataKey> {
        let url = format!("{}/datakey", self.url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| request_failed(&url, e))?;

        let response = check_status("datakey issuance", response)?;
        let body: DataKeyResponse =
            response
                .json()
                .await
                .map_err(|e| HarnessError::KeyServiceError {
                    message: "unparseable datakey response".to_string(),
                    source: Some(e.to_string()),
                })?;

        let plaintext_key = BASE64
            .decode(body.plaintext_data_key.as_bytes())
            .map_err(|e| HarnessError::KeyServiceError {
                message: "plaintext data key is not valid base64".to_string(),
                source: Some(e.to_string()),
            })?;

        log::info!(
            "Issued data key under kek '{}'",
            body.data_key_encryption_key_id
        );
        Ok(IssuedDataKey {
            key_id: body.data_key_encryption_key_id,
            plaintext_key,
            ciphertext_key: body.ciphertext_data_key,
        })
    }

    /// Unwrap a previously issued data key
    pub async fn decrypt_key(&self, key_id: &str, encrypted_key: &str) -> HarnessResult<Vec<u8>> {
        let correlation_id = Uuid::new_v4().to_string();
        let url = format!("{}/datakey/actions/decrypt", self.url);

        let response = self
            .client
            .post(&url)
            .query(&[("keyId", key_id), ("correlationId", correlation_id.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(encrypted_key.to_string())
            .send()
            .await
            .map_err(|e| request_failed(&url, e))?;

        let response = check_status("datakey decrypt", response)?;
        let body: DecryptResponse =
            response
                .json()
                .await
                .map_err(|e| HarnessError::KeyServiceError {
                    message: format!(
                        "unparseable decrypt response (correlation id {})",
                        correlation_id
                    ),
                    source: Some(e.to_string()),
                })?;

        BASE64
            .decode(body.plaintext_data_key.as_bytes())
            .map_err(|e| HarnessError::KeyServiceError {
                message: "decrypted data key is not valid base64".to_string(),
                source: Some(e.to_string()),
            })
    }
}

fn read_pem(path: &Path) -> HarnessResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| HarnessError::IoError {
        message: e.to_string(),
        path: path.display().to_string(),
    })
}

fn request_failed(url: &str, err: reqwest::Error) -> HarnessError {
    HarnessError::KeyServiceError {
        message: format!("request to {} failed", url),
        source: Some(err.to_string()),
    }
}

fn check_status(
    operation: &str,
    response: reqwest::Response,
) -> HarnessResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(HarnessError::KeyServiceError {
            message: format!("{} returned {}", operation, status),
            source: None,
        })
    }
}
