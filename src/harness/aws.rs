//! AWS service-emulation client
//!
//! The stack runs KMS, SSM and Secrets Manager behind one local emulation
//! endpoint speaking the x-amz-json-1.1 target protocol. Three calls are
//! needed: unwrapping a data key, fetching the nino salt parameter, and
//! fetching the database credentials secret.

use super::config::AwsConfig;
use super::error::{HarnessError, HarnessResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};

const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const KMS_DECRYPT: &str = "TrentService.Decrypt";
const SSM_GET_PARAMETER: &str = "AmazonSSM.GetParameter";
const SECRETS_GET_VALUE: &str = "secretsmanager.GetSecretValue";

/// Database credentials as stored in the secrets endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseCredentials {
    #[serde(rename = "dbInstanceIdentifier")]
    pub db_instance_identifier: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

pub struct AwsEmulation {
    client: reqwest::Client,
    endpoint: String,
}

impl AwsEmulation {
    pub fn new(config: &AwsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
        }
    }

    /// KMS Decrypt: unwrap a data key
    pub async fn decrypt_wrapped_key(&self, ciphertext_b64: &str) -> HarnessResult<Vec<u8>> {
        let body = self
            .call(KMS_DECRYPT, json!({ "CiphertextBlob": ciphertext_b64 }))
            .await?;
        let plaintext = string_field(&body, "Plaintext")?;
        BASE64
            .decode(plaintext.as_bytes())
            .map_err(|e| HarnessError::KeyServiceError {
                message: "KMS plaintext is not valid base64".to_string(),
                source: Some(e.to_string()),
            })
    }

    /// SSM GetParameter with decryption, used for the nino salt
    pub async fn parameter(&self, name: &str) -> HarnessResult<String> {
        let body = self
            .call(
                SSM_GET_PARAMETER,
                json!({ "Name": name, "WithDecryption": true }),
            )
            .await?;
        string_field(&body["Parameter"], "Value")
    }

    /// Secrets Manager GetSecretValue, raw secret string
    pub async fn secret_string(&self, secret_id: &str) -> HarnessResult<String> {
        let body = self
            .call(SECRETS_GET_VALUE, json!({ "SecretId": secret_id }))
            .await?;
        string_field(&body, "SecretString")
    }

    /// Database credentials from the named secret's JSON value
    pub async fn database_credentials(
        &self,
        secret_id: &str,
    ) -> HarnessResult<DatabaseCredentials> {
        let secret = self.secret_string(secret_id).await?;
        serde_json::from_str(&secret).map_err(|e| HarnessError::KeyServiceError {
            message: format!("secret '{}' is not a credentials document", secret_id),
            source: Some(e.to_string()),
        })
    }

    async fn call(&self, target: &str, body: Value) -> HarnessResult<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", target)
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| HarnessError::KeyServiceError {
                message: format!("{} request failed", target),
                source: Some(e.to_string()),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarnessError::KeyServiceError {
                message: format!("{} returned {}", target, status),
                source: None,
            });
        }

        response
            .json()
            .await
            .map_err(|e| HarnessError::KeyServiceError {
                message: format!("{} returned an unparseable body", target),
                source: Some(e.to_string()),
            })
    }
}

fn string_field(value: &Value, field: &str) -> HarnessResult<String> {
    value[field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| HarnessError::KeyServiceError {
            message: format!("response missing '{}' field", field),
            source: None,
        })
}
