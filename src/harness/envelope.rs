//! Pipeline message envelopes
//!
//! The wire format the pipeline consumes:
//!
//! ```json
//! {
//!   "traceId": "...", "unitOfWorkId": "...", "@type": "V4",
//!   "message": {
//!     "@type": "MONGO_INSERT",
//!     "_id": {"citizenId": "..."},
//!     "_lastModifiedDateTime": "2020-08-05T07:07:00.105+0000",
//!     "db": "core", "collection": "claimant",
//!     "dbObject": "<base64 ciphertext>",
//!     "encryption": {
//!       "encryptedEncryptionKey": "...",
//!       "keyEncryptionKeyId": "...",
//!       "initialisationVector": "..."
//!     }
//!   },
//!   "version": "...", "timestamp": "2020-08-05T07:07:00.105+0000"
//! }
//! ```
//!
//! Envelopes are constructed per message, serialized, sent, and discarded.

use super::crypto;
use super::dks::IssuedDataKey;
use super::error::HarnessResult;
use super::fixtures::EntityKind;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Envelope schema version tag
pub const ENVELOPE_TYPE: &str = "V4";

/// Version string stamped on harness-built envelopes
const HARNESS_VERSION: &str = "core-4.harness.1";

/// Pipeline timestamp format, `2020-08-05T07:07:00.105+0000`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Database action carried in the inner message's `@type` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatabaseAction {
    MongoInsert,
    MongoUpdate,
    MongoDelete,
}

/// Encryption metadata for the `dbObject` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionBlock {
    #[serde(rename = "encryptedEncryptionKey")]
    pub encrypted_encryption_key: String,
    #[serde(rename = "keyEncryptionKeyId")]
    pub key_encryption_key_id: String,
    #[serde(rename = "initialisationVector")]
    pub initialisation_vector: String,
}

/// Inner message body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(rename = "@type")]
    pub action: DatabaseAction,
    #[serde(rename = "_id")]
    pub id: Value,
    #[serde(rename = "_lastModifiedDateTime")]
    pub last_modified_date_time: String,
    pub db: String,
    pub collection: String,
    #[serde(rename = "dbObject")]
    pub db_object: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionBlock>,
}

/// Outer envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "traceId")]
    pub trace_id: String,
    #[serde(rename = "unitOfWorkId")]
    pub unit_of_work_id: String,
    #[serde(rename = "@type")]
    pub envelope_type: String,
    pub message: MessageBody,
    pub version: String,
    pub timestamp: String,
}

impl Envelope {
    /// Build an envelope whose `dbObject` is the record encrypted with
    /// AES-CTR under the issued data key. A fresh IV is drawn per call, so
    /// two envelopes for the same record never share ciphertext.
    pub fn encrypted(
        kind: EntityKind,
        action: DatabaseAction,
        record: &Value,
        data_key: &IssuedDataKey,
    ) -> HarnessResult<Self> {
        let serialized = serde_json::to_string(record)?;
        let payload = crypto::encrypt(&data_key.plaintext_key, serialized.as_bytes())?;
        Ok(Self::build(
            kind,
            action,
            record,
            payload.ciphertext,
            Some(EncryptionBlock {
                encrypted_encryption_key: data_key.ciphertext_key.clone(),
                key_encryption_key_id: data_key.key_id.clone(),
                initialisation_vector: payload.initialisation_vector,
            }),
        ))
    }

    /// Build an envelope with the record carried as plain JSON text, for
    /// scenarios that deliberately skip the encryption block
    pub fn plaintext(kind: EntityKind, action: DatabaseAction, record: &Value) -> Self {
        let serialized = record.to_string();
        Self::build(kind, action, record, serialized, None)
    }

    fn build(
        kind: EntityKind,
        action: DatabaseAction,
        record: &Value,
        db_object: String,
        encryption: Option<EncryptionBlock>,
    ) -> Self {
        let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        Envelope {
            trace_id: Uuid::new_v4().to_string(),
            unit_of_work_id: Uuid::new_v4().to_string(),
            envelope_type: ENVELOPE_TYPE.to_string(),
            message: MessageBody {
                action,
                id: record.get("_id").cloned().unwrap_or_else(|| json!({})),
                last_modified_date_time: now.clone(),
                db: kind.db().to_string(),
                collection: kind.collection().to_string(),
                db_object,
                encryption,
            },
            version: HARNESS_VERSION.to_string(),
            timestamp: now,
        }
    }

    /// Serialized wire bytes
    pub fn to_bytes(&self) -> HarnessResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
