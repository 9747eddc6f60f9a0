//! Envelope wire-format checks
//!
//! The pipeline validates incoming messages against a strict schema, so
//! the harness must emit exactly the field names and nesting the schema
//! expects; these tests pin the serialized shape and prove a published
//! payload decrypts back to the fixture under the envelope's own IV.

use claimant_harness::harness::crypto;
use claimant_harness::harness::dks::IssuedDataKey;
use claimant_harness::harness::envelope::{DatabaseAction, Envelope};
use claimant_harness::harness::fixtures::{self, EntityKind};
use serde_json::Value;

fn test_data_key() -> IssuedDataKey {
    IssuedDataKey {
        key_id: "cloudhsm:7,14".to_string(),
        plaintext_key: (0..crypto::DATA_KEY_LEN as u8).collect(),
        ciphertext_key: "wrapped-key-material==".to_string(),
    }
}

#[test]
fn test_encrypted_envelope_carries_the_pipeline_field_names() {
    let record = fixtures::generate(EntityKind::Claimant, 1);
    let envelope = Envelope::encrypted(
        EntityKind::Claimant,
        DatabaseAction::MongoInsert,
        &record,
        &test_data_key(),
    )
    .unwrap();

    let wire: Value = serde_json::from_slice(&envelope.to_bytes().unwrap()).unwrap();

    assert!(wire["traceId"].is_string());
    assert!(wire["unitOfWorkId"].is_string());
    assert_eq!(wire["@type"], "V4");
    assert!(wire["version"].is_string());
    assert!(wire["timestamp"].is_string());

    let message = &wire["message"];
    assert_eq!(message["@type"], "MONGO_INSERT");
    assert_eq!(message["db"], "core");
    assert_eq!(message["collection"], "claimant");
    assert_eq!(message["_id"]["citizenId"], "citizen-000001");
    assert!(message["_lastModifiedDateTime"].is_string());
    assert!(message["dbObject"].is_string());

    let encryption = &message["encryption"];
    assert_eq!(encryption["keyEncryptionKeyId"], "cloudhsm:7,14");
    assert_eq!(encryption["encryptedEncryptionKey"], "wrapped-key-material==");
    assert!(encryption["initialisationVector"].is_string());
}

#[test]
fn test_db_object_decrypts_under_the_envelope_iv() {
    let key = test_data_key();
    let record = fixtures::generate(EntityKind::Contract, 4);
    let envelope =
        Envelope::encrypted(EntityKind::Contract, DatabaseAction::MongoUpdate, &record, &key)
            .unwrap();

    let block = envelope.message.encryption.as_ref().unwrap();
    let decrypted = crypto::decrypt(
        &key.plaintext_key,
        &block.initialisation_vector,
        &envelope.message.db_object,
    )
    .unwrap();

    let round_tripped: Value = serde_json::from_slice(&decrypted).unwrap();
    assert_eq!(round_tripped, record);
}

#[test]
fn test_two_envelopes_for_one_record_never_share_ciphertext() {
    let key = test_data_key();
    let record = fixtures::generate(EntityKind::Claimant, 9);

    let first =
        Envelope::encrypted(EntityKind::Claimant, DatabaseAction::MongoInsert, &record, &key)
            .unwrap();
    let second =
        Envelope::encrypted(EntityKind::Claimant, DatabaseAction::MongoInsert, &record, &key)
            .unwrap();

    assert_ne!(first.message.db_object, second.message.db_object);
}

#[test]
fn test_plaintext_envelope_omits_the_encryption_block() {
    let record = fixtures::generate(EntityKind::Statement, 2);
    let envelope = Envelope::plaintext(EntityKind::Statement, DatabaseAction::MongoInsert, &record);

    let wire: Value = serde_json::from_slice(&envelope.to_bytes().unwrap()).unwrap();
    assert!(wire["message"].get("encryption").is_none());
    assert_eq!(wire["message"]["collection"], "statement");
}

#[test]
fn test_pipeline_sample_message_deserializes() {
    // Shape lifted from the pipeline's own schema-validation fixtures
    let sample = r#"{
        "traceId": "091f29ab-b6c5-411c-851e-15683ce53c40",
        "unitOfWorkId": "31faa55f-c5e8-4581-8973-383db31ddd77",
        "@type": "V4",
        "message": {
            "@type": "MONGO_INSERT",
            "_id": { "citizenId": "5e9bf692-fa09-4fd6-8c23-ffsd41f4a5e2" },
            "_lastModifiedDateTime": "2019-07-04T07:27:35.104+0000",
            "collection": "claimant",
            "db": "core",
            "dbObject": "xxxxxx",
            "encryption": {
                "keyEncryptionKeyId": "cloudhsm:7,14",
                "initialisationVector": "iv",
                "encryptedEncryptionKey": "=="
            }
        },
        "version": "core-4.release_152.16",
        "timestamp": "2020-08-05T07:07:00.105+0000"
    }"#;

    let envelope: Envelope = serde_json::from_str(sample).unwrap();
    assert_eq!(envelope.envelope_type, "V4");
    assert_eq!(envelope.message.action, DatabaseAction::MongoInsert);
    assert_eq!(envelope.message.collection, "claimant");
    assert_eq!(
        envelope.message.encryption.unwrap().key_encryption_key_id,
        "cloudhsm:7,14"
    );
}
