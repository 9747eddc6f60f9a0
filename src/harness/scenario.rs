//! Scenario step definitions
//!
//! Given/then steps in the order the feature files declare them. A
//! `ScenarioContext` carries the config, the issued data key, and what has
//! been published so far; each `then_` step polls downstream state through
//! the bounded poller and asserts against it.
//!
//! Steps construct their own clients and release them before returning;
//! nothing is shared across steps but the context's own bookkeeping.

use super::aws::AwsEmulation;
use super::config::HarnessConfig;
use super::crypto;
use super::database::Database;
use super::dks::{DataKeyService, IssuedDataKey};
use super::envelope::{DatabaseAction, Envelope};
use super::error::{HarnessError, HarnessResult};
use super::fixtures::{self, EntityKind, Validity};
use super::metrics::MetricsService;
use super::offsets;
use super::poll::{self, PollSettings};
use super::publisher;
use serde_json::Value;
use std::collections::HashMap;

/// Tolerance for metric sample comparisons
const NUMERIC_TOLERANCE: f64 = 0.0001;

pub struct ScenarioContext {
    pub config: HarnessConfig,
    settings: PollSettings,
    data_key: Option<IssuedDataKey>,
    published: HashMap<String, usize>,
    fixtures: HashMap<EntityKind, Vec<Value>>,
    upserted: HashMap<EntityKind, usize>,
}

impl ScenarioContext {
    pub fn new(config: HarnessConfig) -> Self {
        let settings = PollSettings::from(&config.poll);
        Self {
            config,
            settings,
            data_key: None,
            published: HashMap::new(),
            fixtures: HashMap::new(),
            upserted: HashMap::new(),
        }
    }

    /// Given a data key has been issued by the key service
    pub async fn given_data_key_issued(&mut self) -> HarnessResult<()> {
        log::info!("Given: a data key has been issued");
        let key = DataKeyService::new(&self.config.dks)?.issue().await?;
        self.data_key = Some(key);
        Ok(())
    }

    /// Given `count` bare messages are posted to the subscribed queue
    pub async fn given_messages_posted(&mut self, count: usize) -> HarnessResult<()> {
        log::info!(
            "Given: {} messages posted to {}",
            count,
            self.config.subscribed_topic
        );
        let topic = self.config.subscribed_topic.clone();
        let sent = publisher::publish_raw(&self.config, &topic, count).await?;
        self.published.insert(topic, sent);
        Ok(())
    }

    /// Given `count` fixtures of `kind` are encrypted and published, under
    /// the chosen validity mode
    pub async fn given_fixtures_published(
        &mut self,
        kind: EntityKind,
        count: usize,
        validity: Validity,
    ) -> HarnessResult<()> {
        log::info!(
            "Given: {} {} fixture(s) published ({:?})",
            count,
            kind,
            validity
        );
        if self.data_key.is_none() {
            self.given_data_key_issued().await?;
        }
        let data_key = self
            .data_key
            .as_ref()
            .ok_or_else(|| scenario_ordering("no data key issued"))?;

        let mut records = Vec::with_capacity(count);
        let mut envelopes = Vec::with_capacity(count);
        for index in 0..count {
            let record = fixtures::generate_with_validity(kind, index, validity);
            envelopes.push(Envelope::encrypted(
                kind,
                DatabaseAction::MongoInsert,
                &record,
                data_key,
            )?);
            records.push(record);
        }

        let topic = self.config.topic(kind).to_string();
        let sent = publisher::publish_envelopes(&self.config, &topic, &envelopes).await?;
        self.published.insert(topic, sent);
        self.fixtures.insert(kind, records);
        Ok(())
    }

    /// Given `count` fixture documents of `kind` are upserted straight
    /// into the store with duplicate-key semantics
    pub async fn given_rows_upserted(
        &mut self,
        kind: EntityKind,
        count: usize,
    ) -> HarnessResult<()> {
        log::info!("Given: {} {} row(s) upserted", count, kind);
        let documents: Vec<String> = (0..count)
            .map(|index| fixtures::generate(kind, index).to_string())
            .collect();

        let db = Database::connect(&self.config).await?;
        let result = db
            .upsert_records(self.config.table(kind), &documents)
            .await;
        db.close().await?;
        let upserted = result?;
        self.upserted.insert(kind, upserted);
        Ok(())
    }

    /// Then the messages posted to the subscribed queue are consumed: the
    /// pipeline's committed offset reaches exactly the published count
    pub async fn then_messages_consumed(&self) -> HarnessResult<()> {
        let topic = self.config.subscribed_topic.clone();
        self.assert_committed_offset(&topic).await
    }

    /// Then the published fixtures of `kind` are consumed from their topic
    pub async fn then_fixtures_consumed(&self, kind: EntityKind) -> HarnessResult<()> {
        let topic = self.config.topic(kind).to_string();
        self.assert_committed_offset(&topic).await
    }

    async fn assert_committed_offset(&self, topic: &str) -> HarnessResult<()> {
        let expected = self.published_count(topic)? as i64;
        log::info!("Then: committed offset on {} reaches {}", topic, expected);

        let config = &self.config;
        let committed = poll::await_value(
            &format!("committed offset on {}", topic),
            self.settings,
            move || {
                let config = config;
                let topic = topic;
                async move { offsets::committed_offset(config, topic, 0) }
            },
        )
        .await?;

        poll::expect_eq("committed offset", &expected, &committed)
    }

    /// Then the table for `kind` holds exactly `expected` rows
    pub async fn then_table_count(&self, kind: EntityKind, expected: i64) -> HarnessResult<()> {
        let table = self.config.table(kind).to_string();
        log::info!("Then: {} holds {} row(s)", table, expected);

        let db = Database::connect(&self.config).await?;
        let result = {
            let db_ref = &db;
            let table_ref = table.as_str();
            poll::await_value(&format!("row count in {}", table), self.settings, move || {
                let db = db_ref;
                let table = table_ref;
                async move {
                    let count = db.row_count(table).await?;
                    Ok((count > 0).then_some(count))
                }
            })
            .await
        };
        db.close().await?;

        poll::expect_eq("row count", &expected, &result?)
    }

    /// Then the upserted rows of `kind` count exactly once despite
    /// duplicate keys
    pub async fn then_upserted_rows_counted(&self, kind: EntityKind) -> HarnessResult<()> {
        let expected = *self
            .upserted
            .get(&kind)
            .ok_or_else(|| scenario_ordering(&format!("no {} rows upserted", kind)))?;
        self.then_table_count(kind, expected as i64).await
    }

    /// Then the claimant fixture at `index` is stored under its salted
    /// nino hash
    pub async fn then_claimant_stored(&self, index: usize) -> HarnessResult<()> {
        let nino = fixtures::nino(index);
        log::info!("Then: claimant with nino {} stored under its hash", nino);

        let salt = AwsEmulation::new(&self.config.aws)
            .parameter(&self.config.aws.salt_parameter)
            .await?;
        let expected_hash = crypto::salted_hash(&nino, &salt);

        let table = self.config.table(EntityKind::Claimant).to_string();
        let db = Database::connect(&self.config).await?;
        let result = {
            let db_ref = &db;
            let table_ref = table.as_str();
            let hash_ref = expected_hash.as_str();
            poll::await_value("claimant row by nino hash", self.settings, move || {
                let db = db_ref;
                let table = table_ref;
                let hash = hash_ref;
                async move { db.claimant_by_nino_hash(table, hash).await }
            })
            .await
        };
        db.close().await?;

        let document: Value = serde_json::from_str(&result?)?;
        let stored_hash = document["nino"].as_str().unwrap_or_default().to_string();
        poll::expect_eq("stored nino hash", &expected_hash, &stored_hash)?;

        let expected_id = fixtures::citizen_id(index);
        let stored_id = document["_id"]["citizenId"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        poll::expect_eq("stored citizen id", &expected_id, &stored_id)
    }

    /// Then the statement fixture at `index` carries a takeHomePay field
    /// that decrypts back to the fixture value
    pub async fn then_statement_take_home_pay_decrypts(&self, index: usize) -> HarnessResult<()> {
        let statement_id = fixtures::statement_id(index);
        log::info!(
            "Then: statement {} takeHomePay decrypts to the fixture value",
            statement_id
        );

        let table = self.config.table(EntityKind::Statement).to_string();
        let db = Database::connect(&self.config).await?;
        let result = {
            let db_ref = &db;
            let table_ref = table.as_str();
            let id_ref = statement_id.as_str();
            poll::await_value("statement row by id", self.settings, move || {
                let db = db_ref;
                let table = table_ref;
                let id = id_ref;
                async move { db.record_by_identifier(table, "statementId", id).await }
            })
            .await
        };
        db.close().await?;

        let document: Value = serde_json::from_str(&result?)?;
        let wrapped_key = document["encryptedTakeHomePay"]["cipherTextBlob"]
            .as_str()
            .ok_or_else(|| HarnessError::AssertionFailed {
                assertion_type: "statement takeHomePay".to_string(),
                expected: "encryptedTakeHomePay.cipherTextBlob present".to_string(),
                actual: "field missing".to_string(),
                message: "stored statement lacks its wrapped data key".to_string(),
            })?;
        let combined = document["takeHomePay"]
            .as_str()
            .ok_or_else(|| HarnessError::AssertionFailed {
                assertion_type: "statement takeHomePay".to_string(),
                expected: "takeHomePay present".to_string(),
                actual: "field missing".to_string(),
                message: "stored statement lacks its encrypted takeHomePay".to_string(),
            })?;

        let data_key = AwsEmulation::new(&self.config.aws)
            .decrypt_wrapped_key(wrapped_key)
            .await?;
        let plaintext = crypto::decrypt_gcm_concatenated(&data_key, combined)?;
        let actual = String::from_utf8(plaintext).map_err(|e| HarnessError::CryptoError {
            message: format!("decrypted takeHomePay is not UTF-8: {}", e),
        })?;

        poll::expect_eq("decrypted takeHomePay", &fixtures::take_home_pay(index), &actual)
    }

    /// Then the metric selected by `query` reaches `expected`
    pub async fn then_metric_reaches(&self, query: &str, expected: f64) -> HarnessResult<()> {
        log::info!("Then: metric '{}' reaches {}", query, expected);

        let metrics = MetricsService::new(&self.config.metrics);
        let sample = {
            let metrics_ref = &metrics;
            poll::await_value(&format!("metric '{}'", query), self.settings, move || {
                let metrics = metrics_ref;
                async move { metrics.sample(query).await }
            })
            .await?
        };

        if (sample - expected).abs() <= NUMERIC_TOLERANCE {
            log::info!("'metric sample' matched: {}", sample);
            Ok(())
        } else {
            Err(HarnessError::AssertionFailed {
                assertion_type: "metric sample".to_string(),
                expected: expected.to_string(),
                actual: sample.to_string(),
                message: format!("metric '{}' did not match expectation", query),
            })
        }
    }

    /// Number of messages published to `topic` by an earlier given step
    pub fn published_count(&self, topic: &str) -> HarnessResult<usize> {
        self.published
            .get(topic)
            .copied()
            .ok_or_else(|| scenario_ordering(&format!("nothing published to {}", topic)))
    }

    /// Fixture records published by an earlier given step
    pub fn fixtures_for(&self, kind: EntityKind) -> Option<&[Value]> {
        self.fixtures.get(&kind).map(Vec::as_slice)
    }
}

fn scenario_ordering(detail: &str) -> HarnessError {
    HarnessError::ConfigError {
        message: format!("scenario ordering: {}", detail),
    }
}
