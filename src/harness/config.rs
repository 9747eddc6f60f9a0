//! Harness configuration
//!
//! Defines the harness config file format: broker endpoints, pipeline
//! topics and tables, key-service and AWS-emulation endpoints, and poll
//! settings. Every field has a default matching the docker-compose stack
//! the scenarios run against, so an empty file is a valid config.

use super::error::{HarnessError, HarnessResult};
use super::fixtures::EntityKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Kafka bootstrap servers
    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,

    /// Consumer group of the pipeline under test (the harness reads this
    /// group's committed offsets, it never joins the group)
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,

    /// Topic used by the plain queue-consumption scenario
    #[serde(default = "default_subscribed_topic")]
    pub subscribed_topic: String,

    /// Source topics per entity kind
    #[serde(default)]
    pub topics: TopicConfig,

    /// Target tables per entity kind
    #[serde(default)]
    pub tables: TableConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub dks: DksConfig,

    #[serde(default)]
    pub aws: AwsConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    #[serde(default = "default_claimant_topic")]
    pub claimant: String,
    #[serde(default = "default_contract_topic")]
    pub contract: String,
    #[serde(default = "default_statement_topic")]
    pub statement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_claimant_table")]
    pub claimant: String,
    #[serde(default = "default_contract_table")]
    pub contract: String,
    #[serde(default = "default_statement_table")]
    pub statement: String,
}

/// Database connection settings. When `credentials_secret` is set the
/// username and password here are ignored and the credentials JSON is
/// fetched from the secrets endpoint instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_host")]
    pub host: String,
    #[serde(default = "default_database_port")]
    pub port: u16,
    #[serde(default = "default_database_schema")]
    pub schema: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub credentials_secret: Option<String>,
}

/// Data-key service endpoint and mutual-TLS material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DksConfig {
    #[serde(default = "default_dks_url")]
    pub url: String,
    /// Client certificate + key, concatenated PEM
    #[serde(default)]
    pub identity_pem: Option<PathBuf>,
    /// CA certificate used to verify the service, PEM
    #[serde(default)]
    pub ca_pem: Option<PathBuf>,
}

/// Local AWS service-emulation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_aws_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_salt_parameter")]
    pub salt_parameter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_url")]
    pub url: String,
}

/// Poll pacing: fixed retry interval, explicit deadline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_poll_deadline_ms")]
    pub deadline_ms: u64,
}

fn default_bootstrap_servers() -> String {
    "kafka:9092".to_string()
}

fn default_consumer_group() -> String {
    "claimant-consumers".to_string()
}

fn default_subscribed_topic() -> String {
    "db.database.collection".to_string()
}

fn default_claimant_topic() -> String {
    "db.core.claimant".to_string()
}

fn default_contract_topic() -> String {
    "db.core.contract".to_string()
}

fn default_statement_topic() -> String {
    "db.core.statement".to_string()
}

fn default_claimant_table() -> String {
    "claimant".to_string()
}

fn default_contract_table() -> String {
    "contract".to_string()
}

fn default_statement_table() -> String {
    "statement".to_string()
}

fn default_database_host() -> String {
    "rds".to_string()
}

fn default_database_port() -> u16 {
    3306
}

fn default_database_schema() -> String {
    "claimant".to_string()
}

fn default_dks_url() -> String {
    "https://dks:8443".to_string()
}

fn default_aws_endpoint() -> String {
    "http://aws:4566".to_string()
}

fn default_salt_parameter() -> String {
    "/ucfs/claimant-api/nino/salt".to_string()
}

fn default_metrics_url() -> String {
    "http://prometheus:9090".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_poll_deadline_ms() -> u64 {
    120_000
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            claimant: default_claimant_topic(),
            contract: default_contract_topic(),
            statement: default_statement_topic(),
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            claimant: default_claimant_table(),
            contract: default_contract_table(),
            statement: default_statement_table(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_database_host(),
            port: default_database_port(),
            schema: default_database_schema(),
            username: String::new(),
            password: String::new(),
            credentials_secret: None,
        }
    }
}

impl Default for DksConfig {
    fn default() -> Self {
        Self {
            url: default_dks_url(),
            identity_pem: None,
            ca_pem: None,
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_aws_endpoint(),
            salt_parameter: default_salt_parameter(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            url: default_metrics_url(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            deadline_ms: default_poll_deadline_ms(),
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: default_bootstrap_servers(),
            consumer_group: default_consumer_group(),
            subscribed_topic: default_subscribed_topic(),
            topics: TopicConfig::default(),
            tables: TableConfig::default(),
            database: DatabaseConfig::default(),
            dks: DksConfig::default(),
            aws: AwsConfig::default(),
            metrics: MetricsConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> HarnessResult<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| HarnessError::IoError {
                message: e.to_string(),
                path: path.as_ref().display().to_string(),
            })?;
        let config: HarnessConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate internal consistency
    pub fn validate(&self) -> HarnessResult<()> {
        if self.bootstrap_servers.is_empty() {
            return Err(HarnessError::ConfigError {
                message: "bootstrap_servers must not be empty".to_string(),
            });
        }
        if self.poll.interval_ms == 0 {
            return Err(HarnessError::ConfigError {
                message: "poll.interval_ms must be greater than zero".to_string(),
            });
        }
        if self.poll.deadline_ms < self.poll.interval_ms {
            return Err(HarnessError::ConfigError {
                message: format!(
                    "poll.deadline_ms ({}) is shorter than poll.interval_ms ({})",
                    self.poll.deadline_ms, self.poll.interval_ms
                ),
            });
        }
        if self.dks.identity_pem.is_some() != self.dks.ca_pem.is_some() {
            return Err(HarnessError::ConfigError {
                message: "dks.identity_pem and dks.ca_pem must be set together".to_string(),
            });
        }
        Ok(())
    }

    /// Source topic for an entity kind
    pub fn topic(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Claimant => &self.topics.claimant,
            EntityKind::Contract => &self.topics.contract,
            EntityKind::Statement => &self.topics.statement,
        }
    }

    /// Target table for an entity kind
    pub fn table(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Claimant => &self.tables.claimant,
            EntityKind::Contract => &self.tables.contract,
            EntityKind::Statement => &self.tables.statement,
        }
    }
}
