//! # claimant-harness
//!
//! Integration-test harness for the claimant data pipeline. The pipeline
//! under test consumes encrypted entity records from Kafka, decrypts and
//! transforms them, and persists them to MySQL while publishing metrics;
//! this crate drives it from the outside:
//!
//! - **Fixture generation**: synthetic claimant, contract and statement
//!   records, with malformed and mixed-validity variants
//! - **Envelope encryption**: AES-CTR payload encryption under a data key
//!   issued by the key service, wrapped in the pipeline's JSON envelope
//! - **Publishing**: keyed sends to the pipeline's source topics
//! - **Eventual-consistency assertions**: bounded polling of committed
//!   consumer offsets, database rows and metric samples
//!
//! Steps run strictly sequentially per scenario; the only suspension is the
//! sleep between poll attempts.

pub mod harness;

// Re-export the types most scenarios touch
pub use harness::config::HarnessConfig;
pub use harness::error::{HarnessError, HarnessResult};
pub use harness::fixtures::{EntityKind, Validity};
pub use harness::scenario::ScenarioContext;
