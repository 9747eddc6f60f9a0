//! Claimant-pipeline test harness
//!
//! Step definitions and client plumbing for driving the claimant data
//! pipeline through its external interfaces:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Scenario Flow                             │
//! ├────────────────────────────────────────────────────────────────┤
//! │  1. Load harness config (endpoints, topics, poll settings)     │
//! │  2. Issue a data key from the key service                      │
//! │  3. Generate fixtures (valid / missing-id / mixed parity)      │
//! │  4. Encrypt payloads and publish envelopes to source topics    │
//! │  5. Poll downstream state until it appears:                    │
//! │     - committed consumer-group offsets                         │
//! │     - database row counts and contents                         │
//! │     - metric samples                                           │
//! │  6. Assert expected state; mismatch fails the scenario         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Polling is bounded: every wait carries an explicit deadline and a fixed
//! retry interval, so a dead pipeline surfaces as a timeout error rather
//! than a hung suite.

pub mod aws;
pub mod config;
pub mod crypto;
pub mod database;
pub mod dks;
pub mod envelope;
pub mod error;
pub mod fixtures;
pub mod metrics;
pub mod offsets;
pub mod poll;
pub mod publisher;
pub mod scenario;

// Re-export main types for convenience
pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use scenario::ScenarioContext;
