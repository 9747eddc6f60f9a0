//! Committed-offset reads
//!
//! The pipeline commits its own offsets; the harness only observes them.
//! The consumer handle here carries the pipeline's group id but never
//! subscribes or commits, so reading leaves group state untouched.

use super::config::HarnessConfig;
use super::error::{HarnessError, HarnessResult};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::util::Timeout;
use rdkafka::{Offset, TopicPartitionList};
use std::time::Duration;

const OFFSET_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Read the committed offset for `(topic, partition)` in the pipeline's
/// consumer group. `None` means the group has not committed yet, which
/// pollers treat as an empty read.
pub fn committed_offset(
    config: &HarnessConfig,
    topic: &str,
    partition: i32,
) -> HarnessResult<Option<i64>> {
    let consumer: BaseConsumer = ClientConfig::new()
        .set("bootstrap.servers", &config.bootstrap_servers)
        .set("group.id", &config.consumer_group)
        .set("enable.auto.commit", "false")
        .create()
        .map_err(|e| HarnessError::KafkaError {
            message: "failed to create offset consumer".to_string(),
            topic: Some(topic.to_string()),
            source: Some(e.to_string()),
        })?;

    let mut partitions = TopicPartitionList::new();
    partitions.add_partition(topic, partition);

    let committed = consumer
        .committed_offsets(partitions, Timeout::After(OFFSET_FETCH_TIMEOUT))
        .map_err(|e| HarnessError::KafkaError {
            message: format!(
                "failed to fetch committed offsets for group '{}'",
                config.consumer_group
            ),
            topic: Some(topic.to_string()),
            source: Some(e.to_string()),
        })?;

    let offset = committed
        .elements()
        .first()
        .map(|element| element.offset());

    Ok(match offset {
        Some(Offset::Offset(n)) => Some(n),
        _ => None,
    })
}
