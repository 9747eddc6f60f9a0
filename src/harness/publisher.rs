//! Fixture publishing
//!
//! Serializes envelopes to bytes and sends each with a key equal to the
//! fixture index. Delivery relies on the client's defaults; the producer is
//! dropped once the loop completes, flushing on the way out.

use super::config::HarnessConfig;
use super::envelope::Envelope;
use super::error::{HarnessError, HarnessResult};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

fn create_producer(bootstrap_servers: &str) -> HarnessResult<FutureProducer> {
    ClientConfig::new()
        .set("bootstrap.servers", bootstrap_servers)
        .set("message.timeout.ms", "5000")
        .create()
        .map_err(|e| HarnessError::KafkaError {
            message: "failed to create producer".to_string(),
            topic: None,
            source: Some(e.to_string()),
        })
}

/// Publish envelopes to `topic`, keyed by position in the batch. Returns
/// the number of messages sent.
pub async fn publish_envelopes(
    config: &HarnessConfig,
    topic: &str,
    envelopes: &[Envelope],
) -> HarnessResult<usize> {
    let producer = create_producer(&config.bootstrap_servers)?;

    for (index, envelope) in envelopes.iter().enumerate() {
        let key = index.to_string();
        let payload = envelope.to_bytes()?;
        let record = FutureRecord::to(topic).key(&key).payload(&payload);

        producer
            .send(record, SEND_TIMEOUT)
            .await
            .map_err(|(e, _)| HarnessError::KafkaError {
                message: format!("failed to send message {}", index),
                topic: Some(topic.to_string()),
                source: Some(e.to_string()),
            })?;
        log::debug!("Sent {} to {}", index, topic);
    }

    log::info!("Published {} envelope(s) to {}", envelopes.len(), topic);
    Ok(envelopes.len())
}

/// Publish `count` bare `message-{i}` payloads to `topic`, keyed by index.
/// Used by the plain queue-consumption scenario.
pub async fn publish_raw(config: &HarnessConfig, topic: &str, count: usize) -> HarnessResult<usize> {
    let producer = create_producer(&config.bootstrap_servers)?;

    for index in 0..count {
        let key = index.to_string();
        let payload = format!("message-{}", index);
        let record = FutureRecord::to(topic).key(&key).payload(&payload);

        producer
            .send(record, SEND_TIMEOUT)
            .await
            .map_err(|(e, _)| HarnessError::KafkaError {
                message: format!("failed to send message {}", index),
                topic: Some(topic.to_string()),
                source: Some(e.to_string()),
            })?;
        log::debug!("Sent {}", index);
    }

    log::info!("Published {} raw message(s) to {}", count, topic);
    Ok(count)
}
