//! The read-and-publish unit.
//!
//! Each call to [`SensorPublishTask::execute`] publishes at most one
//! simulated temperature reading. The task is stateless apart from the
//! shared client, random source and topic it was built with, so a single
//! instance can be driven from a timer, a worker pool or several tasks at
//! once.

use crate::client::MessagingClient;
use crate::error::PublishError;
use crate::message::Message;
use crate::random::RandomSource;
use crate::reading::Reading;
use log::debug;
use std::sync::Arc;

/// Result of a successful invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PublishOutcome {
    /// The client was not connected; nothing was sent.
    Skipped,
    /// One reading was handed to the client.
    Published(Reading),
}

/// Publishes one simulated engine temperature reading per invocation.
pub struct SensorPublishTask {
    client: Arc<dyn MessagingClient>,
    random: Arc<dyn RandomSource>,
    topic: String,
}

impl SensorPublishTask {
    /// Create a task publishing to `topic`.
    ///
    /// The client stays owned by the caller; the task never closes it.
    pub fn new(
        client: Arc<dyn MessagingClient>,
        random: Arc<dyn RandomSource>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            client,
            random,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish a reading if the client is connected.
    ///
    /// A disconnected client is a normal outcome and yields
    /// [`PublishOutcome::Skipped`]. A failed publish is returned unchanged and
    /// never retried here.
    pub async fn execute(&self) -> Result<PublishOutcome, PublishError> {
        if !self.client.is_connected() {
            debug!("Not connected, skipping publish to {}", self.topic);
            return Ok(PublishOutcome::Skipped);
        }

        let reading = Reading::from_unit(self.random.next_unit());
        let message = Message::temperature(self.topic.as_str(), reading);
        debug!(
            "Publishing to {}: {}",
            self.topic,
            String::from_utf8_lossy(message.payload())
        );

        self.client.publish(&self.topic, message).await?;
        Ok(PublishOutcome::Published(reading))
    }
}
