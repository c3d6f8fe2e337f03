//! Messaging client capability consumed by the publish task.
//!
//! Any broker binding can drive a [`SensorPublishTask`](crate::task::SensorPublishTask)
//! by implementing [`MessagingClient`]. The MQTT binding lives in [`crate::mqtt`].

use crate::error::PublishError;
use crate::message::Message;
use async_trait::async_trait;
use std::sync::Arc;

/// Connection-state query plus publish.
///
/// The client is owned elsewhere; users only borrow it through a shared
/// reference and never close or reconfigure it.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Whether the client currently holds a broker connection.
    fn is_connected(&self) -> bool;

    /// Hand a message to the broker for delivery on `topic`.
    async fn publish(&self, topic: &str, message: Message) -> Result<(), PublishError>;
}

#[async_trait]
impl<T: MessagingClient + ?Sized> MessagingClient for Arc<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    async fn publish(&self, topic: &str, message: Message) -> Result<(), PublishError> {
        (**self).publish(topic, message).await
    }
}
