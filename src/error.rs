use crate::instance_lock::InstanceLockError;
use thiserror::Error as ThisError;

/// Boxed cause carried by a [`PublishError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A publish call rejected by the messaging client.
///
/// Carries the topic that was targeted and the transport failure that caused
/// the rejection, available through [`std::error::Error::source`].
#[derive(ThisError, Debug)]
#[error("Failed to publish to {topic}: {source}")]
pub struct PublishError {
    topic: String,
    #[source]
    source: BoxError,
}

impl PublishError {
    pub fn new(topic: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            topic: topic.into(),
            source: source.into(),
        }
    }

    /// Topic the failed message was addressed to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The underlying transport failure.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.source.as_ref()
    }
}

#[derive(ThisError, Debug)]
pub enum SensorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    InstanceLock(#[from] InstanceLockError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SensorError>;
