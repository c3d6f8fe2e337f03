//! Simulated engine temperature sensor.
//!
//! This library provides a read-and-publish task that sends simulated engine
//! temperature readings to an MQTT broker, together with the MQTT binding,
//! configuration and scheduling used by the binaries.

pub mod client;
pub mod config;
pub mod error;
pub mod instance_lock;
pub mod logging;
pub mod message;
pub mod mqtt;
pub mod random;
pub mod reading;
pub mod scheduler;
pub mod task;

#[cfg(test)]
mod testing;

pub use client::MessagingClient;
pub use error::{PublishError, SensorError};
pub use message::{Message, QualityOfService};
pub use random::RandomSource;
pub use reading::Reading;
pub use task::{PublishOutcome, SensorPublishTask};
