//! Outbound MQTT messages and the temperature payload format.
//!
//! Readings travel as ASCII text of the form `T:84.37`: a `T:` prefix
//! followed by the temperature with two fractional digits.

use crate::reading::Reading;
use rumqttc::QoS;
use serde::{Deserialize, Serialize};

/// Prefix of every temperature payload.
pub const PAYLOAD_PREFIX: &str = "T:";

/// Minimum width of the numeric field, decimal point included.
const MIN_FIELD_WIDTH: usize = 4;

/// MQTT delivery-quality level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QualityOfService {
    /// Fire and forget, no acknowledgement or redelivery.
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl QualityOfService {
    /// Numeric level as carried in the MQTT fixed header.
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl From<QualityOfService> for QoS {
    fn from(qos: QualityOfService) -> Self {
        match qos {
            QualityOfService::AtMostOnce => QoS::AtMostOnce,
            QualityOfService::AtLeastOnce => QoS::AtLeastOnce,
            QualityOfService::ExactlyOnce => QoS::ExactlyOnce,
        }
    }
}

/// A message ready to hand to a messaging client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    topic: String,
    payload: Vec<u8>,
    qos: QualityOfService,
    retained: bool,
}

impl Message {
    pub fn new(
        topic: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        qos: QualityOfService,
        retained: bool,
    ) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos,
            retained,
        }
    }

    /// Build the message for a temperature reading.
    ///
    /// Readings are sent at most once and retained, so a new subscriber
    /// immediately sees the last known temperature.
    pub fn temperature(topic: impl Into<String>, reading: Reading) -> Self {
        Self::new(
            topic,
            format_payload(reading),
            QualityOfService::AtMostOnce,
            true,
        )
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn qos(&self) -> QualityOfService {
        self.qos
    }

    pub fn retained(&self) -> bool {
        self.retained
    }

    /// Consume the message, returning its payload bytes.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Format a reading as `T:` plus the value to two decimals.
///
/// Rounding is half-up on the value scaled by 100, so a reading of 99.998
/// becomes `T:100.00`.
pub fn format_payload(reading: Reading) -> Vec<u8> {
    format!(
        "{}{:0>width$}",
        PAYLOAD_PREFIX,
        reading.to_string(),
        width = MIN_FIELD_WIDTH
    )
    .into_bytes()
}

/// Decode a temperature payload back to its numeric value.
///
/// Returns `None` for anything that is not `T:` followed by an unsigned
/// decimal with exactly two fractional digits.
pub fn parse_payload(payload: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(payload).ok()?;
    let number = text.strip_prefix(PAYLOAD_PREFIX)?;
    let (whole, fraction) = number.split_once('.')?;

    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) || !is_digits(fraction) || fraction.len() != 2 {
        return None;
    }

    number.parse().ok()
}
