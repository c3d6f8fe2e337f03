use crate::error::{Result, SensorError};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    load_dotenv_from(Path::new(".env"));
}

/// Load `KEY=value` lines from `env_path` into the process environment.
///
/// Variables that are already set take precedence over the file.
pub fn load_dotenv_from(env_path: &Path) {
    let Ok(content) = fs::read_to_string(env_path) else {
        return;
    };

    for (key, value) in parse_dotenv(&content) {
        if std::env::var(key).is_err() {
            // SAFETY: the binaries call this before building the tokio runtime,
            // while the process is still single-threaded
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Parse `.env` content into key/value pairs, skipping blanks and comments.
fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim().trim_start_matches("export ").trim();
            let mut value = value.trim();

            // Remove surrounding quotes if present
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }

            (!key.is_empty()).then_some((key, value))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub sensor: SensorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u64,
    /// Topic carrying retained `online`/`offline` availability, if any.
    pub availability_topic: Option<String>,
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Topic readings are published to.
    pub topic: String,
    pub interval_ms: u64,
    /// Stop after this many invocations; run forever when unset.
    pub max_runs: Option<u64>,
    /// Seed for reproducible readings; thread-local randomness when unset.
    pub seed: Option<u64>,
}

/// Default client id: a fixed prefix plus a random suffix so that two
/// unconfigured sensors never collide on the broker.
pub fn default_client_id() -> String {
    format!("engine-temp-sensor-{}", uuid::Uuid::new_v4().simple())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig {
                broker_host: "localhost".to_string(),
                broker_port: 1883,
                client_id: default_client_id(),
                username: None,
                password: None,
                keep_alive_secs: 30,
                availability_topic: None,
                reconnect_delay_ms: 5000,
            },
            sensor: SensorConfig {
                topic: "engine/temperature".to_string(),
                interval_ms: 1000,
                max_runs: None,
                seed: None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from defaults overridden by `lookup`.
    ///
    /// Numeric values that fail to parse are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // MQTT configuration
        if let Some(host) = lookup("MQTT_BROKER_HOST") {
            config.mqtt.broker_host = host;
        }
        if let Some(port) = parse_var(&lookup, "MQTT_BROKER_PORT") {
            config.mqtt.broker_port = port;
        }
        if let Some(client_id) = lookup("MQTT_CLIENT_ID") {
            config.mqtt.client_id = client_id;
        }
        if let Some(username) = lookup("MQTT_USERNAME") {
            config.mqtt.username = Some(username);
        }
        if let Some(password) = lookup("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }
        if let Some(secs) = parse_var(&lookup, "MQTT_KEEP_ALIVE_SECS") {
            config.mqtt.keep_alive_secs = secs;
        }
        if let Some(delay) = parse_var(&lookup, "MQTT_RECONNECT_DELAY_MS") {
            config.mqtt.reconnect_delay_ms = delay;
        }

        // Sensor configuration
        if let Some(topic) = lookup("SENSOR_TOPIC") {
            config.sensor.topic = topic;
        }
        if let Some(topic) = lookup("SENSOR_AVAILABILITY_TOPIC") {
            config.mqtt.availability_topic = Some(topic);
        }
        if let Some(interval) = parse_var(&lookup, "SENSOR_INTERVAL_MS") {
            config.sensor.interval_ms = interval;
        }
        if let Some(runs) = parse_var(&lookup, "SENSOR_MAX_RUNS") {
            config.sensor.max_runs = Some(runs);
        }
        if let Some(seed) = parse_var(&lookup, "SENSOR_SEED") {
            config.sensor.seed = Some(seed);
        }

        config
    }

    /// Reject settings the broker or scheduler cannot work with.
    pub fn validate(&self) -> Result<()> {
        validate_topic("sensor topic", &self.sensor.topic)?;
        if let Some(topic) = &self.mqtt.availability_topic {
            validate_topic("availability topic", topic)?;
        }
        if self.mqtt.broker_host.is_empty() {
            return Err(SensorError::InvalidConfig("broker host is empty".into()));
        }
        if self.mqtt.broker_port == 0 {
            return Err(SensorError::InvalidConfig("broker port must be non-zero".into()));
        }
        if self.mqtt.client_id.is_empty() {
            return Err(SensorError::InvalidConfig("client id is empty".into()));
        }
        if self.sensor.interval_ms == 0 {
            return Err(SensorError::InvalidConfig(
                "publish interval must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}: cannot parse {:?}", key, raw);
            None
        }
    }
}

/// Publish topics must be non-empty and free of wildcards.
fn validate_topic(what: &str, topic: &str) -> Result<()> {
    if topic.is_empty() {
        return Err(SensorError::InvalidConfig(format!("{what} is empty")));
    }
    if topic.contains(['+', '#']) {
        return Err(SensorError::InvalidConfig(format!(
            "{what} {topic:?} contains a wildcard"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.mqtt.broker_host, "localhost");
        assert_eq!(config.mqtt.broker_port, 1883);
        assert!(config.mqtt.client_id.starts_with("engine-temp-sensor-"));
        assert_eq!(config.sensor.topic, "engine/temperature");
        assert_eq!(config.sensor.interval_ms, 1000);
        assert!(config.sensor.max_runs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_client_ids_differ() {
        assert_ne!(default_client_id(), default_client_id());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("MQTT_BROKER_HOST", "10.0.0.2"),
            ("MQTT_BROKER_PORT", "8883"),
            ("MQTT_CLIENT_ID", "engine-1"),
            ("MQTT_USERNAME", "sensor"),
            ("MQTT_PASSWORD", "hunter2"),
            ("SENSOR_TOPIC", "plant/engine-1/temp"),
            ("SENSOR_AVAILABILITY_TOPIC", "plant/engine-1/status"),
            ("SENSOR_INTERVAL_MS", "250"),
            ("SENSOR_MAX_RUNS", "10"),
            ("SENSOR_SEED", "99"),
        ]));
        assert_eq!(config.mqtt.broker_host, "10.0.0.2");
        assert_eq!(config.mqtt.broker_port, 8883);
        assert_eq!(config.mqtt.client_id, "engine-1");
        assert_eq!(config.mqtt.username.as_deref(), Some("sensor"));
        assert_eq!(config.mqtt.password.as_deref(), Some("hunter2"));
        assert_eq!(config.sensor.topic, "plant/engine-1/temp");
        assert_eq!(
            config.mqtt.availability_topic.as_deref(),
            Some("plant/engine-1/status")
        );
        assert_eq!(config.sensor.interval_ms, 250);
        assert_eq!(config.sensor.max_runs, Some(10));
        assert_eq!(config.sensor.seed, Some(99));
    }

    #[test]
    fn test_unparseable_numbers_are_ignored() {
        let config = Config::from_lookup(lookup_from(&[
            ("MQTT_BROKER_PORT", "eighty"),
            ("SENSOR_INTERVAL_MS", "-5"),
        ]));
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.sensor.interval_ms, 1000);
    }

    #[test]
    fn test_validate_rejects_wildcard_topics() {
        let mut config = Config::default();
        config.sensor.topic = "engine/+/temperature".to_string();
        assert!(matches!(
            config.validate(),
            Err(SensorError::InvalidConfig(_))
        ));

        config.sensor.topic = "engine/temperature".to_string();
        config.mqtt.availability_topic = Some("engine/#".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_and_zero_values() {
        let mut config = Config::default();
        config.sensor.topic.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sensor.interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.mqtt.broker_port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.mqtt.client_id.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_dotenv() {
        let content = "\
# broker
MQTT_BROKER_HOST=broker.local
SENSOR_TOPIC = \"plant/engine 1/temp\"
export MQTT_USERNAME='sensor'

not a pair
=orphan
";
        let pairs = parse_dotenv(content);
        assert_eq!(
            pairs,
            vec![
                ("MQTT_BROKER_HOST", "broker.local"),
                ("SENSOR_TOPIC", "plant/engine 1/temp"),
                ("MQTT_USERNAME", "sensor"),
            ]
        );
    }
}
