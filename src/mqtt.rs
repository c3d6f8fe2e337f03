//! MQTT client wrapper for broker communication.
//!
//! [`MqttClient`] owns the rumqttc event loop and tracks whether the broker
//! connection is up. [`MqttPublisher`] is the cheap, cloneable handle that
//! implements [`MessagingClient`] for the publish task.

use crate::client::MessagingClient;
use crate::config::MqttConfig;
use crate::error::PublishError;
use crate::message::Message;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Payload published on the availability topic once connected.
pub const AVAILABILITY_ONLINE: &str = "online";

/// Payload the broker publishes on the availability topic if we vanish.
pub const AVAILABILITY_OFFLINE: &str = "offline";

/// Capacity of the request channel between client handles and the event loop.
const REQUEST_CHANNEL_CAPACITY: usize = 100;

/// Message received from MQTT broker.
#[derive(Debug, Clone)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    /// Set when the broker delivered a stored retained message.
    pub retained: bool,
}

/// MQTT client owning the connection event loop.
pub struct MqttClient {
    client: AsyncClient,
    event_loop: EventLoop,
    connected: Arc<AtomicBool>,
    availability_topic: Option<String>,
    /// Topic filters re-sent after every successful connect.
    subscriptions: Vec<String>,
    reconnect_delay: Duration,
}

impl MqttClient {
    /// Create a new MQTT client from configuration.
    ///
    /// No network traffic happens until [`MqttClient::run`] polls the event loop.
    pub fn new(config: &MqttConfig) -> Self {
        let (client, event_loop) =
            AsyncClient::new(Self::options(config), REQUEST_CHANNEL_CAPACITY);

        Self {
            client,
            event_loop,
            connected: Arc::new(AtomicBool::new(false)),
            availability_topic: config.availability_topic.clone(),
            subscriptions: Vec::new(),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        }
    }

    fn options(config: &MqttConfig) -> MqttOptions {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        // Set credentials if provided
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        if let Some(topic) = &config.availability_topic {
            options.set_last_will(LastWill::new(
                topic,
                AVAILABILITY_OFFLINE,
                QoS::AtMostOnce,
                true,
            ));
        }

        options
    }

    /// Handle used to publish from other tasks.
    pub fn publisher(&self) -> MqttPublisher {
        MqttPublisher {
            client: self.client.clone(),
            connected: self.connected.clone(),
        }
    }

    /// Subscribe to a topic.
    ///
    /// The subscription is sent on every successful connect, since a clean
    /// session loses it whenever the connection drops.
    pub fn subscribe(&mut self, topic: impl Into<String>) {
        let topic = topic.into();
        info!("Subscribing to MQTT topic: {}", topic);
        self.subscriptions.push(topic);
    }

    /// Run the MQTT event loop and forward received messages to the channel.
    ///
    /// This method runs until the channel is closed or a publisher requests a
    /// disconnect. Connection errors clear the connected flag and the next
    /// poll reconnects after the configured delay.
    pub async fn run(mut self, tx: mpsc::Sender<MqttMessage>) {
        info!("Starting MQTT event loop");

        loop {
            match self.event_loop.poll().await {
                // Refused connects surface as `ConnectionError::ConnectionRefused`
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to MQTT broker");
                    self.connected.store(true, Ordering::SeqCst);
                    self.renew_subscriptions();
                    self.announce_online();
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!(
                        "Received MQTT message on {} ({} bytes)",
                        publish.topic,
                        publish.payload.len()
                    );

                    let msg = MqttMessage {
                        topic: publish.topic.clone(),
                        payload: publish.payload.to_vec(),
                        retained: publish.retain,
                    };
                    if tx.send(msg).await.is_err() {
                        info!("MQTT message channel closed");
                        break;
                    }
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    info!("Disconnected from MQTT broker");
                    break;
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    warn!("MQTT broker closed the session");
                    self.connected.store(false, Ordering::SeqCst);
                }
                Ok(_) => {}
                Err(ConnectionError::ConnectionRefused(code)) => {
                    self.connected.store(false, Ordering::SeqCst);
                    error!("MQTT broker refused connection: {:?}", code);
                    tokio::time::sleep(self.reconnect_delay).await;
                }
                Err(e) => {
                    self.connected.store(false, Ordering::SeqCst);
                    error!("MQTT connection error: {:?}", e);
                    // Wait before reconnecting
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }

        self.connected.store(false, Ordering::SeqCst);
    }

    /// Queue the recorded subscriptions for the new session.
    ///
    /// Uses `try_subscribe` because the event loop is the one draining the
    /// request channel.
    fn renew_subscriptions(&self) {
        for topic in &self.subscriptions {
            if let Err(e) = self.client.try_subscribe(topic, QoS::AtMostOnce) {
                warn!("Failed to subscribe to {}: {}", topic, e);
            }
        }
    }

    /// Overwrite the retained last will with `online`.
    ///
    /// Uses `try_publish` because the event loop is the one draining the
    /// request channel.
    fn announce_online(&self) {
        let Some(topic) = &self.availability_topic else {
            return;
        };
        if let Err(e) =
            self.client
                .try_publish(topic, QoS::AtMostOnce, true, AVAILABILITY_ONLINE.as_bytes())
        {
            warn!("Failed to publish availability to {}: {}", topic, e);
        }
    }
}

/// Cloneable publishing handle sharing the event loop's connection state.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
}

impl MqttPublisher {
    /// Ask the broker to close the connection cleanly.
    ///
    /// The last will is not published on a clean disconnect, so callers with
    /// an availability topic should publish `offline` first.
    pub async fn disconnect(&self) -> Result<(), rumqttc::ClientError> {
        self.client.disconnect().await
    }
}

#[async_trait]
impl MessagingClient for MqttPublisher {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn publish(&self, topic: &str, message: Message) -> Result<(), PublishError> {
        let qos = message.qos().into();
        let retain = message.retained();
        self.client
            .publish(topic, qos, retain, message.into_payload())
            .await
            .map_err(|e| PublishError::new(topic, e))
    }
}
