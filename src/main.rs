//! Engine temperature sensor.
//!
//! Publishes a simulated engine temperature to an MQTT broker on a fixed
//! interval. Readings are retained so new subscribers see the last value.
//!
//! Usage:
//!   cargo run --bin engine-temp-sensor -- --host 10.0.0.2 --interval-ms 500

use clap::Parser;
use engine_temp_sensor::client::MessagingClient;
use engine_temp_sensor::config::{self, Config};
use engine_temp_sensor::error::Result;
use engine_temp_sensor::instance_lock::InstanceLock;
use engine_temp_sensor::logging::init_logger;
use engine_temp_sensor::message::{Message, QualityOfService};
use engine_temp_sensor::mqtt::{AVAILABILITY_OFFLINE, MqttClient};
use engine_temp_sensor::random::{RandomSource, SeededRandom, ThreadRandom};
use engine_temp_sensor::scheduler::{ScheduleSettings, spawn_publish_loop};
use engine_temp_sensor::task::SensorPublishTask;
use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "engine-temp-sensor")]
#[command(about = "Publish simulated engine temperature readings over MQTT")]
struct Cli {
    /// MQTT broker host (overrides MQTT_BROKER_HOST)
    #[arg(long)]
    host: Option<String>,

    /// MQTT broker port (overrides MQTT_BROKER_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// MQTT client id (overrides MQTT_CLIENT_ID)
    #[arg(long)]
    client_id: Option<String>,

    /// Topic to publish readings to (overrides SENSOR_TOPIC)
    #[arg(long)]
    topic: Option<String>,

    /// Retained online/offline topic (overrides SENSOR_AVAILABILITY_TOPIC)
    #[arg(long)]
    availability_topic: Option<String>,

    /// Milliseconds between readings (overrides SENSOR_INTERVAL_MS)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop after this many readings (overrides SENSOR_MAX_RUNS)
    #[arg(long)]
    max_runs: Option<u64>,

    /// Seed for reproducible readings (overrides SENSOR_SEED)
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.mqtt.broker_host = host;
        }
        if let Some(port) = self.port {
            config.mqtt.broker_port = port;
        }
        if let Some(client_id) = self.client_id {
            config.mqtt.client_id = client_id;
        }
        if let Some(topic) = self.topic {
            config.sensor.topic = topic;
        }
        if let Some(topic) = self.availability_topic {
            config.mqtt.availability_topic = Some(topic);
        }
        if let Some(interval) = self.interval_ms {
            config.sensor.interval_ms = interval;
        }
        if let Some(runs) = self.max_runs {
            config.sensor.max_runs = Some(runs);
        }
        if let Some(seed) = self.seed {
            config.sensor.seed = Some(seed);
        }
    }
}

fn main() -> ExitCode {
    // Load .env file before anything else, the runtime is not built yet
    config::load_dotenv();
    init_logger();

    let cli = Cli::parse();
    match start(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn start(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env();
    cli.apply(&mut config);
    config.validate()?;

    info!("Starting engine temperature sensor");
    info!(
        "  Broker: {}:{}",
        config.mqtt.broker_host, config.mqtt.broker_port
    );
    info!("  Client ID: {}", config.mqtt.client_id);
    info!("  Topic: {}", config.sensor.topic);
    info!("  Interval: {} ms", config.sensor.interval_ms);

    let _lock = InstanceLock::acquire(&config.mqtt.client_id)?;

    let mqtt_client = MqttClient::new(&config.mqtt);
    let publisher = Arc::new(mqtt_client.publisher());

    // Nothing is subscribed, the receiver only keeps the event loop running
    let (msg_tx, _msg_rx) = mpsc::channel(1);
    let mqtt_handle = tokio::spawn(async move {
        mqtt_client.run(msg_tx).await;
    });

    let random: Arc<dyn RandomSource> = match config.sensor.seed {
        Some(seed) => {
            info!("  Seed: {}", seed);
            Arc::new(SeededRandom::new(seed))
        }
        None => Arc::new(ThreadRandom),
    };
    let task = Arc::new(SensorPublishTask::new(
        publisher.clone(),
        random,
        config.sensor.topic.clone(),
    ));
    let mut schedule = spawn_publish_loop(
        task,
        ScheduleSettings {
            interval: Duration::from_millis(config.sensor.interval_ms),
            max_runs: config.sensor.max_runs,
        },
    );

    info!("Engine temperature sensor is running, press Ctrl+C to exit");

    tokio::select! {
        result = &mut schedule => {
            if let Err(e) = result {
                error!("Publish schedule ended unexpectedly: {}", e);
            }
        }
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => error!("Failed to listen for shutdown signal: {}", e),
            }
            schedule.abort();
        }
    }

    // A clean disconnect suppresses the last will, so mark ourselves offline
    if let Some(topic) = &config.mqtt.availability_topic
        && publisher.is_connected()
    {
        let offline = Message::new(
            topic.as_str(),
            AVAILABILITY_OFFLINE,
            QualityOfService::AtMostOnce,
            true,
        );
        if let Err(e) = publisher.publish(topic, offline).await {
            warn!("{}", e);
        }
    }
    if let Err(e) = publisher.disconnect().await {
        warn!("Failed to disconnect from MQTT broker: {}", e);
    }

    // Give the event loop a moment to flush the disconnect
    let _ = tokio::time::timeout(Duration::from_secs(2), mqtt_handle).await;

    info!("Engine temperature sensor stopped");
    Ok(())
}
