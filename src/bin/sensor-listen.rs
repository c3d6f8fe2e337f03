//! Subscriber for checking what the sensor publishes.
//!
//! Usage:
//!   cargo run --bin sensor-listen
//!   cargo run --bin sensor-listen -- --topic plant/engine-1/temp
//!
//! Connects to the broker from the usual configuration, subscribes to the
//! reading topic and logs each decoded temperature. The first message after
//! subscribing is normally the retained last reading.

use clap::Parser;
use engine_temp_sensor::config::{self, Config};
use engine_temp_sensor::error::{Result, SensorError};
use engine_temp_sensor::logging::init_logger;
use engine_temp_sensor::message::parse_payload;
use engine_temp_sensor::mqtt::MqttClient;
use log::{error, info, warn};
use std::process::ExitCode;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "sensor-listen")]
#[command(about = "Log engine temperature readings received over MQTT")]
struct Cli {
    /// Topic to subscribe to (defaults to the sensor topic)
    #[arg(long)]
    topic: Option<String>,

    /// Exit after this many messages
    #[arg(long)]
    count: Option<u64>,
}

fn main() -> ExitCode {
    // Load .env file before anything else, the runtime is not built yet
    config::load_dotenv();
    init_logger();

    let cli = Cli::parse();
    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(SensorError::from)
        .and_then(|runtime| runtime.block_on(listen(cli)));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn listen(cli: Cli) -> Result<()> {
    let mut config = Config::from_env();
    // Never share the sensor's own client id, the broker would drop one of us
    config.mqtt.client_id = format!("{}-listen", config::default_client_id());
    // The listener must not publish the sensor's last will
    config.mqtt.availability_topic = None;
    let topic = cli.topic.unwrap_or(config.sensor.topic);
    let limit = cli.count;

    info!(
        "Connecting to MQTT broker at {}:{}",
        config.mqtt.broker_host, config.mqtt.broker_port
    );

    let mut mqtt_client = MqttClient::new(&config.mqtt);
    mqtt_client.subscribe(topic.as_str());

    let (msg_tx, mut msg_rx) = mpsc::channel(100);
    let mqtt_handle = tokio::spawn(async move {
        mqtt_client.run(msg_tx).await;
    });

    let msg_handle = tokio::spawn(async move {
        let mut received = 0u64;
        while let Some(msg) = msg_rx.recv().await {
            let kind = if msg.retained { "retained" } else { "live" };
            match parse_payload(&msg.payload) {
                Some(celsius) => info!("{} = {:.2} ({})", msg.topic, celsius, kind),
                None => warn!(
                    "{}: unrecognised payload {:?}",
                    msg.topic,
                    String::from_utf8_lossy(&msg.payload)
                ),
            }

            received += 1;
            if limit.is_some_and(|limit| received >= limit) {
                break;
            }
        }
    });

    info!("Listening on {}... Press Ctrl+C to exit.", topic);

    tokio::select! {
        _ = mqtt_handle => {
            warn!("MQTT event loop ended");
        }
        _ = msg_handle => {
            info!("Message limit reached");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
    }

    Ok(())
}
