//! Blocking MQTT client for desktop builds.
//!
//! Wraps [`rumqttc::Client`]. A background thread drives the connection,
//! queues incoming publishes on a channel and tracks the connection state,
//! so [`MqttClient::try_recv`] never blocks. Requests go through the
//! `try_` variants and fail instead of blocking when the queue is full.
//!
//! # Example
//!
//! ```ignore
//! use mmwave_occupancy::config::MqttConfig;
//! use mmwave_occupancy::services::RumqttcClient;
//! use mmwave_occupancy::traits::MqttClient;
//!
//! let config = MqttConfig::default().with_host("192.168.1.100");
//! let mut mqtt = RumqttcClient::connect(&config)?;
//! mqtt.publish("homie/occupancy-1/Occupancy/motion", b"OFF", true)?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use thiserror::Error;

use crate::config::MqttConfig;
use crate::traits::{MqttClient, MqttMessage};

/// Capacity of the client request queue.
const REQUEST_CAPACITY: usize = 32;

/// Pause before the connection thread retries after an error.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Lowest keep-alive the client library accepts.
const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// MQTT-related errors.
#[derive(Debug, Error)]
pub enum MqttError {
    /// The configuration disables MQTT.
    #[error("MQTT is disabled in the configuration")]
    Disabled,
    /// Failed to subscribe to a topic.
    #[error("subscribe to {topic} failed: {reason}")]
    Subscribe {
        /// Topic filter.
        topic: String,
        /// Client error text.
        reason: String,
    },
    /// Failed to publish a message.
    #[error("publish to {topic} failed: {reason}")]
    Publish {
        /// Destination topic.
        topic: String,
        /// Client error text.
        reason: String,
    },
}

/// [`MqttClient`] backed by rumqttc's blocking client.
pub struct RumqttcClient {
    client: Client,
    messages: Receiver<MqttMessage>,
    connected: Arc<AtomicBool>,
    closed: bool,
}

impl RumqttcClient {
    /// Starts a client for `config` and spawns its connection thread.
    ///
    /// Returns immediately; the connection is established in the background.
    pub fn connect(config: &MqttConfig) -> Result<Self, MqttError> {
        if !config.enabled {
            return Err(MqttError::Disabled);
        }

        let mut options = MqttOptions::new(
            config.client_id.as_str(),
            config.host.as_str(),
            config.port,
        );
        let keep_alive = u64::from(config.keep_alive_secs).max(MIN_KEEP_ALIVE_SECS);
        options.set_keep_alive(Duration::from_secs(keep_alive));
        options.set_clean_session(false);
        if config.has_auth() {
            options.set_credentials(config.username.as_str(), config.password.as_str());
        }

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        let (tx, rx) = channel();
        let connected = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&connected);
        let broker = format!("{}:{}", config.host, config.port);
        thread::spawn(move || drive_connection(connection, tx, flag, broker));

        Ok(Self {
            client,
            messages: rx,
            connected,
            closed: false,
        })
    }
}

fn drive_connection(
    mut connection: Connection,
    tx: Sender<MqttMessage>,
    connected: Arc<AtomicBool>,
    broker: String,
) {
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("MQTT connected to {}", broker);
                connected.store(true, Ordering::Relaxed);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!("MQTT message on {}", publish.topic);
                let msg = MqttMessage::new(publish.topic, publish.payload.to_vec());
                if tx.send(msg).is_err() {
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                connected.store(false, Ordering::Relaxed);
            }
            Ok(_) => {}
            Err(e) => {
                if connected.swap(false, Ordering::Relaxed) {
                    warn!("MQTT connection to {} lost: {}", broker, e);
                } else {
                    debug!("MQTT connect to {} failed: {}", broker, e);
                }
                thread::sleep(RECONNECT_DELAY);
            }
        }
    }
    connected.store(false, Ordering::Relaxed);
    info!("MQTT connection thread stopped");
}

impl MqttClient for RumqttcClient {
    type Error = MqttError;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), MqttError> {
        self.client
            .try_publish(topic, QoS::AtLeastOnce, retain, payload.to_vec())
            .map_err(|e| MqttError::Publish {
                topic: topic.into(),
                reason: e.to_string(),
            })
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), MqttError> {
        self.client
            .try_subscribe(topic, QoS::AtLeastOnce)
            .map_err(|e| MqttError::Subscribe {
                topic: topic.into(),
                reason: e.to_string(),
            })?;
        info!("MQTT subscribed to {}", topic);
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        if self.closed {
            return None;
        }
        match self.messages.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn is_connected(&self) -> bool {
        !self.closed && self.connected.load(Ordering::Relaxed)
    }
}
