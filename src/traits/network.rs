//! Messaging abstraction traits.
//!
//! The core never talks to a broker directly. It consumes a "publish named
//! property" capability ([`PropertyPublisher`]) and exposes a "receive named
//! property write" entry point on the node. The [`bridge`](crate::bridge)
//! module implements the publisher on top of any [`MqttClient`].
//!
//! # Properties
//!
//! ```text
//! motion     - "ON" / "OFF" (retained)
//! system     - command line in, command response out (settable)
//! occupancy  - telemetry record (JSON or engineering CSV)
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

// ============================================================================
// Property Publishing
// ============================================================================

/// Description of a property the node exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertySpec<'a> {
    /// Property id (topic segment).
    pub id: &'a str,
    /// Human-readable name.
    pub name: &'a str,
    /// Homie datatype (`enum`, `string`, `json`, ...).
    pub datatype: &'a str,
    /// Datatype format (e.g. `ON,OFF` for enums). Empty if none.
    pub format: &'a str,
    /// Whether the property accepts writes.
    pub settable: bool,
    /// Whether published values are retained.
    pub retained: bool,
}

/// Publish capability provided by the messaging layer.
///
/// # Example
///
/// ```rust
/// use mmwave_occupancy::traits::PropertyPublisher;
/// use mmwave_occupancy::hal::MockPublisher;
///
/// let mut out = MockPublisher::new();
/// out.publish("motion", "ON", true).unwrap();
/// assert_eq!(out.last_value("motion"), Some("ON"));
/// ```
pub trait PropertyPublisher {
    /// Error type for publish operations.
    type Error: core::fmt::Debug;

    /// Declares a property before its first publish.
    ///
    /// Default implementation does nothing.
    fn advertise(&mut self, spec: &PropertySpec<'_>) -> Result<(), Self::Error> {
        let _ = spec;
        Ok(())
    }

    /// Publishes `value` on `property`.
    fn publish(&mut self, property: &str, value: &str, retained: bool) -> Result<(), Self::Error>;
}

// ============================================================================
// MQTT Client Trait (Sync-First Design)
// ============================================================================

/// MQTT client trait for pub/sub messaging.
///
/// Sync-first: works with blocking I/O on the device and with a background
/// connection thread on desktop.
///
/// - `publish` and `subscribe` may block
/// - `try_recv` must never block
/// - The client should handle reconnection internally
pub trait MqttClient {
    /// Error type for MQTT operations.
    type Error: core::fmt::Debug;

    /// Publish a message to a topic.
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Subscribe to a topic.
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Try to receive the next message (non-blocking).
    fn try_recv(&mut self) -> Option<MqttMessage>;

    /// Check if connected to broker.
    fn is_connected(&self) -> bool;
}

/// An MQTT message received from a subscription.
#[derive(Clone, Debug)]
pub struct MqttMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message payload as raw bytes.
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Create a new MQTT message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Returns the payload as a UTF-8 string, if valid.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}
