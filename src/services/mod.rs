//! Network services.
//!
//! - `mqtt` feature: blocking rumqttc client implementing
//!   [`MqttClient`](crate::traits::MqttClient), for use behind
//!   [`PropertyBridge`](crate::bridge::PropertyBridge).

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "mqtt")]
pub use mqtt::*;
