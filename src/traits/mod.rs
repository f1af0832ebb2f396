//! Trait definitions for the radar, host hardware, and messaging seams.
//!
//! These abstractions let the session manager run on the device and on a
//! desktop with mocks:
//!
//! - `radar`: the vendor frame decoder contract ([`RadarDriver`])
//! - `hardware`: [`Clock`], [`HostControl`], [`Console`]
//! - `network`: [`PropertyPublisher`] and [`MqttClient`]
//!
//! The presence pin and the settle delays are `embedded-hal` traits and are
//! re-exported here for convenience.

pub mod hardware;
pub mod network;
pub mod radar;

pub use hardware::*;
pub use network::*;
pub use radar::*;

pub use embedded_hal::delay::DelayNs;
pub use embedded_hal::digital::InputPin;
