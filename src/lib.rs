//! # mmwave-occupancy
//!
//! Occupancy sensor core for LD2410-class 24 GHz mmWave radar modules.
//!
//! The module reports per-frame target data over UART and drives a presence
//! pin. This crate turns that into a debounced `ON`/`OFF` motion signal,
//! periodic telemetry records, and a line-oriented command console that can
//! be driven locally or through a settable message property.
//!
//! ## Features
//!
//! - **Radar session**: handshake, reporting mode selection, restart with settle delay
//! - **Debounce**: edge-triggered hold or level-triggered periodic refresh
//! - **Telemetry**: JSON target records or engineering CSV frames
//! - **Command console**: 12 commands by number or mnemonic, `0`/`1` result codes
//! - **Messaging**: Homie-style property bridge over any MQTT client
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Radar, host and messaging abstractions
//! - `session` - Radar link state and mode handling
//! - `debounce` - Presence decision
//! - `telemetry` - Record formatting
//! - `commands` - Console command parsing and execution
//! - `node` - Lifecycle that ties everything together
//! - `bridge` - Property publishing over MQTT
//! - `hal` - Concrete implementations (mocks for testing, std for desktop)
//!
//! ## Example
//!
//! ```rust
//! use mmwave_occupancy::{
//!     Config, NodeHardware, NodeLifecycle, OccupancyNode,
//!     hal::{MockClock, MockConsole, MockDelay, MockHost, MockPin, MockPublisher, MockRadar},
//! };
//!
//! let hardware = NodeHardware {
//!     radar: MockRadar::new(),
//!     pin: MockPin::with_level(false),
//!     clock: MockClock::new(),
//!     delay: MockDelay::new(),
//!     host: MockHost::new(),
//!     console: MockConsole::new(),
//! };
//! let mut node = OccupancyNode::new(&Config::default(), hardware);
//! let mut out = MockPublisher::new();
//!
//! node.initialize(&mut out);
//! node.on_ready_to_operate();
//! node.tick(&mut out);
//! assert_eq!(out.last_value("motion"), Some("OFF"));
//!
//! // Commands arrive on the settable "system" property
//! node.handle_input("system", "readversion", &mut out);
//! assert!(out.last_value("system").unwrap().starts_with('0'));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Homie-style property bridge over an MQTT client.
pub mod bridge;
/// Console command parsing and execution.
pub mod commands;
/// Presence debouncing.
pub mod debounce;
/// Error types.
pub mod error;
/// Radar frame and gate configuration types.
pub mod frame;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Node lifecycle and tick sequencing.
pub mod node;
/// Radar link and session state.
pub mod session;
/// Telemetry record formatting.
pub mod telemetry;
/// Wrapping millisecond interval timer.
pub mod timer;
/// Core traits for the radar, host and messaging seams.
pub mod traits;

/// Configuration for the node, radar, debounce and MQTT.
pub mod config;

/// Network services (feature-gated).
#[cfg(feature = "mqtt")]
pub mod services;

// Re-exports for convenience
pub use bridge::PropertyBridge;
pub use commands::{Command, CommandProcessor, CommandResponse, LineBuffer};
pub use debounce::{DebounceEngine, DebounceStrategy, OccupancyState, PresenceSource};
pub use error::{ConfigError, RadarError};
pub use frame::{GateConfiguration, GateReading, GateSensitivity, ProtocolInfo, RadarFrame, Trigger};
pub use node::{NodeHardware, NodeLifecycle, OccupancyNode};
pub use session::{ConnectionState, RadarLink, RadarSession, ReportingMode};
pub use timer::IntervalTimer;
pub use traits::{
    // Hardware
    Clock,
    Console,
    DelayNs,
    HostControl,
    InputPin,
    // Network
    MqttClient,
    MqttMessage,
    PropertyPublisher,
    PropertySpec,
    // Radar
    RadarDriver,
};

// Config re-exports
pub use config::{Config, DeviceConfig, MqttConfig, NodeConfig, OccupancyConfig, RadarConfig};

#[cfg(feature = "serde")]
pub use telemetry::OccupancyRecord;
