//! Configuration for the occupancy node, its radar link, and MQTT.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use mmwave_occupancy::config::{Config, MqttConfig, OccupancyConfig, RadarConfig};
//! use mmwave_occupancy::debounce::DebounceStrategy;
//!
//! // Use defaults
//! let config = Config::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = Config::default()
//!     .with_mqtt(MqttConfig::default().with_host("192.168.1.100"))
//!     .with_radar(RadarConfig::default().with_reporting_enabled(true))
//!     .with_occupancy(
//!         OccupancyConfig::default()
//!             .with_strategy(DebounceStrategy::EdgeHold { hold_ms: 5_000 }),
//!     );
//! assert!(config.validate().is_ok());
//! ```

use heapless::String as HString;

use crate::debounce::{DebounceStrategy, PresenceSource};
use crate::error::ConfigError;
use crate::session::ReportingMode;

/// Maximum length for short config strings (hostnames, ids, names)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Broadcast interval bounds in milliseconds (10 s to 361 s).
pub const BROADCAST_INTERVAL_RANGE_MS: core::ops::RangeInclusive<u32> = 10_000..=361_000;

/// Telemetry interval bounds in milliseconds (10 ms to 3000 s).
pub const TELEMETRY_INTERVAL_RANGE_MS: core::ops::RangeInclusive<u32> = 10..=3_000_000;

// ============================================================================
// Helpers for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let _ = hs.push_str(utf8_prefix(s, MAX_SHORT_STRING));
    hs
}

/// Longest prefix of `s` that fits in `max` bytes on a char boundary.
fn utf8_prefix(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Device identification
    pub device: DeviceConfig,
    /// Node and property naming
    pub node: NodeConfig,
    /// Radar link and telemetry
    pub radar: RadarConfig,
    /// Presence debouncing
    pub occupancy: OccupancyConfig,
    /// MQTT client configuration
    pub mqtt: MqttConfig,
}

impl Config {
    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set node configuration
    pub fn with_node(mut self, node: NodeConfig) -> Self {
        self.node = node;
        self
    }

    /// Set radar configuration
    pub fn with_radar(mut self, radar: RadarConfig) -> Self {
        self.radar = radar;
        self
    }

    /// Set occupancy configuration
    pub fn with_occupancy(mut self, occupancy: OccupancyConfig) -> Self {
        self.occupancy = occupancy;
        self
    }

    /// Set MQTT configuration
    pub fn with_mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.mqtt = mqtt;
        self
    }

    /// Checks intervals and the presence source / strategy pairing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.radar.validate()?;
        self.occupancy.validate()
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
    /// Device ID (topic segment)
    pub id: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("mmwave-occupancy"),
            id: short_string("occupancy-1"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }

    /// Set the device ID
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = short_string(id);
        self
    }
}

// ============================================================================
// Node Config
// ============================================================================

/// Node and property identifiers
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeConfig {
    /// Node ID (topic segment)
    pub id: ShortString,
    /// Human-readable node name, shown in `help` and `deviceinfo`
    pub name: ShortString,
    /// Property carrying "ON" / "OFF"
    pub motion_property: ShortString,
    /// Settable property carrying command lines and responses
    pub command_property: ShortString,
    /// Property carrying telemetry records
    pub telemetry_property: ShortString,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            id: short_string("Occupancy"),
            name: short_string("Occupancy and Motion Sensor"),
            motion_property: short_string("motion"),
            command_property: short_string("system"),
            telemetry_property: short_string("occupancy"),
        }
    }
}

impl NodeConfig {
    /// Set the node ID
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = short_string(id);
        self
    }

    /// Set the node name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }

    /// Set the motion property name
    pub fn with_motion_property(mut self, property: &str) -> Self {
        self.motion_property = short_string(property);
        self
    }

    /// Set the command property name
    pub fn with_command_property(mut self, property: &str) -> Self {
        self.command_property = short_string(property);
        self
    }

    /// Set the telemetry property name
    pub fn with_telemetry_property(mut self, property: &str) -> Self {
        self.telemetry_property = short_string(property);
        self
    }
}

// ============================================================================
// Radar Config
// ============================================================================

/// Radar link and telemetry configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RadarConfig {
    /// UART baud rate for the module handshake
    pub baud: u32,
    /// Request engineering (per-gate) reporting instead of target-only
    pub engineering_mode: bool,
    /// Publish telemetry periodically from startup
    pub reporting_enabled: bool,
    /// Telemetry publish interval in milliseconds
    pub telemetry_interval_ms: u32,
    /// Wait after a module restart before re-entering the reporting mode
    pub restart_settle_ms: u32,
    /// Wait after the handshake before requesting the reporting mode
    pub mode_settle_ms: u32,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            baud: 256_000,
            engineering_mode: true,
            reporting_enabled: false,
            telemetry_interval_ms: 15_000,
            restart_settle_ms: 1_500,
            mode_settle_ms: 500,
        }
    }
}

impl RadarConfig {
    /// Set the baud rate
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    /// Select engineering or target-only reporting
    pub fn with_engineering_mode(mut self, enabled: bool) -> Self {
        self.engineering_mode = enabled;
        self
    }

    /// Enable or disable periodic telemetry
    pub fn with_reporting_enabled(mut self, enabled: bool) -> Self {
        self.reporting_enabled = enabled;
        self
    }

    /// Set the telemetry interval
    pub fn with_telemetry_interval_ms(mut self, ms: u32) -> Self {
        self.telemetry_interval_ms = ms;
        self
    }

    /// Set the restart settle delay
    pub fn with_restart_settle_ms(mut self, ms: u32) -> Self {
        self.restart_settle_ms = ms;
        self
    }

    /// Set the mode settle delay
    pub fn with_mode_settle_ms(mut self, ms: u32) -> Self {
        self.mode_settle_ms = ms;
        self
    }

    /// Reporting mode selected by `engineering_mode`
    pub fn reporting_mode(&self) -> ReportingMode {
        if self.engineering_mode {
            ReportingMode::Engineering
        } else {
            ReportingMode::Normal
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !TELEMETRY_INTERVAL_RANGE_MS.contains(&self.telemetry_interval_ms) {
            return Err(ConfigError::TelemetryInterval(self.telemetry_interval_ms));
        }
        Ok(())
    }
}

// ============================================================================
// Occupancy Config
// ============================================================================

/// Presence source and debounce configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyConfig {
    /// Where the raw presence signal comes from
    pub source: PresenceSource,
    /// Debounce strategy
    pub strategy: DebounceStrategy,
    /// Minimum spacing between presence samples in milliseconds (0 = every tick)
    pub reading_interval_ms: u32,
}

impl OccupancyConfig {
    /// Set the presence source
    pub fn with_source(mut self, source: PresenceSource) -> Self {
        self.source = source;
        self
    }

    /// Set the debounce strategy
    pub fn with_strategy(mut self, strategy: DebounceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the sampling interval
    pub fn with_reading_interval_ms(mut self, ms: u32) -> Self {
        self.reading_interval_ms = ms;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.strategy {
            DebounceStrategy::EdgeHold { hold_ms } => {
                if hold_ms == 0 {
                    return Err(ConfigError::ZeroHoldInterval);
                }
                if self.source == PresenceSource::RadarFlags {
                    return Err(ConfigError::IncompatibleDebounce);
                }
            }
            DebounceStrategy::LevelRefresh { broadcast_ms } => {
                if !BROADCAST_INTERVAL_RANGE_MS.contains(&broadcast_ms) {
                    return Err(ConfigError::BroadcastInterval(broadcast_ms));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// MQTT Config
// ============================================================================

/// MQTT client configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MqttConfig {
    /// Broker hostname or IP
    pub host: ShortString,
    /// Broker port
    pub port: u16,
    /// Client ID (should be unique per device)
    pub client_id: ShortString,
    /// Topic prefix (Homie base topic)
    pub topic_prefix: ShortString,
    /// Username for authentication (empty = no auth)
    pub username: ShortString,
    /// Password for authentication
    pub password: ShortString,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Whether MQTT is enabled
    pub enabled: bool,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: short_string("localhost"),
            port: 1883,
            client_id: short_string("mmwave-occupancy"),
            topic_prefix: short_string("homie"),
            username: ShortString::new(),
            password: ShortString::new(),
            keep_alive_secs: 30,
            enabled: true,
        }
    }
}

impl MqttConfig {
    /// Set the broker host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the client ID
    pub fn with_client_id(mut self, id: &str) -> Self {
        self.client_id = short_string(id);
        self
    }

    /// Set the topic prefix
    pub fn with_topic_prefix(mut self, prefix: &str) -> Self {
        self.topic_prefix = short_string(prefix);
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = short_string(username);
        self.password = short_string(password);
        self
    }

    /// Enable or disable MQTT
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.radar.baud, 256_000);
        assert_eq!(config.radar.telemetry_interval_ms, 15_000);
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(
            config.occupancy.strategy,
            DebounceStrategy::LevelRefresh { broadcast_ms: 60_000 }
        );
        assert_eq!(config.occupancy.source, PresenceSource::Pin);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn node_config_default() {
        let node = NodeConfig::default();
        assert_eq!(node.id.as_str(), "Occupancy");
        assert_eq!(node.motion_property.as_str(), "motion");
        assert_eq!(node.command_property.as_str(), "system");
        assert_eq!(node.telemetry_property.as_str(), "occupancy");
    }

    #[test]
    fn radar_config_default() {
        let radar = RadarConfig::default();
        assert!(radar.engineering_mode);
        assert!(!radar.reporting_enabled);
        assert_eq!(radar.restart_settle_ms, 1_500);
        assert_eq!(radar.mode_settle_ms, 500);
        assert_eq!(radar.reporting_mode(), ReportingMode::Engineering);
    }

    #[test]
    fn reporting_mode_follows_flag() {
        let radar = RadarConfig::default().with_engineering_mode(false);
        assert_eq!(radar.reporting_mode(), ReportingMode::Normal);
    }

    #[test]
    fn mqtt_auth_detection() {
        assert!(!MqttConfig::default().has_auth());
        assert!(MqttConfig::default().with_auth("user", "pass").has_auth());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_mqtt(MqttConfig::default().with_host("broker.local").with_port(8883))
            .with_device(DeviceConfig::default().with_name("Hallway").with_id("hall"))
            .with_node(NodeConfig::default().with_name("Hallway Radar"));

        assert_eq!(config.mqtt.host.as_str(), "broker.local");
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.device.id.as_str(), "hall");
        assert_eq!(config.node.name.as_str(), "Hallway Radar");
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn broadcast_interval_bounds() {
        let at = |ms| {
            OccupancyConfig::default()
                .with_strategy(DebounceStrategy::LevelRefresh { broadcast_ms: ms })
                .validate()
        };
        assert_eq!(at(9_999), Err(ConfigError::BroadcastInterval(9_999)));
        assert!(at(10_000).is_ok());
        assert!(at(361_000).is_ok());
        assert_eq!(at(361_001), Err(ConfigError::BroadcastInterval(361_001)));
    }

    #[test]
    fn telemetry_interval_bounds() {
        let at = |ms| RadarConfig::default().with_telemetry_interval_ms(ms).validate();
        assert_eq!(at(9), Err(ConfigError::TelemetryInterval(9)));
        assert!(at(10).is_ok());
        assert!(at(3_000_000).is_ok());
        assert_eq!(at(3_000_001), Err(ConfigError::TelemetryInterval(3_000_001)));
    }

    #[test]
    fn zero_hold_rejected() {
        let occupancy = OccupancyConfig::default().with_strategy(DebounceStrategy::EdgeHold { hold_ms: 0 });
        assert_eq!(occupancy.validate(), Err(ConfigError::ZeroHoldInterval));
    }

    #[test]
    fn radar_flags_require_level_refresh() {
        let occupancy = OccupancyConfig::default()
            .with_source(PresenceSource::RadarFlags)
            .with_strategy(DebounceStrategy::EdgeHold { hold_ms: 1_000 });
        assert_eq!(occupancy.validate(), Err(ConfigError::IncompatibleDebounce));

        let occupancy = occupancy.with_strategy(DebounceStrategy::LevelRefresh { broadcast_ms: 30_000 });
        assert!(occupancy.validate().is_ok());
    }

    // =========================================================================
    // String Helper Tests
    // =========================================================================

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        assert_eq!(short_string(&long_input).len(), MAX_SHORT_STRING);
    }

    #[test]
    fn string_helpers_utf8_boundary() {
        // 3-byte chars: 64 is not a boundary, 63 is
        let input = "\u{2603}".repeat(30);
        let s = short_string(&input);
        assert_eq!(s.len(), 63);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }
}
