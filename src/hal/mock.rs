//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for every hardware and network seam,
//! so the whole node runs on desktop without a radar module attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockRadar`] | [`RadarDriver`] | Queued frames, canned replies, recorded writes |
//! | [`MockPin`] | [`InputPin`] | Settable presence level |
//! | [`MockClock`] | [`Clock`] | Controllable wrapping time source |
//! | [`MockDelay`] | [`DelayNs`] | Records requested delays, returns immediately |
//! | [`MockHost`] | [`HostControl`] | Counts reboot requests |
//! | [`MockConsole`] | [`Console`] | Scripted input, captured output |
//! | [`MockPublisher`] | [`PropertyPublisher`] | Captures advertised and published properties |
//! | [`MockMqtt`] | [`MqttClient`] | Captures pub/sub operations |
//!
//! # Example
//!
//! ```rust
//! use mmwave_occupancy::hal::{MockDelay, MockRadar};
//! use mmwave_occupancy::frame::RadarFrame;
//! use mmwave_occupancy::session::{RadarLink, ReportingMode};
//!
//! let mut link = RadarLink::new(MockRadar::new(), 256_000, ReportingMode::Normal);
//! link.open(&mut MockDelay::new()).unwrap();
//!
//! link.driver_mut().queue_frame(RadarFrame { moving_detected: true, ..Default::default() });
//! assert!(link.poll());
//! assert!(link.frame().moving_detected);
//! ```
//!
//! [`RadarDriver`]: crate::traits::RadarDriver
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`Clock`]: crate::traits::Clock
//! [`DelayNs`]: embedded_hal::delay::DelayNs
//! [`HostControl`]: crate::traits::HostControl
//! [`Console`]: crate::traits::Console
//! [`PropertyPublisher`]: crate::traits::PropertyPublisher
//! [`MqttClient`]: crate::traits::MqttClient

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin};

use crate::frame::{GateConfiguration, GateSensitivity, ProtocolInfo, RadarFrame, ALL_GATES, MAX_GATES};
use crate::traits::{
    Clock, Console, HostControl, MqttClient, MqttMessage, PropertyPublisher, PropertySpec, RadarDriver,
};

// ============================================================================
// Radar Mock
// ============================================================================

/// Mock radar frame decoder.
///
/// Frames are queued with [`queue_frame`](Self::queue_frame) and come out of
/// `poll()` in FIFO order. Configuration writes are applied to
/// [`configuration`](Self::configuration) so a later `readconfig` sees them.
/// Set the `fail_*` flags to make the matching requests fail.
///
/// # Example
///
/// ```rust
/// use mmwave_occupancy::hal::MockRadar;
/// use mmwave_occupancy::traits::RadarDriver;
///
/// let mut radar = MockRadar::new();
/// radar.begin(256_000).unwrap();
/// radar.set_max_values(4, 3, 10).unwrap();
///
/// assert_eq!(radar.max_values, Some((4, 3, 10)));
/// assert_eq!(radar.request_current_configuration().unwrap().max_moving_gate, 4);
/// ```
#[derive(Debug)]
pub struct MockRadar {
    /// Whether a module answers the handshake.
    pub present: bool,
    /// Whether frames are arriving (liveness after the handshake).
    pub live: bool,
    /// Whether `begin` has succeeded.
    pub begun: bool,
    /// Number of `begin` calls.
    pub begin_calls: usize,
    /// Baud rate passed to the last `begin`.
    pub baud: Option<u32>,
    /// Whether the module is in engineering mode.
    pub engineering_mode: bool,
    /// Number of engineering mode requests.
    pub start_engineering_calls: usize,
    /// Number of target mode requests.
    pub end_engineering_calls: usize,
    /// Fail both mode requests.
    pub fail_mode_requests: bool,
    /// Frames waiting to be decoded.
    pub frames: Vec<RadarFrame>,
    /// Configuration returned by `request_current_configuration`.
    pub configuration: GateConfiguration,
    /// Fail `request_current_configuration`.
    pub fail_config: bool,
    /// Last `set_max_values` arguments.
    pub max_values: Option<(u8, u8, u16)>,
    /// Every `set_gate_sensitivity_threshold` call.
    pub sensitivity_writes: Vec<(u8, u8, u8)>,
    /// Fail configuration writes and factory reset.
    pub fail_writes: bool,
    /// Number of `request_restart` calls.
    pub restart_calls: usize,
    /// Fail `request_restart`.
    pub fail_restart: bool,
    /// Firmware version string.
    pub firmware: String,
    /// Fail `request_firmware_version`.
    pub fail_version: bool,
    /// Number of `request_factory_reset` calls.
    pub factory_reset_calls: usize,
    /// Protocol info reported after the handshake.
    pub protocol: ProtocolInfo,
}

impl MockRadar {
    /// Creates a present, live module with factory defaults.
    pub fn new() -> Self {
        Self {
            present: true,
            live: true,
            begun: false,
            begin_calls: 0,
            baud: None,
            engineering_mode: false,
            start_engineering_calls: 0,
            end_engineering_calls: 0,
            fail_mode_requests: false,
            frames: Vec::new(),
            configuration: factory_configuration(),
            fail_config: false,
            max_values: None,
            sensitivity_writes: Vec::new(),
            fail_writes: false,
            restart_calls: 0,
            fail_restart: false,
            firmware: "V2.04.23022511".to_string(),
            fail_version: false,
            factory_reset_calls: 0,
            protocol: ProtocolInfo {
                protocol_version: 1,
                buffer_size: 64,
            },
        }
    }

    /// Makes the handshake fail.
    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    /// Queues a frame for the next `poll()`.
    pub fn queue_frame(&mut self, frame: RadarFrame) {
        self.frames.push(frame);
    }
}

impl Default for MockRadar {
    fn default() -> Self {
        Self::new()
    }
}

fn factory_configuration() -> GateConfiguration {
    GateConfiguration {
        max_gate: 8,
        max_moving_gate: 8,
        max_stationary_gate: 8,
        idle_seconds: 5,
        gates: [GateSensitivity {
            moving: 50,
            stationary: 50,
        }; MAX_GATES],
    }
}

fn check(fail: bool) -> Result<(), ()> {
    if fail {
        Err(())
    } else {
        Ok(())
    }
}

impl RadarDriver for MockRadar {
    type Error = ();

    fn begin(&mut self, baud: u32) -> Result<(), ()> {
        self.begin_calls += 1;
        self.baud = Some(baud);
        self.begun = self.present;
        check(!self.present)
    }

    fn poll(&mut self) -> Option<RadarFrame> {
        if !self.begun || self.frames.is_empty() {
            None
        } else {
            Some(self.frames.remove(0))
        }
    }

    fn is_connected(&self) -> bool {
        self.begun && self.live
    }

    fn request_start_engineering_mode(&mut self) -> Result<(), ()> {
        self.start_engineering_calls += 1;
        check(self.fail_mode_requests)?;
        self.engineering_mode = true;
        Ok(())
    }

    fn request_end_engineering_mode(&mut self) -> Result<(), ()> {
        self.end_engineering_calls += 1;
        check(self.fail_mode_requests)?;
        self.engineering_mode = false;
        Ok(())
    }

    fn request_current_configuration(&mut self) -> Result<GateConfiguration, ()> {
        check(self.fail_config)?;
        Ok(self.configuration)
    }

    fn set_max_values(&mut self, moving_gate: u8, stationary_gate: u8, idle_seconds: u16) -> Result<(), ()> {
        check(self.fail_writes)?;
        self.max_values = Some((moving_gate, stationary_gate, idle_seconds));
        self.configuration.max_moving_gate = moving_gate;
        self.configuration.max_stationary_gate = stationary_gate;
        self.configuration.idle_seconds = idle_seconds;
        Ok(())
    }

    fn set_gate_sensitivity_threshold(&mut self, gate: u8, moving: u8, stationary: u8) -> Result<(), ()> {
        check(self.fail_writes)?;
        self.sensitivity_writes.push((gate, moving, stationary));
        let sensitivity = GateSensitivity { moving, stationary };
        if gate == ALL_GATES {
            self.configuration.gates = [sensitivity; MAX_GATES];
        } else if let Some(slot) = self.configuration.gates.get_mut(gate as usize) {
            *slot = sensitivity;
        }
        Ok(())
    }

    fn request_restart(&mut self) -> Result<(), ()> {
        self.restart_calls += 1;
        check(self.fail_restart)
    }

    fn request_firmware_version(&mut self) -> Result<String, ()> {
        check(self.fail_version)?;
        Ok(self.firmware.clone())
    }

    fn request_factory_reset(&mut self) -> Result<(), ()> {
        check(self.fail_writes)?;
        self.factory_reset_calls += 1;
        self.configuration = factory_configuration();
        Ok(())
    }

    fn protocol_info(&self) -> ProtocolInfo {
        if self.begun {
            self.protocol
        } else {
            ProtocolInfo::default()
        }
    }
}

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock presence pin.
///
/// ```rust
/// use embedded_hal::digital::InputPin;
/// use mmwave_occupancy::hal::MockPin;
///
/// let mut pin = MockPin::new();
/// assert!(pin.is_low().unwrap());
/// pin.high = true;
/// assert!(pin.is_high().unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MockPin {
    /// Current level.
    pub high: bool,
    /// Number of reads.
    pub reads: usize,
}

impl MockPin {
    /// Creates a pin reading low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pin at the given level.
    pub fn with_level(high: bool) -> Self {
        Self { high, reads: 0 }
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        self.reads += 1;
        Ok(self.high)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|h| !h)
    }
}

/// Mock clock for testing.
///
/// Allows manual control of time. Advancing past `u32::MAX` wraps, like the
/// hardware millisecond counter.
///
/// # Example
///
/// ```rust
/// use mmwave_occupancy::hal::MockClock;
/// use mmwave_occupancy::traits::Clock;
///
/// let mut clock = MockClock::new();
/// clock.set(u32::MAX);
/// clock.advance(2);
/// assert_eq!(clock.now_ms(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u32,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u32) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration, wrapping.
    pub fn advance(&mut self, ms: u32) {
        self.current_ms = self.current_ms.wrapping_add(ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.current_ms
    }
}

/// Mock blocking delay. Returns immediately.
///
/// `delay_ms` calls add to `total_ms`; finer-grained calls add to `total_ns`.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Sum of `delay_ms` requests.
    pub total_ms: u32,
    /// Sum of `delay_ns` and `delay_us` requests, in nanoseconds.
    pub total_ns: u64,
    /// Number of delay calls.
    pub calls: usize,
}

impl MockDelay {
    /// Creates a delay with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.calls += 1;
        self.total_ns += u64::from(us) * 1_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ms = self.total_ms.saturating_add(ms);
    }
}

/// Mock host controller. Counts reboot requests.
#[derive(Debug, Default)]
pub struct MockHost {
    /// Number of reboot requests.
    pub reboots: usize,
}

impl MockHost {
    /// Creates a host with no reboots recorded.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostControl for MockHost {
    fn reboot(&mut self) {
        self.reboots += 1;
    }
}

/// Mock character console.
///
/// ```rust
/// use mmwave_occupancy::hal::MockConsole;
/// use mmwave_occupancy::traits::Console;
///
/// let mut console = MockConsole::new();
/// console.type_str("hi");
/// assert_eq!(console.read_byte(), Some(b'h'));
/// console.write_str("ok");
/// assert_eq!(console.output, "ok");
/// ```
#[derive(Debug, Default)]
pub struct MockConsole {
    /// Bytes waiting to be read.
    pub input: Vec<u8>,
    /// Everything written so far.
    pub output: String,
}

impl MockConsole {
    /// Creates an idle console.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues typed characters.
    pub fn type_str(&mut self, s: &str) {
        self.input.extend_from_slice(s.as_bytes());
    }

    /// Returns true if typed input remains.
    pub fn has_input(&self) -> bool {
        !self.input.is_empty()
    }
}

impl Console for MockConsole {
    fn read_byte(&mut self) -> Option<u8> {
        if self.input.is_empty() {
            None
        } else {
            Some(self.input.remove(0))
        }
    }

    fn write_str(&mut self, s: &str) {
        self.output.push_str(s);
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock property publisher.
///
/// Records advertised property ids and every publish.
#[derive(Debug, Default)]
pub struct MockPublisher {
    /// Advertised properties as (id, datatype, settable).
    pub advertised: Vec<(String, String, bool)>,
    /// Published values as (property, value, retained).
    pub published: Vec<(String, String, bool)>,
    /// Make every publish fail.
    pub fail: bool,
}

impl MockPublisher {
    /// Creates a publisher with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Values published on `property`, oldest first.
    pub fn published_to(&self, property: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|(p, _, _)| p == property)
            .map(|(_, v, _)| v.as_str())
            .collect()
    }

    /// Most recent value published on `property`.
    pub fn last_value(&self, property: &str) -> Option<&str> {
        self.published
            .iter()
            .rev()
            .find(|(p, _, _)| p == property)
            .map(|(_, v, _)| v.as_str())
    }

    /// Forgets everything published so far.
    pub fn clear(&mut self) {
        self.published.clear();
    }
}

impl PropertyPublisher for MockPublisher {
    type Error = ();

    fn advertise(&mut self, spec: &PropertySpec<'_>) -> Result<(), ()> {
        self.advertised
            .push((spec.id.into(), spec.datatype.into(), spec.settable));
        Ok(())
    }

    fn publish(&mut self, property: &str, value: &str, retained: bool) -> Result<(), ()> {
        check(self.fail)?;
        self.published.push((property.into(), value.into(), retained));
        Ok(())
    }
}

/// Mock MQTT client for testing.
///
/// Records all publish/subscribe operations and allows injecting
/// incoming messages for testing message handling.
///
/// # Example
///
/// ```rust
/// use mmwave_occupancy::hal::MockMqtt;
///
/// let mut mqtt = MockMqtt::new();
///
/// // Queue incoming message
/// mqtt.queue_message("homie/occupancy-1/Occupancy/system/set", b"help".to_vec());
///
/// // Check subscriptions
/// mqtt.subscriptions.push("homie/#".into());
/// assert!(mqtt.is_subscribed("homie/#"));
/// ```
#[derive(Debug, Default)]
pub struct MockMqtt {
    /// Messages that have been published (topic, payload, retain).
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Topics that have been subscribed to.
    pub subscriptions: Vec<String>,
    /// Queue of incoming messages to be returned by `try_recv()`.
    pub incoming: Vec<MqttMessage>,
    /// Whether the client is connected.
    pub connected: bool,
}

impl MockMqtt {
    /// Creates a new mock MQTT client in connected state.
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    /// Queue an incoming message
    pub fn queue_message(&mut self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.incoming.push(MqttMessage::new(topic, payload));
    }

    /// Check if a topic was subscribed to
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|t| t == topic)
    }

    /// Get published messages for a topic
    pub fn published_to(&self, topic: &str) -> Vec<&(String, Vec<u8>, bool)> {
        self.published.iter().filter(|(t, _, _)| t == topic).collect()
    }
}

impl MqttClient for MockMqtt {
    type Error = ();

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), ()> {
        check(!self.connected)?;
        self.published.push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ()> {
        self.subscriptions.push(topic.into());
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        if self.incoming.is_empty() {
            None
        } else {
            Some(self.incoming.remove(0))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radar_absent_fails_begin() {
        let mut radar = MockRadar::new().absent();
        assert!(radar.begin(256_000).is_err());
        assert!(!radar.is_connected());
        assert_eq!(radar.protocol_info(), ProtocolInfo::default());
    }

    #[test]
    fn radar_frames_are_fifo_after_begin() {
        let mut radar = MockRadar::new();
        radar.queue_frame(RadarFrame {
            moving_energy: 1,
            ..Default::default()
        });
        radar.queue_frame(RadarFrame {
            moving_energy: 2,
            ..Default::default()
        });
        // Nothing decodes before the handshake
        assert!(radar.poll().is_none());
        radar.begin(256_000).unwrap();
        assert_eq!(radar.poll().map(|f| f.moving_energy), Some(1));
        assert_eq!(radar.poll().map(|f| f.moving_energy), Some(2));
        assert!(radar.poll().is_none());
    }

    #[test]
    fn radar_sensitivity_write_all_gates() {
        let mut radar = MockRadar::new();
        radar.set_gate_sensitivity_threshold(ALL_GATES, 20, 30).unwrap();
        let config = radar.request_current_configuration().unwrap();
        assert!(config.gates.iter().all(|g| g.moving == 20 && g.stationary == 30));
    }

    #[test]
    fn radar_factory_reset_restores_defaults() {
        let mut radar = MockRadar::new();
        radar.set_max_values(2, 2, 60).unwrap();
        radar.request_factory_reset().unwrap();
        assert_eq!(radar.configuration, factory_configuration());
    }

    #[test]
    fn delay_records_milliseconds() {
        let mut delay = MockDelay::new();
        delay.delay_ms(500);
        delay.delay_ms(1000);
        delay.delay_us(3);
        assert_eq!(delay.total_ms, 1500);
        assert_eq!(delay.total_ns, 3_000);
        assert_eq!(delay.calls, 3);
    }

    #[test]
    fn publisher_tracks_last_value() {
        let mut out = MockPublisher::new();
        out.publish("motion", "ON", true).unwrap();
        out.publish("motion", "OFF", true).unwrap();
        assert_eq!(out.last_value("motion"), Some("OFF"));
        assert_eq!(out.published_to("motion"), ["ON", "OFF"]);
        assert_eq!(out.last_value("system"), None);
    }

    #[test]
    fn publisher_failure() {
        let mut out = MockPublisher::new();
        out.fail = true;
        assert!(out.publish("motion", "ON", true).is_err());
        assert!(out.published.is_empty());
    }

    #[test]
    fn mqtt_disconnected_publish_fails() {
        let mut mqtt = MockMqtt::new();
        mqtt.connected = false;
        assert!(mqtt.publish("a", b"b", false).is_err());
    }
}
