//! Occupancy node: sequences the radar link, debounce, telemetry and commands.
//!
//! The scheduler drives a node through [`NodeLifecycle`] in a fixed order:
//!
//! 1. [`initialize`](NodeLifecycle::initialize) once at startup: advertises
//!    the properties and opens the radar link.
//! 2. [`on_ready_to_operate`](NodeLifecycle::on_ready_to_operate) once the
//!    messaging layer is up: resets the debounce state and timers.
//! 3. [`tick`](NodeLifecycle::tick) repeatedly.
//!
//! Property writes arrive through [`handle_input`](NodeLifecycle::handle_input).
//!
//! # Tick
//!
//! Each tick, in order:
//!
//! 1. Pump the radar decoder (always).
//! 2. If reporting is enabled, the radar is connected and the telemetry
//!    interval elapsed, publish one telemetry record.
//! 3. Re-evaluate presence and publish `ON`/`OFF` (retained) on change or
//!    broadcast expiry.
//! 4. Read at most one console byte, echo it, and dispatch on newline.
//!
//! Steps 2 and 3 only run after `on_ready_to_operate`.
//!
//! # Example
//!
//! ```rust
//! use mmwave_occupancy::config::Config;
//! use mmwave_occupancy::hal::*;
//! use mmwave_occupancy::node::{NodeHardware, NodeLifecycle, OccupancyNode};
//!
//! let hardware = NodeHardware {
//!     radar: MockRadar::new(),
//!     pin: MockPin::with_level(true),
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
//! assert_eq!(out.last_value("motion"), Some("ON"));
//! ```

extern crate alloc;

use alloc::string::String;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::{debug, info, warn};

use crate::commands::{CommandContext, CommandProcessor, CommandResponse, LineBuffer, PROMPT};
use crate::config::{Config, NodeConfig};
use crate::debounce::{DebounceEngine, PresenceSource};
use crate::session::RadarLink;
use crate::telemetry;
use crate::timer::IntervalTimer;
use crate::traits::{Clock, Console, HostControl, PropertyPublisher, PropertySpec, RadarDriver};

/// Payload published when presence is detected.
pub const MOTION_ON: &str = "ON";

/// Payload published when presence clears.
pub const MOTION_OFF: &str = "OFF";

/// Scheduler-facing lifecycle of a node.
pub trait NodeLifecycle {
    /// Called once at startup.
    fn initialize<O: PropertyPublisher>(&mut self, out: &mut O);

    /// Called once the messaging layer is ready.
    fn on_ready_to_operate(&mut self);

    /// Called repeatedly by the scheduler.
    fn tick<O: PropertyPublisher>(&mut self, out: &mut O);

    /// Handles a write to one of the node's properties.
    ///
    /// Returns true if the property belongs to this node and was handled.
    fn handle_input<O: PropertyPublisher>(&mut self, property: &str, value: &str, out: &mut O) -> bool;
}

/// Hardware a node owns.
pub struct NodeHardware<R, P, C, D, H, S> {
    /// Radar frame decoder.
    pub radar: R,
    /// Module presence output.
    pub pin: P,
    /// Millisecond clock.
    pub clock: C,
    /// Blocking delay for settle waits.
    pub delay: D,
    /// Host controller.
    pub host: H,
    /// Local console.
    pub console: S,
}

/// The occupancy sensor node.
pub struct OccupancyNode<R, P, C, D, H, S>
where
    R: RadarDriver,
{
    node: NodeConfig,
    source: PresenceSource,
    link: RadarLink<R>,
    pin: P,
    clock: C,
    delay: D,
    host: H,
    console: S,
    debounce: DebounceEngine,
    telemetry_timer: IntervalTimer,
    reading_timer: IntervalTimer,
    last_raw: bool,
    reporting_enabled: bool,
    ready: bool,
    processor: CommandProcessor,
    line: LineBuffer,
    echo: heapless::Vec<u8, 4>,
}

impl<R, P, C, D, H, S> OccupancyNode<R, P, C, D, H, S>
where
    R: RadarDriver,
    P: InputPin,
    C: Clock,
    D: DelayNs,
    H: HostControl,
    S: Console,
{
    /// Builds a node. The configuration is expected to be validated.
    pub fn new(config: &Config, hw: NodeHardware<R, P, C, D, H, S>) -> Self {
        let link = RadarLink::new(hw.radar, config.radar.baud, config.radar.reporting_mode())
            .with_mode_settle_ms(config.radar.mode_settle_ms);
        Self {
            node: config.node.clone(),
            source: config.occupancy.source,
            link,
            pin: hw.pin,
            clock: hw.clock,
            delay: hw.delay,
            host: hw.host,
            console: hw.console,
            debounce: DebounceEngine::new(config.occupancy.strategy),
            telemetry_timer: IntervalTimer::new(config.radar.telemetry_interval_ms),
            reading_timer: IntervalTimer::new(config.occupancy.reading_interval_ms),
            last_raw: false,
            reporting_enabled: config.radar.reporting_enabled,
            ready: false,
            processor: CommandProcessor::new(config.node.name.as_str(), config.radar.restart_settle_ms),
            line: LineBuffer::new(),
            echo: heapless::Vec::new(),
        }
    }

    /// Parses and executes one command line.
    pub fn run_command(&mut self, line: &str) -> CommandResponse {
        let mut ctx = CommandContext {
            link: &mut self.link,
            delay: &mut self.delay,
            host: &mut self.host,
            reporting_enabled: &mut self.reporting_enabled,
            motion: self.debounce.is_present(),
        };
        self.processor.dispatch(line, &mut ctx)
    }

    fn advertise<O: PropertyPublisher>(&self, out: &mut O) {
        let specs = [
            PropertySpec {
                id: self.node.motion_property.as_str(),
                name: "Motion",
                datatype: "enum",
                format: "ON,OFF",
                settable: false,
                retained: true,
            },
            PropertySpec {
                id: self.node.command_property.as_str(),
                name: "Command Handler",
                datatype: "string",
                format: "",
                settable: true,
                retained: false,
            },
            PropertySpec {
                id: self.node.telemetry_property.as_str(),
                name: "Occupancy",
                datatype: "json",
                format: "",
                settable: false,
                retained: false,
            },
        ];
        for spec in &specs {
            if let Err(e) = out.advertise(spec) {
                warn!("advertise {} failed: {:?}", spec.id, e);
            }
        }
    }

    fn sample_presence(&mut self, now: u32) -> bool {
        if self.reading_timer.period_ms() > 0 && !self.reading_timer.fire_if_due(now) {
            return self.last_raw;
        }
        self.last_raw = match self.source {
            PresenceSource::Pin => self.pin.is_high().unwrap_or_else(|e| {
                warn!("presence pin read failed: {:?}", e);
                false
            }),
            PresenceSource::RadarFlags => self.link.is_connected() && self.link.frame().presence_detected(),
        };
        self.last_raw
    }

    fn publish_telemetry<O: PropertyPublisher>(&mut self, now: u32, out: &mut O) {
        if !self.reporting_enabled || !self.link.is_connected() {
            return;
        }
        if !self.telemetry_timer.fire_if_due(now) {
            return;
        }
        let record = telemetry::render(self.link.mode(), self.link.frame(), self.debounce.is_present());
        publish(out, self.node.telemetry_property.as_str(), &record, false);
    }

    fn publish_motion<O: PropertyPublisher>(&mut self, now: u32, out: &mut O) {
        let raw = self.sample_presence(now);
        if let Some(present) = self.debounce.evaluate(raw, now) {
            let value = if present { MOTION_ON } else { MOTION_OFF };
            if self.debounce.state().last_change_ms == now {
                info!("motion detected: {}", value);
            }
            publish(out, self.node.motion_property.as_str(), value, true);
        }
    }

    fn service_console<O: PropertyPublisher>(&mut self, out: &mut O) {
        let Some(byte) = self.console.read_byte() else {
            return;
        };
        if byte != b'\n' {
            self.echo_byte(byte);
        }
        if let Some(line) = self.line.push(byte) {
            self.echo.clear();
            let line = String::from_utf8_lossy(&line);
            let response = self.run_command(&line);
            let wire = response.to_wire();
            self.console.write_str("\n");
            self.console.write_str(&wire);
            self.console.write_str(PROMPT);
            publish(out, self.node.command_property.as_str(), &wire, false);
        }
    }

    /// Echoes typed bytes once they form a complete character.
    fn echo_byte(&mut self, byte: u8) {
        if self.echo.push(byte).is_err() {
            self.echo.clear();
            self.console.write_str(char::REPLACEMENT_CHARACTER.encode_utf8(&mut [0; 4]));
            return;
        }
        match core::str::from_utf8(&self.echo) {
            Ok(text) => self.console.write_str(text),
            // Incomplete sequence, wait for the rest
            Err(e) if e.error_len().is_none() => return,
            Err(_) => self.console.write_str(&String::from_utf8_lossy(&self.echo)),
        }
        self.echo.clear();
    }

    /// The radar link.
    pub fn link(&self) -> &RadarLink<R> {
        &self.link
    }

    /// Mutable access to the radar link.
    pub fn link_mut(&mut self) -> &mut RadarLink<R> {
        &mut self.link
    }

    /// The debounce engine.
    pub fn debounce(&self) -> &DebounceEngine {
        &self.debounce
    }

    /// Whether periodic telemetry is enabled.
    pub fn is_reporting(&self) -> bool {
        self.reporting_enabled
    }

    /// Enables or disables periodic telemetry.
    pub fn set_reporting(&mut self, enabled: bool) {
        self.reporting_enabled = enabled;
    }

    /// Whether `on_ready_to_operate` has run.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Mutable access to the presence pin.
    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    /// Mutable access to the clock.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// The delay.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// The host controller.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host controller.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Mutable access to the console.
    pub fn console_mut(&mut self) -> &mut S {
        &mut self.console
    }

    /// Tears the node down, returning its hardware.
    ///
    /// Used to rebuild the node after a host reboot.
    pub fn into_hardware(self) -> NodeHardware<R, P, C, D, H, S> {
        NodeHardware {
            radar: self.link.into_driver(),
            pin: self.pin,
            clock: self.clock,
            delay: self.delay,
            host: self.host,
            console: self.console,
        }
    }
}

impl<R, P, C, D, H, S> NodeLifecycle for OccupancyNode<R, P, C, D, H, S>
where
    R: RadarDriver,
    P: InputPin,
    C: Clock,
    D: DelayNs,
    H: HostControl,
    S: Console,
{
    fn initialize<O: PropertyPublisher>(&mut self, out: &mut O) {
        info!("{}: initializing", self.node.name);
        self.advertise(out);
        if let Err(e) = self.link.open(&mut self.delay) {
            warn!("{}", e);
        }
        self.console.write_str(PROMPT);
    }

    fn on_ready_to_operate(&mut self) {
        let now = self.clock.now_ms();
        info!("{}: ready to operate", self.node.name);
        self.debounce.reset(now);
        self.telemetry_timer.reset(now);
        self.reading_timer.reset(now);
        self.last_raw = false;
        self.ready = true;
    }

    fn tick<O: PropertyPublisher>(&mut self, out: &mut O) {
        self.link.poll();

        if self.ready {
            let now = self.clock.now_ms();
            self.publish_telemetry(now, out);
            self.publish_motion(now, out);
        }

        self.service_console(out);
    }

    fn handle_input<O: PropertyPublisher>(&mut self, property: &str, value: &str, out: &mut O) -> bool {
        if property != self.node.command_property.as_str() {
            return false;
        }
        let response = self.run_command(value);
        publish(out, self.node.command_property.as_str(), &response.to_wire(), false);
        true
    }
}

fn publish<O: PropertyPublisher>(out: &mut O, property: &str, value: &str, retained: bool) {
    debug!("publish {} = {:?}", property, value);
    if let Err(e) = out.publish(property, value, retained) {
        warn!("publish {} failed: {:?}", property, e);
    }
}
