//! Desktop simulator for the occupancy node.
//!
//! Runs the node against a simulated radar that walks a target in and out of
//! range on a fixed cycle. Commands can be typed on stdin, or written to the
//! node's settable property over MQTT.
//!
//! # Usage
//!
//! ```sh
//! cargo run --bin desktop_sim --features desktop
//! ```
//!
//! # Environment
//!
//! - `MQTT_HOST` / `MQTT_PORT`: broker address (default `localhost:1883`)
//! - `MQTT_USER` / `MQTT_PASSWORD`: optional credentials
//! - `MQTT_DISABLED=1`: log published properties instead of using a broker
//! - `RUST_LOG`: log filter (default `info`)

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use log::{info, warn};

use mmwave_occupancy::config::{Config, MqttConfig, RadarConfig};
use mmwave_occupancy::frame::{GateConfiguration, GateReading, GateSensitivity, ProtocolInfo, RadarFrame, MAX_GATES};
use mmwave_occupancy::hal::{StdClock, StdConsole, StdDelay, StdHost};
use mmwave_occupancy::services::RumqttcClient;
use mmwave_occupancy::traits::{InputPin, PropertyPublisher, RadarDriver};
use mmwave_occupancy::{NodeHardware, NodeLifecycle, OccupancyNode, PropertyBridge};

/// Main loop interval in milliseconds.
const LOOP_INTERVAL_MS: u64 = 10;

/// Simulated frame rate of the module.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Length of one walk-in / sit / walk-out cycle.
const CYCLE_SECS: u64 = 90;

/// Centimeters covered by one gate.
const GATE_CM: u16 = 75;

type SimNode = OccupancyNode<SimRadar, SimPin, StdClock, StdDelay, StdHost, StdConsole>;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::default()
        .with_radar(RadarConfig::default().with_reporting_enabled(true))
        .with_mqtt(mqtt_config_from_env()?);
    config.validate().context("invalid configuration")?;

    let presence = Rc::new(Cell::new(false));
    let hardware = NodeHardware {
        radar: SimRadar::new(Rc::clone(&presence)),
        pin: SimPin { presence },
        clock: StdClock::new(),
        delay: StdDelay,
        host: StdHost::new(),
        console: StdConsole::spawn(),
    };

    info!("=================================");
    info!("  {} simulator", config.node.name);
    info!("=================================");

    if config.mqtt.enabled {
        let client = RumqttcClient::connect(&config.mqtt)?;
        let mut bridge = PropertyBridge::new(client, &config);
        info!(
            "publishing to {} on {}:{}",
            bridge.node_topic(),
            config.mqtt.host,
            config.mqtt.port
        );
        run(&config, hardware, &mut bridge)
    } else {
        info!("MQTT disabled, properties are logged");
        run(&config, hardware, &mut LogPublisher)
    }
}

fn mqtt_config_from_env() -> anyhow::Result<MqttConfig> {
    let mut mqtt = MqttConfig::default();
    if let Ok(host) = std::env::var("MQTT_HOST") {
        mqtt = mqtt.with_host(&host);
    }
    if let Ok(port) = std::env::var("MQTT_PORT") {
        let port = port.parse::<u16>().with_context(|| format!("MQTT_PORT {:?} is not a port", port))?;
        mqtt = mqtt.with_port(port);
    }
    if let (Ok(user), Ok(password)) = (std::env::var("MQTT_USER"), std::env::var("MQTT_PASSWORD")) {
        mqtt = mqtt.with_auth(&user, &password);
    }
    if std::env::var("MQTT_DISABLED").is_ok_and(|v| v == "1") {
        mqtt = mqtt.with_enabled(false);
    }
    Ok(mqtt)
}

/// Where the node's properties go and where writes come from.
trait Transport: PropertyPublisher {
    /// Whether the messaging layer is up.
    fn online(&self) -> bool;

    /// Delivers pending property writes to the node.
    fn pump(&mut self, node: &mut SimNode);
}

impl Transport for PropertyBridge<RumqttcClient> {
    fn online(&self) -> bool {
        self.is_connected()
    }

    fn pump(&mut self, node: &mut SimNode) {
        self.poll(node);
    }
}

/// Logs publishes instead of sending them.
struct LogPublisher;

impl PropertyPublisher for LogPublisher {
    type Error = std::convert::Infallible;

    fn publish(&mut self, property: &str, value: &str, retained: bool) -> Result<(), Self::Error> {
        info!("{}{} = {}", property, if retained { " (retained)" } else { "" }, value.trim_end());
        Ok(())
    }
}

impl Transport for LogPublisher {
    fn online(&self) -> bool {
        true
    }

    fn pump(&mut self, _node: &mut SimNode) {}
}

fn run<T: Transport>(
    config: &Config,
    mut hardware: NodeHardware<SimRadar, SimPin, StdClock, StdDelay, StdHost, StdConsole>,
    transport: &mut T,
) -> anyhow::Result<()> {
    loop {
        let mut node = OccupancyNode::new(config, hardware);
        node.initialize(transport);

        loop {
            if !node.is_ready() && transport.online() {
                node.on_ready_to_operate();
            }

            node.tick(transport);
            transport.pump(&mut node);

            if node.host_mut().take_reboot_request() {
                warn!("rebooting node");
                break;
            }

            thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
        }

        hardware = node.into_hardware();
    }
}

// ============================================================================
// Simulated radar
// ============================================================================

/// Presence pin mirroring the simulated target.
struct SimPin {
    presence: Rc<Cell<bool>>,
}

impl embedded_hal::digital::ErrorType for SimPin {
    type Error = std::convert::Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.presence.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.presence.get())
    }
}

/// Errors from the simulated module.
#[derive(Debug)]
enum SimError {
    NotStarted,
}

/// Radar that walks a target in, lets it sit, and walks it out.
struct SimRadar {
    presence: Rc<Cell<bool>>,
    started: Option<Instant>,
    last_frame: Option<Instant>,
    engineering: bool,
    configuration: GateConfiguration,
}

impl SimRadar {
    fn new(presence: Rc<Cell<bool>>) -> Self {
        Self {
            presence,
            started: None,
            last_frame: None,
            engineering: false,
            configuration: factory_configuration(),
        }
    }

    fn started(&self) -> Result<(), SimError> {
        self.started.map(|_| ()).ok_or(SimError::NotStarted)
    }

    fn frame_at(&self, secs: u64) -> RadarFrame {
        let mut frame = RadarFrame::default();
        let phase = secs % CYCLE_SECS;
        let max_cm = u16::from(self.configuration.max_moving_gate) * GATE_CM;
        match phase {
            // Walking in
            10..=29 => {
                frame.moving_detected = true;
                frame.moving_distance_cm = max_cm.saturating_sub((phase as u16 - 10) * 25);
                frame.moving_energy = 60 + (phase % 7) as u8 * 5;
            }
            // Sitting
            30..=59 => {
                frame.stationary_detected = true;
                frame.stationary_distance_cm = max_cm.saturating_sub(500);
                frame.stationary_energy = 40 + (phase % 5) as u8;
                frame.moving_detected = phase % 10 == 0;
                frame.moving_distance_cm = frame.stationary_distance_cm;
                frame.moving_energy = if frame.moving_detected { 30 } else { 0 };
            }
            // Walking out
            60..=74 => {
                frame.moving_detected = true;
                frame.moving_distance_cm = max_cm.saturating_sub(500) + (phase as u16 - 60) * 25;
                frame.moving_energy = 55;
            }
            _ => {}
        }
        frame.detection_distance_cm = frame.moving_distance_cm.max(frame.stationary_distance_cm);

        if self.engineering {
            for (gate, reading) in frame.gates.iter_mut().enumerate() {
                let sensitivity = self.configuration.gates[gate];
                let near = |cm: u16| usize::from(cm / GATE_CM) == gate;
                *reading = GateReading {
                    moving_threshold: sensitivity.moving,
                    moving_energy: if frame.moving_detected && near(frame.moving_distance_cm) {
                        frame.moving_energy
                    } else {
                        5
                    },
                    stationary_threshold: sensitivity.stationary,
                    stationary_energy: if frame.stationary_detected && near(frame.stationary_distance_cm) {
                        frame.stationary_energy
                    } else {
                        3
                    },
                };
            }
        }
        frame
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

impl RadarDriver for SimRadar {
    type Error = SimError;

    fn begin(&mut self, baud: u32) -> Result<(), SimError> {
        info!("sim radar: handshake at {} baud", baud);
        self.started = Some(Instant::now());
        self.last_frame = None;
        Ok(())
    }

    fn poll(&mut self) -> Option<RadarFrame> {
        let started = self.started?;
        let now = Instant::now();
        if self.last_frame.is_some_and(|t| now.duration_since(t) < FRAME_INTERVAL) {
            return None;
        }
        self.last_frame = Some(now);
        let frame = self.frame_at(now.duration_since(started).as_secs());
        self.presence.set(frame.presence_detected());
        Some(frame)
    }

    fn is_connected(&self) -> bool {
        self.last_frame.is_some_and(|t| t.elapsed() < FRAME_INTERVAL * 10)
    }

    fn request_start_engineering_mode(&mut self) -> Result<(), SimError> {
        self.started()?;
        self.engineering = true;
        Ok(())
    }

    fn request_end_engineering_mode(&mut self) -> Result<(), SimError> {
        self.started()?;
        self.engineering = false;
        Ok(())
    }

    fn request_current_configuration(&mut self) -> Result<GateConfiguration, SimError> {
        self.started()?;
        Ok(self.configuration)
    }

    fn set_max_values(&mut self, moving_gate: u8, stationary_gate: u8, idle_seconds: u16) -> Result<(), SimError> {
        self.started()?;
        self.configuration.max_moving_gate = moving_gate;
        self.configuration.max_stationary_gate = stationary_gate;
        self.configuration.idle_seconds = idle_seconds;
        Ok(())
    }

    fn set_gate_sensitivity_threshold(&mut self, gate: u8, moving: u8, stationary: u8) -> Result<(), SimError> {
        self.started()?;
        let sensitivity = GateSensitivity { moving, stationary };
        match self.configuration.gates.get_mut(usize::from(gate)) {
            Some(slot) => *slot = sensitivity,
            None => self.configuration.gates = [sensitivity; MAX_GATES],
        }
        Ok(())
    }

    fn request_restart(&mut self) -> Result<(), SimError> {
        self.started()?;
        info!("sim radar: restart");
        self.engineering = false;
        self.last_frame = None;
        Ok(())
    }

    fn request_firmware_version(&mut self) -> Result<String, SimError> {
        self.started()?;
        Ok("V2.04.23022511".into())
    }

    fn request_factory_reset(&mut self) -> Result<(), SimError> {
        self.started()?;
        self.configuration = factory_configuration();
        Ok(())
    }

    fn protocol_info(&self) -> ProtocolInfo {
        match self.started {
            Some(_) => ProtocolInfo {
                protocol_version: 1,
                buffer_size: 64,
            },
            None => ProtocolInfo::default(),
        }
    }
}
