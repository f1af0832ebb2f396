//! Line-oriented command protocol.
//!
//! Input arrives one character at a time (console) or one full line at a time
//! (the settable command property). Both paths end in the same two steps:
//!
//! 1. [`Command::parse`] turns a line into a canonical [`Command`]. A line
//!    matches by numeric code (`1`-`12`) or by case-insensitive mnemonic.
//! 2. [`CommandProcessor::execute`] runs it against the radar session and
//!    returns a [`CommandResponse`].
//!
//! # Response format
//!
//! Every response is a status code, `"0"` for success or `"1"` for failure,
//! optionally followed by a newline and a detail body:
//!
//! ```text
//! 0\nReading from sensor: OK\nMoving target: 120 cm energy: 43 dBZ
//! 1\nUnknown command: foobar
//! ```
//!
//! # Commands
//!
//! | Code | Mnemonic | Arguments |
//! |------|----------|-----------|
//! | 1 | `help` | |
//! | 2 | `streamstart` | |
//! | 3 | `streamstop` | |
//! | 4 | `read` | |
//! | 5 | `readconfig` | |
//! | 6 | `setmaxvalues` | moving gate (1-8), stationary gate (1-8), idle seconds (0-65535) |
//! | 7 | `setsensitivity` | gate (0-8, or 255 for all), moving (0-100), stationary (0-100) |
//! | 8 | `restart` | |
//! | 9 | `readversion` | |
//! | 10 | `factoryreset` | |
//! | 11 | `deviceinfo` | |
//! | 12 | `reboot` | |
//!
//! Missing or non-numeric arguments read as zero. Negative or oversized
//! numbers keep their sign and magnitude, so the range check rejects them
//! before any hardware write.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use core::fmt::{self, Write};
use core::num::IntErrorKind;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::{short_string, ShortString};
use crate::error::RadarError;
use crate::frame::{ALL_GATES, MAX_CONFIGURABLE_GATE};
use crate::session::{hardware_failure, RadarLink};
use crate::traits::{HostControl, RadarDriver};

/// Status code for a successful command.
pub const RESPONSE_OK: &str = "0";

/// Status code for a failed command.
pub const RESPONSE_FAIL: &str = "1";

/// Maximum buffered line length in bytes.
pub const MAX_LINE: usize = 128;

/// Console prompt written after every response.
pub const PROMPT: &str = "\n choose:> ";

/// Highest accepted sensitivity value.
pub const MAX_SENSITIVITY: i64 = 100;

// ============================================================================
// Command
// ============================================================================

/// One parsed command line.
///
/// Numeric arguments are kept signed and at full width so out-of-range
/// input is rejected instead of silently truncated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// List the supported commands.
    Help,
    /// Enable periodic telemetry publication.
    StreamStart,
    /// Disable periodic telemetry publication.
    StreamStop,
    /// Report the live frame.
    Read,
    /// Query and report the gate configuration.
    ReadConfig,
    /// Write the farthest gates and the idle hold time.
    SetMaxValues {
        /// Farthest gate for moving targets.
        moving_gate: i64,
        /// Farthest gate for stationary targets.
        stationary_gate: i64,
        /// Idle hold time in seconds.
        idle_seconds: i64,
    },
    /// Write the sensitivity of one gate, or of all gates.
    SetSensitivity {
        /// Gate index, or [`ALL_GATES`].
        gate: i64,
        /// Moving-target sensitivity.
        moving: i64,
        /// Stationary-target sensitivity.
        stationary: i64,
    },
    /// Restart the module and re-enter the reporting mode.
    Restart,
    /// Query the firmware version.
    ReadVersion,
    /// Reset the module configuration.
    FactoryReset,
    /// Report mode, protocol and firmware details.
    DeviceInfo,
    /// Restart the host controller.
    Reboot,
    /// Anything else. Holds the trimmed input.
    Unknown(String),
}

/// Reads one argument token. Missing or non-numeric tokens are 0; numbers
/// beyond `i64` saturate.
fn numeric_arg(token: Option<&str>) -> i64 {
    let Some(token) = token else {
        return 0;
    };
    match token.parse::<i64>() {
        Ok(value) => value,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => 0,
        },
    }
}

const MNEMONICS: [&str; 12] = [
    "help",
    "streamstart",
    "streamstop",
    "read",
    "readconfig",
    "setmaxvalues",
    "setsensitivity",
    "restart",
    "readversion",
    "factoryreset",
    "deviceinfo",
    "reboot",
];

impl Command {
    /// Parses a command line.
    ///
    /// ```rust
    /// use mmwave_occupancy::commands::Command;
    ///
    /// assert_eq!(Command::parse("2"), Command::StreamStart);
    /// assert_eq!(Command::parse("StreamStart"), Command::StreamStart);
    /// assert_eq!(
    ///     Command::parse("setmaxvalues 3 x"),
    ///     Command::SetMaxValues { moving_gate: 3, stationary_gate: 0, idle_seconds: 0 },
    /// );
    /// ```
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut tokens = line.split_whitespace();
        let head = tokens.next().unwrap_or("");

        let code = if !head.is_empty() && head.bytes().all(|b| b.is_ascii_digit()) {
            head.parse::<u8>().ok()
        } else {
            MNEMONICS
                .iter()
                .position(|m| m.eq_ignore_ascii_case(head))
                .map(|i| i as u8 + 1)
        };

        let mut arg = || numeric_arg(tokens.next());

        match code {
            Some(1) => Command::Help,
            Some(2) => Command::StreamStart,
            Some(3) => Command::StreamStop,
            Some(4) => Command::Read,
            Some(5) => Command::ReadConfig,
            Some(6) => Command::SetMaxValues {
                moving_gate: arg(),
                stationary_gate: arg(),
                idle_seconds: arg(),
            },
            Some(7) => Command::SetSensitivity {
                gate: arg(),
                moving: arg(),
                stationary: arg(),
            },
            Some(8) => Command::Restart,
            Some(9) => Command::ReadVersion,
            Some(10) => Command::FactoryReset,
            Some(11) => Command::DeviceInfo,
            Some(12) => Command::Reboot,
            _ => Command::Unknown(line.to_string()),
        }
    }

    /// Numeric code, or `None` for [`Command::Unknown`].
    pub fn code(&self) -> Option<u8> {
        let code = match self {
            Command::Help => 1,
            Command::StreamStart => 2,
            Command::StreamStop => 3,
            Command::Read => 4,
            Command::ReadConfig => 5,
            Command::SetMaxValues { .. } => 6,
            Command::SetSensitivity { .. } => 7,
            Command::Restart => 8,
            Command::ReadVersion => 9,
            Command::FactoryReset => 10,
            Command::DeviceInfo => 11,
            Command::Reboot => 12,
            Command::Unknown(_) => return None,
        };
        Some(code)
    }

    /// Canonical mnemonic, or `None` for [`Command::Unknown`].
    pub fn mnemonic(&self) -> Option<&'static str> {
        self.code().map(|c| MNEMONICS[c as usize - 1])
    }
}

// ============================================================================
// Response
// ============================================================================

/// Result of one command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandResponse {
    /// Whether the command succeeded.
    pub ok: bool,
    /// Multi-line detail. May be empty.
    pub body: String,
}

impl CommandResponse {
    /// A success response.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            ok: true,
            body: body.into(),
        }
    }

    /// A failure response.
    pub fn fail(body: impl Into<String>) -> Self {
        Self {
            ok: false,
            body: body.into(),
        }
    }

    /// Status code, `"0"` or `"1"`.
    pub fn code(&self) -> &'static str {
        if self.ok {
            RESPONSE_OK
        } else {
            RESPONSE_FAIL
        }
    }

    /// Wire text: the status code, then `"\n"` and the body if there is one.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl From<RadarError> for CommandResponse {
    fn from(err: RadarError) -> Self {
        CommandResponse::fail(err.to_string())
    }
}

impl fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())?;
        if !self.body.is_empty() {
            write!(f, "\n{}", self.body)?;
        }
        Ok(())
    }
}

// ============================================================================
// Line buffer
// ============================================================================

/// Accumulates console bytes into command lines.
///
/// Carriage returns are discarded. A newline hands back the accumulated line
/// and clears the buffer. Bytes past [`MAX_LINE`] are dropped. Lines are
/// kept as raw bytes so multi-byte UTF-8 input survives until dispatch.
#[derive(Clone, Debug, Default)]
pub struct LineBuffer {
    line: heapless::Vec<u8, MAX_LINE>,
    overflowed: bool,
}

impl LineBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte. Returns the completed line on newline.
    pub fn push(&mut self, byte: u8) -> Option<heapless::Vec<u8, MAX_LINE>> {
        match byte {
            b'\n' => {
                if self.overflowed {
                    debug!("command line truncated at {} bytes", MAX_LINE);
                    self.overflowed = false;
                }
                Some(core::mem::take(&mut self.line))
            }
            b'\r' => None,
            b => {
                if self.line.push(b).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Current partial line.
    pub fn as_bytes(&self) -> &[u8] {
        &self.line
    }

    /// Returns true if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }
}

// ============================================================================
// Processor
// ============================================================================

/// Everything a command may touch, borrowed for the duration of one command.
pub struct CommandContext<'a, R: RadarDriver, D: DelayNs, H: HostControl> {
    /// The radar session.
    pub link: &'a mut RadarLink<R>,
    /// Blocking delay for settle waits.
    pub delay: &'a mut D,
    /// Host controller.
    pub host: &'a mut H,
    /// Periodic telemetry switch.
    pub reporting_enabled: &'a mut bool,
    /// Current debounced presence.
    pub motion: bool,
}

/// Executes parsed commands.
#[derive(Clone, Debug)]
pub struct CommandProcessor {
    node_name: ShortString,
    restart_settle_ms: u32,
}

impl CommandProcessor {
    /// Creates a processor. `node_name` appears in `help` and `deviceinfo`.
    pub fn new(node_name: &str, restart_settle_ms: u32) -> Self {
        Self {
            node_name: short_string(node_name),
            restart_settle_ms,
        }
    }

    /// Parses and executes one line.
    pub fn dispatch<R, D, H>(&self, line: &str, ctx: &mut CommandContext<'_, R, D, H>) -> CommandResponse
    where
        R: RadarDriver,
        D: DelayNs,
        H: HostControl,
    {
        let command = Command::parse(line);
        debug!("dispatching {:?}", command);
        self.execute(command, ctx)
    }

    /// Executes one command.
    ///
    /// Every failure becomes a `"1"` response. Nothing is returned as an error.
    pub fn execute<R, D, H>(&self, command: Command, ctx: &mut CommandContext<'_, R, D, H>) -> CommandResponse
    where
        R: RadarDriver,
        D: DelayNs,
        H: HostControl,
    {
        let result = match command {
            Command::Help => Ok(self.help()),
            Command::StreamStart => {
                *ctx.reporting_enabled = true;
                Ok("Telemetry stream enabled.".to_string())
            }
            Command::StreamStop => {
                *ctx.reporting_enabled = false;
                Ok("Telemetry stream disabled.".to_string())
            }
            Command::Read => read(ctx),
            Command::ReadConfig => read_config(ctx.link),
            Command::SetMaxValues {
                moving_gate,
                stationary_gate,
                idle_seconds,
            } => self.set_max_values(ctx, moving_gate, stationary_gate, idle_seconds),
            Command::SetSensitivity {
                gate,
                moving,
                stationary,
            } => self.set_sensitivity(ctx, gate, moving, stationary),
            Command::Restart => ctx
                .link
                .restart(&mut *ctx.delay, self.restart_settle_ms)
                .map(|()| "Restarting sensor: OK".to_string()),
            Command::ReadVersion => ctx
                .link
                .driver_mut()
                .request_firmware_version()
                .map(|v| format!("Requesting firmware version: {}", v))
                .map_err(|e| hardware_failure("Requesting firmware version", e)),
            Command::FactoryReset => ctx
                .link
                .driver_mut()
                .request_factory_reset()
                .map(|()| "Factory resetting sensor: OK, now restart sensor to take effect".to_string())
                .map_err(|e| hardware_failure("Factory resetting sensor", e)),
            Command::DeviceInfo => Ok(self.device_info(ctx.link)),
            Command::Reboot => {
                info!("rebooting host controller");
                ctx.host.reboot();
                Ok("Rebooting host controller".to_string())
            }
            Command::Unknown(input) => Err(RadarError::UnrecognizedCommand(input)),
        };

        match result {
            Ok(body) => CommandResponse::ok(body),
            Err(e) => {
                debug!("command failed: {}", e);
                e.into()
            }
        }
    }

    fn help(&self) -> String {
        let mut s = String::new();
        let _ = write!(s, "Node: {}\nSupported commands:", self.node_name);
        s.push_str(
            "\n\t( 1) help:          this text.\
             \n\t( 2) streamstart:   start publishing telemetry.\
             \n\t( 3) streamstop:    stop publishing telemetry.\
             \n\t( 4) read:          read current values from the sensor\
             \n\t( 5) readconfig:    read the configuration from the sensor\
             \n\t( 6) setmaxvalues   <motion gate> <stationary gate> <inactivitytimer> (1-8) (1-8) (0-65535)seconds\
             \n\t( 7) setsensitivity <gate> <motionsensitivity> <stationarysensitivity> (0-8|255) (0-100) (0-100)\
             \n\t( 8) restart:       restart the sensor\
             \n\t( 9) readversion:   read firmware version\
             \n\t(10) factoryreset:  factory reset the sensor\
             \n\t(11) deviceinfo:    device info\
             \n\t(12) reboot:        reboot hosting micro-controller",
        );
        s
    }

    fn set_max_values<R, D, H>(
        &self,
        ctx: &mut CommandContext<'_, R, D, H>,
        moving_gate: i64,
        stationary_gate: i64,
        idle_seconds: i64,
    ) -> Result<String, RadarError>
    where
        R: RadarDriver,
        D: DelayNs,
        H: HostControl,
    {
        let gate_range = 1..=i64::from(MAX_CONFIGURABLE_GATE);
        if !gate_range.contains(&moving_gate) || !gate_range.contains(&stationary_gate) {
            return Err(RadarError::InvalidArgumentRange(format!(
                "Can't set distances to {} moving {} stationary",
                moving_gate, stationary_gate
            )));
        }
        let idle = u16::try_from(idle_seconds).map_err(|_| {
            RadarError::InvalidArgumentRange(format!("Can't set inactivity timer to {}s", idle_seconds))
        })?;

        ctx.link
            .driver_mut()
            .set_max_values(moving_gate as u8, stationary_gate as u8, idle)
            .map_err(|e| hardware_failure("Setting max values", e))?;
        ctx.link.restart(&mut *ctx.delay, self.restart_settle_ms)?;

        Ok(format!(
            "Setting max values to gate {} moving targets, gate {} stationary targets, {}s inactivity timer: OK\n\
             Restarting sensor: OK",
            moving_gate, stationary_gate, idle
        ))
    }

    fn set_sensitivity<R, D, H>(
        &self,
        ctx: &mut CommandContext<'_, R, D, H>,
        gate: i64,
        moving: i64,
        stationary: i64,
    ) -> Result<String, RadarError>
    where
        R: RadarDriver,
        D: DelayNs,
        H: HostControl,
    {
        let gate_ok = (0..=i64::from(MAX_CONFIGURABLE_GATE)).contains(&gate) || gate == i64::from(ALL_GATES);
        let sensitivity = 0..=MAX_SENSITIVITY;
        if !gate_ok || !sensitivity.contains(&moving) || !sensitivity.contains(&stationary) {
            return Err(RadarError::InvalidArgumentRange(format!(
                "Can't set gate {} motion sensitivity to {} dBZ & stationary sensitivity to {} dBZ",
                gate, moving, stationary
            )));
        }

        ctx.link
            .driver_mut()
            .set_gate_sensitivity_threshold(gate as u8, moving as u8, stationary as u8)
            .map_err(|e| hardware_failure("Setting gate sensitivity", e))?;
        ctx.link.restart(&mut *ctx.delay, self.restart_settle_ms)?;

        Ok(format!(
            "Setting gate {} motion sensitivity to {} dBZ & stationary sensitivity to {} dBZ: OK\n\
             Restarting sensor: OK",
            gate, moving, stationary
        ))
    }

    fn device_info<R: RadarDriver>(&self, link: &mut RadarLink<R>) -> String {
        let firmware = link.driver_mut().request_firmware_version().unwrap_or_else(|e| {
            warn!("firmware version unavailable: {:?}", e);
            String::new()
        });
        let protocol = link.driver().protocol_info();

        let mut s = String::new();
        let _ = write!(
            s,
            "Device Information for Node: {}\
             \n\tData reporting mode: {}\
             \n\tCommunication protocol version: v{}.0\
             \n\tCommunications Buffer Size: {} bytes\
             \n\tDevice firmware version: {}\
             \n\tEngineering retain data value: {}",
            self.node_name,
            link.mode().as_str(),
            protocol.protocol_version,
            protocol.buffer_size,
            firmware,
            link.frame().retain_value,
        );
        s
    }
}

fn read<R, D, H>(ctx: &mut CommandContext<'_, R, D, H>) -> Result<String, RadarError>
where
    R: RadarDriver,
    D: DelayNs,
    H: HostControl,
{
    if !ctx.link.is_connected() {
        return Err(RadarError::NotConnected);
    }
    let frame = *ctx.link.frame();

    let mut s = String::from("Reading from sensor: OK");
    if frame.stationary_detected {
        let _ = write!(
            s,
            "\nStationary target: {} cm energy: {} dBZ",
            frame.stationary_distance_cm, frame.stationary_energy
        );
    }
    if frame.moving_detected {
        let _ = write!(
            s,
            "\nMoving target: {} cm energy: {} dBZ",
            frame.moving_distance_cm, frame.moving_energy
        );
    }
    if !frame.presence_detected() {
        if ctx.motion {
            // Module output still high: it is inside its own idle hold window
            match ctx.link.driver_mut().request_current_configuration() {
                Ok(config) => {
                    let _ = write!(
                        s,
                        "\nNo Detection, in Idle Hold window of: {} seconds",
                        config.idle_seconds
                    );
                }
                Err(_) => s.push_str("\nNo Detection, in Idle Hold window"),
            }
        } else {
            s.push_str("\nnothing detected");
        }
    }
    Ok(s)
}

fn read_config<R: RadarDriver>(link: &mut RadarLink<R>) -> Result<String, RadarError> {
    let config = link.driver_mut().request_current_configuration().map_err(|e| {
        warn!("configuration query failed: {:?}", e);
        RadarError::ConfigurationQueryFailed
    })?;

    let mut s = String::from("Reading configuration from sensor: OK");
    let _ = write!(
        s,
        "\nMaximum gate ID: {}\
         \nMaximum gate for moving targets: {}\
         \nMaximum gate for stationary targets: {}\
         \nIdle time for targets: {}s\
         \nGate sensitivity",
        config.max_gate, config.max_moving_gate, config.max_stationary_gate, config.idle_seconds,
    );
    for (i, gate) in config.gates.iter().enumerate() {
        let _ = write!(
            s,
            "\nGate {} moving targets: {} dBZ stationary targets: {} dBZ",
            i, gate.moving, gate.stationary
        );
    }
    Ok(s)
}
