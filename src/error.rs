//! Error types for the radar session and configuration.
//!
//! Hardware seams keep their own associated error types. They are folded into
//! [`RadarError`] at the [`RadarLink`](crate::session::RadarLink) boundary, and
//! the command protocol turns any `RadarError` into a `"1"` response whose
//! detail body is the error's `Display` text. Nothing here ever reaches the
//! scheduler.

extern crate alloc;

use alloc::string::String;
use thiserror::Error;

/// Failures surfaced by radar commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RadarError {
    /// No valid frame has been seen recently.
    #[error("Reading from sensor: failed to read, radar not connected")]
    NotConnected,

    /// The module rejected or did not answer a request.
    #[error("{0}: failed")]
    HardwareCommandFailed(&'static str),

    /// An argument fell outside its documented range. No hardware was contacted.
    #[error("{0}, try again")]
    InvalidArgumentRange(String),

    /// The command line matched neither a mnemonic nor a numeric code.
    #[error("Unknown command: {0}")]
    UnrecognizedCommand(String),

    /// The configuration read-back failed.
    #[error("Reading configuration from sensor: Failed")]
    ConfigurationQueryFailed,
}

/// Configuration validation failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Broadcast interval outside 10-361 seconds.
    #[error("broadcast interval {0}ms outside 10000-361000ms")]
    BroadcastInterval(u32),

    /// Telemetry interval outside 10ms-3000s.
    #[error("telemetry interval {0}ms outside 10-3000000ms")]
    TelemetryInterval(u32),

    /// Edge-hold strategy configured with a zero hold time.
    #[error("hold interval must be greater than zero")]
    ZeroHoldInterval,

    /// Radar flags are already filtered by the module and must use level refresh.
    #[error("radar-flag presence source requires the level-refresh strategy")]
    IncompatibleDebounce,
}
