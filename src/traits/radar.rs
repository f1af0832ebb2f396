//! Radar module driver contract.
//!
//! The wire protocol of the radar module is owned by a vendor frame decoder.
//! This crate only calls its documented request/response operations and
//! trusts their return codes. [`RadarDriver`] is that contract.
//!
//! # Implementation Notes
//!
//! - `poll()` is called every tick whether or not the link is up. It should
//!   consume whatever bytes the UART has buffered and return a frame only when
//!   a complete one was decoded.
//! - `is_connected()` is liveness ("a valid frame arrived recently"), not the
//!   electrical state of the UART.
//! - Configuration requests block until the module answers or the decoder's
//!   own timeout expires.
//!
//! # Example Implementation
//!
//! ```rust,ignore
//! use mmwave_occupancy::traits::RadarDriver;
//!
//! struct Ld2410Uart { /* uart handle, decoder state */ }
//!
//! impl RadarDriver for Ld2410Uart {
//!     type Error = DecoderError;
//!
//!     fn begin(&mut self, baud: u32) -> Result<(), DecoderError> {
//!         self.uart.set_baudrate(baud)?;
//!         self.read_firmware_version().map(|_| ())
//!     }
//!     // ...
//! }
//! ```

extern crate alloc;

use alloc::string::String;

use crate::frame::{GateConfiguration, ProtocolInfo, RadarFrame};

/// Vendor frame decoder operations used by the radar session.
pub trait RadarDriver {
    /// Error type for decoder requests.
    type Error: core::fmt::Debug;

    /// Opens the serial link at `baud` and performs the module handshake.
    fn begin(&mut self, baud: u32) -> Result<(), Self::Error>;

    /// Feeds buffered bytes to the decoder.
    ///
    /// Returns the newly decoded frame, if one completed.
    fn poll(&mut self) -> Option<RadarFrame>;

    /// Returns true if a valid frame was seen recently.
    fn is_connected(&self) -> bool;

    /// Switches the module to engineering (per-gate) reporting.
    fn request_start_engineering_mode(&mut self) -> Result<(), Self::Error>;

    /// Switches the module back to target-only reporting.
    fn request_end_engineering_mode(&mut self) -> Result<(), Self::Error>;

    /// Reads the full gate configuration from the module.
    fn request_current_configuration(&mut self) -> Result<GateConfiguration, Self::Error>;

    /// Writes the farthest moving/stationary gates and the idle hold time.
    fn set_max_values(
        &mut self,
        moving_gate: u8,
        stationary_gate: u8,
        idle_seconds: u16,
    ) -> Result<(), Self::Error>;

    /// Writes the sensitivity thresholds of one gate (or all gates for 255).
    fn set_gate_sensitivity_threshold(
        &mut self,
        gate: u8,
        moving: u8,
        stationary: u8,
    ) -> Result<(), Self::Error>;

    /// Restarts the module.
    fn request_restart(&mut self) -> Result<(), Self::Error>;

    /// Queries the firmware version string.
    fn request_firmware_version(&mut self) -> Result<String, Self::Error>;

    /// Resets the module configuration to factory defaults.
    fn request_factory_reset(&mut self) -> Result<(), Self::Error>;

    /// Protocol details captured during the handshake.
    ///
    /// Fields are zero if the handshake has not completed.
    fn protocol_info(&self) -> ProtocolInfo;
}
