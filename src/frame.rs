//! Radar data model: decoded frames, gate configuration, and module info.
//!
//! A [`RadarFrame`] is one decoded unit of telemetry from the vendor protocol
//! decoder. It carries the target-mode summary (moving/stationary distances and
//! energies) and, when the module reports in engineering mode, the per-gate
//! energy detail alongside the gate thresholds the decoder last saw.
//!
//! # Gates
//!
//! The module divides its range into [`MAX_GATES`] fixed-width buckets
//! ("gates"), each with its own moving and stationary sensitivity threshold.
//!
//! ```rust
//! use mmwave_occupancy::frame::{RadarFrame, Trigger};
//!
//! let frame = RadarFrame {
//!     moving_detected: true,
//!     moving_distance_cm: 120,
//!     ..Default::default()
//! };
//! assert!(frame.presence_detected());
//! assert_eq!(frame.trigger(), Trigger::Moving);
//! ```

/// Number of range gates reported by the module.
pub const MAX_GATES: usize = 9;

/// Highest gate index accepted as a maximum moving/stationary gate.
pub const MAX_CONFIGURABLE_GATE: u8 = 8;

/// Gate index meaning "apply to every gate" for sensitivity writes.
pub const ALL_GATES: u8 = 255;

/// Centimeters to feet.
pub const CM_TO_FEET: f32 = 0.0328084;

/// Per-gate engineering detail.
///
/// Thresholds are the sensitivities the decoder holds for the gate; energies
/// are the live readings from the most recent engineering frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateReading {
    /// Moving-target sensitivity threshold (0-100).
    pub moving_threshold: u8,
    /// Moving-target energy measured in this gate.
    pub moving_energy: u8,
    /// Stationary-target sensitivity threshold (0-100).
    pub stationary_threshold: u8,
    /// Stationary-target energy measured in this gate.
    pub stationary_energy: u8,
}

/// One decoded radar frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RadarFrame {
    /// The module reports a moving target.
    pub moving_detected: bool,
    /// The module reports a stationary target.
    pub stationary_detected: bool,
    /// Distance to the moving target in centimeters.
    pub moving_distance_cm: u16,
    /// Moving target energy.
    pub moving_energy: u8,
    /// Distance to the stationary target in centimeters.
    pub stationary_distance_cm: u16,
    /// Stationary target energy.
    pub stationary_energy: u8,
    /// Overall detection distance in centimeters.
    pub detection_distance_cm: u16,
    /// Engineering-mode retained data value.
    pub retain_value: u8,
    /// Per-gate detail (zeroed outside engineering mode).
    pub gates: [GateReading; MAX_GATES],
}

impl RadarFrame {
    /// Returns true if either target flag is set.
    #[inline]
    pub fn presence_detected(&self) -> bool {
        self.moving_detected || self.stationary_detected
    }

    /// Classifies the frame by which target flags are set.
    pub fn trigger(&self) -> Trigger {
        Trigger::from_flags(self.moving_detected, self.stationary_detected)
    }
}

/// What triggered the current presence decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Trigger {
    /// Both a moving and a stationary target.
    StationaryAndMoving,
    /// Only a stationary target.
    Stationary,
    /// Only a moving target.
    Moving,
    /// Nothing detected.
    NotPresent,
}

impl Trigger {
    /// Maps a `(moving, stationary)` flag pair to a trigger.
    ///
    /// ```rust
    /// use mmwave_occupancy::frame::Trigger;
    ///
    /// assert_eq!(Trigger::from_flags(true, true), Trigger::StationaryAndMoving);
    /// assert_eq!(Trigger::from_flags(false, true), Trigger::Stationary);
    /// assert_eq!(Trigger::from_flags(true, false), Trigger::Moving);
    /// assert_eq!(Trigger::from_flags(false, false), Trigger::NotPresent);
    /// ```
    pub const fn from_flags(moving: bool, stationary: bool) -> Self {
        match (moving, stationary) {
            (true, true) => Trigger::StationaryAndMoving,
            (false, true) => Trigger::Stationary,
            (true, false) => Trigger::Moving,
            (false, false) => Trigger::NotPresent,
        }
    }

    /// Wire text used in the occupancy record.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Trigger::StationaryAndMoving => "Stationary and Moving",
            Trigger::Stationary => "Stationary",
            Trigger::Moving => "Moving",
            Trigger::NotPresent => "Not Present",
        }
    }
}

/// Moving and stationary sensitivity for one gate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateSensitivity {
    /// Moving-target sensitivity (0-100).
    pub moving: u8,
    /// Stationary-target sensitivity (0-100).
    pub stationary: u8,
}

/// Full gate configuration as read back from the module.
///
/// Never cached by the core: every `readconfig` re-queries the hardware.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateConfiguration {
    /// Highest gate index the module supports.
    pub max_gate: u8,
    /// Farthest gate used for moving targets.
    pub max_moving_gate: u8,
    /// Farthest gate used for stationary targets.
    pub max_stationary_gate: u8,
    /// Seconds the module holds presence after the last detection.
    pub idle_seconds: u16,
    /// Sensitivity per gate.
    pub gates: [GateSensitivity; MAX_GATES],
}

/// Protocol details reported by the module during the handshake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolInfo {
    /// Communication protocol version.
    pub protocol_version: u16,
    /// Module communication buffer size in bytes.
    pub buffer_size: u16,
}

/// Converts centimeters to feet.
#[inline]
pub fn cm_to_feet(cm: u16) -> f32 {
    cm as f32 * CM_TO_FEET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_strings() {
        assert_eq!(Trigger::StationaryAndMoving.as_str(), "Stationary and Moving");
        assert_eq!(Trigger::Stationary.as_str(), "Stationary");
        assert_eq!(Trigger::Moving.as_str(), "Moving");
        assert_eq!(Trigger::NotPresent.as_str(), "Not Present");
    }

    #[test]
    fn trigger_follows_flags() {
        let mut frame = RadarFrame::default();
        assert_eq!(frame.trigger(), Trigger::NotPresent);
        assert!(!frame.presence_detected());

        frame.stationary_detected = true;
        assert_eq!(frame.trigger(), Trigger::Stationary);

        frame.moving_detected = true;
        assert_eq!(frame.trigger(), Trigger::StationaryAndMoving);

        frame.stationary_detected = false;
        assert_eq!(frame.trigger(), Trigger::Moving);
        assert!(frame.presence_detected());
    }

    #[test]
    fn cm_to_feet_conversion() {
        assert!((cm_to_feet(100) - 3.28084).abs() < 0.0001);
        assert_eq!(cm_to_feet(0), 0.0);
    }

    #[test]
    fn default_frame_has_all_gates() {
        let frame = RadarFrame::default();
        assert_eq!(frame.gates.len(), MAX_GATES);
    }
}
