//! Telemetry encodings for the current radar frame.
//!
//! Two renderers, both pure functions of a [`RadarFrame`]:
//!
//! - [`render_engineering_frame`]: the tagged CSV record consumed by the
//!   SerialStudio visualizer. Field order and comma layout are a byte-level
//!   contract with that tool.
//! - [`render_occupancy_record`]: a compact JSON record for the `occupancy`
//!   property, distances in feet.
//!
//! [`render`] picks one based on the session's [`ReportingMode`].
//!
//! # Engineering frame layout
//!
//! ```text
//! /*{name},{stDist},{detDist},{stEnergy},{mvDist},{detDist},{mvEnergy},{retain},{motion},
//!   then per gate: {mvThreshold},{mvEnergy},{stThreshold},{stEnergy},
//! */
//! ```
//!
//! The record is a single line; every field, including the last gate's, is
//! followed by a comma.

extern crate alloc;

use alloc::string::String;
use core::fmt::Write;

use crate::frame::{cm_to_feet, RadarFrame};
#[cfg(feature = "serde")]
use crate::frame::Trigger;
use crate::session::ReportingMode;

/// Record name for the target-mode JSON record.
pub const TARGET_RECORD_NAME: &str = "OccupancyTarget";

/// Record name for the engineering CSV frame.
pub const ENGINEERING_RECORD_NAME: &str = "OccupancyEngineering";

/// Renders the SerialStudio engineering frame.
///
/// `motion` is the debounced presence and is encoded as `100` or `0` so the
/// visualizer can plot it on the energy scale.
///
/// ```rust
/// use mmwave_occupancy::frame::RadarFrame;
/// use mmwave_occupancy::telemetry::render_engineering_frame;
///
/// let csv = render_engineering_frame("Sensor", &RadarFrame::default(), true);
/// assert!(csv.starts_with("/*Sensor,0,0,0,0,0,0,0,100,0,0,0,0,"));
/// assert!(csv.ends_with("*/\n"));
/// ```
pub fn render_engineering_frame(name: &str, frame: &RadarFrame, motion: bool) -> String {
    let mut out = String::with_capacity(64 + frame.gates.len() * 16);
    // Writes into a String cannot fail
    let _ = write!(
        out,
        "/*{},{},{},{},{},{},{},{},{},",
        name,
        frame.stationary_distance_cm,
        frame.detection_distance_cm,
        frame.stationary_energy,
        frame.moving_distance_cm,
        frame.detection_distance_cm,
        frame.moving_energy,
        frame.retain_value,
        if motion { 100 } else { 0 },
    );
    for gate in &frame.gates {
        let _ = write!(
            out,
            "{},{},{},{},",
            gate.moving_threshold, gate.moving_energy, gate.stationary_threshold, gate.stationary_energy,
        );
    }
    out.push_str("*/\n");
    out
}

/// Renders the occupancy JSON record.
///
/// Distances are converted to feet and printed with two decimals.
///
/// ```rust
/// use mmwave_occupancy::frame::RadarFrame;
/// use mmwave_occupancy::telemetry::render_occupancy_record;
///
/// let frame = RadarFrame {
///     moving_detected: true,
///     moving_distance_cm: 100,
///     moving_energy: 42,
///     detection_distance_cm: 100,
///     ..Default::default()
/// };
/// let json = render_occupancy_record("OccupancyTarget", &frame);
/// assert!(json.contains(r#""triggeredBy":"Moving""#));
/// assert!(json.contains(r#""movingTargetDistanceFeet":3.28"#));
/// ```
pub fn render_occupancy_record(name: &str, frame: &RadarFrame) -> String {
    let mut out = String::with_capacity(224);
    out.push_str("{\"name\":\"");
    push_escaped(&mut out, name);
    let _ = write!(
        out,
        "\",\"triggeredBy\":\"{}\",\"detectionDistanceFeet\":{:.2},\
         \"movingTargetDistanceFeet\":{:.2},\"movingTargetEnergy\":{},\
         \"stationaryTargetDistanceFeet\":{:.2},\"stationaryTargetEnergy\":{}}}",
        frame.trigger().as_str(),
        cm_to_feet(frame.detection_distance_cm),
        cm_to_feet(frame.moving_distance_cm),
        frame.moving_energy,
        cm_to_feet(frame.stationary_distance_cm),
        frame.stationary_energy,
    );
    out
}

/// Renders the record that matches the reporting mode.
pub fn render(mode: ReportingMode, frame: &RadarFrame, motion: bool) -> String {
    match mode {
        ReportingMode::Engineering => render_engineering_frame(ENGINEERING_RECORD_NAME, frame, motion),
        ReportingMode::Normal => render_occupancy_record(TARGET_RECORD_NAME, frame),
    }
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
}

// ============================================================================
// Typed record (serde)
// ============================================================================

/// Typed view of the occupancy JSON record, for consumers of the property.
///
/// ```rust
/// # #[cfg(feature = "serde-json-core")]
/// # {
/// use mmwave_occupancy::frame::RadarFrame;
/// use mmwave_occupancy::telemetry::{render_occupancy_record, OccupancyRecord};
///
/// let json = render_occupancy_record("OccupancyTarget", &RadarFrame::default());
/// let record = OccupancyRecord::parse(json.as_bytes()).unwrap();
/// assert_eq!(record.triggered_by, "Not Present");
/// # }
/// ```
#[cfg(feature = "serde")]
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyRecord<'a> {
    /// Record name.
    pub name: &'a str,
    /// One of the [`Trigger`] strings.
    pub triggered_by: &'a str,
    /// Detection distance in feet.
    pub detection_distance_feet: f32,
    /// Moving target distance in feet.
    pub moving_target_distance_feet: f32,
    /// Moving target energy.
    pub moving_target_energy: u8,
    /// Stationary target distance in feet.
    pub stationary_target_distance_feet: f32,
    /// Stationary target energy.
    pub stationary_target_energy: u8,
}

#[cfg(feature = "serde")]
impl<'a> OccupancyRecord<'a> {
    /// Builds the record for a frame without rounding.
    pub fn from_frame(name: &'a str, frame: &RadarFrame) -> Self {
        Self {
            name,
            triggered_by: frame.trigger().as_str(),
            detection_distance_feet: cm_to_feet(frame.detection_distance_cm),
            moving_target_distance_feet: cm_to_feet(frame.moving_distance_cm),
            moving_target_energy: frame.moving_energy,
            stationary_target_distance_feet: cm_to_feet(frame.stationary_distance_cm),
            stationary_target_energy: frame.stationary_energy,
        }
    }

    /// Maps `triggered_by` back to a [`Trigger`].
    pub fn trigger(&self) -> Option<Trigger> {
        [
            Trigger::StationaryAndMoving,
            Trigger::Stationary,
            Trigger::Moving,
            Trigger::NotPresent,
        ]
        .into_iter()
        .find(|t| t.as_str() == self.triggered_by)
    }
}

#[cfg(feature = "serde-json-core")]
impl<'a> OccupancyRecord<'a> {
    /// Parses a published occupancy record.
    pub fn parse(json: &'a [u8]) -> Option<Self> {
        serde_json_core::from_slice(json).ok().map(|(record, _)| record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{GateReading, MAX_GATES};

    fn engineering_frame() -> RadarFrame {
        let mut frame = RadarFrame {
            moving_detected: true,
            stationary_detected: true,
            moving_distance_cm: 62,
            moving_energy: 43,
            stationary_distance_cm: 50,
            stationary_energy: 15,
            detection_distance_cm: 75,
            retain_value: 7,
            ..Default::default()
        };
        for (i, gate) in frame.gates.iter_mut().enumerate() {
            *gate = GateReading {
                moving_threshold: 50,
                moving_energy: i as u8,
                stationary_threshold: 40,
                stationary_energy: (i * 2) as u8,
            };
        }
        frame
    }

    // =========================================================================
    // Engineering frame
    // =========================================================================

    #[test]
    fn engineering_frame_header_order() {
        let csv = render_engineering_frame("Sensor 01", &engineering_frame(), false);
        assert!(csv.starts_with("/*Sensor 01,50,75,15,62,75,43,7,0,"));
    }

    #[test]
    fn engineering_frame_is_framed() {
        let csv = render_engineering_frame("x", &engineering_frame(), true);
        assert!(csv.starts_with("/*"));
        assert!(csv.ends_with("*/\n"));
        assert_eq!(csv.matches('\n').count(), 1);
    }

    #[test]
    fn engineering_frame_has_one_quadruple_per_gate() {
        let csv = render_engineering_frame("x", &engineering_frame(), true);
        let body = csv.trim_start_matches("/*").trim_end_matches("*/\n");
        // name + 8 header fields + 4 per gate, each followed by a comma
        let fields: alloc::vec::Vec<&str> = body.split(',').collect();
        assert_eq!(fields.len(), 1 + 8 + 4 * MAX_GATES + 1);
        assert_eq!(fields.last(), Some(&""));
        assert_eq!(fields[8], "100");
    }

    #[test]
    fn engineering_frame_gate_values() {
        let csv = render_engineering_frame("x", &engineering_frame(), true);
        assert!(csv.contains(",50,0,40,0,50,1,40,2,"));
        assert!(csv.ends_with(",50,8,40,16,*/\n"));
    }

    // =========================================================================
    // Occupancy record
    // =========================================================================

    #[test]
    fn occupancy_record_exact_text() {
        let frame = RadarFrame {
            moving_detected: true,
            moving_distance_cm: 100,
            moving_energy: 42,
            detection_distance_cm: 200,
            ..Default::default()
        };
        assert_eq!(
            render_occupancy_record("OccupancyTarget", &frame),
            "{\"name\":\"OccupancyTarget\",\"triggeredBy\":\"Moving\",\
             \"detectionDistanceFeet\":6.56,\"movingTargetDistanceFeet\":3.28,\
             \"movingTargetEnergy\":42,\"stationaryTargetDistanceFeet\":0.00,\
             \"stationaryTargetEnergy\":0}"
        );
    }

    #[test]
    fn occupancy_record_trigger_matches_flags() {
        let cases = [
            (true, true, "Stationary and Moving"),
            (false, true, "Stationary"),
            (true, false, "Moving"),
            (false, false, "Not Present"),
        ];
        for (moving, stationary, expected) in cases {
            let frame = RadarFrame {
                moving_detected: moving,
                stationary_detected: stationary,
                ..Default::default()
            };
            let json = render_occupancy_record("n", &frame);
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["triggeredBy"], expected);
        }
    }

    #[test]
    fn occupancy_record_escapes_name() {
        let json = render_occupancy_record("a\"b\\c", &RadarFrame::default());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "a\"b\\c");
    }

    #[test]
    fn render_selects_by_mode() {
        let frame = engineering_frame();
        assert!(render(ReportingMode::Engineering, &frame, true).starts_with("/*OccupancyEngineering,"));
        assert!(render(ReportingMode::Normal, &frame, true).starts_with("{\"name\":\"OccupancyTarget\""));
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn parse_published_record() {
        let json = render_occupancy_record(TARGET_RECORD_NAME, &engineering_frame());
        let record = OccupancyRecord::parse(json.as_bytes()).unwrap();
        assert_eq!(record.name, TARGET_RECORD_NAME);
        assert_eq!(record.trigger(), Some(Trigger::StationaryAndMoving));
        assert_eq!(record.moving_target_energy, 43);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn record_from_frame_serializes_like_renderer() {
        let frame = engineering_frame();
        let typed = serde_json::to_value(OccupancyRecord::from_frame(TARGET_RECORD_NAME, &frame)).unwrap();
        let rendered: serde_json::Value =
            serde_json::from_str(&render_occupancy_record(TARGET_RECORD_NAME, &frame)).unwrap();
        assert_eq!(typed["triggeredBy"], rendered["triggeredBy"]);
        assert_eq!(typed["stationaryTargetEnergy"], rendered["stationaryTargetEnergy"]);
    }
}
