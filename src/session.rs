//! Radar link: owns the serial channel to the module and the session state.
//!
//! [`RadarLink`] wraps a [`RadarDriver`] and is the only writer of
//! [`RadarSession`]. Everything else reads the session through
//! [`RadarLink::session`] or [`RadarLink::frame`].
//!
//! # Lifecycle
//!
//! 1. [`open`](RadarLink::open) performs the handshake and requests the
//!    configured reporting mode (fire-and-forget, no read-back).
//! 2. [`poll`](RadarLink::poll) runs every tick regardless of state and stores
//!    each newly decoded frame.
//! 3. A failed `open` is never retried by `poll`. The next explicit
//!    [`restart`](RadarLink::restart) retries it.
//!
//! # Example
//!
//! ```rust
//! use mmwave_occupancy::session::{ConnectionState, RadarLink, ReportingMode};
//! use mmwave_occupancy::hal::{MockDelay, MockRadar};
//!
//! let mut link = RadarLink::new(MockRadar::new(), 256_000, ReportingMode::Engineering);
//! link.open(&mut MockDelay::new()).unwrap();
//! assert_eq!(link.session().state, ConnectionState::Connected);
//! assert!(link.driver().engineering_mode);
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::error::RadarError;
use crate::frame::RadarFrame;
use crate::traits::RadarDriver;

/// Handshake/liveness state of the radar link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConnectionState {
    /// No handshake, or the link stopped producing frames.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Handshake succeeded and frames are arriving.
    Connected,
}

/// Module reporting mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReportingMode {
    /// Target-only reporting.
    #[default]
    Normal,
    /// Per-gate engineering reporting.
    Engineering,
}

impl ReportingMode {
    /// Human-readable mode name used in `deviceinfo`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReportingMode::Normal => "Target Mode",
            ReportingMode::Engineering => "Engineering Mode",
        }
    }
}

/// Session state owned by [`RadarLink`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RadarSession {
    /// Link state.
    pub state: ConnectionState,
    /// Reporting mode requested from the module.
    pub mode: ReportingMode,
    /// Most recently decoded frame.
    pub frame: RadarFrame,
    /// Frames decoded since startup.
    pub frames_decoded: u32,
}

/// Owner of the radar driver and its session state.
pub struct RadarLink<R: RadarDriver> {
    driver: R,
    baud: u32,
    session: RadarSession,
    handshake_ok: bool,
    mode_settle_ms: u32,
}

impl<R: RadarDriver> RadarLink<R> {
    /// Creates an unopened link.
    pub fn new(driver: R, baud: u32, mode: ReportingMode) -> Self {
        Self {
            driver,
            baud,
            session: RadarSession {
                mode,
                ..Default::default()
            },
            handshake_ok: false,
            mode_settle_ms: 0,
        }
    }

    /// Sets the wait between a successful handshake and the mode request.
    pub fn with_mode_settle_ms(mut self, ms: u32) -> Self {
        self.mode_settle_ms = ms;
        self
    }

    /// Performs the module handshake and requests the reporting mode.
    ///
    /// The mode request is fire-and-forget: its failure is logged, not returned.
    pub fn open<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), RadarError> {
        self.handshake(delay)?;
        if let Err(e) = self.request_mode() {
            warn!("radar mode request failed: {:?}", e);
        }
        Ok(())
    }

    /// Handshakes at the configured baud and waits the mode settle time.
    fn handshake<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), RadarError> {
        self.session.state = ConnectionState::Connecting;
        match self.driver.begin(self.baud) {
            Ok(()) => {
                info!("radar initialized at {} baud", self.baud);
                self.handshake_ok = true;
                self.session.state = ConnectionState::Connected;
                delay.delay_ms(self.mode_settle_ms);
                Ok(())
            }
            Err(e) => {
                warn!("radar was not connected: {:?}", e);
                self.handshake_ok = false;
                self.session.state = ConnectionState::Disconnected;
                Err(RadarError::NotConnected)
            }
        }
    }

    /// Pumps the decoder. Call every tick.
    ///
    /// Returns true if a new frame was stored.
    pub fn poll(&mut self) -> bool {
        let decoded = match self.driver.poll() {
            Some(frame) => {
                self.session.frame = frame;
                self.session.frames_decoded = self.session.frames_decoded.wrapping_add(1);
                true
            }
            None => false,
        };

        if self.handshake_ok {
            let live = self.driver.is_connected();
            let next = if live {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            };
            if next != self.session.state {
                debug!("radar link {:?} -> {:?}", self.session.state, next);
                self.session.state = next;
            }
        }

        decoded
    }

    /// Returns true if the decoder has seen a valid frame recently.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.driver.is_connected()
    }

    /// Restarts the module, waits `settle_ms`, and re-enters the reporting mode.
    ///
    /// If the handshake never succeeded, this retries the handshake instead.
    /// Either way a failed mode request fails the restart.
    pub fn restart<D: DelayNs>(&mut self, delay: &mut D, settle_ms: u32) -> Result<(), RadarError> {
        if !self.handshake_ok {
            info!("radar handshake pending, retrying open");
            self.handshake(delay)?;
            return self.request_mode();
        }

        self.driver
            .request_restart()
            .map_err(|e| hardware_failure("Restarting sensor", e))?;
        delay.delay_ms(settle_ms);
        self.request_mode()
    }

    fn request_mode(&mut self) -> Result<(), RadarError> {
        let result = match self.session.mode {
            ReportingMode::Engineering => self.driver.request_start_engineering_mode(),
            ReportingMode::Normal => self.driver.request_end_engineering_mode(),
        };
        result.map_err(|e| hardware_failure("Entering reporting mode", e))
    }

    /// Read-only view of the session.
    #[inline]
    pub fn session(&self) -> &RadarSession {
        &self.session
    }

    /// The most recently decoded frame.
    #[inline]
    pub fn frame(&self) -> &RadarFrame {
        &self.session.frame
    }

    /// Current reporting mode.
    #[inline]
    pub fn mode(&self) -> ReportingMode {
        self.session.mode
    }

    /// Reference to the driver.
    pub fn driver(&self) -> &R {
        &self.driver
    }

    /// Mutable reference to the driver, for command requests.
    pub fn driver_mut(&mut self) -> &mut R {
        &mut self.driver
    }

    /// Consumes the link, returning the driver.
    pub fn into_driver(self) -> R {
        self.driver
    }
}

/// Logs a driver error and maps it to [`RadarError::HardwareCommandFailed`].
pub(crate) fn hardware_failure<E: core::fmt::Debug>(op: &'static str, err: E) -> RadarError {
    warn!("{} failed: {:?}", op, err);
    RadarError::HardwareCommandFailed(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockDelay, MockRadar};

    fn link() -> RadarLink<MockRadar> {
        RadarLink::new(MockRadar::new(), 256_000, ReportingMode::Engineering)
    }

    #[test]
    fn open_requests_engineering_mode() {
        let mut link = link();
        link.open(&mut MockDelay::new()).unwrap();
        assert_eq!(link.session().state, ConnectionState::Connected);
        assert_eq!(link.driver().begin_calls, 1);
        assert_eq!(link.driver().baud, Some(256_000));
        assert!(link.driver().engineering_mode);
    }

    #[test]
    fn open_requests_target_mode() {
        let mut link = RadarLink::new(MockRadar::new(), 256_000, ReportingMode::Normal);
        link.open(&mut MockDelay::new()).unwrap();
        assert!(!link.driver().engineering_mode);
        assert_eq!(link.driver().end_engineering_calls, 1);
    }

    #[test]
    fn open_failure_reports_not_connected() {
        let mut link = RadarLink::new(MockRadar::new().absent(), 256_000, ReportingMode::Normal);
        assert_eq!(link.open(&mut MockDelay::new()), Err(RadarError::NotConnected));
        assert_eq!(link.session().state, ConnectionState::Disconnected);
    }

    #[test]
    fn mode_request_failure_does_not_fail_open() {
        let mut radar = MockRadar::new();
        radar.fail_mode_requests = true;
        let mut link = RadarLink::new(radar, 256_000, ReportingMode::Engineering);
        assert!(link.open(&mut MockDelay::new()).is_ok());
        assert_eq!(link.session().state, ConnectionState::Connected);
    }

    #[test]
    fn poll_stores_decoded_frames() {
        let mut link = link();
        link.open(&mut MockDelay::new()).unwrap();

        let frame = RadarFrame {
            moving_detected: true,
            moving_distance_cm: 150,
            ..Default::default()
        };
        link.driver_mut().queue_frame(frame);

        assert!(link.poll());
        assert_eq!(link.frame().moving_distance_cm, 150);
        assert_eq!(link.session().frames_decoded, 1);

        // No new frame: previous one is kept
        assert!(!link.poll());
        assert_eq!(link.frame().moving_distance_cm, 150);
    }

    #[test]
    fn poll_never_retries_failed_open() {
        let mut link = RadarLink::new(MockRadar::new().absent(), 256_000, ReportingMode::Normal);
        let _ = link.open(&mut MockDelay::new());
        link.driver_mut().present = true;
        for _ in 0..10 {
            link.poll();
        }
        assert_eq!(link.driver().begin_calls, 1);
        assert_eq!(link.session().state, ConnectionState::Disconnected);
    }

    #[test]
    fn poll_tracks_liveness_after_handshake() {
        let mut link = link();
        link.open(&mut MockDelay::new()).unwrap();
        link.driver_mut().live = false;
        link.poll();
        assert_eq!(link.session().state, ConnectionState::Disconnected);
        assert!(!link.is_connected());

        link.driver_mut().live = true;
        link.poll();
        assert_eq!(link.session().state, ConnectionState::Connected);
    }

    #[test]
    fn restart_waits_then_reenters_mode() {
        let mut link = link();
        link.open(&mut MockDelay::new()).unwrap();
        let mut delay = MockDelay::new();

        link.restart(&mut delay, 1500).unwrap();

        assert_eq!(link.driver().restart_calls, 1);
        assert_eq!(delay.total_ms, 1500);
        assert_eq!(link.driver().start_engineering_calls, 2);
    }

    #[test]
    fn restart_failure_skips_delay() {
        let mut link = link();
        link.open(&mut MockDelay::new()).unwrap();
        link.driver_mut().fail_restart = true;
        let mut delay = MockDelay::new();

        assert_eq!(
            link.restart(&mut delay, 1500),
            Err(RadarError::HardwareCommandFailed("Restarting sensor"))
        );
        assert_eq!(delay.total_ms, 0);
    }

    #[test]
    fn restart_retries_failed_open() {
        let mut link = RadarLink::new(MockRadar::new().absent(), 256_000, ReportingMode::Normal);
        let _ = link.open(&mut MockDelay::new());
        link.driver_mut().present = true;
        let mut delay = MockDelay::new();

        link.restart(&mut delay, 1500).unwrap();
        assert_eq!(link.driver().begin_calls, 2);
        assert_eq!(link.driver().restart_calls, 0);
        assert_eq!(link.session().state, ConnectionState::Connected);
    }

    #[test]
    fn restart_after_failed_open_reports_mode_failure() {
        let mut link = RadarLink::new(MockRadar::new().absent(), 256_000, ReportingMode::Engineering);
        let _ = link.open(&mut MockDelay::new());
        link.driver_mut().present = true;
        link.driver_mut().fail_mode_requests = true;

        assert_eq!(
            link.restart(&mut MockDelay::new(), 1500),
            Err(RadarError::HardwareCommandFailed("Entering reporting mode"))
        );
        assert_eq!(link.driver().begin_calls, 2);
        assert_eq!(link.session().state, ConnectionState::Connected);
    }

    #[test]
    fn open_waits_before_mode_request() {
        let mut link = link().with_mode_settle_ms(500);
        let mut delay = MockDelay::new();
        link.open(&mut delay).unwrap();
        assert_eq!(delay.total_ms, 500);

        let mut link = RadarLink::new(MockRadar::new().absent(), 256_000, ReportingMode::Normal)
            .with_mode_settle_ms(500);
        let mut delay = MockDelay::new();
        let _ = link.open(&mut delay);
        assert_eq!(delay.total_ms, 0);
    }
}
