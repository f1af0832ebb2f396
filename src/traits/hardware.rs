//! Hardware abstraction traits for the host controller.
//!
//! The presence pin and the blocking settle delays use the `embedded-hal`
//! 1.0 traits directly ([`InputPin`] and [`DelayNs`]), so any board HAL works
//! without an adapter. The remaining host capabilities have no `embedded-hal`
//! equivalent and are defined here.
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Clock`] | Wrapping millisecond counter |
//! | [`HostControl`] | Host controller reboot |
//! | [`Console`] | Local character console (UART0 / stdin) |
//!
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

/// Time source.
///
/// Returns a free-running millisecond counter that wraps at `u32::MAX`
/// (about 49.7 days). Consumers must compare with `wrapping_sub`.
///
/// # Example
///
/// ```rust
/// use mmwave_occupancy::traits::Clock;
/// use mmwave_occupancy::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Milliseconds since an arbitrary epoch, wrapping.
    fn now_ms(&self) -> u32;
}

/// Host controller control.
pub trait HostControl {
    /// Restarts the host controller.
    ///
    /// Hardware implementations do not return. Test doubles record the call.
    fn reboot(&mut self);
}

/// Byte-oriented local console.
///
/// The command protocol reads at most one byte per tick and echoes it back.
pub trait Console {
    /// Returns the next received byte without blocking.
    fn read_byte(&mut self) -> Option<u8>;

    /// Writes text to the console.
    fn write_str(&mut self, s: &str);
}
