//! Desktop implementations of the host seams.
//!
//! Used by the `desktop_sim` binary: a monotonic clock, a sleeping delay, a
//! stdin/stdout console and a host whose reboot request is polled by the
//! main loop.

use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::traits::{Clock, Console, HostControl};

/// Milliseconds since construction, truncated to `u32` (wraps like the device counter).
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: Instant,
}

impl StdClock {
    /// Starts the clock at zero.
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

/// Blocking delay backed by `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Console over stdin/stdout.
///
/// A background thread reads stdin byte by byte so `read_byte` never blocks.
pub struct StdConsole {
    rx: Receiver<u8>,
    closed: bool,
}

impl StdConsole {
    /// Spawns the stdin reader thread.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for byte in stdin.lock().bytes() {
                match byte {
                    Ok(b) => {
                        if tx.send(b).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("stdin read failed: {}", e);
                        break;
                    }
                }
            }
        });
        Self { rx, closed: false }
    }
}

impl Console for StdConsole {
    fn read_byte(&mut self) -> Option<u8> {
        if self.closed {
            return None;
        }
        match self.rx.try_recv() {
            Ok(b) => Some(b),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                info!("console input closed");
                self.closed = true;
                None
            }
        }
    }

    fn write_str(&mut self, s: &str) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(s.as_bytes());
        let _ = out.flush();
    }
}

/// Desktop host. A reboot request sets a flag for the main loop.
#[derive(Debug, Default)]
pub struct StdHost {
    reboot_requested: bool,
}

impl StdHost {
    /// Creates a host with no pending reboot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and clears the pending reboot request.
    pub fn take_reboot_request(&mut self) -> bool {
        core::mem::take(&mut self.reboot_requested)
    }
}

impl HostControl for StdHost {
    fn reboot(&mut self) {
        info!("host reboot requested");
        self.reboot_requested = true;
    }
}
