//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test doubles for every seam
//! - `std_io`: Desktop clock, delay, console and host (requires `std` feature)

pub mod mock;

#[cfg(feature = "std")]
pub mod std_io;

pub use mock::*;

#[cfg(feature = "std")]
pub use std_io::*;
