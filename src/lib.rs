//! A library for reading and programming the one-time-programmable fuses
//! of the i.MX8M Mini, through the nvmem interface exported by the
//! imx-ocotp driver.
//!
//! Fuse bits can only ever transition from 0 to 1. Every destructive
//! operation in this crate therefore reads the current fuse state first
//! and refuses any request that would require clearing a bit that is
//! already programmed.

#[cfg(feature = "cli")]
pub mod cli;
pub mod device;
mod error;
pub mod fuses;
#[cfg(feature = "cli")]
pub mod logging;

pub use device::{FuseDevice, DEFAULT_DEVICE_PATH};
pub use error::Error;
