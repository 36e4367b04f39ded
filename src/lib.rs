//! Watch face logic for the PineTime
//!
//! Everything that decides what the face shows lives here: clock and battery
//! formatting, the connectivity and health labels, the companion settings
//! message and its persistence, and the event loop that ties them together.
//! Drawing goes through `embedded-graphics`, so the crate runs on the watch
//! and on the host alike.

#![cfg_attr(not(test), no_std)]

// This must come first so the logging macros are visible everywhere.
#[macro_use]
mod fmt;

pub mod event;
pub mod settings;
pub mod system;
pub mod ui;
pub mod watchface;

pub use event::{BatteryChargeState, Event, HealthEvent};
pub use system::config::{Capabilities, ClockStyle, WatchConfig};
pub use watchface::Watchface;
