//! Background system services for the daemon.
//!
//! - `battery` - power supply reading mapped to the raw battery reading
//! - `media` - MPRIS playback cache and transport command dispatch
//! - `status` - combined system state provider the loops read
//! - `system_info` - static device identity

pub mod battery;
pub mod media;
pub mod status;
pub mod system_info;
