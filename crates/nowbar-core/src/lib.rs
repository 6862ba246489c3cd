//! nowbar-core - presentation controller and status loops for the
//! nowbar daemon.
//!
//! All state-transition logic lives here, behind three seams the
//! daemon binary fills in with real adapters:
//! - [`SystemStateProvider`] - live media/battery snapshot
//! - [`DisplayHost`] - overlay surface plus fallback notification
//! - [`MediaController`] - transport-key dispatch

pub mod battery;
pub mod error;
pub mod monitor;
pub mod presenter;
pub mod provider;
pub mod stream;
pub mod types;

pub use battery::{BatteryReport, ChargeStatus, PlugSource, RawBatteryReading};
pub use error::{OverlayRejected, UnknownCommand};
pub use monitor::{DEFAULT_MONITOR_PERIOD, ServiceMonitor};
pub use presenter::{DisplayHost, PresentationController, PresentationMode};
pub use provider::{MediaController, SystemStateProvider};
pub use stream::{BatteryStream, DEFAULT_STREAM_PERIOD};
pub use types::{ChargeMethod, DisplayContent, MediaCommand, StatusSnapshot};
