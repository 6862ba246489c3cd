//! Core types for the nowbar daemon

use serde::{Deserialize, Serialize};

use crate::error::UnknownCommand;

/// How the battery is currently being charged, if at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeMethod {
    #[default]
    None,
    Usb,
    Ac,
    Wireless,
}

/// Point-in-time read of the system state the bar cares about.
///
/// Produced fresh on every provider read, never mutated, compared by
/// value only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub media_active: bool,
    /// 0..=100, or -1 when the battery could not be read.
    pub battery_pct: i32,
    pub is_charging: bool,
    pub charge_method: ChargeMethod,
}

impl StatusSnapshot {
    /// Whether ambient status should be shown at all.
    pub fn visible(&self) -> bool {
        self.media_active || self.is_charging
    }
}

/// Placeholder subtitle while real metadata extraction is out of scope.
pub const PLACEHOLDER_TRACK: &str = "Unknown Track";

/// Text shown on the overlay surface or the fallback notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayContent {
    pub title: String,
    pub subtitle: String,
}

impl DisplayContent {
    /// Build the bar content for a visible snapshot.
    ///
    /// Media takes priority over charging when both are active.
    pub fn for_snapshot(snapshot: &StatusSnapshot) -> Self {
        if snapshot.media_active {
            DisplayContent {
                title: "Now Playing".into(),
                subtitle: PLACEHOLDER_TRACK.into(),
            }
        } else {
            DisplayContent {
                title: format!("Charging: {}%", snapshot.battery_pct),
                subtitle: "Battery charging".into(),
            }
        }
    }
}

/// Transport commands that can be sent to the active media player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaCommand {
    Play,
    Pause,
    Next,
    Previous,
}

impl std::str::FromStr for MediaCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(MediaCommand::Play),
            "pause" => Ok(MediaCommand::Pause),
            "next" => Ok(MediaCommand::Next),
            "previous" => Ok(MediaCommand::Previous),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}
