//! Derived battery fields shared by the presentation and stream paths.

use serde::{Deserialize, Serialize};

use crate::types::{ChargeMethod, StatusSnapshot};

/// Raw charge status as reported by the platform battery source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChargeStatus {
    Charging,
    Discharging,
    Full,
    NotCharging,
    #[default]
    Unknown,
}

/// Where charging power is coming from, as reported by the platform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlugSource {
    Usb,
    Ac,
    #[default]
    None,
}

/// Reading from the battery source before any derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawBatteryReading {
    /// Raw level units, -1 when unreadable.
    pub level: i32,
    /// Scale the level is reported against, -1 when unreadable.
    pub scale: i32,
    pub status: ChargeStatus,
    pub plug: PlugSource,
}

impl Default for RawBatteryReading {
    /// Sentinel reading used when the battery cannot be read at all.
    fn default() -> Self {
        RawBatteryReading {
            level: -1,
            scale: -1,
            status: ChargeStatus::Unknown,
            plug: PlugSource::None,
        }
    }
}

impl RawBatteryReading {
    /// Derive the snapshot-facing fields from this reading.
    pub fn derive(&self, media_active: bool) -> StatusSnapshot {
        let charging = is_charging(self.status);
        StatusSnapshot {
            media_active,
            battery_pct: battery_pct(self.level, self.scale),
            is_charging: charging,
            charge_method: charge_method(self.plug, charging),
        }
    }
}

/// `level * 100 / scale`, truncating toward zero. -1 when unreadable.
pub fn battery_pct(level: i32, scale: i32) -> i32 {
    if level < 0 || scale <= 0 {
        return -1;
    }
    level * 100 / scale
}

/// Charging means actively charging or already full on external power.
pub fn is_charging(status: ChargeStatus) -> bool {
    matches!(status, ChargeStatus::Charging | ChargeStatus::Full)
}

/// Map the plug source to the user-facing charge method.
///
/// An unknown source while charging is reported as wireless, matching
/// what the plug probes can actually distinguish.
pub fn charge_method(plug: PlugSource, charging: bool) -> ChargeMethod {
    if !charging {
        return ChargeMethod::None;
    }
    match plug {
        PlugSource::Usb => ChargeMethod::Usb,
        PlugSource::Ac => ChargeMethod::Ac,
        PlugSource::None => ChargeMethod::Wireless,
    }
}

/// Rough advisory estimate with no historical rate tracking behind it.
/// Never gates a presentation transition.
///
/// Computed from the already-truncated integer percentage, so near a
/// percent boundary it can read one minute high compared to an
/// estimate taken from the raw level/scale ratio.
pub fn estimated_minutes_remaining(pct: i32, charging: bool) -> i32 {
    let pct = pct.max(0);
    if charging {
        ((100 - pct) as f32 * 1.5) as i32
    } else {
        pct * 5
    }
}

/// Record delivered on the battery status stream: the snapshot plus
/// the derived estimate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryReport {
    #[serde(flatten)]
    pub snapshot: StatusSnapshot,
    /// Advisory only, see [`estimated_minutes_remaining`].
    pub estimated_minutes_remaining: i32,
}

impl BatteryReport {
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        BatteryReport {
            snapshot: *snapshot,
            estimated_minutes_remaining: estimated_minutes_remaining(
                snapshot.battery_pct,
                snapshot.is_charging,
            ),
        }
    }
}
