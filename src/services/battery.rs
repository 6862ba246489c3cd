//! Battery reading via the system power supply.
//!
//! Maps the platform battery state into the raw reading the shared
//! derive helpers consume. Never fails: an unreadable battery produces
//! the sentinel reading, which the controller treats as not charging.

use std::path::Path;

use battery::{Manager, State};
use log::{debug, warn};
use nowbar_core::{ChargeStatus, PlugSource, RawBatteryReading};

// Raw level is reported in thousandths so the shared truncating
// division still applies.
const LEVEL_SCALE: i32 = 1000;

/// Read the first battery, or the sentinel reading when none is usable.
pub fn read_raw() -> RawBatteryReading {
    match Manager::new() {
        Ok(manager) => from_manager(&manager),
        Err(e) => {
            warn!("battery manager unavailable: {e}");
            RawBatteryReading::default()
        }
    }
}

fn from_manager(manager: &Manager) -> RawBatteryReading {
    let mut batteries = match manager.batteries() {
        Ok(batteries) => batteries,
        Err(e) => {
            warn!("failed to enumerate batteries: {e}");
            return RawBatteryReading::default();
        }
    };

    match batteries.next() {
        Some(Ok(battery)) => {
            let reading = RawBatteryReading {
                level: (battery.state_of_charge().value * LEVEL_SCALE as f32) as i32,
                scale: LEVEL_SCALE,
                status: map_status(battery.state()),
                plug: plug_source(),
            };
            debug!("battery reading: {reading:?}");
            reading
        }
        Some(Err(e)) => {
            warn!("battery read failed: {e}");
            RawBatteryReading::default()
        }
        None => {
            debug!("no battery present");
            RawBatteryReading::default()
        }
    }
}

fn map_status(state: State) -> ChargeStatus {
    match state {
        State::Charging => ChargeStatus::Charging,
        State::Discharging => ChargeStatus::Discharging,
        State::Full => ChargeStatus::Full,
        State::Empty => ChargeStatus::Discharging,
        _ => ChargeStatus::Unknown,
    }
}

/// Probe the plug source from sysfs; the battery crate does not expose
/// it.
fn plug_source() -> PlugSource {
    plug_source_at(Path::new("/sys/class/power_supply"))
}

fn plug_source_at(root: &Path) -> PlugSource {
    let Ok(entries) = std::fs::read_dir(root) else {
        return PlugSource::None;
    };

    for entry in entries.flatten() {
        let dir = entry.path();
        let online = std::fs::read_to_string(dir.join("online"))
            .map(|raw| raw.trim() == "1")
            .unwrap_or(false);
        if !online {
            continue;
        }
        let supply_type = std::fs::read_to_string(dir.join("type")).unwrap_or_default();
        match supply_type.trim() {
            "Mains" => return PlugSource::Ac,
            "USB" => return PlugSource::Usb,
            _ => {}
        }
    }
    PlugSource::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_supply(root: &Path, name: &str, supply_type: &str, online: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), supply_type).unwrap();
        fs::write(dir.join("online"), online).unwrap();
    }

    #[test]
    fn detects_online_mains_as_ac() {
        let root = tempfile::tempdir().unwrap();
        write_supply(root.path(), "AC", "Mains\n", "1\n");
        write_supply(root.path(), "BAT0", "Battery\n", "0\n");
        assert_eq!(plug_source_at(root.path()), PlugSource::Ac);
    }

    #[test]
    fn detects_online_usb() {
        let root = tempfile::tempdir().unwrap();
        write_supply(root.path(), "usb-c", "USB\n", "1\n");
        assert_eq!(plug_source_at(root.path()), PlugSource::Usb);
    }

    #[test]
    fn offline_supplies_do_not_count() {
        let root = tempfile::tempdir().unwrap();
        write_supply(root.path(), "AC", "Mains\n", "0\n");
        assert_eq!(plug_source_at(root.path()), PlugSource::None);
    }

    #[test]
    fn missing_root_is_unplugged() {
        assert_eq!(
            plug_source_at(Path::new("/nonexistent/power_supply")),
            PlugSource::None
        );
    }
}
