//! Combined system state provider for the two periodic loops.

use nowbar_core::{StatusSnapshot, SystemStateProvider};

use crate::services::battery;
use crate::services::media::MediaService;

/// Reads live battery and media state. Never fails: a broken source
/// yields the hidden-bar defaults for that tick.
pub struct DeviceStateProvider {
    media: MediaService,
}

impl DeviceStateProvider {
    pub fn new(media: MediaService) -> Self {
        DeviceStateProvider { media }
    }
}

impl SystemStateProvider for DeviceStateProvider {
    fn snapshot(&self) -> StatusSnapshot {
        battery::read_raw().derive(self.media.is_playing())
    }
}
