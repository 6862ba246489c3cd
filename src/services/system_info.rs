//! Static device identity, fetched once at startup.

use std::sync::OnceLock;

use log::info;
use serde::Serialize;
use sysinfo::System;

/// One-shot device/system identity for logging and widget queries.
#[derive(Clone, Debug, Serialize)]
pub struct DeviceIdentity {
    pub model: String,
    pub os_name: String,
    pub os_version: String,
    pub kernel: String,
}

static IDENTITY: OnceLock<DeviceIdentity> = OnceLock::new();

pub fn identity() -> &'static DeviceIdentity {
    IDENTITY.get_or_init(|| DeviceIdentity {
        model: System::host_name().unwrap_or_else(|| "Unknown".into()),
        os_name: System::name().unwrap_or_else(|| "Unknown".into()),
        os_version: System::os_version().unwrap_or_else(|| "Unknown".into()),
        kernel: System::kernel_version().unwrap_or_else(|| "Unknown".into()),
    })
}

pub fn log_identity() {
    let id = identity();
    info!(
        "device: {} ({} {}, kernel {})",
        id.model, id.os_name, id.os_version, id.kernel
    );
}
