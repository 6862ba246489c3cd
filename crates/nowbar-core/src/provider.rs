//! Seams between the loops and the platform state sources.

use std::sync::Arc;

use crate::types::{MediaCommand, StatusSnapshot};

/// Live system state source read independently by both periodic loops.
///
/// Reads are synchronous and must never fail: implementations return
/// best-effort defaults (not playing, not charging, pct -1) instead of
/// erroring, so a broken source degrades to a hidden bar for that tick.
pub trait SystemStateProvider: Send + Sync {
    fn snapshot(&self) -> StatusSnapshot;
}

impl<P: SystemStateProvider + ?Sized> SystemStateProvider for Arc<P> {
    fn snapshot(&self) -> StatusSnapshot {
        (**self).snapshot()
    }
}

/// Dispatches transport commands to the active media player.
///
/// Fire-and-forget: the return value reports whether the command was
/// recognized and handed off, not whether playback actually changed.
pub trait MediaController: Send + Sync {
    fn send(&self, command: MediaCommand) -> bool;
}
