//! Error types for nowbar-core

/// The display host refused to create or attach the overlay surface.
///
/// Recovered locally by the presentation controller: the same tick
/// falls back to the notification path, and the next tick retries
/// acquisition naturally.
#[derive(Debug, thiserror::Error)]
#[error("overlay surface rejected: {0}")]
pub struct OverlayRejected(pub String);

/// A textual command that maps to no known transport key.
#[derive(Debug, thiserror::Error)]
#[error("unknown media command: {0:?}")]
pub struct UnknownCommand(pub String);
