//! Presentation controller: decides whether ambient status is shown
//! and which display channel carries it.
//!
//! Owns the only mutable presentation state. All mutation happens on
//! the monitor loop's task; display host calls are synchronous and run
//! from that same context.

use log::{debug, info, warn};

use crate::error::OverlayRejected;
use crate::types::{DisplayContent, StatusSnapshot};

/// Display primitives the controller drives.
///
/// `overlay_capable` is runtime-revocable and may change value between
/// calls. The monitor loop samples it once per tick and passes it into
/// [`PresentationController::decide`], which keeps the transition logic
/// deterministic under test.
pub trait DisplayHost {
    /// Opaque reference to a live overlay surface.
    type Handle;

    fn overlay_capable(&self) -> bool;

    /// Create the overlay surface showing `content`.
    fn show_overlay(&mut self, content: &DisplayContent)
    -> Result<Self::Handle, OverlayRejected>;

    /// In-place text update of an existing surface.
    fn update_overlay(&mut self, handle: &mut Self::Handle, content: &DisplayContent);

    fn remove_overlay(&mut self, handle: Self::Handle);

    /// Post or update the fixed-id fallback notification.
    fn post_notification(&mut self, content: &DisplayContent);

    fn cancel_notification(&mut self);
}

/// What is currently displayed.
///
/// The tagged handle makes the invalid combinations (overlay mode with
/// no handle, hidden mode with a live handle) unrepresentable.
#[derive(Debug)]
pub enum PresentationMode<H> {
    Hidden,
    Overlay(H),
    NotificationFallback,
}

impl<H> Default for PresentationMode<H> {
    fn default() -> Self {
        PresentationMode::Hidden
    }
}

/// Decision and transition engine for the ambient status display.
pub struct PresentationController<H: DisplayHost> {
    host: H,
    mode: PresentationMode<H::Handle>,
    last_content: Option<DisplayContent>,
}

impl<H: DisplayHost> PresentationController<H> {
    pub fn new(host: H) -> Self {
        PresentationController {
            host,
            mode: PresentationMode::Hidden,
            last_content: None,
        }
    }

    /// One monitor tick: sample the capability once, then decide.
    pub fn tick(&mut self, snapshot: &StatusSnapshot) {
        let capable = self.host.overlay_capable();
        self.decide(snapshot, capable);
    }

    /// Reconcile what is displayed with `snapshot`.
    ///
    /// Idempotent: calling this again with identical inputs leaves the
    /// state unchanged and skips redundant host calls.
    pub fn decide(&mut self, snapshot: &StatusSnapshot, overlay_capable: bool) {
        if !snapshot.visible() {
            self.hide();
            return;
        }

        let content = DisplayContent::for_snapshot(snapshot);
        if overlay_capable && self.show_on_overlay(&content) {
            self.remember(content);
            return;
        }
        // Either the capability is absent or the surface was rejected
        // this tick; both land on the notification path.
        self.show_on_notification(&content);
        self.remember(content);
    }

    /// Tear down whatever is displayed. Idempotent.
    pub fn hide(&mut self) {
        match std::mem::take(&mut self.mode) {
            PresentationMode::Overlay(handle) => {
                debug!("hiding overlay");
                self.host.remove_overlay(handle);
            }
            PresentationMode::NotificationFallback => {
                debug!("cancelling fallback notification");
                self.host.cancel_notification();
            }
            PresentationMode::Hidden => {}
        }
        self.last_content = None;
    }

    pub fn mode(&self) -> &PresentationMode<H::Handle> {
        &self.mode
    }

    pub fn last_content(&self) -> Option<&DisplayContent> {
        self.last_content.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Returns true when the overlay is now showing `content`.
    ///
    /// On rejection the prior mode is restored so the notification path
    /// can take over without tearing anything down; no call may end in
    /// overlay mode without a live handle.
    fn show_on_overlay(&mut self, content: &DisplayContent) -> bool {
        match std::mem::take(&mut self.mode) {
            PresentationMode::Overlay(mut handle) => {
                // Never destroy and recreate the surface just to
                // refresh text.
                if self.last_content.as_ref() != Some(content) {
                    self.host.update_overlay(&mut handle, content);
                }
                self.mode = PresentationMode::Overlay(handle);
                true
            }
            prior => match self.host.show_overlay(content) {
                Ok(handle) => {
                    if matches!(prior, PresentationMode::NotificationFallback) {
                        self.host.cancel_notification();
                    }
                    info!("overlay surface acquired");
                    self.mode = PresentationMode::Overlay(handle);
                    true
                }
                Err(err) => {
                    warn!("{err}, using notification fallback");
                    self.mode = prior;
                    false
                }
            },
        }
    }

    fn show_on_notification(&mut self, content: &DisplayContent) {
        match std::mem::take(&mut self.mode) {
            PresentationMode::Overlay(handle) => {
                // Capability revoked mid-session: release the surface
                // first, then switch channels.
                info!("overlay capability lost, switching to notification");
                self.host.remove_overlay(handle);
                self.host.post_notification(content);
            }
            PresentationMode::NotificationFallback => {
                if self.last_content.as_ref() != Some(content) {
                    self.host.post_notification(content);
                }
            }
            PresentationMode::Hidden => {
                self.host.post_notification(content);
            }
        }
        self.mode = PresentationMode::NotificationFallback;
    }

    fn remember(&mut self, content: DisplayContent) {
        if self.last_content.as_ref() != Some(&content) {
            self.last_content = Some(content);
        }
    }
}
