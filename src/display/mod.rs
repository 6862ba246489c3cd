//! Display adapters behind the core `DisplayHost` seam.
//!
//! - `widget` - Unix-socket overlay surface (capability = connected)
//! - `notify` - always-available desktop notification fallback

pub mod notify;
pub mod widget;

use nowbar_core::{DisplayContent, DisplayHost, OverlayRejected};

use crate::display::notify::Notifier;
use crate::display::widget::{WidgetLink, WidgetMessage};

/// Witness for a live widget surface. The socket itself is shared;
/// the handle only records that a show was accepted.
pub struct WidgetSurface;

pub struct NowBarDisplay {
    widget: WidgetLink,
    notifier: Notifier,
}

impl NowBarDisplay {
    pub fn new(widget: WidgetLink, notifier: Notifier) -> Self {
        NowBarDisplay { widget, notifier }
    }
}

impl DisplayHost for NowBarDisplay {
    type Handle = WidgetSurface;

    fn overlay_capable(&self) -> bool {
        self.widget.connected()
    }

    fn show_overlay(&mut self, content: &DisplayContent) -> Result<WidgetSurface, OverlayRejected> {
        let accepted = self.widget.send(&WidgetMessage::Show {
            title: &content.title,
            subtitle: &content.subtitle,
        });
        if accepted {
            Ok(WidgetSurface)
        } else {
            // The client raced away between the capability check and
            // the write.
            Err(OverlayRejected("widget link refused the write".into()))
        }
    }

    fn update_overlay(&mut self, _handle: &mut WidgetSurface, content: &DisplayContent) {
        self.widget.send(&WidgetMessage::Update {
            title: &content.title,
            subtitle: &content.subtitle,
        });
    }

    fn remove_overlay(&mut self, _handle: WidgetSurface) {
        self.widget.send(&WidgetMessage::Hide);
    }

    fn post_notification(&mut self, content: &DisplayContent) {
        self.notifier.post(content);
    }

    fn cancel_notification(&mut self) {
        self.notifier.cancel();
    }
}
