//! Fallback notification via org.freedesktop.Notifications.
//!
//! A single notification updated in place: `replaces_id` keeps the
//! server from stacking a new bubble per refresh.

use std::collections::HashMap;

use log::{debug, warn};
use nowbar_core::DisplayContent;
use zbus::zvariant::Value;

#[zbus::proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, &Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;

    fn close_notification(&self, id: u32) -> zbus::Result<()>;
}

pub struct Notifier {
    app_name: String,
    proxy: Option<NotificationsProxyBlocking<'static>>,
    current_id: u32,
}

impl Notifier {
    /// Connect to the session notification service. A missing service
    /// is not fatal; posts become logged no-ops.
    pub fn connect(app_name: &str) -> Self {
        let proxy = match zbus::blocking::Connection::session() {
            Ok(connection) => match NotificationsProxyBlocking::new(&connection) {
                Ok(proxy) => Some(proxy),
                Err(e) => {
                    warn!("notification proxy unavailable: {e}");
                    None
                }
            },
            Err(e) => {
                warn!("session bus unavailable: {e}");
                None
            }
        };
        Notifier {
            app_name: app_name.to_string(),
            proxy,
            current_id: 0,
        }
    }

    /// Post or update the single fallback notification.
    pub fn post(&mut self, content: &DisplayContent) {
        let Some(proxy) = &self.proxy else {
            return;
        };
        // expire_timeout 0 keeps it persistent until cancelled.
        match proxy.notify(
            &self.app_name,
            self.current_id,
            "",
            &content.title,
            &content.subtitle,
            Vec::new(),
            HashMap::new(),
            0,
        ) {
            Ok(id) => self.current_id = id,
            Err(e) => warn!("notification post failed: {e}"),
        }
    }

    pub fn cancel(&mut self) {
        let Some(proxy) = &self.proxy else {
            return;
        };
        if self.current_id != 0 {
            if let Err(e) = proxy.close_notification(self.current_id) {
                debug!("notification close failed: {e}");
            }
            self.current_id = 0;
        }
    }
}
