//! Unix-socket link to the overlay widget.
//!
//! The connected widget client IS the overlay surface: while a client
//! is attached the bar renders there (bottom-centered, above other
//! content), and when it disconnects the capability is gone and the
//! daemon falls back to notifications. The same link carries inbound
//! command lines and outbound battery stream records.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::{Arc, Mutex};

use log::{debug, error, info, warn};
use nowbar_core::{BatteryReport, DisplayContent};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::services::system_info::DeviceIdentity;

/// Events surfaced to the daemon from the widget link.
#[derive(Debug)]
pub enum WidgetEvent {
    /// A widget client attached (overlay capability granted).
    Connected,
    /// The widget client went away (capability revoked).
    Disconnected,
    /// A raw command line sent by the widget, e.g. "play".
    Command(String),
}

/// Outbound JSON line messages the widget renders or consumes.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetMessage<'a> {
    /// Create the bar surface. The widget anchors it bottom-center and
    /// keeps it non-focusable.
    Show { title: &'a str, subtitle: &'a str },
    /// In-place text refresh of the existing surface.
    Update { title: &'a str, subtitle: &'a str },
    Hide,
    Battery { report: &'a BatteryReport },
    Device { info: &'a DeviceIdentity },
    CommandResult { command: &'a str, accepted: bool },
}

/// Shared write side of the widget connection.
///
/// One client at a time; the accept thread replaces the stream when a
/// new client attaches.
#[derive(Clone)]
pub struct WidgetLink {
    stream: Arc<Mutex<Option<UnixStream>>>,
    /// Content of the currently shown bar, if any, so a client that
    /// reattaches mid-cycle can be caught up without waiting for the
    /// next monitor tick.
    surface: Arc<Mutex<Option<DisplayContent>>>,
}

impl WidgetLink {
    /// Bind the socket and start the accept thread.
    pub fn start(path: &Path) -> std::io::Result<(Self, mpsc::UnboundedReceiver<WidgetEvent>)> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Stale socket from a previous run.
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
        let listener = UnixListener::bind(path)?;

        let link = WidgetLink {
            stream: Arc::new(Mutex::new(None)),
            surface: Arc::new(Mutex::new(None)),
        };
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let accept_link = link.clone();
        std::thread::Builder::new()
            .name("widget-accept".to_string())
            .spawn(move || accept_loop(listener, accept_link, event_tx))
            .expect("Failed to spawn widget accept thread");

        info!("widget socket listening at {}", path.display());
        Ok((link, event_rx))
    }

    /// Whether a widget client is currently attached.
    pub fn connected(&self) -> bool {
        self.stream.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    /// Send one JSON line to the widget. Returns false (and drops the
    /// connection) when the write fails.
    pub fn send(&self, message: &WidgetMessage<'_>) -> bool {
        let delivered = self.write_line(message);
        self.remember_surface(message, delivered);
        delivered
    }

    fn write_line(&self, message: &WidgetMessage<'_>) -> bool {
        let Ok(mut guard) = self.stream.lock() else {
            return false;
        };
        let Some(stream) = guard.as_mut() else {
            return false;
        };
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                error!("widget payload encode failed: {e}");
                return false;
            }
        };
        if let Err(e) = writeln!(stream, "{payload}") {
            warn!("widget write failed ({e}), dropping connection");
            *guard = None;
            false
        } else {
            true
        }
    }

    /// Track what the bar currently shows. A show or update only
    /// counts once it reached a client; a hide clears the record even
    /// when nobody is attached.
    fn remember_surface(&self, message: &WidgetMessage<'_>, delivered: bool) {
        let Ok(mut surface) = self.surface.lock() else {
            return;
        };
        match message {
            WidgetMessage::Show { title, subtitle }
            | WidgetMessage::Update { title, subtitle }
                if delivered =>
            {
                *surface = Some(DisplayContent {
                    title: (*title).to_string(),
                    subtitle: (*subtitle).to_string(),
                });
            }
            WidgetMessage::Hide => *surface = None,
            _ => {}
        }
    }

    /// Re-issue the show to a freshly attached client when the bar is
    /// already live, so a quick reconnect does not render empty until
    /// something changes.
    fn replay_surface(&self) {
        let content = match self.surface.lock() {
            Ok(surface) => surface.clone(),
            Err(_) => return,
        };
        if let Some(content) = content {
            debug!("replaying live bar to reattached widget");
            self.send(&WidgetMessage::Show {
                title: &content.title,
                subtitle: &content.subtitle,
            });
        }
    }

    fn attach(&self, stream: UnixStream) {
        if let Ok(mut guard) = self.stream.lock() {
            *guard = Some(stream);
        }
    }

    fn detach(&self) {
        if let Ok(mut guard) = self.stream.lock() {
            *guard = None;
        }
    }
}

fn accept_loop(
    listener: UnixListener,
    link: WidgetLink,
    events: mpsc::UnboundedSender<WidgetEvent>,
) {
    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(stream) => stream,
            Err(e) => {
                error!("widget accept failed: {e}");
                continue;
            }
        };
        let reader = match stream.try_clone() {
            Ok(reader) => reader,
            Err(e) => {
                error!("widget stream clone failed: {e}");
                continue;
            }
        };

        link.attach(stream);
        link.replay_surface();
        info!("widget connected");
        if events.send(WidgetEvent::Connected).is_err() {
            return;
        }

        // Serve this client until it goes away; the next accept
        // replaces the link.
        for line in BufReader::new(reader).lines() {
            match line {
                Ok(command) => {
                    let command = command.trim();
                    if command.is_empty() {
                        continue;
                    }
                    if events
                        .send(WidgetEvent::Command(command.to_string()))
                        .is_err()
                    {
                        return;
                    }
                }
                Err(e) => {
                    debug!("widget read ended: {e}");
                    break;
                }
            }
        }

        link.detach();
        info!("widget disconnected");
        if events.send(WidgetEvent::Disconnected).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_link(dir: &Path) -> (WidgetLink, mpsc::UnboundedReceiver<WidgetEvent>, UnixStream) {
        let path = dir.join("nowbar.sock");
        let (link, events) = WidgetLink::start(&path).unwrap();
        let client = UnixStream::connect(&path).unwrap();
        (link, events, client)
    }

    #[test]
    fn connect_grants_capability_and_carries_messages() {
        let dir = tempfile::tempdir().unwrap();
        let (link, mut events, mut client) = start_link(dir.path());

        assert!(matches!(
            events.blocking_recv().unwrap(),
            WidgetEvent::Connected
        ));
        assert!(link.connected());

        assert!(link.send(&WidgetMessage::Show {
            title: "Now Playing",
            subtitle: "Unknown Track",
        }));

        let mut line = String::new();
        let mut reader = BufReader::new(&mut client);
        reader.read_line(&mut line).unwrap();
        assert!(line.contains("\"type\":\"show\""));
        assert!(line.contains("Now Playing"));
    }

    #[test]
    fn commands_are_forwarded_as_events() {
        let dir = tempfile::tempdir().unwrap();
        let (_link, mut events, mut client) = start_link(dir.path());

        assert!(matches!(
            events.blocking_recv().unwrap(),
            WidgetEvent::Connected
        ));

        client.write_all(b"play\n").unwrap();
        match events.blocking_recv().unwrap() {
            WidgetEvent::Command(cmd) => assert_eq!(cmd, "play"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn disconnect_revokes_capability() {
        let dir = tempfile::tempdir().unwrap();
        let (link, mut events, client) = start_link(dir.path());

        assert!(matches!(
            events.blocking_recv().unwrap(),
            WidgetEvent::Connected
        ));
        drop(client);

        assert!(matches!(
            events.blocking_recv().unwrap(),
            WidgetEvent::Disconnected
        ));
        assert!(!link.connected());
    }

    #[test]
    fn reattached_client_receives_the_live_bar() {
        let dir = tempfile::tempdir().unwrap();
        let (link, mut events, mut first) = start_link(dir.path());
        assert!(matches!(
            events.blocking_recv().unwrap(),
            WidgetEvent::Connected
        ));

        assert!(link.send(&WidgetMessage::Show {
            title: "Charging: 80%",
            subtitle: "Battery charging",
        }));
        let mut line = String::new();
        BufReader::new(&mut first).read_line(&mut line).unwrap();
        assert!(line.contains("\"type\":\"show\""));

        // The bar stays logically shown across the reconnect, so the
        // daemon never re-sends anything. The link itself must catch
        // the new client up.
        drop(first);
        assert!(matches!(
            events.blocking_recv().unwrap(),
            WidgetEvent::Disconnected
        ));

        let mut second = UnixStream::connect(dir.path().join("nowbar.sock")).unwrap();
        assert!(matches!(
            events.blocking_recv().unwrap(),
            WidgetEvent::Connected
        ));

        let mut line = String::new();
        BufReader::new(&mut second).read_line(&mut line).unwrap();
        assert!(line.contains("\"type\":\"show\""));
        assert!(line.contains("Charging: 80%"));
    }

    #[test]
    fn hide_clears_the_replayed_bar() {
        let dir = tempfile::tempdir().unwrap();
        let (link, mut events, first) = start_link(dir.path());
        assert!(matches!(
            events.blocking_recv().unwrap(),
            WidgetEvent::Connected
        ));

        assert!(link.send(&WidgetMessage::Show {
            title: "Now Playing",
            subtitle: "Unknown Track",
        }));
        assert!(link.send(&WidgetMessage::Hide));
        drop(first);
        assert!(matches!(
            events.blocking_recv().unwrap(),
            WidgetEvent::Disconnected
        ));

        let mut second = UnixStream::connect(dir.path().join("nowbar.sock")).unwrap();
        assert!(matches!(
            events.blocking_recv().unwrap(),
            WidgetEvent::Connected
        ));

        // Nothing to replay; the next write is the first thing the
        // client sees.
        assert!(link.send(&WidgetMessage::Hide));
        let mut line = String::new();
        BufReader::new(&mut second).read_line(&mut line).unwrap();
        assert!(line.contains("\"type\":\"hide\""));
    }

    #[test]
    fn send_without_client_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nowbar.sock");
        let (link, _events) = WidgetLink::start(&path).unwrap();
        assert!(!link.send(&WidgetMessage::Hide));
    }
}
