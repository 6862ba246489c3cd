//! MPRIS media activity and transport commands.
//!
//! A background task keeps a cheap playback flag fresh; callers read
//! it synchronously. The PropertiesChanged signal is used as a trigger
//! only, the property itself is always fetched fresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, info, warn};
use nowbar_core::{MediaCommand, MediaController};
use tokio::sync::mpsc;
use zbus::Connection;

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";
const RESCAN_DELAY: Duration = Duration::from_secs(2);
const LIVENESS_PERIOD: Duration = Duration::from_secs(5);

#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MprisPlayer {
    fn play(&self) -> zbus::Result<()>;
    fn pause(&self) -> zbus::Result<()>;
    fn next(&self) -> zbus::Result<()>;
    fn previous(&self) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;
}

/// Shared handle: read the cached playback flag, send commands.
#[derive(Clone)]
pub struct MediaService {
    playing: Arc<AtomicBool>,
    commands: mpsc::Sender<MediaCommand>,
}

impl MediaService {
    /// Spawn the background MPRIS worker.
    pub fn start() -> Self {
        let playing = Arc::new(AtomicBool::new(false));
        let (command_tx, mut command_rx) = mpsc::channel::<MediaCommand>(32);

        let worker_flag = Arc::clone(&playing);
        tokio::spawn(async move {
            loop {
                if let Err(e) = worker(&worker_flag, &mut command_rx).await {
                    warn!("mpris worker failed: {e}, retrying");
                }
                worker_flag.store(false, Ordering::SeqCst);
                tokio::time::sleep(RESCAN_DELAY).await;
            }
        });

        MediaService {
            playing,
            commands: command_tx,
        }
    }

    /// Whether any MPRIS player is currently playing.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

impl MediaController for MediaService {
    fn send(&self, command: MediaCommand) -> bool {
        self.commands.try_send(command).is_ok()
    }
}

async fn worker(
    playing: &AtomicBool,
    commands: &mut mpsc::Receiver<MediaCommand>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    loop {
        let Some(bus_name) = find_player(&connection).await? else {
            playing.store(false, Ordering::SeqCst);
            // No player to talk to; commands are dropped until one
            // shows up.
            tokio::select! {
                _ = tokio::time::sleep(RESCAN_DELAY) => {}
                Some(command) = commands.recv() => {
                    debug!("no mpris player for {command:?}");
                }
            }
            continue;
        };

        info!("following mpris player {bus_name}");
        if let Err(e) = player_session(&connection, &bus_name, playing, commands).await {
            warn!("player session ended: {e}");
            playing.store(false, Ordering::SeqCst);
        }
    }
}

/// Find any MPRIS player on the session bus.
async fn find_player(connection: &Connection) -> zbus::Result<Option<String>> {
    let dbus = zbus::fdo::DBusProxy::new(connection).await?;
    let names = dbus.list_names().await?;
    Ok(names
        .iter()
        .map(|name| name.to_string())
        .find(|name| name.starts_with(MPRIS_PREFIX)))
}

async fn player_session(
    connection: &Connection,
    bus_name: &str,
    playing: &AtomicBool,
    commands: &mut mpsc::Receiver<MediaCommand>,
) -> zbus::Result<()> {
    let proxy = MprisPlayerProxy::builder(connection)
        .destination(bus_name.to_string())?
        .build()
        .await?;

    let mut status_stream = proxy.receive_playback_status_changed().await;

    refresh(&proxy, playing).await?;

    loop {
        tokio::select! {
            Some(_) = status_stream.next() => {
                // Signal is a trigger only; fetch fresh.
                refresh(&proxy, playing).await?;
            }
            Some(command) = commands.recv() => {
                dispatch(&proxy, command).await;
                refresh(&proxy, playing).await?;
            }
            _ = tokio::time::sleep(LIVENESS_PERIOD) => {
                // Liveness check doubles as a polling fallback for
                // players that do not emit property signals.
                refresh(&proxy, playing).await?;
            }
        }
    }
}

async fn refresh(proxy: &MprisPlayerProxy<'_>, playing: &AtomicBool) -> zbus::Result<()> {
    let status = proxy.playback_status().await?;
    playing.store(status == "Playing", Ordering::SeqCst);
    Ok(())
}

async fn dispatch(proxy: &MprisPlayerProxy<'_>, command: MediaCommand) {
    debug!("dispatching {command:?}");
    let result = match command {
        MediaCommand::Play => proxy.play().await,
        MediaCommand::Pause => proxy.pause().await,
        MediaCommand::Next => proxy.next().await,
        MediaCommand::Previous => proxy.previous().await,
    };
    if let Err(e) = result {
        warn!("media command {command:?} failed: {e}");
    }
}
