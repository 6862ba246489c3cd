//! nowbar - ambient device status daemon.
//!
//! Shows media playback and charging state on an overlay widget while
//! one is connected, degrading to a persistent desktop notification
//! otherwise. Two independent loops drive it: the presentation monitor
//! and the battery status stream.

mod config;
mod display;
mod services;

use std::error::Error;
use std::sync::Arc;

use log::{info, warn};
use nowbar_core::{
    BatteryStream, MediaCommand, MediaController, PresentationController, ServiceMonitor,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::display::NowBarDisplay;
use crate::display::notify::Notifier;
use crate::display::widget::{WidgetEvent, WidgetLink, WidgetMessage};
use crate::services::media::MediaService;
use crate::services::status::DeviceStateProvider;
use crate::services::system_info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load();
    info!("starting nowbar...");
    system_info::log_identity();

    let media = MediaService::start();
    let provider = Arc::new(DeviceStateProvider::new(media.clone()));

    let (widget, widget_events) = WidgetLink::start(&config.socket_path)?;

    let display = NowBarDisplay::new(
        widget.clone(),
        Notifier::connect(&config.notification_app_name),
    );
    let mut monitor = ServiceMonitor::start(
        Arc::clone(&provider),
        PresentationController::new(display),
        config.monitor_period(),
    );

    let stream = BatteryStream::new(Arc::clone(&provider), config.battery_stream_period());
    let driver = tokio::spawn(drive_widget(widget, widget_events, stream, media));

    info!("nowbar running; widget socket at {}", config.socket_path.display());

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    monitor.stop().await;
    driver.abort();
    Ok(())
}

/// React to widget link events: arm and stop the battery stream with
/// the connection, and route inbound command lines.
async fn drive_widget(
    widget: WidgetLink,
    mut events: mpsc::UnboundedReceiver<WidgetEvent>,
    mut stream: BatteryStream<DeviceStateProvider>,
    media: MediaService,
) {
    let mut forwarder: Option<JoinHandle<()>> = None;

    while let Some(event) = events.recv().await {
        match event {
            WidgetEvent::Connected => {
                if let Some(task) = forwarder.take() {
                    task.abort();
                }
                let mut reports = stream.subscribe().await;
                let link = widget.clone();
                forwarder = Some(tokio::spawn(async move {
                    while reports.changed().await.is_ok() {
                        let report = reports.borrow_and_update().clone();
                        if let Some(report) = report {
                            link.send(&WidgetMessage::Battery { report: &report });
                        }
                    }
                }));
            }
            WidgetEvent::Disconnected => {
                stream.unsubscribe().await;
                if let Some(task) = forwarder.take() {
                    task.abort();
                }
            }
            WidgetEvent::Command(line) => handle_command(&widget, &media, &line),
        }
    }
}

fn handle_command(widget: &WidgetLink, media: &MediaService, line: &str) {
    if line == "device" {
        widget.send(&WidgetMessage::Device {
            info: system_info::identity(),
        });
        return;
    }

    match line.parse::<MediaCommand>() {
        Ok(command) => {
            let accepted = media.send(command);
            widget.send(&WidgetMessage::CommandResult {
                command: line,
                accepted,
            });
        }
        Err(err) => {
            warn!("{err}");
            widget.send(&WidgetMessage::CommandResult {
                command: line,
                accepted: false,
            });
        }
    }
}
