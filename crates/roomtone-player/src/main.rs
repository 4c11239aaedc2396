//! Roomtone - play one audio file through a live reverb
//!
//! This is the entry point of the GUI application. It:
//! 1. Loads the read-only YAML config
//! 2. Starts the cpal output stream (or falls back to UI-only mode)
//! 3. Spawns the background source loader
//! 4. Runs the iced application around the transport controller
//!
//! Set `RUST_LOG=debug` for verbose output.

mod config;
mod ui;

use std::sync::Arc;

use anyhow::Context;
use iced::{Size, Task};

use roomtone_core::audio::{get_available_output_devices, start_audio_system, AudioHandle};
use roomtone_core::config::{default_config_path, load_config};
use roomtone_core::controller::TransportController;
use roomtone_core::loader::SourceLoader;
use roomtone_core::render::render_channel;
use roomtone_core::reverb::SharedReverbParameters;
use roomtone_core::transport::Transport;
use roomtone_core::DEFAULT_SAMPLE_RATE;

use config::PlayerConfig;
use ui::{Message, RoomtoneApp};

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("roomtone starting up");

    let (audio_handle, controller) = match setup() {
        Ok(parts) => parts,
        Err(e) => {
            log::error!("{:#}", e);
            std::process::exit(1);
        }
    };

    // The boot closure must be Fn, so hand the controller over through a cell
    let controller_cell = std::cell::RefCell::new(Some(controller));

    let result = iced::application(
        move || {
            let controller = controller_cell.borrow_mut().take().expect("controller already taken");
            (RoomtoneApp::new(controller), Task::none())
        },
        update,
        view,
    )
    .subscription(subscription)
    .theme(theme)
    .title(title)
    .window_size(Size::new(320.0, 320.0))
    .run();

    // Keep the stream alive until the window closes
    drop(audio_handle);
    log::info!("roomtone stopped");

    result
}

/// Build everything the UI needs
///
/// Audio failure is not fatal: the player runs without output, like a
/// disconnected device.
fn setup() -> anyhow::Result<(Option<AudioHandle>, TransportController)> {
    let config_path = default_config_path();
    let config: PlayerConfig = load_config(&config_path);

    let params = Arc::new(SharedReverbParameters::new(config.reverb));

    let (audio_handle, link, sample_rate) = match start_audio_system(&config.audio, Arc::clone(&params)) {
        Ok(system) => {
            log::info!(
                "Audio running on {} at {}Hz ({} frames, ~{:.1}ms)",
                system.handle.device_name(),
                system.sample_rate,
                system.buffer_size,
                system.latency_ms
            );
            (Some(system.handle), system.link, system.sample_rate)
        }
        Err(e) => {
            log::warn!("Could not start audio: {}", e);
            for device in get_available_output_devices() {
                log::info!("  available output: {}", device);
            }
            log::warn!("Running in UI-only mode (no audio output)");
            // With the render loop gone the transport keeps Play disabled
            let (render, link) = render_channel(Arc::clone(&params));
            drop(render);
            (None, link, DEFAULT_SAMPLE_RATE)
        }
    };

    let loader = SourceLoader::spawn(sample_rate).context("Failed to start the source loader")?;
    let controller = TransportController::new(Transport::new(link), loader, params);

    Ok((audio_handle, controller))
}

fn update(app: &mut RoomtoneApp, message: Message) -> Task<Message> {
    app.update(message)
}

fn view(app: &RoomtoneApp) -> iced::Element<'_, Message> {
    app.view()
}

fn subscription(app: &RoomtoneApp) -> iced::Subscription<Message> {
    app.subscription()
}

fn title(app: &RoomtoneApp) -> String {
    app.title()
}

fn theme(app: &RoomtoneApp) -> iced::Theme {
    app.theme()
}
