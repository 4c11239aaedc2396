//! Transport controller
//!
//! Glue between UI events and the core: file-picker results go to the
//! loader, loader results are staged on the transport, button clicks and
//! engine changes run through the transport state machine, and slider moves
//! are written to the shared reverb parameters. The position label is
//! refreshed by a separate timer and never drives a transition.

use std::path::PathBuf;
use std::sync::Arc;

use crate::loader::{LoadOutcome, SourceLoader};
use crate::reverb::{ReverbParameters, SharedReverbParameters};
use crate::transport::{CommandOutcome, Transport, TransportControls, TransportState};

/// Label text while the engine is not producing sound
pub const STOPPED_LABEL: &str = "Stopped";

/// Format a position as `MM:SS.mmm`
///
/// Minutes wrap at 60; hours are not shown.
pub fn format_position(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0) as u64;
    let minutes = (total_millis / 60_000) % 60;
    let secs = (total_millis / 1000) % 60;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}.{:03}", minutes, secs, millis)
}

pub struct TransportController {
    transport: Transport,
    loader: SourceLoader,
    params: Arc<SharedReverbParameters>,
    position_label: String,
    status: Option<String>,
    loading: Option<PathBuf>,
    loaded: Option<PathBuf>,
}

impl TransportController {
    pub fn new(transport: Transport, loader: SourceLoader, params: Arc<SharedReverbParameters>) -> Self {
        Self {
            transport,
            loader,
            params,
            position_label: STOPPED_LABEL.to_string(),
            status: None,
            loading: None,
            loaded: None,
        }
    }

    /// File picker result; `None` means the dialog was cancelled
    pub fn open(&mut self, path: Option<PathBuf>) {
        let Some(path) = path else {
            log::debug!("Open dialog cancelled");
            return;
        };

        match self.loader.request(path.clone()) {
            Ok(generation) => {
                log::info!("Loading {:?} (request {})", path, generation);
                self.status = Some(format!("Loading {}...", display_name(&path)));
                self.loading = Some(path);
            }
            Err(e) => {
                log::error!("Could not queue {:?}: {}", path, e);
                self.status = Some(e.to_string());
            }
        }
    }

    pub fn play_clicked(&mut self) -> CommandOutcome {
        self.transport.play()
    }

    pub fn stop_clicked(&mut self) -> CommandOutcome {
        self.transport.stop()
    }

    pub fn set_room_size(&self, value: f32) {
        self.params.set_room_size(value);
    }

    pub fn set_wet_level(&self, value: f32) {
        self.params.set_wet_level(value);
    }

    pub fn set_dry_level(&self, value: f32) {
        self.params.set_dry_level(value);
    }

    /// Current reverb settings (for slider positions)
    pub fn reverb_parameters(&self) -> ReverbParameters {
        self.params.snapshot()
    }

    /// Deliver finished loads and engine changes
    pub fn pump(&mut self) {
        loop {
            match self.loader.try_recv() {
                Ok(Some(outcome)) => self.finish_load(outcome),
                Ok(None) => break,
                Err(e) => {
                    log::error!("{}", e);
                    self.status = Some(e.to_string());
                    break;
                }
            }
        }

        while let Some(outcome) = self.transport.pump_engine_changes() {
            if let CommandOutcome::Changed { to, .. } = outcome {
                if to == TransportState::Stopped {
                    self.position_label = STOPPED_LABEL.to_string();
                }
            }
        }
    }

    fn finish_load(&mut self, outcome: LoadOutcome) {
        self.loading = None;
        match outcome.result {
            Ok(source) => {
                self.status = Some(format!(
                    "Loaded {} ({})",
                    display_name(&outcome.path),
                    format_position(source.total_length() as f64 / source.sample_rate().max(1) as f64)
                ));
                self.transport.stage(source);
                self.loaded = Some(outcome.path);
            }
            Err(e) => {
                log::warn!("Could not load {:?}: {}", outcome.path, e);
                self.status = Some(format!("Could not open {}: {}", display_name(&outcome.path), e));
            }
        }
    }

    /// 20ms label timer
    pub fn timer_tick(&mut self) {
        let atomics = self.transport.atomics();
        self.position_label = if atomics.is_playing() {
            format_position(atomics.position_seconds())
        } else {
            STOPPED_LABEL.to_string()
        };
    }

    pub fn position_label(&self) -> &str {
        &self.position_label
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Most recently loaded file
    pub fn loaded_path(&self) -> Option<&PathBuf> {
        self.loaded.as_ref()
    }

    pub fn controls(&self) -> TransportControls {
        self.transport.controls()
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_channel, AudioCallback, RenderLoop};
    use std::path::Path;
    use std::time::{Duration, Instant};

    const BLOCK: usize = 480;

    fn write_wav(path: &Path, seconds: f64) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let frames = (seconds * 48000.0) as usize;
        for i in 0..frames {
            let s = ((i as f32 * 0.05).sin() * 8000.0) as i16;
            writer.write_sample(s).unwrap();
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn setup() -> (TransportController, RenderLoop) {
        let params = Arc::new(SharedReverbParameters::default());
        let (mut render, link) = render_channel(Arc::clone(&params));
        render.prepare(BLOCK, 48000);
        let loader = SourceLoader::spawn(48000).unwrap();
        (TransportController::new(Transport::new(link), loader, params), render)
    }

    fn wait_for_load(controller: &mut TransportController) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while controller.is_loading() {
            assert!(Instant::now() < deadline, "load timed out");
            std::thread::sleep(Duration::from_millis(5));
            controller.pump();
        }
    }

    fn run_blocks(render: &mut RenderLoop, blocks: usize) {
        let mut left = vec![0.0; BLOCK];
        let mut right = vec![0.0; BLOCK];
        for _ in 0..blocks {
            render.render(&mut left, &mut right);
        }
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(0.0), "00:00.000");
        assert_eq!(format_position(1.5), "00:01.500");
        assert_eq!(format_position(61.25), "01:01.250");
        assert_eq!(format_position(59.9999), "00:59.999");
        // Minutes wrap at an hour
        assert_eq!(format_position(3725.0), "02:05.000");
    }

    #[test]
    fn test_play_before_load() {
        let (mut controller, _render) = setup();
        assert!(!controller.controls().play_enabled);
        assert!(!controller.play_clicked().is_changed());
        assert_eq!(controller.state(), TransportState::Stopped);
        controller.timer_tick();
        assert_eq!(controller.position_label(), "Stopped");
    }

    #[test]
    fn test_cancelled_dialog_is_noop() {
        let (mut controller, _render) = setup();
        controller.open(None);
        assert!(!controller.is_loading());
        assert!(controller.status().is_none());
    }

    #[test]
    fn test_failed_load_keeps_play_disabled() {
        let (mut controller, _render) = setup();
        controller.open(Some(PathBuf::from("/nonexistent/missing.wav")));
        wait_for_load(&mut controller);

        assert!(!controller.controls().play_enabled);
        assert!(controller.status().unwrap().starts_with("Could not open missing.wav"));
        assert!(controller.loaded_path().is_none());
    }

    #[test]
    fn test_sliders_write_shared_parameters() {
        let (controller, _render) = setup();
        controller.set_room_size(0.9);
        controller.set_wet_level(0.1);
        controller.set_dry_level(0.7);

        let params = controller.reverb_parameters();
        assert_eq!(params.room_size, 0.9);
        assert_eq!(params.wet_level, 0.1);
        assert_eq!(params.dry_level, 0.7);
    }

    #[test]
    fn test_timer_shows_position_while_playing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 1.0);

        let (mut controller, mut render) = setup();
        controller.open(Some(path.clone()));
        wait_for_load(&mut controller);
        assert!(controller.controls().play_enabled);
        assert_eq!(controller.loaded_path(), Some(&path));

        controller.play_clicked();
        // 25 blocks of 480 frames = 250ms
        run_blocks(&mut render, 25);
        controller.pump();
        assert_eq!(controller.state(), TransportState::Playing);

        controller.timer_tick();
        assert_eq!(controller.position_label(), "00:00.250");
    }

    #[test]
    fn test_two_second_file_plays_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.wav");
        write_wav(&path, 2.0);

        let (mut controller, mut render) = setup();
        controller.open(Some(path));
        wait_for_load(&mut controller);

        controller.play_clicked();
        run_blocks(&mut render, 1);
        controller.pump();
        assert_eq!(controller.state(), TransportState::Playing);

        // Play well past the end; the final block is zero-padded
        run_blocks(&mut render, 250);
        controller.pump();
        assert_eq!(controller.state(), TransportState::Stopped);

        run_blocks(&mut render, 1);
        controller.timer_tick();
        assert_eq!(controller.position_label(), "Stopped");
        assert_eq!(controller.transport().atomics().position(), 0);
        assert!(!controller.controls().stop_enabled);
    }

    #[test]
    fn test_play_pause_play_stop_returns_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 3.0);

        let (mut controller, mut render) = setup();
        controller.open(Some(path));
        wait_for_load(&mut controller);

        controller.play_clicked();
        run_blocks(&mut render, 10);
        controller.pump();
        assert_eq!(controller.state(), TransportState::Playing);

        controller.play_clicked();
        run_blocks(&mut render, 1);
        controller.pump();
        assert_eq!(controller.state(), TransportState::Paused);
        assert_eq!(controller.transport().atomics().position(), 10 * BLOCK as u64);

        controller.play_clicked();
        run_blocks(&mut render, 5);
        controller.pump();
        assert_eq!(controller.state(), TransportState::Playing);

        controller.stop_clicked();
        run_blocks(&mut render, 1);
        controller.pump();
        assert_eq!(controller.state(), TransportState::Stopped);
        run_blocks(&mut render, 1);
        assert_eq!(controller.transport().atomics().position(), 0);
    }
}
