//! Transport driver: pending/current source handoff and entry actions

use basedrop::Owned;
use std::sync::Arc;

use super::state::{CommandOutcome, IgnoreReason, TransportEvent, TransportState};
use crate::notify::{ChangeListener, EngineChange};
use crate::render::gc::gc_handle;
use crate::render::{CommandSender, EngineLink, TransportAtomics, TransportCommand};
use crate::source::PlaybackSource;

/// Text and enablement of the Play and Stop buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportControls {
    pub play_label: &'static str,
    pub stop_label: &'static str,
    pub play_enabled: bool,
    pub stop_enabled: bool,
}

impl Default for TransportControls {
    fn default() -> Self {
        Self {
            play_label: "Play",
            stop_label: "Stop",
            play_enabled: false,
            stop_enabled: false,
        }
    }
}

/// UI-side transport
///
/// Holds at most one pending source (the last one loaded) and tracks
/// whether the render thread has a current source. The pending source is
/// moved to the render thread only on entry to `Starting`.
pub struct Transport {
    state: TransportState,
    pending: Option<PlaybackSource>,
    has_current: bool,
    commands: CommandSender,
    atomics: Arc<TransportAtomics>,
    changes: ChangeListener,
    controls: TransportControls,
}

impl Transport {
    pub fn new(link: EngineLink) -> Self {
        Self {
            state: TransportState::Stopped,
            pending: None,
            has_current: false,
            commands: link.commands,
            atomics: link.atomics,
            changes: link.changes,
            controls: TransportControls::default(),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn controls(&self) -> TransportControls {
        TransportControls {
            play_enabled: self.controls.play_enabled && self.engine_attached(),
            ..self.controls
        }
    }

    /// Whether a render loop is still on the other end of the link
    ///
    /// False once the audio stream is gone, or when the player runs
    /// without an output device.
    pub fn engine_attached(&self) -> bool {
        self.commands.is_connected()
    }

    pub fn atomics(&self) -> &Arc<TransportAtomics> {
        &self.atomics
    }

    /// Whether a loaded source is waiting for the next `Starting`
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Stage a freshly loaded source as the next one to play
    ///
    /// Replaces any earlier pending source. The current source keeps
    /// playing untouched.
    pub fn stage(&mut self, source: PlaybackSource) {
        if self.pending.is_some() {
            log::debug!("Replacing pending source");
        }
        self.pending = Some(source);
        self.controls.play_enabled = true;
    }

    /// Play button
    pub fn play(&mut self) -> CommandOutcome {
        if !self.engine_attached() {
            log::trace!("Ignored Play in {}: no engine", self.state);
            return CommandOutcome::Ignored(IgnoreReason::NoEngine);
        }
        self.apply(TransportEvent::PlayPressed)
    }

    /// Stop button
    pub fn stop(&mut self) -> CommandOutcome {
        self.apply(TransportEvent::StopPressed)
    }

    /// Feed the latest engine change, if any, into the state machine
    ///
    /// A detached engine never reports back, so a transient state is
    /// settled here as if the engine had stopped.
    pub fn pump_engine_changes(&mut self) -> Option<CommandOutcome> {
        let Some(change) = self.changes.poll() else {
            if self.state.is_transient() && !self.engine_attached() {
                log::warn!("Engine detached while {}", self.state);
                return Some(self.apply(TransportEvent::EngineStopped));
            }
            return None;
        };
        let event = match change {
            EngineChange::Started => TransportEvent::EngineStarted,
            EngineChange::Stopped(reason) => {
                log::debug!("Engine stopped: {:?}", reason);
                TransportEvent::EngineStopped
            }
        };
        Some(self.apply(event))
    }

    /// Run one event through the transition table
    pub fn apply(&mut self, event: TransportEvent) -> CommandOutcome {
        let source_ready = self.pending.is_some() || self.has_current;
        match self.state.on_event(event, source_ready) {
            Ok(next) => {
                let from = self.state;
                self.change_state(next);
                log::debug!("Transport {} -> {} on {:?}", from, next, event);
                CommandOutcome::Changed { from, to: next }
            }
            Err(reason) => {
                log::trace!("Ignored {:?} in {}: {:?}", event, self.state, reason);
                CommandOutcome::Ignored(reason)
            }
        }
    }

    /// Enter `next` and perform its entry action
    fn change_state(&mut self, next: TransportState) {
        if next == self.state {
            return;
        }
        self.state = next;

        match next {
            TransportState::Stopped => {
                self.controls.play_label = "Play";
                self.controls.stop_label = "Stop";
                self.controls.stop_enabled = false;
                self.send(TransportCommand::Rewind);
                self.atomics.reset_position();
            }
            TransportState::Starting => {
                if let Some(source) = self.pending.take() {
                    match source.prepare_to_play(self.atomics.sample_rate()) {
                        Ok(()) => {
                            log::debug!(
                                "Activating source at {}Hz, {}-frame blocks",
                                self.atomics.sample_rate(),
                                self.atomics.block_size()
                            );
                            self.send(TransportCommand::Activate(Owned::new(&gc_handle(), source)));
                            self.has_current = true;
                        }
                        Err(e) => {
                            // Keep the current source, if any
                            log::warn!("Dropping staged source: {}", e);
                            self.controls.play_enabled = self.has_current;
                        }
                    }
                }
                self.send(TransportCommand::Start);
            }
            TransportState::Playing => {
                self.controls.play_label = "Pause";
                self.controls.stop_label = "Stop";
                self.controls.stop_enabled = true;
            }
            TransportState::Pausing | TransportState::Stopping => {
                self.send(TransportCommand::Halt);
            }
            TransportState::Paused => {
                self.controls.play_label = "Resume";
                self.controls.stop_label = "Return to 0";
            }
        }
    }

    fn send(&mut self, command: TransportCommand) {
        if let Err(command) = self.commands.send(command) {
            log::warn!("Command queue full, dropping {:?}", command);
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("state", &self.state)
            .field("pending", &self.pending)
            .field("has_current", &self.has_current)
            .field("controls", &self.controls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_channel, AudioCallback, RenderLoop};
    use crate::reverb::{ReverbParameters, SharedReverbParameters};
    use crate::source::DecodedAudio;

    const BLOCK: usize = 480;

    fn setup() -> (Transport, RenderLoop) {
        let params = Arc::new(SharedReverbParameters::new(ReverbParameters::default()));
        let (mut render, link) = render_channel(params);
        render.prepare(BLOCK, 48000);
        (Transport::new(link), render)
    }

    fn source(seconds: f64) -> PlaybackSource {
        let frames = (seconds * 48000.0) as usize;
        PlaybackSource::new(DecodedAudio::from_channels(vec![0.1; frames], vec![0.1; frames], 48000))
    }

    fn run_blocks(render: &mut RenderLoop, blocks: usize) {
        let mut left = vec![0.0; BLOCK];
        let mut right = vec![0.0; BLOCK];
        for _ in 0..blocks {
            render.render(&mut left, &mut right);
        }
    }

    /// One render block then one UI pump
    fn cycle(transport: &mut Transport, render: &mut RenderLoop) {
        run_blocks(render, 1);
        transport.pump_engine_changes();
    }

    #[test]
    fn test_play_before_load_is_ignored() {
        let (mut transport, _render) = setup();
        assert!(!transport.controls().play_enabled);
        assert_eq!(transport.play(), CommandOutcome::Ignored(IgnoreReason::NoSource));
        assert_eq!(transport.state(), TransportState::Stopped);
    }

    #[test]
    fn test_stop_while_stopped_is_noop() {
        let (mut transport, mut render) = setup();
        transport.stage(source(1.0));
        assert_eq!(transport.stop(), CommandOutcome::Ignored(IgnoreReason::AlreadyInState));
        run_blocks(&mut render, 1);
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.atomics().position(), 0);
        assert!(transport.has_pending());
    }

    #[test]
    fn test_play_reaches_playing_via_engine() {
        let (mut transport, mut render) = setup();
        transport.stage(source(1.0));
        assert!(transport.controls().play_enabled);

        assert!(transport.play().is_changed());
        assert_eq!(transport.state(), TransportState::Starting);
        assert!(!transport.has_pending());

        // Clicks during Starting are ignored
        assert_eq!(transport.play(), CommandOutcome::Ignored(IgnoreReason::Transient));
        assert_eq!(transport.stop(), CommandOutcome::Ignored(IgnoreReason::Transient));

        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Playing);
        let controls = transport.controls();
        assert_eq!(controls.play_label, "Pause");
        assert_eq!(controls.stop_label, "Stop");
        assert!(controls.stop_enabled);
    }

    #[test]
    fn test_pause_resume_stop_ends_at_zero() {
        let (mut transport, mut render) = setup();
        transport.stage(source(5.0));
        transport.play();
        cycle(&mut transport, &mut render);
        run_blocks(&mut render, 10);

        transport.play();
        assert_eq!(transport.state(), TransportState::Pausing);
        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Paused);
        assert_eq!(transport.controls().play_label, "Resume");
        assert_eq!(transport.controls().stop_label, "Return to 0");

        // Pause keeps the read position
        let paused_at = render.position().unwrap();
        assert_eq!(paused_at, 11 * BLOCK);
        run_blocks(&mut render, 3);
        assert_eq!(render.position(), Some(paused_at));

        transport.play();
        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Playing);
        assert_eq!(render.position(), Some(paused_at + BLOCK));

        transport.stop();
        assert_eq!(transport.state(), TransportState::Stopping);
        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Stopped);

        // Rewind is applied on the next block
        run_blocks(&mut render, 1);
        assert_eq!(render.position(), Some(0));
        assert_eq!(transport.atomics().position(), 0);
        assert!(!transport.controls().stop_enabled);
        assert_eq!(transport.controls().play_label, "Play");
    }

    #[test]
    fn test_return_to_zero_from_paused() {
        let (mut transport, mut render) = setup();
        transport.stage(source(5.0));
        transport.play();
        cycle(&mut transport, &mut render);
        run_blocks(&mut render, 4);
        transport.play();
        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Paused);

        assert!(transport.stop().is_changed());
        assert_eq!(transport.state(), TransportState::Stopped);
        run_blocks(&mut render, 1);
        assert_eq!(render.position(), Some(0));
    }

    #[test]
    fn test_end_of_stream_stops_and_rewinds() {
        let (mut transport, mut render) = setup();
        transport.stage(source(2.0));
        transport.play();
        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Playing);

        // 2s at 48kHz is exactly 200 blocks of 480, one already rendered
        run_blocks(&mut render, 198);
        transport.pump_engine_changes();
        assert_eq!(transport.state(), TransportState::Playing);

        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Stopped);
        run_blocks(&mut render, 1);
        assert_eq!(render.position(), Some(0));
        assert!(!render.is_playing());
    }

    #[test]
    fn test_replay_after_stop_uses_current_source() {
        let (mut transport, mut render) = setup();
        transport.stage(source(1.0));
        transport.play();
        cycle(&mut transport, &mut render);
        transport.stop();
        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Stopped);

        assert!(transport.play().is_changed());
        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Playing);
        assert_eq!(render.position(), Some(BLOCK));
    }

    #[test]
    fn test_stage_while_playing_does_not_touch_current() {
        let (mut transport, mut render) = setup();
        transport.stage(source(5.0));
        transport.play();
        cycle(&mut transport, &mut render);
        run_blocks(&mut render, 5);

        transport.stage(source(1.0));
        run_blocks(&mut render, 1);
        assert_eq!(transport.state(), TransportState::Playing);
        assert_eq!(render.position(), Some(7 * BLOCK));
        assert_eq!(transport.atomics().length(), 5 * 48000);

        // The staged source becomes current on the next Starting
        transport.stop();
        cycle(&mut transport, &mut render);
        transport.play();
        cycle(&mut transport, &mut render);
        assert_eq!(transport.atomics().length(), 48000);
    }

    fn source_at(frames: usize, sample_rate: u32) -> PlaybackSource {
        PlaybackSource::new(DecodedAudio::from_channels(vec![0.1; frames], vec![0.1; frames], sample_rate))
    }

    #[test]
    fn test_detached_engine_keeps_play_disabled() {
        let (mut transport, render) = setup();
        drop(render);
        assert!(!transport.engine_attached());

        transport.stage(source(0.1));
        assert!(transport.has_pending());
        assert!(!transport.controls().play_enabled);
        assert_eq!(transport.play(), CommandOutcome::Ignored(IgnoreReason::NoEngine));

        for _ in 0..100 {
            assert_eq!(transport.pump_engine_changes(), None);
        }
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.stop(), CommandOutcome::Ignored(IgnoreReason::AlreadyInState));
        assert_eq!(transport.play(), CommandOutcome::Ignored(IgnoreReason::NoEngine));
    }

    #[test]
    fn test_engine_lost_while_starting_settles_to_stopped() {
        let (mut transport, render) = setup();
        transport.stage(source(0.1));
        assert!(transport.play().is_changed());
        assert_eq!(transport.state(), TransportState::Starting);

        drop(render);
        assert_eq!(
            transport.pump_engine_changes(),
            Some(CommandOutcome::Changed {
                from: TransportState::Starting,
                to: TransportState::Stopped
            })
        );
        assert_eq!(transport.pump_engine_changes(), None);
        assert_eq!(transport.stop(), CommandOutcome::Ignored(IgnoreReason::AlreadyInState));
        assert!(!transport.controls().play_enabled);
    }

    #[test]
    fn test_mismatched_rate_source_is_dropped() {
        let (mut transport, mut render) = setup();
        transport.stage(source_at(44100, 44100));

        assert!(transport.play().is_changed());
        assert!(!transport.has_pending());
        assert!(!transport.controls().play_enabled);

        // Nothing current: the engine reports it cannot start
        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(render.position(), None);
        assert_eq!(transport.play(), CommandOutcome::Ignored(IgnoreReason::NoSource));
    }

    #[test]
    fn test_mismatched_rate_source_keeps_current() {
        let (mut transport, mut render) = setup();
        transport.stage(source(1.0));
        transport.play();
        cycle(&mut transport, &mut render);
        transport.stop();
        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Stopped);

        transport.stage(source_at(88200, 44100));
        assert!(transport.play().is_changed());
        assert!(transport.controls().play_enabled);

        cycle(&mut transport, &mut render);
        assert_eq!(transport.state(), TransportState::Playing);
        assert_eq!(transport.atomics().length(), 48000);
        assert_eq!(render.position(), Some(BLOCK));
    }
}
