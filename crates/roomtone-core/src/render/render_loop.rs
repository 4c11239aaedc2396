//! Real-time render loop
//!
//! [`RenderLoop`] is the body of the audio callback. Each block it:
//!
//! 1. drains pending [`TransportCommand`]s,
//! 2. fills the block from the current source (or silence when halted),
//! 3. runs the reverb in place whenever a source is current, so the tail
//!    keeps ringing after a halt.
//!
//! Nothing in [`AudioCallback::render`] blocks, allocates or logs.

use basedrop::Owned;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::atomics::TransportAtomics;
use super::command::TransportCommand;
use crate::notify::{ChangeBroadcaster, EngineChange, StopReason};
use crate::reverb::{Reverb, SharedReverbParameters};
use crate::source::PlaybackSource;
use crate::types::Sample;

/// Contract between an audio backend and the code that fills its buffers
///
/// The backend calls `prepare` once before the first block, `render` for
/// every block, and `release` when the stream is torn down.
pub trait AudioCallback: Send {
    /// Called before streaming starts, off the real-time path
    fn prepare(&mut self, block_size: usize, sample_rate: u32);

    /// Fill one block of planar stereo output
    fn render(&mut self, left: &mut [Sample], right: &mut [Sample]);

    /// Called once when the stream stops
    fn release(&mut self);
}

/// Audio-thread side of the transport
pub struct RenderLoop {
    current: Option<Owned<PlaybackSource>>,
    playing: bool,
    reverb: Reverb,
    params: Arc<SharedReverbParameters>,
    commands: rtrb::Consumer<TransportCommand>,
    atomics: Arc<TransportAtomics>,
    changes: ChangeBroadcaster,
}

impl RenderLoop {
    pub fn new(
        commands: rtrb::Consumer<TransportCommand>,
        atomics: Arc<TransportAtomics>,
        changes: ChangeBroadcaster,
        params: Arc<SharedReverbParameters>,
    ) -> Self {
        Self {
            current: None,
            playing: false,
            reverb: Reverb::new(atomics.sample_rate()),
            params,
            commands,
            atomics,
            changes,
        }
    }

    /// Whether the engine is producing sound
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Read position of the current source, if any
    pub fn position(&self) -> Option<usize> {
        self.current.as_ref().map(|s| s.next_read_position())
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        self.atomics.playing.store(playing, Ordering::Relaxed);
    }

    fn process_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                TransportCommand::Activate(source) => {
                    // A new current source always starts halted
                    self.set_playing(false);
                    self.atomics
                        .position
                        .store(source.next_read_position() as u64, Ordering::Relaxed);
                    self.atomics
                        .length
                        .store(source.total_length() as u64, Ordering::Relaxed);
                    self.atomics.has_source.store(true, Ordering::Relaxed);
                    self.current = Some(source);
                }
                TransportCommand::Start => {
                    if self.current.is_some() {
                        self.set_playing(true);
                        self.changes.notify(EngineChange::Started);
                    } else {
                        self.changes.notify(EngineChange::Stopped(StopReason::NoSource));
                    }
                }
                TransportCommand::Halt => {
                    self.set_playing(false);
                    self.changes.notify(EngineChange::Stopped(StopReason::Halted));
                }
                TransportCommand::Rewind => {
                    if let Some(source) = self.current.as_mut() {
                        source.set_next_read_position(0);
                    }
                    self.atomics.position.store(0, Ordering::Relaxed);
                }
            }
        }
    }
}

impl AudioCallback for RenderLoop {
    fn prepare(&mut self, block_size: usize, sample_rate: u32) {
        self.atomics.sample_rate.store(sample_rate, Ordering::Relaxed);
        self.atomics.block_size.store(block_size as u32, Ordering::Relaxed);
        self.reverb.set_sample_rate(sample_rate);
    }

    fn render(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        self.process_commands();

        let frames = left.len().min(right.len());
        let left = &mut left[..frames];
        let right = &mut right[..frames];

        let Some(source) = self.current.as_mut() else {
            left.fill(0.0);
            right.fill(0.0);
            return;
        };

        let mut reached_end = false;
        if self.playing {
            let read = source.read(left, right);
            self.atomics
                .position
                .store(source.next_read_position() as u64, Ordering::Relaxed);
            if read < frames {
                self.atomics.underruns.fetch_add(1, Ordering::Relaxed);
            }
            reached_end = source.is_exhausted();
        } else {
            left.fill(0.0);
            right.fill(0.0);
        }

        if reached_end {
            self.set_playing(false);
            self.changes.notify(EngineChange::Stopped(StopReason::EndOfStream));
        }

        let params = self.params.snapshot();
        self.reverb.process_stereo(left, right, &params);
    }

    fn release(&mut self) {
        if self.playing {
            self.set_playing(false);
            self.changes.notify(EngineChange::Stopped(StopReason::Released));
        }
    }
}
