//! Lock-free transport commands from the UI to the render thread
//!
//! Commands travel over an `rtrb` ring allocated once at startup. Pushing
//! and popping never block or allocate, and the render loop drains the ring
//! at the start of every block, so no command lands mid-block.

use basedrop::Owned;

use crate::source::PlaybackSource;

/// Commands applied by the render loop
pub enum TransportCommand {
    /// Make this source current, replacing (and releasing) the previous one
    ///
    /// The source is held in a `basedrop::Owned` so the ring slots stay
    /// pointer-sized and the replaced source is freed by the collector
    /// thread rather than inside the callback.
    Activate(Owned<PlaybackSource>),
    /// Begin producing sound from the current source
    Start,
    /// Stop producing sound, keeping the read position
    Halt,
    /// Move the current source's read position back to frame 0
    Rewind,
}

impl std::fmt::Debug for TransportCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportCommand::Activate(source) => f.debug_tuple("Activate").field(&**source).finish(),
            TransportCommand::Start => f.write_str("Start"),
            TransportCommand::Halt => f.write_str("Halt"),
            TransportCommand::Rewind => f.write_str("Rewind"),
        }
    }
}

/// Capacity of the command ring
///
/// A full transport cycle sends at most four commands; the rest is slack
/// for the UI outrunning a stalled audio device.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// UI side of the command ring
pub struct CommandSender {
    producer: rtrb::Producer<TransportCommand>,
}

impl CommandSender {
    /// Queue a command (non-blocking)
    ///
    /// Hands the command back if the ring is full.
    pub fn send(&mut self, command: TransportCommand) -> Result<(), TransportCommand> {
        self.producer
            .push(command)
            .map_err(|err| match err {
                rtrb::PushError::Full(cmd) => cmd,
            })
    }

    /// Whether a render loop still owns the other end of the ring
    pub fn is_connected(&self) -> bool {
        !self.producer.is_abandoned()
    }
}

/// Create the command ring
///
/// The sender is owned by the transport, the consumer by the render loop.
pub fn command_channel() -> (CommandSender, rtrb::Consumer<TransportCommand>) {
    let (producer, consumer) = rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY);
    (CommandSender { producer }, consumer)
}
