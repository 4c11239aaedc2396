//! Transport states and the transition table

use std::fmt;

/// Playback transport state
///
/// `Starting`, `Pausing` and `Stopping` are transient: the transport has
/// asked the render thread to do something and is waiting for the engine
/// to report back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Starting,
    Playing,
    Pausing,
    Paused,
    Stopping,
}

impl TransportState {
    /// Waiting on the engine
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            TransportState::Starting | TransportState::Pausing | TransportState::Stopping
        )
    }

    /// Compute the state an event leads to
    ///
    /// `source_ready` is whether there is anything to play: a staged source
    /// or a current one. Returns why the event is ignored when it does not
    /// lead anywhere.
    pub fn on_event(self, event: TransportEvent, source_ready: bool) -> Result<TransportState, IgnoreReason> {
        use TransportEvent::*;
        use TransportState::*;

        let next = match (self, event) {
            (Stopped | Paused, PlayPressed) if !source_ready => return Err(IgnoreReason::NoSource),
            (Stopped | Paused, PlayPressed) => Starting,
            (Playing, PlayPressed) => Pausing,
            (Starting | Pausing | Stopping, PlayPressed) => return Err(IgnoreReason::Transient),

            (Playing | Stopping, StopPressed) => Stopping,
            (Paused, StopPressed) => Stopped,
            (Stopped, StopPressed) => Stopped,
            (Starting | Pausing, StopPressed) => return Err(IgnoreReason::Transient),

            (_, EngineStarted) => Playing,

            (Pausing, EngineStopped) => Paused,
            (Stopping | Playing | Starting, EngineStopped) => Stopped,
            (Stopped | Paused, EngineStopped) => return Err(IgnoreReason::AlreadyInState),
        };

        if next == self {
            return Err(IgnoreReason::AlreadyInState);
        }
        Ok(next)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportState::Stopped => "Stopped",
            TransportState::Starting => "Starting",
            TransportState::Playing => "Playing",
            TransportState::Pausing => "Pausing",
            TransportState::Paused => "Paused",
            TransportState::Stopping => "Stopping",
        };
        f.write_str(name)
    }
}

/// Inputs to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// Play button (doubles as Pause while playing)
    PlayPressed,
    /// Stop button (reads "Return to 0" while paused)
    StopPressed,
    /// Engine reports it is producing sound
    EngineStarted,
    /// Engine reports it is not producing sound
    EngineStopped,
}

/// Why an event left the state unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Play with nothing loaded
    NoSource,
    /// Play with no render loop attached
    NoEngine,
    /// A request is already in flight
    Transient,
    /// The event leads to the current state
    AlreadyInState,
}

/// Result of feeding one event to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Changed {
        from: TransportState,
        to: TransportState,
    },
    Ignored(IgnoreReason),
}

impl CommandOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, CommandOutcome::Changed { .. })
    }
}
