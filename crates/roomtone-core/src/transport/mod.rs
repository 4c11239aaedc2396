//! Playback transport
//!
//! [`TransportState::on_event`] decides which transitions are legal;
//! [`Transport::change_state`] runs the entry action of the new state and
//! is the only place the render thread is told to do anything.

mod state;
mod transport;

pub use state::{CommandOutcome, IgnoreReason, TransportEvent, TransportState};
pub use transport::{Transport, TransportControls};
