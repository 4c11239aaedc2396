//! Real-time render path
//!
//! - [`RenderLoop`]: the audio callback body, owned by the backend
//! - [`TransportCommand`] ring: UI → audio requests and source handoff
//! - [`TransportAtomics`]: audio → UI state, lock-free
//! - [`gc`]: deferred deallocation for replaced sources

mod atomics;
mod command;
pub mod gc;
mod render_loop;

pub use atomics::TransportAtomics;
pub use command::{command_channel, CommandSender, TransportCommand, COMMAND_QUEUE_CAPACITY};
pub use render_loop::{AudioCallback, RenderLoop};

use std::sync::Arc;

use crate::notify::{ChangeBroadcaster, ChangeListener};
use crate::reverb::SharedReverbParameters;

/// UI-side endpoints of the render path
///
/// Everything the transport needs to drive a [`RenderLoop`] living on
/// another thread.
pub struct EngineLink {
    pub commands: CommandSender,
    pub atomics: Arc<TransportAtomics>,
    pub changes: ChangeListener,
}

/// Build a render loop and the link that controls it
pub fn render_channel(params: Arc<SharedReverbParameters>) -> (RenderLoop, EngineLink) {
    let (commands, consumer) = command_channel();
    let atomics = Arc::new(TransportAtomics::new());
    let broadcaster = ChangeBroadcaster::new();
    let changes = broadcaster.subscribe();

    let render = RenderLoop::new(consumer, Arc::clone(&atomics), broadcaster, params);
    let link = EngineLink {
        commands,
        atomics,
        changes,
    };
    (render, link)
}
