//! Deferred deallocation for decoded audio
//!
//! Decoded assets are wrapped in `basedrop::Shared`. Dropping the last
//! reference on the render thread only enqueues the pointer; the memory is
//! freed later by the collector thread started here, so replacing the
//! current source never frees megabytes of samples inside the callback.

use basedrop::{Collector, Handle};
use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

static GC_HANDLE: OnceLock<Handle> = OnceLock::new();

/// How often the collector thread frees queued drops
const COLLECT_INTERVAL: Duration = Duration::from_millis(100);

fn init_gc() -> Handle {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("audio-gc".to_string())
        .spawn(move || {
            // Collector is !Sync, so it lives and dies on this thread
            let mut collector = Collector::new();
            if tx.send(collector.handle()).is_err() {
                return;
            }
            log::debug!("Audio collector thread started");

            loop {
                collector.collect();
                thread::sleep(COLLECT_INTERVAL);
            }
        })
        .expect("Failed to spawn audio collector thread");

    rx.recv().expect("Audio collector thread exited before sending its handle")
}

/// Handle for allocating `Shared<T>` values collected off the audio thread
pub fn gc_handle() -> Handle {
    GC_HANDLE.get_or_init(init_gc).clone()
}
