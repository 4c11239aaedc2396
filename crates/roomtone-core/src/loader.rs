//! Background source loader
//!
//! Decoding and resampling a whole file takes far longer than a UI frame, so
//! it runs on a dedicated worker thread. Requests are served one at a time
//! in order, and only the most recent request counts: a request that is
//! superseded before it starts is skipped, and a result that finishes after
//! a newer request was made is dropped by [`SourceLoader::try_recv`].

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use thiserror::Error;

use crate::source::{self, DecodeResult, PlaybackSource};

/// Loader thread errors
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to spawn loader thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("Loader thread disconnected")]
    Disconnected,
}

pub type LoaderResult<T> = Result<T, LoaderError>;

struct LoadRequest {
    generation: u64,
    path: PathBuf,
}

/// A finished load
#[derive(Debug)]
pub struct LoadOutcome {
    /// Request number returned by [`SourceLoader::request`]
    pub generation: u64,
    pub path: PathBuf,
    pub result: DecodeResult<PlaybackSource>,
}

/// Handle to the loader thread
pub struct SourceLoader {
    tx: Sender<LoadRequest>,
    rx: Receiver<LoadOutcome>,
    latest: Arc<AtomicU64>,
    _handle: JoinHandle<()>,
}

impl SourceLoader {
    /// Spawn the worker; sources are resampled to `target_sample_rate`
    pub fn spawn(target_sample_rate: u32) -> LoaderResult<Self> {
        let (request_tx, request_rx) = channel::unbounded::<LoadRequest>();
        let (result_tx, result_rx) = channel::unbounded::<LoadOutcome>();

        let latest = Arc::new(AtomicU64::new(0));

        let thread_latest = Arc::clone(&latest);
        let handle = thread::Builder::new()
            .name("source-loader".to_string())
            .spawn(move || loader_thread(request_rx, result_tx, thread_latest, target_sample_rate))
            .map_err(LoaderError::Spawn)?;

        log::info!("Source loader spawned with target sample rate: {} Hz", target_sample_rate);

        Ok(Self {
            tx: request_tx,
            rx: result_rx,
            latest,
            _handle: handle,
        })
    }

    /// Queue a file for loading, superseding any earlier request
    ///
    /// Returns the request's generation number.
    pub fn request(&self, path: PathBuf) -> LoaderResult<u64> {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        self.tx
            .send(LoadRequest { generation, path })
            .map_err(|_| LoaderError::Disconnected)?;
        Ok(generation)
    }

    /// Take the result of the latest request if it has finished
    ///
    /// Results of superseded requests are discarded silently.
    pub fn try_recv(&self) -> LoaderResult<Option<LoadOutcome>> {
        loop {
            match self.rx.try_recv() {
                Ok(outcome) if outcome.generation == self.latest.load(Ordering::Acquire) => {
                    return Ok(Some(outcome));
                }
                Ok(stale) => {
                    log::debug!("Discarding superseded load of {:?}", stale.path);
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(LoaderError::Disconnected),
            }
        }
    }
}

fn loader_thread(
    rx: Receiver<LoadRequest>,
    tx: Sender<LoadOutcome>,
    latest: Arc<AtomicU64>,
    target_sample_rate: u32,
) {
    log::debug!("Source loader thread started");

    while let Ok(mut request) = rx.recv() {
        // Skip straight to the newest queued request
        while let Ok(newer) = rx.try_recv() {
            request = newer;
        }
        if request.generation != latest.load(Ordering::Acquire) {
            continue;
        }

        let result = source::load(&request.path, target_sample_rate);
        if let Err(ref e) = result {
            log::warn!("Failed to load {:?}: {}", request.path, e);
        }

        let outcome = LoadOutcome {
            generation: request.generation,
            path: request.path,
            result,
        };
        if tx.send(outcome).is_err() {
            break;
        }
    }

    log::debug!("Source loader thread exiting");
}
