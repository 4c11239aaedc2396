//! Roomtone Core - transport, render loop and reverb for a single-file player
//!
//! The crate is split along the two execution contexts of the player:
//!
//! - **UI context**: [`controller::TransportController`] owns the
//!   [`transport::Transport`] state machine, the background
//!   [`loader::SourceLoader`] and the shared reverb parameters.
//! - **Audio context**: [`render::RenderLoop`] is owned by the audio backend
//!   and pulls frames from the current [`source::PlaybackSource`], then runs
//!   the [`reverb::Reverb`] in place.
//!
//! The two sides only talk through a lock-free command ring, relaxed atomics
//! and a change broadcaster.

pub mod audio;
pub mod config;
pub mod controller;
pub mod loader;
pub mod notify;
pub mod render;
pub mod reverb;
pub mod source;
pub mod transport;
pub mod types;

pub use types::*;
