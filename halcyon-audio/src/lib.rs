//! # halcyon-audio
//!
//! The Halcyon generative ambient-music engine: a dedicated engine
//! thread that picks weighted-random notes, synthesizes them with
//! attack/release envelopes over a cpal output stream, and emits
//! synchronized visual marker events.
//!
//! The embedding shell talks to the engine exclusively through
//! [`PlayerHandle`]; everything else runs on the engine thread.

pub mod commands;
pub mod config;
pub mod engine;
mod engine_thread;
pub mod handle;
pub mod rng;
pub mod scheduler;
pub mod selector;
pub mod transport;
pub mod visuals;

pub use commands::EngineCmd;
pub use config::Config;
pub use engine::AudioEngine;
pub use handle::{PlayerHandle, PlayerReadState};
pub use transport::{Transport, TransportState};
pub use visuals::VisualStage;
