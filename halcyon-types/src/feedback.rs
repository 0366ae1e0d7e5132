//! Feedback events from the engine thread to the embedding shell.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::mode::ColorTag;
use crate::note::Note;

/// A transient visual marker for one played note, already projected to
/// screen coordinates. The stage removes it when its animation ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualEvent {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub opacity: f32,
    pub color: ColorTag,
    pub ripple: bool,
}

/// Messages from the engine thread to the main thread.
#[derive(Debug, Clone)]
pub enum EngineFeedback {
    NotePlayed {
        note: Note,
        secondary: bool,
    },
    VisualMarker(VisualEvent),
    PlayingChanged(bool),
    TempoUpdate(f32),
    /// The scale intro finished and random playback took over.
    IntroFinished,
    RecordingState {
        is_recording: bool,
        elapsed_secs: u64,
    },
    RecordingStopped(PathBuf),
}
