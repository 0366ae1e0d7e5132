//! # halcyon-types
//!
//! Shared type definitions for the Halcyon ambient-music engine.
//! This crate holds the pure data model (pitch classes, notes, mode
//! tables, octave bands, session state, and the feedback events the
//! engine emits) with no audio or threading dependencies.

pub mod feedback;
pub mod mode;
pub mod note;
pub mod octave;
pub mod session;

pub use feedback::{EngineFeedback, VisualEvent};
pub use mode::{ColorTag, CustomMode, DegreeTable, Mode, ScaleDegree};
pub use note::{Note, PitchClass};
pub use octave::{DeviceClass, OctaveBand};
pub use session::{SessionState, TEMPO_MAX, TEMPO_MIN};
