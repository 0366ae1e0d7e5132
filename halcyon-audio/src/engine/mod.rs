//! Synthesis engine: cpal output stream, sine voices, WAV recording.
//!
//! When no output device exists the engine runs silent: voice and
//! recording bookkeeping still works, no stream is built. Everything
//! above this module behaves identically either way.

mod output;
mod recorder;
mod voices;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use recorder::ActiveRecording;
pub use voices::{MixerCore, Voice};

/// Gain applied to a primary (melody) tone.
pub const PRIMARY_LEVEL: f32 = 0.3;
/// Gain applied to each secondary (chord) tone.
pub const SECONDARY_LEVEL: f32 = 0.05;

/// Faster playback thins out individual tones so density does not read
/// as loudness. Unity at tempo 1.0, floored at 0.3.
pub fn tempo_damping(tempo: f32) -> f32 {
    (1.0 - (tempo - 1.0) * 0.2).max(0.3)
}

pub struct AudioEngine {
    core: Arc<Mutex<MixerCore>>,
    stream: Option<cpal::Stream>,
    sample_rate: u32,
    recording: Option<ActiveRecording>,
}

impl AudioEngine {
    /// Open the default output device. Falls back to a silent engine
    /// when no device is available or the stream cannot start.
    pub fn new(master_level: f32) -> Self {
        let core = Arc::new(Mutex::new(MixerCore::new(master_level)));
        match output::build_output(Arc::clone(&core)) {
            Ok((stream, sample_rate)) => {
                log::info!(target: "audio", "Output stream started at {} Hz", sample_rate);
                Self {
                    core,
                    stream: Some(stream),
                    sample_rate,
                    recording: None,
                }
            }
            Err(e) => {
                log::warn!(target: "audio", "Running silent: {}", e);
                Self {
                    core,
                    stream: None,
                    sample_rate: 44100,
                    recording: None,
                }
            }
        }
    }

    /// A silent engine regardless of available hardware.
    pub fn silent(master_level: f32) -> Self {
        Self {
            core: Arc::new(Mutex::new(MixerCore::new(master_level))),
            stream: None,
            sample_rate: 44100,
            recording: None,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.stream.is_none()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Spawn one enveloped sine tone. `peak` is the fully-combined
    /// gain (degree volume, band volume, tone level, tempo damping).
    pub fn play_tone(
        &self,
        frequency: f32,
        peak: f32,
        delay_secs: f32,
        attack_secs: f32,
        release_secs: f32,
        duration_secs: f32,
    ) {
        let voice = Voice::new(
            frequency,
            peak,
            delay_secs,
            attack_secs,
            release_secs,
            duration_secs,
            self.sample_rate,
        );
        if let Ok(mut core) = self.core.lock() {
            core.spawn(voice);
        }
    }

    /// Drop every sounding voice immediately. Idempotent.
    pub fn stop_all(&self) {
        if let Ok(mut core) = self.core.lock() {
            core.clear();
        }
    }

    pub fn voice_count(&self) -> usize {
        self.core.lock().map(|c| c.voice_count()).unwrap_or(0)
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn recording_elapsed_secs(&self, now: Instant) -> Option<f32> {
        self.recording.as_ref().map(|r| r.elapsed_secs(now))
    }

    /// Begin capturing the output mix to be written at `path`.
    pub fn start_recording(&mut self, path: PathBuf, now: Instant) -> Result<(), String> {
        if self.stream.is_none() {
            return Err("No output stream to record".to_string());
        }
        if self.recording.is_some() {
            return Err("Already recording".to_string());
        }
        if let Ok(mut core) = self.core.lock() {
            core.start_capture();
        }
        log::info!(target: "audio", "Recording to {}", path.display());
        self.recording = Some(ActiveRecording::new(path, now));
        Ok(())
    }

    /// Finish the capture and write the WAV file.
    pub fn stop_recording(&mut self) -> Result<PathBuf, String> {
        let recording = self
            .recording
            .take()
            .ok_or_else(|| "Not recording".to_string())?;
        let samples = self
            .core
            .lock()
            .ok()
            .and_then(|mut c| c.take_capture())
            .unwrap_or_default();
        recorder::write_wav(&recording.path, self.sample_rate, &samples)?;
        log::info!(
            target: "audio",
            "Wrote {} samples to {}",
            samples.len(),
            recording.path.display()
        );
        Ok(recording.path)
    }
}
