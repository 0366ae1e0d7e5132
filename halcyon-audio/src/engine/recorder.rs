//! WAV export of the captured output mix.

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Bookkeeping for an in-progress session recording.
pub struct ActiveRecording {
    pub path: PathBuf,
    pub started_at: Instant,
}

impl ActiveRecording {
    pub fn new(path: PathBuf, started_at: Instant) -> Self {
        Self { path, started_at }
    }

    pub fn elapsed_secs(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.started_at).as_secs_f32()
    }
}

/// Write the captured mono mix as a 32-bit float WAV.
pub fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) -> Result<(), String> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| format!("Failed to create WAV writer: {}", e))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| format!("Failed to write sample: {}", e))?;
    }

    writer
        .finalize()
        .map_err(|e| format!("Failed to finalize WAV: {}", e))?;

    Ok(())
}
