//! Sine voices and the mixer they render through.
//!
//! Voices are pure sample generators. All timing is counted in samples
//! from the moment the voice is spawned, so the output callback never
//! consults the wall clock.

/// Gain floor the decay ramp lands on before the release tail.
const DECAY_FLOOR: f32 = 0.001;

/// One sine tone with a delay / attack / decay / release envelope.
pub struct Voice {
    phase: f32,
    phase_inc: f32,
    peak: f32,
    position: u64,
    delay_end: u64,
    attack_end: u64,
    decay_end: u64,
    release_end: u64,
}

impl Voice {
    pub fn new(
        frequency: f32,
        peak: f32,
        delay_secs: f32,
        attack_secs: f32,
        release_secs: f32,
        duration_secs: f32,
        sample_rate: u32,
    ) -> Self {
        let sr = sample_rate as f32;
        let delay_end = (delay_secs.max(0.0) * sr) as u64;
        let attack_end = delay_end + (attack_secs.max(0.0) * sr) as u64;
        let release_end = delay_end + (duration_secs.max(0.0) * sr) as u64;
        // Decay runs from the attack peak down to the floor, leaving
        // the release tail inside the total duration.
        let decay_end = release_end
            .saturating_sub((release_secs.max(0.0) * sr) as u64)
            .max(attack_end);
        Self {
            phase: 0.0,
            phase_inc: frequency / sr,
            peak,
            position: 0,
            delay_end,
            attack_end,
            decay_end,
            release_end: release_end.max(decay_end),
        }
    }

    pub fn is_done(&self) -> bool {
        self.position >= self.release_end
    }

    /// Render one mono sample and advance.
    pub fn next_sample(&mut self) -> f32 {
        let gain = self.envelope();
        let sample = if gain > 0.0 {
            gain * (self.phase * std::f32::consts::TAU).sin()
        } else {
            0.0
        };
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        self.position += 1;
        sample
    }

    fn envelope(&self) -> f32 {
        let pos = self.position;
        if pos < self.delay_end {
            return 0.0;
        }
        if pos < self.attack_end {
            let span = (self.attack_end - self.delay_end) as f32;
            return self.peak * (pos - self.delay_end) as f32 / span;
        }
        if pos < self.decay_end {
            let span = (self.decay_end - self.attack_end) as f32;
            let t = (pos - self.attack_end) as f32 / span;
            return self.peak + (DECAY_FLOOR * self.peak - self.peak) * t;
        }
        if pos < self.release_end {
            let span = (self.release_end - self.decay_end) as f32;
            let t = (pos - self.decay_end) as f32 / span;
            return DECAY_FLOOR * self.peak * (1.0 - t);
        }
        0.0
    }
}

/// Shared mixer state rendered by the output callback.
///
/// Locked briefly from the audio thread (to spawn and clear voices)
/// and from the callback (to render). Neither side allocates while
/// holding the lock on the render path beyond voice removal.
pub struct MixerCore {
    voices: Vec<Voice>,
    master_level: f32,
    capture: Option<Vec<f32>>,
}

impl MixerCore {
    pub fn new(master_level: f32) -> Self {
        Self {
            voices: Vec::new(),
            master_level: master_level.clamp(0.0, 1.0),
            capture: None,
        }
    }

    pub fn spawn(&mut self, voice: Voice) {
        self.voices.push(voice);
    }

    pub fn clear(&mut self) {
        self.voices.clear();
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn start_capture(&mut self) {
        self.capture = Some(Vec::new());
    }

    pub fn take_capture(&mut self) -> Option<Vec<f32>> {
        self.capture.take()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Mix all voices into an interleaved output buffer. The mono mix
    /// is written to every channel of each frame.
    pub fn render(&mut self, data: &mut [f32], channels: usize) {
        for frame in data.chunks_mut(channels.max(1)) {
            let mut mix = 0.0f32;
            for voice in &mut self.voices {
                mix += voice.next_sample();
            }
            mix = (mix * self.master_level).clamp(-1.0, 1.0);
            if let Some(capture) = &mut self.capture {
                capture.push(mix);
            }
            for sample in frame {
                *sample = mix;
            }
        }
        self.voices.retain(|v| !v.is_done());
    }
}
