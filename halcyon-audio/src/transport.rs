//! Playback phase machine: stopped, scale intro, steady random notes,
//! and the reconfigure pause between them.
//!
//! The transport owns the task queue. Every phase change cancels all
//! pending work before scheduling the next phase, so no two note
//! streams can overlap.

use std::time::{Duration, Instant};

use halcyon_types::Note;

use crate::scheduler::{Task, TaskQueue};

/// Gap between ascending intro scale notes.
pub const INTRO_STEP_MS: u64 = 300;
/// Delay from the last scale note to the cadence chord.
pub const INTRO_CHORD_GAP_MS: u64 = 200;
/// Stagger between arpeggiated chord tones.
pub const CHORD_STAGGER_MS: u64 = 30;
/// Pause between the end of the cadence chord and the first random note.
pub const RESUME_GAP_MS: u64 = 500;
/// Silence inserted before replaying the intro after a root or mode change.
pub const RECONFIGURE_PAUSE_MS: u64 = 1000;

/// Duration of one intro scale note.
pub const INTRO_NOTE_SECS: f32 = 0.5;
/// Duration of each cadence chord tone.
pub const INTRO_CHORD_TONE_SECS: f32 = 2.0;
/// Duration of a random primary note.
pub const NOTE_SECS: f32 = 4.0;
/// Duration of a staggered secondary chord tone.
pub const CHORD_TONE_SECS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    /// Playing the ascending scale and cadence chord.
    PlayingIntro,
    /// Steady weighted-random pulse.
    PlayingRandom,
    /// Silent pause before the intro replays with new pitch material.
    Reconfiguring,
}

pub struct Transport {
    state: TransportState,
    queue: TaskQueue,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            state: TransportState::Stopped,
            queue: TaskQueue::new(),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// True in any phase that produces or will produce sound.
    pub fn is_playing(&self) -> bool {
        self.state != TransportState::Stopped
    }

    /// Enter the intro phase: `step_count` ascending scale notes, then
    /// `chord_len` staggered cadence tones, then the handover to the
    /// random pulse. With no playable intro notes the handover alone
    /// is scheduled.
    pub fn begin_intro(&mut self, step_count: usize, chord_len: usize, now: Instant) {
        self.queue.cancel_all();
        self.state = TransportState::PlayingIntro;

        if step_count == 0 && chord_len == 0 {
            // Nothing to announce, but the handover gap still applies.
            self.queue
                .schedule(now + Duration::from_millis(RESUME_GAP_MS), Task::ResumeRandom);
            return;
        }

        for i in 0..step_count {
            let due = now + Duration::from_millis(INTRO_STEP_MS * i as u64);
            self.queue.schedule(due, Task::IntroStep(i));
        }

        let chord_at =
            now + Duration::from_millis(INTRO_STEP_MS * step_count as u64 + INTRO_CHORD_GAP_MS);
        for k in 0..chord_len {
            let due = chord_at + Duration::from_millis(CHORD_STAGGER_MS * k as u64);
            self.queue.schedule(due, Task::IntroChordTone(k));
        }

        // Random playback waits for the cadence tones to finish, then
        // the handover gap.
        let resume_at = chord_at
            + Duration::from_secs_f32(INTRO_CHORD_TONE_SECS)
            + Duration::from_millis(RESUME_GAP_MS);
        self.queue.schedule(resume_at, Task::ResumeRandom);
    }

    /// Leave the intro for the steady pulse, firing the first beat on
    /// the next tick.
    pub fn resume_random(&mut self, now: Instant) {
        self.state = TransportState::PlayingRandom;
        self.queue.arm_pulse(now);
    }

    /// Cancel everything and go quiet. Idempotent.
    pub fn stop(&mut self) {
        self.queue.cancel_all();
        self.state = TransportState::Stopped;
    }

    /// Pitch material changed mid-playback: cancel all scheduled notes,
    /// hold silence, then replay the intro.
    pub fn reconfigure(&mut self, now: Instant) {
        self.queue.cancel_all();
        self.state = TransportState::Reconfiguring;
        self.queue
            .schedule(now + Duration::from_millis(RECONFIGURE_PAUSE_MS), Task::BeginIntro);
    }

    /// Re-arm the beat after it fires, spaced by the current interval.
    pub fn on_pulse_fired(&mut self, interval: Duration, fired_at: Instant) {
        self.queue.arm_pulse(fired_at + interval);
    }

    /// A tempo change re-times the pending beat without waiting out
    /// the old interval.
    pub fn retime_pulse(&mut self, interval: Duration, now: Instant) {
        if self.queue.has_pulse() {
            self.queue.arm_pulse(now + interval);
        }
    }

    /// Queue the staggered secondary tones for a chord.
    pub fn schedule_chord(&mut self, notes: &[Note], duration_secs: f32, start: Instant) {
        for (k, note) in notes.iter().enumerate() {
            let due = start + Duration::from_millis(CHORD_STAGGER_MS * k as u64);
            self.queue.schedule(
                due,
                Task::ChordTone {
                    note: *note,
                    duration_secs,
                },
            );
        }
    }

    pub fn pop_due(&mut self, now: Instant) -> Vec<Task> {
        self.queue.pop_due(now)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.queue.next_due()
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub fn pulse_count(&self) -> usize {
        self.queue.pulse_count()
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}
