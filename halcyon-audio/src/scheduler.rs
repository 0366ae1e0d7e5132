//! Single cancelable-task queue owned by the transport.
//!
//! Every deferred action (pulse ticks, intro steps, chord staggers,
//! the post-reconfigure intro restart) lives in this one queue, so
//! "cancel all pending work" is one operation. This is what rules out
//! two overlapping note streams: a transition cancels the full set
//! before scheduling its replacement.

use std::time::Instant;

use halcyon_types::Note;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Task {
    /// Steady random-note beat; the transport re-arms it on each fire.
    Pulse,
    /// Index into the ascending active-degree intro sequence.
    IntroStep(usize),
    /// Index into the arpeggiated cadence chord closing the intro.
    IntroChordTone(usize),
    /// A staggered secondary chord tone following a random note.
    ChordTone { note: Note, duration_secs: f32 },
    /// Deferred intro start after a reconfiguration pause.
    BeginIntro,
    /// Hand over from the intro to the steady pulse.
    ResumeRandom,
}

#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Vec<(Instant, Task)>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn schedule(&mut self, due: Instant, task: Task) {
        self.tasks.push((due, task));
    }

    /// Arm the pulse, replacing any existing one. At most one `Pulse`
    /// entry ever exists.
    pub fn arm_pulse(&mut self, due: Instant) {
        self.tasks.retain(|(_, t)| !matches!(t, Task::Pulse));
        self.tasks.push((due, Task::Pulse));
    }

    pub fn has_pulse(&self) -> bool {
        self.tasks.iter().any(|(_, t)| matches!(t, Task::Pulse))
    }

    pub fn pulse_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|(_, t)| matches!(t, Task::Pulse))
            .count()
    }

    /// Remove and return every task due at `now`, in due order.
    pub fn pop_due(&mut self, now: Instant) -> Vec<Task> {
        let mut due: Vec<(Instant, Task)> = Vec::new();
        let mut remaining: Vec<(Instant, Task)> = Vec::new();
        for entry in self.tasks.drain(..) {
            if entry.0 <= now {
                due.push(entry);
            } else {
                remaining.push(entry);
            }
        }
        self.tasks = remaining;
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, t)| t).collect()
    }

    /// Cancel the complete pending set in one pass.
    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.iter().map(|(at, _)| *at).min()
    }
}
