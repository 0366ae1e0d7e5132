//! The engine thread: command handling and the scheduling tick.
//!
//! All session state, the transport, and the synthesis engine live
//! here. The main thread owns only a [`crate::PlayerHandle`].

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};

use halcyon_types::{EngineFeedback, Note, SessionState};

use crate::commands::EngineCmd;
use crate::engine::{tempo_damping, AudioEngine, PRIMARY_LEVEL, SECONDARY_LEVEL};
use crate::scheduler::Task;
use crate::selector;
use crate::transport::{
    Transport, TransportState, CHORD_STAGGER_MS, CHORD_TONE_SECS, INTRO_CHORD_TONE_SECS,
    INTRO_NOTE_SECS, NOTE_SECS,
};
use crate::visuals::VisualStage;

/// Drain at most this many queued commands per wakeup so a burst never
/// starves the tick.
const DRAIN_BUDGET: usize = 64;

pub(crate) struct EngineThread {
    /// Transport and pitch-material commands (time-critical).
    priority_rx: Receiver<EngineCmd>,
    /// Viewport, band, and recording traffic.
    normal_rx: Receiver<EngineCmd>,
    feedback_tx: Sender<EngineFeedback>,
    session: SessionState,
    transport: Transport,
    engine: AudioEngine,
    stage: VisualStage,
    rng_state: u64,
    last_tick: Instant,
    last_recording_secs: u64,
    last_recording_state: bool,
}

impl EngineThread {
    pub(crate) fn new(
        priority_rx: Receiver<EngineCmd>,
        normal_rx: Receiver<EngineCmd>,
        feedback_tx: Sender<EngineFeedback>,
        engine: AudioEngine,
        session: SessionState,
        stage: VisualStage,
    ) -> Self {
        Self {
            priority_rx,
            normal_rx,
            feedback_tx,
            session,
            transport: Transport::new(),
            engine,
            stage,
            rng_state: 12345,
            last_tick: Instant::now(),
            last_recording_secs: 0,
            last_recording_state: false,
        }
    }

    pub(crate) fn run(mut self) {
        const TICK_INTERVAL: Duration = Duration::from_millis(1);

        loop {
            let remaining = TICK_INTERVAL.saturating_sub(self.last_tick.elapsed());

            crossbeam_channel::select! {
                recv(self.priority_rx) -> result => {
                    match result {
                        Ok(cmd) => {
                            if self.handle_cmd(cmd, Instant::now()) {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
                recv(self.normal_rx) -> result => {
                    match result {
                        Ok(cmd) => {
                            if self.handle_cmd(cmd, Instant::now()) {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
                default(remaining) => {}
            }

            if self.drain(true) || self.drain(false) {
                break;
            }

            let now = Instant::now();
            if now.duration_since(self.last_tick) >= TICK_INTERVAL {
                self.last_tick = now;
                self.tick(now);
            }
        }

        log::info!(target: "engine", "Engine thread exiting");
    }

    /// Drain one channel up to the budget. Returns true on shutdown.
    fn drain(&mut self, priority: bool) -> bool {
        for _ in 0..DRAIN_BUDGET {
            let rx = if priority {
                &self.priority_rx
            } else {
                &self.normal_rx
            };
            match rx.try_recv() {
                Ok(cmd) => {
                    if self.handle_cmd(cmd, Instant::now()) {
                        return true;
                    }
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => return true,
            }
        }
        false
    }

    /// Returns true when the thread should exit.
    fn handle_cmd(&mut self, cmd: EngineCmd, now: Instant) -> bool {
        match cmd {
            EngineCmd::Start => {
                if !self.transport.is_playing() {
                    self.start_playing(now);
                }
            }
            EngineCmd::Stop => {
                if self.transport.is_playing() {
                    self.stop_playing();
                }
            }
            EngineCmd::TogglePlay => {
                if self.transport.is_playing() {
                    self.stop_playing();
                } else {
                    self.start_playing(now);
                }
            }
            EngineCmd::SetRoot(root) => {
                if root != self.session.root() {
                    log::info!(target: "engine", "Root changed to {}", root);
                    self.session.set_root(root);
                    self.on_pitch_material_changed(now);
                }
            }
            EngineCmd::SetMode(mode) => {
                if mode != *self.session.mode() {
                    log::info!(target: "engine", "Mode changed to {}", mode.name());
                    self.session.set_mode(mode);
                    self.on_pitch_material_changed(now);
                }
            }
            EngineCmd::SetDiatonicOnly(diatonic_only) => {
                // Takes effect on the next draw; playback keeps flowing.
                self.session.set_diatonic_only(diatonic_only);
            }
            EngineCmd::SetTempo(tempo) => {
                self.session.set_tempo(tempo);
                self.transport
                    .retime_pulse(self.session.pulse_interval(), now);
                self.send(EngineFeedback::TempoUpdate(self.session.tempo()));
            }
            EngineCmd::SetBandActive { octave, active } => {
                self.session.set_band_active(octave, active);
            }
            EngineCmd::ViewportResized { width, height } => {
                self.stage.resize(width, height);
            }
            EngineCmd::StartRecording { path, reply } => {
                let result = self.engine.start_recording(path, now);
                if result.is_ok() {
                    self.send(EngineFeedback::RecordingState {
                        is_recording: true,
                        elapsed_secs: 0,
                    });
                }
                let _ = reply.send(result);
            }
            EngineCmd::StopRecording { reply } => {
                let result = self.engine.stop_recording();
                if let Ok(path) = &result {
                    self.send(EngineFeedback::RecordingStopped(path.clone()));
                    self.send(EngineFeedback::RecordingState {
                        is_recording: false,
                        elapsed_secs: 0,
                    });
                }
                let _ = reply.send(result);
            }
            EngineCmd::Shutdown => return true,
        }
        false
    }

    /// The scheduling tick: recording progress, then every due task.
    fn tick(&mut self, now: Instant) {
        self.report_recording(now);
        for task in self.transport.pop_due(now) {
            self.run_task(task, now);
        }
    }

    fn run_task(&mut self, task: Task, now: Instant) {
        match task {
            Task::Pulse => {
                if self.transport.state() != TransportState::PlayingRandom {
                    return;
                }
                self.transport
                    .on_pulse_fired(self.session.pulse_interval(), now);
                if let Some(selection) = selector::select_note(&self.session, &mut self.rng_state) {
                    self.play_note(selection.primary, NOTE_SECS, false);
                    if !selection.chord.is_empty() {
                        self.transport.schedule_chord(
                            &selection.chord,
                            CHORD_TONE_SECS,
                            now + Duration::from_millis(CHORD_STAGGER_MS),
                        );
                    }
                }
            }
            Task::IntroStep(i) => {
                if self.transport.state() != TransportState::PlayingIntro {
                    return;
                }
                let steps = self.session.mode().active_steps();
                let octave = match self.session.middle_band() {
                    Some(band) => band.octave,
                    None => return,
                };
                if let Some(&step) = steps.get(i) {
                    let note = Note::new(self.session.root().transpose(step as i32), octave);
                    self.play_note(note, INTRO_NOTE_SECS, false);
                }
            }
            Task::IntroChordTone(k) => {
                if self.transport.state() != TransportState::PlayingIntro {
                    return;
                }
                // The cadence chord announces the tonal center and
                // sounds at full level, unlike random-draw chord tones.
                let chord = selector::cadence_chord(&self.session);
                if let Some(&note) = chord.get(k) {
                    self.play_note(note, INTRO_CHORD_TONE_SECS, false);
                }
            }
            Task::ChordTone {
                note,
                duration_secs,
            } => {
                self.play_note(note, duration_secs, true);
            }
            Task::BeginIntro => {
                if self.transport.state() == TransportState::Reconfiguring {
                    self.begin_intro(now);
                }
            }
            Task::ResumeRandom => {
                if self.transport.state() == TransportState::PlayingIntro {
                    self.transport.resume_random(now);
                    self.send(EngineFeedback::IntroFinished);
                }
            }
        }
    }

    fn start_playing(&mut self, now: Instant) {
        self.begin_intro(now);
        self.send(EngineFeedback::PlayingChanged(true));
    }

    fn stop_playing(&mut self) {
        self.transport.stop();
        self.engine.stop_all();
        self.send(EngineFeedback::PlayingChanged(false));
    }

    fn begin_intro(&mut self, now: Instant) {
        // Without an active middle band the scale has nowhere to play;
        // the transport goes straight to the handover.
        let playable = self.session.middle_band().map(|b| b.active).unwrap_or(false);
        let (steps, chord_len) = if playable {
            (
                self.session.mode().active_steps().len(),
                selector::cadence_chord(&self.session).len(),
            )
        } else {
            (0, 0)
        };
        self.transport.begin_intro(steps, chord_len, now);
    }

    /// Root or mode changed: silence everything, pause, replay the
    /// intro. The cancel and the reschedule share one queue, so the
    /// old note stream cannot survive into the new material.
    fn on_pitch_material_changed(&mut self, now: Instant) {
        if self.transport.is_playing() {
            self.engine.stop_all();
            self.transport.reconfigure(now);
        }
    }

    fn play_note(&mut self, note: Note, duration_secs: f32, secondary: bool) {
        if !self.transport.is_playing() {
            return;
        }
        let band = match self.session.band_for_octave(note.octave) {
            Some(band) if band.active => *band,
            _ => return,
        };

        let degree = &self.session.mode().degrees()[note.degree_from(self.session.root())];
        let level = if secondary {
            SECONDARY_LEVEL
        } else {
            PRIMARY_LEVEL
        };
        let peak = degree.volume * band.volume * level * tempo_damping(self.session.tempo());

        self.engine.play_tone(
            note.frequency(),
            peak,
            band.start_delay_secs,
            band.attack_secs,
            band.release_secs,
            duration_secs,
        );
        log::debug!(target: "engine", "Note {} peak {:.3} for {:.1}s", note, peak, duration_secs);

        self.send(EngineFeedback::NotePlayed { note, secondary });
        if let Some(event) = self.stage.project(note, &band, degree.color, &mut self.rng_state) {
            self.send(EngineFeedback::VisualMarker(event));
        }
    }

    /// Emit recording progress once per whole elapsed second.
    fn report_recording(&mut self, now: Instant) {
        let is_recording = self.engine.is_recording();
        let elapsed_secs = self
            .engine
            .recording_elapsed_secs(now)
            .map(|s| s as u64)
            .unwrap_or(0);
        if is_recording != self.last_recording_state
            || (is_recording && elapsed_secs != self.last_recording_secs)
        {
            self.last_recording_state = is_recording;
            self.last_recording_secs = elapsed_secs;
            self.send(EngineFeedback::RecordingState {
                is_recording,
                elapsed_secs,
            });
        }
    }

    fn send(&self, feedback: EngineFeedback) {
        // A gone main thread is normal during shutdown.
        let _ = self.feedback_tx.send(feedback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use halcyon_types::{Mode, PitchClass};

    use crate::transport::{
        INTRO_CHORD_GAP_MS, INTRO_STEP_MS, RECONFIGURE_PAUSE_MS, RESUME_GAP_MS,
    };

    struct Harness {
        thread: EngineThread,
        feedback_rx: mpsc::Receiver<EngineFeedback>,
        now: Instant,
        _priority_tx: crossbeam_channel::Sender<EngineCmd>,
        _normal_tx: crossbeam_channel::Sender<EngineCmd>,
    }

    impl Harness {
        fn new() -> Self {
            let (priority_tx, priority_rx) = crossbeam_channel::unbounded();
            let (normal_tx, normal_rx) = crossbeam_channel::unbounded();
            let (feedback_tx, feedback_rx) = mpsc::channel();
            let thread = EngineThread::new(
                priority_rx,
                normal_rx,
                feedback_tx,
                AudioEngine::silent(0.8),
                SessionState::default(),
                VisualStage::new(1024.0, 768.0),
            );
            Self {
                thread,
                feedback_rx,
                now: Instant::now(),
                _priority_tx: priority_tx,
                _normal_tx: normal_tx,
            }
        }

        fn cmd(&mut self, cmd: EngineCmd) {
            assert!(!self.thread.handle_cmd(cmd, self.now));
        }

        fn advance(&mut self, ms: u64) {
            // Step in 10ms increments so staggered tasks fire in order.
            let target = self.now + Duration::from_millis(ms);
            while self.now < target {
                self.now += Duration::from_millis(10);
                self.thread.tick(self.now);
            }
        }

        fn feedback(&self) -> Vec<EngineFeedback> {
            self.feedback_rx.try_iter().collect()
        }

        fn notes_played(&self) -> Vec<(Note, bool)> {
            self.feedback()
                .into_iter()
                .filter_map(|f| match f {
                    EngineFeedback::NotePlayed { note, secondary } => Some((note, secondary)),
                    _ => None,
                })
                .collect()
        }
    }

    fn intro_total_ms() -> u64 {
        INTRO_STEP_MS * 7
            + INTRO_CHORD_GAP_MS
            + (INTRO_CHORD_TONE_SECS * 1000.0) as u64
            + RESUME_GAP_MS
    }

    #[test]
    fn start_plays_the_ascending_scale_then_the_cadence_chord() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::Start);
        assert!(matches!(
            h.feedback().as_slice(),
            [EngineFeedback::PlayingChanged(true)]
        ));

        h.advance(INTRO_STEP_MS * 7);
        let notes = h.notes_played();
        let primaries: Vec<PitchClass> = notes
            .iter()
            .filter(|(_, secondary)| !secondary)
            .map(|(n, _)| n.pitch_class)
            .collect();
        assert_eq!(
            primaries,
            vec![
                PitchClass::C,
                PitchClass::D,
                PitchClass::E,
                PitchClass::F,
                PitchClass::G,
                PitchClass::A,
                PitchClass::B
            ]
        );
        assert!(notes.iter().all(|(n, _)| n.octave == 4));

        h.advance(INTRO_CHORD_GAP_MS + 100);
        let chord: Vec<PitchClass> = h
            .notes_played()
            .iter()
            .map(|(n, _)| n.pitch_class)
            .collect();
        assert_eq!(chord, vec![PitchClass::C, PitchClass::E, PitchClass::G]);
    }

    #[test]
    fn cadence_chord_tones_sound_at_full_level() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::Start);
        h.advance(intro_total_ms() - RESUME_GAP_MS);
        // Every intro note, cadence chord included, is a primary.
        let notes = h.notes_played();
        assert_eq!(notes.len(), 10);
        assert!(notes.iter().all(|(_, secondary)| !secondary));
    }

    #[test]
    fn intro_hands_over_to_the_random_pulse() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::Start);
        h.advance(intro_total_ms() + 10);
        assert!(h
            .feedback()
            .iter()
            .any(|f| matches!(f, EngineFeedback::IntroFinished)));
        assert_eq!(h.thread.transport.state(), TransportState::PlayingRandom);

        // The steady pulse keeps producing primaries.
        h.advance(3000);
        let primaries = h
            .notes_played()
            .iter()
            .filter(|(_, s)| !s)
            .count();
        assert!(primaries >= 4, "only {} primaries in 3s at tempo 2", primaries);
    }

    #[test]
    fn stop_silences_and_cancels_everything() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::Start);
        h.advance(500);
        h.cmd(EngineCmd::Stop);
        assert_eq!(h.thread.engine.voice_count(), 0);

        h.feedback();
        h.advance(5000);
        assert!(h.notes_played().is_empty());

        // A second stop is a no-op, not an error.
        h.cmd(EngineCmd::Stop);
        assert!(h.feedback().is_empty());
    }

    #[test]
    fn toggle_play_flips_the_transport() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::TogglePlay);
        assert!(h.thread.transport.is_playing());
        h.cmd(EngineCmd::TogglePlay);
        assert!(!h.thread.transport.is_playing());
    }

    #[test]
    fn root_change_while_playing_pauses_then_replays_the_intro() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::Start);
        h.advance(intro_total_ms() + 500);
        h.feedback();

        h.cmd(EngineCmd::SetRoot(PitchClass::G));
        assert_eq!(h.thread.engine.voice_count(), 0);
        assert_eq!(h.thread.transport.state(), TransportState::Reconfiguring);

        // Silence through the pause.
        h.advance(RECONFIGURE_PAUSE_MS - 100);
        assert!(h.notes_played().is_empty());

        // The intro replays in the new key.
        h.advance(200);
        let first = h.notes_played();
        assert_eq!(first[0].0.pitch_class, PitchClass::G);
        assert_eq!(h.thread.transport.state(), TransportState::PlayingIntro);
    }

    #[test]
    fn root_change_to_the_same_value_does_not_interrupt() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::Start);
        h.advance(intro_total_ms() + 10);
        h.cmd(EngineCmd::SetRoot(PitchClass::C));
        assert_eq!(h.thread.transport.state(), TransportState::PlayingRandom);
    }

    #[test]
    fn mode_change_while_stopped_does_not_start_playback() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::SetMode(Mode::Minor));
        assert!(!h.thread.transport.is_playing());
        h.advance(3000);
        assert!(h.notes_played().is_empty());
    }

    #[test]
    fn reconfigure_never_leaves_two_note_streams() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::Start);
        h.advance(intro_total_ms() + 1000);

        // Back-to-back material changes collapse into one pending intro.
        h.cmd(EngineCmd::SetRoot(PitchClass::D));
        h.cmd(EngineCmd::SetMode(Mode::Minor));
        h.advance(RECONFIGURE_PAUSE_MS + intro_total_ms() + 100);
        assert_eq!(h.thread.transport.state(), TransportState::PlayingRandom);
        assert_eq!(h.thread.transport.pulse_count(), 1);
    }

    #[test]
    fn tempo_change_retimes_the_pulse_and_reports() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::Start);
        h.advance(intro_total_ms() + 10);
        h.feedback();

        h.cmd(EngineCmd::SetTempo(9.0));
        let feedback = h.feedback();
        assert!(feedback
            .iter()
            .any(|f| matches!(f, EngineFeedback::TempoUpdate(t) if *t == 3.0)));
        assert_eq!(h.thread.transport.pulse_count(), 1);
    }

    #[test]
    fn notes_on_a_deactivated_band_are_suppressed() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::Start);
        h.advance(10);
        h.feedback();

        // Deactivate the middle band mid-intro: remaining steps go silent.
        h.cmd(EngineCmd::SetBandActive {
            octave: 4,
            active: false,
        });
        h.advance(intro_total_ms());
        assert!(h.notes_played().iter().all(|(n, _)| n.octave != 4));
    }

    #[test]
    fn rapid_start_stop_start_leaves_exactly_one_intro() {
        let mut h = Harness::new();
        h.cmd(EngineCmd::Start);
        h.cmd(EngineCmd::Stop);
        h.cmd(EngineCmd::Start);
        // One intro's worth of tasks: 7 steps, 3 chord tones, handover.
        assert_eq!(h.thread.transport.pending(), 11);

        h.advance(INTRO_STEP_MS * 7);
        let primaries = h
            .notes_played()
            .iter()
            .filter(|(_, s)| !s)
            .count();
        assert_eq!(primaries, 7, "overlapping intros detected");
    }

    #[test]
    fn recording_on_a_silent_engine_reports_the_error() {
        let mut h = Harness::new();
        let (reply_tx, reply_rx) = mpsc::channel();
        h.cmd(EngineCmd::StartRecording {
            path: std::path::PathBuf::from("take.wav"),
            reply: reply_tx,
        });
        assert!(reply_rx.try_recv().unwrap().is_err());
        assert!(h.feedback().is_empty());
    }

    #[test]
    fn shutdown_ends_the_loop() {
        let mut h = Harness::new();
        assert!(h.thread.handle_cmd(EngineCmd::Shutdown, h.now));
    }
}
