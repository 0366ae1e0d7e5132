use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mode::Mode;
use crate::note::{Note, PitchClass};
use crate::octave::OctaveBand;

pub const TEMPO_MIN: f32 = 0.5;
pub const TEMPO_MAX: f32 = 3.0;

/// The mutable session: tonal center, mode, color setting, tempo, and
/// octave policy, plus the note pools derived from them.
///
/// Pools are recomputed synchronously by every setter that changes
/// pitch material, so readers never observe a stale pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    root: PitchClass,
    mode: Mode,
    diatonic_only: bool,
    tempo: f32,
    octaves: [OctaveBand; 3],
    home_notes: Vec<Note>,
    diatonic_notes: Vec<Note>,
    chromatic_notes: Vec<Note>,
}

impl SessionState {
    pub fn new(root: PitchClass, mode: Mode, diatonic_only: bool, tempo: f32) -> Self {
        let mut state = Self {
            root,
            mode,
            diatonic_only,
            tempo: tempo.clamp(TEMPO_MIN, TEMPO_MAX),
            octaves: OctaveBand::defaults(),
            home_notes: Vec::new(),
            diatonic_notes: Vec::new(),
            chromatic_notes: Vec::new(),
        };
        state.rebuild_pools();
        state
    }

    pub fn root(&self) -> PitchClass {
        self.root
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn diatonic_only(&self) -> bool {
        self.diatonic_only
    }

    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    /// Beat spacing derived from tempo (beats per second).
    pub fn pulse_interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.tempo)
    }

    pub fn octaves(&self) -> &[OctaveBand; 3] {
        &self.octaves
    }

    pub fn active_bands(&self) -> impl Iterator<Item = &OctaveBand> {
        self.octaves.iter().filter(|b| b.active)
    }

    pub fn band_for_octave(&self, octave: i32) -> Option<&OctaveBand> {
        self.octaves.iter().find(|b| b.octave == octave)
    }

    /// The band the scale intro plays on.
    pub fn middle_band(&self) -> Option<&OctaveBand> {
        self.band_for_octave(4)
    }

    pub fn home_notes(&self) -> &[Note] {
        &self.home_notes
    }

    pub fn diatonic_notes(&self) -> &[Note] {
        &self.diatonic_notes
    }

    pub fn chromatic_notes(&self) -> &[Note] {
        &self.chromatic_notes
    }

    // Setters. Each one that changes pitch material triggers the
    // derived recomputation.

    pub fn set_root(&mut self, root: PitchClass) {
        self.root = root;
        self.rebuild_pools();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.rebuild_pools();
    }

    pub fn set_diatonic_only(&mut self, diatonic_only: bool) {
        self.diatonic_only = diatonic_only;
        self.rebuild_pools();
    }

    /// Clamps to the supported range rather than rejecting.
    pub fn set_tempo(&mut self, tempo: f32) {
        self.tempo = tempo.clamp(TEMPO_MIN, TEMPO_MAX);
    }

    pub fn set_band_active(&mut self, octave: i32, active: bool) {
        if let Some(band) = self.octaves.iter_mut().find(|b| b.octave == octave) {
            band.active = active;
        }
        self.rebuild_pools();
    }

    /// Recompute the home/diatonic/chromatic note pools over the
    /// active octave bands.
    pub fn rebuild_pools(&mut self) {
        self.home_notes.clear();
        self.diatonic_notes.clear();
        self.chromatic_notes.clear();

        let degrees = self.mode.degrees().to_owned();
        let active: Vec<i32> = self
            .octaves
            .iter()
            .filter(|b| b.active)
            .map(|b| b.octave)
            .collect();

        for octave in active {
            self.home_notes.push(Note::new(self.root, octave));
            for (step, degree) in degrees.iter().enumerate() {
                if step == 0 {
                    continue;
                }
                let note = Note::new(self.root.transpose(step as i32), octave);
                if degree.active {
                    self.diatonic_notes.push(note);
                } else {
                    self.chromatic_notes.push(note);
                }
            }
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(PitchClass::C, Mode::Major, true, 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pools_cover_three_octaves() {
        let state = SessionState::default();
        assert_eq!(state.home_notes().len(), 3);
        // 6 non-root diatonic degrees and 5 chromatic degrees per octave
        assert_eq!(state.diatonic_notes().len(), 18);
        assert_eq!(state.chromatic_notes().len(), 15);
    }

    #[test]
    fn diatonic_pool_excludes_root() {
        let state = SessionState::default();
        assert!(state
            .diatonic_notes()
            .iter()
            .all(|n| n.pitch_class != PitchClass::C));
    }

    #[test]
    fn tempo_clamps_to_range() {
        let mut state = SessionState::default();
        state.set_tempo(5.0);
        assert_eq!(state.tempo(), TEMPO_MAX);
        state.set_tempo(0.1);
        assert_eq!(state.tempo(), TEMPO_MIN);
        state.set_tempo(1.75);
        assert_eq!(state.tempo(), 1.75);
    }

    #[test]
    fn pulse_interval_follows_tempo() {
        let mut state = SessionState::default();
        state.set_tempo(2.0);
        assert_eq!(state.pulse_interval(), Duration::from_millis(500));
    }

    #[test]
    fn root_change_transposes_but_preserves_intervals() {
        let c = SessionState::new(PitchClass::C, Mode::Major, true, 2.0);
        for root in PitchClass::ALL {
            let transposed = SessionState::new(root, Mode::Major, true, 2.0);
            let c_steps: Vec<usize> = c
                .diatonic_notes()
                .iter()
                .map(|n| n.degree_from(PitchClass::C))
                .collect();
            let t_steps: Vec<usize> = transposed
                .diatonic_notes()
                .iter()
                .map(|n| n.degree_from(root))
                .collect();
            assert_eq!(c_steps, t_steps, "interval pattern changed for root {}", root);
        }
    }

    #[test]
    fn deactivating_a_band_shrinks_the_pools() {
        let mut state = SessionState::default();
        state.set_band_active(5, false);
        assert_eq!(state.home_notes().len(), 2);
        assert_eq!(state.diatonic_notes().len(), 12);
        assert!(state.home_notes().iter().all(|n| n.octave != 5));
    }

    #[test]
    fn mode_change_recomputes_pools() {
        let mut state = SessionState::default();
        state.set_mode(Mode::Minor);
        // E (major third) is chromatic in C minor
        assert!(state
            .chromatic_notes()
            .iter()
            .any(|n| n.pitch_class == PitchClass::E));
        assert!(state
            .diatonic_notes()
            .iter()
            .any(|n| n.pitch_class == PitchClass::Ds));
    }
}
