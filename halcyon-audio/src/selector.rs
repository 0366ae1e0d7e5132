//! Weighted-random note selection.
//!
//! Two independent draws, octave band first and then scale degree, keep
//! the vertical (register) and horizontal (harmony) texture of the
//! playback independently tunable. Both use the same cumulative-scan
//! rule over normalized weights, in canonical table order.

use halcyon_types::{Note, OctaveBand, SessionState};

use crate::rng;

/// Chance that a degree carrying chord intervals also triggers its
/// arpeggiated triad.
pub const CHORD_PROBABILITY: f32 = 0.25;

/// One selection result: the primary note plus any chord tones to be
/// strummed after it (same octave, flagged secondary by the caller).
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub primary: Note,
    pub chord: Vec<Note>,
}

/// Draw a note for the current beat. Returns `None` only when no
/// octave band is active, the defined "do nothing this beat" case.
/// Never panics, whatever the configuration.
pub fn select_note(session: &SessionState, rng_state: &mut u64) -> Option<Selection> {
    let band = pick_band(session, rng_state)?;
    let degrees = session.mode().degrees();

    let eligible: Vec<usize> = if session.diatonic_only() {
        (0..12).filter(|&i| degrees[i].active).collect()
    } else {
        (0..12).collect()
    };

    if eligible.is_empty() {
        // Degenerate table (possible only via Custom edits): fall back
        // to the root on the first active band, no chord.
        let band = session.active_bands().next()?;
        return Some(Selection {
            primary: Note::new(session.root(), band.octave),
            chord: Vec::new(),
        });
    }

    let step = pick_degree(session, &eligible, rng_state);
    let primary = Note::new(session.root().transpose(step as i32), band.octave);

    let chord = match degrees[step].chord {
        Some(intervals) if rng::next_unit(rng_state) < CHORD_PROBABILITY => intervals
            .iter()
            .map(|offset| Note::new(session.root().transpose(step as i32 + offset), band.octave))
            .collect(),
        _ => Vec::new(),
    };

    Some(Selection { primary, chord })
}

/// The cadence chord announcing the tonal center: the root degree's
/// triad at the intro octave.
pub fn cadence_chord(session: &SessionState) -> Vec<Note> {
    let octave = match session.middle_band() {
        Some(band) => band.octave,
        None => return Vec::new(),
    };
    match session.mode().degrees()[0].chord {
        Some(intervals) => intervals
            .iter()
            .map(|offset| Note::new(session.root().transpose(*offset), octave))
            .collect(),
        None => Vec::new(),
    }
}

fn pick_band<'a>(session: &'a SessionState, rng_state: &mut u64) -> Option<&'a OctaveBand> {
    let bands: Vec<&OctaveBand> = session.active_bands().collect();
    let total: f32 = bands.iter().map(|b| b.probability).sum();
    let first = *bands.first()?;
    if total <= 0.0 {
        return Some(first);
    }

    let roll = rng::next_unit(rng_state);
    let mut cumulative = 0.0;
    for &band in &bands {
        cumulative += band.probability / total;
        if roll < cumulative {
            return Some(band);
        }
    }
    // Rounding at the top of the range lands on the last band.
    bands.last().copied()
}

fn pick_degree(session: &SessionState, eligible: &[usize], rng_state: &mut u64) -> usize {
    let degrees = session.mode().degrees();
    let total: f32 = eligible.iter().map(|&i| degrees[i].weight).sum();
    if total <= 0.0 {
        return eligible[0];
    }

    let roll = rng::next_unit(rng_state);
    let mut cumulative = 0.0;
    for &i in eligible {
        cumulative += degrees[i].weight / total;
        if roll < cumulative {
            return i;
        }
    }
    eligible[eligible.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use halcyon_types::{Mode, PitchClass};

    fn session() -> SessionState {
        SessionState::new(PitchClass::C, Mode::Major, true, 2.0)
    }

    #[test]
    fn diatonic_draws_never_leave_the_scale() {
        let state = session();
        let mut rng_state = 42u64;
        let degrees = state.mode().degrees();
        for _ in 0..1000 {
            let sel = select_note(&state, &mut rng_state).expect("bands active");
            let step = sel.primary.degree_from(state.root());
            assert!(degrees[step].active, "chromatic degree {} drawn in diatonic mode", step);
        }
    }

    #[test]
    fn diatonic_draws_avoid_the_major_chromatic_set() {
        let state = session();
        let mut rng_state = 7u64;
        for _ in 0..1000 {
            let sel = select_note(&state, &mut rng_state).unwrap();
            let step = sel.primary.degree_from(PitchClass::C);
            assert!(![1, 3, 6, 8, 10].contains(&step));
        }
    }

    #[test]
    fn drawn_octave_is_always_active() {
        let mut state = session();
        state.set_band_active(4, false);
        let mut rng_state = 9u64;
        for _ in 0..500 {
            let sel = select_note(&state, &mut rng_state).unwrap();
            assert_ne!(sel.primary.octave, 4);
            assert!([3, 5].contains(&sel.primary.octave));
        }
    }

    #[test]
    fn colorful_mode_reaches_chromatic_degrees() {
        let mut state = session();
        state.set_diatonic_only(false);
        let mut rng_state = 11u64;
        let mut saw_chromatic = false;
        for _ in 0..5000 {
            let sel = select_note(&state, &mut rng_state).unwrap();
            let step = sel.primary.degree_from(PitchClass::C);
            if !state.mode().degrees()[step].active {
                saw_chromatic = true;
                break;
            }
        }
        assert!(saw_chromatic, "chromatic degrees unreachable in colorful mode");
    }

    #[test]
    fn no_active_band_selects_nothing() {
        let mut state = session();
        for octave in [3, 4, 5] {
            state.set_band_active(octave, false);
        }
        let mut rng_state = 5u64;
        assert_eq!(select_note(&state, &mut rng_state), None);
    }

    #[test]
    fn chord_tones_build_on_the_chosen_degree() {
        let state = session();
        let mut rng_state = 1u64;
        // Draw until a chord fires; the root triad in C major is C-E-G.
        for _ in 0..10_000 {
            let sel = select_note(&state, &mut rng_state).unwrap();
            if sel.chord.is_empty() {
                continue;
            }
            let step = sel.primary.degree_from(PitchClass::C);
            let intervals = state.mode().degrees()[step].chord.unwrap();
            let expected: Vec<PitchClass> = intervals
                .iter()
                .map(|o| PitchClass::C.transpose(step as i32 + o))
                .collect();
            let got: Vec<PitchClass> = sel.chord.iter().map(|n| n.pitch_class).collect();
            assert_eq!(got, expected);
            assert!(sel.chord.iter().all(|n| n.octave == sel.primary.octave));
            return;
        }
        panic!("no chord fired in 10000 draws");
    }

    #[test]
    fn chord_rate_is_near_a_quarter_of_triggerable_draws() {
        let state = session();
        let mut rng_state = 3u64;
        let mut chords = 0usize;
        const DRAWS: usize = 4000;
        for _ in 0..DRAWS {
            // Every active degree in the built-in tables carries a chord,
            // so each diatonic draw is a Bernoulli trial.
            if !select_note(&state, &mut rng_state).unwrap().chord.is_empty() {
                chords += 1;
            }
        }
        let rate = chords as f32 / DRAWS as f32;
        assert!((0.20..0.30).contains(&rate), "chord rate {}", rate);
    }

    #[test]
    fn cadence_chord_is_the_root_triad_at_the_middle_octave() {
        let state = session();
        let chord = cadence_chord(&state);
        let classes: Vec<PitchClass> = chord.iter().map(|n| n.pitch_class).collect();
        assert_eq!(classes, vec![PitchClass::C, PitchClass::E, PitchClass::G]);
        assert!(chord.iter().all(|n| n.octave == 4));
    }

    #[test]
    fn cadence_chord_transposes_with_the_root() {
        let mut state = session();
        state.set_root(PitchClass::G);
        let classes: Vec<PitchClass> =
            cadence_chord(&state).iter().map(|n| n.pitch_class).collect();
        assert_eq!(classes, vec![PitchClass::G, PitchClass::B, PitchClass::D]);
    }
}
