use serde::{Deserialize, Serialize};

/// One of the 12 chromatic pitch names, independent of octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    /// Chromatic index, 0 (C) through 11 (B).
    pub fn semitone(&self) -> i32 {
        match self {
            PitchClass::C => 0,
            PitchClass::Cs => 1,
            PitchClass::D => 2,
            PitchClass::Ds => 3,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::Fs => 6,
            PitchClass::G => 7,
            PitchClass::Gs => 8,
            PitchClass::A => 9,
            PitchClass::As => 10,
            PitchClass::B => 11,
        }
    }

    /// Inverse of `semitone`, wrapping any integer into the 0..12 range.
    pub fn from_semitone(semitone: i32) -> PitchClass {
        let idx = semitone.rem_euclid(12) as usize;
        PitchClass::ALL[idx]
    }

    pub fn from_name(s: &str) -> Option<PitchClass> {
        match s {
            "C" => Some(PitchClass::C),
            "C#" | "Cs" => Some(PitchClass::Cs),
            "D" => Some(PitchClass::D),
            "D#" | "Ds" => Some(PitchClass::Ds),
            "E" => Some(PitchClass::E),
            "F" => Some(PitchClass::F),
            "F#" | "Fs" => Some(PitchClass::Fs),
            "G" => Some(PitchClass::G),
            "G#" | "Gs" => Some(PitchClass::Gs),
            "A" => Some(PitchClass::A),
            "A#" | "As" => Some(PitchClass::As),
            "B" => Some(PitchClass::B),
            _ => None,
        }
    }

    /// Transpose by a semitone offset, wrapping around the octave.
    pub fn transpose(&self, semitones: i32) -> PitchClass {
        PitchClass::from_semitone(self.semitone() + semitones)
    }

    /// Base frequency in Hz at the reference octave (3).
    pub fn base_frequency(&self) -> f32 {
        match self {
            PitchClass::C => 130.81,
            PitchClass::Cs => 138.59,
            PitchClass::D => 146.83,
            PitchClass::Ds => 155.56,
            PitchClass::E => 164.81,
            PitchClass::F => 174.61,
            PitchClass::Fs => 185.00,
            PitchClass::G => 196.00,
            PitchClass::Gs => 207.65,
            PitchClass::A => 220.00,
            PitchClass::As => 233.08,
            PitchClass::B => 246.94,
        }
    }

    /// Angular position on the visual ring, in degrees clockwise from
    /// the top. One pitch class per 30 degrees, octave-independent.
    pub fn angle_degrees(&self) -> f32 {
        self.semitone() as f32 * 30.0
    }
}

impl std::fmt::Display for PitchClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Frequency reference: the base table is pitched at octave 3.
pub const REFERENCE_OCTAVE: i32 = 3;

/// A note as a value: pitch class plus octave number. No identity, no
/// string encoding; equality and hashing are structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub pitch_class: PitchClass,
    pub octave: i32,
}

impl Note {
    pub fn new(pitch_class: PitchClass, octave: i32) -> Self {
        Self { pitch_class, octave }
    }

    /// Frequency in Hz: base table entry doubled per octave above the
    /// reference octave.
    pub fn frequency(&self) -> f32 {
        self.pitch_class.base_frequency()
            * (2.0_f32).powi(self.octave - REFERENCE_OCTAVE)
    }

    /// Semitone interval (0–11) of this note's pitch class above `root`.
    pub fn degree_from(&self, root: PitchClass) -> usize {
        (self.pitch_class.semitone() - root.semitone()).rem_euclid(12) as usize
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.pitch_class, self.octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn pitch_class_all_has_12() {
        assert_eq!(PitchClass::ALL.len(), 12);
    }

    #[test]
    fn pitch_class_names_unique() {
        let names: HashSet<&str> = PitchClass::ALL.iter().map(|p| p.name()).collect();
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn pitch_class_semitones_0_to_11() {
        let semitones: Vec<i32> = PitchClass::ALL.iter().map(|p| p.semitone()).collect();
        assert_eq!(semitones, (0..12).collect::<Vec<i32>>());
    }

    #[test]
    fn from_semitone_wraps() {
        assert_eq!(PitchClass::from_semitone(12), PitchClass::C);
        assert_eq!(PitchClass::from_semitone(13), PitchClass::Cs);
        assert_eq!(PitchClass::from_semitone(-1), PitchClass::B);
    }

    #[test]
    fn from_name_round_trips() {
        for pc in PitchClass::ALL {
            assert_eq!(PitchClass::from_name(pc.name()), Some(pc));
        }
        assert_eq!(PitchClass::from_name("H"), None);
    }

    #[test]
    fn transpose_wraps_around_octave() {
        assert_eq!(PitchClass::A.transpose(3), PitchClass::C);
        assert_eq!(PitchClass::C.transpose(-1), PitchClass::B);
    }

    #[test]
    fn frequency_doubles_per_octave() {
        let c3 = Note::new(PitchClass::C, 3);
        let c4 = Note::new(PitchClass::C, 4);
        assert!((c3.frequency() - 130.81).abs() < 0.001);
        assert!((c4.frequency() - 261.62).abs() < 0.001);
    }

    #[test]
    fn a3_is_220() {
        assert!((Note::new(PitchClass::A, 3).frequency() - 220.0).abs() < f32::EPSILON);
    }

    #[test]
    fn degree_from_root() {
        let e4 = Note::new(PitchClass::E, 4);
        assert_eq!(e4.degree_from(PitchClass::C), 4);
        assert_eq!(e4.degree_from(PitchClass::G), 9);
        // Octave never affects the degree
        let e5 = Note::new(PitchClass::E, 5);
        assert_eq!(e5.degree_from(PitchClass::C), 4);
    }

    #[test]
    fn angle_is_30_degrees_per_step() {
        assert_eq!(PitchClass::C.angle_degrees(), 0.0);
        assert_eq!(PitchClass::Fs.angle_degrees(), 180.0);
        assert_eq!(PitchClass::A.angle_degrees(), 270.0);
    }

    #[test]
    fn display_formats_name_and_octave() {
        assert_eq!(Note::new(PitchClass::Cs, 4).to_string(), "C#4");
    }

    #[test]
    fn note_equality_is_structural() {
        let a = Note::new(PitchClass::G, 5);
        let b = Note::new(PitchClass::G, 5);
        assert_eq!(a, b);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }
}
