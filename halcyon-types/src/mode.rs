use serde::{Deserialize, Serialize};

/// Visual category for a played note, driving bubble color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorTag {
    Root,
    InScale,
    Chromatic1,
    Chromatic2,
    Chromatic3,
    Chromatic4,
    Chromatic5,
}

impl ColorTag {
    /// Class name consumed by the visual layer.
    pub fn css_class(&self) -> &'static str {
        match self {
            ColorTag::Root => "root-note",
            ColorTag::InScale => "in-scale",
            ColorTag::Chromatic1 => "chromatic-1",
            ColorTag::Chromatic2 => "chromatic-2",
            ColorTag::Chromatic3 => "chromatic-3",
            ColorTag::Chromatic4 => "chromatic-4",
            ColorTag::Chromatic5 => "chromatic-5",
        }
    }
}

/// Properties of one scale degree (semitone offset 0–11 from the root).
///
/// `chord` intervals are semitone offsets from *this degree*, not from
/// the root: `[0, 4, 7]` on any degree is the major triad built on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleDegree {
    pub active: bool,
    pub weight: f32,
    pub volume: f32,
    pub color: ColorTag,
    pub chord: Option<[i32; 3]>,
}

/// A full 12-slot table of scale-degree properties, index = semitone
/// offset from the root. Index 0 is always active.
pub type DegreeTable = [ScaleDegree; 12];

const fn on(weight: f32, color: ColorTag, chord: [i32; 3]) -> ScaleDegree {
    ScaleDegree {
        active: true,
        weight,
        volume: 1.0,
        color,
        chord: Some(chord),
    }
}

const fn off(color: ColorTag) -> ScaleDegree {
    ScaleDegree {
        active: false,
        weight: 0.012,
        volume: 1.0,
        color,
        chord: None,
    }
}

// Position:  0-Root  1-m2  2-M2  3-m3  4-M3  5-P4  6-Tri  7-P5  8-m6  9-M6  10-m7  11-M7
const MAJOR_DEGREES: DegreeTable = [
    on(0.20, ColorTag::Root, [0, 4, 7]),
    off(ColorTag::Chromatic5),
    on(0.133, ColorTag::InScale, [0, 3, 7]),
    off(ColorTag::Chromatic3),
    on(0.133, ColorTag::InScale, [0, 3, 7]),
    on(0.133, ColorTag::InScale, [0, 4, 7]),
    off(ColorTag::Chromatic2),
    on(0.133, ColorTag::InScale, [0, 4, 7]),
    off(ColorTag::Chromatic1),
    on(0.133, ColorTag::InScale, [0, 3, 7]),
    off(ColorTag::Chromatic4),
    on(0.133, ColorTag::InScale, [0, 3, 6]),
];

const MINOR_DEGREES: DegreeTable = [
    on(0.20, ColorTag::Root, [0, 3, 7]),
    off(ColorTag::Chromatic5),
    on(0.133, ColorTag::InScale, [0, 3, 6]),
    on(0.133, ColorTag::InScale, [0, 4, 7]),
    off(ColorTag::Chromatic3),
    on(0.133, ColorTag::InScale, [0, 3, 7]),
    off(ColorTag::Chromatic2),
    on(0.133, ColorTag::InScale, [0, 3, 7]),
    on(0.133, ColorTag::InScale, [0, 4, 7]),
    off(ColorTag::Chromatic1),
    on(0.133, ColorTag::InScale, [0, 3, 7]),
    off(ColorTag::Chromatic4),
];

const LYDIAN_DEGREES: DegreeTable = [
    on(0.20, ColorTag::Root, [0, 4, 7]),
    off(ColorTag::Chromatic5),
    on(0.133, ColorTag::InScale, [0, 4, 7]),
    off(ColorTag::Chromatic3),
    on(0.133, ColorTag::InScale, [0, 3, 7]),
    off(ColorTag::Chromatic2),
    on(0.133, ColorTag::InScale, [0, 3, 6]),
    on(0.133, ColorTag::InScale, [0, 4, 7]),
    off(ColorTag::Chromatic1),
    on(0.133, ColorTag::InScale, [0, 3, 7]),
    off(ColorTag::Chromatic4),
    on(0.133, ColorTag::InScale, [0, 3, 7]),
];

/// A user-tunable degree table. The engine re-reads the table on every
/// mode change rather than holding a live reference, so edits never
/// race with an in-progress draw; `version` lets callers detect edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomMode {
    table: DegreeTable,
    version: u64,
}

impl CustomMode {
    /// The root slot is forced active regardless of the input table.
    pub fn new(mut table: DegreeTable) -> Self {
        table[0].active = true;
        Self { table, version: 0 }
    }

    pub fn table(&self) -> &DegreeTable {
        &self.table
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace one degree slot. Editing slot 0 keeps it active.
    pub fn set_degree(&mut self, index: usize, degree: ScaleDegree) {
        self.table[index] = degree;
        self.table[0].active = true;
        self.version += 1;
    }
}

impl Default for CustomMode {
    fn default() -> Self {
        Self::new(MAJOR_DEGREES)
    }
}

/// A named, immutable 12-entry scale description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
    Lydian,
    Custom(CustomMode),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Major => "Major",
            Mode::Minor => "Minor",
            Mode::Lydian => "Lydian",
            Mode::Custom(_) => "Custom",
        }
    }

    pub fn degrees(&self) -> &DegreeTable {
        match self {
            Mode::Major => &MAJOR_DEGREES,
            Mode::Minor => &MINOR_DEGREES,
            Mode::Lydian => &LYDIAN_DEGREES,
            Mode::Custom(custom) => custom.table(),
        }
    }

    /// Semitone offsets of the active (diatonic) degrees, ascending.
    pub fn active_steps(&self) -> Vec<usize> {
        self.degrees()
            .iter()
            .enumerate()
            .filter(|(_, d)| d.active)
            .map(|(i, _)| i)
            .collect()
    }
}
