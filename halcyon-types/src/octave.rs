use serde::{Deserialize, Serialize};

/// Screen size class; mobile stages use the tighter radii.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

/// Per-octave playback and visual configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OctaveBand {
    pub octave: i32,
    pub active: bool,
    /// Volume multiplier applied on top of the per-note base level.
    pub volume: f32,
    /// Relative chance of this band being drawn for a random note.
    /// Normalized over active bands before each draw.
    pub probability: f32,
    /// Ring radius from the stage center, in pixels.
    pub radius: f32,
    pub mobile_radius: f32,
    pub bubble_size: f32,
    pub bubble_opacity: f32,
    pub ripple: bool,
    pub attack_secs: f32,
    pub release_secs: f32,
    /// Delay between scheduling and tone onset.
    pub start_delay_secs: f32,
}

impl OctaveBand {
    /// The three default bands (octaves 3, 4, 5): louder slower bass in
    /// the inner ring, quieter highs in the outer ring.
    pub fn defaults() -> [OctaveBand; 3] {
        [
            OctaveBand {
                octave: 3,
                active: true,
                volume: 1.0,
                probability: 0.33,
                radius: 150.0,
                mobile_radius: 120.0,
                bubble_size: 32.0,
                bubble_opacity: 0.8,
                ripple: true,
                attack_secs: 0.02,
                release_secs: 0.1,
                start_delay_secs: 0.0,
            },
            OctaveBand {
                octave: 4,
                active: true,
                volume: 0.9,
                probability: 0.33,
                radius: 250.0,
                mobile_radius: 180.0,
                bubble_size: 32.0,
                bubble_opacity: 0.8,
                ripple: true,
                attack_secs: 0.03,
                release_secs: 0.1,
                start_delay_secs: 0.0,
            },
            OctaveBand {
                octave: 5,
                active: true,
                volume: 0.5,
                probability: 0.33,
                radius: 350.0,
                mobile_radius: 240.0,
                bubble_size: 32.0,
                bubble_opacity: 0.8,
                ripple: true,
                attack_secs: 0.02,
                release_secs: 0.1,
                start_delay_secs: 0.0,
            },
        ]
    }

    pub fn radius_for(&self, class: DeviceClass) -> f32 {
        match class {
            DeviceClass::Desktop => self.radius,
            DeviceClass::Mobile => self.mobile_radius,
        }
    }
}
