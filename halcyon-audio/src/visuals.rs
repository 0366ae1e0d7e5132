//! Projection of played notes onto the circular stage.
//!
//! Each pitch class sits at a fixed clock angle (30 degrees per
//! semitone, C at twelve o'clock) on the ring belonging to its octave
//! band. The engine thread does the projection so the shell only ever
//! receives ready-to-draw screen coordinates.

use halcyon_types::{ColorTag, DeviceClass, Note, OctaveBand, VisualEvent};

use crate::rng;

/// Stages narrower than this use the mobile ring radii.
pub const MOBILE_BREAKPOINT: f32 = 768.0;

/// Radial jitter span in pixels, centered on the band radius.
const RADIUS_JITTER: f32 = 16.0;

#[derive(Debug, Clone, Copy)]
pub struct VisualStage {
    width: f32,
    height: f32,
}

impl VisualStage {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn device_class(&self) -> DeviceClass {
        if self.width < MOBILE_BREAKPOINT {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    /// Place a marker for `note` on its band's ring. Returns `None`
    /// when any part of the marker would fall outside the stage.
    pub fn project(
        &self,
        note: Note,
        band: &OctaveBand,
        color: ColorTag,
        rng_state: &mut u64,
    ) -> Option<VisualEvent> {
        // Pitch angles put C at the top; screen zero is to the right.
        let angle = (note.pitch_class.angle_degrees() - 90.0).to_radians();
        let jitter = (rng::next_unit(rng_state) - 0.5) * RADIUS_JITTER;
        let radius = band.radius_for(self.device_class()) + jitter;

        let x = self.width / 2.0 + radius * angle.cos();
        let y = self.height / 2.0 + radius * angle.sin();

        // The whole marker must fit, not just its center.
        let half = band.bubble_size / 2.0;
        if x - half < 0.0 || x + half > self.width || y - half < 0.0 || y + half > self.height {
            return None;
        }

        Some(VisualEvent {
            x,
            y,
            size: band.bubble_size,
            opacity: band.bubble_opacity,
            color,
            ripple: band.ripple,
        })
    }
}
