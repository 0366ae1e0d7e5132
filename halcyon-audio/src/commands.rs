//! Commands from the main thread to the engine thread.

use std::path::PathBuf;
use std::sync::mpsc::Sender;

use halcyon_types::{Mode, PitchClass};

/// Control operations consumed by the engine thread.
#[derive(Debug)]
pub enum EngineCmd {
    Start,
    Stop,
    TogglePlay,
    SetRoot(PitchClass),
    SetMode(Mode),
    SetDiatonicOnly(bool),
    SetTempo(f32),
    SetBandActive { octave: i32, active: bool },
    ViewportResized { width: f32, height: f32 },
    StartRecording {
        path: PathBuf,
        reply: Sender<Result<(), String>>,
    },
    StopRecording {
        reply: Sender<Result<PathBuf, String>>,
    },
    Shutdown,
}

impl EngineCmd {
    /// Transport and pitch-material changes are time-critical: they
    /// cancel or re-arm scheduled notes and must not queue behind
    /// viewport or recording traffic.
    pub fn is_priority(&self) -> bool {
        matches!(
            self,
            EngineCmd::Start
                | EngineCmd::Stop
                | EngineCmd::TogglePlay
                | EngineCmd::SetRoot(_)
                | EngineCmd::SetMode(_)
                | EngineCmd::SetDiatonicOnly(_)
                | EngineCmd::SetTempo(_)
                | EngineCmd::Shutdown
        )
    }
}
