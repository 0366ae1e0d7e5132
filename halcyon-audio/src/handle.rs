//! PlayerHandle: main-thread interface to the engine.
//!
//! Owns the command and feedback channels. The session, transport, and
//! synthesis all live on the engine thread.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender as CrossbeamSender;

use halcyon_types::{EngineFeedback, Mode, PitchClass};

use crate::commands::EngineCmd;
use crate::config::Config;
use crate::engine::AudioEngine;
use crate::engine_thread::EngineThread;
use crate::visuals::VisualStage;

/// Engine-owned read state mirrored for display. The feedback channel
/// is the only writer.
#[derive(Debug, Clone)]
pub struct PlayerReadState {
    pub is_playing: bool,
    pub tempo: f32,
    pub is_recording: bool,
    pub recording_elapsed: Option<Duration>,
}

impl Default for PlayerReadState {
    fn default() -> Self {
        Self {
            is_playing: false,
            tempo: 2.0,
            is_recording: false,
            recording_elapsed: None,
        }
    }
}

/// Main-thread handle to the player.
///
/// Separate priority and normal channels keep transport and pitch
/// changes ahead of viewport and recording traffic.
pub struct PlayerHandle {
    priority_tx: CrossbeamSender<EngineCmd>,
    normal_tx: CrossbeamSender<EngineCmd>,
    feedback_rx: Receiver<EngineFeedback>,
    read_state: PlayerReadState,
    join_handle: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    pub fn new(config: &Config) -> Self {
        let (priority_tx, priority_rx) = crossbeam_channel::unbounded();
        let (normal_tx, normal_rx) = crossbeam_channel::unbounded();
        let (feedback_tx, feedback_rx) = mpsc::channel();

        let session = config.initial_session();
        let master_level = config.master_level();
        let (width, height) = config.viewport();
        let tempo = session.tempo();

        let join_handle = thread::spawn(move || {
            let thread = EngineThread::new(
                priority_rx,
                normal_rx,
                feedback_tx,
                AudioEngine::new(master_level),
                session,
                VisualStage::new(width, height),
            );
            thread.run();
        });

        Self {
            priority_tx,
            normal_tx,
            feedback_rx,
            read_state: PlayerReadState {
                tempo,
                ..PlayerReadState::default()
            },
            join_handle: Some(join_handle),
        }
    }

    pub fn read_state(&self) -> &PlayerReadState {
        &self.read_state
    }

    /// Send a command, routed to the priority or normal channel.
    pub fn send_cmd(&self, cmd: EngineCmd) -> Result<(), String> {
        if cmd.is_priority() {
            self.priority_tx
                .send(cmd)
                .map_err(|_| "Engine thread disconnected".to_string())
        } else {
            self.normal_tx
                .send(cmd)
                .map_err(|_| "Engine thread disconnected".to_string())
        }
    }

    /// Fire-and-forget: log if the engine thread is gone.
    fn send(&self, cmd: EngineCmd) {
        if let Err(e) = self.send_cmd(cmd) {
            log::warn!(target: "player", "command dropped: {}", e);
        }
    }

    pub fn start(&self) {
        self.send(EngineCmd::Start);
    }

    pub fn stop(&self) {
        self.send(EngineCmd::Stop);
    }

    pub fn toggle_play(&self) {
        self.send(EngineCmd::TogglePlay);
    }

    pub fn set_root(&self, root: PitchClass) {
        self.send(EngineCmd::SetRoot(root));
    }

    pub fn set_mode(&self, mode: Mode) {
        self.send(EngineCmd::SetMode(mode));
    }

    pub fn set_diatonic_only(&self, diatonic_only: bool) {
        self.send(EngineCmd::SetDiatonicOnly(diatonic_only));
    }

    pub fn set_tempo(&self, tempo: f32) {
        self.send(EngineCmd::SetTempo(tempo));
    }

    pub fn set_band_active(&self, octave: i32, active: bool) {
        self.send(EngineCmd::SetBandActive { octave, active });
    }

    pub fn viewport_resized(&self, width: f32, height: f32) {
        self.send(EngineCmd::ViewportResized { width, height });
    }

    /// Start recording the output mix to `path`. Blocks for the
    /// engine's accept or reject.
    pub fn start_recording(&mut self, path: &Path) -> Result<(), String> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send_cmd(EngineCmd::StartRecording {
            path: path.to_path_buf(),
            reply: reply_tx,
        })?;
        match reply_rx.recv() {
            Ok(result) => {
                if result.is_ok() {
                    self.read_state.is_recording = true;
                    self.read_state.recording_elapsed = Some(Duration::from_secs(0));
                }
                result
            }
            Err(_) => Err("Engine thread disconnected".to_string()),
        }
    }

    /// Stop recording and finish the WAV file. Blocks for the path.
    pub fn stop_recording(&mut self) -> Result<PathBuf, String> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send_cmd(EngineCmd::StopRecording { reply: reply_tx })?;
        match reply_rx.recv() {
            Ok(result) => {
                self.read_state.is_recording = false;
                self.read_state.recording_elapsed = None;
                result
            }
            Err(_) => Err("Engine thread disconnected".to_string()),
        }
    }

    /// Pull all pending feedback, applying display state along the way.
    pub fn drain_feedback(&mut self) -> Vec<EngineFeedback> {
        let mut out = Vec::new();
        while let Ok(msg) = self.feedback_rx.try_recv() {
            self.apply_feedback(&msg);
            out.push(msg);
        }
        out
    }

    fn apply_feedback(&mut self, feedback: &EngineFeedback) {
        match feedback {
            EngineFeedback::PlayingChanged(playing) => {
                self.read_state.is_playing = *playing;
            }
            EngineFeedback::TempoUpdate(tempo) => {
                self.read_state.tempo = *tempo;
            }
            EngineFeedback::RecordingState {
                is_recording,
                elapsed_secs,
            } => {
                self.read_state.is_recording = *is_recording;
                self.read_state.recording_elapsed = if *is_recording {
                    Some(Duration::from_secs(*elapsed_secs))
                } else {
                    None
                };
            }
            EngineFeedback::NotePlayed { .. }
            | EngineFeedback::VisualMarker(_)
            | EngineFeedback::IntroFinished
            | EngineFeedback::RecordingStopped(_) => {}
        }
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        let _ = self.send_cmd(EngineCmd::Shutdown);
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}
