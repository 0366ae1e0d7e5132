use std::path::PathBuf;

use serde::Deserialize;

use halcyon_types::{Mode, PitchClass, SessionState};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    viewport: ViewportConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    root: Option<String>,
    mode: Option<String>,
    tempo: Option<f32>,
    diatonic_only: Option<bool>,
    master_level: Option<f32>,
}

#[derive(Deserialize, Default)]
struct ViewportConfig {
    width: Option<f32>,
    height: Option<f32>,
}

pub struct Config {
    defaults: DefaultsConfig,
    viewport: ViewportConfig,
}

impl Config {
    /// Embedded defaults, overlaid field-by-field with the user's
    /// config file when present. A malformed user file is ignored
    /// with a warning rather than failing startup.
    pub fn load() -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_defaults(&mut base.defaults, user.defaults);
                            merge_viewport(&mut base.viewport, user.viewport);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            defaults: base.defaults,
            viewport: base.viewport,
        }
    }

    /// The session as configured, with fallbacks for anything unset
    /// or unparseable.
    pub fn initial_session(&self) -> SessionState {
        let fallback = SessionState::default();
        SessionState::new(
            self.defaults
                .root
                .as_deref()
                .and_then(PitchClass::from_name)
                .unwrap_or(fallback.root()),
            self.defaults
                .mode
                .as_deref()
                .and_then(parse_mode)
                .unwrap_or_else(|| fallback.mode().clone()),
            self.defaults
                .diatonic_only
                .unwrap_or(fallback.diatonic_only()),
            self.defaults.tempo.unwrap_or(fallback.tempo()),
        )
    }

    /// Output gain (clamped to 0..=1).
    pub fn master_level(&self) -> f32 {
        self.defaults.master_level.unwrap_or(0.8).clamp(0.0, 1.0)
    }

    /// Initial stage size before the shell reports a real viewport.
    pub fn viewport(&self) -> (f32, f32) {
        (
            self.viewport.width.unwrap_or(1024.0),
            self.viewport.height.unwrap_or(768.0),
        )
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("halcyon").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.root.is_some() {
        base.root = user.root;
    }
    if user.mode.is_some() {
        base.mode = user.mode;
    }
    if user.tempo.is_some() {
        base.tempo = user.tempo;
    }
    if user.diatonic_only.is_some() {
        base.diatonic_only = user.diatonic_only;
    }
    if user.master_level.is_some() {
        base.master_level = user.master_level;
    }
}

fn merge_viewport(base: &mut ViewportConfig, user: ViewportConfig) {
    if user.width.is_some() {
        base.width = user.width;
    }
    if user.height.is_some() {
        base.height = user.height;
    }
}

fn parse_mode(s: &str) -> Option<Mode> {
    match s {
        "Major" => Some(Mode::Major),
        "Minor" => Some(Mode::Minor),
        "Lydian" => Some(Mode::Lydian),
        "Custom" => Some(Mode::Custom(Default::default())),
        _ => None,
    }
}
