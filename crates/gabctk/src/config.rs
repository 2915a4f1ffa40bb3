//! Layered configuration for gabctk.
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/gabctk/config.toml` (system)
//! 2. `~/.config/gabctk/config.toml` (user)
//! 3. `./gabctk.toml`, or the `--config` path when given
//! 4. Environment variables (`GABCTK_*`)
//!
//! Command-line flags are applied on top by the caller.
//!
//! # Example Config
//!
//! ```toml
//! [defaults]
//! title = "Cantus"
//!
//! [midi]
//! tempo = 165
//! program = 74
//!
//! [durations]
//! episema = 1.7
//! point = 2.3
//!
//! [transposition]
//! reference_pitch = 66
//! ```

use std::env;
use std::path::{Path, PathBuf};

use gabc::{DurationRules, MidiParams, ParseOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GabctkConfig {
    pub defaults: DefaultsConfig,
    pub midi: MidiConfig,
    pub durations: DurationRules,
    pub transposition: TranspositionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Title used when the score has no `name` header
    pub title: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            title: ParseOptions::default().default_title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    pub tempo: u16,
    pub program: u8,
    pub velocity: u8,
    pub ticks_per_beat: u16,
}

impl Default for MidiConfig {
    fn default() -> Self {
        let params = MidiParams::default();
        MidiConfig {
            tempo: params.tempo,
            program: params.program,
            velocity: params.velocity,
            ticks_per_beat: params.ticks_per_beat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspositionConfig {
    /// MIDI pitch the melody is centered on
    pub reference_pitch: i32,
}

impl Default for TranspositionConfig {
    fn default() -> Self {
        TranspositionConfig {
            reference_pitch: ParseOptions::default().reference_pitch,
        }
    }
}

impl GabctkConfig {
    /// Load configuration from all sources, preferring `config_path` over
    /// `./gabctk.toml`.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut table = toml::Table::new();

        for path in discover_config_files_with_override(config_path) {
            merge_tables(&mut table, read_table(&path)?);
            sources.files.push(path);
        }

        let mut config: GabctkConfig = toml::Value::Table(table).try_into().map_err(
            |e: toml::de::Error| ConfigError::Parse {
                path: sources.files.last().cloned().unwrap_or_default(),
                message: e.to_string(),
            },
        )?;

        apply_overrides(&mut config, &mut sources, |key| env::var(key).ok());
        Ok((config, sources))
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            default_title: self.defaults.title.clone(),
            reference_pitch: self.transposition.reference_pitch,
            durations: self.durations,
            ..ParseOptions::default()
        }
    }

    pub fn midi_params(&self) -> MidiParams {
        MidiParams {
            tempo: self.midi.tempo,
            program: self.midi.program,
            velocity: self.midi.velocity,
            ticks_per_beat: self.midi.ticks_per_beat,
            ..MidiParams::default()
        }
    }
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided, it replaces the local override. A missing
/// `cli_path` is still returned so that reading it reports the error.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/gabctk/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("gabctk/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("gabctk.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_table(&contents, path)
}

fn parse_table(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge `overlay` into `base` key by key, recursing into sections.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(section) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, section),
                _ => {
                    base.insert(key, toml::Value::Table(section));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply `GABCTK_*` overrides read through `lookup`. Unparseable numbers
/// are ignored.
pub fn apply_overrides(
    config: &mut GabctkConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("GABCTK_TITLE") {
        config.defaults.title = v;
        sources.env_overrides.push("GABCTK_TITLE".to_string());
    }
    if let Some(tempo) = lookup("GABCTK_TEMPO").and_then(|v| v.parse().ok()) {
        config.midi.tempo = tempo;
        sources.env_overrides.push("GABCTK_TEMPO".to_string());
    }
    if let Some(program) = lookup("GABCTK_PROGRAM").and_then(|v| v.parse().ok()) {
        config.midi.program = program;
        sources.env_overrides.push("GABCTK_PROGRAM".to_string());
    }
    if let Some(velocity) = lookup("GABCTK_VELOCITY").and_then(|v| v.parse().ok()) {
        config.midi.velocity = velocity;
        sources.env_overrides.push("GABCTK_VELOCITY".to_string());
    }
    if let Some(pitch) = lookup("GABCTK_REFERENCE_PITCH").and_then(|v| v.parse().ok()) {
        config.transposition.reference_pitch = pitch;
        sources.env_overrides.push("GABCTK_REFERENCE_PITCH".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_toml(contents: &str) -> GabctkConfig {
        let table = parse_table(contents, Path::new("test.toml")).unwrap();
        toml::Value::Table(table).try_into().unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = GabctkConfig::default();
        assert_eq!(config.defaults.title, "Cantus");
        assert_eq!(config.midi.tempo, 165);
        assert_eq!(config.midi.program, 74);
        assert_eq!(config.transposition.reference_pitch, 66);
        assert_eq!(config.durations.point, 2.3);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = from_toml("[midi]\ntempo = 120\n");
        assert_eq!(config.midi.tempo, 120);
        // Other values should be defaults
        assert_eq!(config.midi.program, 74);
        assert_eq!(config.durations, DurationRules::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let config = from_toml(
            r#"
[defaults]
title = "Graduale"

[midi]
tempo = 100
program = 19
velocity = 90
ticks_per_beat = 960

[durations]
episema = 1.5
point = 2.0
pose_double = 1.5

[transposition]
reference_pitch = 62
"#,
        );
        assert_eq!(config.defaults.title, "Graduale");
        assert_eq!(config.midi.program, 19);
        assert_eq!(config.midi.ticks_per_beat, 960);
        assert_eq!(config.durations.episema, 1.5);
        assert_eq!(config.durations.pose_double, 1.5);
        assert_eq!(config.durations.pose_full, 1.0);

        let options = config.parse_options();
        assert_eq!(options.default_title, "Graduale");
        assert_eq!(options.reference_pitch, 62);
        let params = config.midi_params();
        assert_eq!(params.velocity, 90);
        assert_eq!(params.channel, 0);
    }

    #[test]
    fn test_bad_toml_reports_path() {
        let err = parse_table("[midi\n", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_merge_keeps_unset_keys() {
        let mut base = parse_table("[midi]\ntempo = 100\nprogram = 19\n", Path::new("a")).unwrap();
        let overlay = parse_table("[midi]\ntempo = 80\n", Path::new("b")).unwrap();
        merge_tables(&mut base, overlay);
        let config: GabctkConfig = toml::Value::Table(base).try_into().unwrap();
        assert_eq!(config.midi.tempo, 80);
        assert_eq!(config.midi.program, 19);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GABCTK_TITLE", "Officium"),
            ("GABCTK_TEMPO", "90"),
            ("GABCTK_PROGRAM", "not a number"),
        ]
        .into_iter()
        .collect();
        let mut config = GabctkConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides(&mut config, &mut sources, |k| {
            vars.get(k).map(|v| v.to_string())
        });
        assert_eq!(config.defaults.title, "Officium");
        assert_eq!(config.midi.tempo, 90);
        assert_eq!(config.midi.program, 74);
        assert_eq!(sources.env_overrides, vec!["GABCTK_TITLE", "GABCTK_TEMPO"]);
    }

    #[test]
    fn test_missing_cli_config_is_an_error() {
        let missing = Path::new("/nonexistent/gabctk.toml");
        assert!(matches!(
            GabctkConfig::load_with_sources_from(Some(missing)),
            Err(ConfigError::FileRead { .. })
        ));
    }
}
