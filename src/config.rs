//! Plugin configuration, stored as JSON next to the host's mods.

use std::{fs::File, io::Read, path::Path, path::PathBuf};

use eyre::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How much gets written to the log.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Returns the `log` filter for this level.
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// How reading the settings file went.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded,
    Missing,
    Failed(eyre::Report),
}

impl LoadOutcome {
    /// Writes a line describing the outcome to the log.
    pub fn log(&self, path: &Path) {
        match self {
            LoadOutcome::Loaded => log::info!("Loaded settings from {}.", path.display()),

            LoadOutcome::Missing => log::info!("No settings file found. Defaults will be used."),

            LoadOutcome::Failed(err) => {
                log::error!("Error loading settings file: {err:?}. Defaults will be used.")
            }
        }
    }
}

/// The plugin's settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Options {
    /// Directory holding one `<identity>.json` profile per character.
    pub profile_dir: PathBuf,

    /// The profile identity that global flags are read from.
    pub global_profile: String,

    /// Where the log file is written.
    pub log_path: PathBuf,

    /// The most verbose level that will be logged.
    pub log_level: LogLevel,

    /// `host:port` that log messages are mirrored to in debug builds.
    pub udp_log_target: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            profile_dir: PathBuf::from("profiles"),
            global_profile: "global".to_string(),
            log_path: PathBuf::from("ext_features.log"),
            log_level: LogLevel::default(),
            udp_log_target: None,
        }
    }
}

impl Options {
    /// Attempts to parse the contents of `reader` to get an `Options` value.
    fn parse_json(reader: impl Read) -> Result<Options> {
        // Coerce with `?`.
        Ok(serde_json::from_reader(reader)?)
    }

    /// Looks for a settings file and loads it.
    fn load_from_file(path: &Path) -> Result<Option<Options>> {
        if !path.exists() {
            // This isn't an error, but we didn't find any settings.
            return Ok(None);
        }

        let file = File::open(path).wrap_err_with(|| format!("opening {}", path.display()))?;

        Ok(Some(
            Options::parse_json(file).wrap_err_with(|| format!("parsing {}", path.display()))?,
        ))
    }

    /// Reads the settings from `path`, falling back to defaults. The outcome is returned rather
    /// than logged so that callers can report it once logging is running.
    pub fn read(path: impl AsRef<Path>) -> (Options, LoadOutcome) {
        match Options::load_from_file(path.as_ref()) {
            Ok(Some(options)) => (options, LoadOutcome::Loaded),
            Ok(None) => (Options::default(), LoadOutcome::Missing),
            Err(err) => (Options::default(), LoadOutcome::Failed(err)),
        }
    }

    /// Either loads the settings from `path` or generates default values for them.
    pub fn load(path: impl AsRef<Path>) -> Options {
        let (options, outcome) = Options::read(path.as_ref());
        outcome.log(path.as_ref());

        options
    }

    /// Saves the settings to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)
            .wrap_err_with(|| format!("writing {}", path.as_ref().display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options::load(dir.path().join("nope.json"));

        assert_eq!(options, Options::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{ "log_level": "debug", "profile_dir": "chars" }"#).unwrap();

        let options = Options::load(&path);

        assert_eq!(options.log_level, LogLevel::Debug);
        assert_eq!(options.profile_dir, PathBuf::from("chars"));
        assert_eq!(options.global_profile, "global");
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(Options::load(&path), Options::default());
    }

    #[test]
    fn read_reports_what_happened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");

        let (options, outcome) = Options::read(&path);
        assert_eq!(options, Options::default());
        assert!(matches!(outcome, LoadOutcome::Missing));

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(Options::read(&path).1, LoadOutcome::Failed(_)));

        Options::default().save(&path).unwrap();
        assert!(matches!(Options::read(&path).1, LoadOutcome::Loaded));
    }

    #[test]
    fn saved_options_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");

        let options = Options {
            log_level: LogLevel::Trace,
            udp_log_target: Some("127.0.0.1:4568".to_string()),
            ..Options::default()
        };
        options.save(&path).unwrap();

        assert_eq!(Options::load(&path), options);
    }

    #[test]
    fn log_level_parses_any_case() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::Error.filter(), LevelFilter::Error);
    }
}
