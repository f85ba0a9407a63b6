/* amplitude-identify - validated payloads for the Amplitude Identify API
 * Copyright (C) 2023 Withings
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>. */

use crate::identify::ParseOptions;

use serde::{Serialize, Deserialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use thiserror::Error;
use serde_yaml;
use log;

/// Environment variable pointing to a configuration file
pub const CONFIG_ENV_VAR: &str = "IDENTIFY_CONFIG";

/// Configuration defaults
pub mod defaults {
    pub fn logging_level() -> log::LevelFilter { log::LevelFilter::Info }

    pub fn validation_deny_unknown_fields() -> bool { false }

    pub fn output_pretty() -> bool { false }
}

/// Errors raised while loading the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be opened
    #[error("{}: {source}", .path.display())]
    Unreadable { path: PathBuf, source: std::io::Error },

    /// The file is not valid YAML, or does not match the expected structure
    #[error("{}: {source}", .path.display())]
    Invalid { path: PathBuf, source: serde_yaml::Error },
}

/// Logging block
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Logging {
    #[serde(default = "defaults::logging_level")]
    pub level: log::LevelFilter,
}

impl Default for Logging {
    /// Builds a default logging block in case none is provided
    fn default() -> Self {
        return Self {
            level: defaults::logging_level(),
        }
    }
}

/// Validation block
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Validation {
    /// Reject documents carrying keys the Identify API does not know
    #[serde(default = "defaults::validation_deny_unknown_fields")]
    pub deny_unknown_fields: bool,
}

impl Default for Validation {
    fn default() -> Self {
        return Self {
            deny_unknown_fields: defaults::validation_deny_unknown_fields(),
        }
    }
}

impl From<&Validation> for ParseOptions {
    fn from(validation: &Validation) -> Self {
        ParseOptions { deny_unknown_fields: validation.deny_unknown_fields }
    }
}

/// Output block
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Output {
    /// Indent payloads instead of printing them on a single line
    #[serde(default = "defaults::output_pretty")]
    pub pretty: bool,
}

impl Default for Output {
    fn default() -> Self {
        return Self {
            pretty: defaults::output_pretty(),
        }
    }
}

/// The overall configuration file
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    /// A logging block
    #[serde(default)]
    pub logging: Logging,
    /// A validation block
    #[serde(default)]
    pub validation: Validation,
    /// An output block
    #[serde(default)]
    pub output: Output,
}

/// Parse a configuration file given a path
pub fn parse_configuration_file(path: &Path) -> Result<Configuration, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Unreadable { path: path.to_path_buf(), source })?;
    serde_yaml::from_reader(file).map_err(|source| ConfigError::Invalid { path: path.to_path_buf(), source })
}

/// File names tried in each configuration directory
const FILE_NAMES: [&str; 2] = ["identify.yml", "identify.yaml"];

/// A configuration, along with the guessed files that had to be skipped
/// Skipped files are reported by the caller once logging is up
#[derive(Debug)]
pub struct LoadedConfiguration {
    pub configuration: Configuration,
    pub skipped: Vec<ConfigError>,
}

/// Directories searched when no file is named, in order of preference
fn search_directories() -> Vec<PathBuf> {
    let mut directories = vec![PathBuf::from("/etc/withings")];
    if let Some(dirs) = ProjectDirs::from("com", "withings", "amplitude-identify") {
        directories.push(dirs.config_dir().to_path_buf());
    }
    if let Ok(cwd) = std::env::current_dir() {
        directories.push(cwd);
    }
    directories
}

/// Every file worth trying, in order of preference
pub fn candidate_locations(directories: &[PathBuf]) -> Vec<PathBuf> {
    directories.iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .collect()
}

/// Uses the first candidate that exists and parses, defaults if none does
pub fn load_first_valid(candidates: &[PathBuf]) -> LoadedConfiguration {
    let mut skipped = vec![];
    for path in candidates.iter().filter(|p| p.is_file()) {
        match parse_configuration_file(path) {
            Ok(configuration) => return LoadedConfiguration { configuration, skipped },
            Err(e) => skipped.push(e),
        }
    }

    LoadedConfiguration { configuration: Configuration::default(), skipped }
}

/// Locates and parses the configuration file
///
/// A file given on the command line or through IDENTIFY_CONFIG must parse.
/// Otherwise the usual locations are searched, and defaults apply when none
/// of them holds a usable file.
pub fn get_configuration(cmd_arg: Option<&Path>) -> Result<LoadedConfiguration, ConfigError> {
    let given_location = cmd_arg
        .map(PathBuf::from)
        .or(std::env::var(CONFIG_ENV_VAR).map(PathBuf::from).ok());

    match given_location {
        Some(path) => Ok(LoadedConfiguration {
            configuration: parse_configuration_file(&path)?,
            skipped: vec![],
        }),
        None => Ok(load_first_valid(&candidate_locations(&search_directories()))),
    }
}
