use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for the record store.
///
/// This struct holds settings that control where the collection is stored and
/// how it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Path to the JSON document holding the collection.
    ///
    /// Relative paths are resolved against the working directory.
    pub database: PathBuf,

    /// The number of spaces per indentation level when writing the document.
    indent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            indent: default_indent(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the number of spaces per indentation level.
    #[must_use]
    pub const fn indent(&self) -> usize {
        self.indent
    }

    /// Sets the number of spaces per indentation level.
    pub const fn set_indent(&mut self, indent: usize) {
        self.indent = indent;
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("people.json")
}

const fn default_indent() -> usize {
    4
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_database")]
        database: PathBuf,

        #[serde(default = "default_indent")]
        indent: usize,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 { database, indent } => Self { database, indent },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            database: config.database,
            indent: config.indent,
        }
    }
}
