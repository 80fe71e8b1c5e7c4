//! Browser configuration and its on-disk store.
//!
//! The file is a flat list of `key = value` lines whose values are TOML
//! scalars:
//!
//! ```text
//! enable-color = true
//! language = "EN"
//! tag.p = true
//! tag.img = false
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use baodweb_types::ConfigError;

use crate::block::{SUPPORTED_TAGS, is_supported_tag};

pub const KEY_COLOR: &str = "enable-color";
pub const KEY_LANGUAGE: &str = "language";
pub const TAG_PREFIX: &str = "tag.";

const DEFAULT_LANGUAGE: &str = "EN";

/// Settings that influence building and layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub color_enabled: bool,
    /// Two upper-case ASCII letters.
    pub language: String,
    disabled_tags: BTreeSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color_enabled: true,
            language: DEFAULT_LANGUAGE.to_string(),
            disabled_tags: BTreeSet::new(),
        }
    }
}

impl Config {
    /// Whether `tag` should be rendered. Tags outside the switchable set
    /// are always enabled.
    pub fn tag_enabled(&self, tag: &str) -> bool {
        !self.disabled_tags.contains(tag)
    }

    /// Validate and apply one setting.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            KEY_COLOR => self.color_enabled = parse_bool(value).ok_or_else(invalid)?,
            KEY_LANGUAGE => self.language = parse_language(value).ok_or_else(invalid)?,
            _ => {
                let tag = key
                    .strip_prefix(TAG_PREFIX)
                    .filter(|t| is_supported_tag(t))
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let enabled = parse_bool(value).ok_or_else(invalid)?;
                self.set_tag(tag, enabled);
            },
        }
        Ok(())
    }

    /// Current value of `key`, formatted as `set` accepts it.
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        match key {
            KEY_COLOR => Ok(self.color_enabled.to_string()),
            KEY_LANGUAGE => Ok(self.language.clone()),
            _ => key
                .strip_prefix(TAG_PREFIX)
                .filter(|t| is_supported_tag(t))
                .map(|t| self.tag_enabled(t).to_string())
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string())),
        }
    }

    /// Every key with its value, in file order.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = vec![
            (KEY_COLOR.to_string(), self.color_enabled.to_string()),
            (KEY_LANGUAGE.to_string(), self.language.clone()),
        ];
        for tag in SUPPORTED_TAGS {
            out.push((format!("{TAG_PREFIX}{tag}"), self.tag_enabled(tag).to_string()));
        }
        out
    }

    fn set_tag(&mut self, tag: &str, enabled: bool) {
        if enabled {
            self.disabled_tags.remove(tag);
        } else {
            self.disabled_tags.insert(tag.to_string());
        }
    }

    /// Parse the file form. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        let mut config = Config::default();
        if let Some(color) = file.enable_color {
            config.color_enabled = color;
        }
        if let Some(lang) = file.language {
            config.set(KEY_LANGUAGE, &lang)?;
        }
        for (tag, enabled) in file.tag {
            if !is_supported_tag(&tag) {
                return Err(ConfigError::UnknownKey(format!("{TAG_PREFIX}{tag}")));
            }
            config.set_tag(&tag, enabled);
        }
        Ok(config)
    }

    /// Render the file form.
    pub fn to_file_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{KEY_COLOR} = {}", self.color_enabled);
        let _ = writeln!(out, "{KEY_LANGUAGE} = \"{}\"", self.language);
        for tag in SUPPORTED_TAGS {
            let _ = writeln!(out, "{TAG_PREFIX}{tag} = {}", self.tag_enabled(tag));
        }
        out
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "enable-color", default)]
    enable_color: Option<bool>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    tag: BTreeMap<String, bool>,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Some(true),
        "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn parse_language(value: &str) -> Option<String> {
    let v = value.trim();
    (v.len() == 2 && v.chars().all(|c| c.is_ascii_alphabetic())).then(|| v.to_ascii_uppercase())
}

// -----------------------------------------------------------------------
// Store
// -----------------------------------------------------------------------

/// Reads and writes the config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `config` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("config"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file, writing defaults out first if it does not exist.
    pub fn load(&self) -> Result<Config, ConfigError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Config::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Config::default();
                self.save(&config)?;
                log::info!("wrote default config to {}", self.path.display());
                Ok(config)
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite the whole file.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, config.to_file_string())?;
        log::debug!("saved config to {}", self.path.display());
        Ok(())
    }
}
