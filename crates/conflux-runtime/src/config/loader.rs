//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables TOML configuration files (`conflux.toml`, `config.toml`)
//! - `yaml-config`: enables YAML configuration files (`conflux.yaml`, `conflux.yml`, etc.)
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`conflux.{profile}.toml` / `conflux.{profile}.yaml`)
//! 3. Main config file (`conflux.toml` / `conflux.yaml`)
//! 4. Environment variables (`CONFLUX_*`)
//! 5. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `CONFLUX_` prefix with `__` as separator:
//!
//! - `CONFLUX_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `CONFLUX_BINDING__UNKNOWN_KEYS=strict` → `binding.unknown_keys = "strict"`
//! - `CONFLUX_COMPONENTS__AWS2_KINESIS__STREAM_NAME=orders` → `components.aws2-kinesis.streamName`
//!
//! # Component Keys
//!
//! Keys below `components` keep the spelling they were written in, and nested
//! tables are folded into dotted keys (`proxy.host`). A source merged later
//! reuses the spelling already merged for the same component or option, so
//! `CONFLUX_COMPONENTS__AWS2_KINESIS__STREAM_NAME` overrides `streamName`
//! from a file. Two spellings inside one source are both kept and left to the
//! binder to reject.
//!
//! Component values from the environment are taken as text, without the type
//! guessing figment applies to other variables: `SHARD_ID=0001` stays `"0001"`.
//!
//! ```rust,ignore
//! use conflux_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./config/conflux.toml")
//!     .set("components.aws2-kinesis.stream-name", "orders")
//!     .load()?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use conflux_core::normalize_key;
use figment::providers::{Env, Serialized};
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::value::{Dict, Map, Value};
use figment::{Figment, Metadata, Provider};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::ConfluxConfig;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CONFLUX_";

/// Environment variable selecting the profile.
pub const PROFILE_ENV: &str = "CONFLUX_PROFILE";

/// Top-level key holding component sections.
pub const COMPONENTS_KEY: &str = "components";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Parses a profile name. `prod` and `dev` are accepted as aliases.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Reads `CONFLUX_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader searching the current and user config directories.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds user config directory to search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(config_dir) => self.search_path(config_dir.join("conflux")),
            None => self,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a whole configuration on top of every other source.
    pub fn merge(mut self, config: ConfluxConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Sets a single value by dotted key path on top of every other source.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<ConfluxConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: ConfluxConfig = figment.extract()?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            components = config.components.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(ConfluxConfig::default()));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            let env = Env::prefixed(ENV_PREFIX)
                .ignore(&["profile"])
                .filter(|key| !is_component_key(key.as_str()))
                .split("__");
            figment = merge_relaxed(figment.merge(env), ComponentEnv);
        }

        Ok(merge_relaxed(figment, self.overrides))
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("conflux"));
        }
        paths
    }

    /// Loads the first base file found for one format, preceded by its
    /// profile-specific variant. Returns whether a base file was found.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<P, F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        provider: F,
    ) -> (Figment, bool)
    where
        P: Provider,
        F: Fn(&Path) -> P,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_relaxed(figment, provider(&profile_path));
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return (merge_relaxed(figment, provider(&base_path)), true);
                }
            }
        }
        (figment, false)
    }

    fn load_config_files(&self, figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();

        #[cfg(feature = "toml-config")]
        let (figment, found_toml) = self.load_format_files(
            figment,
            &search_paths,
            &["conflux.toml", "config.toml"],
            |path: &Path| Toml::file(path),
        );
        #[cfg(not(feature = "toml-config"))]
        let found_toml = false;

        #[cfg(feature = "yaml-config")]
        let (figment, found_yaml) = self.load_format_files(
            figment,
            &search_paths,
            &["conflux.yaml", "conflux.yml", "config.yaml", "config.yml"],
            |path: &Path| Yaml::file(path),
        );
        #[cfg(not(feature = "yaml-config"))]
        let found_yaml = false;

        if !(found_toml || found_yaml) {
            warn!(paths = ?search_paths, "No configuration file found, using defaults");
        }
        figment
    }
}

/// Merges a single config file, dispatching on its extension.
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(merge_relaxed(figment, Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(merge_relaxed(figment, Yaml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<ConfluxConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<ConfluxConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Component sections
// =============================================================================

/// Merges `provider`, respelling its component keys after those already merged.
fn merge_relaxed<P: Provider>(figment: Figment, provider: P) -> Figment {
    let relaxed = RelaxedComponents::over(&figment, provider);
    figment.merge(relaxed)
}

/// Wraps a provider, folding nested tables below `components` into dotted
/// keys and reusing the spellings of the sections merged before it.
struct RelaxedComponents<P> {
    provider: P,
    known: Dict,
}

impl<P: Provider> RelaxedComponents<P> {
    fn over(figment: &Figment, provider: P) -> Self {
        let known = match figment.find_value(COMPONENTS_KEY) {
            Ok(Value::Dict(_, sections)) => sections,
            _ => Dict::new(),
        };
        Self { provider, known }
    }
}

impl<P: Provider> Provider for RelaxedComponents<P> {
    fn metadata(&self) -> Metadata {
        self.provider.metadata()
    }

    fn data(&self) -> Result<Map<figment::Profile, Dict>, figment::Error> {
        let mut data = self.provider.data()?;
        for dict in data.values_mut() {
            if let Some(Value::Dict(_, sections)) = dict.get_mut(COMPONENTS_KEY) {
                *sections = relax_sections(&self.known, std::mem::take(sections))?;
            }
        }
        Ok(data)
    }

    fn profile(&self) -> Option<figment::Profile> {
        self.provider.profile()
    }
}

fn relax_sections(known: &Dict, sections: Dict) -> Result<Dict, figment::Error> {
    let mut folded = Dict::new();
    for (id, section) in sections {
        let section = match section {
            Value::Dict(tag, table) => {
                let mut flat = Dict::new();
                fold_keys(&id, "", table, &mut flat)?;
                Value::Dict(tag, flat)
            }
            other => other,
        };
        folded.insert(id, section);
    }

    let mut relaxed = respell(known, folded);
    for (id, section) in relaxed.iter_mut() {
        if let (Value::Dict(_, table), Some(Value::Dict(_, known_table))) = (section, known.get(id))
        {
            *table = respell(known_table, std::mem::take(table));
        }
    }
    Ok(relaxed)
}

fn fold_keys(id: &str, prefix: &str, table: Dict, out: &mut Dict) -> Result<(), figment::Error> {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Dict(_, child) => fold_keys(id, &path, child, out)?,
            value => {
                if out.contains_key(&path) {
                    return Err(format!("components.{id}: key '{path}' is set twice").into());
                }
                out.insert(path, value);
            }
        }
    }
    Ok(())
}

/// Renames keys of `table` to the spelling `known` uses for the same
/// normalized key. Keys spelled several ways within `table` keep their own.
fn respell(known: &Dict, table: Dict) -> Dict {
    let spellings: HashMap<String, &String> =
        known.keys().map(|key| (normalize_key(key), key)).collect();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for key in table.keys() {
        *counts.entry(normalize_key(key)).or_default() += 1;
    }

    table
        .into_iter()
        .map(|(key, value)| {
            let normalized = normalize_key(&key);
            match spellings.get(&normalized) {
                Some(&spelling) if counts.get(&normalized) == Some(&1) => {
                    (spelling.clone(), value)
                }
                _ => (key, value),
            }
        })
        .collect()
}

fn is_component_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key == COMPONENTS_KEY || key.starts_with(&format!("{COMPONENTS_KEY}__"))
}

/// `CONFLUX_COMPONENTS__<ID>__<OPTION>` variables, kept as text.
struct ComponentEnv;

impl Provider for ComponentEnv {
    fn metadata(&self) -> Metadata {
        Metadata::named(format!("`{ENV_PREFIX}COMPONENTS__*` environment variable(s)"))
    }

    fn data(&self) -> Result<Map<figment::Profile, Dict>, figment::Error> {
        let mut sections = Dict::new();
        for (key, value) in Env::prefixed(ENV_PREFIX).split("__").iter() {
            let key = key.as_str().to_ascii_lowercase();
            let Some(rest) = key
                .strip_prefix(COMPONENTS_KEY)
                .and_then(|rest| rest.strip_prefix('.'))
            else {
                continue;
            };

            let conflict = || format!("environment sets components.{rest} both as a value and a table");
            match rest.split_once('.') {
                Some((id, option)) => {
                    let section = sections
                        .entry(id.to_string())
                        .or_insert_with(|| Value::from(Dict::new()));
                    match section {
                        Value::Dict(_, table) => {
                            table.insert(option.to_string(), Value::from(value));
                        }
                        _ => return Err(conflict().into()),
                    }
                }
                None => {
                    if sections.insert(rest.to_string(), Value::from(value)).is_some() {
                        return Err(conflict().into());
                    }
                }
            }
        }

        let mut dict = Dict::new();
        if !sections.is_empty() {
            dict.insert(COMPONENTS_KEY.to_string(), Value::from(sections));
        }
        Ok(Map::from([(figment::Profile::Default, dict)]))
    }
}

// =============================================================================
// Tests
// =============================================================================
