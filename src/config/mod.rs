//! Server configuration.
//!
//! Resolution: defaults → YAML file → `CODEASSIST_*` environment → CLI flags.
//! The YAML file is the one named by `--config`, or `./codeassist.yaml` when
//! that exists. CLI flags are applied by the binary on top of [`ServerConfig::load`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheOptions;
use crate::engine::rust::RustEngineOptions;
use crate::engine::OutputKind;

/// File picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "codeassist.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum cached analysis contexts. `0` means unbounded.
    pub cache_capacity: usize,
    /// Reference-load failures tolerated per context before the key fails.
    pub max_reference_failures: usize,
    /// Search directories for logical reference names.
    pub reference_paths: Vec<PathBuf>,
    pub bundled_prelude: bool,
    /// Used when a request omits `OutputKind`.
    pub default_output_kind: OutputKind,
    /// Describe every completion item up front instead of on resolve.
    pub eager_descriptions: bool,
    pub indent_width: usize,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let cache = CacheOptions::default();
        Self {
            host: "127.0.0.1".into(),
            port: 5280,
            cache_capacity: cache.capacity,
            max_reference_failures: cache.max_reference_failures,
            reference_paths: Vec::new(),
            bundled_prelude: true,
            default_output_kind: OutputKind::Library,
            eager_descriptions: false,
            indent_width: 4,
            log_filter: "codeassist=info".into(),
        }
    }
}

impl ServerConfig {
    /// Defaults, then the config file, then the process environment.
    ///
    /// An explicit `path` must exist. The default file is optional.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var_os(key))?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Override fields from `CODEASSIST_*` variables found through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<OsString>) -> ConfigResult<()> {
        if let Some(host) = lookup("CODEASSIST_HOST") {
            self.host = host.to_string_lossy().into_owned();
        }
        if let Some(port) = lookup("CODEASSIST_PORT") {
            self.port = parse_env("CODEASSIST_PORT", &port)?;
        }
        if let Some(capacity) = lookup("CODEASSIST_CACHE_CAPACITY") {
            self.cache_capacity = parse_env("CODEASSIST_CACHE_CAPACITY", &capacity)?;
        }
        if let Some(paths) = lookup("CODEASSIST_REFERENCE_PATHS") {
            self.reference_paths = std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        Ok(())
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            capacity: self.cache_capacity,
            max_reference_failures: self.max_reference_failures,
        }
    }

    pub fn engine_options(&self) -> RustEngineOptions {
        RustEngineOptions {
            search_paths: self.reference_paths.clone(),
            bundled_prelude: self.bundled_prelude,
            indent_width: self.indent_width,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, raw: &OsString) -> ConfigResult<T> {
    let value = raw.to_string_lossy();
    value.trim().parse().map_err(|_| ConfigError::Env {
        key,
        value: value.into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:5280");
        assert_eq!(config.cache_capacity, 32);
        assert_eq!(config.max_reference_failures, 4);
        assert!(config.bundled_prelude);
        assert!(!config.eager_descriptions);
        assert_eq!(config.default_output_kind, OutputKind::Library);
        assert_eq!(config.log_filter, "codeassist=info");
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = r#"
port: 9000
eager_descriptions: true
default_output_kind: executable
reference_paths:
  - /opt/refs
"#;
        let config = ServerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.eager_descriptions);
        assert_eq!(config.default_output_kind, OutputKind::Executable);
        assert_eq!(config.reference_paths, vec![PathBuf::from("/opt/refs")]);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.indent_width, 4);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(ServerConfig::from_yaml("  \n").unwrap(), ServerConfig::default());
    }

    #[test]
    fn bad_yaml_is_an_error() {
        assert!(matches!(
            ServerConfig::from_yaml("port: [1, 2]"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn round_trip_yaml() {
        let mut config = ServerConfig::default();
        config.cache_capacity = 0;
        config.reference_paths = vec![PathBuf::from("refs")];
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert_eq!(ServerConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = ServerConfig::from_yaml("port: 9000\nhost: 0.0.0.0\n").unwrap();
        let paths = std::env::join_paths(["/a", "/b"]).unwrap();
        let lookup = env(&[
            ("CODEASSIST_PORT", "7000"),
            ("CODEASSIST_CACHE_CAPACITY", " 8 "),
            ("CODEASSIST_REFERENCE_PATHS", paths.to_str().unwrap()),
        ]);
        config.apply_env(lookup).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:7000");
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.reference_paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn bad_env_value_names_the_key() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_env(env(&[("CODEASSIST_PORT", "eighty")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid value for CODEASSIST_PORT: \"eighty\"");
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(matches!(
            ServerConfig::from_file(&missing),
            Err(ConfigError::Io { .. })
        ));

        let path = dir.path().join("codeassist.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "indent_width: 2").unwrap();
        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.indent_width, 2);
        assert_eq!(config.engine_options().indent_width, 2);
    }

    #[test]
    fn options_follow_config() {
        let mut config = ServerConfig::default();
        config.bundled_prelude = false;
        config.cache_capacity = 3;
        assert!(!config.engine_options().bundled_prelude);
        assert_eq!(config.cache_options().capacity, 3);
    }
}
