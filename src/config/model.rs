//! Configuration data structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::swap::LanguageMatch;

/// Root configuration structure containing all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// External tool locations.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Per-invocation time budgets.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Input file selection.
    #[serde(default)]
    pub files: FilesConfig,

    /// How requested languages are compared with track languages.
    #[serde(default)]
    pub language_match: LanguageMatch,

    /// Maximum number of files processed at the same time.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tools: ToolsConfig::default(),
            timeouts: TimeoutConfig::default(),
            files: FilesConfig::default(),
            language_match: LanguageMatch::default(),
            max_parallel: default_max_parallel(),
        }
    }
}

/// External tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Program printing the track report (name or path).
    #[serde(default = "default_inspect")]
    pub inspect: String,

    /// Program writing the reordered container (name or path).
    #[serde(default = "default_remux")]
    pub remux: String,

    /// Look for the tools next to this binary before searching `PATH`.
    #[serde(default = "default_true")]
    pub prefer_bundled: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            inspect: default_inspect(),
            remux: default_remux(),
            prefer_bundled: true,
        }
    }
}

/// Time budgets in seconds; `None` means unbounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_inspect_timeout")]
    pub inspect_seconds: Option<u64>,

    #[serde(default)]
    pub remux_seconds: Option<u64>,
}

impl TimeoutConfig {
    pub fn inspect(&self) -> Option<Duration> {
        self.inspect_seconds.map(Duration::from_secs)
    }

    pub fn remux(&self) -> Option<Duration> {
        self.remux_seconds.map(Duration::from_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            inspect_seconds: default_inspect_timeout(),
            remux_seconds: None,
        }
    }
}

/// Input file selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Glob patterns matched against file names.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }
}

fn default_inspect() -> String {
    "mkvinfo".to_string()
}

fn default_remux() -> String {
    "mkvmerge".to_string()
}

fn default_inspect_timeout() -> Option<u64> {
    Some(8)
}

fn default_patterns() -> Vec<String> {
    vec!["*.mkv".to_string()]
}

fn default_max_parallel() -> usize {
    4
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.tools.inspect, "mkvinfo");
        assert_eq!(config.tools.remux, "mkvmerge");
        assert!(config.tools.prefer_bundled);
        assert_eq!(config.timeouts.inspect(), Some(Duration::from_secs(8)));
        assert_eq!(config.timeouts.remux(), None);
        assert_eq!(config.files.patterns, vec!["*.mkv"]);
        assert_eq!(config.language_match, LanguageMatch::Prefix);
        assert_eq!(config.max_parallel, 4);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let yaml = r#"
tools:
  remux: /opt/mkvtoolnix/mkvmerge
timeouts:
  inspect_seconds: null
  remux_seconds: 600
files:
  patterns: ["*.mkv", "*.mka"]
language_match: exact
max_parallel: 1
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tools.inspect, "mkvinfo");
        assert_eq!(config.tools.remux, "/opt/mkvtoolnix/mkvmerge");
        assert_eq!(config.timeouts.inspect(), None);
        assert_eq!(config.timeouts.remux(), Some(Duration::from_secs(600)));
        assert_eq!(config.files.patterns.len(), 2);
        assert_eq!(config.language_match, LanguageMatch::Exact);
        assert_eq!(config.max_parallel, 1);
    }
}
