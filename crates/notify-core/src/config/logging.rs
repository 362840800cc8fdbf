//! Log output settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Line format written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level for every target.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Per-target overrides, e.g. `"notify::dead_letter" = "error"`.
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            targets: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive string: the default level followed by
    /// `target=level` pairs.
    pub fn filter_directives(&self) -> String {
        std::iter::once(self.level.clone())
            .chain(self.targets.iter().map(|(target, level)| format!("{target}={level}")))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn default_level() -> String {
    "info".to_string()
}
