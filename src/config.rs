//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/treegrid/treegrid.toml`
//! 3. Local config: `<dir>/.treegrid.toml`
//! 4. Environment variables: `TREEGRID_*` prefix

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::grid::{ColumnDef, DefaultColumnDef};
use crate::application::ApplicationError;

/// Grid column layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GridSettings {
    /// Columns in display order; the first one carries the tree indentation
    pub columns: Vec<ColumnDef>,
    /// Options shared by all columns
    pub default_column: DefaultColumnDef,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            columns: vec![ColumnDef::default()],
            default_column: DefaultColumnDef::default(),
        }
    }
}

/// Terminal output options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputSettings {
    /// Spaces per depth level in text grid output
    pub indent: usize,
    /// Colored terminal output (NO_COLOR is honored regardless)
    pub color: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            indent: 2,
            color: true,
        }
    }
}

/// Raw default-column options; `None` means "inherit".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDefaultColumnDef {
    pub sortable: Option<bool>,
    pub filter: Option<bool>,
    pub resizable: Option<bool>,
    pub editable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawGridSettings {
    pub columns: Option<Vec<ColumnDef>>,
    pub default_column: RawDefaultColumnDef,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutputSettings {
    pub indent: Option<usize>,
    pub color: Option<bool>,
}

/// Raw settings for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub seed_file: Option<PathBuf>,
    pub grid: RawGridSettings,
    pub output: RawOutputSettings,
}

/// Unified configuration for treegrid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Nodes file used when no `--file` is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<PathBuf>,
    pub grid: GridSettings,
    pub output: OutputSettings,
}

impl DefaultColumnDef {
    fn merge(&self, overlay: &RawDefaultColumnDef) -> Self {
        Self {
            sortable: overlay.sortable.unwrap_or(self.sortable),
            filter: overlay.filter.unwrap_or(self.filter),
            resizable: overlay.resizable.unwrap_or(self.resizable),
            editable: overlay.editable.unwrap_or(self.editable),
        }
    }
}

/// Get the XDG config directory for treegrid.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treegrid").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treegrid.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".treegrid.toml")
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string; unknown variables leave it as is.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Where settings layers come from.
///
/// [`ConfigSources::system`] reads the XDG global file and the process
/// environment; tests pass explicit values instead.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Global config file, `None` to skip the layer
    pub global: Option<PathBuf>,
    /// `TREEGRID_*` variables, `None` for the process environment
    pub env: Option<HashMap<String, String>>,
}

impl ConfigSources {
    pub fn system() -> Self {
        Self {
            global: global_config_path(),
            env: None,
        }
    }

    /// No global file, no environment overrides.
    pub fn isolated() -> Self {
        Self {
            global: None,
            env: Some(HashMap::new()),
        }
    }

    pub fn with_global(mut self, path: impl Into<PathBuf>) -> Self {
        self.global = Some(path.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Load a TOML file into RawSettings for manual merging.
///
/// A relative `seed_file` is anchored at the directory holding the file.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    let mut raw: RawSettings = toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })?;
    if let Some(seed) = raw.seed_file.take() {
        let seed = expand_path(&seed);
        raw.seed_file = Some(match path.parent() {
            Some(base) if seed.is_relative() => base.join(seed),
            _ => seed,
        });
    }
    Ok(raw)
}

impl Settings {
    /// Merge overlay config onto self (base).
    ///
    /// - Scalars: overlay wins if Some, otherwise keep base
    /// - Column list: replaced as a whole if the overlay specifies it
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            seed_file: overlay.seed_file.clone().or_else(|| self.seed_file.clone()),
            grid: GridSettings {
                columns: overlay
                    .grid
                    .columns
                    .clone()
                    .unwrap_or_else(|| self.grid.columns.clone()),
                default_column: self.grid.default_column.merge(&overlay.grid.default_column),
            },
            output: OutputSettings {
                indent: overlay.output.indent.unwrap_or(self.output.indent),
                color: overlay.output.color.unwrap_or(self.output.color),
            },
        }
    }

    fn expand_paths(&mut self) {
        if let Some(seed) = &self.seed_file {
            self.seed_file = Some(expand_path(seed));
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `sources` - Global config file and environment to layer in
    /// * `local_dir` - Optional directory holding a `.treegrid.toml`
    pub fn load_from(
        sources: &ConfigSources,
        local_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = &sources.global {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current, sources.env.clone())?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply TREEGRID_* environment variables as explicit overrides.
    ///
    /// Nested keys use `__`: `TREEGRID_OUTPUT__INDENT=4`. A relative
    /// `TREEGRID_SEED_FILE` stays relative to the working directory.
    fn apply_env_overrides(
        mut settings: Self,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TREEGRID")
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("seed_file") {
            settings.seed_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_int("output.indent") {
            settings.output.indent = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("output.indent must not be negative: {val}"),
            })?;
        }
        if let Ok(val) = config.get_bool("output.color") {
            settings.output.color = val;
        }
        if let Ok(val) = config.get_bool("grid.default_column.sortable") {
            settings.grid.default_column.sortable = val;
        }
        if let Ok(val) = config.get_bool("grid.default_column.filter") {
            settings.grid.default_column.filter = val;
        }
        if let Ok(val) = config.get_bool("grid.default_column.resizable") {
            settings.grid.default_column.resizable = val;
        }
        if let Ok(val) = config.get_bool("grid.default_column.editable") {
            settings.grid.default_column.editable = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# treegrid configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/treegrid/treegrid.toml
#   Local:  <dir>/.treegrid.toml
#   Env:    TREEGRID_* environment variables (nested keys joined by "__")

# Nodes file used when --file is not given.
# A relative path is resolved from the directory of this file.
# seed_file = "~/trees/nodes.json"

[output]
# Spaces per depth level in the text grid
# indent = 2
# Colored output (NO_COLOR is honored regardless)
# color = true

[grid.default_column]
# sortable = false
# filter = false
# resizable = true
# editable = false

# Columns in display order; a layer that sets columns replaces the list.
# [[grid.columns]]
# headerName = "Name"
# field = "label"
# width = 200
# minWidth = 200
# flex = 1
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_single_label_column() {
        let settings = Settings::default();
        assert_eq!(settings.grid.columns.len(), 1);
        assert_eq!(settings.grid.columns[0].header_name, "Name");
        assert_eq!(settings.grid.columns[0].width, Some(200));
        assert_eq!(settings.output.indent, 2);
        assert!(settings.seed_file.is_none());
    }

    #[test]
    fn given_overlay_when_merging_then_specified_fields_win() {
        let raw: RawSettings = toml::from_str(
            r#"
seed_file = "nodes.json"
[output]
indent = 4
[grid.default_column]
sortable = true
"#,
        )
        .unwrap();

        let merged = Settings::default().merge_with(&raw);

        assert_eq!(merged.seed_file, Some(PathBuf::from("nodes.json")));
        assert_eq!(merged.output.indent, 4);
        assert!(merged.output.color);
        assert!(merged.grid.default_column.sortable);
        assert!(merged.grid.default_column.resizable);
        assert_eq!(merged.grid.columns, GridSettings::default().columns);
    }

    #[test]
    fn given_overlay_columns_when_merging_then_list_replaced() {
        let raw: RawSettings = toml::from_str(
            r#"
[[grid.columns]]
header_name = "Id"
field = "id"

[[grid.columns]]
headerName = "Label"
field = "label"
minWidth = 120
"#,
        )
        .unwrap();

        let merged = Settings::default().merge_with(&raw);

        let fields: Vec<&str> = merged.grid.columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["id", "label"]);
        assert_eq!(merged.grid.columns[0].header_name, "Id");
        assert_eq!(merged.grid.columns[1].min_width, Some(120));
    }

    #[test]
    fn given_tilde_in_seed_file_when_expanding_then_uses_home() {
        let mut settings = Settings {
            seed_file: Some(PathBuf::from("~/nodes.json")),
            ..Settings::default()
        };
        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let seed = settings.seed_file.unwrap();
        assert!(seed.starts_with(&home), "seed_file should start with home: {}", seed.display());
    }

    #[test]
    fn given_template_when_parsed_then_valid_toml() {
        let raw: Result<RawSettings, _> = toml::from_str(&Settings::template());
        assert!(raw.is_ok(), "template should parse: {:?}", raw.err());
    }

    #[test]
    fn given_settings_when_serializing_then_round_trips_through_toml() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }
}
