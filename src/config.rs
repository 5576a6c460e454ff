//! Generation configuration.
//!
//! A configuration file is JSON or YAML (chosen by extension):
//!
//! ```yaml
//! metadata:
//!   entryFile: "src/**/*.controller.ts"
//!   ignore: ["src/legacy/**"]
//! decorators:
//!   builtin: true
//!   dialects: nestjs
//! swagger:
//!   name: My API
//! compilerOptions:
//!   rootDir: .
//! ```
//!
//! Loose selection shapes (`true`, `"nestjs"`, `["a", "b"]`, `{ "nestjs": { "Get": true } }`)
//! are converted into closed enums when the configuration is loaded, so unknown
//! dialect or role names fail before any source is read.

use crate::annotations::{
    Dialect, DialectSelection, MappingConfig, Representation, Role, RoleInclusion,
};
use crate::error::{GenerateError, Result};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub metadata: MetadataConfig,
    /// Document settings, passed through to the emitter
    #[serde(default)]
    pub swagger: Value,
    #[serde(default)]
    pub decorators: DecoratorConfig,
    /// Parser settings; only `rootDir` is read here
    #[serde(default)]
    pub compiler_options: Value,
    /// Directory that relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataConfig {
    /// Glob patterns of the source files to analyze
    pub entry_file: OneOrMany,
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Patterns that take precedence over `ignore`
    #[serde(default)]
    pub allow: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value.clone()],
            OneOrMany::Many(values) => values.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecoratorConfig {
    /// Built-in roles to include; all when absent
    pub builtin: Option<Selection>,
    /// Third-party dialects to activate; none when absent
    pub dialects: Option<Selection>,
    #[serde(default, rename = "override")]
    pub overrides: BTreeMap<Role, Vec<Representation>>,
}

/// The loose configuration shape shared by dialect and built-in selections.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    Flag(bool),
    One(String),
    Many(Vec<String>),
    PerKey(BTreeMap<String, Selection>),
}

impl TryFrom<&Selection> for DialectSelection {
    type Error = GenerateError;

    fn try_from(selection: &Selection) -> Result<Self> {
        Ok(match selection {
            Selection::Flag(true) => DialectSelection::All,
            Selection::Flag(false) => DialectSelection::None,
            Selection::One(name) => DialectSelection::One(parse_dialect(name)?),
            Selection::Many(names) if names.is_empty() => DialectSelection::None,
            Selection::Many(names) => DialectSelection::Subset(
                names
                    .iter()
                    .map(|name| parse_dialect(name))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Selection::PerKey(map) => {
                let mut per_role = BTreeMap::new();
                for (name, roles) in map {
                    let dialect = parse_dialect(name)?;
                    let inclusion = RoleInclusion::try_from(roles)?;
                    if inclusion != RoleInclusion::None {
                        per_role.insert(dialect, inclusion);
                    }
                }
                DialectSelection::PerRole(per_role)
            }
        })
    }
}

impl TryFrom<&Selection> for RoleInclusion {
    type Error = GenerateError;

    fn try_from(selection: &Selection) -> Result<Self> {
        Ok(match selection {
            Selection::Flag(true) => RoleInclusion::All,
            Selection::Flag(false) => RoleInclusion::None,
            Selection::One(name) => RoleInclusion::Only(BTreeSet::from([parse_role(name)?])),
            Selection::Many(names) => RoleInclusion::Only(
                names
                    .iter()
                    .map(|name| parse_role(name))
                    .collect::<Result<BTreeSet<_>>>()?,
            ),
            Selection::PerKey(flags) => {
                let mut roles = BTreeSet::new();
                for (name, flag) in flags {
                    match flag {
                        Selection::Flag(true) => {
                            roles.insert(parse_role(name)?);
                        }
                        Selection::Flag(false) => {
                            parse_role(name)?;
                        }
                        _ => {
                            return Err(GenerateError::Config(format!(
                                "role flag '{}' must be true or false",
                                name
                            )))
                        }
                    }
                }
                RoleInclusion::Only(roles)
            }
        })
    }
}

fn parse_dialect(name: &str) -> Result<Dialect> {
    Dialect::from_name(name).ok_or_else(|| GenerateError::UnknownDialect(name.to_string()))
}

fn parse_role(name: &str) -> Result<Role> {
    serde_json::from_value(Value::String(name.to_string()))
        .map_err(|_| GenerateError::Config(format!("unknown decorator role '{}'", name)))
}

impl DecoratorConfig {
    /// Converts the loose selections into the mapper's input.
    pub fn mapping_config(&self) -> Result<MappingConfig> {
        Ok(MappingConfig {
            builtin: match &self.builtin {
                Some(selection) => RoleInclusion::try_from(selection)?,
                None => RoleInclusion::All,
            },
            dialects: match &self.dialects {
                Some(selection) => DialectSelection::try_from(selection)?,
                None => DialectSelection::None,
            },
            overrides: self.overrides.clone(),
        })
    }
}

impl Config {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it fails
    /// [`Config::validate`].
    pub fn load(path: &Path) -> Result<Config> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        let mut config = if is_yaml {
            Config::from_yaml_str(&content)?
        } else {
            Config::from_json_str(&content)?
        };
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Config> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks required fields and decorator selections.
    pub fn validate(&self) -> Result<()> {
        let entries = self.metadata.entry_file.to_vec();
        if entries.is_empty() || entries.iter().any(|e| e.trim().is_empty()) {
            return Err(GenerateError::Config(
                "metadata.entryFile must name at least one glob pattern".to_string(),
            ));
        }
        self.decorators.mapping_config()?;
        Ok(())
    }

    /// Directory that entry globs are relative to: `compilerOptions.rootDir`
    /// when set, otherwise the configuration's own directory.
    pub fn source_root(&self) -> PathBuf {
        match self.compiler_options.get("rootDir").and_then(Value::as_str) {
            Some(root) => self.base_dir.join(root),
            None => self.base_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_minimal_json_config() {
        let config = Config::from_json_str(r#"{ "metadata": { "entryFile": "src/*.ts" } }"#).unwrap();
        assert_eq!(config.metadata.entry_file.to_vec(), vec!["src/*.ts"]);

        let mapping = config.decorators.mapping_config().unwrap();
        assert_eq!(mapping.builtin, RoleInclusion::All);
        assert_eq!(mapping.dialects, DialectSelection::None);
        assert!(mapping.overrides.is_empty());
    }

    #[test]
    fn test_selection_shapes() {
        let cases = [
            (r#"true"#, DialectSelection::All),
            (r#"false"#, DialectSelection::None),
            (r#""nestjs""#, DialectSelection::One(Dialect::Nestjs)),
            (
                r#"["routing-controllers", "nestjs"]"#,
                DialectSelection::Subset(vec![Dialect::RoutingControllers, Dialect::Nestjs]),
            ),
        ];
        for (json, expected) in cases {
            let selection: Selection = serde_json::from_str(json).unwrap();
            assert_eq!(DialectSelection::try_from(&selection).unwrap(), expected);
        }

        let selection: Selection =
            serde_json::from_str(r#"{ "nestjs": { "ClassPath": true, "Get": true, "Post": false }, "routing-controllers": false }"#)
                .unwrap();
        let mut expected = BTreeMap::new();
        expected.insert(
            Dialect::Nestjs,
            RoleInclusion::Only([Role::ClassPath, Role::Get].into_iter().collect()),
        );
        assert_eq!(
            DialectSelection::try_from(&selection).unwrap(),
            DialectSelection::PerRole(expected)
        );
    }

    #[test]
    fn test_unknown_dialect_is_rejected_at_load() {
        let err = Config::from_json_str(
            r#"{ "metadata": { "entryFile": ["a.ts"] }, "decorators": { "dialects": "express" } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::UnknownDialect(name) if name == "express"));
    }

    #[test]
    fn test_empty_entry_file_is_rejected() {
        let err = Config::from_json_str(r#"{ "metadata": { "entryFile": [] } }"#).unwrap_err();
        assert!(matches!(err, GenerateError::Config(_)));
    }

    #[test]
    fn test_builtin_roles_and_overrides_from_yaml() {
        let config = Config::from_yaml_str(
            r#"
metadata:
  entryFile: src/**/*.ts
decorators:
  builtin: [Get, Query]
  override:
    ClassPath:
      - name: Api
        properties:
          path: { position: 1 }
"#,
        )
        .unwrap();
        let mapping = config.decorators.mapping_config().unwrap();
        assert_eq!(
            mapping.builtin,
            RoleInclusion::Only([Role::Get, Role::Query].into_iter().collect())
        );
        let api = &mapping.overrides[&Role::ClassPath][0];
        assert_eq!(api.name, "Api");
        assert_eq!(
            api.rule(crate::annotations::PropertyKey::Path),
            crate::annotations::ExtractionRule::value(1)
        );
    }

    #[test]
    fn test_load_resolves_root_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(
            br#"{ "metadata": { "entryFile": "*.ts" }, "compilerOptions": { "rootDir": "app" } }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.source_root(), temp_dir.path().join("app"));
    }
}
