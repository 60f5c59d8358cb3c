use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    /// Free-form site configuration handed to rules.
    #[serde(default)]
    pub site: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_rules")]
    pub rules: String,
}

fn default_rules() -> String {
    "rules.yaml".to_string()
}

impl Config {
    pub fn default_for_project(name: &str) -> Self {
        Self {
            project: ProjectConfig {
                name: name.to_string(),
                rules: default_rules(),
            },
            site: BTreeMap::new(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// Rules file location; `~` is expanded and relative paths resolve against `config_dir`.
    pub fn rules_path(&self, config_dir: &Path) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&self.project.rules).to_string());
        if expanded.is_absolute() {
            expanded
        } else {
            config_dir.join(expanded)
        }
    }

    pub fn config_path(root: &Path) -> PathBuf {
        root.join("rulemem.toml")
    }
}

pub const EXAMPLE_RULES: &str = r#"compile:
  - pattern: "/**/*.md"
    steps:
      - step: filter
        name: erb
      - step: layout
        identifier: /default.html
route:
  - pattern: "/**/*.md"
    path: "{without_ext}/index.html"
layout:
  - pattern: "/**/*"
    filter: erb
filters:
  - name: erb
"#;
