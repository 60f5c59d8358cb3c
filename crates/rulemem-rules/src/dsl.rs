use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rulemem_core::{FilterName, ItemRep, LayoutIdentifier, Params, PlanError, RepName, SnapshotName};

use crate::{CompilationRule, RecordingExecutor, RoutingRule, RulesCollection, Site, StaticFilterRegistry};

/// Declarative rules file (YAML).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub compile: Vec<CompileSpec>,
    #[serde(default)]
    pub route: Vec<RouteSpec>,
    #[serde(default)]
    pub layout: Vec<LayoutSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompileSpec {
    pub pattern: String,
    #[serde(default = "RepName::default_rep")]
    pub rep: RepName,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Filter {
        name: FilterName,
        #[serde(default)]
        params: Params,
    },
    Layout {
        identifier: LayoutIdentifier,
        #[serde(default)]
        params: Option<Params>,
    },
    Snapshot {
        name: SnapshotName,
        #[serde(default)]
        path: Option<String>,
    },
    Write {
        path: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteSpec {
    pub pattern: String,
    #[serde(default = "RepName::default_rep")]
    pub rep: RepName,
    #[serde(default = "default_snapshot")]
    pub snapshot: String,
    /// Path template; absent or null routes the snapshot nowhere.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub pattern: String,
    pub filter: String,
    #[serde(default)]
    pub params: Params,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    #[serde(default)]
    pub binary: bool,
}

fn default_snapshot() -> String {
    "last".to_string()
}

/// Compilation rule replaying a fixed list of steps.
#[derive(Clone, Debug)]
pub struct DeclaredRule {
    steps: Vec<Step>,
}

impl DeclaredRule {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}

impl CompilationRule for DeclaredRule {
    fn apply_to(&self, _rep: &ItemRep, executor: &mut RecordingExecutor, _site: &Site) -> Result<(), PlanError> {
        for step in &self.steps {
            match step {
                Step::Filter { name, params } => executor.record_filter(name.clone(), params.clone()),
                Step::Layout { identifier, params } => executor.record_layout(identifier.clone(), params.clone()),
                Step::Snapshot { name, path } => executor.record_snapshot([name.clone()], path.clone())?,
                Step::Write { path } => executor.record_write(path.clone())?,
            }
        }
        Ok(())
    }
}

/// Routing rule expanding `{identifier}`, `{without_ext}`, `{ext}` and `{rep}`.
#[derive(Clone, Debug)]
pub struct RouteTemplate {
    template: String,
}

impl RouteTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn expand(&self, rep: &ItemRep) -> String {
        self.template
            .replace("{identifier}", rep.item.as_str())
            .replace("{without_ext}", rep.item.without_ext())
            .replace("{ext}", rep.item.ext().unwrap_or(""))
            .replace("{rep}", rep.name.as_str())
    }
}

impl RoutingRule for RouteTemplate {
    fn apply_to(&self, rep: &ItemRep, _site: &Site) -> Option<String> {
        Some(self.expand(rep))
    }
}

impl RulesFile {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).context("parse rules yaml")
    }

    /// Builds the rule table and filter registry, validating every pattern.
    pub fn build(self) -> Result<(RulesCollection, StaticFilterRegistry)> {
        let mut rules = RulesCollection::new();
        for spec in self.compile {
            rules.compile(&spec.pattern, spec.rep, DeclaredRule::new(spec.steps))?;
        }
        for spec in self.route {
            rules.route(
                &spec.pattern,
                spec.rep,
                spec.snapshot.as_str(),
                spec.path.map(RouteTemplate::new),
            )?;
        }
        for spec in self.layout {
            rules.layout(&spec.pattern, spec.filter.as_str(), spec.params)?;
        }
        let mut filters = StaticFilterRegistry::new();
        for spec in self.filters {
            filters.declare(spec.name.as_str(), spec.binary);
        }
        Ok((rules, filters))
    }
}

pub fn load_rules(path: &Path) -> Result<RulesFile> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read rules: {}", path.display()))?;
    RulesFile::from_yaml_str(&s).with_context(|| format!("load rules: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuleTable;
    use rulemem_core::{ActionPlan, Layout};

    const RULES: &str = r#"
compile:
  - pattern: "/**/*.md"
    steps:
      - step: filter
        name: kramdown
      - step: layout
        identifier: /default.html
      - step: snapshot
        name: body
        path: /body/
  - pattern: "/**/*.png"
    steps:
      - step: write
        path: /img/
route:
  - pattern: "/**/*.md"
    path: "{without_ext}/index.html"
  - pattern: "/**/*"
    snapshot: raw
    path: null
layout:
  - pattern: "/**/*"
    filter: erb
filters:
  - name: kramdown
  - name: thumbnail
    binary: true
"#;

    #[test]
    fn parses_steps_and_defaults() {
        let file = RulesFile::from_yaml_str(RULES).unwrap();
        assert_eq!(file.compile.len(), 2);
        assert_eq!(file.compile[0].rep, RepName::default_rep());
        assert_eq!(
            file.compile[0].steps[0],
            Step::Filter {
                name: "kramdown".into(),
                params: Params::new()
            }
        );
        assert_eq!(file.route[0].snapshot, "last");
        assert!(file.route[1].path.is_none());
        assert!(file.filters[1].binary);
    }

    #[test]
    fn built_tables_answer_lookups() {
        let (rules, filters) = RulesFile::from_yaml_str(RULES).unwrap().build().unwrap();
        let rep = ItemRep::new("/blog/post.md", "default");

        let rule = rules.compilation_rule_for(&rep).unwrap();
        let mut ex = RecordingExecutor::new(ActionPlan::new(rep.clone().into()));
        rule.apply_to(&rep, &mut ex, &Site::default()).unwrap();
        assert_eq!(ex.plan().len(), 3);
        assert!(ex.plan().any_layouts());

        let routing = rules.routing_rules_for(&rep);
        let last = routing[&SnapshotName::last()].unwrap();
        assert_eq!(last.apply_to(&rep, &Site::default()).unwrap(), "/blog/post/index.html");
        assert!(routing[&SnapshotName::raw()].is_none());

        assert_eq!(rules.filter_for_layout(&Layout::new("/default.html")).unwrap().0.as_str(), "erb");
        assert_eq!(filters.len(), 2);
    }

    #[test]
    fn template_placeholders_expand() {
        let rep = ItemRep::new("/docs/guide.txt", "raw");
        let t = RouteTemplate::new("/{rep}{without_ext}.{ext}|{identifier}");
        assert_eq!(t.expand(&rep), "/raw/docs/guide.txt|/docs/guide.txt");
    }

    #[test]
    fn bad_pattern_fails_build() {
        let file = RulesFile::from_yaml_str("compile:\n  - pattern: \"/[\"\n").unwrap();
        assert!(file.build().is_err());
    }

    #[test]
    fn unknown_step_fails_parse() {
        let res = RulesFile::from_yaml_str("compile:\n  - pattern: /a\n    steps:\n      - step: explode\n");
        assert!(res.is_err());
    }
}
