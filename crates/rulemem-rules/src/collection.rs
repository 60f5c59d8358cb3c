use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};

use rulemem_core::{FilterName, ItemRep, Layout, Params, PlanError, RepName, SnapshotName};

use crate::{CompilationRule, RecordingExecutor, RoutingRule, RoutingRules, RuleTable, Site};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Identifier glob: `*` stays within one path component, `**` spans directories.
#[derive(Clone, Debug)]
pub struct IdentifierPattern {
    pattern: Pattern,
}

impl IdentifierPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Pattern::new(pattern).with_context(|| format!("invalid identifier pattern `{pattern}`"))?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, identifier: &str) -> bool {
        self.pattern.matches_with(identifier, MATCH_OPTIONS)
    }
}

struct CompileEntry {
    pattern: IdentifierPattern,
    rep: RepName,
    rule: Box<dyn CompilationRule>,
}

struct RouteEntry {
    pattern: IdentifierPattern,
    rep: RepName,
    snapshot: SnapshotName,
    rule: Option<Box<dyn RoutingRule>>,
}

struct LayoutEntry {
    pattern: IdentifierPattern,
    filter: FilterName,
    params: Params,
}

/// Ordered rule table; every lookup returns the first matching rule.
#[derive(Default)]
pub struct RulesCollection {
    compile: Vec<CompileEntry>,
    routes: Vec<RouteEntry>,
    layouts: Vec<LayoutEntry>,
}

impl RulesCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile<R>(&mut self, pattern: &str, rep: impl Into<RepName>, rule: R) -> Result<&mut Self>
    where
        R: CompilationRule + 'static,
    {
        self.compile.push(CompileEntry {
            pattern: IdentifierPattern::new(pattern)?,
            rep: rep.into(),
            rule: Box::new(rule),
        });
        Ok(self)
    }

    /// Closure form of [`RulesCollection::compile`].
    pub fn compile_with<F>(&mut self, pattern: &str, rep: impl Into<RepName>, f: F) -> Result<&mut Self>
    where
        F: Fn(&ItemRep, &mut RecordingExecutor, &Site) -> Result<(), PlanError> + Send + Sync + 'static,
    {
        self.compile(pattern, rep, f)
    }

    /// Registers a routing rule. `rule: None` routes the snapshot nowhere.
    pub fn route<R>(
        &mut self,
        pattern: &str,
        rep: impl Into<RepName>,
        snapshot: impl Into<SnapshotName>,
        rule: Option<R>,
    ) -> Result<&mut Self>
    where
        R: RoutingRule + 'static,
    {
        self.routes.push(RouteEntry {
            pattern: IdentifierPattern::new(pattern)?,
            rep: rep.into(),
            snapshot: snapshot.into(),
            rule: rule.map(|r| Box::new(r) as Box<dyn RoutingRule>),
        });
        Ok(self)
    }

    /// Closure form of [`RulesCollection::route`].
    pub fn route_with<F>(
        &mut self,
        pattern: &str,
        rep: impl Into<RepName>,
        snapshot: impl Into<SnapshotName>,
        f: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&ItemRep, &Site) -> Option<String> + Send + Sync + 'static,
    {
        self.route(pattern, rep, snapshot, Some(f))
    }

    pub fn layout(&mut self, pattern: &str, filter: impl Into<FilterName>, params: Params) -> Result<&mut Self> {
        self.layouts.push(LayoutEntry {
            pattern: IdentifierPattern::new(pattern)?,
            filter: filter.into(),
            params,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.compile.len() + self.routes.len() + self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RuleTable for RulesCollection {
    fn compilation_rule_for(&self, rep: &ItemRep) -> Option<&dyn CompilationRule> {
        self.compile
            .iter()
            .find(|e| e.rep == rep.name && e.pattern.matches(rep.item.as_str()))
            .map(|e| &*e.rule)
    }

    fn filter_for_layout(&self, layout: &Layout) -> Option<(FilterName, Params)> {
        self.layouts
            .iter()
            .find(|e| e.pattern.matches(layout.identifier.as_str()))
            .map(|e| (e.filter.clone(), e.params.clone()))
    }

    fn routing_rules_for(&self, rep: &ItemRep) -> RoutingRules<'_> {
        let mut rules = RoutingRules::new();
        for e in self
            .routes
            .iter()
            .filter(|e| e.rep == rep.name && e.pattern.matches(rep.item.as_str()))
        {
            rules.entry(e.snapshot.clone()).or_insert(e.rule.as_deref());
        }
        rules
    }
}
