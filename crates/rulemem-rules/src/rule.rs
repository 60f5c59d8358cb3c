use std::collections::BTreeMap;

use rulemem_core::{FilterName, ItemRep, Layout, Params, PlanError, SnapshotName};

use crate::{RecordingExecutor, Site};

/// Authored logic describing how an item rep is compiled. All effects go
/// through the executor; nothing is returned.
pub trait CompilationRule: Send + Sync {
    fn apply_to(&self, rep: &ItemRep, executor: &mut RecordingExecutor, site: &Site) -> Result<(), PlanError>;
}

/// Maps a named snapshot of an item rep to an output path. Must not filter
/// content or touch build state.
pub trait RoutingRule: Send + Sync {
    fn apply_to(&self, rep: &ItemRep, site: &Site) -> Option<String>;
}

impl<F> CompilationRule for F
where
    F: Fn(&ItemRep, &mut RecordingExecutor, &Site) -> Result<(), PlanError> + Send + Sync,
{
    fn apply_to(&self, rep: &ItemRep, executor: &mut RecordingExecutor, site: &Site) -> Result<(), PlanError> {
        self(rep, executor, site)
    }
}

impl<F> RoutingRule for F
where
    F: Fn(&ItemRep, &Site) -> Option<String> + Send + Sync,
{
    fn apply_to(&self, rep: &ItemRep, site: &Site) -> Option<String> {
        self(rep, site)
    }
}

/// Routing rules per snapshot name. `None` means a rule explicitly routes
/// nowhere; absence means no rule matched.
pub type RoutingRules<'a> = BTreeMap<SnapshotName, Option<&'a dyn RoutingRule>>;

/// The rule lookups the calculator depends on.
pub trait RuleTable: Send + Sync {
    fn compilation_rule_for(&self, rep: &ItemRep) -> Option<&dyn CompilationRule>;
    fn filter_for_layout(&self, layout: &Layout) -> Option<(FilterName, Params)>;
    fn routing_rules_for(&self, rep: &ItemRep) -> RoutingRules<'_>;
}

/// Declared output type of each filter.
pub trait FilterRegistry: Send + Sync {
    /// `Some(true)` if the filter produces binary content, `None` if unknown.
    fn to_binary(&self, name: &FilterName) -> Option<bool>;
}
