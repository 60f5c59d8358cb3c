use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rulemem_core::{ActionPlan, CompilationTarget, ItemRep, Layout, PlanError, SnapshotDef, SnapshotName};
use rulemem_rules::{FilterRegistry, RecordingExecutor, RuleTable, Site};

use crate::{apply_routing_rules, snapshot_defs};

/// Per-target cache slot. Its lock is held while the plan is computed so
/// concurrent first access waits instead of computing twice.
type Slot = Arc<Mutex<Option<Arc<ActionPlan>>>>;

/// Derives finalized action plans and memoizes them for one build.
///
/// Only successful plans are cached. Once published a plan is never mutated;
/// callers share it through `Arc`.
pub struct PlanCalculator {
    rules: Arc<dyn RuleTable>,
    filters: Arc<dyn FilterRegistry>,
    site: Site,
    cache: Mutex<HashMap<CompilationTarget, Slot>>,
}

impl PlanCalculator {
    pub fn new(rules: Arc<dyn RuleTable>, filters: Arc<dyn FilterRegistry>, site: Site) -> Self {
        Self {
            rules,
            filters,
            site,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Drops every memoized plan; call once at the start of each build.
    pub fn start_build(&self) {
        let mut cache = lock(&self.cache);
        tracing::debug!(discarded = cache.len(), "starting build, plan cache cleared");
        cache.clear();
    }

    /// Number of targets with a published plan.
    pub fn cached_len(&self) -> usize {
        let slots: Vec<Slot> = lock(&self.cache).values().cloned().collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    pub fn plan_for(&self, target: &CompilationTarget) -> Result<Arc<ActionPlan>, PlanError> {
        let slot = {
            let mut cache = lock(&self.cache);
            Arc::clone(cache.entry(target.clone()).or_default())
        };

        let mut published = lock(&slot);
        if let Some(plan) = published.as_ref() {
            tracing::trace!(reference = %target.reference(), "plan cache hit");
            return Ok(Arc::clone(plan));
        }

        let computed = match target {
            CompilationTarget::ItemRep(rep) => self.plan_for_rep(rep),
            CompilationTarget::Layout(layout) => self.plan_for_layout(layout),
        };
        let plan = match computed {
            Ok(plan) => Arc::new(plan),
            Err(err) => {
                self.discard_slot(target, &slot);
                return Err(err);
            }
        };
        tracing::debug!(reference = %target.reference(), actions = plan.len(), "computed action plan");
        *published = Some(Arc::clone(&plan));
        Ok(plan)
    }

    /// Parses a target reference (`rep:<name>:<identifier>` or `layout:<identifier>`).
    pub fn plan_for_reference(&self, reference: &str) -> Result<Arc<ActionPlan>, PlanError> {
        self.plan_for(&CompilationTarget::from_reference(reference)?)
    }

    pub fn fingerprint_for(&self, target: &CompilationTarget) -> Result<String, PlanError> {
        Ok(self.plan_for(target)?.fingerprint())
    }

    pub fn snapshot_defs_for(&self, rep: &ItemRep) -> Result<Vec<SnapshotDef>, PlanError> {
        let plan = self.plan_for(&CompilationTarget::ItemRep(rep.clone()))?;
        snapshot_defs(&plan, rep, self.filters.as_ref())
    }

    fn plan_for_rep(&self, rep: &ItemRep) -> Result<ActionPlan, PlanError> {
        let rule = self
            .rules
            .compilation_rule_for(rep)
            .ok_or_else(|| PlanError::NoRuleForTarget { target: rep.reference() })?;

        let mut executor = RecordingExecutor::new(ActionPlan::new(rep.clone().into()));
        executor.record_snapshot([SnapshotName::raw()], None)?;
        rule.apply_to(rep, &mut executor, &self.site)?;
        let mut plan = executor.into_plan();

        if plan.any_layouts() {
            plan.add_snapshot([SnapshotName::post()], None)?;
        }
        if !plan.has_snapshot(&SnapshotName::last()) {
            plan.add_snapshot([SnapshotName::last()], None)?;
        }
        if !plan.has_snapshot(&SnapshotName::pre()) {
            plan.add_snapshot([SnapshotName::pre()], None)?;
        }
        plan.canonicalize();

        let routes = self.rules.routing_rules_for(rep);
        apply_routing_rules(&plan, rep, &routes, &self.site)
    }

    /// Drops the empty slot of a failed target unless another caller is
    /// already waiting on it.
    fn discard_slot(&self, target: &CompilationTarget, slot: &Slot) {
        let mut cache = lock(&self.cache);
        let ours = cache.get(target).is_some_and(|s| Arc::ptr_eq(s, slot));
        // Clones are only handed out under the map lock, so the count is stable here.
        if ours && Arc::strong_count(slot) == 2 {
            cache.remove(target);
        }
    }

    fn plan_for_layout(&self, layout: &Layout) -> Result<ActionPlan, PlanError> {
        let (filter, params) = self
            .rules
            .filter_for_layout(layout)
            .ok_or_else(|| PlanError::NoRuleForTarget {
                target: layout.reference(),
            })?;
        let mut plan = ActionPlan::new(layout.clone().into());
        plan.add_filter(filter, params);
        Ok(plan)
    }
}

// Plans are published only after they are complete, so a poisoned lock never
// guards a half-built plan.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulemem_core::Params;
    use rulemem_rules::{RulesCollection, StaticFilterRegistry};

    fn calculator(rules: RulesCollection) -> PlanCalculator {
        PlanCalculator::new(Arc::new(rules), Arc::new(StaticFilterRegistry::new()), Site::default())
    }

    #[test]
    fn repeated_calls_share_the_cached_plan() {
        let mut rules = RulesCollection::new();
        rules
            .compile_with("/**/*", "default", |_, ex, _| {
                ex.record_filter("erb", Params::new());
                Ok(())
            })
            .unwrap();
        let calc = calculator(rules);
        let target: CompilationTarget = ItemRep::new("/a.md", "default").into();

        let first = calc.plan_for(&target).unwrap();
        let second = calc.plan_for(&target).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calc.cached_len(), 1);

        calc.start_build();
        assert_eq!(calc.cached_len(), 0);
        let third = calc.plan_for(&target).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(first.serialize(), third.serialize());
    }

    #[test]
    fn failures_are_not_cached() {
        let calc = calculator(RulesCollection::new());
        let target: CompilationTarget = ItemRep::new("/a.md", "default").into();
        assert!(calc.plan_for(&target).is_err());
        assert!(calc.plan_for(&target).is_err());
        assert_eq!(calc.cached_len(), 0);
        assert!(lock(&calc.cache).is_empty());
    }
}
