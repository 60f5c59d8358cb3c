use rulemem_core::{ActionPlan, CompilationTarget, FilterName, LayoutIdentifier, Params, PlanError, SnapshotName};

/// Handed to a compilation rule for exactly one evaluation. Every authoring
/// verb appends to the owned plan instead of doing the work.
#[derive(Debug)]
pub struct RecordingExecutor {
    plan: ActionPlan,
    write_counter: u32,
}

impl RecordingExecutor {
    pub fn new(plan: ActionPlan) -> Self {
        Self { plan, write_counter: 0 }
    }

    pub fn target(&self) -> &CompilationTarget {
        self.plan.target()
    }

    pub fn plan(&self) -> &ActionPlan {
        &self.plan
    }

    pub fn record_filter(&mut self, name: impl Into<FilterName>, params: Params) {
        self.plan.add_filter(name, params);
    }

    pub fn record_layout(&mut self, identifier: impl Into<LayoutIdentifier>, params: Option<Params>) {
        self.plan.add_layout(identifier, params);
    }

    pub fn record_snapshot<I>(&mut self, names: I, path: Option<String>) -> Result<(), PlanError>
    where
        I: IntoIterator<Item = SnapshotName>,
    {
        self.plan.add_snapshot(names, path)?;
        Ok(())
    }

    /// Records a bookkeeping snapshot `_N` carrying `path`.
    ///
    /// `canonicalize` folds it into `last` only when it sits in the trailing
    /// snapshot run right before a path-less `last`. The implicit `pre` is
    /// appended after `last`, so a rule that never records `pre` itself keeps
    /// `_N` as a separate output next to any routed `last`.
    pub fn record_write(&mut self, path: impl Into<String>) -> Result<(), PlanError> {
        self.write_counter += 1;
        let name = SnapshotName::temporary(self.write_counter);
        self.plan.add_snapshot([name], Some(path.into()))?;
        Ok(())
    }

    pub fn into_plan(self) -> ActionPlan {
        self.plan
    }
}
