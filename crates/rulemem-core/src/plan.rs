use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::{CompilationTarget, FilterName, LayoutIdentifier, Params, PlanError, ProcessingAction, SnapshotName};

/// The ordered recipe for producing one compilation target (a.k.a. rule memory).
///
/// Snapshot names are unique across the whole plan; adding a taken name fails
/// instead of merging.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionPlan {
    target: CompilationTarget,
    actions: Vec<ProcessingAction>,
    snapshot_names: BTreeSet<SnapshotName>,
}

impl ActionPlan {
    pub fn new(target: CompilationTarget) -> Self {
        Self {
            target,
            actions: Vec::new(),
            snapshot_names: BTreeSet::new(),
        }
    }

    pub fn target(&self) -> &CompilationTarget {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn action_at(&self, idx: usize) -> Option<&ProcessingAction> {
        self.actions.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProcessingAction> {
        self.actions.iter()
    }

    pub fn add_filter(&mut self, name: impl Into<FilterName>, params: Params) -> &mut Self {
        self.actions.push(ProcessingAction::Filter {
            name: name.into(),
            params,
        });
        self
    }

    pub fn add_layout(&mut self, identifier: impl Into<LayoutIdentifier>, params: Option<Params>) -> &mut Self {
        self.actions.push(ProcessingAction::Layout {
            identifier: identifier.into(),
            params,
        });
        self
    }

    /// Appends a snapshot action. Nothing is recorded if any requested name is
    /// already taken somewhere in the plan.
    pub fn add_snapshot<I>(&mut self, names: I, path: Option<String>) -> Result<&mut Self, PlanError>
    where
        I: IntoIterator<Item = SnapshotName>,
    {
        let names: BTreeSet<SnapshotName> = names.into_iter().collect();
        if names.is_empty() {
            return Err(PlanError::EmptySnapshotNames {
                target: self.target.reference(),
            });
        }
        if let Some(taken) = names.iter().find(|n| self.snapshot_names.contains(*n)) {
            return Err(PlanError::DuplicateSnapshotName {
                target: self.target.reference(),
                name: taken.to_string(),
            });
        }
        self.snapshot_names.extend(names.iter().cloned());
        self.actions.push(ProcessingAction::Snapshot {
            names,
            paths: path.into_iter().collect(),
        });
        Ok(self)
    }

    pub fn snapshot_actions(&self) -> Vec<&ProcessingAction> {
        self.actions.iter().filter(|a| a.is_snapshot()).collect()
    }

    pub fn has_snapshot(&self, name: &SnapshotName) -> bool {
        self.snapshot_names.contains(name)
    }

    pub fn any_layouts(&self) -> bool {
        self.actions.iter().any(ProcessingAction::is_layout)
    }

    /// Snapshot name to output path. Pairs are taken in plan order, so a
    /// snapshot with several paths maps to its last one.
    pub fn resolved_paths(&self) -> BTreeMap<SnapshotName, String> {
        let mut out = BTreeMap::new();
        for action in &self.actions {
            if let ProcessingAction::Snapshot { names, paths } = action {
                for name in names {
                    for path in paths {
                        out.insert(name.clone(), path.clone());
                    }
                }
            }
        }
        out
    }

    pub fn serialize(&self) -> Vec<Value> {
        self.actions.iter().map(ProcessingAction::serialize).collect()
    }

    /// Hex SHA-256 of the serialized plan; stable across runs.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(&self.serialize()).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// New plan for the same target with every action passed through `f`.
    pub fn transform<F>(&self, mut f: F) -> Self
    where
        F: FnMut(ProcessingAction) -> ProcessingAction,
    {
        let actions = self.actions.iter().cloned().map(&mut f).collect();
        Self::from_actions(self.target.clone(), actions)
    }

    /// Like [`ActionPlan::transform`], stopping at the first failure.
    pub fn try_transform<F, E>(&self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(ProcessingAction) -> Result<ProcessingAction, E>,
    {
        let actions = self
            .actions
            .iter()
            .cloned()
            .map(&mut f)
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Self::from_actions(self.target.clone(), actions))
    }

    fn from_actions(target: CompilationTarget, actions: Vec<ProcessingAction>) -> Self {
        let snapshot_names = taken_names(&actions);
        Self {
            target,
            actions,
            snapshot_names,
        }
    }

    /// Moves the path of the most recent trailing bookkeeping snapshot (`_N`)
    /// onto a path-less trailing `last` snapshot, then drops temporary
    /// snapshots left without a path. Named snapshots keep their paths.
    pub fn canonicalize(&mut self) {
        let run_len = self.actions.iter().rev().take_while(|a| a.is_snapshot()).count();
        if run_len < 2 {
            return;
        }
        let run_start = self.actions.len() - run_len;
        let last_idx = self.actions.len() - 1;

        match &self.actions[last_idx] {
            ProcessingAction::Snapshot { names, paths } if names.contains(&SnapshotName::last()) && paths.is_empty() => {}
            _ => return,
        }

        // Only `_N` snapshots donate their path; a named snapshot such as `pre` keeps its own.
        let source_idx = (run_start..last_idx).rev().find(|&idx| match &self.actions[idx] {
            ProcessingAction::Snapshot { names, paths } => !paths.is_empty() && names.iter().all(SnapshotName::is_temporary),
            _ => false,
        });
        let Some(source_idx) = source_idx else {
            return;
        };

        let moved = match &mut self.actions[source_idx] {
            ProcessingAction::Snapshot { paths, .. } => std::mem::take(paths),
            _ => return,
        };
        if let ProcessingAction::Snapshot { paths, .. } = &mut self.actions[last_idx] {
            *paths = moved;
        }

        self.actions.retain(|action| match action {
            ProcessingAction::Snapshot { names, paths } => !(paths.is_empty() && names.iter().all(SnapshotName::is_temporary)),
            _ => true,
        });
        self.snapshot_names = taken_names(&self.actions);
    }
}

fn taken_names(actions: &[ProcessingAction]) -> BTreeSet<SnapshotName> {
    actions
        .iter()
        .filter_map(ProcessingAction::snapshot_names)
        .flatten()
        .cloned()
        .collect()
}

impl<'a> IntoIterator for &'a ActionPlan {
    type Item = &'a ProcessingAction;
    type IntoIter = std::slice::Iter<'a, ProcessingAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
