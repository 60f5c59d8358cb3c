use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{FilterName, LayoutIdentifier, SnapshotName};

/// Filter and layout arguments. Ordered so serialization is canonical.
pub type Params = BTreeMap<String, Value>;

/// One step of an action plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessingAction {
    Filter {
        name: FilterName,
        params: Params,
    },
    Layout {
        identifier: LayoutIdentifier,
        params: Option<Params>,
    },
    Snapshot {
        names: BTreeSet<SnapshotName>,
        paths: Vec<String>,
    },
}

impl ProcessingAction {
    pub fn is_snapshot(&self) -> bool {
        matches!(self, ProcessingAction::Snapshot { .. })
    }

    pub fn is_layout(&self) -> bool {
        matches!(self, ProcessingAction::Layout { .. })
    }

    /// Snapshot names; `None` for filters and layouts.
    pub fn snapshot_names(&self) -> Option<&BTreeSet<SnapshotName>> {
        match self {
            ProcessingAction::Snapshot { names, .. } => Some(names),
            _ => None,
        }
    }

    pub fn snapshot_paths(&self) -> Option<&[String]> {
        match self {
            ProcessingAction::Snapshot { paths, .. } => Some(paths),
            _ => None,
        }
    }

    pub fn has_snapshot_name(&self, name: &SnapshotName) -> bool {
        self.snapshot_names().is_some_and(|names| names.contains(name))
    }

    /// Returns the action with its snapshot paths replaced wholesale.
    /// Filters and layouts come back unchanged.
    pub fn with_paths(self, new_paths: Vec<String>) -> Self {
        match self {
            ProcessingAction::Snapshot { names, .. } => ProcessingAction::Snapshot {
                names,
                paths: new_paths,
            },
            other => other,
        }
    }

    /// Primitive descriptor used for fingerprinting; fully determined by content.
    pub fn serialize(&self) -> Value {
        match self {
            ProcessingAction::Filter { name, params } => json!(["filter", name, params]),
            ProcessingAction::Layout { identifier, params } => json!(["layout", identifier, params]),
            ProcessingAction::Snapshot { names, paths } => json!(["snapshot", names, paths]),
        }
    }
}
