use serde::{Deserialize, Serialize};

use crate::SnapshotName;

/// Storage representation of one snapshot, derived from a finalized plan by
/// following the content type through the recorded filters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDef {
    pub name: SnapshotName,
    pub binary: bool,
}

impl SnapshotDef {
    pub fn new(name: SnapshotName, binary: bool) -> Self {
        Self { name, binary }
    }
}
