use rulemem_core::{ActionPlan, ItemRep, PlanError, ProcessingAction, SnapshotDef};
use rulemem_rules::FilterRegistry;

/// Walks a finalized plan tracking whether content is binary, emitting one
/// definition per snapshot name.
pub fn snapshot_defs(plan: &ActionPlan, rep: &ItemRep, filters: &dyn FilterRegistry) -> Result<Vec<SnapshotDef>, PlanError> {
    let mut binary = rep.binary;
    let mut defs = Vec::new();
    for action in plan {
        match action {
            ProcessingAction::Filter { name, .. } => {
                binary = filters.to_binary(name).ok_or_else(|| PlanError::UnknownFilter {
                    target: rep.reference(),
                    name: name.to_string(),
                })?;
            }
            ProcessingAction::Snapshot { names, .. } => {
                defs.extend(names.iter().map(|n| SnapshotDef::new(n.clone(), binary)));
            }
            ProcessingAction::Layout { .. } => {}
        }
    }
    Ok(defs)
}
