use rulemem_core::{ActionPlan, ItemRep, PlanError, ProcessingAction};
use rulemem_rules::{RoutingRules, Site};

/// Fills in paths for every path-less snapshot action from the routing rules.
/// A snapshot without a route stays path-less.
pub fn apply_routing_rules(
    plan: &ActionPlan,
    rep: &ItemRep,
    routes: &RoutingRules<'_>,
    site: &Site,
) -> Result<ActionPlan, PlanError> {
    plan.try_transform(|action| {
        let pending = matches!(&action, ProcessingAction::Snapshot { paths, .. } if paths.is_empty());
        if !pending {
            return Ok(action);
        }
        let mut resolved = Vec::new();
        for name in action.snapshot_names().into_iter().flatten() {
            if let Some(path) = path_from_rules(rep, routes.get(name).copied().flatten(), site)? {
                tracing::trace!(rep = %rep, snapshot = %name, path = %path, "routed snapshot");
                resolved.push(path);
            }
        }
        if resolved.is_empty() {
            Ok(action)
        } else {
            Ok(action.with_paths(resolved))
        }
    })
}

fn path_from_rules(
    rep: &ItemRep,
    rule: Option<&dyn rulemem_rules::RoutingRule>,
    site: &Site,
) -> Result<Option<String>, PlanError> {
    let Some(rule) = rule else {
        return Ok(None);
    };
    match rule.apply_to(rep, site) {
        Some(path) if path.is_empty() => Ok(None),
        Some(path) if !path.starts_with('/') => Err(PlanError::PathWithoutLeadingSlash {
            target: rep.reference(),
            path,
        }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulemem_core::SnapshotName;
    use rulemem_rules::RoutingRule;

    fn fixed(path: &'static str) -> impl RoutingRule {
        move |_: &ItemRep, _: &Site| Some(path.to_string())
    }

    fn rep() -> ItemRep {
        ItemRep::new("/a.md", "default")
    }

    fn plan_with(names: &[&str]) -> ActionPlan {
        let mut plan = ActionPlan::new(rep().into());
        for n in names {
            plan.add_snapshot([SnapshotName::from(*n)], None).unwrap();
        }
        plan
    }

    #[test]
    fn routed_snapshots_receive_paths() {
        let ok = fixed("/ok/");
        let mut routes = RoutingRules::new();
        routes.insert(SnapshotName::last(), Some(&ok as &dyn RoutingRule));

        let plan = apply_routing_rules(&plan_with(&["raw", "last"]), &rep(), &routes, &Site::default()).unwrap();

        assert_eq!(plan.action_at(1).unwrap().snapshot_paths(), Some(&["/ok/".to_string()][..]));
        assert_eq!(plan.action_at(0).unwrap().snapshot_paths(), Some(&[][..]));
    }

    #[test]
    fn missing_leading_slash_is_rejected() {
        let bad = fixed("no-leading-slash");
        let mut routes = RoutingRules::new();
        routes.insert(SnapshotName::last(), Some(&bad as &dyn RoutingRule));

        let err = apply_routing_rules(&plan_with(&["last"]), &rep(), &routes, &Site::default()).unwrap_err();

        assert_eq!(
            err,
            PlanError::PathWithoutLeadingSlash {
                target: "rep:default:/a.md".into(),
                path: "no-leading-slash".into()
            }
        );
    }

    #[test]
    fn empty_and_explicit_none_routes_leave_snapshot_pathless() {
        let empty = fixed("");
        let mut routes = RoutingRules::new();
        routes.insert(SnapshotName::last(), Some(&empty as &dyn RoutingRule));
        routes.insert(SnapshotName::raw(), None);

        let plan = apply_routing_rules(&plan_with(&["raw", "last"]), &rep(), &routes, &Site::default()).unwrap();

        assert!(plan.resolved_paths().is_empty());
    }

    fn plan_with_pair() -> ActionPlan {
        let mut plan = ActionPlan::new(rep().into());
        plan.add_snapshot([SnapshotName::from("b"), SnapshotName::from("a")], None)
            .unwrap();
        plan
    }

    #[test]
    fn multi_name_snapshot_collects_every_routed_path() {
        let a = fixed("/a/");
        let b = fixed("/b/");
        let mut routes = RoutingRules::new();
        routes.insert(SnapshotName::from("b"), Some(&b as &dyn RoutingRule));
        routes.insert(SnapshotName::from("a"), Some(&a as &dyn RoutingRule));

        let plan = apply_routing_rules(&plan_with_pair(), &rep(), &routes, &Site::default()).unwrap();

        assert_eq!(
            plan.action_at(0).unwrap().snapshot_paths(),
            Some(&["/a/".to_string(), "/b/".to_string()][..])
        );
    }

    #[test]
    fn multi_name_snapshot_keeps_only_routed_names() {
        let b = fixed("/b/");
        let mut routes = RoutingRules::new();
        routes.insert(SnapshotName::from("b"), Some(&b as &dyn RoutingRule));

        let plan = apply_routing_rules(&plan_with_pair(), &rep(), &routes, &Site::default()).unwrap();

        assert_eq!(plan.action_at(0).unwrap().snapshot_paths(), Some(&["/b/".to_string()][..]));
    }

    #[test]
    fn snapshots_with_paths_are_not_rerouted() {
        let other = fixed("/other/");
        let mut routes = RoutingRules::new();
        routes.insert(SnapshotName::last(), Some(&other as &dyn RoutingRule));
        let mut plan = ActionPlan::new(rep().into());
        plan.add_snapshot([SnapshotName::last()], Some("/mine/".into())).unwrap();

        let plan = apply_routing_rules(&plan, &rep(), &routes, &Site::default()).unwrap();

        assert_eq!(plan.resolved_paths()[&SnapshotName::last()], "/mine/");
    }
}
