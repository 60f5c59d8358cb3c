use thiserror::Error;

/// Failures raised while deriving an action plan. Every variant is scoped to
/// one target and carries its reference so the faulty rule can be located.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("do not know how to calculate the action plan for `{reference}`")]
    UnsupportedTarget { reference: String },

    #[error("there is no rule specified for {target}")]
    NoRuleForTarget { target: String },

    #[error("cannot create multiple snapshots named `{name}` for {target}")]
    DuplicateSnapshotName { target: String, name: String },

    #[error(
        "the path returned for {target}, `{path}`, does not start with a slash; \
         all routing rules must return a path that starts with a slash"
    )]
    PathWithoutLeadingSlash { target: String, path: String },

    #[error("a snapshot for {target} must have at least one name")]
    EmptySnapshotNames { target: String },

    #[error("unknown filter `{name}` used by {target}")]
    UnknownFilter { target: String, name: String },
}

pub type Result<T> = std::result::Result<T, PlanError>;
