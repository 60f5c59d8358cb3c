use std::io::Write;

use rulemem_core::{ActionPlan, ItemRep, SnapshotName};
use rulemem_rules::{load_rules, FilterRegistry, RecordingExecutor, RuleTable, Site};

#[test]
fn test_load_rules_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
compile:
  - pattern: "/**/*.jpg"
    steps:
      - step: filter
        name: thumbnail
        params: {{ width: 200 }}
      - step: write
        path: /thumbs/
filters:
  - name: thumbnail
    binary: true
"#
    )
    .unwrap();

    let (rules, filters) = load_rules(file.path()).unwrap().build().unwrap();
    let rep = ItemRep::new("/photos/cat.jpg", "default").with_binary(true);

    let mut ex = RecordingExecutor::new(ActionPlan::new(rep.clone().into()));
    rules
        .compilation_rule_for(&rep)
        .unwrap()
        .apply_to(&rep, &mut ex, &Site::default())
        .unwrap();
    let plan = ex.into_plan();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.resolved_paths()[&SnapshotName::temporary(1)], "/thumbs/");
    assert_eq!(filters.to_binary(&"thumbnail".into()), Some(true));
}

#[test]
fn test_missing_rules_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("rules.yaml");
    let err = load_rules(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("rules.yaml"));
}

#[test]
fn test_duplicate_declared_snapshot_stops_evaluation() {
    let file = rulemem_rules::RulesFile::from_yaml_str(
        r#"
compile:
  - pattern: "/**/*"
    steps:
      - step: snapshot
        name: body
      - step: snapshot
        name: body
      - step: filter
        name: erb
"#,
    )
    .unwrap();
    let (rules, _) = file.build().unwrap();
    let rep = ItemRep::new("/a.md", "default");
    let mut ex = RecordingExecutor::new(ActionPlan::new(rep.clone().into()));
    let res = rules
        .compilation_rule_for(&rep)
        .unwrap()
        .apply_to(&rep, &mut ex, &Site::default());
    assert!(res.is_err());
    // the filter after the failing snapshot was never recorded
    assert_eq!(ex.plan().len(), 1);
}
