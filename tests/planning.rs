//! Test: execution planning - layers, expansion, cycles, determinism

mod helpers;

use helpers::*;
use stagehand::core::config::Config;
use stagehand::core::event::Action;
use stagehand::core::registry::ConfigError;
use stagehand::execution::plan;

const CONFIG: &str = r#"
pipelines:
  - name: "package-deb"
    steps:
      - name: "package"
        commands: ["cargo deb"]

  - name: "package-rpm"
    steps:
      - name: "package"
        commands: ["cargo generate-rpm"]

  - name: "upload"
    depends_on: ["package-deb", "package-rpm"]
    steps:
      - name: "upload"
        commands: ["rsync dist/ host:/srv"]
    triggers:
      - branches: [main]
        actions: [manual]

  - name: "announce"
    depends_on: ["upload"]
    steps:
      - name: "notify"
        commands: ["./notify.sh"]
    triggers:
      - branches: [main]
        actions: [manual]

  - name: "test"
    steps:
      - name: "get pwd"
        commands: ["pwd"]
    triggers:
      - branches: [main, dev]
        actions: [manual, pre-push]
"#;

#[test]
fn test_every_pipeline_in_exactly_one_layer() {
    let registry = registry_from_yaml(CONFIG);
    let selected: Vec<String> = vec!["announce".to_string(), "test".to_string()];
    let plan = plan(&selected, &registry);

    let mut seen = std::collections::HashSet::new();
    for name in plan.pipelines() {
        assert!(seen.insert(name.to_string()), "{} appears in two layers", name);
    }
    // announce pulled in upload and both packaging pipelines
    assert_eq!(plan.pipeline_count(), 5);
}

#[test]
fn test_no_pipeline_at_or_below_its_dependencies() {
    let registry = registry_from_yaml(CONFIG);
    let selected: Vec<String> = vec!["announce".to_string()];
    let plan = plan(&selected, &registry);

    for name in plan.pipelines() {
        let layer = plan.layer_of(name).unwrap();
        for dep in &registry.get(name).unwrap().depends_on {
            assert!(layer > plan.layer_of(dep).unwrap());
        }
    }
}

#[test]
fn test_independent_pipelines_share_a_layer() {
    let registry = registry_from_yaml(CONFIG);
    let selected: Vec<String> = vec!["upload".to_string(), "test".to_string()];
    let plan = plan(&selected, &registry);

    // package-deb, package-rpm and test have no dependency relation
    assert_eq!(plan.layer_of("package-deb"), Some(0));
    assert_eq!(plan.layer_of("package-rpm"), Some(0));
    assert_eq!(plan.layer_of("test"), Some(0));
    assert_eq!(plan.layer_of("upload"), Some(1));
}

/// A cyclic configuration is rejected before any command can run
#[tokio::test]
async fn test_cycle_rejected_before_execution() {
    let yaml = r#"
pipelines:
  - name: "a"
    depends_on: ["b"]
    steps:
      - name: "noop"
        commands: ["run-a"]
    triggers:
      - branches: [dev]
        actions: [manual]
  - name: "b"
    depends_on: ["a"]
    steps:
      - name: "noop"
        commands: ["run-b"]
"#;

    let runner = MockRunner::new();
    let calls = runner.call_log();

    let config = Config::from_yaml(yaml).unwrap();
    let err = config.into_registry().unwrap_err();
    assert!(matches!(err, ConfigError::CyclicDependency { .. }));

    // The registry never materialized, so no command was ever executed
    assert!(calls.lock().unwrap().is_empty());
    let _ = runner;
}

/// Identical inputs give identical layer structure and status shape
#[tokio::test]
async fn test_planning_and_execution_are_deterministic() {
    let registry = registry_from_yaml(CONFIG);
    let selected: Vec<String> = vec!["announce".to_string(), "test".to_string()];

    let first = plan(&selected, &registry);
    let second = plan(&selected, &registry);
    assert_eq!(first, second);

    let (report_a, _) = run_scenario(CONFIG, "main", Action::Manual, MockRunner::new()).await;
    let (report_b, _) = run_scenario(CONFIG, "main", Action::Manual, MockRunner::new()).await;

    let shape_a: Vec<(String, bool)> = report_a
        .results
        .iter()
        .map(|r| (r.name.clone(), r.is_succeeded()))
        .collect();
    let shape_b: Vec<(String, bool)> = report_b
        .results
        .iter()
        .map(|r| (r.name.clone(), r.is_succeeded()))
        .collect();
    assert_eq!(shape_a, shape_b);
}
