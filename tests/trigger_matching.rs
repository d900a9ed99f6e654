//! Test: trigger matching - branch AND action, OR across entries

mod helpers;

use helpers::*;
use stagehand::core::event::{match_event, Action, Event};

const CONFIG: &str = r#"
pipelines:
  - name: "test"
    steps:
      - name: "get pwd"
        commands: ["pwd"]
    triggers:
      - branches: [dev]
        actions: [pre-push, manual]

  - name: "deploy"
    steps:
      - name: "ship"
        commands: ["./deploy.sh"]
    triggers:
      - branches: [main]
        actions: [pre-push]
      - branches: [main, staging]
        actions: [manual]

  - name: "upload"
    depends_on: ["test"]
    steps:
      - name: "upload"
        commands: ["rsync logs host:/srv"]
"#;

#[tokio::test]
async fn test_branch_and_action_must_both_match() {
    let registry = registry_from_yaml(CONFIG);

    let selected = match_event(&Event::new("dev", Action::Manual), &registry);
    assert_eq!(selected, vec!["test"]);

    let selected = match_event(&Event::new("dev", Action::PrePush), &registry);
    assert_eq!(selected, vec!["test"]);

    // Same action, wrong branch
    let selected = match_event(&Event::new("main", Action::Manual), &registry);
    assert_eq!(selected, vec!["deploy"]);

    // Same branch, wrong action
    let selected = match_event(&Event::new("dev", Action::PostCommit), &registry);
    assert!(selected.is_empty());
}

#[tokio::test]
async fn test_any_entry_matches() {
    let registry = registry_from_yaml(CONFIG);

    // "deploy" matches through its first entry on (main, pre-push) and
    // through its second on (staging, manual)
    for event in [
        Event::new("main", Action::PrePush),
        Event::new("staging", Action::Manual),
    ] {
        let selected = match_event(&event, &registry);
        assert_eq!(selected, vec!["deploy"]);
    }

    // But not across entries: branch from one entry, action from the other
    let selected = match_event(&Event::new("staging", Action::PrePush), &registry);
    assert!(selected.is_empty());
}

#[tokio::test]
async fn test_match_is_pure() {
    let registry = registry_from_yaml(CONFIG);
    let event = Event::new("dev", Action::Manual);

    let first = match_event(&event, &registry);
    for _ in 0..10 {
        assert_eq!(match_event(&event, &registry), first);
    }
}

/// An unmatched event executes nothing at all
#[tokio::test]
async fn test_no_match_runs_no_commands() {
    let (report, calls) =
        run_scenario(CONFIG, "feature/thing", Action::Manual, MockRunner::new()).await;

    assert!(report.results.is_empty());
    assert!(calls.is_empty());
}

/// A matched pipeline pulls its trigger-less dependency into the run
#[tokio::test]
async fn test_dependency_of_matched_pipeline_runs() {
    // "upload" has no triggers itself, so it only appears when selected
    // through a dependent; here nothing depends on it and it stays out
    let (report, _) = run_scenario(CONFIG, "dev", Action::Manual, MockRunner::new()).await;
    assert!(report.result("upload").is_none());
    assert_pipeline_succeeded(&report, "test");
}
