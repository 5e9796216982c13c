//! The case and fixture files shipped at the repository root must load

use std::collections::HashSet;
use std::path::PathBuf;

use apitest_harness::spec::{self, CaseFilter};
use apitest_harness::{HarnessConfig, Role, SeedPlan, Step};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

#[test]
fn test_shipped_suites_load() {
    let cases = spec::load_all(&repo_root().join("suites")).unwrap();
    assert_eq!(cases.len(), 43);

    // File-name order puts hello first and jobs last
    assert_eq!(cases[0].key(), "endpoints:hello:GET");
    assert_eq!(cases[1].key(), "endpoints:login:GET");
    assert_eq!(cases.last().unwrap().element, "repopulls/{id}/jobs");

    let keys: HashSet<_> = cases.iter().map(|c| c.key()).collect();
    assert_eq!(keys.len(), cases.len());
    assert!(keys.contains("endpoints:projects/{id}/subprojects:POST (operator)"));
    assert!(keys.contains("endpoints:agents/{id}:PUT (operator, abilities)"));
}

#[test]
fn test_only_anonymous_cases_skip_auth() {
    let cases = spec::load_all(&repo_root().join("suites")).unwrap();
    let anonymous: Vec<_> = cases
        .iter()
        .filter(|c| {
            c.steps
                .iter()
                .any(|s| matches!(s, Step::Request { role: Role::None, .. }))
        })
        .map(|c| c.element.as_str())
        .collect();
    assert_eq!(anonymous, vec!["hello", "login"]);
}

#[test]
fn test_filter_over_shipped_suites() {
    let cases = spec::load_all(&repo_root().join("suites")).unwrap();
    let filter = CaseFilter {
        element: Some("agents".to_string()),
        id: Some("PUT".to_string()),
        ..Default::default()
    };
    assert_eq!(filter.apply(cases).len(), 5);
}

#[test]
fn test_shipped_seed_plan_loads() {
    let plan = SeedPlan::from_file(&repo_root().join("fixtures/seed.yaml")).unwrap();
    assert_eq!(plan.users.len(), 4);
    assert_eq!(plan.projects.len(), 3);
    assert_eq!(plan.subprojects.len(), 4);
    assert_eq!(plan.pulls.len(), 5);
    assert_eq!(plan.len(), 32);

    // Subprojects point at the second seeded project by its assigned ID
    assert_eq!(plan.projects[1].id, Some(2));
    assert!(plan.subprojects[0].body.contains(r#""project_id": 2"#));
}

#[test]
fn test_sample_config_loads() {
    let config = HarnessConfig::load(&repo_root().join("apitest.toml")).unwrap();
    assert_eq!(config.base_url, "http://sut:3005");
    assert_eq!(config.tokens.len(), Role::all().len() - 1);
    for role in Role::all().iter().filter(|r| r.is_authenticated()) {
        assert!(config.tokens.resolve(*role).unwrap().is_some());
    }
}
