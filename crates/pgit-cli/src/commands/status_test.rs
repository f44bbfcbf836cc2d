use super::*;

fn entry(path: &str, current: &str, outcome: PlanOutcome) -> PlannedChange {
    PlannedChange {
        path: path.to_string(),
        current_version: current.to_string(),
        outcome,
    }
}

#[test]
fn render_empty_plan() {
    assert_eq!(render_plan(&[], false), "No schema files found\n");
}

#[test]
fn render_plan_with_sql() {
    let plan = vec![
        entry("a.sql", "1", PlanOutcome::UpToDate),
        entry(
            "users.sql",
            "",
            PlanOutcome::Pending {
                version: "2".to_string(),
                sql: "CREATE TABLE users (id int);\n\nALTER TABLE users ADD c int;\n\n".to_string(),
            },
        ),
    ];

    let out = render_plan(&plan, true);
    assert_eq!(
        out,
        "  a.sql      up to date (1)\n\
         \x20 users.sql  pending - -> 2\n\
         \x20     CREATE TABLE users (id int);\n\
         \x20     \n\
         \x20     ALTER TABLE users ADD c int;\n\
         \n1 of 2 file(s) pending\n"
    );
}

#[test]
fn render_plan_reports_errors() {
    let plan = vec![entry(
        "v.sql",
        "",
        PlanOutcome::Error {
            reason: "no commits found for v.sql".to_string(),
        },
    )];

    let out = render_plan(&plan, false);
    assert!(out.contains("v.sql  error: no commits found for v.sql"), "{out}");
    assert!(out.ends_with("0 of 1 file(s) pending\n"));
}

#[test]
fn plan_serializes_with_status_tag() {
    let plan = vec![entry(
        "users.sql",
        "1",
        PlanOutcome::Pending {
            version: "2".to_string(),
            sql: "SELECT 1;".to_string(),
        },
    )];

    let json: serde_json::Value = serde_json::to_value(&plan).unwrap();
    assert_eq!(json[0]["path"], "users.sql");
    assert_eq!(json[0]["current_version"], "1");
    assert_eq!(json[0]["status"], "pending");
    assert_eq!(json[0]["version"], "2");
}
