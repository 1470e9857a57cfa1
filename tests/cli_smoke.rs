use assert_cmd::prelude::*;
use mockito::{Matcher, Mock, Server, ServerGuard};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const ENV_VARS: [&str; 8] = [
    "ADO_ORG_URL",
    "ADO_PAT",
    "FILTER_SINCE_DAYS",
    "FILTER_SINCE_ISO",
    "FILTER_CREATED_ONLY",
    "EXCLUDE_NON_CODE",
    "NON_CODE_LANGS",
    "RATE_DELAY",
];

fn langtally() -> Command {
    let mut cmd = Command::cargo_bin("langtally").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env("RUST_LOG", "info");
    cmd
}

fn scan(server: &ServerGuard, out: &Path) -> Command {
    let mut cmd = langtally();
    cmd.args(["scan", "--org-url", &server.url(), "--pat", "test-token", "--out"])
        .arg(out);
    cmd
}

fn json_mock(server: &mut ServerGuard, path: &str, body: serde_json::Value) -> Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create()
}

fn tenant_fixture(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        json_mock(
            server,
            "/_apis/projects",
            serde_json::json!({ "value": [{ "id": "p1", "name": "P" }] }),
        ),
        json_mock(
            server,
            "/p1/_apis/git/repositories",
            serde_json::json!({ "value": [
                { "id": "r1", "name": "R", "defaultBranch": "refs/heads/main" },
                { "id": "r2", "name": "Bare" }
            ]}),
        ),
    ]
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn classify_prints_languages() {
    let out = langtally()
        .args(["classify", "src/app/main.py", "README", "archive.tar.gz"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "src/app/main.py\tPython\nREADME\tOther\narchive.tar.gz\tOther\n"
    );
}

#[test]
fn missing_credentials_exit_with_status_two() {
    let dir = tempdir().unwrap();
    let output = langtally()
        .args(["scan", "--org-url", "https://dev.azure.com/acme", "--out"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ADO_PAT"));
    assert!(!dir.path().join("repo_language_stats.csv").exists());
}

#[test]
fn scan_writes_repo_and_tenant_csvs() {
    let mut server = Server::new();
    let _tenant = tenant_fixture(&mut server);
    let items = server
        .mock("GET", "/p1/_apis/git/repositories/r1/items")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("recursionLevel".into(), "Full".into()),
            Matcher::UrlEncoded("versionDescriptor.version".into(), "main".into()),
        ]))
        .match_header("authorization", "Basic OnRlc3QtdG9rZW4=")
        .with_status(200)
        .with_body(
            serde_json::json!({ "value": [
                { "path": "/", "isFolder": true, "gitObjectType": "tree" },
                { "path": "/a.py", "gitObjectType": "blob", "size": 100 },
                { "path": "/b.md", "gitObjectType": "blob", "size": 50 }
            ]})
            .to_string(),
        )
        .create();

    let dir = tempdir().unwrap();
    let stdout = scan(&server, dir.path())
        .arg("--exclude-non-code")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    items.assert();

    assert_eq!(
        read(dir.path().join("repo_language_stats.csv")),
        "project,repository,default_branch,language,bytes\n\
         P,R,refs/heads/main,Python,100\n\
         P,R,refs/heads/main,Markdown,50\n\
         P,Bare,,,0\n"
    );
    assert_eq!(
        read(dir.path().join("tenant_language_summary.csv")),
        "language,bytes,percent_all_files\n\
         Python,100,66.67\n\
         Markdown,50,33.33\n"
    );

    let stdout = String::from_utf8(stdout).unwrap();
    assert!(stdout.contains("Python          100.00%"));
    assert!(!stdout.contains("Markdown "));
}

#[test]
fn failing_repository_is_skipped() {
    let mut server = Server::new();
    let _tenant = tenant_fixture(&mut server);
    let _items = server
        .mock("GET", "/p1/_apis/git/repositories/r1/items")
        .match_query(Matcher::Any)
        .with_status(500)
        .create();

    let dir = tempdir().unwrap();
    let output = scan(&server, dir.path()).output().unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error scanning P/R"));
    assert_eq!(
        read(dir.path().join("repo_language_stats.csv")),
        "project,repository,default_branch,language,bytes\nP,Bare,,,0\n"
    );
    assert_eq!(
        read(dir.path().join("tenant_language_summary.csv")),
        "language,bytes,percent_all_files\n"
    );
}

#[test]
fn continuation_header_fetches_next_page() {
    let mut server = Server::new();
    let _tenant = tenant_fixture(&mut server);
    let first = server
        .mock("GET", "/p1/_apis/git/repositories/r1/items")
        .match_query(Matcher::Regex("api-version=[^&]*$".into()))
        .with_status(200)
        .with_header("x-ms-continuationtoken", "page2")
        .with_body(r#"{"value":[{"path":"/main.rs","gitObjectType":"blob","size":40}]}"#)
        .create();
    let second = server
        .mock("GET", "/p1/_apis/git/repositories/r1/items")
        .match_query(Matcher::Regex("continuationToken=page2$".into()))
        .with_status(200)
        .with_body(r#"{"value":[{"path":"/lib.rs","gitObjectType":"blob","size":60}]}"#)
        .create();

    let dir = tempdir().unwrap();
    scan(&server, dir.path()).assert().success();
    first.assert();
    second.assert();

    assert_eq!(
        read(dir.path().join("tenant_language_summary.csv")),
        "language,bytes,percent_all_files\nRust,100,100.0\n"
    );
}

fn recency_fixture(server: &mut ServerGuard) -> Vec<Mock> {
    let commits = server
        .mock("GET", "/p1/_apis/git/repositories/r1/commits")
        .match_query(Matcher::UrlEncoded(
            "searchCriteria.fromDate".into(),
            "2024-01-01T00:00:00Z".into(),
        ))
        .with_status(200)
        .with_body(r#"{"value":[{"commitId":"c1"}]}"#)
        .create();
    let changes = json_mock(
        server,
        "/p1/_apis/git/repositories/r1/commits/c1/changes",
        serde_json::json!({ "changes": [
            { "changeType": "add", "item": { "path": "/b.md" } },
            { "changeType": "edit", "item": { "path": "/a.py" } }
        ]}),
    );
    let items = json_mock(
        server,
        "/p1/_apis/git/repositories/r1/items",
        serde_json::json!({ "value": [
            { "path": "/a.py", "gitObjectType": "blob", "size": 100 },
            { "path": "/b.md", "gitObjectType": "blob", "size": 50 },
            { "path": "/c.go", "gitObjectType": "blob", "size": 10 }
        ]}),
    );
    vec![commits, changes, items]
}

const CREATED_ONLY_ROWS: &str = "project,repository,default_branch,language,bytes\n\
                                 P,R,refs/heads/main,Markdown,50\n\
                                 P,Bare,,,0\n";

#[test]
fn recency_filter_limits_counted_files() {
    let mut server = Server::new();
    let _tenant = tenant_fixture(&mut server);
    let _recency = recency_fixture(&mut server);

    let dir = tempdir().unwrap();
    scan(&server, dir.path())
        .args(["--since-iso", "2024-01-01", "--created-only"])
        .assert()
        .success();

    assert_eq!(read(dir.path().join("repo_language_stats.csv")), CREATED_ONLY_ROWS);
}

#[test]
fn environment_supplies_defaults() {
    let mut server = Server::new();
    let _tenant = tenant_fixture(&mut server);
    let _recency = recency_fixture(&mut server);

    let dir = tempdir().unwrap();
    let stdout = scan(&server, dir.path())
        .env("FILTER_SINCE_DAYS", "0")
        .env("FILTER_CREATED_ONLY", "True")
        .env("EXCLUDE_NON_CODE", "1")
        .args(["--since-iso", "2024-01-01"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(read(dir.path().join("repo_language_stats.csv")), CREATED_ONLY_ROWS);
    // only a literal true enables the exclusion
    assert!(String::from_utf8(stdout).unwrap().contains("Markdown        100.00%"));
}

#[test]
fn environment_dates_do_not_conflict() {
    let mut server = Server::new();
    let _tenant = tenant_fixture(&mut server);
    let _recency = recency_fixture(&mut server);

    let dir = tempdir().unwrap();
    scan(&server, dir.path())
        .env("FILTER_SINCE_DAYS", "30")
        .env("FILTER_SINCE_ISO", "2024-01-01")
        .env("FILTER_CREATED_ONLY", "TRUE")
        .assert()
        .success();

    assert_eq!(read(dir.path().join("repo_language_stats.csv")), CREATED_ONLY_ROWS);
}

#[test]
fn json_report_on_stdout() {
    let mut server = Server::new();
    let _tenant = tenant_fixture(&mut server);
    let _items = json_mock(
        &mut server,
        "/p1/_apis/git/repositories/r1/items",
        serde_json::json!({ "value": [{ "path": "/x.ts", "gitObjectType": "blob", "size": 7 }] }),
    );

    let dir = tempdir().unwrap();
    let out = scan(&server, dir.path())
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["version"], 1);
    assert_eq!(v["languages"][0]["language"], "TypeScript");
    assert_eq!(v["languages"][0]["percent_all_files"], 100.0);
    assert_eq!(v["repositories"].as_array().map(|a| a.len()), Some(2));
    assert!(v["skipped"].as_array().map(|a| a.is_empty()).unwrap_or(false));
}
