use assert_cmd::cargo::CommandCargoExt;
use std::fs;
use std::process::Command;

const OFFENDING_SOURCE: &str = r#"
fn patch_users(r: &Repository, users: Vec<User>) {
    for user in users {
        r.db.Model(&user).Updates(&user);
    }
}
"#;

const CLEAN_SOURCE: &str = r#"
fn load_all(db: &Db, users: &Vec<User>) {
    db.Find(users);
}
"#;

fn nplusone() -> Command {
    Command::cargo_bin("nplusone").unwrap()
}

#[test]
fn analyze_exits_nonzero_and_prints_findings() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("repo.rs"), OFFENDING_SOURCE).unwrap();

    let output = nplusone()
        .arg("analyze")
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("repo.rs:4:"));
    assert!(stdout
        .contains("Potential N+1 query detected: DB query called directly inside a loop"));
}

#[test]
fn analyze_exits_zero_on_clean_code() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("repo.rs"), CLEAN_SOURCE).unwrap();

    let output = nplusone()
        .arg("analyze")
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[test]
fn json_format_emits_machine_readable_findings() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("repo.rs"), OFFENDING_SOURCE).unwrap();

    let output = nplusone()
        .arg("analyze")
        .arg(dir.path())
        .args(["--format", "json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let findings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let findings = findings.as_array().unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["line"], 4);
    assert!(findings[0]["file"].as_str().unwrap().ends_with("repo.rs"));
}

#[test]
fn ignore_patterns_silence_matching_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("repo.rs"), OFFENDING_SOURCE).unwrap();

    let output = nplusone()
        .arg("analyze")
        .arg(dir.path())
        .args(["--ignore", "repo.rs"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[test]
fn ignored_files_are_still_reachable_through_the_call_graph() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("generated.rs"),
        r#"
struct Repository {
    db: Db,
}

impl Repository {
    fn TouchUser(&self, user: &User) {
        self.db.Model(user).Updates(user);
    }
}
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("usecase.rs"),
        r#"
fn run(repo: &Repository, users: Vec<User>) {
    for user in users {
        repo.TouchUser(&user);
    }
}
"#,
    )
    .unwrap();

    let output = nplusone()
        .arg("analyze")
        .arg(dir.path())
        .args(["--ignore", "generated.rs"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("usecase.rs:4:"));
    assert!(stdout
        .contains("call to generated.TouchUser may lead to DB query inside loop"));
}

#[test]
fn init_writes_a_config_file_once() {
    let dir = tempfile::tempdir().unwrap();

    let first = nplusone()
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(first.status.code(), Some(0));
    assert!(dir.path().join(".nplusone.toml").is_file());

    let second = nplusone()
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_ne!(second.status.code(), Some(0));

    let forced = nplusone()
        .arg("init")
        .arg("--force")
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(forced.status.code(), Some(0));
}

#[test]
fn config_file_overrides_the_query_method_roster() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".nplusone.toml"),
        r#"query_methods = ["fetch_all"]
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("repo.rs"),
        r#"
fn run(store: &Store, users: Vec<User>) {
    for user in users {
        store.fetch_all(&user);
    }
}
"#,
    )
    .unwrap();

    let output = nplusone()
        .arg("analyze")
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("DB query called directly inside a loop"));
}
