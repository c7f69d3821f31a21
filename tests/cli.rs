use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A workspace with an empty config file and a small document tree.
fn workspace() -> TempDir {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("config.toml"), b"");
    write_file(&temp.path().join("docs/notes.txt"), b"cat cat dog");
    write_file(
        &temp.path().join("docs/web/readme.html"),
        b"<html><body><h1>Intro</h1><p>the cat sat</p></body></html>",
    );
    write_file(&temp.path().join("docs/logo.png"), &[0x89, b'P', b'N', b'G']);
    temp
}

fn filescope(temp: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("filescope"));
    cmd.current_dir(temp.path())
        .env("RUST_LOG", "info")
        .arg("--config")
        .arg(temp.path().join("config.toml"))
        .arg("--no-input");
    cmd
}

#[test]
fn run_writes_ranked_csv_and_summary() {
    let temp = workspace();

    filescope(&temp)
        .arg("run")
        .arg("--root")
        .arg(temp.path().join("docs"))
        .arg("--exclude")
        .arg(".png")
        .arg("--term")
        .arg("cat")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total occurrences of 'cat': 3"))
        .stdout(predicate::str::contains("Occurrences of Search String per File"));

    let csv = fs::read_to_string(temp.path().join("search_results.csv")).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "file_name,full_path,file_type,file_size,occurrence_num");
    assert!(lines[1].starts_with("notes,"));
    assert!(lines[1].ends_with(",.txt,11,2"));
    assert!(lines[2].starts_with("readme,"));
    assert!(lines[2].contains(",.html,"));
    assert!(lines[2].ends_with(",1"));
    assert!(temp.path().join("filescope.db").exists());
}

#[test]
fn ingest_then_search_share_the_catalog() {
    let temp = workspace();
    let db = temp.path().join("catalog.db");

    filescope(&temp)
        .arg("--database")
        .arg(&db)
        .arg("ingest")
        .arg("--root")
        .arg(temp.path().join("docs"))
        .arg("--exclude")
        .arg(".png")
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipping file due to filter"));

    filescope(&temp)
        .arg("--database")
        .arg(&db)
        .arg("search")
        .arg("--term")
        .arg("DOG")
        .arg("--csv")
        .arg("dog.csv")
        .arg("--no-chart")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total occurrences of 'DOG': 1"))
        .stdout(predicate::str::contains("Occurrences of Search String").not());

    let csv = fs::read_to_string(temp.path().join("dog.csv")).unwrap();
    assert_eq!(csv.lines().count(), 2);
}

#[test]
fn search_without_matches_writes_no_csv() {
    let temp = workspace();

    filescope(&temp)
        .arg("run")
        .arg("--root")
        .arg(temp.path().join("docs"))
        .arg("--exclude")
        .arg(".png")
        .arg("--term")
        .arg("walrus")
        .assert()
        .success()
        .stderr(predicate::str::contains("No files found with the specified search string."));

    assert!(!temp.path().join("search_results.csv").exists());
}

#[test]
fn missing_term_without_prompting_fails() {
    let temp = workspace();

    filescope(&temp)
        .arg("search")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required value: term"));
}

#[test]
fn unusable_database_path_fails() {
    let temp = workspace();

    filescope(&temp)
        .arg("--database")
        .arg(temp.path().join("no/such/dir/catalog.db"))
        .arg("search")
        .arg("--term")
        .arg("cat")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error connecting to catalog database"));
}
