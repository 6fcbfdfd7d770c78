use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const DIAMOND: &str = r#"
fn test(cond: int) -> int {
let x: int
entry:
  $branch cond bb1 bb2
bb1:
  x = $copy 1
  $jump bb3
bb2:
  x = $copy 2
  $jump bb3
bb3:
  $ret x
}

fn other() -> int {
entry:
  $ret 0
}
"#;

fn lir_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

fn lirflow() -> Command {
    Command::cargo_bin("lirflow").unwrap()
}

#[test]
fn test_reaching_definitions_default() {
    let file = lir_file(DIAMOND);
    lirflow()
        .arg(file.path())
        .arg("unused.json")
        .assert()
        .success()
        .stdout("bb3.term -> {bb1.0, bb2.0}\n");
}

#[test]
fn test_empty_function_name_means_test() {
    let file = lir_file(DIAMOND);
    lirflow()
        .arg(file.path())
        .arg("unused.json")
        .arg("")
        .assert()
        .success()
        .stdout("bb3.term -> {bb1.0, bb2.0}\n");
}

#[test]
fn test_dominance_frontiers() {
    let file = lir_file(DIAMOND);
    lirflow()
        .arg(file.path())
        .arg("unused.json")
        .args(["--analysis", "dom"])
        .assert()
        .success()
        .stdout("bb1 -> {bb3}\nbb2 -> {bb3}\nbb3 -> {}\nentry -> {}\n");
}

#[test]
fn test_named_function() {
    let file = lir_file(DIAMOND);
    lirflow()
        .arg(file.path())
        .arg("unused.json")
        .arg("other")
        .args(["--analysis", "dominators"])
        .assert()
        .success()
        .stdout("entry -> {entry}\n");
}

#[test]
fn test_json_output() {
    let file = lir_file(DIAMOND);
    lirflow()
        .arg(file.path())
        .arg("unused.json")
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bb3.term\""));
}

#[test]
fn test_too_few_arguments() {
    let file = lir_file(DIAMOND);
    lirflow()
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_missing_file() {
    lirflow()
        .arg("/nonexistent/input.lir")
        .arg("unused.json")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_unknown_function() {
    let file = lir_file(DIAMOND);
    lirflow()
        .arg(file.path())
        .arg("unused.json")
        .arg("missing")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Function not found: missing"));
}

#[test]
fn test_help_exits_cleanly() {
    lirflow().arg("--help").assert().success();
}
