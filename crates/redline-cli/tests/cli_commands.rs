use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

use redline_io::docx::DocxBuilder;
use redline_io::extract;

fn fixture(dir: &Path) -> PathBuf {
    let path = dir.join("contract.docx");
    DocxBuilder::new()
        .title("Services Agreement")
        .heading(2, "Delivery")
        .paragraph("The cat sat.")
        .paragraph("Payment is due within thirty days of the invoice date.")
        .write(&path)
        .unwrap();
    path
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn arg(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn outline_prints_an_aligned_table() {
    let dir = tempfile::tempdir().unwrap();
    let doc = fixture(dir.path());

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["outline", arg(&doc)]);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("blockId  level  text\n"))
        .stdout(predicate::str::contains("b00001   1      Services Agreement\n"))
        .stdout(predicate::str::contains("b00002   2      Delivery\n"));
}

#[test]
fn stats_and_read_agree() {
    let dir = tempfile::tempdir().unwrap();
    let doc = fixture(dir.path());

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["stats", arg(&doc)]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"block_count\": 4"))
        .stdout(predicate::str::contains("\"recommended_page_count\": 1"));

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["read", arg(&doc), "0", "--min"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"has_more\":false"));

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["read", arg(&doc), "1"]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn validate_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let doc = fixture(dir.path());
    let ok = write(
        dir.path(),
        "ok.json",
        r#"{"v": 1, "edits": [{"op": "replace", "block_id": "b3", "text": "The dog sat."}]}"#,
    );
    let bad = write(
        dir.path(),
        "bad.json",
        r#"{"v": 1, "edits": [{"op": "delete", "block_id": "b42"}]}"#,
    );

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["validate", arg(&doc), arg(&ok)]);
    cmd.assert().success().code(0).stdout("OK\n");

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["validate", arg(&doc), arg(&bad)]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error[unknown_block_id] edits[0].block_id"));

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path())
        .args(["validate", arg(&doc), arg(&bad), "--diagnostics-json"]);
    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("\"valid\": false"))
        .stdout(predicate::str::contains("\"code\": \"unknown_block_id\""));
}

#[test]
fn strict_mode_and_suppression() {
    let dir = tempfile::tempdir().unwrap();
    let doc = fixture(dir.path());
    let short = write(
        dir.path(),
        "short.json",
        r#"{"v": 1, "edits": [{"op": "replace", "block_id": "b4", "text": "Payment is due."}]}"#,
    );

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["validate", arg(&doc), arg(&short)]);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("warning[large_reduction]"));

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path())
        .args(["validate", arg(&doc), arg(&short), "--strict"]);
    cmd.assert().failure().code(1);

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args([
        "validate",
        arg(&doc),
        arg(&short),
        "--strict",
        "--suppress",
        "large_reduction",
    ]);
    cmd.assert().success();
}

#[test]
fn config_file_supplies_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let doc = fixture(dir.path());
    let short = write(
        dir.path(),
        "short.json",
        r#"{"v": 1, "edits": [{"op": "replace", "block_id": "b4", "text": "Payment is due."}]}"#,
    );
    write(dir.path(), "redline.config.json", r#"{"strict": true}"#);

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["validate", arg(&doc), arg(&short)]);
    cmd.assert().failure().code(1);

    let other = write(dir.path(), "lenient.json", r#"{"suppressChecks": ["large_reduction"]}"#);
    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path())
        .args(["--config", arg(&other), "validate", arg(&doc), arg(&short), "--strict"]);
    cmd.assert().success();
}

#[test]
fn apply_writes_output_and_reports_skips() {
    let dir = tempfile::tempdir().unwrap();
    let doc = fixture(dir.path());
    let out = dir.path().join("out.docx");
    let edits = write(
        dir.path(),
        "edits.json",
        r#"{"v": 1, "source": "a", "edits": [
            {"op": "replace", "block_id": "b3", "text": "The dog sat."},
            {"op": "comment", "block_id": "b9", "text": "Lost."}
        ]}"#,
    );

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args([
        "apply",
        arg(&doc),
        arg(&edits),
        "-o",
        arg(&out),
        "--author-name",
        "Counsel",
        "--date",
        "2026-02-02T10:00:00Z",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"applied\": 1"))
        .stdout(predicate::str::contains("\"reason\": \"target not found\""));

    let model = extract(&out).unwrap();
    assert_eq!(model.resolve("b3").unwrap().text, "The dog sat.");
}

#[test]
fn rejected_apply_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let doc = fixture(dir.path());
    let out = dir.path().join("out.docx");
    let edits = write(
        dir.path(),
        "edits.json",
        r#"{"v": 1, "edits": [{"op": "replace", "block_id": "b4", "text": "Payment..."}]}"#,
    );

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path())
        .args(["apply", arg(&doc), arg(&edits), "-o", arg(&out), "--strict"]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("was not written"));
    assert!(!out.exists());
}

#[test]
fn schema_violations_are_reported_before_anything_else() {
    let dir = tempfile::tempdir().unwrap();
    let doc = fixture(dir.path());
    let edits = write(
        dir.path(),
        "edits.json",
        r#"{"edits": [{"op": "replace", "block_id": "b3", "text": "x", "before": "y"}]}"#,
    );

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["validate", arg(&doc), arg(&edits)]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("does not match schema"));
}

#[test]
fn merge_policies_and_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(
        dir.path(),
        "a.json",
        r#"{"v": 1, "source": "a", "edits": [{"op": "replace", "block_id": "b3", "text": "A."}, {"op": "comment", "block_id": "b3", "text": "From A."}]}"#,
    );
    let b = write(
        dir.path(),
        "b.json",
        r#"{"v": 1, "source": "b", "edits": [{"op": "replace", "block_id": "b00003", "text": "B."}, {"op": "comment", "block_id": "b3", "text": "From B."}]}"#,
    );

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["merge", arg(&a), arg(&b)]);
    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("\"merged\": null"))
        .stderr(predicate::str::contains("policy 'error'"));

    let merged = dir.path().join("merged.md");
    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path())
        .args(["merge", arg(&a), arg(&b), "--policy", "combine", "-o", arg(&merged)]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"kept\": \"a\""));
    let md = fs::read_to_string(&merged).unwrap();
    assert!(md.contains("- **Source**: a+b"), "{md}");
    assert!(md.contains("From A.\n\nFrom B."), "{md}");

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path())
        .args(["merge", arg(&a), arg(&b), "--policy", "last", "--canonical"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""source":"a+b""#))
        .stdout(predicate::str::contains(r#""text":"B.""#));
}

#[test]
fn convert_round_trips_between_syntaxes() {
    let dir = tempfile::tempdir().unwrap();
    let json = write(
        dir.path(),
        "edits.json",
        r#"{"v": 1, "source": "a", "edits": [{"op": "insert", "afterId": "b2", "text": "New | clause."}]}"#,
    );
    let md = dir.path().join("edits.md");
    let back = dir.path().join("back.json");

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["convert", arg(&json), arg(&md)]);
    cmd.assert().success();
    assert!(fs::read_to_string(&md).unwrap().contains("### b2 insertText\nNew | clause."));

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path())
        .args(["convert", arg(&md), arg(&back), "--canonical"]);
    cmd.assert().success();
    assert_eq!(
        fs::read_to_string(&back).unwrap(),
        "{\"edits\":[{\"block_id\":\"b2\",\"op\":\"insert\",\"text\":\"New | clause.\"}],\"source\":\"a\",\"v\":1}\n"
    );
}

#[test]
fn unreadable_package_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write(dir.path(), "broken.docx", "plain text");

    let mut cmd = cargo_bin_cmd!("redline");
    cmd.current_dir(dir.path()).args(["extract", arg(&doc)]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not a zip package"));
}
