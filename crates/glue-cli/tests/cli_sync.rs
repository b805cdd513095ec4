// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end runs of the `glue` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn glue(config: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("glue").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--config-dir")
        .arg(config.path());
    cmd
}

fn write_doc(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("vm.json");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn sync_reports_crossings_per_pass() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir, r#"{ "Name": "Ann", "Tags": ["a", "b"] }"#);

    glue(&dir)
        .arg("sync")
        .arg(&doc)
        .args(["--passes", "2", "--dump"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "pass 1: visited=5 objects=1 arrays=1 basics=3 enums=0 commands=0 \
             property_wirings=1 array_wirings=1 crossings=7",
        ))
        .stdout(predicate::str::contains("pass 2: visited=0").and(
            predicate::str::contains("crossings=0"),
        ))
        .stdout(predicate::str::contains(r#""Name": "Ann""#));
}

#[test]
fn max_batch_splits_wiring_crossings() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir, r#"[1, 2, 3, 4, 5]"#);

    // 5 basics + 1 array batch + ceil(5 / 2) wiring chunks.
    glue(&dir)
        .arg("sync")
        .arg(&doc)
        .args(["--max-batch", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("crossings=9"));
}

#[test]
fn cyclic_documents_synchronize() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(
        &dir,
        r#"{ "$id": "me", "Self": { "$ref": "me" }, "Mode": { "$enum": "Mode.Edit" }, "Save": { "$command": true } }"#,
    );

    glue(&dir)
        .arg("sync")
        .arg(&doc)
        .arg("--dump")
        .assert()
        .success()
        .stdout(predicate::str::contains("enums=1 commands=1"))
        .stdout(predicate::str::contains(r#""$ref""#))
        .stdout(predicate::str::contains(r#""$enum": "Mode.Edit""#));
}

#[test]
fn unknown_ref_fails() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir, r#"{ "x": { "$ref": "nowhere" } }"#);

    glue(&dir)
        .arg("sync")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown $ref `nowhere`"));
}

#[test]
fn marker_with_sibling_keys_fails() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir, r#"{ "Save": { "$command": true, "Label": "Save" } }"#);

    glue(&dir)
        .arg("sync")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed `$command` marker"));
}

#[test]
fn saved_prefs_are_shown_and_used() {
    let dir = TempDir::new().unwrap();

    glue(&dir)
        .args(["prefs", "save", "--max-batch", "1"])
        .assert()
        .success();
    glue(&dir)
        .args(["prefs", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""max_batch": 1"#));

    let doc = write_doc(&dir, r#"["a", "b", "c"]"#);
    // 3 basics + 1 array batch + 3 single-entry wiring chunks.
    glue(&dir)
        .arg("sync")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("crossings=7"));
}
