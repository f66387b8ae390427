//! Integration tests for the `tw` CLI commands.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Create a temp directory holding the starter world as `world.json`.
fn test_world() -> TempDir {
    let dir = TempDir::new().unwrap();
    tw().args(["new", "world.json"])
        .current_dir(dir.path())
        .assert()
        .success();
    dir
}

fn tw() -> Command {
    Command::cargo_bin("tw").unwrap()
}

fn tw_in(dir: &TempDir) -> Command {
    let mut cmd = tw();
    cmd.current_dir(dir.path());
    cmd
}

// ---------------------------------------------------------------------------
// new
// ---------------------------------------------------------------------------

#[test]
fn new_creates_world_file() {
    let dir = TempDir::new().unwrap();
    tw_in(&dir)
        .args(["new", "world.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created world file"));

    let content = fs::read_to_string(dir.path().join("world.json")).unwrap();
    assert!(content.contains("\"version\""));
    assert!(content.contains("brass lamp"));
}

#[test]
fn new_refuses_to_overwrite() {
    let dir = test_world();
    tw_in(&dir)
        .args(["new", "world.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    tw_in(&dir)
        .args(["new", "world.json", "--force"])
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// expand
// ---------------------------------------------------------------------------

#[test]
fn expand_without_world_file() {
    let dir = TempDir::new().unwrap();
    tw_in(&dir)
        .args(["expand", "You have {2+2} coins."])
        .assert()
        .success()
        .stdout("You have 4 coins.\n");
}

#[test]
fn expand_left_to_right() {
    let dir = TempDir::new().unwrap();
    tw_in(&dir)
        .args(["expand", "{1+1} and {2+2}"])
        .assert()
        .success()
        .stdout("2 and 4\n");
}

#[test]
fn expand_recovers_from_bad_expression() {
    let dir = TempDir::new().unwrap();
    tw_in(&dir)
        .args(["expand", "{1/0}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid expression"));
}

#[test]
fn expand_uses_world_state() {
    let dir = test_world();
    tw_in(&dir)
        .args(["expand", "{intro}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("You are in the Cellar."))
        .stdout(predicate::str::contains("old apples"));
}

#[test]
fn expand_update_writes_back() {
    let dir = test_world();
    tw_in(&dir)
        .args(["expand", "-u", "{score = 5}Done."])
        .assert()
        .success()
        .stdout("Done.\n");

    tw_in(&dir)
        .args(["eval", "score"])
        .assert()
        .success()
        .stdout("5\n");
}

#[test]
fn expand_without_update_leaves_world_file() {
    let dir = test_world();
    let before = fs::read_to_string(dir.path().join("world.json")).unwrap();
    tw_in(&dir)
        .args(["expand", "{score = 5}"])
        .assert()
        .success();
    let after = fs::read_to_string(dir.path().join("world.json")).unwrap();
    assert_eq!(before, after);
}

// ---------------------------------------------------------------------------
// eval
// ---------------------------------------------------------------------------

#[test]
fn eval_prints_value() {
    let dir = TempDir::new().unwrap();
    tw_in(&dir)
        .args(["eval", "2 * 21"])
        .assert()
        .success()
        .stdout("42\n");
}

#[test]
fn eval_reads_entity_properties() {
    let dir = test_world();
    tw_in(&dir)
        .args(["eval", "brass_lamp.location"])
        .assert()
        .success()
        .stdout("Cellar\n");
}

#[test]
fn eval_syntax_error_shows_diagnostic() {
    let dir = TempDir::new().unwrap();
    tw_in(&dir)
        .args(["eval", "1 + ;"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected character"))
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn eval_runtime_error_fails() {
    let dir = TempDir::new().unwrap();
    tw_in(&dir)
        .args(["eval", "1 / 0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("division by zero"));
}

// ---------------------------------------------------------------------------
// save / restore
// ---------------------------------------------------------------------------

#[test]
fn save_then_restore_round_trip() {
    let dir = test_world();
    tw_in(&dir).args(["eval", "-u", "score = 10"]).assert().success();

    tw_in(&dir)
        .arg("save")
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved game 'game'"));
    assert!(dir.path().join("game.save").exists());

    tw_in(&dir).args(["eval", "-u", "score = 0"]).assert().success();
    tw_in(&dir)
        .arg("restore")
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored game 'game'"));

    tw_in(&dir)
        .args(["eval", "score"])
        .assert()
        .success()
        .stdout("10\n");
}

#[test]
fn restore_keeps_attributes_missing_from_save() {
    let dir = test_world();
    tw_in(&dir).arg("save").assert().success();
    tw_in(&dir).args(["eval", "-u", "hints = 2"]).assert().success();
    tw_in(&dir).arg("restore").assert().success();

    tw_in(&dir)
        .args(["eval", "hints"])
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn save_honours_game_and_save_dir() {
    let dir = test_world();
    tw_in(&dir)
        .args(["--game", "cave", "--save-dir", "saves", "save"])
        .assert()
        .success();
    assert!(dir.path().join("saves/cave.save").exists());

    tw_in(&dir)
        .args(["restore", "-g", "cave", "-s", "saves"])
        .assert()
        .success();
}

#[test]
fn save_without_world_file_fails() {
    let dir = TempDir::new().unwrap();
    tw_in(&dir)
        .arg("save")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read world file"));
}

#[test]
fn restore_without_save_fails() {
    let dir = test_world();
    let before = fs::read_to_string(dir.path().join("world.json")).unwrap();
    tw_in(&dir)
        .arg("restore")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no saved game yet"));
    let after = fs::read_to_string(dir.path().join("world.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn restore_rejects_corrupt_save() {
    let dir = test_world();
    fs::write(dir.path().join("game.save"), "{ not json").unwrap();
    tw_in(&dir)
        .arg("restore")
        .assert()
        .failure()
        .stderr(predicate::str::contains("save file unreadable"));
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

#[test]
fn show_lists_attributes_and_entities() {
    let dir = test_world();
    tw_in(&dir)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("score"))
        .stdout(predicate::str::contains("Cellar"))
        .stdout(predicate::str::contains("brass lamp"))
        .stdout(predicate::str::contains("2 entities"));
}

#[test]
fn show_entity_detail() {
    let dir = test_world();
    tw_in(&dir)
        .args(["show", "Brass Lamp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("location"))
        .stdout(predicate::str::contains("Cellar"));
}

#[test]
fn show_unknown_entity_fails() {
    let dir = test_world();
    tw_in(&dir)
        .args(["show", "dragon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("entity not found"));
}
