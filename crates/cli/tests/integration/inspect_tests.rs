//! Inspect command integration tests.

use predicates::prelude::*;

use super::common::{TWO_STORES, TestEnv};

#[test]
fn inspect_before_generate() {
  let env = TestEnv::with_batch(TWO_STORES);

  env
    .storegen_cmd()
    .arg("inspect")
    .arg(&env.config_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("nike-store: not generated"));
}

#[cfg(unix)]
#[test]
fn inspect_after_generate() {
  let env = TestEnv::with_batch(TWO_STORES);
  env.storegen_cmd().arg("generate").arg(&env.config_path).assert().success();

  env
    .storegen_cmd()
    .arg("inspect")
    .arg(&env.config_path)
    .arg("--verbose")
    .assert()
    .success()
    .stdout(predicate::str::contains("nike-store: static output present"))
    .stdout(predicate::str::contains("A=1"));
}

#[cfg(unix)]
#[test]
fn inspect_json() {
  let env = TestEnv::with_batch(TWO_STORES);
  env
    .storegen_cmd()
    .arg("generate")
    .arg(&env.config_path)
    .args(["--only", "nike-store"])
    .assert()
    .success();

  let output = env
    .storegen_cmd()
    .arg("inspect")
    .arg(&env.config_path)
    .arg("--json")
    .output()
    .unwrap();

  assert!(output.status.success());
  let states: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(states[0]["name"], "nike-store");
  assert_eq!(states[0]["static_exists"], true);
  assert_eq!(states[0]["env"]["A"], "1");
  assert_eq!(states[1]["tree_exists"], false);
  assert!(states[1]["env"].is_null());
}
