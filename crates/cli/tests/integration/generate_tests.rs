//! Generate command integration tests.
#![cfg(unix)]

use predicates::prelude::*;

use super::common::{TWO_STORES, TestEnv};

#[test]
fn generate_builds_every_store() {
  let env = TestEnv::with_batch(TWO_STORES);

  env
    .storegen_cmd()
    .arg("generate")
    .arg(&env.config_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Succeeded: 2"))
    .stdout(predicate::str::contains("Failed: 0"));

  let out = env.output_path();
  assert!(out.join("nike-store/static/index.html").is_file());
  assert!(out.join("adidas-store/static/index.html").is_file());
  assert_eq!(std::fs::read_to_string(out.join("nike-store/.env.local")).unwrap(), "A=1");
  assert_eq!(std::fs::read_to_string(out.join("adidas-store/.env.local")).unwrap(), "B=2");
  assert!(!out.join("nike-store/node_modules").exists());
}

#[test]
fn generate_uses_default_batch_file() {
  let env = TestEnv::with_batch(TWO_STORES);

  env.storegen_cmd().arg("generate").assert().success();

  assert!(env.output_path().join("nike-store/static").is_dir());
}

#[test]
fn store_failure_keeps_exit_code_zero() {
  let env = TestEnv::with_batch(&TWO_STORES.replace(
    "mkdir out && touch out/index.html",
    r#"test \"$STOREGEN_STORE\" != nike-store && mkdir out"#,
  ));

  env
    .storegen_cmd()
    .arg("generate")
    .arg(&env.config_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("nike-store failed while building"))
    .stdout(predicate::str::contains("Succeeded: 1"))
    .stderr(predicate::str::contains("failed to generate static site"));

  assert!(env.output_path().join("adidas-store/static").is_dir());
}

#[test]
fn duplicate_store_fails_batch() {
  let env = TestEnv::with_batch(
    r#"
skip_install = true
build_command = "true"

[[stores]]
name = "twin"

[[stores]]
name = "twin"
"#,
  );

  env
    .storegen_cmd()
    .arg("generate")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("more than once"));

  assert!(!env.output_path().exists());
}

#[test]
fn only_restricts_batch() {
  let env = TestEnv::with_batch(TWO_STORES);

  env
    .storegen_cmd()
    .arg("generate")
    .arg(&env.config_path)
    .args(["--only", "adidas-store"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Stores: 1"));

  assert!(!env.output_path().join("nike-store").exists());
  assert!(env.output_path().join("adidas-store/static").is_dir());
}

#[test]
fn only_unknown_store_fails() {
  let env = TestEnv::with_batch(TWO_STORES);

  env
    .storegen_cmd()
    .arg("generate")
    .arg(&env.config_path)
    .args(["--only", "puma-store"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("puma-store"));
}

#[test]
fn output_flag_moves_trees() {
  let env = TestEnv::with_batch(TWO_STORES);
  let target = env.temp.path().join("dist");

  env
    .storegen_cmd()
    .arg("generate")
    .arg(&env.config_path)
    .arg("--output")
    .arg(&target)
    .assert()
    .success();

  assert!(target.join("nike-store/static/index.html").is_file());
  assert!(!env.output_path().exists());
}

#[test]
fn json_report_lists_outcomes_in_order() {
  let env = TestEnv::with_batch(TWO_STORES);

  let output = env
    .storegen_cmd()
    .arg("generate")
    .arg(&env.config_path)
    .args(["--json", "--parallel", "2"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let stores = report["stores"].as_array().unwrap();
  assert_eq!(stores.len(), 2);
  assert_eq!(stores[0]["name"], "nike-store");
  assert_eq!(stores[1]["name"], "adidas-store");
  assert_eq!(stores[0]["outcome"]["status"], "done");
}

#[test]
fn timeout_flag_stops_hung_build() {
  let env = TestEnv::with_batch(&TWO_STORES.replace("mkdir out && touch out/index.html", "sleep 10"));

  env
    .storegen_cmd()
    .arg("generate")
    .arg(&env.config_path)
    .args(["--timeout", "200ms", "--only", "nike-store"])
    .assert()
    .success()
    .stdout(predicate::str::contains("timed out"));
}
