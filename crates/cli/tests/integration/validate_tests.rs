//! Validate command integration tests.

use predicates::prelude::*;

use super::common::{TWO_STORES, TestEnv};

#[test]
fn validate_lists_stores() {
  let env = TestEnv::with_batch(TWO_STORES);

  env
    .storegen_cmd()
    .arg("validate")
    .arg(&env.config_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("is valid"))
    .stdout(predicate::str::contains("nike-store"))
    .stdout(predicate::str::contains("adidas-store"));

  assert!(!env.output_path().exists());
}

#[test]
fn validate_rejects_path_like_names() {
  let env = TestEnv::with_batch("[[stores]]\nname = \"../escape\"\n");

  env
    .storegen_cmd()
    .arg("validate")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("single path segment"));
}

#[test]
fn validate_reports_missing_profile() {
  let env = TestEnv::with_batch(TWO_STORES);
  std::fs::remove_file(env.temp.path().join("utils/static/next.config.js")).unwrap();

  env
    .storegen_cmd()
    .arg("validate")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("next.config.js"));
}

#[test]
fn validate_empty_batch() {
  let env = TestEnv::with_batch("");

  env
    .storegen_cmd()
    .arg("validate")
    .arg(&env.config_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("No stores defined"));
}
