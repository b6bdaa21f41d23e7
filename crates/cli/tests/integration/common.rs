//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Two stores whose build writes one page into `out`.
pub const TWO_STORES: &str = r#"
skip_install = true
build_command = "mkdir out && touch out/index.html"

[[stores]]
name = "nike-store"
[stores.config]
A = "1"

[[stores]]
name = "adidas-store"
[stores.config]
B = "2"
"#;

/// Isolated test environment.
///
/// Each test gets its own storefront project with a static profile, and a
/// batch file at the project root.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  /// Create a project with the given batch file content.
  pub fn with_batch(batch: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("stores.toml");
    let env = Self { temp, config_path };

    env.write_file("package.json", r#"{"name":"shop","private":true}"#);
    env.write_file("next.config.js", "module.exports = {}");
    env.write_file("src/app/page.tsx", "export default function Page() {}");
    env.write_file("node_modules/react/index.js", "module.exports = {}");
    env.write_file("utils/static/package.json", r#"{"name":"shop","private":true}"#);
    env.write_file("utils/static/next.config.js", "module.exports = { output: 'export' }");
    env.write_file("stores.toml", batch);
    env
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Root of the generated store trees.
  pub fn output_path(&self) -> PathBuf {
    let p = self.temp.path().join("staticfiles");
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Get a Command for the storegen binary with logging pinned to info.
  pub fn storegen_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("storegen");
    cmd.current_dir(self.temp.path());
    cmd.env("RUST_LOG", "info");
    cmd
  }
}
