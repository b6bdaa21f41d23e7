//! Names shared across the pipeline stages.

pub const APP_NAME: &str = "storegen";

/// Default batch file looked up by the CLI.
pub const DEFAULT_BATCH_FILE: &str = "stores.toml";

/// Default directory, relative to the source root, that receives all store trees.
pub const DEFAULT_OUTPUT_DIR: &str = "staticfiles";

/// Environment file written at the root of every replicated tree.
pub const ENV_FILE_NAME: &str = ".env.local";

/// Package manifest patched with the store-specific name.
pub const PACKAGE_MANIFEST: &str = "package.json";

/// Framework configuration file supplied by the static profile.
pub const FRAMEWORK_CONFIG: &str = "next.config.js";

/// Default static profile directory, relative to the source root.
pub const DEFAULT_STATIC_PROFILE: &str = "utils/static";

/// Directory the framework's static export writes into.
pub const BUILD_OUTPUT_DIR: &str = "out";

/// Stable directory the build output is relocated to.
pub const STATIC_OUTPUT_DIR: &str = "static";

/// Environment variable carrying the store name into external commands.
pub const STORE_ENV_VAR: &str = "STOREGEN_STORE";

pub const DEFAULT_INSTALL_COMMAND: &str = "npm install";
pub const DEFAULT_BUILD_COMMAND: &str = "npm run build";

/// Directory names skipped during replication unless overridden.
pub const DEFAULT_EXCLUSIONS: &[&str] = &["node_modules", ".next", ".git", DEFAULT_OUTPUT_DIR, "out", ".vercel"];
