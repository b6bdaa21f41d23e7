//! storegen-lib: Core logic for storegen
//!
//! This crate turns one storefront project into many static sites, one per
//! store:
//! - `replicate`: copy the source tree with exclusions
//! - `overlay`, `env_file`, `manifest`: make a copy store specific
//! - `runner`: install and build with timeouts and cancellation
//! - `relocate`: move the build output to where it is served from
//! - `generate`: drive a whole batch and report per-store outcomes

pub mod api;
pub mod config;
pub mod consts;
pub mod env_file;
pub mod generate;
pub mod manifest;
pub mod overlay;
pub mod relocate;
pub mod replicate;
pub mod runner;
pub mod store;
