//! dxq-cli library
//!
//! Provides the argument model and Config for programmatic use.

pub mod cli;
pub mod config;

pub use config::Config;

use dxq_shared::BuildInfo;

/// Build details of the `dxq` binary, captured by this crate's build script
#[must_use]
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH"),
        build_date: option_env!("BUILD_DATE"),
        rust_version: option_env!("RUSTC_VERSION"),
    }
}
