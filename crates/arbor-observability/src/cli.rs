// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-arbor-dispatch` and `--debug-all`.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Crates whose logs are raised to debug level
///
/// # Example
/// ```rust
/// use arbor_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-arbor-worker".to_string()]);
/// assert!(flags.is_enabled("arbor-worker"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Looks for arguments matching `--debug-{crate-name}` or `--debug-all`
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Adds crates from a comma-separated list such as `ARBOR_DEBUG`; `all` enables every crate
    pub fn extend_from_list(&mut self, list: &str) {
        for crate_name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if crate_name == "all" {
                self.enable_all();
            } else {
                self.enable(crate_name);
            }
        }
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string());
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `tracing::Level::DEBUG` if enabled, `tracing::Level::INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// `EnvFilter` directives: `default_level` plus a debug directive per crate
    ///
    /// Crates log under both their explicit target (`arbor-worker`) and their
    /// module path (`arbor_worker`), so both spellings are emitted.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let mut filters = vec![default_level.to_string()];
        for crate_name in &self.enabled_crates {
            filters.push(format!("{}=debug", crate_name));
            let module = crate_name.replace('-', "_");
            if module != *crate_name {
                filters.push(format!("{}=debug", module));
            }
        }
        filters.join(",")
    }
}

/// Debug flags from the process arguments and the `ARBOR_DEBUG` environment variable
///
/// `ARBOR_DEBUG` holds comma-separated crate names, or `all`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(list) = env::var("ARBOR_DEBUG") {
        flags.extend_from_list(&list);
    }
    flags
}

/// Help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  ARBOR_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  ARBOR_DEBUG=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", ")
    )
}
