// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::str::FromStr;

/// Reads and parses `key` from the environment.
///
/// Returns `None` when the variable is unset. A value that fails to parse,
/// or that `accept` rejects, is logged and also yields `None`, so callers
/// can fall back to their default.
pub fn env_parse<T>(key: &str, accept: impl FnOnce(&T) -> bool) -> Option<T>
where
    T: FromStr + std::fmt::Display,
{
    let v = std::env::var(key).ok()?;
    match v.parse::<T>() {
        Ok(parsed) if accept(&parsed) => {
            tracing::info!("Using {parsed} set by {key}");
            Some(parsed)
        }
        _ => {
            tracing::warn!("Invalid {key} value {v}. Falling back to the default.");
            None
        }
    }
}
