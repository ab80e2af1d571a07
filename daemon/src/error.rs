// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::PathBuf;

use thiserror::Error;

/// Configuration-class errors (SPEC_FULL §7): always fatal, always caught at
/// the composition root before any worker is spawned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file at {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("could not parse config file at {0}: {1}")]
    Parse(PathBuf, String),
    #[error("invalid configuration field `{0}`: {1}")]
    Invalid(&'static str, String),
    #[error("could not read or generate signing key at {0}: {1}")]
    Key(PathBuf, String),
}
