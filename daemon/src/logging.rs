// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

/// Installs the process-wide `tracing` subscriber (SPEC_FULL §10): plain
/// formatted output, filtered by `RUST_LOG` with an `info`-level default,
/// mirroring `forest_cli_shared::logger::setup_logger` building a filter
/// from `RUST_LOG` rather than a `log`-crate `LevelFilter` table.
pub fn setup() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
