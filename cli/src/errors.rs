// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::PathBuf;

/// Configuration-level failures callers are expected to branch on.
///
/// Everything here is fatal to the current invocation; partial provisioning
/// is reported as a warning instead, never through this type.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AutoscaleError {
    #[error("{} already exists; rerun with --force to overwrite it", .path.display())]
    ReinitNotForced { path: PathBuf },

    #[error(
        "nodes already exist for partition {partition}; rerun with --allow-existing to fill in the remaining capacity"
    )]
    ExistingNodeConflict { partition: String },

    #[error("no autoscale nodes exist, refusing to generate an empty topology")]
    EmptyTopology,

    #[error("cannot apply changes while a node is mid-lifecycle - {node}")]
    NodeMidLifecycle { node: String },
}
