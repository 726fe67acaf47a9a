// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod client;
pub mod models;

pub use client::{ApiError, CycleCloudClient};
use models::{ClusterStatus, Node, NodeCreationRequest, NodeCreationResult, NodeManagementResult};

/// The CycleCloud operations this tool needs from a cluster.
///
/// Implemented over HTTP by [`CycleCloudClient`]; test doubles implement it
/// in-memory. Every call is one blocking round trip with no retries.
pub trait ClusterApi {
    fn get_cluster_status(&self) -> Result<ClusterStatus, ApiError>;
    fn create_nodes(&self, request: &NodeCreationRequest) -> Result<NodeCreationResult, ApiError>;
    fn start_nodes(&self, names: &[String]) -> Result<NodeManagementResult, ApiError>;
    fn get_nodes(&self, operation_id: Option<&str>) -> Result<Vec<Node>, ApiError>;
}
