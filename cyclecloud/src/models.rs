// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde::{Deserialize, Serialize};

// CLUSTER STATUS

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterStatus {
    #[serde(default)]
    pub nodearrays: Vec<NodearrayStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodearrayStatus {
    pub name: String,
    #[serde(default)]
    pub buckets: Vec<Bucket>,
    /// The nodearray's raw configuration record. CycleCloud reports it with
    /// PascalCase keys, unlike the rest of the status payload.
    #[serde(default)]
    pub nodearray: NodearrayConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodearrayConfig {
    #[serde(rename = "Azure", default)]
    pub azure: Option<AzureSettings>,
    #[serde(rename = "Configuration", default)]
    pub configuration: Configuration,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AzureSettings {
    #[serde(rename = "MaxScalesetSize", default)]
    pub max_scaleset_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub slurm: SlurmSettings,
}

/// The per-nodearray `Configuration.slurm` record.
///
/// All defaulting for absent keys lives here: a nodearray is only managed
/// when `autoscale` is explicitly true, behaves as an HPC partition unless
/// `hpc` says otherwise, and `dampen_memory` is a percentage (5 = 5%).
#[derive(Debug, Clone, Deserialize)]
pub struct SlurmSettings {
    #[serde(default)]
    pub autoscale: bool,
    #[serde(default = "default_hpc")]
    pub hpc: bool,
    #[serde(default)]
    pub default_partition: bool,
    #[serde(default)]
    pub dampen_memory: Option<f64>,
    #[serde(default)]
    pub use_pcpu: bool,
    #[serde(default)]
    pub partition_name: Option<String>,
    #[serde(default)]
    pub node_prefix: Option<String>,
}

impl Default for SlurmSettings {
    fn default() -> Self {
        SlurmSettings {
            autoscale: false,
            hpc: default_hpc(),
            default_partition: false,
            dampen_memory: None,
            use_pcpu: false,
            partition_name: None,
            node_prefix: None,
        }
    }
}

fn default_hpc() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    #[serde(default)]
    pub max_count: i64,
    pub definition: BucketDefinition,
    pub virtual_machine: VirtualMachine,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketDefinition {
    pub machine_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    pub vcpu_count: i32,
    #[serde(default)]
    pub pcpu_count: Option<i32>,
    #[serde(default)]
    pub gpu_count: i32,
    /// Reported memory in GiB.
    pub memory: f64,
}

// NODES

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub placement_group_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub target_state: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub configuration: Configuration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

// NODE CREATION / MANAGEMENT

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeCreationRequest {
    pub sets: Vec<NodeCreationSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCreationSet {
    pub count: i64,
    /// Name pattern with a `%d` placeholder, e.g. `hpc-pg0-%d`.
    pub name_format: String,
    /// First index substituted into `name_format`; continues past existing
    /// members so generated names never collide.
    pub name_offset: i64,
    pub definition: BucketDefinition,
    pub node_attributes: NodeAttributes,
    pub nodearray: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_group_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeAttributes {
    #[serde(rename = "StartAutomatically")]
    pub start_automatically: bool,
    #[serde(rename = "Fixed")]
    pub fixed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeCreationResult {
    #[serde(default)]
    pub sets: Vec<NodeCreationResultSet>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NodeCreationResultSet {
    #[serde(default)]
    pub added: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeManagementResult {
    #[serde(default)]
    pub operation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartNodesRequest {
    pub names: Vec<String>,
}
