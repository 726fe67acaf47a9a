// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;

use cyclecloud::ClusterApi;
use crate::scontrol::Scontrol;

/// Placement grouping is disabled by pinning the scaleset limit far above any
/// real partition size.
pub const MAX_SCALESET_SIZE_SENTINEL: i64 = 1 << 31;

/// One Slurm partition derived from a nodearray's reported capacity.
///
/// Rebuilt from live cluster status on every fetch and never persisted.
/// `node_list` is computed during the fetch; the struct is not mutated
/// afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Partition {
    pub name: String,
    pub nodearray: String,
    pub node_name_prefix: String,
    pub machine_type: String,
    pub is_default: bool,
    pub is_hpc: bool,
    pub max_scaleset_size: i64,
    pub vcpu_count: i32,
    pub pcpu_count: Option<i32>,
    pub gpu_count: i32,
    /// Reported memory in GiB.
    pub memory: f64,
    pub max_vm_count: i64,
    /// Fraction of reported memory held back from Slurm.
    pub dampen_memory: f64,
    pub use_pcpu: bool,
    /// Compact hostlist of the partition's current nodes, if any exist.
    pub node_list: Option<String>,
}

impl Partition {
    pub fn cpu_count(&self) -> i32 {
        if self.use_pcpu {
            self.pcpu_count.unwrap_or(self.vcpu_count)
        } else {
            self.vcpu_count
        }
    }

    pub fn placement_group_count(&self) -> i64 {
        if !self.is_hpc {
            return 1;
        }
        (self.max_vm_count as u64).div_ceil(self.max_scaleset_size as u64) as i64
    }

    pub fn placement_group_id(&self, index: usize) -> String {
        format!("{}-{}-pg{}", self.nodearray, self.machine_type, index)
    }
}

/// Build the partition mapping from live cluster status.
///
/// Nodearrays opt in with `Configuration.slurm.autoscale = true`; everything
/// else is ignored. Iteration order follows the status payload, and on a
/// partition-name collision the first nodearray wins - later ones are
/// dropped with a warning.
pub fn fetch_partitions(
    api: &dyn ClusterApi,
    scontrol: &dyn Scontrol,
) -> Result<IndexMap<String, Partition>> {
    let status = api.get_cluster_status()?;
    let nodes = api.get_nodes(None)?;

    let mut partitions: IndexMap<String, Partition> = IndexMap::new();
    for nodearray_status in &status.nodearrays {
        let slurm = &nodearray_status.nodearray.configuration.slurm;
        if !slurm.autoscale {
            continue;
        }
        let Some(bucket) = nodearray_status.buckets.first() else {
            log::warn!(
                "nodearray {} reports no capacity bucket, skipping",
                nodearray_status.name
            );
            continue;
        };

        let name = slurm
            .partition_name
            .clone()
            .unwrap_or_else(|| nodearray_status.name.clone());
        if partitions.contains_key(&name) {
            log::warn!(
                "partition {} already defined, ignoring nodearray {}",
                name,
                nodearray_status.name
            );
            continue;
        }

        let max_scaleset_size = if slurm.hpc {
            nodearray_status
                .nodearray
                .azure
                .and_then(|azure| azure.max_scaleset_size)
                .filter(|size| *size > 0)
                .unwrap_or(MAX_SCALESET_SIZE_SENTINEL)
        } else {
            MAX_SCALESET_SIZE_SENTINEL
        };

        let owned_names: Vec<String> = nodes
            .iter()
            .filter(|node| node.template.as_deref() == Some(nodearray_status.name.as_str()))
            .map(|node| node.name.clone())
            .collect();
        let node_list = if owned_names.is_empty() {
            None
        } else {
            Some(scontrol.compress(&owned_names)?)
        };

        let vm = &bucket.virtual_machine;
        partitions.insert(
            name.clone(),
            Partition {
                name,
                nodearray: nodearray_status.name.clone(),
                node_name_prefix: slurm.node_prefix.clone().unwrap_or_default(),
                machine_type: bucket.definition.machine_type.clone(),
                is_default: slurm.default_partition,
                is_hpc: slurm.hpc,
                max_scaleset_size,
                vcpu_count: vm.vcpu_count,
                pcpu_count: vm.pcpu_count,
                gpu_count: vm.gpu_count,
                memory: vm.memory,
                max_vm_count: bucket.max_count,
                dampen_memory: slurm.dampen_memory.map_or(0.05, |pct| pct / 100.0),
                use_pcpu: slurm.use_pcpu,
                node_list,
            },
        );
    }
    Ok(partitions)
}
