// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::Result;
use indexmap::IndexMap;

use cyclecloud::ClusterApi;
use cyclecloud::models::{
    BucketDefinition, NodeAttributes, NodeCreationRequest, NodeCreationSet,
};

use crate::errors::AutoscaleError;
use crate::partition::Partition;
use crate::scontrol::Scontrol;

/// What to do when requested capacity overlaps nodes that already exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistingNodePolicy {
    /// Abort the whole invocation before anything is created.
    #[default]
    Error,
    /// Count existing nodes toward each batch and request only the shortfall.
    AllowExisting,
}

#[derive(Debug, Clone, PartialEq)]
struct Batch {
    count: i64,
    name_format: String,
    /// Generated-name prefix used to attribute existing nodes to this batch.
    member_prefix: String,
    placement_group_id: Option<String>,
}

/// Split a partition's total capacity into creation batches.
///
/// HPC partitions get consecutive placement groups of at most
/// `max_scaleset_size` nodes, the last one taking the remainder; other
/// partitions get a single unplaced batch. A partition with no capacity
/// yields no batches.
fn plan_batches(partition: &Partition) -> Vec<Batch> {
    let prefix = &partition.node_name_prefix;
    if partition.max_vm_count <= 0 {
        return Vec::new();
    }
    if !partition.is_hpc {
        return vec![Batch {
            count: partition.max_vm_count,
            name_format: format!("{prefix}{}-%d", partition.nodearray),
            member_prefix: format!("{prefix}{}-", partition.nodearray),
            placement_group_id: None,
        }];
    }

    let mut batches = Vec::new();
    let mut remaining = partition.max_vm_count;
    let mut index = 0usize;
    while remaining > 0 {
        let count = remaining.min(partition.max_scaleset_size);
        batches.push(Batch {
            count,
            name_format: format!("{prefix}{}-pg{index}-%d", partition.nodearray),
            member_prefix: format!("{prefix}{}-pg{index}-", partition.nodearray),
            placement_group_id: Some(partition.placement_group_id(index)),
        });
        remaining -= count;
        index += 1;
    }
    batches
}

fn existing_members(batch: &Batch, current: &[String]) -> i64 {
    current
        .iter()
        .filter(|name| {
            name.strip_prefix(&batch.member_prefix)
                .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        })
        .count() as i64
}

/// Request creation of every node the partitions can hold.
///
/// All partitions are planned before anything is submitted, so an
/// existing-node conflict under [`ExistingNodePolicy::Error`] aborts the
/// invocation without any partial creation. Name offsets continue past
/// existing members so generated names never collide. A response that adds
/// fewer nodes than requested is logged, not raised - capacity shortfall is
/// normal for an autoscaler.
pub fn create_nodes(
    partitions: &IndexMap<String, Partition>,
    api: &dyn ClusterApi,
    scontrol: &dyn Scontrol,
    policy: ExistingNodePolicy,
) -> Result<()> {
    let mut planned: Vec<(&str, NodeCreationRequest)> = Vec::new();
    for partition in partitions.values() {
        let current = match &partition.node_list {
            Some(expr) => scontrol.expand(expr)?,
            None => Vec::new(),
        };

        let mut sets = Vec::new();
        for batch in plan_batches(partition) {
            let existing = existing_members(&batch, &current);
            if existing > 0 && policy == ExistingNodePolicy::Error {
                return Err(AutoscaleError::ExistingNodeConflict {
                    partition: partition.name.clone(),
                }
                .into());
            }
            let count = batch.count - existing;
            if count <= 0 {
                continue;
            }
            sets.push(NodeCreationSet {
                count,
                name_format: batch.name_format,
                name_offset: 1 + existing,
                definition: BucketDefinition {
                    machine_type: partition.machine_type.clone(),
                },
                node_attributes: NodeAttributes {
                    start_automatically: false,
                    fixed: true,
                },
                nodearray: partition.nodearray.clone(),
                placement_group_id: batch.placement_group_id,
            });
        }
        if !sets.is_empty() {
            planned.push((partition.name.as_str(), NodeCreationRequest { sets }));
        }
    }

    for (partition_name, request) in planned {
        let requested: i64 = request.sets.iter().map(|set| set.count).sum();
        let result = api.create_nodes(&request)?;
        for (set, outcome) in request.sets.iter().zip(result.sets.iter()) {
            if outcome.added != set.count {
                log::warn!(
                    "requested {} nodes for {} but {} were added",
                    set.count,
                    set.name_format,
                    outcome.added
                );
            }
        }
        log::info!(
            "requested {} nodes in {} sets for partition {}",
            requested,
            request.sets.len(),
            partition_name
        );
    }
    Ok(())
}

/// Start the named nodes and register their addresses with Slurm.
///
/// Nodes the cluster manager has not yet assigned an address are skipped
/// with a warning; the next resume call picks them up.
pub fn resume(names: &[String], api: &dyn ClusterApi, scontrol: &dyn Scontrol) -> Result<()> {
    let result = api.start_nodes(names)?;
    let nodes = api.get_nodes(result.operation_id.as_deref())?;
    for node in &nodes {
        match node.private_ip.as_deref() {
            Some(addr) => scontrol.update_node_addr(&node.name, addr)?,
            None => log::warn!(
                "node {} has no private address yet, skipping scontrol update",
                node.name
            ),
        }
    }
    Ok(())
}
