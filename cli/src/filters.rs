use indexmap::IndexMap;

use cyclecloud::models::Node;

use crate::errors::AutoscaleError;
use crate::partition::Partition;

/// Statuses a node passes through while the cluster manager is still acting
/// on it. Applying configuration changes underneath one of these risks
/// leaving Slurm and the cluster disagreeing about the node.
const MID_LIFECYCLE: [&str; 3] = ["Started", "Deallocated", "Terminating"];

/// Refuse to apply changes while any autoscale-managed node is
/// mid-transition. Nodes that are off (or have no status yet) are fine, and
/// nodes outside autoscale management - the scheduler's own HA node in
/// particular - are ignored.
pub fn check_apply_changes(nodes: &[Node]) -> Result<(), AutoscaleError> {
    for node in nodes {
        if !node.configuration.slurm.autoscale {
            continue;
        }
        let Some(status) = node.status.as_deref() else {
            continue;
        };
        if MID_LIFECYCLE.contains(&status) {
            return Err(AutoscaleError::NodeMidLifecycle {
                node: node.name.clone(),
            });
        }
    }
    Ok(())
}

/// Narrow nodes and partitions down to the requested nodearrays.
///
/// A partition survives only when its name is both requested and fetched; a
/// node survives only when it is autoscale-managed and its nodearray owns a
/// surviving partition. Returning both together keeps callers from acting
/// on a node whose partition was filtered out.
pub fn filter_by_nodearrays(
    nodes: Vec<Node>,
    partitions: IndexMap<String, Partition>,
    requested: &[String],
) -> (Vec<Node>, IndexMap<String, Partition>) {
    let partitions: IndexMap<String, Partition> = partitions
        .into_iter()
        .filter(|(name, _)| requested.iter().any(|requested_name| requested_name == name))
        .collect();

    let nodes = nodes
        .into_iter()
        .filter(|node| {
            node.configuration.slurm.autoscale
                && node.template.as_deref().is_some_and(|template| {
                    partitions
                        .values()
                        .any(|partition| partition.nodearray == template)
                })
        })
        .collect();

    (nodes, partitions)
}
