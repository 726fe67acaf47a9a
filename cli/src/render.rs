// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::Result;
use indexmap::IndexMap;
use std::io::Write;

use cyclecloud::ClusterApi;

use crate::errors::AutoscaleError;
use crate::partition::Partition;
use crate::scontrol::Scontrol;

/// Nodename stanzas cover at most this many hosts each, so the generated
/// ranges stay short and diffs stay readable.
const NODENAME_CHUNK: usize = 3;

fn dampened_memory_mb(partition: &Partition) -> (i64, i64) {
    let memory_mb = (partition.memory * 1024.0).floor() as i64;
    let margin = ((memory_mb as f64) * partition.dampen_memory).floor() as i64;
    let margin = margin.max(1024);
    (memory_mb, margin)
}

/// Write the partition and node definitions for slurm.conf.
///
/// The advertised RealMemory is dampened by the greater of 1 GiB or the
/// partition's `dampen_memory` fraction; nodes that report less memory than
/// slurm.conf declares are rejected by Slurm, so the declared value has to
/// sit below what the VM actually reports.
pub fn generate_slurm_conf(
    partitions: &IndexMap<String, Partition>,
    writer: &mut dyn Write,
    scontrol: &dyn Scontrol,
) -> Result<()> {
    for partition in partitions.values() {
        let (memory_mb, margin) = dampened_memory_mb(partition);
        let real_memory = memory_mb - margin;
        let cpus = partition.cpu_count() as i64;
        let threads_per_core = if partition.use_pcpu { 2 } else { 1 };
        let dampen_pct = (partition.dampen_memory * 100.0).round() as i64;

        writeln!(
            writer,
            "# Note: CycleCloud reported a RealMemory of {memory_mb} but we reduced it by {margin} (i.e. max(1gb, {dampen_pct}%)) to account for OS/VM overhead which"
        )?;
        writeln!(
            writer,
            "# would result in the nodes being rejected by Slurm if they report a number less than defined here."
        )?;
        writeln!(
            writer,
            "# To pick a different percentage to dampen, set slurm.dampen_memory=X in the nodearray's Configuration where X is percentage (5 = 5%)."
        )?;
        writeln!(
            writer,
            "PartitionName={} Nodes={} Default={} DefMemPerCPU={} MaxTime=INFINITE State=UP",
            partition.name,
            partition.node_list.as_deref().unwrap_or(""),
            if partition.is_default { "YES" } else { "NO" },
            real_memory / cpus,
        )?;

        let Some(node_list) = partition.node_list.as_deref() else {
            continue;
        };
        let hostnames = scontrol.expand(node_list)?;
        for chunk in hostnames.chunks(NODENAME_CHUNK) {
            let range = scontrol.compress(chunk)?;
            writeln!(
                writer,
                "Nodename={range} Feature=cloud state=CLOUD CPUs={cpus} ThreadsPerCore={threads_per_core} RealMemory={real_memory}"
            )?;
        }
    }
    Ok(())
}

/// Write the switch definitions for topology.conf.
///
/// Each placement group becomes a switch; nodes outside any placement group
/// fall back to a per-nodearray switch. Groups appear in first-seen order.
pub fn generate_topology(
    api: &dyn ClusterApi,
    writer: &mut dyn Write,
    scontrol: &dyn Scontrol,
) -> Result<()> {
    let nodes = api.get_nodes(None)?;

    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for node in &nodes {
        if !node.configuration.slurm.autoscale {
            continue;
        }
        let switch = match (&node.placement_group_id, &node.template) {
            (Some(placement_group_id), _) => placement_group_id.clone(),
            (None, Some(template)) => template.clone(),
            // nodes predating template tracking only carry their generated
            // name, which embeds the nodearray
            (None, None) => match node.name.rsplit_once('-') {
                Some((nodearray, _)) => nodearray.to_string(),
                None => node.name.clone(),
            },
        };
        groups.entry(switch).or_default().push(node.name.clone());
    }

    if groups.is_empty() {
        return Err(AutoscaleError::EmptyTopology.into());
    }

    for (switch, members) in &groups {
        let range = scontrol.compress(members)?;
        writeln!(writer, "SwitchName={switch} Nodes={range}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCluster, MockScontrol, partition};
    use serde_json::json;

    #[test]
    fn slurm_conf_matches_the_expected_layout() {
        let mut partitions = IndexMap::new();

        let mut hpc = partition("hpc");
        hpc.name = "custom_partition_name".to_string();
        hpc.is_default = true;
        hpc.vcpu_count = 4;
        hpc.pcpu_count = Some(2);
        hpc.memory = 128.0;
        hpc.dampen_memory = 0.02;
        hpc.use_pcpu = true;
        hpc.node_list = Some("hpc-10[1-8]".to_string());
        partitions.insert("hpc".to_string(), hpc);

        let mut htc = partition("htc");
        htc.is_hpc = false;
        htc.max_scaleset_size = 100;
        htc.node_name_prefix = "pre-".to_string();
        htc.vcpu_count = 2;
        htc.pcpu_count = Some(1);
        htc.memory = 3.5;
        htc.node_list = Some("pre-htc-[1-8]".to_string());
        partitions.insert("htc".to_string(), htc);

        let scontrol = MockScontrol::new();
        scontrol.expect_expand(
            "hpc-10[1-8]",
            "hpc-101 hpc-102 hpc-103 hpc-104 hpc-105 hpc-106 hpc-107 hpc-108",
        );
        scontrol.expect_compress("hpc-101,hpc-102,hpc-103", "hpc-10[1-3]");
        scontrol.expect_compress("hpc-104,hpc-105,hpc-106", "hpc-10[4-6]");
        scontrol.expect_compress("hpc-107,hpc-108", "hpc-10[7-8]");
        scontrol.expect_expand(
            "pre-htc-[1-8]",
            "pre-htc-1 pre-htc-2 pre-htc-3 pre-htc-4 pre-htc-5 pre-htc-6 pre-htc-7 pre-htc-8",
        );
        scontrol.expect_compress(
            "pre-htc-1,pre-htc-2,pre-htc-3,pre-htc-4,pre-htc-5,pre-htc-6,pre-htc-7,pre-htc-8",
            "pre-htc-[1-8]",
        );

        let mut out = Vec::new();
        generate_slurm_conf(&partitions, &mut out, &scontrol).unwrap();
        scontrol.verify();

        let expected = "\
# Note: CycleCloud reported a RealMemory of 131072 but we reduced it by 2621 (i.e. max(1gb, 2%)) to account for OS/VM overhead which
# would result in the nodes being rejected by Slurm if they report a number less than defined here.
# To pick a different percentage to dampen, set slurm.dampen_memory=X in the nodearray's Configuration where X is percentage (5 = 5%).
PartitionName=custom_partition_name Nodes=hpc-10[1-8] Default=YES DefMemPerCPU=64225 MaxTime=INFINITE State=UP
Nodename=hpc-10[1-3] Feature=cloud state=CLOUD CPUs=2 ThreadsPerCore=2 RealMemory=128450
Nodename=hpc-10[4-6] Feature=cloud state=CLOUD CPUs=2 ThreadsPerCore=2 RealMemory=128450
Nodename=hpc-10[7-8] Feature=cloud state=CLOUD CPUs=2 ThreadsPerCore=2 RealMemory=128450
# Note: CycleCloud reported a RealMemory of 3584 but we reduced it by 1024 (i.e. max(1gb, 5%)) to account for OS/VM overhead which
# would result in the nodes being rejected by Slurm if they report a number less than defined here.
# To pick a different percentage to dampen, set slurm.dampen_memory=X in the nodearray's Configuration where X is percentage (5 = 5%).
PartitionName=htc Nodes=pre-htc-[1-8] Default=NO DefMemPerCPU=1280 MaxTime=INFINITE State=UP
Nodename=pre-htc-[1-8] Feature=cloud state=CLOUD CPUs=2 ThreadsPerCore=1 RealMemory=2560
";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn empty_partition_emits_only_the_partition_line() {
        let mut partitions = IndexMap::new();
        partitions.insert("hpc".to_string(), partition("hpc"));

        let scontrol = MockScontrol::new();
        let mut out = Vec::new();
        generate_slurm_conf(&partitions, &mut out, &scontrol).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("PartitionName=hpc Nodes= Default=NO"));
        assert!(!text.contains("Nodename="));
    }

    fn topology_nodes() -> Vec<cyclecloud::models::Node> {
        let mut nodes = Vec::new();
        for pg in 0..3 {
            let members = if pg == 2 { 2 } else { 3 };
            for i in 1..=members {
                nodes.push(json!({
                    "Name": format!("hpc-pg{pg}-{i}"),
                    "Template": "hpc",
                    "PlacementGroupId": format!("hpc-Standard_D2_v2-pg{pg}"),
                    "Configuration": {"slurm": {"autoscale": true}}
                }));
            }
        }
        for i in 1..=8 {
            nodes.push(json!({
                "Name": format!("htc-{i}"),
                "Template": "htc",
                "Configuration": {"slurm": {"autoscale": true}}
            }));
        }
        serde_json::from_value(serde_json::Value::Array(nodes)).unwrap()
    }

    #[test]
    fn topology_groups_by_placement_group_then_nodearray() {
        let api = MockCluster::new();
        *api.nodes.borrow_mut() = topology_nodes();

        let scontrol = MockScontrol::new();
        scontrol.expect_compress("hpc-pg0-1,hpc-pg0-2,hpc-pg0-3", "hpc-pg0-[1-3]");
        scontrol.expect_compress("hpc-pg1-1,hpc-pg1-2,hpc-pg1-3", "hpc-pg1-[1-3]");
        scontrol.expect_compress("hpc-pg2-1,hpc-pg2-2", "hpc-pg2-[1-2]");
        scontrol.expect_compress(
            "htc-1,htc-2,htc-3,htc-4,htc-5,htc-6,htc-7,htc-8",
            "htc-[1-8]",
        );

        let mut out = Vec::new();
        generate_topology(&api, &mut out, &scontrol).unwrap();
        scontrol.verify();

        let expected = "\
SwitchName=hpc-Standard_D2_v2-pg0 Nodes=hpc-pg0-[1-3]
SwitchName=hpc-Standard_D2_v2-pg1 Nodes=hpc-pg1-[1-3]
SwitchName=hpc-Standard_D2_v2-pg2 Nodes=hpc-pg2-[1-2]
SwitchName=htc Nodes=htc-[1-8]
";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn topology_without_nodes_is_an_error() {
        let api = MockCluster::new();
        let scontrol = MockScontrol::new();

        let mut out = Vec::new();
        let err = generate_topology(&api, &mut out, &scontrol).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AutoscaleError>(),
            Some(&AutoscaleError::EmptyTopology)
        );
    }

    #[test]
    fn topology_skips_nodes_without_autoscale() {
        let api = MockCluster::new();
        *api.nodes.borrow_mut() = serde_json::from_value(json!([
            {"Name": "scheduler", "Template": "scheduler-ha",
             "Configuration": {"slurm": {"autoscale": false}}}
        ]))
        .unwrap();
        let scontrol = MockScontrol::new();

        let mut out = Vec::new();
        let err = generate_topology(&api, &mut out, &scontrol).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AutoscaleError>(),
            Some(&AutoscaleError::EmptyTopology)
        );
    }
}
