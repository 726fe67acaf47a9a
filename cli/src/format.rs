// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use indexmap::IndexMap;

use crate::partition::Partition;

fn str_width(value: &str) -> usize {
    value.chars().count()
}

pub fn format_partitions_table(partitions: &IndexMap<String, Partition>) -> String {
    let headers = ["name", "nodearray", "machine type", "cpus", "memory", "max", "default", "hpc", "nodes"];
    let mut rows: Vec<[String; 9]> = Vec::new();

    for partition in partitions.values() {
        let default_str = match partition.is_default {
            true => "yes",
            false => "no",
        };
        let hpc_str = match partition.is_hpc {
            true => "yes",
            false => "no",
        };
        rows.push([
            partition.name.clone(),
            partition.nodearray.clone(),
            partition.machine_type.clone(),
            partition.cpu_count().to_string(),
            format!("{}g", partition.memory),
            partition.max_vm_count.to_string(),
            default_str.to_string(),
            hpc_str.to_string(),
            partition.node_list.clone().unwrap_or_default(),
        ]);
    }

    let mut widths: [usize; 9] = headers.map(str_width);
    for row in rows.iter() {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(str_width(cell));
        }
    }

    let render_row = |cells: &[&str]| -> String {
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            line.push_str(&format!("{:<width$}", cell, width = widths[i]));
        }
        line.trim_end().to_string()
    };

    let mut output = String::new();
    output.push_str(&render_row(&headers));
    output.push('\n');
    for row in rows.iter() {
        let cells: Vec<&str> = row.iter().map(|cell| cell.as_str()).collect();
        output.push_str(&render_row(&cells));
        output.push('\n');
    }
    output
}
