// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! In-memory collaborators for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::Result;
use cyclecloud::ClusterApi;
use cyclecloud::client::ApiError;
use cyclecloud::models::{
    ClusterStatus, Node, NodeCreationRequest, NodeCreationResult, NodeCreationResultSet,
    NodeManagementResult,
};

use crate::partition::Partition;
use crate::scontrol::{Scontrol, split_hostnames};

/// Queue-of-expectations double for the scontrol collaborator, one entry per
/// anticipated call in order.
#[derive(Default)]
pub struct MockScontrol {
    expectations: RefCell<VecDeque<(String, String)>>,
    pub updates: RefCell<Vec<(String, String)>>,
}

impl MockScontrol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_compress(&self, joined_names: &str, response: &str) {
        self.expectations
            .borrow_mut()
            .push_back((format!("show hostlist {joined_names}"), response.to_string()));
    }

    pub fn expect_expand(&self, expr: &str, response: &str) {
        self.expectations
            .borrow_mut()
            .push_back((format!("show hostnames {expr}"), response.to_string()));
    }

    fn call(&self, actual: String) -> String {
        let Some((expected, response)) = self.expectations.borrow_mut().pop_front() else {
            panic!("unexpected scontrol call: {actual}");
        };
        assert_eq!(expected, actual);
        response
    }

    pub fn verify(&self) {
        let remaining = self.expectations.borrow();
        assert!(
            remaining.is_empty(),
            "unconsumed scontrol expectations: {remaining:?}"
        );
    }
}

impl Scontrol for MockScontrol {
    fn compress(&self, names: &[String]) -> Result<String> {
        Ok(self.call(format!("show hostlist {}", names.join(","))))
    }

    fn expand(&self, expr: &str) -> Result<Vec<String>> {
        let response = self.call(format!("show hostnames {expr}"));
        Ok(split_hostnames(&response))
    }

    fn update_node_addr(&self, name: &str, addr: &str) -> Result<()> {
        self.updates
            .borrow_mut()
            .push((name.to_string(), addr.to_string()));
        Ok(())
    }
}

/// Records every request and answers from canned state.
#[derive(Default)]
pub struct MockCluster {
    pub status: ClusterStatus,
    pub nodes: RefCell<Vec<Node>>,
    pub created: RefCell<Vec<NodeCreationRequest>>,
    pub started: RefCell<Vec<Vec<String>>>,
    /// Per-set `added` overrides for the next create_nodes call; when empty
    /// every set reports full success.
    pub added_override: RefCell<Option<Vec<i64>>>,
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(status: ClusterStatus) -> Self {
        MockCluster {
            status,
            ..Self::default()
        }
    }
}

impl ClusterApi for MockCluster {
    fn get_cluster_status(&self) -> Result<ClusterStatus, ApiError> {
        Ok(self.status.clone())
    }

    fn create_nodes(&self, request: &NodeCreationRequest) -> Result<NodeCreationResult, ApiError> {
        self.created.borrow_mut().push(request.clone());
        let added = self.added_override.borrow_mut().take();
        let sets = request
            .sets
            .iter()
            .enumerate()
            .map(|(i, set)| NodeCreationResultSet {
                added: added
                    .as_ref()
                    .and_then(|counts| counts.get(i).copied())
                    .unwrap_or(set.count),
            })
            .collect();
        Ok(NodeCreationResult { sets })
    }

    fn start_nodes(&self, names: &[String]) -> Result<NodeManagementResult, ApiError> {
        self.started.borrow_mut().push(names.to_vec());
        Ok(NodeManagementResult {
            operation_id: Some("start-nodes-operation-id".to_string()),
        })
    }

    fn get_nodes(&self, _operation_id: Option<&str>) -> Result<Vec<Node>, ApiError> {
        Ok(self.nodes.borrow().clone())
    }
}

/// A partition with the shape used throughout the original cluster template.
pub fn partition(name: &str) -> Partition {
    Partition {
        name: name.to_string(),
        nodearray: name.to_string(),
        node_name_prefix: String::new(),
        machine_type: "Standard_D2_v2".to_string(),
        is_default: false,
        is_hpc: true,
        max_scaleset_size: 3,
        vcpu_count: 2,
        pcpu_count: Some(2),
        gpu_count: 0,
        memory: 4.0,
        max_vm_count: 8,
        dampen_memory: 0.05,
        use_pcpu: false,
        node_list: None,
    }
}
