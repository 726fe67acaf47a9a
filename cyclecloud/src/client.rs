// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::ClusterApi;
use crate::models::{
    ClusterStatus, Node, NodeCreationRequest, NodeCreationResult, NodeList, NodeManagementResult,
    StartNodesRequest,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to cluster manager failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("cluster manager returned {status} for {path}: {body}")]
    Status {
        status: StatusCode,
        path: String,
        body: String,
    },
}

/// Blocking client for the CycleCloud cluster API.
///
/// One request per call, no retries; timeouts and cancellation are left to
/// the HTTP layer.
pub struct CycleCloudClient {
    http: Client,
    base_url: String,
    cluster_name: String,
    username: String,
    password: String,
}

impl CycleCloudClient {
    pub fn new(
        url: &str,
        cluster_name: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().build()?;
        Ok(CycleCloudClient {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            cluster_name: cluster_name.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/clusters/{}/{}", self.base_url, self.cluster_name, tail)
    }

    fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        log::debug!("cluster api call: {path}");
        let response = builder
            .basic_auth(&self.username, Some(&self.password))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                status,
                path: path.to_string(),
                body,
            });
        }
        Ok(response)
    }
}

impl ClusterApi for CycleCloudClient {
    fn get_cluster_status(&self) -> Result<ClusterStatus, ApiError> {
        let path = self.url("status");
        let response = self.send(self.http.get(path.as_str()), &path)?;
        Ok(response.json()?)
    }

    fn create_nodes(&self, request: &NodeCreationRequest) -> Result<NodeCreationResult, ApiError> {
        let path = self.url("nodes/create");
        let response = self.send(self.http.post(path.as_str()).json(request), &path)?;
        Ok(response.json()?)
    }

    fn start_nodes(&self, names: &[String]) -> Result<NodeManagementResult, ApiError> {
        let path = self.url("nodes/start");
        let request = StartNodesRequest {
            names: names.to_vec(),
        };
        let response = self.send(self.http.post(path.as_str()).json(&request), &path)?;
        Ok(response.json()?)
    }

    fn get_nodes(&self, operation_id: Option<&str>) -> Result<Vec<Node>, ApiError> {
        let path = self.url("nodes");
        let mut builder = self.http.get(path.as_str());
        if let Some(operation_id) = operation_id {
            builder = builder.query(&[("operation", operation_id)]);
        }
        let response = self.send(builder, &path)?;
        let list: NodeList = response.json()?;
        Ok(list.nodes)
    }
}
