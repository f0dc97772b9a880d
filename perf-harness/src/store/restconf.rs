/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use super::{
    AsyncQueues, DeviceInventory, EventStream, EventSubscription, StoreError, StoreService,
    TraceSettings, TransactionPayload,
};
use async_trait::async_trait;
use chrono::SecondsFormat;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const YANG_JSON: &str = "application/yang-data+json";
const EVENT_STREAM: &str = "text/event-stream";
const TRACE_PATH: &str = "/data?unhide=debug";
const DEVICE_NAMES_PATH: &str = "/data?fields=tailf-ncs:devices/device(name)";
const GLOBAL_QUEUE_PATH: &str = "/data/tailf-ncs:devices/global-settings/commit-queue";
const DEVICE_QUEUES_PATH: &str =
    "/data/tailf-ncs:devices?fields=device/commit-queue(enabled-by-default)";

/// How the store should treat the commit queue for submitted transactions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitQueueMode {
    /// Leave the decision to the store's global or per-device setting.
    #[default]
    None,
    Async,
    Sync,
    Bypass,
}

impl CommitQueueMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Async => "async",
            Self::Sync => "sync",
            Self::Bypass => "bypass",
        }
    }

    fn query(self) -> String {
        match self {
            Self::None => String::new(),
            mode => format!("?commit-queue={}", mode.as_str()),
        }
    }
}

impl fmt::Display for CommitQueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitQueueMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "async" => Ok(Self::Async),
            "sync" => Ok(Self::Sync),
            "bypass" => Ok(Self::Bypass),
            other => Err(format!(
                "unknown commit-queue mode '{other}', expected none, async, sync or bypass"
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RestconfSettings {
    /// RESTCONF root, e.g. `http://localhost:8080/restconf`.
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Notification stream carrying commit-queue events.
    pub stream: String,
    pub commit_queue: CommitQueueMode,
    /// Applies to writes, not to the long-lived notification stream.
    pub request_timeout: Duration,
}

/// [`StoreService`] over RESTCONF with JSON bodies.
pub struct RestconfStore {
    client: Client,
    settings: RestconfSettings,
}

impl RestconfStore {
    pub fn new(settings: RestconfSettings) -> Result<Self, StoreError> {
        let client = Client::builder()
            .connect_timeout(settings.request_timeout)
            .build()
            .map_err(|err| StoreError::Transport {
                transient: false,
                detail: err.to_string(),
            })?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &RestconfSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.settings.username, Some(&self.settings.password))
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Response, StoreError> {
        let url = self.url(path);
        debug!(method = "PATCH", url = %url, "sending RESTCONF request");
        self.authorized(self.client.patch(url))
            .timeout(self.settings.request_timeout)
            .header(CONTENT_TYPE, YANG_JSON)
            .header(ACCEPT, YANG_JSON)
            .body(body.to_string())
            .send()
            .await
            .map_err(|err| StoreError::classify_reqwest(&err))
    }

    /// `None` when the store has nothing configured at `path`.
    async fn get_json(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let url = self.url(path);
        debug!(method = "GET", url = %url, "sending RESTCONF request");
        let response = self
            .authorized(self.client.get(url))
            .timeout(self.settings.request_timeout)
            .header(ACCEPT, YANG_JSON)
            .send()
            .await
            .map_err(|err| StoreError::classify_reqwest(&err))?;
        if matches!(response.status().as_u16(), 204 | 404) {
            return Ok(None);
        }
        let response = Self::expect_success(response).await?;
        let body = response
            .text()
            .await
            .map_err(|err| StoreError::classify_reqwest(&err))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|err| StoreError::Decode(err.to_string()))
    }

    async fn expect_success(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

pub(crate) fn trace_payload(settings: &TraceSettings) -> Value {
    let mut trace = json!({
        "name": settings.name,
        "destination": {
            "file": settings.destination_file,
            "format": "csv",
        },
        "enabled": true,
    });
    if let Some(context) = &settings.context_filter {
        trace["filter"] = json!({ "context": context });
    }
    json!({ "tailf-progress:progress": { "trace": [trace] } })
}

pub(crate) fn trace_disable_payload(name: &str) -> Value {
    json!({
        "tailf-progress:progress": {
            "trace": [{ "name": name, "enabled": false }]
        }
    })
}

fn device_list(devices: &Value) -> &[Value] {
    devices["tailf-ncs:devices"]["device"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// A `sync` setting anywhere in the commit-queue config keeps the queue
/// from running asynchronously.
fn mentions_sync(value: &Value) -> bool {
    match value {
        Value::String(text) => text == "sync",
        Value::Array(items) => items.iter().any(mentions_sync),
        Value::Object(members) => members
            .iter()
            .any(|(key, member)| key == "sync" || mentions_sync(member)),
        _ => false,
    }
}

pub(crate) fn global_async_queues(global: &Value) -> Option<AsyncQueues> {
    if mentions_sync(global) {
        return Some(AsyncQueues::Disabled);
    }
    let enabled = global["tailf-ncs:commit-queue"]["enabled-by-default"].as_bool();
    (enabled == Some(true)).then_some(AsyncQueues::All)
}

pub(crate) fn per_device_async_queues(devices: &Value) -> AsyncQueues {
    let enabled = device_list(devices)
        .iter()
        .filter(|device| device["commit-queue"]["enabled-by-default"].as_bool() == Some(true))
        .count();
    if enabled == 0 {
        AsyncQueues::Disabled
    } else {
        AsyncQueues::Devices(enabled)
    }
}

#[async_trait]
impl StoreService for RestconfStore {
    async fn submit(&self, payload: &TransactionPayload) -> Result<u16, StoreError> {
        let path = format!("/data{}", self.settings.commit_queue.query());
        let response = self.patch(&path, &payload.body).await?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status, body = %body, "transaction rejected");
        }
        Ok(status)
    }

    async fn enable_trace(&self, settings: &TraceSettings) -> Result<(), StoreError> {
        let response = self.patch(TRACE_PATH, &trace_payload(settings)).await?;
        Self::expect_success(response).await.map(drop)
    }

    async fn disable_trace(&self, name: &str) -> Result<(), StoreError> {
        let response = self.patch(TRACE_PATH, &trace_disable_payload(name)).await?;
        Self::expect_success(response).await.map(drop)
    }

    async fn subscribe(&self, subscription: &EventSubscription) -> Result<EventStream, StoreError> {
        let start_time = subscription
            .start_time
            .to_rfc3339_opts(SecondsFormat::Micros, true);
        let url = self.url(&format!(
            "/streams/{}/json?start-time={start_time}",
            self.settings.stream
        ));
        debug!(method = "GET", url = %url, "opening notification stream");

        let response = self
            .authorized(self.client.get(url))
            .header(ACCEPT, EVENT_STREAM)
            .send()
            .await
            .map_err(|err| StoreError::classify_reqwest(&err))?;
        let response = Self::expect_success(response).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|err| StoreError::classify_reqwest(&err))
            })
            .boxed())
    }

    async fn discover(&self) -> Result<DeviceInventory, StoreError> {
        let devices = self
            .get_json(DEVICE_NAMES_PATH)
            .await?
            .map_or(0, |data| device_list(&data["ietf-restconf:data"]).len());

        let global = self.get_json(GLOBAL_QUEUE_PATH).await?.unwrap_or_default();
        let async_queues = match global_async_queues(&global) {
            Some(queues) => queues,
            None => self
                .get_json(DEVICE_QUEUES_PATH)
                .await?
                .map_or(AsyncQueues::Disabled, |data| per_device_async_queues(&data)),
        };

        debug!(devices, async_queues = ?async_queues, "read device inventory");
        Ok(DeviceInventory {
            devices,
            async_queues,
        })
    }
}
