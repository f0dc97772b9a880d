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


//! In-process store double for harness integration tests.
//!
//! Successful submissions append `start`/`stop` rows to the trace file named
//! in the last `enable_trace` call and publish one commit-queue completion per
//! configured device on the notification stream.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use perf_harness::store::{
    DeviceInventory, EventStream, EventSubscription, StoreError, StoreService, TraceSettings,
    TransactionPayload,
};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Barrier};

pub(crate) const TRACE_HEADER: &str =
    "EVENT TYPE,TIMESTAMP,DURATION,SESSION ID,TRANSACTION ID,DATASTORE,MESSAGE,TRACE ID\n";
pub(crate) const COMMIT_QUEUE_SUBJECT: &str = "tailf-ncs:service-commit-queue-event";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum StoreCall {
    Discover,
    EnableTrace(String),
    DisableTrace(String),
    Subscribe,
    Submit(usize),
}

#[derive(Default)]
pub(crate) struct MockStoreBuilder {
    phases: Vec<(String, f64)>,
    rejected: HashSet<usize>,
    barrier: Option<Arc<Barrier>>,
    flush_delay: Option<Duration>,
    completion_spacing: Option<Duration>,
    inventory: DeviceInventory,
    fail_enable: bool,
    fail_subscribe: bool,
    fail_discover: bool,
}

impl MockStoreBuilder {
    /// Phase durations written for every accepted transaction; the first
    /// phase encloses the others.
    pub(crate) fn phases(mut self, phases: &[(&str, f64)]) -> Self {
        self.phases = phases
            .iter()
            .map(|(phase, seconds)| (phase.to_string(), *seconds))
            .collect();
        self
    }

    pub(crate) fn reject(mut self, item_id: usize) -> Self {
        self.rejected.insert(item_id);
        self
    }

    /// Holds every submission until `parties` submissions are in flight.
    pub(crate) fn overlap(mut self, parties: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    pub(crate) fn flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = Some(delay);
        self
    }

    /// Publishes completions from a background task, `spacing` apart, after
    /// the submission has been answered.
    pub(crate) fn completion_spacing(mut self, spacing: Duration) -> Self {
        self.completion_spacing = Some(spacing);
        self
    }

    pub(crate) fn inventory(mut self, inventory: DeviceInventory) -> Self {
        self.inventory = inventory;
        self
    }

    pub(crate) fn fail_discover(mut self) -> Self {
        self.fail_discover = true;
        self
    }

    pub(crate) fn fail_enable(mut self) -> Self {
        self.fail_enable = true;
        self
    }

    pub(crate) fn fail_subscribe(mut self) -> Self {
        self.fail_subscribe = true;
        self
    }

    pub(crate) fn build(self, log_dir: &Path) -> Arc<MockStore> {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        Arc::new(MockStore {
            log_dir: log_dir.to_path_buf(),
            config: self,
            calls: Mutex::new(Vec::new()),
            trace_file: Mutex::new(None),
            frames_tx,
            frames_rx: Mutex::new(Some(frames_rx)),
        })
    }
}

pub(crate) struct MockStore {
    log_dir: PathBuf,
    config: MockStoreBuilder,
    calls: Mutex<Vec<StoreCall>>,
    trace_file: Mutex<Option<PathBuf>>,
    frames_tx: mpsc::UnboundedSender<Result<Vec<u8>, StoreError>>,
    frames_rx: Mutex<Option<mpsc::UnboundedReceiver<Result<Vec<u8>, StoreError>>>>,
}

impl MockStore {
    pub(crate) fn builder() -> MockStoreBuilder {
        MockStoreBuilder::default()
    }

    pub(crate) fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn submissions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Submit(_)))
            .count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn trace_rows(&self, item_id: usize) -> String {
        let Some(((root, root_seconds), nested)) = self.config.phases.split_first() else {
            return String::new();
        };
        let trace_id = format!("trace-{item_id:04}");
        let row = |event: &str, seconds: Option<f64>, phase: &str| {
            format!(
                "{event},2024-05-01T10:00:00.000000,{},{item_id},{item_id},running,{phase},{trace_id}\n",
                seconds.map(|value| value.to_string()).unwrap_or_default()
            )
        };

        let mut rows = row("start", None, root);
        rows.push_str(&row("info", None, "entering transaction"));
        for (phase, seconds) in nested {
            rows.push_str(&row("start", None, phase));
            rows.push_str(&row("stop", Some(*seconds), phase));
        }
        rows.push_str(&row("stop", Some(*root_seconds), root));
        rows
    }

    fn append_rows(path: &Path, rows: &str) {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .expect("open trace file");
        file.write_all(rows.as_bytes()).expect("append trace rows");
    }

    fn completion_frame(item_id: usize) -> Vec<u8> {
        format!(
            "data: {{\"ietf-restconf:notification\":{{\"{COMMIT_QUEUE_SUBJECT}\":{{\"service\":\"/t3:t3s/t3[id='{item_id}']\",\"status\":\"completed\"}}}}}}\n\n"
        )
        .into_bytes()
    }
}

/// Ids of the configured list entries; a batch carries one per device.
pub(crate) fn entry_ids(payload: &TransactionPayload) -> Vec<usize> {
    payload.body["t3:t3s"]["t3"]
        .as_array()
        .expect("payload carries a list")
        .iter()
        .map(|entry| {
            entry["id"]
                .as_str()
                .and_then(|id| id.parse().ok())
                .expect("payload carries a numeric id")
        })
        .collect()
}

pub(crate) fn item_id(payload: &TransactionPayload) -> usize {
    entry_ids(payload)[0]
}

#[async_trait]
impl StoreService for MockStore {
    async fn submit(&self, payload: &TransactionPayload) -> Result<u16, StoreError> {
        let item_id = item_id(payload);
        self.record(StoreCall::Submit(item_id));

        if let Some(barrier) = &self.config.barrier {
            barrier.wait().await;
        }
        if self.config.rejected.contains(&item_id) {
            return Ok(409);
        }

        let trace_file = self.trace_file.lock().expect("trace lock").clone();
        if let Some(path) = trace_file {
            let rows = self.trace_rows(item_id);
            match self.config.flush_delay {
                Some(delay) => {
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        Self::append_rows(&path, &rows);
                    });
                }
                None => Self::append_rows(&path, &rows),
            }
        }

        let frames: Vec<_> = entry_ids(payload)
            .into_iter()
            .map(Self::completion_frame)
            .collect();
        match self.config.completion_spacing {
            Some(spacing) => {
                let frames_tx = self.frames_tx.clone();
                tokio::spawn(async move {
                    for frame in frames {
                        tokio::time::sleep(spacing).await;
                        let _ = frames_tx.send(Ok(frame));
                    }
                });
            }
            None => {
                for frame in frames {
                    let _ = self.frames_tx.send(Ok(frame));
                }
            }
        }
        Ok(201)
    }

    async fn enable_trace(&self, settings: &TraceSettings) -> Result<(), StoreError> {
        self.record(StoreCall::EnableTrace(settings.name.clone()));
        if self.config.fail_enable {
            return Err(StoreError::Rejected {
                status: 400,
                body: "unknown trace destination".to_string(),
            });
        }
        let path = self.log_dir.join(&settings.destination_file);
        Self::append_rows(&path, TRACE_HEADER);
        *self.trace_file.lock().expect("trace lock") = Some(path);
        Ok(())
    }

    async fn disable_trace(&self, name: &str) -> Result<(), StoreError> {
        self.record(StoreCall::DisableTrace(name.to_string()));
        *self.trace_file.lock().expect("trace lock") = None;
        Ok(())
    }

    async fn subscribe(
        &self,
        _subscription: &EventSubscription,
    ) -> Result<EventStream, StoreError> {
        self.record(StoreCall::Subscribe);
        if self.config.fail_subscribe {
            return Err(StoreError::transient("stream endpoint unreachable"));
        }
        let mut frames = self
            .frames_rx
            .lock()
            .expect("frames lock")
            .take()
            .ok_or_else(|| StoreError::Decode("already subscribed".to_string()))?;
        Ok(futures::stream::poll_fn(move |cx| frames.poll_recv(cx)).boxed())
    }

    async fn discover(&self) -> Result<DeviceInventory, StoreError> {
        self.record(StoreCall::Discover);
        if self.config.fail_discover {
            return Err(StoreError::Rejected {
                status: 401,
                body: "access denied".to_string(),
            });
        }
        Ok(self.config.inventory)
    }
}
