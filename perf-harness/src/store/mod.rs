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

//! The target store as seen by the harness.
//!
//! Only a handful of operations are needed: submitting one transaction,
//! switching the phase trace on and off, subscribing to completion
//! notifications and reading the device inventory.
//! [`RestconfStore`] speaks RESTCONF; tests substitute their own
//! [`StoreService`].

pub mod restconf;

pub use restconf::{CommitQueueMode, RestconfSettings, RestconfStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::Serialize;
use serde_json::Value;
use std::io;

/// Failures reported by a [`StoreService`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The request never completed a round trip.
    #[error("transport error: {detail}")]
    Transport { transient: bool, detail: String },

    /// The store answered with a non-success status.
    #[error("store rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unable to decode store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Transient failures are worth retrying; everything else is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { transient: true, .. })
    }

    pub fn transient(detail: impl Into<String>) -> Self {
        Self::Transport {
            transient: true,
            detail: detail.into(),
        }
    }

    pub fn classify_reqwest(err: &reqwest::Error) -> Self {
        Self::Transport {
            transient: err.is_connect() || err.is_timeout() || has_connection_io_source(err),
            detail: err.to_string(),
        }
    }
}

fn has_connection_io_source(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

/// Body of one write transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionPayload {
    pub body: Value,
}

impl TransactionPayload {
    pub fn new(body: Value) -> Self {
        Self { body }
    }
}

/// Phase trace to install on the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceSettings {
    pub name: String,
    /// File name, relative to the store's log directory.
    pub destination_file: String,
    /// Restricts tracing to one northbound context, e.g. `rest`.
    pub context_filter: Option<String>,
}

/// Notification subscription request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSubscription {
    /// Only notifications newer than this are replayed.
    pub start_time: DateTime<Utc>,
}

/// Devices whose commit queue is on by default, for transactions that leave
/// the choice to the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AsyncQueues {
    #[default]
    Disabled,
    All,
    Devices(usize),
}

/// What the store reports about its managed devices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInventory {
    pub devices: usize,
    pub async_queues: AsyncQueues,
}

/// Raw body chunks as they arrive on the notification stream. Chunk
/// boundaries are arbitrary and may split frames or characters.
pub type EventStream = BoxStream<'static, Result<Vec<u8>, StoreError>>;

#[async_trait]
pub trait StoreService: Send + Sync {
    /// Submits one transaction and returns the response status code.
    ///
    /// Any status is `Ok`; only a failed round trip is an error.
    async fn submit(&self, payload: &TransactionPayload) -> Result<u16, StoreError>;

    async fn enable_trace(&self, settings: &TraceSettings) -> Result<(), StoreError>;

    async fn disable_trace(&self, name: &str) -> Result<(), StoreError>;

    async fn subscribe(&self, subscription: &EventSubscription) -> Result<EventStream, StoreError>;

    /// Counts the managed devices and reads their default commit-queue
    /// setting.
    async fn discover(&self) -> Result<DeviceInventory, StoreError>;
}
