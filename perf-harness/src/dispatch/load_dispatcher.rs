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

use super::retry_client::RetryingTransactionClient;
use super::work_item::{TransactionOutcome, WorkItem};
use crate::observability::{events, fields::format_millis};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{info, warn};

const COMPONENT: &str = "load_dispatcher";
const WORKER_LOST_DETAIL: &str = "worker lost before reporting an outcome";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IndexedOutcome {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<usize>,
    pub outcome: TransactionOutcome,
}

/// Outcomes of one dispatch, one per work item, ordered by index.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DispatchSummary {
    pub outcomes: Vec<IndexedOutcome>,
    pub elapsed: Duration,
}

impl DispatchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|entry| entry.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &IndexedOutcome> {
        self.outcomes
            .iter()
            .filter(|entry| !entry.outcome.is_success())
    }
}

/// Runs every work item concurrently and waits for all of them.
///
/// The pool defaults to one worker per item; the runtime decides how many
/// actually run in parallel.
pub struct LoadDispatcher {
    client: RetryingTransactionClient,
    pool_size: Option<usize>,
}

impl LoadDispatcher {
    pub fn new(client: RetryingTransactionClient) -> Self {
        Self {
            client,
            pool_size: None,
        }
    }

    pub fn with_pool_size(mut self, pool_size: Option<usize>) -> Self {
        self.pool_size = pool_size.filter(|size| *size > 0);
        self
    }

    pub async fn dispatch(&self, items: Vec<WorkItem>) -> DispatchSummary {
        let started = Instant::now();
        let expected = items.len();
        let pool_size = self.pool_size.unwrap_or(expected).max(1);
        info!(
            event = events::DISPATCH_START,
            component = COMPONENT,
            items = expected,
            pool_size,
            "dispatching transactions"
        );

        let permits = Arc::new(Semaphore::new(pool_size));
        let (outcome_tx, mut outcome_rx) = mpsc::channel(expected.max(1));
        let mut devices = BTreeMap::new();
        let mut workers = JoinSet::new();

        for item in items {
            devices.insert(item.index, item.device);
            let client = self.client.clone();
            let permits = permits.clone();
            let outcome_tx = outcome_tx.clone();
            workers.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let outcome = client.submit(&item).await;
                let _ = outcome_tx
                    .send(IndexedOutcome {
                        index: item.index,
                        device: item.device,
                        outcome,
                    })
                    .await;
            });
        }
        drop(outcome_tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                warn!(
                    event = events::WORKER_LOST,
                    component = COMPONENT,
                    err = %err,
                    "dispatch worker terminated abnormally"
                );
            }
        }

        let mut outcomes = Vec::with_capacity(expected);
        while let Some(entry) = outcome_rx.recv().await {
            devices.remove(&entry.index);
            outcomes.push(entry);
        }
        outcomes.extend(devices.into_iter().map(|(index, device)| IndexedOutcome {
            index,
            device,
            outcome: TransactionOutcome::TransportError(WORKER_LOST_DETAIL.to_string()),
        }));
        outcomes.sort_by_key(|entry| entry.index);

        let summary = DispatchSummary {
            outcomes,
            elapsed: started.elapsed(),
        };
        info!(
            event = events::DISPATCH_DONE,
            component = COMPONENT,
            items = summary.total(),
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            elapsed_ms = format_millis(summary.elapsed),
            "dispatch complete"
        );
        summary
    }
}
