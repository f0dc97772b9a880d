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

use super::work_item::{TransactionOutcome, WorkItem};
use crate::observability::{events, fields::format_millis};
use crate::store::{StoreError, StoreService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const COMPONENT: &str = "retry_client";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(20);

/// Spacing between retries of one item.
///
/// The wait grows with the item's index, so workers failing together come
/// back at different times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }
}

impl RetryPolicy {
    pub fn backoff_for(&self, index: usize) -> Duration {
        let factor = u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX);
        self.backoff_step.saturating_mul(factor)
    }
}

fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Submits one [`WorkItem`], retrying transient transport failures only.
#[derive(Clone)]
pub struct RetryingTransactionClient {
    store: Arc<dyn StoreService>,
    policy: RetryPolicy,
}

impl RetryingTransactionClient {
    pub fn new(store: Arc<dyn StoreService>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn submit(&self, item: &WorkItem) -> TransactionOutcome {
        let max_attempts = item.max_attempts.max(1);
        let device = item.device.map_or(-1, |device| device as i64);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                event = events::SUBMIT_ATTEMPT,
                component = COMPONENT,
                item_index = item.index,
                device,
                attempt,
                max_attempts,
                "submitting transaction"
            );

            let err = match self.store.submit(&item.payload).await {
                Ok(status) if is_success_status(status) => {
                    debug!(
                        event = events::SUBMIT_OK,
                        component = COMPONENT,
                        item_index = item.index,
                        status,
                        attempt,
                        "transaction accepted"
                    );
                    return TransactionOutcome::Success;
                }
                Ok(status) | Err(StoreError::Rejected { status, .. }) => {
                    warn!(
                        event = events::SUBMIT_REJECTED,
                        component = COMPONENT,
                        item_index = item.index,
                        device,
                        status,
                        "transaction rejected"
                    );
                    return TransactionOutcome::HttpFailure(status);
                }
                Err(err) => err,
            };

            if !err.is_transient() {
                warn!(
                    event = events::SUBMIT_FATAL,
                    component = COMPONENT,
                    item_index = item.index,
                    device,
                    err = %err,
                    "transaction failed without retry"
                );
                return TransactionOutcome::TransportError(err.to_string());
            }

            if attempt >= max_attempts {
                warn!(
                    event = events::SUBMIT_EXHAUSTED,
                    component = COMPONENT,
                    item_index = item.index,
                    device,
                    attempt,
                    err = %err,
                    "retries exhausted"
                );
                return TransactionOutcome::TransportError(err.to_string());
            }

            let delay = self.policy.backoff_for(item.index);
            warn!(
                event = events::SUBMIT_RETRY,
                component = COMPONENT,
                item_index = item.index,
                device,
                attempt,
                max_attempts,
                delay_ms = format_millis(delay),
                err = %err,
                "retrying transaction"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RetryPolicy, RetryingTransactionClient};
    use crate::dispatch::work_item::{TransactionOutcome, WorkItem};
    use crate::store::{
        DeviceInventory, EventStream, EventSubscription, StoreError, StoreService, TraceSettings,
        TransactionPayload,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Fails transiently `failures` times, then answers `status`.
    struct FlakyStore {
        failures: u32,
        status: u16,
        calls: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32, status: u16) -> Arc<Self> {
            Arc::new(Self {
                failures,
                status,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StoreService for FlakyStore {
        async fn submit(&self, _payload: &TransactionPayload) -> Result<u16, StoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(StoreError::transient("connection reset by peer"))
            } else {
                Ok(self.status)
            }
        }

        async fn enable_trace(&self, _settings: &TraceSettings) -> Result<(), StoreError> {
            Ok(())
        }

        async fn disable_trace(&self, _name: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn subscribe(
            &self,
            _subscription: &EventSubscription,
        ) -> Result<EventStream, StoreError> {
            Err(StoreError::Decode("no stream".to_string()))
        }

        async fn discover(&self) -> Result<DeviceInventory, StoreError> {
            Ok(DeviceInventory::default())
        }
    }

    fn item(index: usize) -> WorkItem {
        WorkItem {
            index,
            device: Some(0),
            payload: TransactionPayload::new(json!({})),
            max_attempts: 5,
        }
    }

    fn client(store: Arc<FlakyStore>) -> RetryingTransactionClient {
        RetryingTransactionClient::new(
            store,
            RetryPolicy {
                backoff_step: Duration::from_millis(10),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_until_success() {
        let store = FlakyStore::new(2, 201);
        let outcome = client(store.clone()).submit(&item(0)).await;

        assert_eq!(outcome, TransactionOutcome::Success);
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_transport_failure_stops_after_five_attempts() {
        let store = FlakyStore::new(u32::MAX, 200);
        let started = Instant::now();
        let outcome = client(store.clone()).submit(&item(3)).await;

        assert!(matches!(outcome, TransactionOutcome::TransportError(_)));
        assert_eq!(store.calls(), 5);
        // four waits of 40ms, none after the final attempt
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(160));
        assert!(elapsed < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn http_failures_are_never_retried() {
        let store = FlakyStore::new(0, 503);
        let outcome = client(store.clone()).submit(&item(0)).await;

        assert_eq!(outcome, TransactionOutcome::HttpFailure(503));
        assert_eq!(store.calls(), 1);
    }

    #[test]
    fn backoff_is_strictly_increasing_in_index() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (0..4).map(|index| policy.backoff_for(index)).collect();

        assert!(delays.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(!delays[0].is_zero());
    }
}
