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

//! Units of load and their results.

use crate::store::TransactionPayload;
use serde::Serialize;
use serde_json::{json, Value};

pub const DEFAULT_CONTAINER: &str = "t3:t3s";
pub const DEFAULT_LIST: &str = "t3";

/// One transaction to submit. Owned by exactly one worker.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkItem {
    pub index: usize,
    /// Target device; `None` for a batch covering every device.
    pub device: Option<usize>,
    pub payload: TransactionPayload,
    pub max_attempts: u32,
}

/// Result of one [`WorkItem`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TransactionOutcome {
    Success,
    /// The store answered outside the 2xx range.
    HttpFailure(u16),
    /// No response after exhausting retries, or a non-retryable transport fault.
    TransportError(String),
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Names of the YANG container and list the payload writes into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadTemplate {
    pub container: String,
    pub list: String,
}

impl Default for PayloadTemplate {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
            list: DEFAULT_LIST.to_string(),
        }
    }
}

/// Builds distinct per-item bodies so retries never collide with another
/// item's change.
#[derive(Clone, Debug)]
pub struct PayloadFactory {
    template: PayloadTemplate,
    run_id: String,
}

impl PayloadFactory {
    pub fn new(template: PayloadTemplate, run_id: impl Into<String>) -> Self {
        Self {
            template,
            run_id: run_id.into(),
        }
    }

    fn entry(&self, id: usize) -> Value {
        json!({ "id": id.to_string(), "value": format!("{id}-{}", self.run_id) })
    }

    fn wrap(&self, entries: Vec<Value>) -> TransactionPayload {
        let mut list = serde_json::Map::new();
        list.insert(self.template.list.clone(), Value::Array(entries));
        let mut container = serde_json::Map::new();
        container.insert(self.template.container.clone(), Value::Object(list));
        TransactionPayload::new(Value::Object(container))
    }

    pub fn item(&self, index: usize) -> TransactionPayload {
        self.wrap(vec![self.entry(index)])
    }

    /// One body carrying an entry for every device.
    pub fn batch(&self, devices: usize) -> TransactionPayload {
        self.wrap((0..devices).map(|device| self.entry(device)).collect())
    }
}

/// Shape of the generated load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WorkPlan {
    pub devices: usize,
    /// Zero sends a single transaction covering every device.
    pub transactions_per_device: usize,
}

impl WorkPlan {
    pub fn is_batch(&self) -> bool {
        self.transactions_per_device == 0
    }

    fn device_count(&self) -> usize {
        self.devices.max(1)
    }

    /// Requests sent to the store.
    pub fn request_count(&self) -> usize {
        if self.is_batch() {
            1
        } else {
            self.device_count() * self.transactions_per_device
        }
    }

    /// Transactions the devices end up applying.
    pub fn device_transactions(&self) -> usize {
        if self.is_batch() {
            self.device_count()
        } else {
            self.request_count()
        }
    }

    /// Device transactions carried by `devices` of the targeted devices.
    pub fn device_transactions_on(&self, devices: usize) -> usize {
        let devices = devices.min(self.device_count());
        if self.is_batch() {
            devices
        } else {
            devices * self.transactions_per_device
        }
    }

    /// Device transactions covered by `succeeded` accepted requests. One
    /// accepted batch request covers every device.
    pub fn confirmed_device_transactions(&self, succeeded: usize) -> usize {
        if self.is_batch() && succeeded > 0 {
            self.device_count()
        } else {
            succeeded
        }
    }

    pub fn effective_transactions_per_device(&self) -> usize {
        self.transactions_per_device.max(1)
    }

    pub fn work_items(&self, factory: &PayloadFactory, max_attempts: u32) -> Vec<WorkItem> {
        if self.is_batch() {
            return vec![WorkItem {
                index: 0,
                device: None,
                payload: factory.batch(self.device_count()),
                max_attempts,
            }];
        }

        (0..self.request_count())
            .map(|index| WorkItem {
                index,
                device: Some(index % self.device_count()),
                payload: factory.item(index),
                max_attempts,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{PayloadFactory, PayloadTemplate, TransactionOutcome, WorkPlan};
    use serde_json::json;

    fn factory() -> PayloadFactory {
        PayloadFactory::new(PayloadTemplate::default(), "r1")
    }

    #[test]
    fn items_are_spread_across_devices() {
        let plan = WorkPlan {
            devices: 2,
            transactions_per_device: 3,
        };
        let items = plan.work_items(&factory(), 5);

        assert_eq!(items.len(), 6);
        assert_eq!(
            items.iter().map(|item| item.device).collect::<Vec<_>>(),
            [0, 1, 0, 1, 0, 1].map(Some)
        );
        assert_eq!(
            items[4].payload.body,
            json!({ "t3:t3s": { "t3": [{ "id": "4", "value": "4-r1" }] } })
        );
    }

    #[test]
    fn zero_transactions_per_device_sends_one_batch() {
        let plan = WorkPlan {
            devices: 3,
            transactions_per_device: 0,
        };
        let items = plan.work_items(&factory(), 5);

        assert_eq!(plan.request_count(), 1);
        assert_eq!(plan.device_transactions(), 3);
        assert_eq!(plan.confirmed_device_transactions(1), 3);
        assert_eq!(plan.confirmed_device_transactions(0), 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].device, None);
        assert_eq!(
            items[0].payload.body["t3:t3s"]["t3"]
                .as_array()
                .map(Vec::len),
            Some(3)
        );
    }

    #[test]
    fn partial_device_coverage_scales_with_transactions_per_device() {
        let plan = WorkPlan {
            devices: 3,
            transactions_per_device: 2,
        };

        assert_eq!(plan.device_transactions_on(2), 4);
        assert_eq!(plan.device_transactions_on(5), 6);
        assert_eq!(plan.confirmed_device_transactions(5), 5);
        assert_eq!(
            WorkPlan {
                transactions_per_device: 0,
                ..plan
            }
            .device_transactions_on(2),
            2
        );
    }

    #[test]
    fn outcomes_serialize_with_kind_tag() {
        assert_eq!(
            serde_json::to_value(TransactionOutcome::HttpFailure(503)).expect("json"),
            json!({ "kind": "http_failure", "detail": 503 })
        );
        assert_eq!(
            serde_json::to_value(TransactionOutcome::Success).expect("json"),
            json!({ "kind": "success" })
        );
    }
}
