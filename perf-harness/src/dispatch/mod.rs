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

//! Concurrent submission of the generated load.

pub mod load_dispatcher;
pub mod retry_client;
pub mod work_item;

pub use load_dispatcher::{DispatchSummary, IndexedOutcome, LoadDispatcher};
pub use retry_client::{RetryPolicy, RetryingTransactionClient, DEFAULT_MAX_ATTEMPTS};
pub use work_item::{PayloadFactory, PayloadTemplate, TransactionOutcome, WorkItem, WorkPlan};
