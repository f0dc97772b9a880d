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

//! # perf-harness
//!
//! `perf-harness` drives concurrent write transactions against a
//! configuration store and explains where the time went by correlating the
//! store's own progress trace.
//!
//! A run enables the phase trace, fans the load out over a worker pool with
//! retry on transient transport failures, optionally counts asynchronous
//! commit-queue completions from the notification stream, then reads the
//! trace log back into per-transaction phase records and averages them.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use perf_harness::dispatch::WorkPlan;
//! use perf_harness::harness::{HarnessOrchestrator, HarnessSettings};
//! use perf_harness::report::render_harness_report_text;
//! use perf_harness::store::{CommitQueueMode, RestconfSettings, RestconfStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RestconfStore::new(RestconfSettings {
//!     base_url: "http://localhost:8080/restconf".to_string(),
//!     username: "admin".to_string(),
//!     password: "admin".to_string(),
//!     stream: "service-state-changes".to_string(),
//!     commit_queue: CommitQueueMode::Async,
//!     request_timeout: Duration::from_secs(30),
//! })?;
//! let settings = HarnessSettings {
//!     plan: WorkPlan { devices: 2, transactions_per_device: 5 },
//!     commit_queue: CommitQueueMode::Async,
//!     ..HarnessSettings::default()
//! };
//!
//! let report = HarnessOrchestrator::new(Arc::new(store), settings).run().await?;
//! println!("{}", render_harness_report_text(&report));
//! # Ok(())
//! # }
//! ```
//!
//! Components can also be used on their own; [`harness::analyze_trace_log`]
//! aggregates an existing trace file without a store.

pub mod completion;
pub mod dispatch;
pub mod error;
pub mod harness;
pub mod observability;
pub mod report;
pub mod stats;
pub mod store;
pub mod trace;

pub use completion::{CompletionCounts, CompletionWatcher};
pub use dispatch::{LoadDispatcher, RetryingTransactionClient, TransactionOutcome, WorkItem};
pub use error::HarnessError;
pub use harness::{HarnessOrchestrator, HarnessSettings};
pub use report::HarnessReport;
pub use stats::{AggregateReport, StatsAggregator};
pub use store::{AsyncQueues, DeviceInventory, StoreError, StoreService};
pub use trace::{PhaseCorrelator, PhaseRecord, TraceEvent, TraceEventParser};
