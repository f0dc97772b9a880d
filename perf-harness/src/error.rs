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

//! Error taxonomy for harness runs.
//!
//! Per-transaction failures are never errors at this level: they are recorded
//! as [`TransactionOutcome`](crate::dispatch::TransactionOutcome) values. Only
//! setup failures and an unusable trace log abort a run.

use crate::store::StoreError;
use std::path::PathBuf;
use std::time::Duration;

/// Failures that abort a harness run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The store refused to enable the phase trace.
    #[error("unable to enable tracing: {0}")]
    TraceSetup(#[source] StoreError),

    /// The store's device inventory could not be read.
    #[error("unable to discover devices: {0}")]
    Discovery(#[source] StoreError),

    /// The notification stream could not be opened.
    #[error("unable to open notification stream: {0}")]
    StreamSetup(#[source] StoreError),

    /// The trace log exists but could not be read as CSV.
    #[error("unable to read trace log {}: {detail}", path.display())]
    TraceLog { path: PathBuf, detail: String },

    /// The trace log never contained records for every expected transaction.
    #[error(
        "insufficient trace data: found {found} of {expected} transactions after {}ms",
        waited.as_millis()
    )]
    InsufficientTraceData {
        found: usize,
        expected: usize,
        waited: Duration,
    },

    /// Report artifacts could not be written.
    #[error("unable to write report artifact {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
